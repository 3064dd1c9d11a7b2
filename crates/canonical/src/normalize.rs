//! Key normalization used by approximate matching.
//!
//! Normalization is deliberately small: trim the edges and apply locale-free
//! Unicode lowercasing. Relational lookups never normalize; only the token
//! matcher compares normalized keys.
//!
//! ```rust
//! use canonical::normalize_key;
//!
//! assert_eq!(normalize_key("  AT1G01010 "), "at1g01010");
//! ```

/// Trim surrounding whitespace and lowercase.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A cell is blank when it is empty or whitespace-only.
#[inline]
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_unicode_case() {
        assert_eq!(normalize_key(" ÄBC\t"), "äbc");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t"));
        assert!(!is_blank(" x "));
    }
}
