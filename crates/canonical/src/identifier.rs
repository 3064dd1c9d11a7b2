//! The [`Identifier`] value type shared by every matching stage.
//!
//! Identifiers are converted from table cells exactly once, at ingestion, and
//! are compared as plain strings afterwards. Cloning is cheap (a reference
//! count bump), which matters because traversal copies identifiers into
//! frontier and result sets on every round.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::normalize::{is_blank, normalize_key};

/// An opaque, comparable, printable identifier such as a gene symbol.
///
/// Equality, ordering and hashing follow the underlying string, so an
/// `Identifier` can be looked up in a map with a `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Wrap a value exactly as stored.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// Convert a raw table cell. Missing and blank cells are treated as null.
    ///
    /// The value is kept verbatim: relational lookups compare identifiers
    /// exactly as they appear in the source table.
    ///
    /// ```rust
    /// use canonical::Identifier;
    ///
    /// assert_eq!(Identifier::from_cell(Some("AT1G01010")).unwrap().as_str(), "AT1G01010");
    /// assert!(Identifier::from_cell(Some("   ")).is_none());
    /// assert!(Identifier::from_cell(None).is_none());
    /// ```
    pub fn from_cell(cell: Option<&str>) -> Option<Self> {
        match cell {
            Some(value) if !is_blank(value) => Some(Self::new(value)),
            _ => None,
        }
    }

    /// Build a normalized key (trimmed, lower-cased) for approximate matching.
    /// Returns `None` when nothing is left after normalization.
    pub fn normalized(raw: &str) -> Option<Self> {
        let key = normalize_key(raw);
        if key.is_empty() {
            None
        } else {
            Some(Self(Arc::from(key)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-sensitive substring containment: does `self` contain `needle`?
    #[inline]
    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_by_str_matches_identifier_hash() {
        let mut set = HashSet::new();
        set.insert(Identifier::new("G1"));
        assert!(set.contains("G1"));
        assert!(!set.contains("g1"));
    }

    #[test]
    fn from_cell_keeps_value_verbatim() {
        let id = Identifier::from_cell(Some(" G1 ")).expect("non-blank cell");
        assert_eq!(id.as_str(), " G1 ");
    }

    #[test]
    fn normalized_trims_and_lowercases() {
        let key = Identifier::normalized("  AT1G01010 ").expect("key");
        assert_eq!(key.as_str(), "at1g01010");
        assert!(Identifier::normalized(" \t ").is_none());
    }

    #[test]
    fn serde_uses_plain_string() {
        let id = Identifier::new("AT1G01010");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"AT1G01010\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let id = Identifier::new("AT1G01010.1");
        assert!(id.contains("AT1G01010"));
        assert!(!id.contains("at1g01010"));
    }
}
