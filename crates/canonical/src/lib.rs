//! genelink canonical layer.
//!
//! Everything downstream compares values produced here, so this crate is the
//! single place where raw cells turn into [`Identifier`]s and free text turns
//! into tokens.
//!
//! ## What we do
//!
//! - Wrap cell values as [`Identifier`]s (blank cells become null)
//! - Normalize keys for approximate matching (trim + lowercase)
//! - Tokenize into maximal alphanumeric/underscore runs, with byte offsets
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Same input, same output.

mod identifier;
mod normalize;
mod token;

pub use crate::identifier::Identifier;
pub use crate::normalize::{is_blank, normalize_key};
pub use crate::token::{token_set, tokenize, Token, TokenSet};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_identifier_and_tokens_agree() {
        let key = Identifier::normalized(" AT1G01010.1 ").expect("key");
        let tokens = token_set(key.as_str());
        assert_eq!(tokens, token_set("at1g01010 1"));
    }
}
