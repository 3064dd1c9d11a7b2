use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Deduplicated, ordered set of normalized tokens.
pub type TokenSet = BTreeSet<String>;

/// A token with its UTF-8 byte offsets in the source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// The lower-cased token text.
    pub text: String,
    /// Byte offset (inclusive) in the source text.
    pub start: usize,
    /// Byte offset (exclusive) in the source text.
    pub end: usize,
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.text.as_str()
    }
}

#[inline]
fn is_token_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Splits text into maximal runs of alphanumeric/underscore characters and
/// lower-cases each run.
///
/// Offsets refer to the input text, not the lower-cased token, so callers can
/// highlight the original span.
///
/// ```rust
/// use canonical::tokenize;
///
/// let tokens = tokenize("AT1G01010.1 (NAC001)");
/// let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, ["at1g01010", "1", "nac001"]);
/// ```
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if !is_token_char(ch) {
            if let Some(token_start) = start.take() {
                tokens.push(Token {
                    text: text[token_start..idx].to_lowercase(),
                    start: token_start,
                    end: idx,
                });
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }

    if let Some(token_start) = start {
        tokens.push(Token {
            text: text[token_start..].to_lowercase(),
            start: token_start,
            end: text.len(),
        });
    }

    tokens
}

/// Tokenize and collapse into a [`TokenSet`]. An input without any token
/// characters yields an empty set, which is valid.
pub fn token_set(text: &str) -> TokenSet {
    tokenize(text).into_iter().map(|token| token.text).collect()
}
