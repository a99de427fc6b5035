//! Token types produced by text analysis.

use serde::{Deserialize, Serialize};

/// A token is a single unit of text after tokenization.
///
/// The token keeps its original-case text together with the byte offsets of
/// the span it came from, so highlighting can wrap matches in place without
/// re-scanning the source string. Match decisions are made on the
/// case-folded form (see [`Token::folded`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The original-case text content of the token.
    pub text: String,

    /// The position of the token in the token stream (0-based).
    pub position: usize,

    /// The byte offset where this token starts in the original text.
    pub start_offset: usize,

    /// The byte offset where this token ends in the original text.
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// The case-folded form used for match decisions.
    pub fn folded(&self) -> String {
        self.text.to_lowercase()
    }

    /// Get the length of the token text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_offsets_and_folding() {
        let token = Token::with_offsets("Bowerman", 1, 4, 12);
        assert_eq!(token.text, "Bowerman");
        assert_eq!(token.position, 1);
        assert_eq!(token.start_offset, 4);
        assert_eq!(token.end_offset, 12);
        assert_eq!(token.folded(), "bowerman");
        assert_eq!(token.len(), 8);
        assert!(!token.is_empty());
    }
}
