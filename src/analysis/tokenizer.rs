//! Tokenizer trait and the standard word tokenizer.

use crate::analysis::token::Token;
use crate::error::Result;

/// A tokenizer splits text into [`Token`]s with byte-accurate spans.
///
/// Implementations must preserve the original case of each token; consumers
/// that need case-insensitive behavior fold tokens themselves via
/// [`Token::folded`].
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>>;

    /// Get the name of this tokenizer.
    fn name(&self) -> &'static str;
}

/// A tokenizer that emits runs of alphanumeric characters.
///
/// Punctuation and whitespace terminate tokens, so `"Space Corp. LLC"`
/// yields `["Space", "Corp", "LLC"]` with offsets pointing at the unmodified
/// source spans.
#[derive(Clone, Debug, Default)]
pub struct StandardTokenizer;

impl StandardTokenizer {
    /// Create a new standard tokenizer.
    pub fn new() -> Self {
        StandardTokenizer
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;

        for (offset, ch) in text.char_indices() {
            if ch.is_alphanumeric() {
                if start.is_none() {
                    start = Some(offset);
                }
            } else if let Some(begin) = start.take() {
                tokens.push(Token::with_offsets(
                    &text[begin..offset],
                    tokens.len(),
                    begin,
                    offset,
                ));
            }
        }

        if let Some(begin) = start {
            tokens.push(Token::with_offsets(
                &text[begin..],
                tokens.len(),
                begin,
                text.len(),
            ));
        }

        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tokenizer_words() {
        let tokenizer = StandardTokenizer::new();
        let tokens = tokenizer.tokenize("One Bowerman Drive").unwrap();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "One");
        assert_eq!(tokens[1].text, "Bowerman");
        assert_eq!(tokens[2].text, "Drive");
        assert_eq!(tokens[2].position, 2);
        assert_eq!(&"One Bowerman Drive"[tokens[1].start_offset..tokens[1].end_offset], "Bowerman");
    }

    #[test]
    fn test_standard_tokenizer_punctuation() {
        let tokenizer = StandardTokenizer::new();
        let tokens = tokenizer.tokenize("Space Corp. LLC").unwrap();

        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Space", "Corp", "LLC"]);
    }

    #[test]
    fn test_standard_tokenizer_empty() {
        let tokenizer = StandardTokenizer::new();
        assert!(tokenizer.tokenize("").unwrap().is_empty());
        assert!(tokenizer.tokenize("  ...  ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenizer_name() {
        assert_eq!(StandardTokenizer::new().name(), "standard");
    }
}
