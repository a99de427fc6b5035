//! Text analysis module.
//!
//! Provides the [`Tokenizer`] trait and the default [`StandardTokenizer`],
//! plus the [`Token`] type that flows from analysis into indexing and
//! highlighting.

pub mod token;
pub mod tokenizer;

pub use token::Token;
pub use tokenizer::{StandardTokenizer, Tokenizer};
