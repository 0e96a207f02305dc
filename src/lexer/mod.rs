//! Lexical analysis.
//!
//! Converts source text into a token stream using an ordered table of anchored
//! regex patterns. Literal lexemes (numbers and strings) are kept raw: numeric
//! suffixes, underscores and string delimiters are interpreted later by the binder
//! so that malformed literals become ordinary diagnostics.

pub mod lexer;
pub mod tokens;
