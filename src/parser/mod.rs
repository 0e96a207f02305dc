//! Parser module for building the syntax tree.
//!
//! Transforms a stream of tokens into an arena-allocated [`crate::ast::ast::SyntaxTree`].
//! Expressions use a Pratt parser: NUD (null denotation) and LED (left denotation)
//! handlers registered per token kind, with binding power for precedence.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;
