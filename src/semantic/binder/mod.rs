//! The bound-fact overlay ("binder").
//!
//! Every pass records what it learns about a syntax node in a [`bound::BoundNode`]
//! stored in the [`binder::Binder`]. Literal lexemes are interpreted here as well,
//! see [`literals`].

pub mod binder;
pub mod bound;
pub mod literals;

#[cfg(test)]
mod tests;
