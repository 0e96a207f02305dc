//! Semantic analysis: symbols and scopes, the bound-fact overlay, name and type
//! resolution, and the pass pipeline that drives them.

pub mod binder;
pub mod compilation;
pub mod navigator;
pub mod node_state;
pub mod passes;
pub mod resolver;
pub mod symbols;
