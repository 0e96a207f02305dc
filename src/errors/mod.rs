//! Error types and error handling for the compiler.
//!
//! Two channels are kept apart:
//!
//! - [`errors::Diagnostic`]: user-facing problems (unresolved names, bad literals,
//!   illegal assignments, ...). They are accumulated in a [`errors::Diagnostics`] sink
//!   and stop the pipeline at the next phase boundary.
//! - [`errors::InternalError`]: broken analyzer invariants (a node that should already be
//!   bound is not, a scope stack underflow, a fixpoint that never converges). These are
//!   returned through `Result` and must never be shown as a normal compile error.

pub mod errors;

#[cfg(test)]
mod tests;
