//! The analysis passes, run in this order by [`crate::semantic::compilation::Compilation`]:
//!
//! 1. [`implicit`]: synthesizes implicit returns, checks return/yield placement.
//! 2. [`declare`]: builds scopes and declares symbols.
//! 3. [`names`]: binds identifiers and module-qualified members.
//! 4. [`types`]: resolves types to a fixpoint.
//! 5. [`check`]: assignability and statement well-formedness.

pub mod check;
pub mod declare;
pub mod implicit;
pub mod names;
pub mod types;

#[cfg(test)]
mod tests;
