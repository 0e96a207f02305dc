//! Symbols, scopes and the per-unit symbol table.
//!
//! Scopes and symbols live in arenas owned by [`table::SymbolTable`] and refer to each
//! other by id. Symbols from other compilations are addressed with
//! [`ids::SymbolRef`], which carries the owning unit.

pub mod assembly;
pub mod ids;
pub mod scope;
pub mod symbol;
pub mod table;
pub mod types;
