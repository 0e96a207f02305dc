use std::{
    fmt::Display,
    sync::atomic::{AtomicU32, Ordering},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies one symbol table, so symbols from dependency assemblies stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

static NEXT_UNIT: AtomicU32 = AtomicU32::new(1);

impl UnitId {
    pub fn fresh() -> UnitId {
        UnitId(NEXT_UNIT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A symbol in any unit: the current compilation or one of its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolRef {
    pub unit: UnitId,
    pub symbol: SymbolId,
}

impl Display for SymbolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.unit.0, self.symbol.0)
    }
}
