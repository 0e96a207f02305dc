use std::rc::Rc;

use super::{
    ids::{SymbolRef, UnitId},
    symbol::Symbol,
    table::SymbolTable,
    types::Ty,
};

/// The symbol table of a finished compilation, consumable as a dependency.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub name: String,
    pub table: SymbolTable,
}

impl Assembly {
    pub fn new(name: impl Into<String>, table: SymbolTable) -> Self {
        Assembly {
            name: name.into(),
            table,
        }
    }

    pub fn unit(&self) -> UnitId {
        self.table.unit()
    }
}

/// Assemblies referenced by a compilation, in the order they were given.
#[derive(Debug, Clone, Default)]
pub struct Dependencies(Vec<Rc<Assembly>>);

impl Dependencies {
    pub fn new(assemblies: Vec<Rc<Assembly>>) -> Self {
        Dependencies(assemblies)
    }

    pub fn push(&mut self, assembly: Rc<Assembly>) {
        self.0.push(assembly);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Assembly>> {
        self.0.iter()
    }

    pub fn table(&self, unit: UnitId) -> Option<&SymbolTable> {
        self.0
            .iter()
            .find(|assembly| assembly.unit() == unit)
            .map(|assembly| &assembly.table)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read access to symbols across the local table and every dependency.
#[derive(Clone, Copy)]
pub struct SymbolView<'a> {
    pub local: &'a SymbolTable,
    pub dependencies: &'a Dependencies,
}

impl<'a> SymbolView<'a> {
    pub fn new(local: &'a SymbolTable, dependencies: &'a Dependencies) -> Self {
        SymbolView {
            local,
            dependencies,
        }
    }

    pub fn table(&self, unit: UnitId) -> Option<&'a SymbolTable> {
        if unit == self.local.unit() {
            Some(self.local)
        } else {
            self.dependencies.table(unit)
        }
    }

    pub fn symbol(&self, symbol: SymbolRef) -> Option<&'a Symbol> {
        self.table(symbol.unit)?.get_symbol(symbol.symbol)
    }

    /// Human-readable type name for diagnostics.
    pub fn describe(&self, ty: Ty) -> String {
        match ty {
            Ty::Named(symbol) => self
                .symbol(symbol)
                .map(|symbol| symbol.qualified_name.clone())
                .unwrap_or_else(|| ty.to_string()),
            _ => ty.to_string(),
        }
    }
}
