use std::collections::HashMap;

use super::ids::{ScopeId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Module,
    Namespace,
    FunctionBlock,
    StructSpace,
    InterfaceSpace,
    ClassSpace,
    IfBlock,
    ElseBlock,
    WhileBlock,
}

/// A node of the scope tree.
///
/// Parents are referenced by id, so the tree never owns cycles.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Set for scopes reachable by name from their parent.
    pub name: Option<String>,
    pub symbols: HashMap<String, SymbolId>,
    pub named_children: HashMap<String, ScopeId>,
    pub anonymous_children: Vec<ScopeId>,
    /// The symbol this scope belongs to, e.g. a function's own block.
    pub symbol: Option<SymbolId>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>, name: Option<String>) -> Self {
        Scope {
            kind,
            parent,
            name,
            symbols: HashMap::new(),
            named_children: HashMap::new(),
            anonymous_children: vec![],
            symbol: None,
        }
    }

    pub fn is_module_like(&self) -> bool {
        matches!(self.kind, ScopeKind::Module | ScopeKind::Namespace)
    }

    /// Module-like scopes may be split across this compilation and its dependencies.
    pub fn is_splittable(&self) -> bool {
        self.is_module_like() && self.symbol.is_some()
    }
}
