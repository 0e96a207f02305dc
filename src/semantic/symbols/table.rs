use crate::Span;

use super::{
    ids::{ScopeId, SymbolId, SymbolRef, UnitId},
    scope::{Scope, ScopeKind},
    symbol::{Symbol, SymbolKind, TypeKind, TypeSymbol},
    types::{NativeType, Ty, DEFAULT_NUMERIC},
};

/// `AddSymbol` found the name already declared directly in the target scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateDefinition {
    pub existing: SymbolId,
}

/// Scope tree and symbol arena for one compilation unit.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    unit: UnitId,
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    global: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// Creates the global scope and declares the prelude types in it.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            unit: UnitId::fresh(),
            scopes: vec![Scope::new(ScopeKind::Global, None, None)],
            symbols: vec![],
            global: ScopeId(0),
        };
        table.declare_prelude();
        table
    }

    fn declare_prelude(&mut self) {
        let global = self.global;
        let prelude = NativeType::ALL
            .iter()
            .map(|native| {
                (
                    native.name(),
                    TypeKind::Native(*native),
                    Ty::Native(*native),
                )
            })
            .chain([
                ("any", TypeKind::Pseudo, Ty::Any),
                ("number", TypeKind::Alias, Ty::Native(DEFAULT_NUMERIC)),
            ]);

        for (name, type_kind, ty) in prelude {
            self.push_symbol(
                global,
                name,
                Span::null(),
                SymbolKind::Type(TypeSymbol::new(type_kind)),
                ty,
            );
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn global(&self) -> ScopeId {
        self.global
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn symbol_ref(&self, id: SymbolId) -> SymbolRef {
        SymbolRef {
            unit: self.unit,
            symbol: id,
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (SymbolId(i as u32), symbol))
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Creates a child scope of `parent`. Named scopes are registered in the parent's
    /// named children, all others in its anonymous children.
    pub fn create_scope(&mut self, kind: ScopeKind, parent: ScopeId, name: Option<&str>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes
            .push(Scope::new(kind, Some(parent), name.map(String::from)));

        let parent_scope = &mut self.scopes[parent.index()];
        match name {
            Some(name) => {
                parent_scope.named_children.insert(name.to_string(), id);
            }
            None => parent_scope.anonymous_children.push(id),
        }

        id
    }

    /// Associates a scope with the symbol that owns it.
    pub fn attach_symbol(&mut self, scope: ScopeId, symbol: SymbolId) {
        self.scopes[scope.index()].symbol = Some(symbol);
    }

    /// Declares `name` directly in `scope`. Ancestors and descendants are not checked.
    pub fn add_symbol(
        &mut self,
        scope: ScopeId,
        name: &str,
        span: Span,
        kind: SymbolKind,
    ) -> Result<SymbolId, DuplicateDefinition> {
        if let Some(existing) = self.lookup_local(scope, name) {
            return Err(DuplicateDefinition { existing });
        }

        let id = self.push_symbol(scope, name, span, kind, Ty::Unresolved);
        tracing::trace!(name, qualified = %self.symbol(id).qualified_name, "declared symbol");
        Ok(id)
    }

    fn push_symbol(
        &mut self,
        scope: ScopeId,
        name: &str,
        span: Span,
        kind: SymbolKind,
        ty: Ty,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let qualifier = self.qualifier(scope);
        let qualified_name = if qualifier.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", qualifier, name)
        };

        self.symbols.push(
            Symbol::new(name.to_string(), qualified_name, scope, span, kind).with_type(ty),
        );
        self.scopes[scope.index()]
            .symbols
            .insert(name.to_string(), id);
        id
    }

    /// Registers `member` in the member map of the struct-like type `owner`.
    pub fn add_member(&mut self, owner: SymbolId, name: &str, member: SymbolId) {
        if let SymbolKind::Type(type_symbol) = &mut self.symbols[owner.index()].kind {
            type_symbol.members.insert(name.to_string(), member);
        }
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope).symbols.get(name).copied()
    }

    /// Innermost declaration of `name` visible from `scope`.
    pub fn lookup_recursive(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);

        while let Some(id) = current {
            if let Some(symbol) = self.lookup_local(id, name) {
                return Some(symbol);
            }
            current = self.scope(id).parent;
        }

        None
    }

    /// Names of the symbols owning `scope` and its ancestors, outermost first, joined by `.`.
    pub fn qualifier(&self, scope: ScopeId) -> String {
        let mut names = vec![];
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(symbol) = scope.symbol {
                names.push(self.symbol(symbol).name.as_str());
            }
            current = scope.parent;
        }

        names.reverse();
        names.join(".")
    }

    /// Path of named scopes from the global scope down to `scope`.
    pub fn scope_path(&self, scope: ScopeId) -> Vec<String> {
        let mut path = vec![];
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(name) = &scope.name {
                path.push(name.clone());
            }
            current = scope.parent;
        }

        path.reverse();
        path
    }

    pub fn named_child(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.scope(scope).named_children.get(name).copied()
    }

    /// Follows `path` through named module and namespace children, starting at the
    /// global scope. Function and struct scopes are never part of a module path.
    pub fn find_scope<S: AsRef<str>>(&self, path: &[S]) -> Option<ScopeId> {
        path.iter().try_fold(self.global, |scope, segment| {
            self.named_child(scope, segment.as_ref())
                .filter(|child| self.scope(*child).is_module_like())
        })
    }

    /// The function whose block contains `scope`, if any.
    pub fn enclosing_function(&self, scope: ScopeId) -> Option<SymbolId> {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = self.scope(id);
            if scope.kind == ScopeKind::FunctionBlock {
                return scope.symbol;
            }
            current = scope.parent;
        }

        None
    }
}
