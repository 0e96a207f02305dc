use std::iter;

use crate::semantic::symbols::{
    assembly::{Dependencies, SymbolView},
    ids::{ScopeId, SymbolRef},
    table::SymbolTable,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(SymbolRef),
    Unresolved,
    /// Several imports declare the name. Candidates are sorted.
    Ambiguous(Vec<SymbolRef>),
}

/// Name lookup across the lexical scope chain, split module scopes and imports.
#[derive(Clone, Copy)]
pub struct NameResolver<'a> {
    table: &'a SymbolTable,
    dependencies: &'a Dependencies,
}

impl<'a> NameResolver<'a> {
    pub fn new(table: &'a SymbolTable, dependencies: &'a Dependencies) -> Self {
        NameResolver {
            table,
            dependencies,
        }
    }

    fn tables(&self) -> impl Iterator<Item = &'a SymbolTable> {
        iter::once(self.table).chain(self.dependencies.iter().map(|assembly| &assembly.table))
    }

    pub fn view(&self) -> SymbolView<'a> {
        SymbolView::new(self.table, self.dependencies)
    }

    /// Resolves `name` as seen from `origin`.
    ///
    /// The ancestor chain is searched first and its innermost hit wins. Only when it has
    /// no hit are the `imports` consulted, and those may produce several candidates.
    pub fn find_recursively(
        &self,
        name: &str,
        origin: ScopeId,
        imports: &[Vec<String>],
    ) -> Resolution {
        if let Some(found) = self.find_in_ancestors(name, origin) {
            return Resolution::Found(found);
        }

        let mut hits: Vec<SymbolRef> = vec![];
        for path in imports {
            for table in self.tables() {
                let Some(symbol) = table
                    .find_scope(path.as_slice())
                    .and_then(|scope| table.lookup_local(scope, name))
                else {
                    continue;
                };

                let found = table.symbol_ref(symbol);
                if !hits.contains(&found) {
                    hits.push(found);
                }
            }
        }

        match hits.len() {
            0 => Resolution::Unresolved,
            1 => Resolution::Found(hits[0]),
            _ => {
                hits.sort();
                Resolution::Ambiguous(hits)
            }
        }
    }

    fn find_in_ancestors(&self, name: &str, origin: ScopeId) -> Option<SymbolRef> {
        let mut current = Some(origin);

        while let Some(id) = current {
            if let Some(symbol) = self.table.lookup_local(id, name) {
                return Some(self.table.symbol_ref(symbol));
            }

            let scope = self.table.scope(id);
            if scope.is_splittable() {
                let path = self.table.scope_path(id);
                let split = self.dependencies.iter().find_map(|assembly| {
                    let table = &assembly.table;
                    table
                        .find_scope(path.as_slice())
                        .and_then(|scope| table.lookup_local(scope, name))
                        .map(|symbol| table.symbol_ref(symbol))
                });
                if split.is_some() {
                    return split;
                }
            }

            current = scope.parent;
        }

        None
    }

    /// Looks `name` up directly inside a module or namespace, including the parts of it
    /// declared by other units.
    pub fn find_in_module(&self, module: SymbolRef, name: &str) -> Option<SymbolRef> {
        let view = self.view();
        let owner = view.table(module.unit)?;
        let scope = view.symbol(module)?.module_scope()?;

        if let Some(symbol) = owner.lookup_local(scope, name) {
            return Some(owner.symbol_ref(symbol));
        }

        let path = owner.scope_path(scope);
        self.tables()
            .filter(|table| table.unit() != owner.unit())
            .find_map(|table| {
                table
                    .find_scope(path.as_slice())
                    .and_then(|scope| table.lookup_local(scope, name))
                    .map(|symbol| table.symbol_ref(symbol))
            })
    }

    /// Whether some unit declares a scope at `path`.
    pub fn scope_exists(&self, path: &[String]) -> bool {
        self.tables().any(|table| table.find_scope(path).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        semantic::symbols::{
            assembly::{Assembly, Dependencies},
            ids::{ScopeId, SymbolId},
            scope::ScopeKind,
            symbol::SymbolKind,
            table::SymbolTable,
        },
        Span,
    };

    use super::{NameResolver, Resolution};

    fn declare_module(table: &mut SymbolTable, parent: ScopeId, name: &str) -> ScopeId {
        let scope = table.create_scope(ScopeKind::Module, parent, Some(name));
        let symbol = table
            .add_symbol(parent, name, Span::null(), SymbolKind::Module { scope })
            .unwrap();
        table.attach_symbol(scope, symbol);
        scope
    }

    fn declare_local(table: &mut SymbolTable, scope: ScopeId, name: &str) -> SymbolId {
        table
            .add_symbol(scope, name, Span::null(), SymbolKind::Local { is_constant: false })
            .unwrap()
    }

    #[test]
    fn test_innermost_declaration_wins() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let outer = declare_local(&mut table, global, "x");
        let block = table.create_scope(ScopeKind::WhileBlock, global, None);
        let inner = declare_local(&mut table, block, "x");

        let dependencies = Dependencies::default();
        let resolver = NameResolver::new(&table, &dependencies);

        for _ in 0..3 {
            assert_eq!(
                resolver.find_recursively("x", block, &[]),
                Resolution::Found(table.symbol_ref(inner))
            );
        }
        assert_eq!(
            resolver.find_recursively("x", global, &[]),
            Resolution::Found(table.symbol_ref(outer))
        );
        assert_eq!(
            resolver.find_recursively("y", block, &[]),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_imports_can_be_ambiguous() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let a = declare_module(&mut table, global, "a");
        let b = declare_module(&mut table, global, "b");
        let from_a = declare_local(&mut table, a, "shared");
        let from_b = declare_local(&mut table, b, "shared");
        declare_local(&mut table, b, "only_b");

        let dependencies = Dependencies::default();
        let resolver = NameResolver::new(&table, &dependencies);
        let imports = vec![vec!["a".to_string()], vec!["b".to_string()]];

        let mut expected = vec![table.symbol_ref(from_a), table.symbol_ref(from_b)];
        expected.sort();
        assert_eq!(
            resolver.find_recursively("shared", global, &imports),
            Resolution::Ambiguous(expected)
        );
        assert!(matches!(
            resolver.find_recursively("only_b", global, &imports),
            Resolution::Found(_)
        ));
    }

    #[test]
    fn test_split_module_reaches_dependency() {
        let mut library = SymbolTable::new();
        let library_global = library.global();
        let library_math = declare_module(&mut library, library_global, "math");
        let pi = declare_local(&mut library, library_math, "pi");
        let pi_ref = library.symbol_ref(pi);
        let dependencies = Dependencies::new(vec![Rc::new(Assembly::new("library", library))]);

        let mut table = SymbolTable::new();
        let global = table.global();
        let math = declare_module(&mut table, global, "math");
        let module = table.lookup_local(global, "math").unwrap();

        let resolver = NameResolver::new(&table, &dependencies);
        assert_eq!(
            resolver.find_recursively("pi", math, &[]),
            Resolution::Found(pi_ref)
        );
        assert_eq!(
            resolver.find_in_module(table.symbol_ref(module), "pi"),
            Some(pi_ref)
        );
        assert!(resolver.scope_exists(&["math".to_string()]));
        assert!(!resolver.scope_exists(&["physics".to_string()]));
    }
}
