use crate::{
    ast::ast::{NodeId, NodeKind, SyntaxTree},
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
    semantic::{
        binder::{
            binder::Binder,
            bound::{AssociatedType, BoundFact, BoundNode},
        },
        navigator::ScopeNavigator,
        resolver::{NameResolver, Resolution},
        symbols::{
            assembly::{Dependencies, SymbolView},
            ids::SymbolRef,
            symbol::Symbol,
            table::SymbolTable,
            types::Ty,
        },
    },
};

/// Binds identifiers and module-qualified member accesses to their symbols.
pub struct NamesPass<'a> {
    tree: &'a SyntaxTree,
    resolver: NameResolver<'a>,
    binder: &'a mut Binder,
    navigator: ScopeNavigator,
    imports: &'a [Vec<String>],
    diagnostics: &'a mut Diagnostics,
}

#[tracing::instrument(skip_all)]
pub fn run(
    tree: &SyntaxTree,
    table: &SymbolTable,
    dependencies: &Dependencies,
    binder: &mut Binder,
    imports: &[Vec<String>],
    diagnostics: &mut Diagnostics,
) -> Result<(), InternalError> {
    let root = tree.root().ok_or(InternalError::MissingRoot)?;

    let mut pass = NamesPass {
        tree,
        resolver: NameResolver::new(table, dependencies),
        binder,
        navigator: ScopeNavigator::new(table.global()),
        imports,
        diagnostics,
    };

    pass.validate_imports(root);
    pass.visit(root)?;
    Ok(())
}

/// Source text of a dotted name such as `a.b.c`, for diagnostics.
pub fn dotted_name(tree: &SyntaxTree, node: NodeId) -> String {
    match tree.kind(node) {
        NodeKind::Identifier { name } => name.clone(),
        NodeKind::MemberAccess { target, member } => {
            format!("{}.{}", dotted_name(tree, *target), member)
        }
        kind => kind.kind_name().to_string(),
    }
}

pub fn associated_type(symbol: &Symbol) -> AssociatedType {
    if symbol.is_type() {
        AssociatedType::TypeItself
    } else if symbol.is_module_like() {
        AssociatedType::NoInstance
    } else {
        AssociatedType::None
    }
}

impl<'a> NamesPass<'a> {
    fn view(&self) -> SymbolView<'a> {
        self.resolver.view()
    }

    fn lookup(&self, symbol: SymbolRef) -> Result<&'a Symbol, InternalError> {
        self.view()
            .symbol(symbol)
            .ok_or_else(|| InternalError::DanglingSymbol {
                symbol: symbol.to_string(),
            })
    }

    fn validate_imports(&mut self, root: NodeId) {
        for item in self.tree.children(root) {
            let NodeKind::Import { path } = self.tree.kind(item) else {
                continue;
            };

            if !self.resolver.scope_exists(path) {
                self.diagnostics.error(
                    ErrorImpl::ImportNotFound {
                        path: path.join("."),
                    },
                    self.tree.span(item).clone(),
                );
            }
        }
    }

    fn visit_children(&mut self, node: NodeId) -> Result<(), InternalError> {
        for child in self.tree.children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: NodeId) -> Result<(), InternalError> {
        let tree = self.tree;

        match tree.kind(node) {
            NodeKind::Module { .. } | NodeKind::Namespace { .. } => {
                self.navigator.begin_module(self.binder, node)?;
                self.visit_children(node)?;
                self.navigator.end_scope()?;
            }
            NodeKind::FunctionDef { .. } => {
                self.navigator.begin_function(self.binder, node)?;
                self.visit_children(node)?;
                self.navigator.end_scope()?;
            }
            NodeKind::StructDef { .. } => {
                self.navigator.begin_struct(self.binder, node)?;
                self.visit_children(node)?;
                self.navigator.end_scope()?;
            }
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                self.visit(*condition)?;

                self.navigator.begin_consequent(self.binder, node)?;
                self.visit_children(*consequent)?;
                self.navigator.end_scope()?;

                if let Some(alternate) = alternate {
                    if self.navigator.begin_alternate(self.binder, node)? {
                        self.visit_children(*alternate)?;
                        self.navigator.end_scope()?;
                    } else {
                        self.visit(*alternate)?;
                    }
                }
            }
            NodeKind::While { condition, body } => {
                self.visit(*condition)?;
                self.navigator.begin_loop_body(self.binder, node)?;
                self.visit_children(*body)?;
                self.navigator.end_scope()?;
            }
            NodeKind::Identifier { name } => self.resolve_identifier(node, name)?,
            NodeKind::MemberAccess { target, member } => {
                self.visit(*target)?;
                self.resolve_qualified_member(node, *target, member)?;
            }
            // Type names are resolved together with types.
            NodeKind::TypeName { .. } => {}
            _ => self.visit_children(node)?,
        }

        Ok(())
    }

    fn resolve_identifier(&mut self, node: NodeId, name: &str) -> Result<(), InternalError> {
        let scope = self.navigator.current();

        match self.resolver.find_recursively(name, scope, self.imports) {
            Resolution::Found(found) => {
                let symbol = self.lookup(found)?;
                tracing::trace!(name, symbol = %symbol.qualified_name, "resolved identifier");
                self.binder.ensure(
                    node,
                    BoundFact::Identifier {
                        symbol: found,
                        associated_type: associated_type(symbol),
                    },
                );
            }
            Resolution::Unresolved => {
                self.diagnostics.error(
                    ErrorImpl::UnresolvedName {
                        name: name.to_string(),
                    },
                    self.tree.span(node).clone(),
                );
                self.binder
                    .bind_with(node, || BoundNode::typed(Ty::Error, BoundFact::Unit));
            }
            Resolution::Ambiguous(candidates) => {
                let mut names = candidates
                    .into_iter()
                    .map(|candidate| Ok(self.lookup(candidate)?.qualified_name.clone()))
                    .collect::<Result<Vec<_>, InternalError>>()?;
                names.sort();

                self.diagnostics.error(
                    ErrorImpl::AmbiguousName {
                        name: name.to_string(),
                        candidates: names,
                    },
                    self.tree.span(node).clone(),
                );
                self.binder
                    .bind_with(node, || BoundNode::typed(Ty::Error, BoundFact::Unit));
            }
        }

        Ok(())
    }

    /// `m.x` where `m` names a module or namespace is resolved here; member access on
    /// values waits for types.
    fn resolve_qualified_member(
        &mut self,
        node: NodeId,
        target: NodeId,
        member: &str,
    ) -> Result<(), InternalError> {
        let Some(module) = self
            .binder
            .get(target)
            .and_then(BoundNode::referenced_symbol)
        else {
            return Ok(());
        };
        if !self.lookup(module)?.is_module_like() {
            return Ok(());
        }

        match self.resolver.find_in_module(module, member) {
            Some(found) => {
                let symbol = self.lookup(found)?;
                let record = BoundNode::new(BoundFact::Member {
                    member: Some(found),
                });
                self.binder.bind_with(node, || record);
                tracing::trace!(member, symbol = %symbol.qualified_name, "resolved qualified member");
            }
            None => {
                self.diagnostics.error(
                    ErrorImpl::UnresolvedName {
                        name: dotted_name(self.tree, node),
                    },
                    self.tree.span(node).clone(),
                );
                self.binder
                    .bind_with(node, || BoundNode::typed(Ty::Error, BoundFact::Unit));
            }
        }

        Ok(())
    }
}
