use crate::{
    ast::ast::{NodeId, NodeKind, SyntaxTree},
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
    semantic::{
        binder::{binder::Binder, bound::BoundFact},
        symbols::{
            ids::{ScopeId, SymbolId},
            scope::ScopeKind,
            symbol::{FunctionSymbol, SymbolKind, TypeKind, TypeSymbol},
            table::SymbolTable,
            types::Ty,
        },
    },
};

/// Builds the scope tree and declares every named construct.
pub struct DeclarePass<'a> {
    tree: &'a SyntaxTree,
    table: &'a mut SymbolTable,
    binder: &'a mut Binder,
    diagnostics: &'a mut Diagnostics,
    imports: Vec<Vec<String>>,
}

/// Returns the import paths found at the top level, in source order.
#[tracing::instrument(skip_all)]
pub fn run(
    tree: &SyntaxTree,
    table: &mut SymbolTable,
    binder: &mut Binder,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Vec<String>>, InternalError> {
    let root = tree.root().ok_or(InternalError::MissingRoot)?;
    let global = table.global();

    let mut pass = DeclarePass {
        tree,
        table,
        binder,
        diagnostics,
        imports: vec![],
    };
    pass.declare(root, global)?;

    tracing::debug!(
        scopes = pass.table.scope_count(),
        imports = pass.imports.len(),
        "declarations collected"
    );
    Ok(pass.imports)
}

impl<'a> DeclarePass<'a> {
    fn duplicate(&mut self, node: NodeId, name: &str) {
        self.diagnostics.error(
            ErrorImpl::DuplicateDefinition {
                name: name.to_string(),
            },
            self.tree.span(node).clone(),
        );
    }

    fn declare(&mut self, node: NodeId, scope: ScopeId) -> Result<(), InternalError> {
        match self.tree.kind(node) {
            NodeKind::CompilationUnit { items } => {
                self.binder.ensure(node, BoundFact::Unit);
                for item in items.clone() {
                    self.declare(item, scope)?;
                }
            }
            NodeKind::Import { path } => {
                self.binder.ensure(node, BoundFact::Unit);
                if !self.imports.contains(path) {
                    self.imports.push(path.clone());
                }
            }
            NodeKind::Module { path, body } => {
                let (path, body) = (path.clone(), body.clone());
                self.declare_module(node, &path, &body, scope, false)?;
            }
            NodeKind::Namespace { path, body } => {
                let (path, body) = (path.clone(), body.clone());
                self.declare_module(node, &path, &body, scope, true)?;
            }
            NodeKind::FunctionDef { .. } => self.declare_function(node, scope)?,
            NodeKind::StructDef { .. } => self.declare_struct(node, scope)?,
            NodeKind::TypeAlias { name, .. } => {
                let name = name.clone();
                let kind = SymbolKind::Type(TypeSymbol::new(TypeKind::Alias));
                self.declare_symbol(node, scope, &name, kind);
            }
            NodeKind::Let {
                name,
                is_constant,
                initializer,
                ..
            } => {
                let (name, is_constant, initializer) = (name.clone(), *is_constant, *initializer);
                if let Some(initializer) = initializer {
                    self.declare(initializer, scope)?;
                }
                self.declare_symbol(node, scope, &name, SymbolKind::Local { is_constant });
            }
            NodeKind::Block { .. } => self.declare_block(node, scope)?,
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                let (condition, consequent, alternate) = (*condition, *consequent, *alternate);
                self.declare(condition, scope)?;

                let then_scope = self.table.create_scope(ScopeKind::IfBlock, scope, None);
                self.declare_block(consequent, then_scope)?;

                let else_scope = match alternate {
                    Some(alternate) if matches!(self.tree.kind(alternate), NodeKind::Block { .. }) => {
                        let else_scope = self.table.create_scope(ScopeKind::ElseBlock, scope, None);
                        self.declare_block(alternate, else_scope)?;
                        Some(else_scope)
                    }
                    Some(alternate) => {
                        self.declare(alternate, scope)?;
                        None
                    }
                    None => None,
                };

                self.binder.ensure(
                    node,
                    BoundFact::Conditional {
                        then_scope,
                        else_scope,
                    },
                );
            }
            NodeKind::While { condition, body } => {
                let (condition, body) = (*condition, *body);
                self.declare(condition, scope)?;

                let body_scope = self.table.create_scope(ScopeKind::WhileBlock, scope, None);
                self.declare_block(body, body_scope)?;
                self.binder.ensure(node, BoundFact::Loop { body_scope });
            }
            kind => {
                for child in kind.children() {
                    self.declare(child, scope)?;
                }
            }
        }

        Ok(())
    }

    fn declare_block(&mut self, block: NodeId, scope: ScopeId) -> Result<(), InternalError> {
        self.binder.ensure(block, BoundFact::Unit);
        for statement in self.tree.children(block) {
            self.declare(statement, scope)?;
        }
        Ok(())
    }

    fn declare_symbol(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
    ) -> Option<SymbolId> {
        let span = self.tree.span(node).clone();
        match self.table.add_symbol(scope, name, span, kind) {
            Ok(symbol) => {
                self.binder.ensure(node, BoundFact::Declaration { symbol });
                Some(symbol)
            }
            Err(_) => {
                self.duplicate(node, name);
                None
            }
        }
    }

    /// Opens (or reopens) every scope along `path`, then declares `body` in the last one.
    fn declare_module(
        &mut self,
        node: NodeId,
        path: &[String],
        body: &[NodeId],
        scope: ScopeId,
        is_namespace: bool,
    ) -> Result<(), InternalError> {
        let mut current = scope;
        let mut innermost = None;

        for segment in path {
            if let Some(existing) = self.table.lookup_local(current, segment) {
                let symbol = self.table.symbol(existing);
                let same_kind = match symbol.kind {
                    SymbolKind::Module { .. } => !is_namespace,
                    SymbolKind::Namespace { .. } => is_namespace,
                    _ => false,
                };

                match symbol.module_scope() {
                    Some(reopened) if same_kind => {
                        current = reopened;
                        innermost = Some(existing);
                        continue;
                    }
                    _ => {
                        self.duplicate(node, segment);
                        return Ok(());
                    }
                }
            }

            let (scope_kind, symbol_kind): (ScopeKind, fn(ScopeId) -> SymbolKind) = if is_namespace {
                (ScopeKind::Namespace, |scope| SymbolKind::Namespace { scope })
            } else {
                (ScopeKind::Module, |scope| SymbolKind::Module { scope })
            };

            let module_scope = self.table.create_scope(scope_kind, current, Some(segment));
            let span = self.tree.span(node).clone();
            let Ok(symbol) = self
                .table
                .add_symbol(current, segment, span, symbol_kind(module_scope))
            else {
                self.duplicate(node, segment);
                return Ok(());
            };
            self.table.attach_symbol(module_scope, symbol);
            self.table.symbol_mut(symbol).resolve_type(Ty::NoType)?;

            current = module_scope;
            innermost = Some(symbol);
        }

        let Some(symbol) = innermost else {
            return Ok(());
        };
        self.binder.ensure(
            node,
            BoundFact::Module {
                symbol,
                scope: current,
            },
        );

        for item in body {
            self.declare(*item, current)?;
        }
        Ok(())
    }

    fn declare_function(&mut self, node: NodeId, scope: ScopeId) -> Result<(), InternalError> {
        let NodeKind::FunctionDef {
            name,
            parameters,
            body,
            ..
        } = self.tree.kind(node)
        else {
            return Err(InternalError::NodeKindMismatch {
                node: node.0,
                expected: "function definition",
            });
        };
        let (name, parameters, body) = (name.clone(), parameters.clone(), *body);

        if self.table.lookup_local(scope, &name).is_some() {
            self.duplicate(node, &name);
            return Ok(());
        }

        let function_scope = self
            .table
            .create_scope(ScopeKind::FunctionBlock, scope, Some(&name));
        let owner = self.table.scope(scope);
        let member_of = (owner.kind == ScopeKind::StructSpace)
            .then_some(owner.symbol)
            .flatten();

        let function = FunctionSymbol::new(function_scope);
        let kind = match member_of {
            Some(_) => SymbolKind::MemberFunction(function),
            None => SymbolKind::Function(function),
        };

        let span = self.tree.span(node).clone();
        let Ok(symbol) = self.table.add_symbol(scope, &name, span, kind) else {
            self.duplicate(node, &name);
            return Ok(());
        };
        self.table.attach_symbol(function_scope, symbol);
        self.table.symbol_mut(symbol).resolve_type(Ty::Function)?;
        if let Some(owner) = member_of {
            self.table.add_member(owner, &name, symbol);
        }
        self.binder.ensure(
            node,
            BoundFact::Function {
                symbol,
                scope: function_scope,
            },
        );

        let mut declared = vec![];
        for parameter in parameters {
            let NodeKind::Parameter { name, .. } = self.tree.kind(parameter) else {
                return Err(InternalError::NodeKindMismatch {
                    node: parameter.0,
                    expected: "parameter",
                });
            };
            let name = name.clone();
            if let Some(declared_parameter) =
                self.declare_symbol(parameter, function_scope, &name, SymbolKind::Parameter)
            {
                declared.push(declared_parameter);
            }
        }

        if let SymbolKind::Function(function) | SymbolKind::MemberFunction(function) =
            &mut self.table.symbol_mut(symbol).kind
        {
            function.parameters = declared;
        }

        tracing::trace!(function = %name, "declared function");
        self.declare_block(body, function_scope)
    }

    fn declare_struct(&mut self, node: NodeId, scope: ScopeId) -> Result<(), InternalError> {
        let NodeKind::StructDef { name, members } = self.tree.kind(node) else {
            return Err(InternalError::NodeKindMismatch {
                node: node.0,
                expected: "struct definition",
            });
        };
        let (name, members) = (name.clone(), members.clone());

        if self.table.lookup_local(scope, &name).is_some() {
            self.duplicate(node, &name);
            return Ok(());
        }

        let struct_scope = self
            .table
            .create_scope(ScopeKind::StructSpace, scope, Some(&name));
        let mut type_symbol = TypeSymbol::new(TypeKind::Struct);
        type_symbol.scope = Some(struct_scope);

        let span = self.tree.span(node).clone();
        let Ok(symbol) = self
            .table
            .add_symbol(scope, &name, span, SymbolKind::Type(type_symbol))
        else {
            self.duplicate(node, &name);
            return Ok(());
        };
        self.table.attach_symbol(struct_scope, symbol);

        let named = Ty::Named(self.table.symbol_ref(symbol));
        self.table.symbol_mut(symbol).resolve_type(named)?;
        self.binder.ensure(
            node,
            BoundFact::Struct {
                symbol,
                scope: struct_scope,
            },
        );

        for member in members {
            match self.tree.kind(member) {
                NodeKind::Field { name: field, .. } => {
                    let field = field.clone();
                    if let Some(declared) =
                        self.declare_symbol(member, struct_scope, &field, SymbolKind::MemberField)
                    {
                        self.table.add_member(symbol, &field, declared);
                    }
                }
                _ => self.declare(member, struct_scope)?,
            }
        }

        Ok(())
    }
}
