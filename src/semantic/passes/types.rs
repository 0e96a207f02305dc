use crate::{
    ast::{
        ast::{LiteralKind, NodeId, NodeKind, SyntaxTree},
        operators::UnaryOperator,
    },
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
    semantic::{
        binder::{
            binder::Binder,
            bound::{BoundFact, BoundNode},
        },
        navigator::ScopeNavigator,
        node_state::{NodeStateTracker, NodeStatus},
        resolver::{NameResolver, Resolution},
        symbols::{
            assembly::{Dependencies, SymbolView},
            ids::{ScopeId, SymbolId, SymbolRef},
            symbol::{Symbol, TypeKind},
            table::SymbolTable,
            types::{NativeType, Ty},
        },
    },
};

/// Default bound on complete-analysis rounds.
///
/// A round sweeps the pending nodes until a sweep changes nothing. Every productive
/// sweep writes at least one write-once type slot, so a round ends stable after
/// finitely many sweeps. A round following a productive one only confirms that
/// nothing is left to learn, so the fixpoint needs at most two rounds however long
/// the chains of forward references are. Hitting the bound means that invariant was
/// broken.
pub const MAX_FIXPOINT_ROUNDS: usize = 256;

/// Resolves the type of every node, repeating over pending nodes until nothing changes.
pub struct TypesPass<'a> {
    tree: &'a SyntaxTree,
    table: &'a mut SymbolTable,
    dependencies: &'a Dependencies,
    binder: &'a mut Binder,
    imports: &'a [Vec<String>],
    navigator: ScopeNavigator,
    states: NodeStateTracker,
    diagnostics: &'a mut Diagnostics,
}

/// Returns the number of complete-analysis rounds needed after the first pass.
#[tracing::instrument(skip_all, fields(max_rounds = max_rounds))]
pub fn run(
    tree: &SyntaxTree,
    table: &mut SymbolTable,
    dependencies: &Dependencies,
    binder: &mut Binder,
    imports: &[Vec<String>],
    max_rounds: usize,
    diagnostics: &mut Diagnostics,
) -> Result<usize, InternalError> {
    let root = tree.root().ok_or(InternalError::MissingRoot)?;
    let global = table.global();

    let mut pass = TypesPass {
        tree,
        table,
        dependencies,
        binder,
        imports,
        navigator: ScopeNavigator::new(global),
        states: NodeStateTracker::new(tree.len()),
        diagnostics,
    };

    pass.visit(root)?;
    pass.states.take_progress();

    let rounds = pass.complete_analysis(max_rounds)?;
    pass.report_unresolved();
    Ok(rounds)
}

fn collect_targets(
    tree: &SyntaxTree,
    from: NodeId,
    stop: fn(&NodeKind) -> bool,
    matches: fn(&NodeKind) -> bool,
) -> Vec<NodeId> {
    let mut found = vec![];
    let mut stack = tree.children(from);
    stack.reverse();

    while let Some(node) = stack.pop() {
        let kind = tree.kind(node);
        if matches(kind) {
            found.push(node);
        }
        if stop(kind) {
            continue;
        }
        let mut children = kind.children();
        children.reverse();
        stack.extend(children);
    }

    found
}

/// `yield` statements that produce the value of the conditional or loop owning `block`.
pub fn yields_targeting(tree: &SyntaxTree, block: NodeId) -> Vec<NodeId> {
    collect_targets(
        tree,
        block,
        |kind| {
            matches!(
                kind,
                NodeKind::Conditional { .. }
                    | NodeKind::While { .. }
                    | NodeKind::FunctionDef { .. }
                    | NodeKind::StructDef { .. }
            )
        },
        |kind| matches!(kind, NodeKind::Yield { .. }),
    )
}

/// `return` statements of the function whose body is `body`.
pub fn returns_of(tree: &SyntaxTree, body: NodeId) -> Vec<NodeId> {
    collect_targets(
        tree,
        body,
        |kind| matches!(kind, NodeKind::FunctionDef { .. } | NodeKind::StructDef { .. }),
        |kind| matches!(kind, NodeKind::Return { .. }),
    )
}

impl<'a> TypesPass<'a> {
    fn view(&self) -> SymbolView<'_> {
        SymbolView::new(&*self.table, self.dependencies)
    }

    fn lookup(&self, symbol: SymbolRef) -> Result<&Symbol, InternalError> {
        self.view()
            .symbol(symbol)
            .ok_or_else(|| InternalError::DanglingSymbol {
                symbol: symbol.to_string(),
            })
    }

    fn describe(&self, ty: Ty) -> String {
        self.view().describe(ty)
    }

    fn error(&mut self, error: ErrorImpl, node: NodeId) {
        self.diagnostics.error(error, self.tree.span(node).clone());
    }

    fn complete_analysis(&mut self, max_rounds: usize) -> Result<usize, InternalError> {
        let mut rounds = 0;

        loop {
            let pending = self.states.unresolved();
            if pending.is_empty() {
                break;
            }
            if rounds >= max_rounds {
                tracing::warn!(rounds, pending = pending.len(), "type fixpoint diverged");
                return Err(InternalError::FixpointDiverged { rounds });
            }

            rounds += 1;
            tracing::debug!(round = rounds, pending = pending.len(), "complete analysis round");

            if !self.sweep_until_stable(pending, rounds)? {
                break;
            }
        }

        Ok(rounds)
    }

    /// Re-settles `pending` in id order until a sweep changes nothing, so a chain of
    /// forward references settles within one round. Returns whether any sweep made
    /// progress.
    fn sweep_until_stable(
        &mut self,
        mut pending: Vec<(NodeId, ScopeId)>,
        round: usize,
    ) -> Result<bool, InternalError> {
        // Node types, symbol types and return types are each written at most once.
        let slots = self.tree.len() + 2 * self.table.symbols().count();
        let mut progressed = false;
        let mut sweeps = 0usize;

        while !pending.is_empty() {
            if sweeps > slots {
                tracing::warn!(round, sweeps, "type fixpoint sweep did not settle");
                return Err(InternalError::FixpointDiverged { rounds: round });
            }

            for (node, scope) in pending {
                self.navigator.restore(scope);
                self.settle(node)?;
            }

            sweeps += 1;
            if !self.states.take_progress() {
                break;
            }
            progressed = true;
            pending = self.states.unresolved();
        }

        tracing::trace!(sweeps, progressed, "sweeps settled");
        Ok(progressed)
    }

    fn report_unresolved(&mut self) {
        let pending: Vec<NodeId> = self
            .states
            .unresolved()
            .into_iter()
            .map(|(node, _)| node)
            .collect();
        if pending.is_empty() {
            return;
        }

        let declarations: Vec<NodeId> = pending
            .iter()
            .copied()
            .filter(|node| self.tree.kind(*node).is_declaration())
            .collect();
        let reported = if declarations.is_empty() {
            pending
        } else {
            declarations
        };

        for node in reported {
            let kind = self.tree.kind(node);
            let name = kind
                .declared_name()
                .unwrap_or_else(|| kind.kind_name())
                .to_string();
            self.error(ErrorImpl::UnresolvedType { name }, node);
        }
    }

    fn visit_children(&mut self, node: NodeId) -> Result<(), InternalError> {
        for child in self.tree.children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    /// First pass: every node once, children before parents.
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
                self.visit(*consequent)?;
                self.navigator.end_scope()?;

                if let Some(alternate) = alternate {
                    let entered = self.navigator.begin_alternate(self.binder, node)?;
                    self.visit(*alternate)?;
                    if entered {
                        self.navigator.end_scope()?;
                    }
                }
            }
            NodeKind::While { condition, body } => {
                self.visit(*condition)?;
                self.navigator.begin_loop_body(self.binder, node)?;
                self.visit(*body)?;
                self.navigator.end_scope()?;
            }
            NodeKind::Unary {
                operator: UnaryOperator::Negate,
                operand,
            } if matches!(
                tree.kind(*operand),
                NodeKind::Literal {
                    kind: LiteralKind::Number,
                    ..
                }
            ) =>
            {
                self.binder
                    .bind_negated_literal(tree, node, *operand, self.diagnostics)?;
                self.visit(*operand)?;
            }
            _ => self.visit_children(node)?,
        }

        self.settle(node)
    }

    /// Resolves `node` in the current scope and records the outcome.
    fn settle(&mut self, node: NodeId) -> Result<(), InternalError> {
        if self.states.status(node) == NodeStatus::Completed {
            return Ok(());
        }

        let scope = self.navigator.current();
        let ty = self.resolve(node)?;

        if !ty.is_resolved() {
            return self.states.mark_unresolved(node, scope);
        }

        self.binder.ensure(node, BoundFact::Expression);
        if self.binder.set_type(node, ty)? {
            self.states.record_progress();
        }
        self.states.mark_completed(node, scope);
        Ok(())
    }

    /// Records a declared symbol's type, noting progress when it changes.
    fn resolve_symbol(&mut self, symbol: SymbolId, ty: Ty) -> Result<Ty, InternalError> {
        if self.table.symbol_mut(symbol).resolve_type(ty)? {
            self.states.record_progress();
        }
        Ok(self.table.symbol(symbol).ty())
    }

    fn declared_symbol(&self, node: NodeId) -> Result<SymbolId, InternalError> {
        self.binder
            .expect(node, "declaration")?
            .declared_symbol()
            .ok_or(InternalError::NodeKindMismatch {
                node: node.0,
                expected: "declaration",
            })
    }

    /// The type of `node`, or `Unresolved` when it depends on something still pending.
    fn resolve(&mut self, node: NodeId) -> Result<Ty, InternalError> {
        let known = self.binder.type_of(node);
        if known.is_resolved() {
            return Ok(known);
        }

        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::CompilationUnit { .. }
            | NodeKind::Module { .. }
            | NodeKind::Namespace { .. }
            | NodeKind::Import { .. }
            | NodeKind::Block { .. }
            | NodeKind::ExpressionStatement { .. } => Ok(Ty::NoType),

            NodeKind::Literal { .. } => Ok(self
                .binder
                .bind_literal(tree, node, false, self.diagnostics)?
                .ty()),

            NodeKind::TypeName { name } => self.resolve_type_name(node, name),

            NodeKind::Identifier { .. } => {
                let view = SymbolView::new(&*self.table, self.dependencies);
                self.binder.resolve_identifier(node, view)
            }

            NodeKind::Binary {
                left,
                operator,
                right,
            } => {
                let ty = self.binder.resolve_binary(tree, node)?;
                let (left, right) = (self.binder.type_of(*left), self.binder.type_of(*right));
                if ty.is_error() && !left.is_error() && !right.is_error() {
                    let error = ErrorImpl::IncompatibleOperands {
                        operator: operator.to_string(),
                        left: self.describe(left),
                        right: self.describe(right),
                    };
                    self.error(error, node);
                }
                Ok(ty)
            }

            NodeKind::Unary { operator, operand } => {
                let ty = self.binder.resolve_unary(tree, node)?;
                let operand = self.binder.type_of(*operand);
                if ty.is_error() && !operand.is_error() {
                    let error = ErrorImpl::InvalidOperand {
                        operator: operator.to_string(),
                        operand: self.describe(operand),
                    };
                    self.error(error, node);
                }
                Ok(ty)
            }

            NodeKind::Grouping { .. } => self.binder.resolve_grouping(tree, node),

            NodeKind::Assignment {
                assignee,
                operator,
                value,
            } => {
                let ty = self.binder.resolve_assignment(tree, node)?;
                let (assignee, value) =
                    (self.binder.type_of(*assignee), self.binder.type_of(*value));
                if ty.is_error() && !assignee.is_error() && !value.is_error() {
                    let error = ErrorImpl::IncompatibleOperands {
                        operator: operator.to_string(),
                        left: self.describe(assignee),
                        right: self.describe(value),
                    };
                    self.error(error, node);
                }
                Ok(ty)
            }

            NodeKind::Call { callee, .. } => self.resolve_call(node, *callee),

            NodeKind::MemberAccess { target, member } => {
                self.resolve_member_access(node, *target, member)
            }

            NodeKind::StructInit { type_name, .. } => self.resolve_struct_init(node, *type_name),

            NodeKind::Conditional {
                consequent,
                alternate,
                ..
            } => {
                let mut types: Vec<Ty> = yields_targeting(tree, *consequent)
                    .into_iter()
                    .map(|target| self.binder.type_of(target))
                    .collect();

                if let Some(alternate) = alternate {
                    if matches!(tree.kind(*alternate), NodeKind::Conditional { .. }) {
                        types.push(self.binder.type_of(*alternate));
                    } else {
                        types.extend(
                            yields_targeting(tree, *alternate)
                                .into_iter()
                                .map(|target| self.binder.type_of(target)),
                        );
                    }
                }

                unify(types, "conditional with branches of different types")
            }

            NodeKind::While { .. } => Ok(Ty::Native(NativeType::Null)),

            NodeKind::Yield { value } => Ok(self.binder.type_of(*value)),

            NodeKind::Return { value, .. } => Ok(match value {
                Some(value) => self.binder.type_of(*value),
                None => Ty::Native(NativeType::Null),
            }),

            NodeKind::Let {
                type_annotation,
                initializer,
                ..
            } => {
                let source = (*type_annotation).or(*initializer);
                let ty = source.map_or(Ty::Error, |source| self.binder.type_of(source));
                if !ty.is_resolved() {
                    return Ok(Ty::Unresolved);
                }
                let symbol = self.declared_symbol(node)?;
                self.resolve_symbol(symbol, ty)
            }

            NodeKind::Parameter {
                type_annotation, ..
            }
            | NodeKind::Field {
                type_annotation, ..
            }
            | NodeKind::TypeAlias {
                target: type_annotation,
                ..
            } => {
                let ty = self.binder.type_of(*type_annotation);
                if !ty.is_resolved() {
                    return Ok(Ty::Unresolved);
                }
                let symbol = self.declared_symbol(node)?;
                self.resolve_symbol(symbol, ty)
            }

            NodeKind::StructDef { .. } => {
                let symbol = self.declared_symbol(node)?;
                Ok(self.table.symbol(symbol).ty())
            }

            NodeKind::FunctionDef {
                return_type, body, ..
            } => self.resolve_function(node, *return_type, *body),
        }
    }

    fn resolve_type_name(&mut self, node: NodeId, name: &str) -> Result<Ty, InternalError> {
        if let Some(BoundNode {
            fact: BoundFact::TypeName {
                symbol: Some(symbol),
            },
            ..
        }) = self.binder.get(node)
        {
            let symbol = *symbol;
            return Ok(self.lookup(symbol)?.ty());
        }

        let resolution = NameResolver::new(&*self.table, self.dependencies).find_recursively(
            name,
            self.navigator.current(),
            self.imports,
        );

        let error = match resolution {
            Resolution::Found(found) => {
                let symbol = self.lookup(found)?;
                if symbol.is_type() {
                    let ty = symbol.ty();
                    self.binder.ensure(
                        node,
                        BoundFact::TypeName {
                            symbol: Some(found),
                        },
                    );
                    return Ok(ty);
                }
                ErrorImpl::TypeDoesNotExist {
                    name: name.to_string(),
                }
            }
            Resolution::Unresolved => ErrorImpl::TypeDoesNotExist {
                name: name.to_string(),
            },
            Resolution::Ambiguous(candidates) => {
                let mut names = candidates
                    .into_iter()
                    .map(|candidate| Ok(self.lookup(candidate)?.qualified_name.clone()))
                    .collect::<Result<Vec<_>, InternalError>>()?;
                names.sort();
                ErrorImpl::AmbiguousName {
                    name: name.to_string(),
                    candidates: names,
                }
            }
        };

        self.error(error, node);
        self.binder.bind_with(node, || {
            BoundNode::typed(Ty::Error, BoundFact::TypeName { symbol: None })
        });
        Ok(Ty::Error)
    }

    fn resolve_call(&mut self, node: NodeId, callee: NodeId) -> Result<Ty, InternalError> {
        let callee_ty = self.binder.type_of(callee);
        if !callee_ty.is_resolved() || callee_ty.is_error() {
            return Ok(callee_ty);
        }

        let function = self
            .binder
            .get(callee)
            .and_then(BoundNode::referenced_symbol)
            .map(|symbol| self.lookup(symbol))
            .transpose()?
            .and_then(Symbol::as_function);

        match function {
            Some(function) => Ok(function.return_type()),
            None => {
                let error = ErrorImpl::NotCallable {
                    received: self.describe(callee_ty),
                };
                self.error(error, node);
                Ok(Ty::Error)
            }
        }
    }

    fn resolve_member_access(
        &mut self,
        node: NodeId,
        target: NodeId,
        member: &str,
    ) -> Result<Ty, InternalError> {
        // Module members were bound by name resolution.
        if let Some(found) = self.binder.get(node).and_then(BoundNode::referenced_symbol) {
            let symbol = self.lookup(found)?;
            return Ok(if symbol.is_type() || symbol.is_module_like() {
                Ty::NoType
            } else {
                symbol.ty()
            });
        }

        let target_ty = self.binder.type_of(target);
        if !target_ty.is_resolved() || target_ty.is_error() {
            return Ok(target_ty);
        }

        let found = match target_ty {
            Ty::Named(owner) => self
                .lookup(owner)?
                .as_type()
                .and_then(|type_symbol| type_symbol.members.get(member))
                .map(|member| SymbolRef {
                    unit: owner.unit,
                    symbol: *member,
                }),
            _ => None,
        };

        let Some(found) = found else {
            let error = ErrorImpl::MissingMemberField {
                type_name: self.describe(target_ty),
                member: member.to_string(),
            };
            self.error(error, node);
            self.binder.bind_with(node, || {
                BoundNode::typed(Ty::Error, BoundFact::Member { member: None })
            });
            return Ok(Ty::Error);
        };

        let ty = self.lookup(found)?.ty();
        self.binder.ensure(
            node,
            BoundFact::Member {
                member: Some(found),
            },
        );
        Ok(ty)
    }

    fn resolve_struct_init(&mut self, node: NodeId, type_name: NodeId) -> Result<Ty, InternalError> {
        let ty = self.binder.type_of(type_name);
        if !ty.is_resolved() || ty.is_error() {
            return Ok(ty);
        }

        if let Ty::Named(symbol) = ty {
            let is_struct = self
                .lookup(symbol)?
                .as_type()
                .is_some_and(|type_symbol| type_symbol.type_kind == TypeKind::Struct);
            if is_struct {
                return Ok(ty);
            }
        }

        let name = match self.tree.kind(type_name) {
            NodeKind::TypeName { name } => name.clone(),
            _ => self.describe(ty),
        };
        self.error(ErrorImpl::NotAStruct { name }, node);
        Ok(Ty::Error)
    }

    fn resolve_function(
        &mut self,
        node: NodeId,
        return_type: Option<NodeId>,
        body: NodeId,
    ) -> Result<Ty, InternalError> {
        let ty = match return_type {
            Some(annotation) => self.binder.type_of(annotation),
            None => {
                // A synthesized trailing return does not contribute once the body
                // returns explicitly.
                let types = returns_of(self.tree, body)
                    .into_iter()
                    .filter_map(|target| match self.tree.kind(target) {
                        NodeKind::Return {
                            is_implicit: false,
                            ..
                        } => Some(self.binder.type_of(target)),
                        _ => None,
                    })
                    .collect();
                unify(types, "function returning values of different types")?
            }
        };

        if !ty.is_resolved() {
            return Ok(Ty::Unresolved);
        }

        let symbol = self.declared_symbol(node)?;
        if self.table.symbol_mut(symbol).resolve_return_type(ty)? {
            self.states.record_progress();
        }
        Ok(ty)
    }
}

/// Single type shared by all `types`, `null` when there are none.
fn unify(types: Vec<Ty>, feature: &str) -> Result<Ty, InternalError> {
    if types.iter().any(|ty| !ty.is_resolved()) {
        return Ok(Ty::Unresolved);
    }
    if types.iter().any(Ty::is_error) {
        return Ok(Ty::Error);
    }

    let mut distinct: Vec<Ty> = vec![];
    for ty in types {
        if !distinct.contains(&ty) {
            distinct.push(ty);
        }
    }

    match distinct.as_slice() {
        [] => Ok(Ty::Native(NativeType::Null)),
        [single] => Ok(*single),
        _ => Err(InternalError::NotImplemented {
            feature: feature.to_string(),
        }),
    }
}
