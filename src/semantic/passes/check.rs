use crate::{
    ast::ast::{NodeId, NodeKind, SyntaxTree},
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
    semantic::{
        binder::{binder::Binder, bound::BoundNode},
        passes::names::dotted_name,
        symbols::{
            assembly::{Dependencies, SymbolView},
            ids::SymbolRef,
            symbol::{Symbol, SymbolKind},
            table::SymbolTable,
            types::{NativeType, Ty},
        },
    },
};

/// Outcome of asking whether a value may flow into a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignability {
    Legal,
    /// One side is already an error; nothing more to report.
    Suppressed,
    /// The value denotes a type or module rather than an instance.
    NotAValue,
    Illegal,
}

/// Identical types, or anything into `any`. No implicit conversions exist.
pub fn assignability(receiver: Ty, value: Ty) -> Assignability {
    if receiver.is_error() || value.is_error() || !receiver.is_resolved() || !value.is_resolved()
    {
        return Assignability::Suppressed;
    }
    if value == Ty::NoType {
        return Assignability::NotAValue;
    }
    if receiver == value || receiver == Ty::Any {
        return Assignability::Legal;
    }
    Assignability::Illegal
}

/// Whether an expression of this kind may stand alone as a statement.
pub fn is_statement_expression(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Conditional { .. }
            | NodeKind::While { .. }
            | NodeKind::Assignment { .. }
            | NodeKind::Call { .. }
    )
}

pub struct CheckPass<'a> {
    tree: &'a SyntaxTree,
    view: SymbolView<'a>,
    binder: &'a Binder,
    diagnostics: &'a mut Diagnostics,
}

#[tracing::instrument(skip_all)]
pub fn run(
    tree: &SyntaxTree,
    table: &SymbolTable,
    dependencies: &Dependencies,
    binder: &Binder,
    diagnostics: &mut Diagnostics,
) -> Result<(), InternalError> {
    let root = tree.root().ok_or(InternalError::MissingRoot)?;
    let before = diagnostics.len();

    let mut pass = CheckPass {
        tree,
        view: SymbolView::new(table, dependencies),
        binder,
        diagnostics,
    };
    pass.visit(root, None)?;

    tracing::debug!(
        reported = pass.diagnostics.len() - before,
        "well-formedness checked"
    );
    Ok(())
}

impl<'a> CheckPass<'a> {
    fn lookup(&self, symbol: SymbolRef) -> Result<&'a Symbol, InternalError> {
        self.view
            .symbol(symbol)
            .ok_or_else(|| InternalError::DanglingSymbol {
                symbol: symbol.to_string(),
            })
    }

    fn referenced(&self, node: NodeId) -> Option<SymbolRef> {
        self.binder.get(node).and_then(BoundNode::referenced_symbol)
    }

    fn error(&mut self, error: ErrorImpl, node: NodeId) {
        self.diagnostics.error(error, self.tree.span(node).clone());
    }

    /// Reports `value` flowing into a receiver of type `receiver`, at `value`.
    fn check_assignable(&mut self, receiver: Ty, value: NodeId) {
        let value_ty = self.binder.type_of(value);

        match assignability(receiver, value_ty) {
            Assignability::Legal | Assignability::Suppressed => {}
            Assignability::NotAValue => {
                let name = dotted_name(self.tree, value);
                self.error(ErrorImpl::TypeUsedAsValue { name }, value);
            }
            Assignability::Illegal => {
                let error = ErrorImpl::IllegalAssignmentType {
                    expected: self.view.describe(receiver),
                    received: self.view.describe(value_ty),
                };
                self.error(error, value);
            }
        }
    }

    /// `function` is the symbol of the innermost enclosing function.
    fn visit(&mut self, node: NodeId, function: Option<SymbolRef>) -> Result<(), InternalError> {
        let tree = self.tree;

        let function = match tree.kind(node) {
            NodeKind::FunctionDef { .. } => {
                let symbol = self
                    .binder
                    .expect(node, "function")?
                    .declared_symbol()
                    .ok_or(InternalError::NodeKindMismatch {
                        node: node.0,
                        expected: "function",
                    })?;
                Some(SymbolRef {
                    unit: self.view.local.unit(),
                    symbol,
                })
            }
            _ => function,
        };

        match tree.kind(node) {
            NodeKind::ExpressionStatement { expression } => {
                let kind = tree.kind(*expression);
                if !is_statement_expression(kind) {
                    let error = ErrorImpl::InvalidExpressionStatement {
                        kind: kind.kind_name().to_string(),
                    };
                    self.error(error, *expression);
                }
            }
            NodeKind::Let {
                type_annotation,
                initializer: Some(initializer),
                ..
            } => {
                let receiver = type_annotation.map_or(Ty::Any, |annotation| {
                    self.binder.type_of(annotation)
                });
                self.check_assignable(receiver, *initializer);
            }
            NodeKind::Assignment {
                assignee,
                operator,
                value,
            } => {
                self.check_assignee(*assignee)?;
                if operator.binary().is_none() {
                    let receiver = self.binder.type_of(*assignee);
                    self.check_assignable(receiver, *value);
                }
            }
            NodeKind::Call { callee, arguments } => self.check_call(*callee, arguments)?,
            NodeKind::Return { value, .. } => {
                if let Some(function) = function {
                    let expected = self
                        .lookup(function)?
                        .as_function()
                        .map_or(Ty::Error, |function| function.return_type());
                    match value {
                        Some(value) => self.check_assignable(expected, *value),
                        None => {
                            let null = Ty::Native(NativeType::Null);
                            if assignability(expected, null) == Assignability::Illegal {
                                let error = ErrorImpl::IllegalAssignmentType {
                                    expected: self.view.describe(expected),
                                    received: null.to_string(),
                                };
                                self.error(error, node);
                            }
                        }
                    }
                }
            }
            NodeKind::StructInit { type_name, fields } => {
                self.check_struct_init(node, *type_name, fields)?
            }
            NodeKind::Conditional { condition, .. } | NodeKind::While { condition, .. } => {
                self.check_assignable(Ty::Native(NativeType::Bool), *condition);
            }
            _ => {}
        }

        for child in tree.children(node) {
            self.visit(child, function)?;
        }
        Ok(())
    }

    fn check_assignee(&mut self, assignee: NodeId) -> Result<(), InternalError> {
        if self.binder.type_of(assignee).is_error() {
            return Ok(());
        }

        let target = match self.tree.kind(assignee) {
            NodeKind::Identifier { .. } | NodeKind::MemberAccess { .. } => {
                self.referenced(assignee)
            }
            _ => None,
        };
        let Some(target) = target else {
            self.error(ErrorImpl::NotAssignable, assignee);
            return Ok(());
        };

        let symbol = self.lookup(target)?;
        match symbol.kind {
            SymbolKind::Local { is_constant: true } => {
                let name = symbol.name.clone();
                self.error(ErrorImpl::AssignToConstant { name }, assignee);
            }
            SymbolKind::Local { .. } | SymbolKind::Parameter | SymbolKind::MemberField => {}
            _ => self.error(ErrorImpl::NotAssignable, assignee),
        }
        Ok(())
    }

    fn check_call(&mut self, callee: NodeId, arguments: &[NodeId]) -> Result<(), InternalError> {
        let Some(target) = self.referenced(callee) else {
            return Ok(());
        };
        let Some(function) = self.lookup(target)?.as_function() else {
            return Ok(());
        };

        if function.parameters.len() != arguments.len() {
            let error = ErrorImpl::ArgumentCountMismatch {
                expected: function.parameters.len(),
                received: arguments.len(),
            };
            self.error(error, callee);
            return Ok(());
        }

        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            let parameter = self.lookup(SymbolRef {
                unit: target.unit,
                symbol: *parameter,
            })?;
            self.check_assignable(parameter.ty(), *argument);
        }
        Ok(())
    }

    fn check_struct_init(
        &mut self,
        node: NodeId,
        type_name: NodeId,
        fields: &[(String, NodeId)],
    ) -> Result<(), InternalError> {
        let Ty::Named(owner) = self.binder.type_of(node) else {
            return Ok(());
        };
        let owner_symbol = self.lookup(owner)?;
        let Some(type_symbol) = owner_symbol.as_type() else {
            return Ok(());
        };
        let type_name_text = match self.tree.kind(type_name) {
            NodeKind::TypeName { name } => name.clone(),
            _ => owner_symbol.qualified_name.clone(),
        };

        for (field, value) in fields {
            let member = type_symbol
                .members
                .get(field)
                .map(|member| {
                    self.lookup(SymbolRef {
                        unit: owner.unit,
                        symbol: *member,
                    })
                })
                .transpose()?
                .filter(|member| matches!(member.kind, SymbolKind::MemberField));

            match member {
                Some(member) => self.check_assignable(member.ty(), *value),
                None => {
                    let error = ErrorImpl::MissingMemberField {
                        type_name: type_name_text.clone(),
                        member: field.clone(),
                    };
                    self.error(error, *value);
                }
            }
        }

        for (name, member) in &type_symbol.members {
            let member = self.lookup(SymbolRef {
                unit: owner.unit,
                symbol: *member,
            })?;
            let initialized = fields.iter().any(|(field, _)| field == name);
            if matches!(member.kind, SymbolKind::MemberField) && !initialized {
                let error = ErrorImpl::MissingFieldInitializer {
                    type_name: type_name_text.clone(),
                    field: name.clone(),
                };
                self.error(error, node);
            }
        }

        Ok(())
    }
}
