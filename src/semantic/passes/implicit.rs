use crate::{
    ast::ast::{NodeId, NodeKind, SyntaxTree},
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
};

/// Control-flow requirements of the code being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowContext {
    pub return_required: bool,
    pub yield_required: bool,
    pub return_allowed: bool,
    pub yield_allowed: bool,
}

impl FlowContext {
    pub fn function_body() -> Self {
        FlowContext {
            return_required: true,
            yield_required: false,
            return_allowed: true,
            yield_allowed: false,
        }
    }

    pub fn branch(self, value_position: bool) -> Self {
        FlowContext {
            return_required: false,
            yield_required: value_position,
            return_allowed: self.return_allowed,
            yield_allowed: true,
        }
    }

    pub fn loop_body(self) -> Self {
        FlowContext {
            return_required: false,
            yield_required: false,
            return_allowed: self.return_allowed,
            yield_allowed: true,
        }
    }

    /// Bare nested blocks share the permissions of their parent but owe nothing.
    pub fn nested(self) -> Self {
        FlowContext {
            return_required: false,
            yield_required: false,
            ..self
        }
    }
}

/// Whether a construct definitely returns or definitely yields on every path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub returns: bool,
    pub yields: bool,
}

impl Completion {
    pub fn terminates(self) -> bool {
        self.returns || self.yields
    }
}

/// Synthesizes implicit returns and checks return/yield placement.
pub struct ImplicitPass<'a> {
    tree: &'a mut SyntaxTree,
    diagnostics: &'a mut Diagnostics,
    pub synthesized: usize,
}

#[tracing::instrument(skip_all)]
pub fn run(tree: &mut SyntaxTree, diagnostics: &mut Diagnostics) -> Result<usize, InternalError> {
    let root = tree.root().ok_or(InternalError::MissingRoot)?;
    let mut pass = ImplicitPass {
        tree,
        diagnostics,
        synthesized: 0,
    };

    pass.visit_statement(root, FlowContext::default())?;
    tracing::debug!(synthesized = pass.synthesized, "implicit nodes synthesized");
    Ok(pass.synthesized)
}

impl<'a> ImplicitPass<'a> {
    fn visit_statement(&mut self, node: NodeId, context: FlowContext) -> Result<Completion, InternalError> {
        let kind = self.tree.kind(node).clone();

        match kind {
            NodeKind::CompilationUnit { items: members }
            | NodeKind::Module { body: members, .. }
            | NodeKind::Namespace { body: members, .. }
            | NodeKind::StructDef { members, .. } => {
                for member in members {
                    self.visit_statement(member, FlowContext::default())?;
                }
                Ok(Completion::default())
            }
            NodeKind::FunctionDef { body, .. } => {
                self.visit_block(body, FlowContext::function_body())?;
                Ok(Completion::default())
            }
            NodeKind::Block { .. } => self.visit_block(node, context.nested()),
            NodeKind::Return { value, .. } => {
                if !context.return_allowed {
                    self.diagnostics
                        .error(ErrorImpl::ReturnNotAllowed, self.tree.span(node).clone());
                }
                if let Some(value) = value {
                    self.visit_expression(value, context, true)?;
                }
                Ok(Completion {
                    returns: true,
                    yields: false,
                })
            }
            NodeKind::Yield { value } => {
                if !context.yield_allowed {
                    self.diagnostics
                        .error(ErrorImpl::YieldNotAllowed, self.tree.span(node).clone());
                }
                self.visit_expression(value, context, true)?;
                Ok(Completion {
                    returns: false,
                    yields: true,
                })
            }
            NodeKind::ExpressionStatement { expression } => {
                self.visit_expression(expression, context, false)
            }
            NodeKind::Let {
                initializer: Some(initializer),
                ..
            } => {
                self.visit_expression(initializer, context, true)?;
                Ok(Completion::default())
            }
            _ => Ok(Completion::default()),
        }
    }

    fn visit_expression(
        &mut self,
        node: NodeId,
        context: FlowContext,
        value_position: bool,
    ) -> Result<Completion, InternalError> {
        match self.tree.kind(node).clone() {
            NodeKind::Conditional { .. } => {
                let completion = self.visit_conditional(node, context, value_position)?;
                // Yields are absorbed by the conditional itself.
                Ok(Completion {
                    returns: completion.returns,
                    yields: false,
                })
            }
            NodeKind::While { condition, body } => {
                self.visit_expression(condition, context, true)?;
                self.visit_block(body, context.loop_body())?;
                Ok(Completion::default())
            }
            kind => {
                for child in kind.children() {
                    self.visit_expression(child, context, true)?;
                }
                Ok(Completion::default())
            }
        }
    }

    fn visit_conditional(
        &mut self,
        node: NodeId,
        context: FlowContext,
        value_position: bool,
    ) -> Result<Completion, InternalError> {
        let NodeKind::Conditional {
            condition,
            consequent,
            alternate,
        } = self.tree.kind(node).clone()
        else {
            return Err(InternalError::NodeKindMismatch {
                node: node.0,
                expected: "conditional",
            });
        };

        self.visit_expression(condition, context, true)?;

        let branch = context.branch(value_position);
        let then = self.visit_block(consequent, branch)?;

        let Some(alternate) = alternate else {
            if value_position {
                self.diagnostics
                    .error(ErrorImpl::NonExhaustiveYield, self.tree.span(node).clone());
            }
            return Ok(Completion::default());
        };

        let is_else_if = matches!(self.tree.kind(alternate), NodeKind::Conditional { .. });
        let otherwise = if is_else_if {
            self.visit_conditional(alternate, context, value_position)?
        } else {
            self.visit_block(alternate, branch)?
        };

        if !value_position {
            let disagree = |a: Completion, b: Completion| a.yields && !b.terminates();
            if disagree(then, otherwise) || disagree(otherwise, then) {
                self.diagnostics
                    .error(ErrorImpl::InconsistentYield, self.tree.span(node).clone());
            }
        }

        Ok(Completion {
            returns: then.returns && otherwise.returns,
            yields: then.yields && otherwise.yields,
        })
    }

    fn visit_block(&mut self, block: NodeId, context: FlowContext) -> Result<Completion, InternalError> {
        let NodeKind::Block { statements } = self.tree.kind(block).clone() else {
            return Err(InternalError::NodeKindMismatch {
                node: block.0,
                expected: "block",
            });
        };

        let mut completion = Completion::default();
        let mut reported_unreachable = false;

        for statement in statements {
            if completion.terminates() && !reported_unreachable {
                self.diagnostics.warning(
                    ErrorImpl::UnreachableStatement,
                    self.tree.span(statement).clone(),
                );
                reported_unreachable = true;
            }

            let inner = self.visit_statement(statement, context)?;
            completion.returns |= inner.returns;
            completion.yields |= inner.yields;
        }

        if context.return_required && !completion.returns {
            self.append_implicit_return(block)?;
            completion.returns = true;
        }

        if context.yield_required && !completion.terminates() {
            self.diagnostics.error(
                ErrorImpl::NonExhaustiveYield,
                self.tree.span(block).end_point(),
            );
        }

        Ok(completion)
    }

    fn append_implicit_return(&mut self, block: NodeId) -> Result<(), InternalError> {
        let span = self.tree.span(block).end_point();
        let implicit = self.tree.push(
            NodeKind::Return {
                value: None,
                is_implicit: true,
            },
            span,
        );

        match &mut self.tree.get_mut(block).kind {
            NodeKind::Block { statements } => {
                statements.push(implicit);
                self.synthesized += 1;
                tracing::trace!(%block, %implicit, "appended implicit return");
                Ok(())
            }
            _ => Err(InternalError::NodeKindMismatch {
                node: block.0,
                expected: "block",
            }),
        }
    }
}
