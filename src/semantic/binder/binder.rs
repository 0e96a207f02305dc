use crate::{
    ast::{
        ast::{LiteralKind, NodeId, NodeKind, SyntaxTree},
        operators::{AssignmentOperator, BinaryOperator, UnaryOperator},
    },
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
    semantic::symbols::{
        assembly::SymbolView,
        ids::ScopeId,
        symbol::resolve_slot,
        types::{coalesce, NativeType, NumericFamily, Ty},
    },
};

use super::{
    bound::{AssociatedType, BoundFact, BoundNode, ConstantValue},
    literals::{parse_keyword, parse_numeric, parse_string, ParsedLiteral},
};

/// The bound-fact overlay: one optional record per syntax node, addressed by [`NodeId`].
///
/// Records are created once and never replaced. Their type only moves from
/// [`Ty::Unresolved`] to a resolved value.
#[derive(Debug, Default, Clone)]
pub struct Binder {
    nodes: Vec<Option<BoundNode>>,
}

fn not_bound(node: NodeId, expected: &'static str) -> InternalError {
    InternalError::NodeNotBound {
        node: node.0,
        expected,
    }
}

fn kind_mismatch(node: NodeId, expected: &'static str) -> InternalError {
    InternalError::NodeKindMismatch {
        node: node.0,
        expected,
    }
}

impl Binder {
    pub fn new() -> Self {
        Binder::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&BoundNode> {
        self.nodes.get(node.index()).and_then(Option::as_ref)
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// The record of a node an earlier pass must already have bound.
    pub fn expect(&self, node: NodeId, expected: &'static str) -> Result<&BoundNode, InternalError> {
        self.get(node).ok_or_else(|| not_bound(node, expected))
    }

    /// Returns the existing record for `node`, or registers the one built by `make`.
    pub fn bind_with(&mut self, node: NodeId, make: impl FnOnce() -> BoundNode) -> &BoundNode {
        let index = node.index();
        if self.nodes.len() <= index {
            self.nodes.resize(index + 1, None);
        }

        self.nodes[index].get_or_insert_with(make)
    }

    /// Binds `node` with an unresolved type if it has no record yet.
    pub fn ensure(&mut self, node: NodeId, fact: BoundFact) -> &BoundNode {
        self.bind_with(node, || BoundNode::new(fact))
    }

    /// Records the resolved type of a bound node. Returns whether anything changed.
    pub fn set_type(&mut self, node: NodeId, ty: Ty) -> Result<bool, InternalError> {
        let record = self
            .nodes
            .get_mut(node.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| not_bound(node, "typed node"))?;

        resolve_slot(&mut record.ty, ty, &format!("node {}", node))
    }

    /// The type recorded for `node`, `Unresolved` if it is not bound.
    pub fn type_of(&self, node: NodeId) -> Ty {
        self.get(node).map(BoundNode::ty).unwrap_or(Ty::Unresolved)
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn function_scope(&self, node: NodeId) -> Result<ScopeId, InternalError> {
        match self.expect(node, "function")?.fact {
            BoundFact::Function { scope, .. } => Ok(scope),
            _ => Err(kind_mismatch(node, "function")),
        }
    }

    pub fn struct_scope(&self, node: NodeId) -> Result<ScopeId, InternalError> {
        match self.expect(node, "struct")?.fact {
            BoundFact::Struct { scope, .. } => Ok(scope),
            _ => Err(kind_mismatch(node, "struct")),
        }
    }

    pub fn module_scope(&self, node: NodeId) -> Result<ScopeId, InternalError> {
        match self.expect(node, "module")?.fact {
            BoundFact::Module { scope, .. } => Ok(scope),
            _ => Err(kind_mismatch(node, "module")),
        }
    }

    pub fn consequent_scope(&self, node: NodeId) -> Result<ScopeId, InternalError> {
        match self.expect(node, "conditional")?.fact {
            BoundFact::Conditional { then_scope, .. } => Ok(then_scope),
            _ => Err(kind_mismatch(node, "conditional")),
        }
    }

    /// `None` when the alternate is missing or is an `else if`, which shares the
    /// enclosing scope.
    pub fn alternate_scope(&self, node: NodeId) -> Result<Option<ScopeId>, InternalError> {
        match self.expect(node, "conditional")?.fact {
            BoundFact::Conditional { else_scope, .. } => Ok(else_scope),
            _ => Err(kind_mismatch(node, "conditional")),
        }
    }

    pub fn loop_scope(&self, node: NodeId) -> Result<ScopeId, InternalError> {
        match self.expect(node, "loop")?.fact {
            BoundFact::Loop { body_scope } => Ok(body_scope),
            _ => Err(kind_mismatch(node, "loop")),
        }
    }

    /// Binds a literal node, interpreting its lexeme. Malformed literals are reported to
    /// `diagnostics` and bound with an error type.
    pub fn bind_literal(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        negated: bool,
        diagnostics: &mut Diagnostics,
    ) -> Result<&BoundNode, InternalError> {
        if self.is_bound(node) {
            return self.expect(node, "literal");
        }

        let NodeKind::Literal { kind, lexeme } = tree.kind(node) else {
            return Err(kind_mismatch(node, "literal"));
        };

        let record = match interpret_literal(*kind, lexeme, negated) {
            Ok(parsed) => literal_record(parsed),
            Err((recovered, error)) => {
                diagnostics.error(error, tree.span(node).clone());
                match recovered {
                    Some(parsed) => literal_record(parsed),
                    None => BoundNode::typed(
                        Ty::Error,
                        BoundFact::Literal {
                            value: ConstantValue::Null,
                        },
                    ),
                }
            }
        };

        tracing::trace!(%node, ty = %record.ty, "bound literal");
        Ok(self.bind_with(node, || record))
    }

    /// Folds a unary minus into the numeric literal it applies to, so the literal is
    /// range-checked with its sign. Both nodes end up with the same record.
    pub fn bind_negated_literal(
        &mut self,
        tree: &SyntaxTree,
        unary: NodeId,
        literal: NodeId,
        diagnostics: &mut Diagnostics,
    ) -> Result<&BoundNode, InternalError> {
        if self.is_bound(unary) {
            return self.expect(unary, "negated literal");
        }

        let record = self
            .bind_literal(tree, literal, true, diagnostics)?
            .clone();
        Ok(self.bind_with(unary, || record))
    }

    pub fn resolve_binary(&self, tree: &SyntaxTree, node: NodeId) -> Result<Ty, InternalError> {
        match tree.kind(node) {
            NodeKind::Binary {
                left,
                operator,
                right,
            } => Ok(binary_result(
                *operator,
                self.type_of(*left),
                self.type_of(*right),
            )),
            _ => Err(kind_mismatch(node, "binary expression")),
        }
    }

    pub fn resolve_unary(&self, tree: &SyntaxTree, node: NodeId) -> Result<Ty, InternalError> {
        match tree.kind(node) {
            NodeKind::Unary { operator, operand } => {
                Ok(unary_result(*operator, self.type_of(*operand)))
            }
            _ => Err(kind_mismatch(node, "unary expression")),
        }
    }

    pub fn resolve_grouping(&self, tree: &SyntaxTree, node: NodeId) -> Result<Ty, InternalError> {
        match tree.kind(node) {
            NodeKind::Grouping { inner } => Ok(self.type_of(*inner)),
            _ => Err(kind_mismatch(node, "grouping")),
        }
    }

    pub fn resolve_assignment(&self, tree: &SyntaxTree, node: NodeId) -> Result<Ty, InternalError> {
        match tree.kind(node) {
            NodeKind::Assignment {
                assignee,
                operator,
                value,
            } => Ok(assignment_result(
                *operator,
                self.type_of(*assignee),
                self.type_of(*value),
            )),
            _ => Err(kind_mismatch(node, "assignment")),
        }
    }

    /// Identifiers naming types or modules have no instance type.
    pub fn resolve_identifier(&self, node: NodeId, view: SymbolView) -> Result<Ty, InternalError> {
        match self.expect(node, "identifier")?.fact {
            BoundFact::Identifier {
                associated_type: AssociatedType::TypeItself | AssociatedType::NoInstance,
                ..
            } => Ok(Ty::NoType),
            BoundFact::Identifier { symbol, .. } => Ok(view
                .symbol(symbol)
                .map(|symbol| symbol.ty())
                .unwrap_or(Ty::Error)),
            _ => Err(kind_mismatch(node, "identifier")),
        }
    }
}

type LiteralFailure = (Option<ParsedLiteral>, ErrorImpl);

fn interpret_literal(
    kind: LiteralKind,
    lexeme: &str,
    negated: bool,
) -> Result<ParsedLiteral, LiteralFailure> {
    match kind {
        LiteralKind::Number => {
            parse_numeric(lexeme, negated).map_err(|error| (error.recovered, error.error))
        }
        LiteralKind::String => parse_string(lexeme)
            .map(|value| ParsedLiteral {
                ty: NativeType::String,
                value: ConstantValue::Str(value),
            })
            .map_err(|error| (None, error)),
        LiteralKind::Boolean | LiteralKind::Null => parse_keyword(lexeme).ok_or_else(|| {
            (
                None,
                ErrorImpl::UnrecognisedToken {
                    token: lexeme.to_string(),
                },
            )
        }),
    }
}

fn literal_record(parsed: ParsedLiteral) -> BoundNode {
    BoundNode::typed(
        Ty::Native(parsed.ty),
        BoundFact::Literal {
            value: parsed.value,
        },
    )
}

/// Result type of a binary operation, `Unresolved` while an operand is.
pub fn binary_result(operator: BinaryOperator, left: Ty, right: Ty) -> Ty {
    if !left.is_resolved() || !right.is_resolved() {
        return Ty::Unresolved;
    }
    if left.is_error() || right.is_error() {
        return Ty::Error;
    }
    if operator.is_comparison() || operator.is_logical() {
        return Ty::Native(NativeType::Bool);
    }

    match (left.native(), right.native()) {
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
            coalesce(l, r).map(Ty::Native).unwrap_or(Ty::Error)
        }
        _ if left == right && left != Ty::NoType => left,
        _ => Ty::Error,
    }
}

pub fn unary_result(operator: UnaryOperator, operand: Ty) -> Ty {
    if !operand.is_resolved() {
        return Ty::Unresolved;
    }

    match (operator, operand.native()) {
        (_, _) if operand.is_error() => Ty::Error,
        (UnaryOperator::Negate, Some(native))
            if native.is_numeric() && native.family() != Some(NumericFamily::Unsigned) =>
        {
            operand
        }
        (UnaryOperator::Not, Some(NativeType::Bool)) => operand,
        _ => Ty::Error,
    }
}

/// An assignment has the type of its assignee; compound operators must also be valid
/// for the operand pair.
pub fn assignment_result(operator: AssignmentOperator, assignee: Ty, value: Ty) -> Ty {
    if !assignee.is_resolved() || !value.is_resolved() {
        return Ty::Unresolved;
    }
    if assignee.is_error() || value.is_error() {
        return Ty::Error;
    }

    match operator.binary() {
        Some(binary) if binary_result(binary, assignee, value).is_error() => Ty::Error,
        _ => assignee,
    }
}
