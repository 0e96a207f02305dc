use std::fmt::Display;

use thiserror::Error;

use crate::{Position, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable numeric diagnostic codes.
///
/// 1xxx lexing and parsing, 2xxx declarations and names, 3xxx literals,
/// 4xxx control flow, 5xxx types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    UnrecognisedToken = 1001,
    UnexpectedToken = 1002,
    UnexpectedTokenDetailed = 1003,

    DuplicateDefinition = 2001,
    UnresolvedName = 2002,
    AmbiguousName = 2003,
    TypeDoesNotExist = 2004,
    ImportNotFound = 2005,

    NumericLiteralOverflow = 3001,
    MalformedNumericLiteral = 3002,
    UnsupportedNumericLiteral = 3003,
    InvalidNumericSuffix = 3004,
    MalformedStringLiteral = 3005,

    ReturnNotAllowed = 4001,
    YieldNotAllowed = 4002,
    NonExhaustiveYield = 4003,
    InconsistentYield = 4004,
    UnreachableStatement = 4005,

    IllegalAssignmentType = 5001,
    MissingMemberField = 5002,
    UnresolvedType = 5003,
    InvalidExpressionStatement = 5004,
    IncompatibleOperands = 5005,
    NotCallable = 5006,
    ArgumentCountMismatch = 5007,
    MissingFieldInitializer = 5008,
    AssignToConstant = 5009,
    NotAssignable = 5010,
    InvalidOperand = 5011,
    NotAStruct = 5012,
    TypeUsedAsValue = 5013,
}

impl DiagnosticCode {
    pub fn number(self) -> u32 {
        self as u32
    }
}

/// A user-facing problem found while compiling.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    internal_error: ErrorImpl,
    severity: Severity,
    span: Span,
}

impl Diagnostic {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Diagnostic {
            internal_error: error_impl,
            severity: Severity::Error,
            span,
        }
    }

    pub fn warning(error_impl: ErrorImpl, span: Span) -> Self {
        Diagnostic {
            internal_error: error_impl,
            severity: Severity::Warning,
            span,
        }
    }

    /// Builds a diagnostic for a zero-width location.
    pub fn at(error_impl: ErrorImpl, position: Position) -> Self {
        Diagnostic::new(
            error_impl,
            Span {
                start: position.clone(),
                end: position,
            },
        )
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_position(&self) -> &Position {
        &self.span.start
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn code(&self) -> DiagnosticCode {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => DiagnosticCode::UnrecognisedToken,
            ErrorImpl::UnexpectedToken { .. } => DiagnosticCode::UnexpectedToken,
            ErrorImpl::UnexpectedTokenDetailed { .. } => DiagnosticCode::UnexpectedTokenDetailed,
            ErrorImpl::DuplicateDefinition { .. } => DiagnosticCode::DuplicateDefinition,
            ErrorImpl::UnresolvedName { .. } => DiagnosticCode::UnresolvedName,
            ErrorImpl::AmbiguousName { .. } => DiagnosticCode::AmbiguousName,
            ErrorImpl::TypeDoesNotExist { .. } => DiagnosticCode::TypeDoesNotExist,
            ErrorImpl::ImportNotFound { .. } => DiagnosticCode::ImportNotFound,
            ErrorImpl::NumericLiteralOverflow { .. } => DiagnosticCode::NumericLiteralOverflow,
            ErrorImpl::MalformedNumericLiteral { .. } => DiagnosticCode::MalformedNumericLiteral,
            ErrorImpl::UnsupportedNumericLiteral { .. } => {
                DiagnosticCode::UnsupportedNumericLiteral
            }
            ErrorImpl::InvalidNumericSuffix { .. } => DiagnosticCode::InvalidNumericSuffix,
            ErrorImpl::MalformedStringLiteral { .. } => DiagnosticCode::MalformedStringLiteral,
            ErrorImpl::ReturnNotAllowed => DiagnosticCode::ReturnNotAllowed,
            ErrorImpl::YieldNotAllowed => DiagnosticCode::YieldNotAllowed,
            ErrorImpl::NonExhaustiveYield => DiagnosticCode::NonExhaustiveYield,
            ErrorImpl::InconsistentYield => DiagnosticCode::InconsistentYield,
            ErrorImpl::UnreachableStatement => DiagnosticCode::UnreachableStatement,
            ErrorImpl::IllegalAssignmentType { .. } => DiagnosticCode::IllegalAssignmentType,
            ErrorImpl::MissingMemberField { .. } => DiagnosticCode::MissingMemberField,
            ErrorImpl::UnresolvedType { .. } => DiagnosticCode::UnresolvedType,
            ErrorImpl::InvalidExpressionStatement { .. } => {
                DiagnosticCode::InvalidExpressionStatement
            }
            ErrorImpl::IncompatibleOperands { .. } => DiagnosticCode::IncompatibleOperands,
            ErrorImpl::NotCallable { .. } => DiagnosticCode::NotCallable,
            ErrorImpl::ArgumentCountMismatch { .. } => DiagnosticCode::ArgumentCountMismatch,
            ErrorImpl::MissingFieldInitializer { .. } => DiagnosticCode::MissingFieldInitializer,
            ErrorImpl::AssignToConstant { .. } => DiagnosticCode::AssignToConstant,
            ErrorImpl::NotAssignable => DiagnosticCode::NotAssignable,
            ErrorImpl::InvalidOperand { .. } => DiagnosticCode::InvalidOperand,
            ErrorImpl::NotAStruct { .. } => DiagnosticCode::NotAStruct,
            ErrorImpl::TypeUsedAsValue { .. } => DiagnosticCode::TypeUsedAsValue,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::DuplicateDefinition { .. } => "DuplicateDefinition",
            ErrorImpl::UnresolvedName { .. } => "UnresolvedName",
            ErrorImpl::AmbiguousName { .. } => "AmbiguousName",
            ErrorImpl::TypeDoesNotExist { .. } => "TypeDoesNotExist",
            ErrorImpl::ImportNotFound { .. } => "ImportNotFound",
            ErrorImpl::NumericLiteralOverflow { .. } => "NumericLiteralOverflow",
            ErrorImpl::MalformedNumericLiteral { .. } => "MalformedNumericLiteral",
            ErrorImpl::UnsupportedNumericLiteral { .. } => "UnsupportedNumericLiteral",
            ErrorImpl::InvalidNumericSuffix { .. } => "InvalidNumericSuffix",
            ErrorImpl::MalformedStringLiteral { .. } => "MalformedStringLiteral",
            ErrorImpl::ReturnNotAllowed => "ReturnNotAllowed",
            ErrorImpl::YieldNotAllowed => "YieldNotAllowed",
            ErrorImpl::NonExhaustiveYield => "NonExhaustiveYield",
            ErrorImpl::InconsistentYield => "InconsistentYield",
            ErrorImpl::UnreachableStatement => "UnreachableStatement",
            ErrorImpl::IllegalAssignmentType { .. } => "IllegalAssignmentType",
            ErrorImpl::MissingMemberField { .. } => "MissingMemberField",
            ErrorImpl::UnresolvedType { .. } => "UnresolvedType",
            ErrorImpl::InvalidExpressionStatement { .. } => "InvalidExpressionStatement",
            ErrorImpl::IncompatibleOperands { .. } => "IncompatibleOperands",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::MissingFieldInitializer { .. } => "MissingFieldInitializer",
            ErrorImpl::AssignToConstant { .. } => "AssignToConstant",
            ErrorImpl::NotAssignable => "NotAssignable",
            ErrorImpl::InvalidOperand { .. } => "InvalidOperand",
            ErrorImpl::NotAStruct { .. } => "NotAStruct",
            ErrorImpl::TypeUsedAsValue { .. } => "TypeUsedAsValue",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::DuplicateDefinition { name } => {
                ErrorTip::Suggestion(format!("`{}` is already defined in this scope", name))
            }
            ErrorImpl::UnresolvedName { name } => {
                ErrorTip::Suggestion(format!("Name `{}` could not be resolved", name))
            }
            ErrorImpl::AmbiguousName { name, candidates } => ErrorTip::Suggestion(format!(
                "Name `{}` is ambiguous between {}",
                name,
                candidates.join(", ")
            )),
            ErrorImpl::TypeDoesNotExist { name } => {
                ErrorTip::Suggestion(format!("Type `{}` does not exist", name))
            }
            ErrorImpl::ImportNotFound { path } => {
                ErrorTip::Suggestion(format!("No module or namespace named `{}`", path))
            }
            ErrorImpl::NumericLiteralOverflow { literal, type_ } => ErrorTip::Suggestion(
                format!("Literal `{}` does not fit in `{}`", literal, type_),
            ),
            ErrorImpl::MalformedNumericLiteral { literal, reason } => {
                ErrorTip::Suggestion(format!("Invalid number `{}`: {}", literal, reason))
            }
            ErrorImpl::UnsupportedNumericLiteral { literal, reason } => {
                ErrorTip::Suggestion(format!("Number `{}` is not supported yet: {}", literal, reason))
            }
            ErrorImpl::InvalidNumericSuffix { literal, suffix } => ErrorTip::Suggestion(
                format!("Unknown suffix `{}` on number `{}`", suffix, literal),
            ),
            ErrorImpl::MalformedStringLiteral { literal } => {
                ErrorTip::Suggestion(format!("String `{}` is not properly delimited", literal))
            }
            ErrorImpl::ReturnNotAllowed => {
                ErrorTip::Suggestion(String::from("`return` is only allowed inside a function"))
            }
            ErrorImpl::YieldNotAllowed => ErrorTip::Suggestion(String::from(
                "`yield` is only allowed inside a conditional or loop body",
            )),
            ErrorImpl::NonExhaustiveYield => ErrorTip::Suggestion(String::from(
                "Not every path yields a value",
            )),
            ErrorImpl::InconsistentYield => ErrorTip::Suggestion(String::from(
                "Both branches must agree on whether they yield a value",
            )),
            ErrorImpl::UnreachableStatement => {
                ErrorTip::Suggestion(String::from("This statement is never executed"))
            }
            ErrorImpl::IllegalAssignmentType { expected, received } => ErrorTip::Suggestion(
                format!("Expected type `{}`, received `{}`", expected, received),
            ),
            ErrorImpl::MissingMemberField { type_name, member } => ErrorTip::Suggestion(
                format!("`{}` has no member named `{}`", type_name, member),
            ),
            ErrorImpl::UnresolvedType { name } => {
                ErrorTip::Suggestion(format!("The type of `{}` could not be inferred", name))
            }
            ErrorImpl::InvalidExpressionStatement { kind } => ErrorTip::Suggestion(format!(
                "A {} cannot be used as a statement",
                kind
            )),
            ErrorImpl::IncompatibleOperands {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot combine `{}` and `{}`",
                operator, left, right
            )),
            ErrorImpl::NotCallable { received } => {
                ErrorTip::Suggestion(format!("Values of type `{}` cannot be called", received))
            }
            ErrorImpl::ArgumentCountMismatch { expected, received } => ErrorTip::Suggestion(
                format!("Expected {} arguments, received {}", expected, received),
            ),
            ErrorImpl::MissingFieldInitializer { type_name, field } => ErrorTip::Suggestion(
                format!("Field `{}` of `{}` is not initialized", field, type_name),
            ),
            ErrorImpl::AssignToConstant { name } => {
                ErrorTip::Suggestion(format!("`{}` is constant and cannot be reassigned", name))
            }
            ErrorImpl::NotAssignable => ErrorTip::Suggestion(String::from(
                "Only locals, parameters and fields can be assigned to",
            )),
            ErrorImpl::InvalidOperand { operator, operand } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}`",
                operator, operand
            )),
            ErrorImpl::NotAStruct { name } => {
                ErrorTip::Suggestion(format!("`{}` is not a struct type", name))
            }
            ErrorImpl::TypeUsedAsValue { name } => {
                ErrorTip::Suggestion(format!("`{}` names a type, not a value", name))
            }
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },

    #[error("duplicate definition of {name:?}")]
    DuplicateDefinition { name: String },
    #[error("unresolved name {name:?}")]
    UnresolvedName { name: String },
    #[error("ambiguous name {name:?}: {candidates:?}")]
    AmbiguousName { name: String, candidates: Vec<String> },
    #[error("type {name:?} does not exist")]
    TypeDoesNotExist { name: String },
    #[error("import {path:?} not found")]
    ImportNotFound { path: String },

    #[error("numeric literal {literal:?} overflows {type_}")]
    NumericLiteralOverflow { literal: String, type_: String },
    #[error("malformed numeric literal {literal:?}: {reason}")]
    MalformedNumericLiteral { literal: String, reason: String },
    #[error("unsupported numeric literal {literal:?}: {reason}")]
    UnsupportedNumericLiteral { literal: String, reason: String },
    #[error("invalid suffix {suffix:?} on numeric literal {literal:?}")]
    InvalidNumericSuffix { literal: String, suffix: String },
    #[error("malformed string literal {literal:?}")]
    MalformedStringLiteral { literal: String },

    #[error("return is not allowed here")]
    ReturnNotAllowed,
    #[error("yield is not allowed here")]
    YieldNotAllowed,
    #[error("not all paths yield a value")]
    NonExhaustiveYield,
    #[error("branches disagree on yielding a value")]
    InconsistentYield,
    #[error("unreachable statement")]
    UnreachableStatement,

    #[error("illegal assignment: expected {expected:?}, received {received:?}")]
    IllegalAssignmentType { expected: String, received: String },
    #[error("{type_name:?} has no member {member:?}")]
    MissingMemberField { type_name: String, member: String },
    #[error("type of {name:?} could not be resolved")]
    UnresolvedType { name: String },
    #[error("{kind} is not a valid statement")]
    InvalidExpressionStatement { kind: String },
    #[error("operator {operator:?} cannot combine {left:?} and {right:?}")]
    IncompatibleOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("{received:?} is not callable")]
    NotCallable { received: String },
    #[error("argument count mismatch: expected {expected}, received {received}")]
    ArgumentCountMismatch { expected: usize, received: usize },
    #[error("field {field:?} of {type_name:?} is not initialized")]
    MissingFieldInitializer { type_name: String, field: String },
    #[error("cannot assign to constant {name:?}")]
    AssignToConstant { name: String },
    #[error("expression is not assignable")]
    NotAssignable,
    #[error("operator {operator:?} cannot be applied to {operand:?}")]
    InvalidOperand { operator: String, operand: String },
    #[error("{name:?} is not a struct")]
    NotAStruct { name: String },
    #[error("{name:?} is a type, not a value")]
    TypeUsedAsValue { name: String },
}

/// Ordered accumulation of diagnostics across every pass of one compilation.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            code = diagnostic.code().number(),
            name = diagnostic.get_error_name(),
            "diagnostic recorded"
        );
        self.list.push(diagnostic);
    }

    pub fn error(&mut self, error_impl: ErrorImpl, span: Span) {
        self.push(Diagnostic::new(error_impl, span));
    }

    pub fn warning(&mut self, error_impl: ErrorImpl, span: Span) {
        self.push(Diagnostic::warning(error_impl, span));
    }

    pub fn has_errors(&self) -> bool {
        self.list.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.list.iter().filter(|d| d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.list
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.list.iter()
    }
}

/// A broken analyzer invariant. Always a compiler bug, never a user error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InternalError {
    #[error("internal compiler error: node {node} was expected to be bound as {expected}")]
    NodeNotBound { node: u32, expected: &'static str },
    #[error("internal compiler error: node {node} is not a {expected}")]
    NodeKindMismatch { node: u32, expected: &'static str },
    #[error("internal compiler error: symbol `{name}` is not a {expected}")]
    SymbolKindMismatch { name: String, expected: &'static str },
    #[error("internal compiler error: symbol {symbol} does not exist in any unit")]
    DanglingSymbol { symbol: String },
    #[error("internal compiler error: attempted to end the root scope")]
    ScopeUnderflow,
    #[error("internal compiler error: syntax tree has no compilation unit")]
    MissingRoot,
    #[error("internal compiler error: type resolution did not converge after {rounds} rounds")]
    FixpointDiverged { rounds: usize },
    #[error("internal compiler error: {feature} is not implemented")]
    NotImplemented { feature: String },
    #[error("internal compiler error: `{name}` already resolved to {existing}, refusing {attempted}")]
    TypeAlreadyResolved {
        name: String,
        existing: String,
        attempted: String,
    },
    #[error("internal compiler error: node {node} regressed from completed to unresolved")]
    StateRegression { node: u32 },
}
