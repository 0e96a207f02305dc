//! Unit tests for error handling.

use crate::errors::errors::{
    Diagnostic, DiagnosticCode, Diagnostics, ErrorImpl, ErrorTip, InternalError, Severity,
};
use crate::{Position, Span};
use std::rc::Rc;

fn span_at(offset: u32) -> Span {
    let file = Rc::new("test.lang".to_string());
    Span {
        start: Position(offset, Rc::clone(&file)),
        end: Position(offset + 1, file),
    }
}

#[test]
fn test_diagnostic_creation() {
    let diagnostic = Diagnostic::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        span_at(10),
    );

    assert_eq!(diagnostic.get_error_name(), "UnrecognisedToken");
    assert_eq!(diagnostic.code(), DiagnosticCode::UnrecognisedToken);
    assert_eq!(diagnostic.severity(), Severity::Error);
}

#[test]
fn test_diagnostic_position() {
    let diagnostic = Diagnostic::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        span_at(42),
    );

    assert_eq!(diagnostic.get_position().0, 42);
    assert_eq!(diagnostic.get_span().end.0, 43);
}

#[test]
fn test_code_families() {
    let cases = [
        (
            ErrorImpl::UnexpectedToken {
                token: "}".to_string(),
            },
            1002,
        ),
        (
            ErrorImpl::DuplicateDefinition {
                name: "x".to_string(),
            },
            2001,
        ),
        (
            ErrorImpl::AmbiguousName {
                name: "f".to_string(),
                candidates: vec!["a.f".to_string(), "b.f".to_string()],
            },
            2003,
        ),
        (
            ErrorImpl::NumericLiteralOverflow {
                literal: "300u8".to_string(),
                type_: "u8".to_string(),
            },
            3001,
        ),
        (ErrorImpl::NonExhaustiveYield, 4003),
        (
            ErrorImpl::IllegalAssignmentType {
                expected: "i32".to_string(),
                received: "string".to_string(),
            },
            5001,
        ),
        (
            ErrorImpl::UnresolvedType {
                name: "a".to_string(),
            },
            5003,
        ),
    ];

    for (kind, number) in cases {
        let diagnostic = Diagnostic::new(kind, span_at(0));
        assert_eq!(diagnostic.code().number(), number);
    }
}

#[test]
fn test_warning_does_not_count_as_error() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.warning(ErrorImpl::UnreachableStatement, span_at(3));

    assert_eq!(diagnostics.len(), 1);
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.iter().next().unwrap().severity().to_string(), "warning");

    diagnostics.error(ErrorImpl::NotAssignable, span_at(5));
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.error_count(), 1);
}

#[test]
fn test_error_tip_none() {
    let diagnostic = Diagnostic::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        span_at(0),
    );

    assert!(matches!(diagnostic.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let diagnostic = Diagnostic::new(
        ErrorImpl::AmbiguousName {
            name: "f".to_string(),
            candidates: vec!["a.f".to_string(), "b.f".to_string()],
        },
        span_at(0),
    );

    match diagnostic.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("a.f, b.f")),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_internal_error_message() {
    let error = InternalError::FixpointDiverged { rounds: 256 };
    assert!(error.to_string().starts_with("internal compiler error"));
    assert!(error.to_string().contains("256"));
}
