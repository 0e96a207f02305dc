use std::rc::Rc;

use super::{
    binder::{assignment_result, binary_result, unary_result, Binder},
    bound::{BoundFact, BoundNode, ConstantValue},
    literals::{parse_numeric, parse_string},
};
use crate::{
    ast::{
        ast::{LiteralKind, NodeId, NodeKind, SyntaxTree},
        operators::{AssignmentOperator, BinaryOperator, UnaryOperator},
    },
    errors::errors::{Diagnostics, ErrorImpl, InternalError},
    semantic::symbols::types::{NativeType, Ty},
    Span,
};

fn literal_tree(kind: LiteralKind, lexeme: &str) -> (SyntaxTree, NodeId) {
    let mut tree = SyntaxTree::new(Rc::new("test.lang".to_string()));
    let node = tree.push(
        NodeKind::Literal {
            kind,
            lexeme: lexeme.to_string(),
        },
        Span::null(),
    );
    (tree, node)
}

fn value_of(lexeme: &str) -> (NativeType, ConstantValue) {
    let parsed = parse_numeric(lexeme, false).unwrap();
    (parsed.ty, parsed.value)
}

#[test]
fn test_numeric_literal_table() {
    assert_eq!(value_of("1_721"), (NativeType::I64, ConstantValue::Int(1721)));
    assert_eq!(value_of("121.30"), (NativeType::F64, ConstantValue::Float(121.30)));
    assert_eq!(value_of(".882"), (NativeType::F64, ConstantValue::Float(0.882)));
    assert_eq!(value_of("0xFF"), (NativeType::I64, ConstantValue::Int(255)));
    assert_eq!(value_of("0b1010u8"), (NativeType::U8, ConstantValue::UInt(10)));
    assert_eq!(value_of("0o17i32"), (NativeType::I32, ConstantValue::Int(15)));
    assert_eq!(value_of("0xFFu"), (NativeType::U64, ConstantValue::UInt(255)));
    assert_eq!(value_of("1e3"), (NativeType::F64, ConstantValue::Float(1000.0)));
    assert_eq!(value_of("2.5f"), (NativeType::F32, ConstantValue::Float(2.5)));
    assert_eq!(value_of("7f64"), (NativeType::F64, ConstantValue::Float(7.0)));
}

#[test]
fn test_malformed_numeric_literals() {
    for lexeme in ["371.", "._61", "150__0", "12_", "0x", "0b102"] {
        let error = parse_numeric(lexeme, false).unwrap_err();
        assert!(
            matches!(error.error, ErrorImpl::MalformedNumericLiteral { .. }),
            "{} gave {:?}",
            lexeme,
            error.error
        );
        assert!(error.recovered.is_none());
    }
}

#[test]
fn test_invalid_suffix_and_unsupported_base() {
    assert!(matches!(
        parse_numeric("12q", false).unwrap_err().error,
        ErrorImpl::InvalidNumericSuffix { .. }
    ));
    assert!(matches!(
        parse_numeric("1.5i32", false).unwrap_err().error,
        ErrorImpl::InvalidNumericSuffix { .. }
    ));
    assert!(matches!(
        parse_numeric("0b1f32", false).unwrap_err().error,
        ErrorImpl::UnsupportedNumericLiteral { .. }
    ));
}

#[test]
fn test_signed_bounds_use_suffix_width() {
    assert!(parse_numeric("127i8", false).is_ok());
    assert!(parse_numeric("128i8", true).is_ok());
    assert_eq!(
        parse_numeric("128i8", true).unwrap().value,
        ConstantValue::Int(-128)
    );

    let error = parse_numeric("128i8", false).unwrap_err();
    assert!(matches!(error.error, ErrorImpl::NumericLiteralOverflow { .. }));
    let recovered = error.recovered.unwrap();
    assert_eq!(recovered.ty, NativeType::I8);
    assert_eq!(recovered.value, ConstantValue::Int(0));

    assert!(parse_numeric("32767i16", false).is_ok());
    assert!(parse_numeric("32768i16", false).is_err());
    assert!(parse_numeric("9223372036854775808", true).is_ok());
    assert!(parse_numeric("9223372036854775808", false).is_err());
}

#[test]
fn test_unsigned_bounds() {
    assert!(parse_numeric("255u8", false).is_ok());
    assert!(parse_numeric("256u8", false).is_err());
    assert!(parse_numeric("18446744073709551615u64", false).is_ok());

    let overflow = parse_numeric("18446744073709551616u", false).unwrap_err();
    assert!(matches!(overflow.error, ErrorImpl::NumericLiteralOverflow { .. }));
    assert_eq!(overflow.recovered.unwrap().value, ConstantValue::UInt(0));

    assert!(parse_numeric("1u", true).is_err());
}

#[test]
fn test_float_overflow_clamps_to_zero() {
    let error = parse_numeric("1e400", false).unwrap_err();
    let recovered = error.recovered.unwrap();
    assert_eq!(recovered.ty, NativeType::F64);
    assert_eq!(recovered.value, ConstantValue::Float(0.0));

    assert!(parse_numeric("1e39f32", false).is_err());
}

#[test]
fn test_string_literals() {
    assert_eq!(parse_string("\"hello\"").unwrap(), "hello");
    assert_eq!(parse_string("'a\\nb'").unwrap(), "a\nb");
    assert_eq!(parse_string("\"\\\\\\r\"").unwrap(), "\\\r");
    assert_eq!(parse_string("\"\\t\"").unwrap(), "\\t");
    assert!(parse_string("\"mismatch'").is_err());
    assert!(parse_string("\"").is_err());
}

#[test]
fn test_bind_literal_is_idempotent() {
    let (tree, node) = literal_tree(LiteralKind::Number, "42u16");
    let mut binder = Binder::new();
    let mut diagnostics = Diagnostics::new();

    let first = binder
        .bind_literal(&tree, node, false, &mut diagnostics)
        .unwrap()
        .clone();
    let second = binder
        .bind_literal(&tree, node, false, &mut diagnostics)
        .unwrap()
        .clone();

    assert_eq!(first, second);
    assert_eq!(first.ty(), Ty::Native(NativeType::U16));
    assert_eq!(binder.len(), 1);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_malformed_literal_reports_exactly_once() {
    for lexeme in ["371.", "._61", "150__0"] {
        let (tree, node) = literal_tree(LiteralKind::Number, lexeme);
        let mut binder = Binder::new();
        let mut diagnostics = Diagnostics::new();

        binder
            .bind_literal(&tree, node, false, &mut diagnostics)
            .unwrap();
        binder
            .bind_literal(&tree, node, false, &mut diagnostics)
            .unwrap();

        assert_eq!(diagnostics.len(), 1, "{}", lexeme);
        assert_eq!(binder.type_of(node), Ty::Error);
    }
}

#[test]
fn test_negated_literal_folds_sign() {
    let mut tree = SyntaxTree::new(Rc::new("test.lang".to_string()));
    let literal = tree.push(
        NodeKind::Literal {
            kind: LiteralKind::Number,
            lexeme: "23".to_string(),
        },
        Span::null(),
    );
    let unary = tree.push(
        NodeKind::Unary {
            operator: UnaryOperator::Negate,
            operand: literal,
        },
        Span::null(),
    );

    let mut binder = Binder::new();
    let mut diagnostics = Diagnostics::new();
    let bound = binder
        .bind_negated_literal(&tree, unary, literal, &mut diagnostics)
        .unwrap()
        .clone();

    assert_eq!(bound.ty(), Ty::Native(NativeType::I64));
    assert_eq!(
        bound.fact,
        BoundFact::Literal {
            value: ConstantValue::Int(-23)
        }
    );
    assert_eq!(binder.get(literal), Some(&bound));
}

#[test]
fn test_keyword_literals() {
    let (tree, node) = literal_tree(LiteralKind::Boolean, "true");
    let mut binder = Binder::new();
    let mut diagnostics = Diagnostics::new();

    let bound = binder
        .bind_literal(&tree, node, false, &mut diagnostics)
        .unwrap();
    assert_eq!(bound.ty(), Ty::Native(NativeType::Bool));

    let (tree, node) = literal_tree(LiteralKind::Null, "null");
    let mut binder = Binder::new();
    assert_eq!(
        binder
            .bind_literal(&tree, node, false, &mut diagnostics)
            .unwrap()
            .ty(),
        Ty::Native(NativeType::Null)
    );
}

#[test]
fn test_set_type_is_monotonic() {
    let mut binder = Binder::new();
    let node = NodeId(3);

    assert!(matches!(
        binder.set_type(node, Ty::Any),
        Err(InternalError::NodeNotBound { .. })
    ));

    binder.ensure(node, BoundFact::Expression);
    assert_eq!(binder.type_of(node), Ty::Unresolved);
    assert_eq!(binder.set_type(node, Ty::Any), Ok(true));
    assert_eq!(binder.set_type(node, Ty::Any), Ok(false));
    assert!(binder.set_type(node, Ty::Error).is_err());

    binder.bind_with(node, || BoundNode::typed(Ty::Error, BoundFact::Unit));
    assert_eq!(binder.type_of(node), Ty::Any);
}

#[test]
fn test_scope_getters_require_binding() {
    let binder = Binder::new();
    assert!(matches!(
        binder.function_scope(NodeId(0)),
        Err(InternalError::NodeNotBound { .. })
    ));

    let mut binder = Binder::new();
    binder.ensure(NodeId(0), BoundFact::Unit);
    assert!(matches!(
        binder.loop_scope(NodeId(0)),
        Err(InternalError::NodeKindMismatch { .. })
    ));
}

#[test]
fn test_binary_results() {
    let i32_ = Ty::Native(NativeType::I32);
    let i64_ = Ty::Native(NativeType::I64);
    let u8_ = Ty::Native(NativeType::U8);
    let string = Ty::Native(NativeType::String);
    let bool_ = Ty::Native(NativeType::Bool);

    assert_eq!(binary_result(BinaryOperator::Add, i32_, i64_), i64_);
    assert_eq!(binary_result(BinaryOperator::Add, i32_, u8_), Ty::Error);
    assert_eq!(binary_result(BinaryOperator::Add, string, string), string);
    assert_eq!(binary_result(BinaryOperator::Add, string, i32_), Ty::Error);
    assert_eq!(binary_result(BinaryOperator::Less, i32_, u8_), bool_);
    assert_eq!(binary_result(BinaryOperator::And, bool_, bool_), bool_);
    assert_eq!(binary_result(BinaryOperator::Add, Ty::Unresolved, i32_), Ty::Unresolved);
    assert_eq!(binary_result(BinaryOperator::Equals, Ty::Error, i32_), Ty::Error);
}

#[test]
fn test_unary_and_assignment_results() {
    let i32_ = Ty::Native(NativeType::I32);
    let u32_ = Ty::Native(NativeType::U32);
    let bool_ = Ty::Native(NativeType::Bool);

    assert_eq!(unary_result(UnaryOperator::Negate, i32_), i32_);
    assert_eq!(unary_result(UnaryOperator::Negate, u32_), Ty::Error);
    assert_eq!(unary_result(UnaryOperator::Not, bool_), bool_);
    assert_eq!(unary_result(UnaryOperator::Not, i32_), Ty::Error);

    assert_eq!(assignment_result(AssignmentOperator::Assign, i32_, bool_), i32_);
    assert_eq!(
        assignment_result(AssignmentOperator::AddAssign, bool_, i32_),
        Ty::Error
    );
    assert_eq!(
        assignment_result(AssignmentOperator::AddAssign, i32_, Ty::Unresolved),
        Ty::Unresolved
    );
}
