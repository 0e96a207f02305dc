use std::rc::Rc;

use super::{
    ast::{LiteralKind, NodeId, NodeKind, SyntaxTree},
    operators::{AssignmentOperator, BinaryOperator},
};
use crate::{lexer::tokens::TokenKind, Span};

fn literal(tree: &mut SyntaxTree, lexeme: &str) -> NodeId {
    tree.push(
        NodeKind::Literal {
            kind: LiteralKind::Number,
            lexeme: lexeme.to_string(),
        },
        Span::null(),
    )
}

#[test]
fn test_push_assigns_sequential_ids() {
    let mut tree = SyntaxTree::new(Rc::new("test.lang".to_string()));
    let a = literal(&mut tree, "1");
    let b = literal(&mut tree, "2");

    assert_eq!(a, NodeId(0));
    assert_eq!(b, NodeId(1));
    assert_eq!(tree.len(), 2);
    assert!(tree.root().is_none());
}

#[test]
fn test_children_in_source_order() {
    let mut tree = SyntaxTree::new(Rc::new("test.lang".to_string()));
    let condition = literal(&mut tree, "1");
    let consequent = tree.push(NodeKind::Block { statements: vec![] }, Span::null());
    let alternate = tree.push(NodeKind::Block { statements: vec![] }, Span::null());
    let conditional = tree.push(
        NodeKind::Conditional {
            condition,
            consequent,
            alternate: Some(alternate),
        },
        Span::null(),
    );

    assert_eq!(
        tree.children(conditional),
        vec![condition, consequent, alternate]
    );
}

#[test]
fn test_descendants_visits_parents_first() {
    let mut tree = SyntaxTree::new(Rc::new("test.lang".to_string()));
    let left = literal(&mut tree, "1");
    let right = literal(&mut tree, "2");
    let sum = tree.push(
        NodeKind::Binary {
            left,
            operator: BinaryOperator::Add,
            right,
        },
        Span::null(),
    );
    let statement = tree.push(NodeKind::ExpressionStatement { expression: sum }, Span::null());

    assert_eq!(tree.descendants(statement), vec![statement, sum, left, right]);
}

#[test]
fn test_declarations_expose_their_name() {
    let let_kind = NodeKind::Let {
        name: "x".to_string(),
        is_constant: false,
        type_annotation: None,
        initializer: None,
    };

    assert!(let_kind.is_declaration());
    assert_eq!(let_kind.declared_name(), Some("x"));
    assert!(!NodeKind::Identifier {
        name: "x".to_string()
    }
    .is_declaration());
}

#[test]
fn test_compound_assignment_maps_to_binary() {
    let op = AssignmentOperator::from_token(TokenKind::PlusEquals).unwrap();
    assert_eq!(op.binary(), Some(BinaryOperator::Add));
    assert_eq!(op.to_string(), "+=");
    assert_eq!(AssignmentOperator::Assign.binary(), None);
}
