use crate::{
    ast::{
        ast::{LiteralKind, NodeId, NodeKind},
        operators::{AssignmentOperator, BinaryOperator, UnaryOperator},
    },
    errors::errors::{Diagnostic, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser, stmt::parse_block, types::parse_type};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Diagnostic> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(parser.unexpected());
    };

    let mut left = nud(parser)?;

    // While the next operator binds tighter than `bp`, keep extending the lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = parser
            .get_bp_lookup()
            .get(&token_kind)
            .copied()
            .unwrap_or(BindingPower::Default);

        if next_bp <= bp {
            break;
        }

        let Some(led) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(parser.unexpected());
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

fn node_span(parser: &Parser, id: NodeId) -> Span {
    parser.tree().span(id).clone()
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let token = parser.advance();

    let kind = match token.kind {
        TokenKind::Number => NodeKind::Literal {
            kind: LiteralKind::Number,
            lexeme: token.value,
        },
        TokenKind::String => NodeKind::Literal {
            kind: LiteralKind::String,
            lexeme: token.value,
        },
        TokenKind::True | TokenKind::False => NodeKind::Literal {
            kind: LiteralKind::Boolean,
            lexeme: token.value,
        },
        TokenKind::Null => NodeKind::Literal {
            kind: LiteralKind::Null,
            lexeme: token.value,
        },
        TokenKind::Identifier => NodeKind::Identifier { name: token.value },
        _ => {
            return Err(Diagnostic::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.span,
            ))
        }
    };

    Ok(parser.push(kind, token.span))
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: NodeId,
    bp: BindingPower,
) -> Result<NodeId, Diagnostic> {
    let operator_token = parser.advance();
    let Some(operator) = BinaryOperator::from_token(operator_token.kind) else {
        return Err(Diagnostic::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value,
            },
            operator_token.span,
        ));
    };

    let right = parse_expr(parser, bp)?;
    let span = node_span(parser, left).to(&node_span(parser, right));

    Ok(parser.push(
        NodeKind::Binary {
            left,
            operator,
            right,
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let operator_token = parser.advance();
    let operator = if operator_token.kind == TokenKind::Not {
        UnaryOperator::Not
    } else {
        UnaryOperator::Negate
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = operator_token.span.to(&node_span(parser, operand));

    Ok(parser.push(NodeKind::Unary { operator, operand }, span))
}

pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Diagnostic> {
    let operator_token = parser.advance();
    let Some(operator) = AssignmentOperator::from_token(operator_token.kind) else {
        return Err(Diagnostic::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value,
            },
            operator_token.span,
        ));
    };

    // Right associative: `a = b = c` assigns `b = c` first.
    let value = parse_expr(parser, BindingPower::Comma)?;
    let span = node_span(parser, left).to(&node_span(parser, value));

    Ok(parser.push(
        NodeKind::Assignment {
            assignee: left,
            operator,
            value,
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.advance().span.start;
    let inner = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::Grouping { inner }, span))
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Diagnostic> {
    parser.advance();

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Comma)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let span = parser.span_from(node_span(parser, left).start);
    Ok(parser.push(
        NodeKind::Call {
            callee: left,
            arguments,
        },
        span,
    ))
}

pub fn parse_member_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Diagnostic> {
    parser.advance();
    let member = parser.expect(TokenKind::Identifier)?.value;

    let span = parser.span_from(node_span(parser, left).start);
    Ok(parser.push(
        NodeKind::MemberAccess {
            target: left,
            member,
        },
        span,
    ))
}

pub fn parse_struct_init_expr(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    // new Point { x: 1, y: 2 }
    let start = parser.advance().span.start;

    let type_name = parse_type(parser)?;

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = vec![];

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let field_name = parser.expect(TokenKind::Identifier)?.value;
        parser.expect(TokenKind::Colon)?;
        let field_value = parse_expr(parser, BindingPower::Comma)?;

        fields.push((field_name, field_value));

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::StructInit { type_name, fields }, span))
}

pub fn parse_conditional_expr(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.expect(TokenKind::If)?.span.start;

    let condition = parse_expr(parser, BindingPower::Default)?;
    let consequent = parse_block(parser)?;

    let alternate = if parser.eat(TokenKind::Else) {
        if parser.current_token_kind() == TokenKind::If {
            Some(parse_conditional_expr(parser)?)
        } else {
            Some(parse_block(parser)?)
        }
    } else {
        None
    };

    let span = parser.span_from(start);
    Ok(parser.push(
        NodeKind::Conditional {
            condition,
            consequent,
            alternate,
        },
        span,
    ))
}

pub fn parse_while_expr(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.expect(TokenKind::While)?.span.start;

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::While { condition, body }, span))
}
