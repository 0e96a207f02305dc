use crate::{
    ast::ast::{NodeId, NodeKind},
    errors::errors::Diagnostic,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

/// Tokens that start a declaration allowed in a module body or at the top level.
pub fn is_declaration_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Fn
            | TokenKind::Struct
            | TokenKind::Module
            | TokenKind::Namespace
            | TokenKind::Type
    )
}

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let kind = parser.current_token_kind();
    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    let expression = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(parser.tree().span(expression).start.clone());
    Ok(parser.push(NodeKind::ExpressionStatement { expression }, span))
}

/// `if` and `while` in statement position; the trailing semicolon is optional.
pub fn parse_control_flow_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let kind = parser.current_token_kind();
    let Some(handler) = parser.get_nud_lookup().get(&kind).copied() else {
        return Err(parser.unexpected());
    };

    let expression = handler(parser)?;
    parser.eat(TokenKind::Semicolon);

    let span = parser.tree().span(expression).clone();
    Ok(parser.push(NodeKind::ExpressionStatement { expression }, span))
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start_token = parser.advance();
    let is_constant = start_token.kind == TokenKind::Const;

    let error = parser.unexpected_detailed("expected identifier during variable declaration");
    let name = parser
        .expect_error(TokenKind::Identifier, Some(error))?
        .value;

    let type_annotation = if parser.eat(TokenKind::Colon) {
        Some(parse_type(parser)?)
    } else {
        None
    };

    let initializer = if parser.current_token_kind() != TokenKind::Semicolon {
        parser.expect(TokenKind::Assignment)?;
        Some(parse_expr(parser, BindingPower::Default)?)
    } else if type_annotation.is_none() {
        return Err(parser.unexpected_detailed("expected rhs or explicit type"));
    } else {
        None
    };

    if is_constant && initializer.is_none() {
        return Err(parser.unexpected_detailed("expected rhs in constant definition"));
    }

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start_token.span.start);
    Ok(parser.push(
        NodeKind::Let {
            name,
            is_constant,
            type_annotation,
            initializer,
        },
        span,
    ))
}

fn parse_path(parser: &mut Parser) -> Result<Vec<String>, Diagnostic> {
    let mut path = vec![parser.expect(TokenKind::Identifier)?.value];

    while parser.eat(TokenKind::Dot) {
        path.push(parser.expect(TokenKind::Identifier)?.value);
    }

    Ok(path)
}

pub fn parse_import_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    if !parser.at_top_level() {
        return Err(parser.unexpected_detailed("imports are only allowed at the top level"));
    }

    let start = parser.advance().span.start;
    let path = parse_path(parser)?;

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::Import { path }, span))
}

/// `module a.b { ... }` and `namespace n { ... }`. Bodies hold declarations only.
pub fn parse_module_decl_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start_token = parser.advance();
    let is_namespace = start_token.kind == TokenKind::Namespace;

    let path = parse_path(parser)?;

    parser.expect(TokenKind::OpenCurly)?;
    parser.enter_body();

    let mut body = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !is_declaration_start(parser.current_token_kind()) {
            return Err(
                parser.unexpected_detailed("only declarations are allowed in a module body")
            );
        }
        body.push(parse_stmt(parser)?);
    }

    parser.exit_body();
    parser.expect(TokenKind::CloseCurly)?;

    let span = parser.span_from(start_token.span.start);
    let kind = if is_namespace {
        NodeKind::Namespace { path, body }
    } else {
        NodeKind::Module { path, body }
    };
    Ok(parser.push(kind, span))
}

pub fn parse_block(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;
    parser.enter_body();

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected());
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.exit_body();
    parser.expect(TokenKind::CloseCurly)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::Block { statements }, span))
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.advance().span.start;

    let name = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let type_annotation = parse_type(parser)?;

        let span = parser.span_from(token.span.start);
        parameters.push(parser.push(
            NodeKind::Parameter {
                name: token.value,
                type_annotation,
            },
            span,
        ));

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.eat(TokenKind::Arrow) {
        Some(parse_type(parser)?)
    } else {
        None
    };

    let body = parse_block(parser)?;

    let span = parser.span_from(start);
    Ok(parser.push(
        NodeKind::FunctionDef {
            name,
            parameters,
            return_type,
            body,
            is_implicit: false,
        },
        span,
    ))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.advance().span.start;

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(parser.push(
        NodeKind::Return {
            value,
            is_implicit: false,
        },
        span,
    ))
}

pub fn parse_yield_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.advance().span.start;
    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::Yield { value }, span))
}

pub fn parse_struct_decl_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.advance().span.start;

    let name = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenCurly)?;
    parser.enter_body();

    let mut members = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if parser.current_token_kind() == TokenKind::Fn {
            members.push(parse_fn_decl_stmt(parser)?);
            continue;
        }

        let token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let type_annotation = parse_type(parser)?;

        let span = parser.span_from(token.span.start);
        members.push(parser.push(
            NodeKind::Field {
                name: token.value,
                type_annotation,
            },
            span,
        ));

        if !parser.eat(TokenKind::Comma) && parser.current_token_kind() != TokenKind::Fn {
            break;
        }
    }

    parser.exit_body();
    parser.expect(TokenKind::CloseCurly)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::StructDef { name, members }, span))
}

pub fn parse_type_alias_stmt(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let start = parser.advance().span.start;

    let name = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::Assignment)?;
    let target = parse_type(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(parser.push(NodeKind::TypeAlias { name, target }, span))
}
