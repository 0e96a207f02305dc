//! Type annotation parsing.
//!
//! Annotations are single names (`i32`, `Point`, `null`); they become `TypeName`
//! nodes and are looked up during type resolution.

use std::collections::HashMap;

use crate::{
    ast::ast::{NodeId, NodeKind},
    errors::errors::Diagnostic,
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

pub type TypeNUDHandler = fn(&mut Parser) -> Result<NodeId, Diagnostic>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_nud(TokenKind::Null, parse_symbol_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let token = parser.advance();
    Ok(parser.push(NodeKind::TypeName { name: token.value }, token.span))
}

pub fn parse_type(parser: &mut Parser) -> Result<NodeId, Diagnostic> {
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
        return Err(parser.unexpected());
    };

    nud(parser)
}
