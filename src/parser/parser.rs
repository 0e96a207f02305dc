//! Parser implementation building the arena syntax tree.
//!
//! The parser keeps lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//! - Type parsing handlers

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::ast::{NodeId, NodeKind, SyntaxTree},
    errors::errors::{Diagnostic, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::{is_declaration_start, parse_stmt},
    types::{create_token_type_lookups, TypeNUDHandler, TypeNUDLookup},
};

/// Name of the function synthesized around top-level statements.
pub const IMPLICIT_MAIN: &str = "$main";

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: Rc<String>,
    /// Nesting depth of `{ ... }` bodies; zero at the top level.
    depth: usize,
    tree: SyntaxTree,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        Parser {
            tokens,
            pos: 0,
            tree: SyntaxTree::new(Rc::clone(&file)),
            file,
            depth: 0,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
        }
    }

    /// Returns the current token without advancing. Past the end this is the EOF token.
    pub fn current_token(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Advances to the next token and returns the previous one.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Diagnostic>,
    ) -> Result<Token, Diagnostic> {
        if self.current_token_kind() == expected_kind {
            return Ok(self.advance());
        }

        match error {
            Some(error) => Err(error),
            None => Err(self.unexpected()),
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Diagnostic> {
        self.expect_error(expected_kind, None)
    }

    /// Consumes the current token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current_token_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn unexpected(&self) -> Diagnostic {
        let token = self.current_token();
        Diagnostic::new(
            ErrorImpl::UnexpectedToken {
                token: token.value.clone(),
            },
            token.span.clone(),
        )
    }

    pub fn unexpected_detailed(&self, message: &str) -> Diagnostic {
        let token = self.current_token();
        Diagnostic::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.value.clone(),
                message: message.to_string(),
            },
            token.span.clone(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.pos + 1 < self.tokens.len() && self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    pub fn enter_body(&mut self) {
        self.depth += 1;
    }

    pub fn exit_body(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn at_top_level(&self) -> bool {
        self.depth == 0
    }

    /// End position of the most recently consumed token.
    pub fn get_position(&self) -> Position {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span.end.clone(),
            None => Position(0, Rc::clone(&self.file)),
        }
    }

    /// Span from `start` to the end of the most recently consumed token.
    pub fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.get_position(),
        }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.tree.push(kind, span)
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }
}

/// Parses a token stream into a syntax tree rooted at a compilation unit.
///
/// Top-level declarations become items of the unit; every other top-level statement
/// is collected, in order, into the body of an implicit `$main` function.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> Result<SyntaxTree, Diagnostic> {
    let mut parser = Parser::new(tokens, Rc::clone(&file));
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let mut items = vec![];
    let mut statements = vec![];
    let mut main_span: Option<Span> = None;

    while parser.has_tokens() {
        let is_declaration = is_declaration_start(parser.current_token_kind())
            || parser.current_token_kind() == TokenKind::Import;
        let stmt = parse_stmt(&mut parser)?;

        if is_declaration {
            items.push(stmt);
        } else {
            let span = parser.tree().span(stmt).clone();
            main_span = Some(match main_span {
                Some(existing) => existing.to(&span),
                None => span,
            });
            statements.push(stmt);
        }
    }

    if let Some(span) = main_span {
        let body = parser.push(NodeKind::Block { statements }, span.clone());
        let main = parser.push(
            NodeKind::FunctionDef {
                name: String::from(IMPLICIT_MAIN),
                parameters: vec![],
                return_type: None,
                body,
                is_implicit: true,
            },
            span,
        );
        items.push(main);
    }

    let span = parser.span_from(Position(0, Rc::clone(&file)));
    let root = parser.push(NodeKind::CompilationUnit { items }, span);

    let mut tree = parser.tree;
    tree.set_root(root);
    tracing::debug!(nodes = tree.len(), file = %file, "parsed");
    Ok(tree)
}
