use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("let", TokenKind::Let);
        map.insert("const", TokenKind::Const);
        map.insert("new", TokenKind::New);
        map.insert("import", TokenKind::Import);
        map.insert("fn", TokenKind::Fn);
        map.insert("return", TokenKind::Return);
        map.insert("yield", TokenKind::Yield);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("struct", TokenKind::Struct);
        map.insert("module", TokenKind::Module);
        map.insert("namespace", TokenKind::Namespace);
        map.insert("type", TokenKind::Type);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("null", TokenKind::Null);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Identifier,

    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    And,

    Dot,
    Semicolon,
    Colon,
    Comma,
    Arrow,

    PlusEquals,
    MinusEquals,
    SlashEquals,
    StarEquals,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Let,
    Const,
    New,
    Import,
    Fn,
    Return,
    Yield,
    If,
    Else,
    While,
    Struct,
    Module,
    Namespace,
    Type,
    True,
    False,
    Null,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::String | TokenKind::Identifier | TokenKind::Number => {
                write!(f, "{} ({})", self.kind, self.value)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl Token {
    pub fn is_one_of(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }
}
