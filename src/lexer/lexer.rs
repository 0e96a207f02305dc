use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Diagnostic, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

impl RegexPattern {
    fn new(pattern: &str, handler: RegexHandler) -> RegexPattern {
        RegexPattern {
            regex: Regex::new(pattern).unwrap(),
            handler,
        }
    }
}

lazy_static! {
    // Every pattern is anchored; the first one matching at the cursor wins, so longer
    // punctuation must come before its prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern::new("^[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        RegexPattern::new("^0[xXbBoO][0-9a-zA-Z_.]*", number_handler),
        RegexPattern::new("^(?:\\._*[0-9]|[0-9])(?:[eE][+-][0-9]|[0-9a-zA-Z_.])*", number_handler),
        RegexPattern::new("^\\s+", skip_handler),
        RegexPattern::new("^//[^\n]*", skip_handler),
        RegexPattern::new("^\"[^\"]*\"", string_handler),
        RegexPattern::new("^'[^']*'", string_handler),
        RegexPattern::new("^\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        RegexPattern::new("^\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        RegexPattern::new("^\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        RegexPattern::new("^\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        RegexPattern::new("^==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        RegexPattern::new("^!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        RegexPattern::new("^!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
        RegexPattern::new("^=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        RegexPattern::new("^<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        RegexPattern::new("^<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        RegexPattern::new("^>=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        RegexPattern::new("^>", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        RegexPattern::new("^\\|\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
        RegexPattern::new("^&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
        RegexPattern::new("^\\.", MK_DEFAULT_HANDLER!(TokenKind::Dot, ".")),
        RegexPattern::new("^;", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        RegexPattern::new("^:", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        RegexPattern::new("^,", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        RegexPattern::new("^->", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->")),
        RegexPattern::new("^\\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=")),
        RegexPattern::new("^-=", MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=")),
        RegexPattern::new("^\\*=", MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=")),
        RegexPattern::new("^/=", MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=")),
        RegexPattern::new("^\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        RegexPattern::new("^-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        RegexPattern::new("^/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        RegexPattern::new("^\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
        RegexPattern::new("^%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            tokens: vec![],
            source,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at(&self) -> Option<char> {
        self.remainder().chars().next()
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Span of the next `len` bytes starting at the cursor.
    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: Position(self.pos as u32, Rc::clone(&self.file)),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let span = lexer.span_of(matched.len());
    lexer.advance_n(matched.len());
    lexer.push(MK_TOKEN!(TokenKind::Number, matched, span));
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
}

// Strings keep their delimiters; interpreting them is the binder's job.
fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let span = lexer.span_of(matched.len());
    lexer.advance_n(matched.len());
    lexer.push(MK_TOKEN!(TokenKind::String, matched, span));
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = lexer.matched(regex);
    let span = lexer.span_of(value.len());
    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.advance_n(value.len());
    lexer.push(MK_TOKEN!(kind, value, span));
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Diagnostic> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let before = lex.pos;

        if let Some(pattern) = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()))
        {
            (pattern.handler)(&mut lex, &pattern.regex);
        }

        if lex.pos == before {
            let token = lex.at().map(String::from).unwrap_or_default();
            let span = lex.span_of(token.len().max(1));
            return Err(Diagnostic::new(ErrorImpl::UnrecognisedToken { token }, span));
        }
    }

    let span = lex.span_of(0);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
    tracing::trace!(tokens = lex.tokens.len(), file = %lex.file, "tokenized");
    Ok(lex.tokens)
}
