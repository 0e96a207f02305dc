use std::fmt::Display;

use crate::lexer::tokens::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    And,
    Or,
}

impl BinaryOperator {
    pub fn from_token(kind: TokenKind) -> Option<BinaryOperator> {
        Some(match kind {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Dash => BinaryOperator::Subtract,
            TokenKind::Star => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            TokenKind::Percent => BinaryOperator::Modulo,
            TokenKind::Equals => BinaryOperator::Equals,
            TokenKind::NotEquals => BinaryOperator::NotEquals,
            TokenKind::Less => BinaryOperator::Less,
            TokenKind::LessEquals => BinaryOperator::LessEquals,
            TokenKind::Greater => BinaryOperator::Greater,
            TokenKind::GreaterEquals => BinaryOperator::GreaterEquals,
            TokenKind::And => BinaryOperator::And,
            TokenKind::Or => BinaryOperator::Or,
            _ => return None,
        })
    }

    pub fn is_math(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Modulo
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn is_comparison(self) -> bool {
        !self.is_math() && !self.is_logical()
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEquals => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Not => write!(f, "!"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
}

impl AssignmentOperator {
    pub fn from_token(kind: TokenKind) -> Option<AssignmentOperator> {
        Some(match kind {
            TokenKind::Assignment => AssignmentOperator::Assign,
            TokenKind::PlusEquals => AssignmentOperator::AddAssign,
            TokenKind::MinusEquals => AssignmentOperator::SubtractAssign,
            TokenKind::StarEquals => AssignmentOperator::MultiplyAssign,
            TokenKind::SlashEquals => AssignmentOperator::DivideAssign,
            _ => return None,
        })
    }

    /// The arithmetic operator a compound assignment applies, if any.
    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractAssign => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyAssign => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideAssign => Some(BinaryOperator::Divide),
        }
    }
}

impl Display for AssignmentOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.binary() {
            Some(op) => write!(f, "{}=", op),
            None => write!(f, "="),
        }
    }
}
