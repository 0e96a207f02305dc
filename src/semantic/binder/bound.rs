use std::fmt::Display;

use crate::semantic::symbols::{
    ids::{ScopeId, SymbolId, SymbolRef},
    types::Ty,
};

/// How an identifier that names a type or module relates to instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociatedType {
    /// The identifier names a value.
    None,
    /// The identifier names a type and denotes that type itself.
    TypeItself,
    /// The identifier names a module or namespace; it has no instance type.
    NoInstance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstantValue::Int(value) => write!(f, "{}", value),
            ConstantValue::UInt(value) => write!(f, "{}", value),
            ConstantValue::Float(value) => write!(f, "{}", value),
            ConstantValue::Bool(value) => write!(f, "{}", value),
            ConstantValue::Str(value) => write!(f, "{:?}", value),
            ConstantValue::Null => write!(f, "null"),
        }
    }
}

/// Facts specific to one node kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundFact {
    /// Structural nodes with nothing to record.
    Unit,
    /// Composite expressions whose only fact is their type.
    Expression,
    Module {
        symbol: SymbolId,
        scope: ScopeId,
    },
    /// The node type of a bound function is its return type.
    Function {
        symbol: SymbolId,
        scope: ScopeId,
    },
    Struct {
        symbol: SymbolId,
        scope: ScopeId,
    },
    Declaration {
        symbol: SymbolId,
    },
    Conditional {
        then_scope: ScopeId,
        else_scope: Option<ScopeId>,
    },
    Loop {
        body_scope: ScopeId,
    },
    Identifier {
        symbol: SymbolRef,
        associated_type: AssociatedType,
    },
    Member {
        member: Option<SymbolRef>,
    },
    Literal {
        value: ConstantValue,
    },
    TypeName {
        symbol: Option<SymbolRef>,
    },
}

impl BoundFact {
    pub fn name(&self) -> &'static str {
        match self {
            BoundFact::Unit => "unit",
            BoundFact::Expression => "expression",
            BoundFact::Module { .. } => "module",
            BoundFact::Function { .. } => "function",
            BoundFact::Struct { .. } => "struct",
            BoundFact::Declaration { .. } => "declaration",
            BoundFact::Conditional { .. } => "conditional",
            BoundFact::Loop { .. } => "loop",
            BoundFact::Identifier { .. } => "identifier",
            BoundFact::Member { .. } => "member",
            BoundFact::Literal { .. } => "literal",
            BoundFact::TypeName { .. } => "type name",
        }
    }
}

/// A record in the bound-fact overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundNode {
    pub(super) ty: Ty,
    pub fact: BoundFact,
}

impl BoundNode {
    pub fn new(fact: BoundFact) -> Self {
        BoundNode {
            ty: Ty::Unresolved,
            fact,
        }
    }

    pub fn typed(ty: Ty, fact: BoundFact) -> Self {
        BoundNode { ty, fact }
    }

    pub fn ty(&self) -> Ty {
        self.ty
    }

    /// The declared symbol of a declaration-like record.
    pub fn declared_symbol(&self) -> Option<SymbolId> {
        match self.fact {
            BoundFact::Module { symbol, .. }
            | BoundFact::Function { symbol, .. }
            | BoundFact::Struct { symbol, .. }
            | BoundFact::Declaration { symbol } => Some(symbol),
            _ => None,
        }
    }

    /// The symbol an identifier or member access refers to.
    pub fn referenced_symbol(&self) -> Option<SymbolRef> {
        match self.fact {
            BoundFact::Identifier { symbol, .. } => Some(symbol),
            BoundFact::Member { member } => member,
            _ => None,
        }
    }
}
