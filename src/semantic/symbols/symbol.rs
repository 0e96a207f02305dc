use std::collections::BTreeMap;

use crate::{errors::errors::InternalError, Span};

use super::{
    ids::{ScopeId, SymbolId},
    types::{NativeType, Ty},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Native(NativeType),
    Pseudo,
    Alias,
    Union,
    Struct,
    Interface,
    Class,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSymbol {
    pub type_kind: TypeKind,
    pub members: BTreeMap<String, SymbolId>,
    /// Member space for struct-like types.
    pub scope: Option<ScopeId>,
}

impl TypeSymbol {
    pub fn new(type_kind: TypeKind) -> Self {
        TypeSymbol {
            type_kind,
            members: BTreeMap::new(),
            scope: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSymbol {
    /// Parameter symbols in declaration order; their types form the signature.
    pub parameters: Vec<SymbolId>,
    return_type: Ty,
    pub scope: ScopeId,
}

impl FunctionSymbol {
    pub fn new(scope: ScopeId) -> Self {
        FunctionSymbol {
            parameters: vec![],
            return_type: Ty::Unresolved,
            scope,
        }
    }

    pub fn return_type(&self) -> Ty {
        self.return_type
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Module { scope: ScopeId },
    Namespace { scope: ScopeId },
    Type(TypeSymbol),
    Function(FunctionSymbol),
    MemberField,
    MemberFunction(FunctionSymbol),
    Parameter,
    Local { is_constant: bool },
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Module { .. } => "module",
            SymbolKind::Namespace { .. } => "namespace",
            SymbolKind::Type(_) => "type",
            SymbolKind::Function(_) => "function",
            SymbolKind::MemberField => "member field",
            SymbolKind::MemberFunction(_) => "member function",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Local { .. } => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// Owning scope qualifier joined with the name; fixed at declaration.
    pub qualified_name: String,
    pub scope: ScopeId,
    pub span: Span,
    pub kind: SymbolKind,
    ty: Ty,
}

/// Writes `ty` into a monotonic slot: `Unresolved` may become anything once,
/// a resolved value may only be re-asserted. Returns whether the slot changed.
pub(crate) fn resolve_slot(slot: &mut Ty, ty: Ty, name: &str) -> Result<bool, InternalError> {
    if *slot == ty || !ty.is_resolved() {
        return Ok(false);
    }

    if slot.is_resolved() {
        return Err(InternalError::TypeAlreadyResolved {
            name: name.to_string(),
            existing: slot.to_string(),
            attempted: ty.to_string(),
        });
    }

    *slot = ty;
    Ok(true)
}

impl Symbol {
    pub fn new(
        name: String,
        qualified_name: String,
        scope: ScopeId,
        span: Span,
        kind: SymbolKind,
    ) -> Self {
        Symbol {
            name,
            qualified_name,
            scope,
            span,
            kind,
            ty: Ty::Unresolved,
        }
    }

    /// A symbol whose type is known at declaration, such as a prelude type.
    pub fn with_type(mut self, ty: Ty) -> Self {
        self.ty = ty;
        self
    }

    /// For values, the type of the value. For type symbols, the type they denote.
    pub fn ty(&self) -> Ty {
        self.ty
    }

    pub fn resolve_type(&mut self, ty: Ty) -> Result<bool, InternalError> {
        resolve_slot(&mut self.ty, ty, &self.qualified_name)
    }

    pub fn resolve_return_type(&mut self, ty: Ty) -> Result<bool, InternalError> {
        match &mut self.kind {
            SymbolKind::Function(function) | SymbolKind::MemberFunction(function) => {
                resolve_slot(&mut function.return_type, ty, &self.qualified_name)
            }
            _ => Err(InternalError::SymbolKindMismatch {
                name: self.qualified_name.clone(),
                expected: "function",
            }),
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match &self.kind {
            SymbolKind::Function(function) | SymbolKind::MemberFunction(function) => {
                Some(function)
            }
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeSymbol> {
        match &self.kind {
            SymbolKind::Type(type_symbol) => Some(type_symbol),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, SymbolKind::Type(_))
    }

    pub fn is_module_like(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Module { .. } | SymbolKind::Namespace { .. }
        )
    }

    /// The scope a module or namespace symbol names.
    pub fn module_scope(&self) -> Option<ScopeId> {
        match self.kind {
            SymbolKind::Module { scope } | SymbolKind::Namespace { scope } => Some(scope),
            _ => None,
        }
    }
}
