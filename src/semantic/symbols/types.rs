use std::fmt::Display;

use super::ids::SymbolRef;

/// Built-in value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    String,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFamily {
    Float,
    Signed,
    Unsigned,
}

/// Target of the `number` alias and the result of coalescing across numeric families.
pub const DEFAULT_NUMERIC: NativeType = NativeType::F64;

impl NativeType {
    pub const ALL: [NativeType; 13] = [
        NativeType::I8,
        NativeType::I16,
        NativeType::I32,
        NativeType::I64,
        NativeType::U8,
        NativeType::U16,
        NativeType::U32,
        NativeType::U64,
        NativeType::F32,
        NativeType::F64,
        NativeType::Bool,
        NativeType::String,
        NativeType::Null,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NativeType::I8 => "i8",
            NativeType::I16 => "i16",
            NativeType::I32 => "i32",
            NativeType::I64 => "i64",
            NativeType::U8 => "u8",
            NativeType::U16 => "u16",
            NativeType::U32 => "u32",
            NativeType::U64 => "u64",
            NativeType::F32 => "f32",
            NativeType::F64 => "f64",
            NativeType::Bool => "bool",
            NativeType::String => "string",
            NativeType::Null => "null",
        }
    }

    pub fn family(self) -> Option<NumericFamily> {
        match self {
            NativeType::I8 | NativeType::I16 | NativeType::I32 | NativeType::I64 => {
                Some(NumericFamily::Signed)
            }
            NativeType::U8 | NativeType::U16 | NativeType::U32 | NativeType::U64 => {
                Some(NumericFamily::Unsigned)
            }
            NativeType::F32 | NativeType::F64 => Some(NumericFamily::Float),
            NativeType::Bool | NativeType::String | NativeType::Null => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.family().is_some()
    }

    /// Width in bits of numeric types, zero otherwise.
    pub fn bits(self) -> u32 {
        match self {
            NativeType::I8 | NativeType::U8 => 8,
            NativeType::I16 | NativeType::U16 => 16,
            NativeType::I32 | NativeType::U32 | NativeType::F32 => 32,
            NativeType::I64 | NativeType::U64 | NativeType::F64 => 64,
            NativeType::Bool | NativeType::String | NativeType::Null => 0,
        }
    }
}

impl Display for NativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Combines two numeric operand types. `None` means the pair is incompatible.
///
/// - signed and unsigned integers never mix
/// - within one family the wider type wins
/// - floats mixed with integers give [`DEFAULT_NUMERIC`]
pub fn coalesce(left: NativeType, right: NativeType) -> Option<NativeType> {
    let (left_family, right_family) = (left.family()?, right.family()?);

    if left_family == right_family {
        return Some(if left.bits() >= right.bits() { left } else { right });
    }

    match (left_family, right_family) {
        (NumericFamily::Signed, NumericFamily::Unsigned)
        | (NumericFamily::Unsigned, NumericFamily::Signed) => None,
        _ => Some(DEFAULT_NUMERIC),
    }
}

/// The type lattice. Pseudotypes are sentinels, never the type of a runtime value
/// except `Any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Not known yet; a later fixpoint round may resolve it.
    Unresolved,
    /// The expression denotes a type or module, not an instance.
    NoType,
    /// Known to be invalid; further diagnostics about it are suppressed.
    Error,
    Anonymous,
    /// The type of a function name used as a value.
    Function,
    Any,
    Native(NativeType),
    /// A user-declared struct.
    Named(SymbolRef),
}

impl Ty {
    pub fn is_resolved(&self) -> bool {
        *self != Ty::Unresolved
    }

    pub fn is_error(&self) -> bool {
        *self == Ty::Error
    }

    pub fn native(&self) -> Option<NativeType> {
        match self {
            Ty::Native(native) => Some(*native),
            _ => None,
        }
    }
}

impl Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Unresolved => write!(f, "<unresolved>"),
            Ty::NoType => write!(f, "<no type>"),
            Ty::Error => write!(f, "<error>"),
            Ty::Anonymous => write!(f, "<anonymous>"),
            Ty::Function => write!(f, "<function>"),
            Ty::Any => write!(f, "any"),
            Ty::Native(native) => write!(f, "{}", native),
            Ty::Named(symbol) => write!(f, "struct {}", symbol),
        }
    }
}
