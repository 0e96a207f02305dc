use std::num::IntErrorKind;

use crate::{
    errors::errors::ErrorImpl,
    semantic::symbols::types::{NativeType, NumericFamily},
};

use super::bound::ConstantValue;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLiteral {
    pub ty: NativeType,
    pub value: ConstantValue,
}

impl ParsedLiteral {
    fn zero(ty: NativeType) -> Self {
        let value = match ty.family() {
            Some(NumericFamily::Float) => ConstantValue::Float(0.0),
            Some(NumericFamily::Unsigned) => ConstantValue::UInt(0),
            _ => ConstantValue::Int(0),
        };
        ParsedLiteral { ty, value }
    }
}

/// A literal that could not be interpreted as written.
///
/// `recovered` carries the typed zero an overflowing literal is clamped to; it is `None`
/// when the literal is unusable and must be typed as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralError {
    pub recovered: Option<ParsedLiteral>,
    pub error: ErrorImpl,
}

impl LiteralError {
    fn malformed(lexeme: &str, reason: &str) -> Self {
        LiteralError {
            recovered: None,
            error: ErrorImpl::MalformedNumericLiteral {
                literal: lexeme.to_string(),
                reason: reason.to_string(),
            },
        }
    }

    fn overflow(lexeme: &str, negated: bool, ty: NativeType) -> Self {
        let literal = if negated {
            format!("-{}", lexeme)
        } else {
            lexeme.to_string()
        };

        LiteralError {
            recovered: Some(ParsedLiteral::zero(ty)),
            error: ErrorImpl::NumericLiteralOverflow {
                literal,
                type_: ty.name().to_string(),
            },
        }
    }
}

/// Interprets a raw numeric lexeme. `negated` is set when a unary minus applies directly
/// to the literal, so the bound check can admit the most negative signed value.
pub fn parse_numeric(lexeme: &str, negated: bool) -> Result<ParsedLiteral, LiteralError> {
    validate_separators(lexeme)?;

    let stripped: String = lexeme.chars().filter(|c| *c != '_').collect();
    let (base, body) = split_base(&stripped);
    let (number, suffix) = body.split_at(suffix_start(base, body));

    if number.is_empty() {
        return Err(LiteralError::malformed(lexeme, "missing digits"));
    }

    let is_decimal = number.contains('.')
        || (base == 10 && number.contains(['e', 'E']))
        || suffix.starts_with('f');

    if is_decimal {
        if base != 10 {
            return Err(LiteralError {
                recovered: None,
                error: ErrorImpl::UnsupportedNumericLiteral {
                    literal: lexeme.to_string(),
                    reason: format!("decimal literals in base {}", base),
                },
            });
        }
        parse_decimal(lexeme, number, suffix, negated)
    } else {
        parse_integral(lexeme, base, number, suffix, negated)
    }
}

fn validate_separators(lexeme: &str) -> Result<(), LiteralError> {
    if lexeme.contains("__") {
        return Err(LiteralError::malformed(lexeme, "consecutive `_` separators"));
    }
    if lexeme.ends_with('_') {
        return Err(LiteralError::malformed(lexeme, "trailing `_` separator"));
    }
    if lexeme.contains("_.") || lexeme.contains("._") {
        return Err(LiteralError::malformed(lexeme, "`_` next to the decimal point"));
    }
    if lexeme.ends_with('.') {
        return Err(LiteralError::malformed(lexeme, "missing digits after the decimal point"));
    }
    Ok(())
}

fn split_base(digits: &str) -> (u32, &str) {
    let prefix = digits.get(..2).map(str::to_ascii_lowercase);

    match prefix.as_deref() {
        Some("0x") => (16, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        _ => (10, digits),
    }
}

fn suffix_start(base: u32, body: &str) -> usize {
    let is_suffix = |c: char| match base {
        16 => c == 'i' || c == 'u',
        10 => c.is_ascii_alphabetic() && c != 'e' && c != 'E',
        _ => c.is_ascii_alphabetic(),
    };

    body.find(is_suffix).unwrap_or(body.len())
}

fn parse_decimal(
    lexeme: &str,
    number: &str,
    suffix: &str,
    negated: bool,
) -> Result<ParsedLiteral, LiteralError> {
    let ty = match suffix {
        "" | "f64" => NativeType::F64,
        "f" | "f32" => NativeType::F32,
        _ => {
            return Err(LiteralError {
                recovered: None,
                error: ErrorImpl::InvalidNumericSuffix {
                    literal: lexeme.to_string(),
                    suffix: suffix.to_string(),
                },
            })
        }
    };

    if number.ends_with('.') {
        return Err(LiteralError::malformed(lexeme, "missing digits after the decimal point"));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| LiteralError::malformed(lexeme, "invalid decimal number"))?;

    let fits = match ty {
        NativeType::F32 => value.abs() <= f32::MAX as f64,
        _ => value.is_finite(),
    };
    if !fits {
        return Err(LiteralError::overflow(lexeme, negated, ty));
    }

    let value = if negated { -value } else { value };
    let value = match ty {
        NativeType::F32 => value as f32 as f64,
        _ => value,
    };

    Ok(ParsedLiteral {
        ty,
        value: ConstantValue::Float(value),
    })
}

fn integral_suffix(suffix: &str) -> Option<NativeType> {
    Some(match suffix {
        "" | "i" | "i64" => NativeType::I64,
        "i32" => NativeType::I32,
        "i16" => NativeType::I16,
        "i8" => NativeType::I8,
        "u" | "u64" => NativeType::U64,
        "u32" => NativeType::U32,
        "u16" => NativeType::U16,
        "u8" => NativeType::U8,
        _ => return None,
    })
}

fn parse_integral(
    lexeme: &str,
    base: u32,
    number: &str,
    suffix: &str,
    negated: bool,
) -> Result<ParsedLiteral, LiteralError> {
    let Some(ty) = integral_suffix(suffix) else {
        return Err(LiteralError {
            recovered: None,
            error: ErrorImpl::InvalidNumericSuffix {
                literal: lexeme.to_string(),
                suffix: suffix.to_string(),
            },
        });
    };

    let magnitude = u64::from_str_radix(number, base).map_err(|error| match error.kind() {
        IntErrorKind::PosOverflow => LiteralError::overflow(lexeme, negated, ty),
        _ => LiteralError::malformed(lexeme, &format!("invalid digits for base {}", base)),
    })?;

    let bits = ty.bits();
    let value = match ty.family() {
        Some(NumericFamily::Signed) => {
            let limit = 1i128 << (bits - 1);
            let bound = if negated { limit } else { limit - 1 };
            if magnitude as i128 > bound {
                return Err(LiteralError::overflow(lexeme, negated, ty));
            }

            let signed = if negated {
                -(magnitude as i128)
            } else {
                magnitude as i128
            };
            ConstantValue::Int(signed as i64)
        }
        _ => {
            let max = if bits == 64 {
                u64::MAX
            } else {
                (1u64 << bits) - 1
            };
            if magnitude > max || (negated && magnitude != 0) {
                return Err(LiteralError::overflow(lexeme, negated, ty));
            }
            ConstantValue::UInt(magnitude)
        }
    };

    Ok(ParsedLiteral { ty, value })
}

/// Strips matching delimiters and unescapes `\\`, `\n` and `\r`. Other escapes are kept
/// verbatim.
pub fn parse_string(lexeme: &str) -> Result<String, ErrorImpl> {
    let malformed = || ErrorImpl::MalformedStringLiteral {
        literal: lexeme.to_string(),
    };

    let mut chars = lexeme.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return Err(malformed());
    };
    if !matches!(open, '"' | '\'') || open != close {
        return Err(malformed());
    }

    let mut value = String::new();
    let mut inner = chars.peekable();

    while let Some(c) = inner.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }

        match inner.peek() {
            Some('\\') => value.push('\\'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            _ => {
                value.push('\\');
                continue;
            }
        }
        inner.next();
    }

    Ok(value)
}

pub fn parse_keyword(lexeme: &str) -> Option<ParsedLiteral> {
    match lexeme {
        "true" => Some(ParsedLiteral {
            ty: NativeType::Bool,
            value: ConstantValue::Bool(true),
        }),
        "false" => Some(ParsedLiteral {
            ty: NativeType::Bool,
            value: ConstantValue::Bool(false),
        }),
        "null" => Some(ParsedLiteral {
            ty: NativeType::Null,
            value: ConstantValue::Null,
        }),
        _ => None,
    }
}
