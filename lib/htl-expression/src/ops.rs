//! Operator semantics.
//!
//! Used by constant folding in the compiler, and by anything else that needs to evaluate operators over known values.

use crate::error::{InvalidComparison, InvalidOperand, OperatorError};
use crate::node::{BinaryOperator, Number, UnaryOperator};
use crate::value::Value;

type Result<T> = std::result::Result<T, OperatorError>;

/// Applies a unary operator.
pub fn unary(operator: UnaryOperator, operand: &Value) -> Result<Value> {
    match operator {
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOperator::IsWhitespace => Ok(Value::Bool(operand.to_string().trim().is_empty())),
        UnaryOperator::Length => match operand {
            Value::Null => Ok(Value::Int(0)),
            Value::Array(items) => Ok(Value::Int(items.len() as i64)),
            Value::Map(entries) => Ok(Value::Int(entries.len() as i64)),
            Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
            other => InvalidOperand {
                operator: "length",
                reason: format!("cannot take the length of a {}", other.kind()),
            }
            .fail(),
        },
    }
}

/// Applies a binary operator.
///
/// `&&` and `||` return one of their operands rather than a boolean.
pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    match operator {
        BinaryOperator::And => Ok(if left.is_truthy() { right.clone() } else { left.clone() }),
        BinaryOperator::Or => Ok(if left.is_truthy() { left.clone() } else { right.clone() }),
        BinaryOperator::Concatenate => Ok(concatenate(left, right)),
        BinaryOperator::Lt | BinaryOperator::Leq | BinaryOperator::Gt | BinaryOperator::Geq => {
            compare(left, operator, right).map(Value::Bool)
        }
        BinaryOperator::Eq => Ok(Value::Bool(loose_eq(left, right))),
        BinaryOperator::Neq => Ok(Value::Bool(!loose_eq(left, right))),
        BinaryOperator::StrictEq => strict_eq(left, right).map(Value::Bool),
        BinaryOperator::StrictNeq => strict_eq(left, right).map(|eq| Value::Bool(!eq)),
        BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div
        | BinaryOperator::IDiv
        | BinaryOperator::Rem => arithmetic(left, operator, right),
        BinaryOperator::In => Ok(Value::Bool(contains(right, left))),
    }
}

/// Strict equality.
///
/// Numbers compare by numeric value, strings by content and booleans by value. `null` equals only `null`, and is
/// unequal to any string, number or boolean. An enum constant equals a string holding its name, and another enum
/// constant of the same type and name.
///
/// # Errors
///
/// Any other pairing of operands cannot be compared, and an error is returned.
pub fn strict_eq(left: &Value, right: &Value) -> Result<bool> {
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, Value::String(_) | Value::Bool(_) | Value::Int(_) | Value::Float(_))
        | (Value::String(_) | Value::Bool(_) | Value::Int(_) | Value::Float(_), Value::Null) => Ok(false),
        (Value::Int(l), Value::Int(r)) => Ok(l == r),
        (l, r) if l.is_number() && r.is_number() => Ok(as_f64(l) == as_f64(r)),
        (Value::String(l), Value::String(r)) => Ok(l == r),
        (Value::Bool(l), Value::Bool(r)) => Ok(l == r),
        (Value::Enum { name, .. }, Value::String(s)) | (Value::String(s), Value::Enum { name, .. }) => Ok(name == s),
        (
            Value::Enum {
                type_name: lt,
                name: ln,
            },
            Value::Enum {
                type_name: rt,
                name: rn,
            },
        ) => Ok(lt == rt && ln == rn),
        (l, r) => InvalidComparison {
            reason: format!(
                "Invalid types in comparison. Equality is supported for String, Number, Boolean and Enum types, \
                 got {} and {}",
                l.kind(),
                r.kind()
            ),
        }
        .fail(),
    }
}

/// Ordered comparison of two numbers.
///
/// # Errors
///
/// If either operand is not a number, or `operator` is not one of `<`, `<=`, `>` or `>=`, an error is returned.
pub fn compare(left: &Value, operator: BinaryOperator, right: &Value) -> Result<bool> {
    if !left.is_number() || !right.is_number() {
        return InvalidComparison {
            reason: format!(
                "Operands of '{}' must be numbers, got {} and {}",
                operator.symbol(),
                left.kind(),
                right.kind()
            ),
        }
        .fail();
    }

    if let (Value::Int(l), Value::Int(r)) = (left, right) {
        return cmp_ord(l, r, operator);
    }
    cmp_ord(&as_f64(left), &as_f64(right), operator)
}

fn cmp_ord<T: PartialOrd>(l: &T, r: &T, operator: BinaryOperator) -> Result<bool> {
    match operator {
        BinaryOperator::Lt => Ok(l < r),
        BinaryOperator::Leq => Ok(l <= r),
        BinaryOperator::Gt => Ok(l > r),
        BinaryOperator::Geq => Ok(l >= r),
        other => InvalidComparison {
            reason: format!("'{}' is not an ordering operator", other.symbol()),
        }
        .fail(),
    }
}

/// Loose equality.
///
/// Behaves like [`strict_eq`] where that is defined, and falls back to structural equality otherwise.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    strict_eq(left, right).unwrap_or_else(|_| left == right)
}

/// Membership test: an item of an array, a key of a map, or a substring of a string.
///
/// Every other container holds nothing.
pub fn contains(container: &Value, item: &Value) -> bool {
    match container {
        Value::Array(items) => items.iter().any(|candidate| loose_eq(candidate, item)),
        Value::Map(entries) => entries.contains_key(&item.to_string()),
        Value::String(s) => s.contains(&item.to_string()),
        _ => false,
    }
}

/// String concatenation of the output forms of both operands.
pub fn concatenate(left: &Value, right: &Value) -> Value {
    Value::String(format!("{}{}", left, right))
}

/// Applies an arithmetic operator.
///
/// Operands are coerced to numbers. Integer arithmetic stays integral as long as the result is exact.
///
/// # Errors
///
/// If an operand cannot be coerced to a number, or a division by zero is attempted, an error is returned.
pub fn arithmetic(left: &Value, operator: BinaryOperator, right: &Value) -> Result<Value> {
    let l = to_operand(left, operator)?;
    let r = to_operand(right, operator)?;

    if matches!(operator, BinaryOperator::Div | BinaryOperator::IDiv | BinaryOperator::Rem) && r.is_zero() {
        return InvalidOperand {
            operator: operator.symbol(),
            reason: "division by zero".to_string(),
        }
        .fail();
    }

    match (l, r) {
        (Number::Int(l), Number::Int(r)) => match int_op(l, r, operator) {
            Some(value) => Ok(value),
            None => float_op(l as f64, r as f64, operator),
        },
        (l, r) => float_op(l.as_f64(), r.as_f64(), operator),
    }
}

fn to_operand(value: &Value, operator: BinaryOperator) -> Result<Number> {
    match value.to_number() {
        Some(number) => Ok(number),
        None => InvalidOperand {
            operator: operator.symbol(),
            reason: format!("{} value '{}' is not a number", value.kind(), value),
        }
        .fail(),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(d) => *d,
        _ => f64::NAN,
    }
}

/// Integer arithmetic. Returns `None` when the result is not exactly representable as an integer.
#[inline]
fn int_op(l: i64, r: i64, operator: BinaryOperator) -> Option<Value> {
    let result = match operator {
        BinaryOperator::Add => l.checked_add(r)?,
        BinaryOperator::Sub => l.checked_sub(r)?,
        BinaryOperator::Mul => l.checked_mul(r)?,
        BinaryOperator::Div if l.checked_rem(r)? != 0 => return None,
        BinaryOperator::Div | BinaryOperator::IDiv => l.checked_div(r)?,
        BinaryOperator::Rem => l.checked_rem(r)?,
        _ => return None,
    };
    Some(Value::Int(result))
}

#[inline]
fn float_op(l: f64, r: f64, operator: BinaryOperator) -> Result<Value> {
    Ok(match operator {
        BinaryOperator::Add => Value::Float(l + r),
        BinaryOperator::Sub => Value::Float(l - r),
        BinaryOperator::Mul => Value::Float(l * r),
        BinaryOperator::Div => Value::Float(l / r),
        BinaryOperator::IDiv => Value::Int((l / r).trunc() as i64),
        BinaryOperator::Rem => Value::Float(l % r),
        other => {
            return InvalidOperand {
                operator: other.symbol(),
                reason: "not an arithmetic operator".to_string(),
            }
            .fail()
        }
    })
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use similar_asserts::assert_eq;

    use super::*;

    fn one() -> Value {
        Value::enum_constant("TestEnum", "ONE")
    }

    #[test]
    fn strict_eq_enums_and_strings() {
        assert!(strict_eq(&one(), &Value::string("ONE")).unwrap());
        assert!(!strict_eq(&one(), &Value::string("TWO")).unwrap());
        assert!(strict_eq(&Value::string("ONE"), &one()).unwrap());
        assert!(!strict_eq(&Value::string("ONE"), &Value::enum_constant("TestEnum", "TWO")).unwrap());
        assert!(strict_eq(&one(), &one()).unwrap());
        assert!(!strict_eq(&one(), &Value::enum_constant("TestEnum", "TWO")).unwrap());
        assert!(!strict_eq(&one(), &Value::enum_constant("OtherEnum", "ONE")).unwrap());
    }

    #[test]
    fn strict_eq_scalars() {
        assert!(strict_eq(&Value::Null, &Value::Null).unwrap());
        assert!(!strict_eq(&Value::Null, &Value::string("")).unwrap());
        assert!(!strict_eq(&Value::Int(0), &Value::Null).unwrap());
        assert!(!strict_eq(&Value::Null, &Value::Bool(false)).unwrap());
        assert!(strict_eq(&Value::Int(1), &Value::Float(1.0)).unwrap());
        assert!(strict_eq(&Value::Bool(true), &Value::Bool(true)).unwrap());
        assert!(!strict_eq(&Value::string("a"), &Value::string("b")).unwrap());
    }

    #[test]
    fn strict_eq_rejects_incomparable_operands() {
        let object = || Value::Object("object".to_string());
        assert!(matches!(
            strict_eq(&object(), &object()),
            Err(OperatorError::InvalidComparison { .. })
        ));
        assert!(strict_eq(&Value::Null, &one()).is_err());
        assert!(strict_eq(&Value::Int(1), &one()).is_err());
        assert!(strict_eq(&Value::Int(1), &Value::string("1")).is_err());
        assert!(strict_eq(&Value::Array(vec![]), &Value::Array(vec![])).is_err());
    }

    #[test]
    fn ordering_requires_numbers() {
        assert!(compare(&Value::Int(1), BinaryOperator::Lt, &Value::Int(2)).unwrap());
        assert!(compare(&Value::Int(2), BinaryOperator::Leq, &Value::Float(2.0)).unwrap());
        assert!(!compare(&Value::Float(2.5), BinaryOperator::Gt, &Value::Int(3)).unwrap());
        assert!(compare(&Value::Int(3), BinaryOperator::Geq, &Value::Int(3)).unwrap());

        for (left, right) in [
            (Value::string("a"), Value::string("b")),
            (Value::Int(1), Value::string("2")),
            (Value::Null, Value::Int(1)),
            (Value::Bool(true), Value::Bool(false)),
        ] {
            assert!(matches!(
                compare(&left, BinaryOperator::Lt, &right),
                Err(OperatorError::InvalidComparison { .. })
            ));
            assert!(compare(&left, BinaryOperator::Leq, &right).is_err());
        }
    }

    #[test]
    fn logical_operators_return_operands() {
        let a = Value::string("a");
        let empty = Value::string("");
        assert_eq!(binary(BinaryOperator::And, &a, &Value::Int(2)).unwrap(), Value::Int(2));
        assert_eq!(binary(BinaryOperator::And, &empty, &Value::Int(2)).unwrap(), empty);
        assert_eq!(binary(BinaryOperator::Or, &empty, &a).unwrap(), a);
        assert_eq!(binary(BinaryOperator::Or, &a, &Value::Null).unwrap(), a);
    }

    #[test]
    fn arithmetic_coerces_and_stays_integral() {
        assert_eq!(
            arithmetic(&Value::Int(6), BinaryOperator::Div, &Value::Int(3)).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            arithmetic(&Value::Int(7), BinaryOperator::Div, &Value::Int(2)).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            arithmetic(&Value::Int(7), BinaryOperator::IDiv, &Value::Int(2)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            arithmetic(&Value::string("4"), BinaryOperator::Mul, &Value::Float(0.5)).unwrap(),
            Value::Float(2.0)
        );
        assert_eq!(
            arithmetic(&Value::Int(7), BinaryOperator::Rem, &Value::Int(4)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            arithmetic(&Value::Int(i64::MAX), BinaryOperator::Add, &Value::Int(1)).unwrap(),
            Value::Float(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn arithmetic_rejects_bad_operands() {
        assert!(matches!(
            arithmetic(&Value::string("x"), BinaryOperator::Add, &Value::Int(1)),
            Err(OperatorError::InvalidOperand { .. })
        ));
        assert!(arithmetic(&Value::Bool(true), BinaryOperator::Sub, &Value::Int(1)).is_err());
        assert!(arithmetic(&Value::Int(1), BinaryOperator::Div, &Value::Int(0)).is_err());
        assert!(arithmetic(&Value::Float(1.0), BinaryOperator::Rem, &Value::Float(0.0)).is_err());
    }

    #[test]
    fn membership() {
        let array = Value::Array(vec![Value::Int(1), Value::string("two")]);
        assert!(contains(&array, &Value::Int(1)));
        assert!(contains(&array, &Value::string("two")));
        assert!(!contains(&array, &Value::string("1")));

        let mut entries = IndexMap::new();
        entries.insert("key".to_string(), Value::Null);
        assert!(contains(&Value::Map(entries), &Value::string("key")));

        assert!(contains(&Value::string("haystack"), &Value::string("st")));
        assert!(!contains(&Value::Int(5), &Value::Int(5)));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(unary(UnaryOperator::Not, &Value::string("false")).unwrap(), Value::Bool(true));
        assert_eq!(
            unary(UnaryOperator::Length, &Value::Array(vec![Value::Null, Value::Null])).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            unary(UnaryOperator::IsWhitespace, &Value::string(" \n")).unwrap(),
            Value::Bool(true)
        );
        assert!(unary(UnaryOperator::Length, &Value::Bool(true)).is_err());
    }
}
