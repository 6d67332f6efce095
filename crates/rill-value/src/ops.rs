//! Binary and unary operator evaluation.
//!
//! Every binary operator coerces its right operand to the left operand's tag
//! before running (the left operand's tag always wins — there is no "widest
//! type" promotion). When the left operand is a `Collection`, the operator is
//! applied element-wise: against another collection of identical cardinality,
//! pairwise by position; against a scalar, broadcast against every element.

use std::fmt;

use crate::coerce::convert;
use crate::collection::Collection;
use crate::tag::Tag;
use crate::value::{Value, FLOAT_EPSILON};

/// A binary operator recognized by the value model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitXor,
    BitAnd,
    BitOr,
    ShiftLeft,
    ShiftRight,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

/// A unary operator recognized by the value model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    Inc,
    Dec,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Exp => "^",
            BinOp::BitXor => "xor",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::ShiftLeft => "<<",
            BinOp::ShiftRight => ">>",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{s}")
    }
}

/// Errors raised while evaluating an operator. All of these are fatal: the
/// VM has no recoverable-exception mechanism, so raising one of these always
/// routes through the error-hook dispatch in [`crate`]'s consumers.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("division by zero")]
    DivideByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("operator {op} is not defined for {tag}")]
    InvalidOperand { op: BinOp, tag: Tag },
    #[error("unary operator is not defined for {tag}")]
    InvalidUnaryOperand { tag: Tag },
    #[error("collection operands have mismatched cardinality ({left} vs {right})")]
    CardinalityMismatch { left: usize, right: usize },
}

type ValueResult = Result<Value, ValueError>;

fn scalar_binary(op: BinOp, lhs: &Value, rhs: &Value) -> ValueResult {
    let rhs = convert(rhs, lhs.tag());
    match (op, lhs) {
        (BinOp::Add, Value::String(a)) => {
            let Value::String(b) = &rhs else { unreachable!() };
            Ok(Value::String(format!("{a}{b}")))
        }
        (BinOp::Add, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a.wrapping_add(b)))
        }
        (BinOp::Add, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Double(a + b))
        }
        (BinOp::Sub, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a.wrapping_sub(b)))
        }
        (BinOp::Sub, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Double(a - b))
        }
        (BinOp::Mul, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a.wrapping_mul(b)))
        }
        (BinOp::Mul, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Double(a * b))
        }
        (BinOp::Div, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            if b == 0 {
                return Err(ValueError::DivideByZero);
            }
            Ok(Value::Integer(a / b))
        }
        (BinOp::Div, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            if b == 0.0 {
                return Err(ValueError::DivideByZero);
            }
            Ok(Value::Double(a / b))
        }
        (BinOp::Mod, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            if b == 0 {
                return Err(ValueError::ModuloByZero);
            }
            Ok(Value::Integer(a % b))
        }
        (BinOp::Mod, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            if b == 0.0 {
                return Err(ValueError::ModuloByZero);
            }
            Ok(Value::Double(a % b))
        }
        // Exponentiation keeps the left operand's tag: int ^ anything stays
        // an integer (truncating), double ^ anything stays a double.
        (BinOp::Exp, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer((*a as f64).powi(b as i32) as i64))
        }
        (BinOp::Exp, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Double(a.powf(b)))
        }
        (BinOp::BitXor, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a ^ b))
        }
        (BinOp::BitAnd, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a & b))
        }
        (BinOp::BitOr, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a | b))
        }
        (BinOp::ShiftLeft, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a.wrapping_shl(b as u32)))
        }
        (BinOp::ShiftRight, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Integer(a.wrapping_shr(b as u32)))
        }
        (BinOp::Eq, _) => Ok(Value::Bool(*lhs == rhs)),
        (BinOp::Ne, _) => Ok(Value::Bool(*lhs != rhs)),
        (BinOp::Gt, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a > b))
        }
        (BinOp::Gt, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a > b + FLOAT_EPSILON))
        }
        (BinOp::Ge, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a >= b))
        }
        (BinOp::Ge, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a >= b - FLOAT_EPSILON))
        }
        (BinOp::Lt, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a < b))
        }
        (BinOp::Lt, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a < b - FLOAT_EPSILON))
        }
        (BinOp::Le, Value::Integer(a)) => {
            let Value::Integer(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a <= b))
        }
        (BinOp::Le, Value::Double(a)) => {
            let Value::Double(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a <= b + FLOAT_EPSILON))
        }
        (BinOp::And, Value::Bool(a)) => {
            let Value::Bool(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a && b))
        }
        (BinOp::Or, Value::Bool(a)) => {
            let Value::Bool(b) = rhs else { unreachable!() };
            Ok(Value::Bool(*a || b))
        }
        (BinOp::Gt | BinOp::Ge | BinOp::Lt | BinOp::Le, Value::String(a)) => {
            let Value::String(b) = rhs else { unreachable!() };
            let cmp = a.cmp(&b);
            let result = match op {
                BinOp::Gt => cmp.is_gt(),
                BinOp::Ge => cmp.is_ge(),
                BinOp::Lt => cmp.is_lt(),
                BinOp::Le => cmp.is_le(),
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        _ => Err(ValueError::InvalidOperand {
            op,
            tag: lhs.tag(),
        }),
    }
}

/// Evaluate `lhs op rhs`. `rhs` is coerced to `lhs`'s tag before the
/// operator runs, unless `lhs` is a `Collection`, in which case the
/// operator is distributed element-wise.
pub fn binary(op: BinOp, lhs: &Value, rhs: &Value) -> ValueResult {
    match lhs {
        Value::Collection(left) => match rhs {
            Value::Collection(right) => {
                if left.len() != right.len() {
                    return Err(ValueError::CardinalityMismatch {
                        left: left.len(),
                        right: right.len(),
                    });
                }
                let mut out = Collection::new();
                for ((k, lv), (_, rv)) in left.iter().zip(right.iter()) {
                    out.insert(k.to_string(), binary(op, lv, rv)?);
                }
                Ok(Value::Collection(out))
            }
            scalar => {
                let mut out = Collection::new();
                for (k, lv) in left.iter() {
                    out.insert(k.to_string(), binary(op, lv, scalar)?);
                }
                Ok(Value::Collection(out))
            }
        },
        _ => scalar_binary(op, lhs, rhs),
    }
}

/// Evaluate a unary operator.
pub fn unary(op: UnOp, v: &Value) -> ValueResult {
    match (op, v) {
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Neg, Value::Integer(i)) => Ok(Value::Integer(-i)),
        (UnOp::Neg, Value::Double(d)) => Ok(Value::Double(-d)),
        (UnOp::Inc, Value::Integer(i)) => Ok(Value::Integer(i + 1)),
        (UnOp::Inc, Value::Double(d)) => Ok(Value::Double(d + 1.0)),
        (UnOp::Dec, Value::Integer(i)) => Ok(Value::Integer(i - 1)),
        (UnOp::Dec, Value::Double(d)) => Ok(Value::Double(d - 1.0)),
        (UnOp::Neg, Value::Collection(c)) | (UnOp::Not, Value::Collection(c)) => {
            let mut out = Collection::new();
            for (k, v) in c.iter() {
                out.insert(k.to_string(), unary(op, v)?);
            }
            Ok(Value::Collection(out))
        }
        _ => Err(ValueError::InvalidUnaryOperand { tag: v.tag() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_zero_is_fatal_for_ints_and_doubles() {
        assert!(matches!(
            binary(BinOp::Div, &Value::Integer(1), &Value::Integer(0)),
            Err(ValueError::DivideByZero)
        ));
        assert!(matches!(
            binary(BinOp::Div, &Value::Double(1.0), &Value::Double(0.0)),
            Err(ValueError::DivideByZero)
        ));
    }

    #[test]
    fn right_operand_coerces_to_left_tag() {
        let result = binary(BinOp::Add, &Value::Integer(1), &Value::String("2abc".into())).unwrap();
        assert_eq!(result, Value::Integer(3));
    }

    #[test]
    fn string_concatenation() {
        let result = binary(
            BinOp::Add,
            &Value::String("foo".into()),
            &Value::String("bar".into()),
        )
        .unwrap();
        assert_eq!(result, Value::String("foobar".to_string()));
    }

    #[test]
    fn collection_scalar_broadcast() {
        let mut c = Collection::new();
        c.insert("0", Value::Integer(1));
        c.insert("1", Value::Integer(2));
        let result = binary(BinOp::Add, &Value::Collection(c), &Value::Integer(10)).unwrap();
        let Value::Collection(out) = result else {
            panic!("expected collection");
        };
        assert_eq!(out.get("0"), Some(&Value::Integer(11)));
        assert_eq!(out.get("1"), Some(&Value::Integer(12)));
    }

    #[test]
    fn collection_cardinality_mismatch_errors() {
        let mut a = Collection::new();
        a.insert("0", Value::Integer(1));
        let mut b = Collection::new();
        b.insert("0", Value::Integer(1));
        b.insert("1", Value::Integer(2));
        let err = binary(BinOp::Add, &Value::Collection(a), &Value::Collection(b)).unwrap_err();
        assert!(matches!(err, ValueError::CardinalityMismatch { left: 1, right: 2 }));
    }

    #[test]
    fn exponentiation_keeps_left_tag() {
        assert_eq!(
            binary(BinOp::Exp, &Value::Integer(2), &Value::Integer(10)).unwrap(),
            Value::Integer(1024)
        );
        let Value::Double(d) = binary(BinOp::Exp, &Value::Double(2.0), &Value::Double(0.5)).unwrap() else {
            panic!("expected double");
        };
        assert!((d - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn negation_is_forbidden_on_string_and_bool() {
        assert!(unary(UnOp::Neg, &Value::String("x".into())).is_err());
        assert!(unary(UnOp::Neg, &Value::Bool(true)).is_err());
    }
}
