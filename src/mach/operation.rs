use super::{Opcode, Value};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Expression operations
///
/// Integers promote to doubles when mixed. Integer arithmetic is checked.

pub struct Operation {}

impl Operation {
    /// Apply a binary expression opcode.
    pub fn binary(op: Opcode, lhs: Value, rhs: Value) -> Result<Value> {
        use Opcode::*;
        match op {
            Add => Operation::sum(lhs, rhs),
            Sub => Operation::subtract(lhs, rhs),
            Mul => Operation::multiply(lhs, rhs),
            Div => Operation::divide(lhs, rhs),
            Mod => Operation::modulus(lhs, rhs),
            Pow => Operation::power(lhs, rhs),
            Eq => Ok(Value::Boolean(Operation::equal_bool(&lhs, &rhs)?)),
            Ne => Ok(Value::Boolean(!Operation::equal_bool(&lhs, &rhs)?)),
            Lt => Ok(Value::Boolean(Operation::less_bool(&lhs, &rhs)?)),
            Le => Ok(Value::Boolean(!Operation::less_bool(&rhs, &lhs)?)),
            Gt => Ok(Value::Boolean(Operation::less_bool(&rhs, &lhs)?)),
            Ge => Ok(Value::Boolean(!Operation::less_bool(&lhs, &rhs)?)),
            _ => Err(error!(InternalError; "NOT A BINARY OPERATION")),
        }
    }

    pub fn negate(val: Value) -> Result<Value> {
        match val {
            Value::Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Overflow)),
            },
            Value::Double(n) => Ok(Value::Double(-n)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn not(val: Value) -> Result<Value> {
        Ok(Value::Boolean(!val.is_true()?))
    }

    pub fn sum(lhs: Value, rhs: Value) -> Result<Value> {
        use Value::*;
        match (lhs, rhs) {
            (String(l), String(r)) => Ok(String(l + &r)),
            (String(l), r @ Integer(_)) | (String(l), r @ Double(_)) => {
                Ok(String(l + &r.to_string()))
            }
            (Array(mut l), Array(r)) => {
                l.extend(r);
                Ok(Array(l))
            }
            (Integer(l), Integer(r)) => match l.checked_add(r) {
                Some(i) => Ok(Integer(i)),
                None => Err(error!(Overflow)),
            },
            (l, r) => Operation::doubles(l, r, |l, r| l + r),
        }
    }

    pub fn subtract(lhs: Value, rhs: Value) -> Result<Value> {
        match (lhs, rhs) {
            (Value::Integer(l), Value::Integer(r)) => match l.checked_sub(r) {
                Some(i) => Ok(Value::Integer(i)),
                None => Err(error!(Overflow)),
            },
            (l, r) => Operation::doubles(l, r, |l, r| l - r),
        }
    }

    pub fn multiply(lhs: Value, rhs: Value) -> Result<Value> {
        match (lhs, rhs) {
            (Value::Integer(l), Value::Integer(r)) => match l.checked_mul(r) {
                Some(i) => Ok(Value::Integer(i)),
                None => Err(error!(Overflow)),
            },
            (l, r) => Operation::doubles(l, r, |l, r| l * r),
        }
    }

    pub fn divide(lhs: Value, rhs: Value) -> Result<Value> {
        match (lhs, rhs) {
            (Value::Integer(l), Value::Integer(r)) => match l.checked_div(r) {
                Some(i) => Ok(Value::Integer(i)),
                None => {
                    if r == 0 {
                        Err(error!(DivisionByZero))
                    } else {
                        Err(error!(Overflow))
                    }
                }
            },
            (l, r) => {
                if Operation::is_zero(&r) {
                    return Err(error!(DivisionByZero));
                }
                Operation::doubles(l, r, |l, r| l / r)
            }
        }
    }

    pub fn modulus(lhs: Value, rhs: Value) -> Result<Value> {
        match (lhs, rhs) {
            (Value::Integer(l), Value::Integer(r)) => match l.checked_rem(r) {
                Some(i) => Ok(Value::Integer(i)),
                None => {
                    if r == 0 {
                        Err(error!(DivisionByZero))
                    } else {
                        Err(error!(Overflow))
                    }
                }
            },
            (l, r) => {
                if Operation::is_zero(&r) {
                    return Err(error!(DivisionByZero));
                }
                Operation::doubles(l, r, |l, r| l % r)
            }
        }
    }

    pub fn power(lhs: Value, rhs: Value) -> Result<Value> {
        match (lhs, rhs) {
            (Value::Integer(l), Value::Integer(r)) if r >= 0 && r <= u32::MAX as i64 => {
                match l.checked_pow(r as u32) {
                    Some(i) => Ok(Value::Integer(i)),
                    None => Err(error!(Overflow)),
                }
            }
            (l, r) => Operation::doubles(l, r, f64::powf),
        }
    }

    fn is_zero(val: &Value) -> bool {
        match val {
            Value::Integer(n) => *n == 0,
            Value::Double(n) => *n == 0.0,
            _ => false,
        }
    }

    fn doubles(lhs: Value, rhs: Value, f: impl Fn(f64, f64) -> f64) -> Result<Value> {
        let l = Operation::numeric(&lhs)?;
        let r = Operation::numeric(&rhs)?;
        let n = f(l, r);
        if n.is_nan() || n.is_infinite() {
            Err(error!(Overflow))
        } else {
            Ok(Value::Double(n))
        }
    }

    fn numeric(val: &Value) -> Result<f64> {
        match val {
            Value::Integer(n) => Ok(*n as f64),
            Value::Double(n) => Ok(*n),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn equal_bool(lhs: &Value, rhs: &Value) -> Result<bool> {
        use Value::*;
        match (lhs, rhs) {
            (Integer(l), Integer(r)) => Ok(l == r),
            (String(l), String(r)) => Ok(l == r),
            (Boolean(l), Boolean(r)) => Ok(l == r),
            (Array(l), Array(r)) => {
                if l.len() != r.len() {
                    return Ok(false);
                }
                for (l, r) in l.iter().zip(r.iter()) {
                    if !Operation::equal_bool(l, r)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (l, r) => {
                let l = Operation::numeric(l)?;
                let r = Operation::numeric(r)?;
                Ok((l - r).abs() < std::f64::EPSILON)
            }
        }
    }

    pub fn less_bool(lhs: &Value, rhs: &Value) -> Result<bool> {
        use Value::*;
        match (lhs, rhs) {
            (Integer(l), Integer(r)) => Ok(l < r),
            (String(l), String(r)) => Ok(l < r),
            (Boolean(l), Boolean(r)) => Ok(l < r),
            (l, r) => Ok(Operation::numeric(l)? < Operation::numeric(r)?),
        }
    }
}
