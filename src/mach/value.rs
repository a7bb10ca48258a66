use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Runtime values
///
/// Values live on the operand stack and in symbol tables. They are plain
/// data so tables can be shared between threads.

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Array(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer = 1,
    Double = 2,
    String = 3,
    Boolean = 4,
    Array = 5,
}

impl ValueType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<ValueType> {
        match code {
            1 => Some(ValueType::Integer),
            2 => Some(ValueType::Double),
            3 => Some(ValueType::String),
            4 => Some(ValueType::Boolean),
            5 => Some(ValueType::Array),
            _ => None,
        }
    }

    /// `X%` names hold integers and `X$` names hold strings.
    pub fn for_name(name: &str) -> Option<ValueType> {
        if name.ends_with('%') {
            Some(ValueType::Integer)
        } else if name.ends_with('$') {
            Some(ValueType::String)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            ValueType::Integer => "INTEGER",
            ValueType::Double => "DOUBLE",
            ValueType::String => "STRING",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Array => "ARRAY",
        };
        write!(f, "{}", s)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Array(_) => ValueType::Array,
        }
    }

    pub fn is_true(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(n) => Ok(*n != 0),
            Value::Double(n) => Ok(*n != 0.0),
            Value::String(_) | Value::Array(_) => {
                Err(error!(TypeMismatch; "EXPECTED BOOLEAN"))
            }
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self.convert(ValueType::Integer)? {
            Value::Integer(n) => Ok(n),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self.convert(ValueType::Double)? {
            Value::Double(n) => Ok(n),
            _ => Err(error!(TypeMismatch)),
        }
    }

    pub fn convert(&self, to: ValueType) -> Result<Value> {
        if self.value_type() == to {
            return Ok(self.clone());
        }
        match to {
            ValueType::Integer => match self {
                Value::Double(n) => {
                    if n.is_finite() && n.abs() < i64::MAX as f64 {
                        Ok(Value::Integer(n.trunc() as i64))
                    } else {
                        Err(error!(Overflow))
                    }
                }
                Value::Boolean(b) => Ok(Value::Integer(*b as i64)),
                Value::String(s) => match s.trim().parse::<i64>() {
                    Ok(n) => Ok(Value::Integer(n)),
                    Err(_) => match s.trim().parse::<f64>() {
                        Ok(n) => Value::Double(n).convert(ValueType::Integer),
                        Err(_) => Err(error!(TypeMismatch; "NOT A NUMBER")),
                    },
                },
                _ => Err(error!(TypeMismatch)),
            },
            ValueType::Double => match self {
                Value::Integer(n) => Ok(Value::Double(*n as f64)),
                Value::Boolean(b) => Ok(Value::Double(if *b { 1.0 } else { 0.0 })),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(n) => Ok(Value::Double(n)),
                    Err(_) => Err(error!(TypeMismatch; "NOT A NUMBER")),
                },
                _ => Err(error!(TypeMismatch)),
            },
            ValueType::String => Ok(Value::String(self.to_string())),
            ValueType::Boolean => match self {
                Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                    "TRUE" => Ok(Value::Boolean(true)),
                    "FALSE" => Ok(Value::Boolean(false)),
                    _ => Err(error!(TypeMismatch; "NOT A BOOLEAN")),
                },
                _ => Ok(Value::Boolean(self.is_true()?)),
            },
            ValueType::Array => Ok(Value::Array(vec![self.clone()])),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Array(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "\"{}\"", s)?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert() {
        assert_eq!(
            Value::Double(3.9).convert(ValueType::Integer).unwrap(),
            Value::Integer(3)
        );
        assert_eq!(
            Value::from(" 12 ").convert(ValueType::Integer).unwrap(),
            Value::Integer(12)
        );
        assert_eq!(
            Value::Integer(0).convert(ValueType::Boolean).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::from("a")]).to_string(),
            "[1, \"a\"]"
        );
        assert!(Value::from("x").convert(ValueType::Double).is_err());
    }
}
