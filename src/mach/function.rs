use super::Value;
use crate::error;
use crate::lang::Error;
use rand::Rng;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions
///
/// Names not found here are looked up at run time as `FUNCTION` programs.

pub struct Function {}

impl Function {
    pub fn arity(func_name: &str) -> Option<std::ops::RangeInclusive<usize>> {
        match func_name {
            "RND" | "DATE$" | "TIME$" | "THREAD$" => Some(0..=0),
            "ABS" | "INT" | "SQR" | "SIN" | "COS" | "LEN" | "UPPER$" | "LOWER$" | "STR$"
            | "VAL" => Some(1..=1),
            "LEFT$" | "RIGHT$" => Some(2..=2),
            "MID$" => Some(2..=3),
            _ => None,
        }
    }

    pub fn is_builtin(func_name: &str) -> bool {
        Function::arity(func_name).is_some()
    }

    /// `thread` is the identifier of the calling thread, for `THREAD$`.
    pub fn call(func_name: &str, args: Vec<Value>, thread: &str) -> Result<Value> {
        match Function::arity(func_name) {
            Some(range) if range.contains(&args.len()) => {}
            Some(_) => return Err(error!(ArgumentCount; func_name)),
            None => return Err(error!(UnknownFunction; func_name)),
        }
        let argc = args.len();
        let mut args = args.into_iter();
        let mut arg = || args.next().unwrap_or(Value::Integer(0));
        match func_name {
            "ABS" => Function::abs(arg()),
            "INT" => Function::int(arg()),
            "SQR" => Function::float(arg(), f64::sqrt),
            "SIN" => Function::float(arg(), f64::sin),
            "COS" => Function::float(arg(), f64::cos),
            "LEN" => Function::len(arg()),
            "UPPER$" => Ok(Value::String(Function::string(arg())?.to_uppercase())),
            "LOWER$" => Ok(Value::String(Function::string(arg())?.to_lowercase())),
            "STR$" => Ok(Value::String(arg().to_string())),
            "VAL" => Function::val(arg()),
            "LEFT$" => {
                let s = Function::string(arg())?;
                let n = Function::count(arg())?;
                Ok(Value::String(s.chars().take(n).collect()))
            }
            "RIGHT$" => {
                let s = Function::string(arg())?;
                let n = Function::count(arg())?;
                let len = s.chars().count();
                Ok(Value::String(s.chars().skip(len.saturating_sub(n)).collect()))
            }
            "MID$" => {
                let s = Function::string(arg())?;
                let start = Function::count(arg())?;
                if start == 0 {
                    return Err(error!(SubscriptOutOfRange));
                }
                let rest = s.chars().skip(start - 1);
                let taken: String = if argc == 3 {
                    rest.take(Function::count(arg())?).collect()
                } else {
                    rest.collect()
                };
                Ok(Value::String(taken))
            }
            "RND" => Ok(Value::Double(rand::thread_rng().gen::<f64>())),
            "DATE$" => Ok(Value::String(
                chrono::Local::now().format("%Y-%m-%d").to_string(),
            )),
            "TIME$" => Ok(Value::String(
                chrono::Local::now().format("%H:%M:%S").to_string(),
            )),
            "THREAD$" => Ok(Value::String(thread.to_string())),
            _ => Err(error!(UnknownFunction; func_name)),
        }
    }

    fn abs(val: Value) -> Result<Value> {
        match val {
            Value::Integer(n) => match n.checked_abs() {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Overflow)),
            },
            Value::Double(n) => Ok(Value::Double(n.abs())),
            _ => Err(error!(TypeMismatch)),
        }
    }

    fn int(val: Value) -> Result<Value> {
        match val {
            Value::Integer(n) => Ok(Value::Integer(n)),
            Value::Double(n) => Value::Double(n.floor()).convert(super::ValueType::Integer),
            _ => Err(error!(TypeMismatch)),
        }
    }

    fn float(val: Value, f: fn(f64) -> f64) -> Result<Value> {
        match val {
            Value::Integer(n) => Ok(Value::Double(f(n as f64))),
            Value::Double(n) => Ok(Value::Double(f(n))),
            _ => Err(error!(TypeMismatch)),
        }
    }

    fn len(val: Value) -> Result<Value> {
        match val {
            Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
            Value::Array(v) => Ok(Value::Integer(v.len() as i64)),
            _ => Err(error!(TypeMismatch)),
        }
    }

    fn val(val: Value) -> Result<Value> {
        match val {
            Value::String(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    Ok(Value::Integer(n))
                } else if let Ok(n) = s.parse::<f64>() {
                    Ok(Value::Double(n))
                } else {
                    Ok(Value::Integer(0))
                }
            }
            Value::Integer(_) | Value::Double(_) => Ok(val),
            _ => Err(error!(TypeMismatch)),
        }
    }

    fn string(val: Value) -> Result<String> {
        match val {
            Value::String(s) => Ok(s),
            _ => Err(error!(TypeMismatch; "EXPECTED STRING")),
        }
    }

    fn count(val: Value) -> Result<usize> {
        let n = val.as_integer()?;
        if n < 0 {
            Err(error!(SubscriptOutOfRange))
        } else {
            Ok(n as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings() {
        let s = |v: &str| Value::from(v);
        assert_eq!(
            Function::call("LEFT$", vec![s("HELLO"), Value::Integer(2)], "").unwrap(),
            s("HE")
        );
        assert_eq!(
            Function::call("RIGHT$", vec![s("HELLO"), Value::Integer(3)], "").unwrap(),
            s("LLO")
        );
        assert_eq!(
            Function::call("MID$", vec![s("HELLO"), Value::Integer(2), Value::Integer(3)], "")
                .unwrap(),
            s("ELL")
        );
        assert_eq!(
            Function::call("MID$", vec![s("HELLO"), Value::Integer(4)], "").unwrap(),
            s("LO")
        );
        assert_eq!(
            Function::call("LEN", vec![s("HELLO")], "").unwrap(),
            Value::Integer(5)
        );
    }

    #[test]
    fn test_arity() {
        assert_eq!(
            Function::call("ABS", vec![], "").unwrap_err().code(),
            crate::lang::ErrorCode::ArgumentCount
        );
        assert_eq!(
            Function::call("NOPE", vec![], "").unwrap_err().code(),
            crate::lang::ErrorCode::UnknownFunction
        );
        assert_eq!(
            Function::call("THREAD$", vec![], "THREAD_1").unwrap(),
            Value::from("THREAD_1")
        );
    }
}
