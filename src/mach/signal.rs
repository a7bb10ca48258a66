use super::{Address, Value};
use crate::error;
use crate::lang::{Error, ErrorCode};

/// ## Signals
///
/// Runtime faults and `SIGNAL` statements travel up the executor as a
/// `Signal` until an `ON` handler claims them or the thread ends.

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    value: Option<Value>,
    error: Error,
}

impl Signal {
    pub fn from_error(error: Error) -> Signal {
        let name = match error.code() {
            ErrorCode::UserSignal => error.text().to_string(),
            code => code.signal().to_string(),
        };
        Signal {
            name,
            value: None,
            error,
        }
    }

    /// A `SIGNAL` statement. Names of built-in faults raise that fault.
    pub fn user(name: &str, value: Option<Value>) -> Signal {
        let error = match ErrorCode::from_signal(name) {
            Some(code) => match &value {
                Some(v) => Error::new(code).message(v.to_string()),
                None => Error::new(code),
            },
            None => match &value {
                Some(v) => error!(UserSignal; format!("{}({})", name, v)),
                None => error!(UserSignal; name),
            },
        };
        Signal {
            name: name.to_string(),
            value,
            error,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_error(self) -> Error {
        self.error
    }

    pub fn is_fatal(&self) -> bool {
        self.error.code().is_fatal()
    }

    /// What a handler sees in `$STATUS_ARG`.
    pub fn argument(&self) -> Value {
        match &self.value {
            Some(v) => v.clone(),
            None => Value::String(self.error.text().to_string()),
        }
    }

    /// `ERROR` catches every signal that is not fatal.
    pub fn matches(&self, handler: &str) -> bool {
        !self.is_fatal() && (handler == "ERROR" || handler == self.name)
    }

    pub(super) fn in_line(mut self, line: Option<crate::lang::LineNumber>) -> Signal {
        self.error = self.error.in_line_number(line);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStyle {
    /// Discard frames down to the handler's and jump.
    Goto,
    /// Push a frame so the handler can `RETURN` past the failing statement.
    Gosub,
}

/// An `ON <name> GOTO|GOSUB` registration, kept on the frame that ran it.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    pub name: String,
    pub style: HandlerStyle,
    pub target: Address,
}

/// What one instruction asks the dispatch loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    Branch(Address),
    Unwind(Signal),
    Halt,
}
