use super::{Column, LineNumber};

/// ## Diagnostic status
///
/// Every compile, link and runtime failure is reported as an `Error`.
/// The code decides how the failure is classified and which signal name
/// it raises inside a running program.

#[derive(Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    line_number: Option<LineNumber>,
    column: Column,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line_number: None,
            column: 0..0,
            message: String::new(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line_number(&self) -> Option<LineNumber> {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    pub fn text(&self) -> &str {
        &self.message
    }

    /// Attach a line number unless one is already known.
    pub fn in_line_number(mut self, line: Option<LineNumber>) -> Error {
        if self.line_number.is_none() {
            self.line_number = line;
        }
        self
    }

    /// Attach a column unless one is already known.
    pub fn in_column(mut self, column: &Column) -> Error {
        if self.column == (0..0) {
            self.column = column.clone();
        }
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Error {
        self.message = message.into();
        self
    }

    /// Compile and link errors are reported against the statement text
    /// with a caret run underneath the failing columns.
    pub fn pointer(&self, source: &str) -> String {
        let mut s = String::from(source);
        s.push('\n');
        let width = source.chars().count();
        let start = self.column.start.min(width);
        let end = self.column.end.max(start + 1);
        s.push_str(&" ".repeat(start));
        s.push_str(&"^".repeat(end - start));
        s
    }
}

/// Error classes. The display text is what a user sees; `signal()` is
/// the name a running program can catch with `ON <name> GOTO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorCode {
    #[error("SYNTAX ERROR")]
    SyntaxError,
    #[error("UNDEFINED LABEL")]
    UndefinedLabel,
    #[error("DUPLICATE LABEL")]
    DuplicateLabel,
    #[error("LOOP MISMATCH")]
    LoopMismatch,
    #[error("UNBALANCED LOOP")]
    UnbalancedLoop,
    #[error("NO ACTIVE LOOP")]
    NoActiveLoop,
    #[error("TYPE MISMATCH")]
    TypeMismatch,
    #[error("UNKNOWN VARIABLE")]
    UnknownVariable,
    #[error("UNKNOWN PROGRAM")]
    UnknownProgram,
    #[error("UNKNOWN FUNCTION")]
    UnknownFunction,
    #[error("WRONG NUMBER OF ARGUMENTS")]
    ArgumentCount,
    #[error("DIVISION BY ZERO")]
    DivisionByZero,
    #[error("OVERFLOW")]
    Overflow,
    #[error("SUBSCRIPT OUT OF RANGE")]
    SubscriptOutOfRange,
    #[error("READ-ONLY VARIABLE")]
    ReadOnly,
    #[error("NO RETURN VALUE")]
    NoReturnValue,
    #[error("PROGRAM IS ACTIVE")]
    ProgramActive,
    #[error("STACK UNDERFLOW")]
    StackUnderflow,
    #[error("OUT OF MEMORY")]
    OutOfMemory,
    #[error("BAD FILE NUMBER")]
    BadFileNumber,
    #[error("FILE ALREADY OPEN")]
    FileAlreadyOpen,
    #[error("FILE ERROR")]
    FileError,
    #[error("INPUT PAST END")]
    EndOfFile,
    #[error("LOCK NOT HELD")]
    LockNotHeld,
    #[error("UNKNOWN THREAD")]
    UnknownThread,
    #[error("THREAD ABORTED")]
    Aborted,
    #[error("SIGNAL")]
    UserSignal,
    #[error("INTERNAL ERROR")]
    InternalError,
}

impl ErrorCode {
    const ALL: [ErrorCode; 28] = [
        ErrorCode::SyntaxError,
        ErrorCode::UndefinedLabel,
        ErrorCode::DuplicateLabel,
        ErrorCode::LoopMismatch,
        ErrorCode::UnbalancedLoop,
        ErrorCode::NoActiveLoop,
        ErrorCode::TypeMismatch,
        ErrorCode::UnknownVariable,
        ErrorCode::UnknownProgram,
        ErrorCode::UnknownFunction,
        ErrorCode::ArgumentCount,
        ErrorCode::DivisionByZero,
        ErrorCode::Overflow,
        ErrorCode::SubscriptOutOfRange,
        ErrorCode::ReadOnly,
        ErrorCode::NoReturnValue,
        ErrorCode::ProgramActive,
        ErrorCode::StackUnderflow,
        ErrorCode::OutOfMemory,
        ErrorCode::BadFileNumber,
        ErrorCode::FileAlreadyOpen,
        ErrorCode::FileError,
        ErrorCode::EndOfFile,
        ErrorCode::LockNotHeld,
        ErrorCode::UnknownThread,
        ErrorCode::Aborted,
        ErrorCode::UserSignal,
        ErrorCode::InternalError,
    ];

    pub fn signal(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            SyntaxError => "SYNTAX",
            UndefinedLabel => "NOLABEL",
            DuplicateLabel => "DUPLABEL",
            LoopMismatch => "LOOPMISMATCH",
            UnbalancedLoop => "UNBALANCED",
            NoActiveLoop => "NOLOOP",
            TypeMismatch => "TYPEMISMATCH",
            UnknownVariable => "UNKVAR",
            UnknownProgram => "UNKPGM",
            UnknownFunction => "UNKFUNC",
            ArgumentCount => "ARGNUM",
            DivisionByZero => "DIVZERO",
            Overflow => "OVERFLOW",
            SubscriptOutOfRange => "SUBSCRIPT",
            ReadOnly => "READONLY",
            NoReturnValue => "EXPRETVAL",
            ProgramActive => "PGMACTIVE",
            StackUnderflow => "STACK",
            OutOfMemory => "NOMEMORY",
            BadFileNumber => "BADFILE",
            FileAlreadyOpen => "FILEOPEN",
            FileError => "FILE",
            EndOfFile => "EOF",
            LockNotHeld => "LOCKNOTHELD",
            UnknownThread => "UNKTHREAD",
            Aborted => "*ABORT",
            UserSignal => "SIGNAL",
            InternalError => "*INTERNAL",
        }
    }

    pub fn from_signal(name: &str) -> Option<ErrorCode> {
        ErrorCode::ALL
            .iter()
            .find(|code| **code != ErrorCode::UserSignal && code.signal() == name)
            .copied()
    }

    /// Fatal codes terminate the thread without consulting handlers.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorCode::InternalError | ErrorCode::Aborted | ErrorCode::NoActiveLoop
        )
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" IN {}", line_number));
        }
        if (0..0) != self.column {
            suffix.push_str(&format!(" ({}..{})", self.column.start, self.column.end));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        write!(f, "{}{}", self.code, suffix)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = error!(TypeMismatch, Some(100), ..&(4..7); "EXPECTED NUMBER");
        assert_eq!(e.to_string(), "TYPE MISMATCH IN 100 (4..7); EXPECTED NUMBER");
        assert_eq!(error!(DivisionByZero).to_string(), "DIVISION BY ZERO");
    }

    #[test]
    fn test_signal_names_round_trip() {
        for code in ErrorCode::ALL.iter() {
            if *code == ErrorCode::UserSignal {
                continue;
            }
            assert_eq!(ErrorCode::from_signal(code.signal()), Some(*code));
        }
        assert_eq!(ErrorCode::from_signal("FOO"), None);
    }

    #[test]
    fn test_pointer() {
        let e = error!(SyntaxError, ..&(4..6));
        assert_eq!(e.pointer("LET X = "), "LET X = \n    ^^");
    }
}
