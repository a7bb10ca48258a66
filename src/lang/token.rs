use super::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Double,
    String,
    Special,
    End,
}

/// Words that terminate an expression or are claimed by a statement
/// grammar. They never compile as variable references.
const RESERVED: &[&str] = &[
    "AND", "AS", "ELSE", "EACH", "FALSE", "FOR", "GOSUB", "GOTO", "IN", "MOD", "NOT", "OR",
    "RETURNS", "STEP", "THEN", "THREAD", "TO", "TRUE", "UNTIL", "WHILE",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub column: Column,
}

impl Token {
    pub fn new(kind: TokenKind, spelling: &str, column: Column) -> Token {
        Token {
            kind,
            spelling: spelling.to_string(),
            column,
        }
    }

    pub fn end(at: usize) -> Token {
        Token::new(TokenKind::End, "", at..at)
    }

    /// Matches keywords and specials by spelling. String literals never
    /// match, so `PRINT "THEN"` stays a string.
    pub fn is(&self, lit: &str) -> bool {
        match self.kind {
            TokenKind::Identifier | TokenKind::Special => self.spelling == lit,
            _ => false,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.kind == TokenKind::Identifier && RESERVED.contains(&self.spelling.as_str())
    }

    pub fn integer(&self) -> Option<i64> {
        match self.kind {
            TokenKind::Integer => self.spelling.parse().ok(),
            _ => None,
        }
    }

    pub fn double(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Integer | TokenKind::Double => self.spelling.parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "\"{}\"", self.spelling.replace('"', "\"\"")),
            TokenKind::End => write!(f, "end of statement"),
            _ => write!(f, "{}", self.spelling),
        }
    }
}
