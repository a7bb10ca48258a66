use super::{Column, Error, Token, TokenKind};

type Result<T> = std::result::Result<T, Error>;

/// ## Pull-based token cursor
///
/// Statement compilers consume tokens one at a time and may save and
/// restore the position to parse speculatively.

#[derive(Debug, Clone)]
pub struct Cursor {
    tokens: Vec<Token>,
    position: usize,
    end: Token,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Cursor {
        let at = tokens.last().map_or(0, |t| t.column.end);
        Cursor {
            tokens,
            position: 0,
            end: Token::end(at),
        }
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.peek(0).clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    pub fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.position + n).unwrap_or(&self.end)
    }

    /// Consumes the next token only if it is the keyword or special `lit`.
    pub fn assume_next_token(&mut self, lit: &str) -> bool {
        if self.peek(0).is(lit) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    pub fn test_next_token(&self, kind: TokenKind) -> bool {
        self.peek(0).kind == kind
    }

    pub fn expect(&mut self, lit: &str) -> Result<()> {
        if self.assume_next_token(lit) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("EXPECTED {}", lit)))
        }
    }

    /// A non-reserved identifier, as used for variable and program names.
    pub fn expect_identifier(&mut self) -> Result<Token> {
        let token = self.peek(0);
        if token.kind == TokenKind::Identifier && !token.is_reserved() {
            Ok(self.next_token())
        } else {
            Err(self.unexpected("EXPECTED NAME"))
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.tokens.len());
    }

    pub fn end_of_statement(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn expect_end(&self) -> Result<()> {
        if self.end_of_statement() {
            Ok(())
        } else {
            Err(self.unexpected("UNEXPECTED TEXT"))
        }
    }

    pub fn column(&self) -> Column {
        self.peek(0).column.clone()
    }

    /// Column range spanning from the token at `position` to the last
    /// consumed token.
    pub fn column_since(&self, position: usize) -> Column {
        let start = self
            .tokens
            .get(position)
            .map_or(self.end.column.start, |t| t.column.start);
        let end = match self.position {
            0 => start,
            p => self.tokens[p - 1].column.end,
        };
        start..end.max(start)
    }

    pub fn unexpected(&self, msg: &str) -> Error {
        error!(SyntaxError, ..&self.column(); msg)
    }
}
