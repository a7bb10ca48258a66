use super::{Column, Error, Token, TokenKind};

type Result<T> = std::result::Result<T, Error>;

pub fn lex(s: &str) -> Result<Vec<Token>> {
    BasicLexer::lex(s)
}

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

fn is_basic_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_basic_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const DOUBLE_SPECIALS: &[&str] = &["<>", "<=", ">="];
const SINGLE_SPECIALS: &str = "+-*/^=<>()[],;:#";

struct BasicLexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl BasicLexer {
    fn lex(s: &str) -> Result<Vec<Token>> {
        let mut lexer = BasicLexer {
            chars: s.chars().collect(),
            pos: 0,
            tokens: vec![],
        };
        while let Some(ch) = lexer.peek(0) {
            if is_basic_whitespace(ch) {
                lexer.pos += 1;
                continue;
            }
            if ch == '\'' {
                break;
            }
            let token = if is_basic_digit(ch) || (ch == '.' && lexer.peek(1).map_or(false, is_basic_digit))
            {
                lexer.number()
            } else if ch == '"' {
                lexer.string()?
            } else if is_basic_alphabetic(ch) || ch == '$' {
                lexer.alphabetic()
            } else {
                lexer.special()?
            };
            let is_rem = token.is("REM");
            lexer.tokens.push(token);
            if is_rem {
                break;
            }
        }
        Ok(lexer.tokens)
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn column_from(&self, start: usize) -> Column {
        start..self.pos
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        let mut s = String::new();
        let mut double = false;
        while let Some(ch) = self.peek(0) {
            if is_basic_digit(ch) {
                s.push(ch);
            } else if ch == '.' && !double {
                double = true;
                s.push(ch);
            } else {
                break;
            }
            self.pos += 1;
        }
        if let Some(e) = self.peek(0) {
            if e == 'E' || e == 'e' {
                let sign = self.peek(1).map_or(false, |c| c == '+' || c == '-');
                let digit_at = if sign { 2 } else { 1 };
                if self.peek(digit_at).map_or(false, is_basic_digit) {
                    double = true;
                    s.push('E');
                    self.pos += 1;
                    if sign {
                        s.push(self.chars[self.pos]);
                        self.pos += 1;
                    }
                    while let Some(ch) = self.peek(0) {
                        if !is_basic_digit(ch) {
                            break;
                        }
                        s.push(ch);
                        self.pos += 1;
                    }
                }
            }
        }
        if !double && s.parse::<i64>().is_err() {
            double = true;
        }
        let kind = if double {
            TokenKind::Double
        } else {
            TokenKind::Integer
        };
        Token::new(kind, &s, self.column_from(start))
    }

    fn string(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut s = String::new();
        self.pos += 1;
        loop {
            match self.peek(0) {
                None => {
                    let col = self.column_from(start);
                    return Err(error!(SyntaxError, ..&col; "UNTERMINATED STRING"));
                }
                Some('"') => {
                    self.pos += 1;
                    if self.peek(0) == Some('"') {
                        s.push('"');
                        self.pos += 1;
                        continue;
                    }
                    return Ok(Token::new(TokenKind::String, &s, self.column_from(start)));
                }
                Some(ch) => {
                    s.push(ch);
                    self.pos += 1;
                }
            }
        }
    }

    fn alphabetic(&mut self) -> Token {
        let start = self.pos;
        let mut s = String::new();
        if self.peek(0) == Some('$') {
            s.push('$');
            self.pos += 1;
        }
        while let Some(ch) = self.peek(0) {
            if is_basic_alphabetic(ch) || is_basic_digit(ch) {
                s.push(ch.to_ascii_uppercase());
                self.pos += 1;
            } else {
                break;
            }
        }
        if let Some(ch) = self.peek(0) {
            if ch == '$' || ch == '%' {
                s.push(ch);
                self.pos += 1;
            }
        }
        Token::new(TokenKind::Identifier, &s, self.column_from(start))
    }

    fn special(&mut self) -> Result<Token> {
        let start = self.pos;
        if let (Some(a), Some(b)) = (self.peek(0), self.peek(1)) {
            let pair: String = [a, b].iter().collect();
            if DOUBLE_SPECIALS.contains(&pair.as_str()) {
                self.pos += 2;
                return Ok(Token::new(TokenKind::Special, &pair, self.column_from(start)));
            }
        }
        match self.peek(0) {
            Some(ch) if SINGLE_SPECIALS.contains(ch) => {
                self.pos += 1;
                Ok(Token::new(
                    TokenKind::Special,
                    &ch.to_string(),
                    self.column_from(start),
                ))
            }
            _ => {
                self.pos += 1;
                let col = self.column_from(start);
                Err(error!(SyntaxError, ..&col; "UNKNOWN CHARACTER"))
            }
        }
    }
}
