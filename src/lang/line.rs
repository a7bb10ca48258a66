use super::{lex, Error, LineNumber, Token, TokenKind};

type Result<T> = std::result::Result<T, Error>;

/// ## A line of source
///
/// An optional line number, an optional `LABEL:` prefix and the tokens
/// of one statement. Columns in the tokens index into `text`.

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    number: Option<LineNumber>,
    label: Option<String>,
    text: String,
    tokens: Vec<Token>,
}

impl Line {
    pub fn new(s: &str) -> Result<Line> {
        let s = s.trim();
        let mut number = None;
        let mut rest = s;
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            match digits.parse::<LineNumber>() {
                Ok(n) => number = Some(n),
                Err(_) => return Err(error!(Overflow; "INVALID LINE NUMBER")),
            }
            rest = s[digits.len()..].trim_start();
        }
        let mut tokens = lex(rest).map_err(|e| e.in_line_number(number))?;
        let mut label = None;
        if tokens.len() >= 2
            && tokens[0].kind == TokenKind::Identifier
            && !tokens[0].spelling.starts_with('$')
            && tokens[1].is(":")
        {
            let offset = tokens[1].column.end;
            label = Some(tokens[0].spelling.clone());
            rest = rest[byte_offset(rest, offset)..].trim_start();
            tokens = lex(rest).map_err(|e| e.in_line_number(number))?;
        }
        Ok(Line {
            number,
            label,
            text: rest.to_string(),
            tokens,
        })
    }

    pub fn number(&self) -> Option<LineNumber> {
        self.number
    }

    pub fn with_number(mut self, number: LineNumber) -> Line {
        self.number = Some(number);
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(number) = self.number {
            write!(f, "{} ", number)?;
        }
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(f, "{}", self.text)
    }
}
