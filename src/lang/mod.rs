/*!
# Rust Language Module

This Rust module provides lexical analysis of the BASIC language and the
token cursor that statement compilers pull from.

*/

pub type LineNumber = u32;
pub type Column = std::ops::Range<usize>;

#[macro_use]
mod error;
mod cursor;
mod lex;
mod line;
mod token;

pub use cursor::Cursor;
pub use error::Error;
pub use error::ErrorCode;
pub use lex::lex;
pub use line::Line;
pub use token::{Token, TokenKind};

#[cfg(test)]
mod tests;
