/*!
## Rust Statement Module

This Rust module compiles BASIC statements into unlinked bytecode
fragments. Each verb is a `StatementCompiler` held in a registry that is
filled at startup; further verbs can be registered by the host.

*/

use crate::error;
use crate::lang::{Cursor, Error, Line, Token, TokenKind};
use crate::mach::{ByteCode, Opcode, Optimizer, ProgramKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

mod assign;
mod expr;
mod flow;
mod io;
mod loops;
mod program;
mod thread;

pub use expr::expression;

type Result<T> = std::result::Result<T, Error>;

/// Compiles one statement whose keyword has already been consumed.
pub trait StatementCompiler: Send + Sync {
    fn compile(&self, compiler: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()>;
}

impl<F> StatementCompiler for F
where
    F: Fn(&Compiler, &mut Cursor, &mut ByteCode) -> Result<()> + Send + Sync,
{
    fn compile(&self, compiler: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
        self(compiler, cursor, code)
    }
}

/// What a `PROGRAM`, `FUNCTION`, `VERB` or `TEST` line declares.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub kind: ProgramKind,
    pub name: String,
    pub params: Vec<String>,
}

/// ## Statement compiler registry

pub struct Compiler {
    optimize: bool,
    verbs: RwLock<HashMap<String, Arc<dyn StatementCompiler>>>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut verbs: Vec<String> = self.verbs.read().keys().cloned().collect();
        verbs.sort();
        write!(f, "Compiler {:?}", verbs)
    }
}

impl Compiler {
    pub fn new(optimize: bool) -> Compiler {
        let compiler = Compiler {
            optimize,
            verbs: RwLock::new(HashMap::new()),
        };
        assign::register(&compiler);
        flow::register(&compiler);
        io::register(&compiler);
        loops::register(&compiler);
        program::register(&compiler);
        thread::register(&compiler);
        compiler
    }

    /// Add or replace the compiler for statements starting with `keyword`.
    pub fn register<C>(&self, keyword: &str, compiler: C)
    where
        C: StatementCompiler + 'static,
    {
        self.verbs
            .write()
            .insert(keyword.to_ascii_uppercase(), Arc::new(compiler));
    }

    pub fn is_verb(&self, keyword: &str) -> bool {
        self.verbs.read().contains_key(keyword)
    }

    fn verb(&self, keyword: &str) -> Option<Arc<dyn StatementCompiler>> {
        self.verbs.read().get(keyword).cloned()
    }

    /// Compile every statement on a line into one fragment. Nothing is
    /// produced if any statement fails.
    pub fn compile_line(&self, line: &Line) -> Result<ByteCode> {
        let mut code = ByteCode::new(line.number());
        self.compile_tokens(line.tokens(), &mut code)
            .map_err(|e| e.in_line_number(line.number()))?;
        if self.optimize {
            Optimizer::optimize(&mut code);
        }
        Ok(code)
    }

    /// Compile `:` separated statements. An `IF` takes the rest of the
    /// tokens as its branches.
    pub fn compile_tokens(&self, tokens: &[Token], code: &mut ByteCode) -> Result<()> {
        let mut start = 0;
        while start < tokens.len() {
            let end = if tokens[start].is("IF") {
                tokens.len()
            } else {
                tokens[start..]
                    .iter()
                    .position(|t| t.is(":"))
                    .map_or(tokens.len(), |p| start + p)
            };
            if end > start {
                let mut cursor = Cursor::new(tokens[start..end].to_vec());
                self.compile_statement(&mut cursor, code)?;
            }
            start = end + 1;
        }
        Ok(())
    }

    /// Compile a single statement. An identifier that is not a verb is
    /// an assignment when `=` follows and a call of a `VERB` program
    /// otherwise.
    pub fn compile_statement(&self, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
        let token = cursor.peek(0).clone();
        if token.kind != TokenKind::Identifier {
            return Err(cursor.unexpected("EXPECTED STATEMENT"));
        }
        if let Some(verb) = self.verb(&token.spelling) {
            cursor.next_token();
            return verb.compile(self, cursor, code);
        }
        if cursor.peek(1).is("=") {
            return assign::assignment(cursor, code);
        }
        program::verb_call(cursor, code)
    }

    /// The header declared by `line`, if it is a header line.
    pub fn parse_header(line: &Line) -> Result<Option<Header>> {
        let mut cursor = Cursor::new(line.tokens().to_vec());
        let kind = match ProgramKind::from_keyword(&cursor.peek(0).spelling) {
            Some(kind)
                if cursor.test_next_token(TokenKind::Identifier)
                    && cursor.peek(1).kind == TokenKind::Identifier =>
            {
                kind
            }
            _ => return Ok(None),
        };
        cursor.next_token();
        program::header(kind, &mut cursor)
            .map(Some)
            .map_err(|e| e.in_line_number(line.number()))
    }
}

/// A `GOTO` style target: a line number or a label.
fn target(cursor: &mut Cursor) -> Result<String> {
    let token = cursor.peek(0).clone();
    match token.kind {
        TokenKind::Integer => {
            cursor.next_token();
            match token.integer() {
                Some(n) if n >= 0 => Ok(n.to_string()),
                _ => Err(error!(SyntaxError, ..&token.column; "INVALID LINE NUMBER")),
            }
        }
        TokenKind::Identifier if !token.is_reserved() => {
            cursor.next_token();
            Ok(token.spelling)
        }
        _ => Err(cursor.unexpected("EXPECTED LINE NUMBER OR LABEL")),
    }
}

/// A lock or program name, written bare or quoted.
fn name(cursor: &mut Cursor) -> Result<String> {
    if cursor.test_next_token(TokenKind::String) {
        return Ok(cursor.next_token().spelling.to_ascii_uppercase());
    }
    Ok(cursor.expect_identifier()?.spelling)
}

/// Store the top of the stack in `var`, converting for typed names.
fn store(code: &mut ByteCode, op: Opcode, var: &str) {
    if let Some(t) = crate::mach::ValueType::for_name(var) {
        code.emit_int(Opcode::Convert, t.code());
    }
    code.emit_str(op, var);
}

#[cfg(test)]
mod tests;
