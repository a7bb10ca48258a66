use super::*;
use crate::lang::{ErrorCode, Line};
use crate::stmt::Compiler;

mod bytecode_test;
mod link_test;
mod symbols_test;

/// A program with one statement per source line.
fn program(lines: &[&str]) -> Program {
    let compiler = Compiler::new(false);
    let mut program = Program::new("T", ProgramKind::Program);
    for s in lines {
        let line = Line::new(s).unwrap();
        let code = compiler.compile_line(&line).unwrap();
        program.store(Statement::new(line, code)).unwrap();
    }
    program
}

fn link_error(lines: &[&str]) -> ErrorCode {
    Linker::new(false)
        .link(&mut program(lines), false)
        .unwrap_err()
        .code()
}
