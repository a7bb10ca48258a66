use super::*;
use crate::lang::ErrorCode;

mod compile_test;

fn compile(s: &str, optimize: bool) -> Result<ByteCode> {
    let line = Line::new(s)?;
    Compiler::new(optimize).compile_line(&line)
}

/// Opcode names with their operands, one string per instruction.
fn listing(s: &str, optimize: bool) -> Vec<String> {
    compile(s, optimize)
        .unwrap()
        .iter()
        .map(|i| i.to_string())
        .collect()
}

fn error_code(s: &str) -> ErrorCode {
    compile(s, false).unwrap_err().code()
}
