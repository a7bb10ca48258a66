use super::{expression, store, Compiler, Result};
use crate::lang::{Cursor, TokenKind};
use crate::mach::{ByteCode, FileMode, Opcode, ValueType};

pub(super) fn register(compiler: &Compiler) {
    compiler.register("PRINT", print_statement);
    compiler.register("INPUT", input_statement);
    compiler.register("LINE", line_input_statement);
    compiler.register("OPEN", open_statement);
    compiler.register("CLOSE", close_statement);
}

/// `#handle` as an expression.
fn handle(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect("#")?;
    expression(cursor, code)
}

/// `PRINT [#h,] items`. `;` joins items, `,` separates them with a tab,
/// and a trailing separator suppresses the newline.
fn print_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let to_file = cursor.peek(0).is("#");
    if to_file {
        handle(cursor, code)?;
        if !cursor.end_of_statement() {
            cursor.expect(",")?;
        }
    }
    let mut count = 0;
    let mut newline = true;
    while !cursor.end_of_statement() {
        if cursor.assume_next_token(";") {
            newline = false;
            continue;
        }
        if cursor.assume_next_token(",") {
            code.emit_str(Opcode::String, "\t");
            count += 1;
            newline = false;
            continue;
        }
        expression(cursor, code)?;
        count += 1;
        newline = true;
    }
    if newline {
        code.emit_str(Opcode::String, "\n");
        count += 1;
    }
    let op = if to_file {
        Opcode::PrintFile
    } else {
        Opcode::Print
    };
    code.emit_int(op, count);
    Ok(())
}

fn input_code(var: &str) -> i64 {
    match ValueType::for_name(var) {
        Some(t) => t.code(),
        None => 0,
    }
}

/// `INPUT ["prompt" ;|,] var [, var …]`
fn input_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let mut prompt = "? ".to_string();
    if cursor.test_next_token(TokenKind::String) {
        prompt = cursor.next_token().spelling;
        if !cursor.assume_next_token(";") {
            cursor.expect(",")?;
        }
    }
    loop {
        let var = cursor.expect_identifier()?.spelling;
        code.emit_str(Opcode::String, prompt.as_str());
        code.emit_int(Opcode::Input, input_code(&var));
        store(code, Opcode::Store, &var);
        if cursor.end_of_statement() {
            return Ok(());
        }
        cursor.expect(",")?;
        prompt = "? ".to_string();
    }
}

/// `LINE INPUT #h, var` reads a file; `LINE INPUT var` reads the console.
fn line_input_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect("INPUT")?;
    if cursor.peek(0).is("#") {
        handle(cursor, code)?;
        cursor.expect(",")?;
        let var = cursor.expect_identifier()?.spelling;
        cursor.expect_end()?;
        code.emit_op(Opcode::ReadLine);
        store(code, Opcode::Store, &var);
        return Ok(());
    }
    let var = cursor.expect_identifier()?.spelling;
    cursor.expect_end()?;
    code.emit_str(Opcode::String, "");
    code.emit_int(Opcode::Input, ValueType::String.code());
    store(code, Opcode::Store, &var);
    Ok(())
}

/// `OPEN path FOR INPUT|OUTPUT|APPEND AS #h`
fn open_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    expression(cursor, code)?;
    cursor.expect("FOR")?;
    let mode = if cursor.assume_next_token("INPUT") {
        FileMode::Input
    } else if cursor.assume_next_token("OUTPUT") {
        FileMode::Output
    } else if cursor.assume_next_token("APPEND") {
        FileMode::Append
    } else {
        return Err(cursor.unexpected("EXPECTED INPUT, OUTPUT OR APPEND"));
    };
    cursor.expect("AS")?;
    handle(cursor, code)?;
    cursor.expect_end()?;
    code.emit_int(Opcode::OpenFile, mode.code());
    Ok(())
}

fn close_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    handle(cursor, code)?;
    cursor.expect_end()?;
    code.emit_op(Opcode::CloseFile);
    Ok(())
}
