use super::{expression, store, Compiler, Result};
use crate::lang::Cursor;
use crate::mach::{ByteCode, Opcode};

// Openers and closers are emitted unresolved; the linker pairs them.

pub(super) fn register(compiler: &Compiler) {
    compiler.register("DO", do_statement);
    compiler.register("LOOP", loop_statement);
    compiler.register("WHILE", while_statement);
    compiler.register("WEND", wend_statement);
    compiler.register("FOR", for_statement);
    compiler.register("NEXT", next_statement);
    compiler.register("CONTINUE", continue_statement);
}

/// Optional `WHILE cond` or `UNTIL cond` that leaves the loop.
fn exit_condition(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    if cursor.assume_next_token("WHILE") {
        expression(cursor, code)?;
        code.emit_op(Opcode::ExitFalse);
    } else if cursor.assume_next_token("UNTIL") {
        expression(cursor, code)?;
        code.emit_op(Opcode::ExitTrue);
    }
    cursor.expect_end()
}

fn do_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    code.emit_op(Opcode::Do);
    exit_condition(cursor, code)
}

fn loop_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    exit_condition(cursor, code)?;
    code.emit_op(Opcode::Loop);
    Ok(())
}

fn while_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    code.emit_op(Opcode::Do);
    expression(cursor, code)?;
    cursor.expect_end()?;
    code.emit_op(Opcode::ExitFalse);
    Ok(())
}

fn wend_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect_end()?;
    code.emit_op(Opcode::Loop);
    Ok(())
}

/// `FOR v = a TO b [STEP s]` or `FOR EACH v IN expr`
fn for_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    if cursor.assume_next_token("EACH") {
        let var = cursor.expect_identifier()?.spelling;
        cursor.expect("IN")?;
        expression(cursor, code)?;
        cursor.expect_end()?;
        code.emit_str(Opcode::ForEach, var);
        return Ok(());
    }
    let var = cursor.expect_identifier()?.spelling;
    cursor.expect("=")?;
    expression(cursor, code)?;
    store(code, Opcode::Store, &var);
    cursor.expect("TO")?;
    expression(cursor, code)?;
    if cursor.assume_next_token("STEP") {
        expression(cursor, code)?;
    } else {
        code.emit_int(Opcode::Integer, 1);
    }
    cursor.expect_end()?;
    code.emit_str(Opcode::For, var);
    Ok(())
}

fn next_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    if cursor.end_of_statement() {
        code.emit_op(Opcode::Next);
        return Ok(());
    }
    let var = cursor.expect_identifier()?.spelling;
    cursor.expect_end()?;
    code.emit_str(Opcode::Next, var);
    Ok(())
}

/// `CONTINUE LOOP`
fn continue_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect("LOOP")?;
    cursor.expect_end()?;
    code.emit_op(Opcode::ContinueLoop);
    Ok(())
}
