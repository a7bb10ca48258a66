use super::{expression, name, Compiler, Result};
use crate::lang::Cursor;
use crate::mach::{ByteCode, Opcode};

pub(super) fn register(compiler: &Compiler) {
    compiler.register("LOCK", lock_statement);
    compiler.register("UNLOCK", unlock_statement);
    compiler.register("SLEEP", sleep_statement);
    compiler.register("KILL", kill_statement);
    compiler.register("CLEAR", clear_statement);
}

fn lock_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let lock = name(cursor)?;
    cursor.expect_end()?;
    code.emit_str(Opcode::Lock, lock);
    Ok(())
}

fn unlock_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let lock = name(cursor)?;
    cursor.expect_end()?;
    code.emit_str(Opcode::Unlock, lock);
    Ok(())
}

fn sleep_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    expression(cursor, code)?;
    cursor.expect_end()?;
    code.emit_op(Opcode::Sleep);
    Ok(())
}

/// `KILL THREAD id`
fn kill_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect("THREAD")?;
    expression(cursor, code)?;
    cursor.expect_end()?;
    code.emit_op(Opcode::KillThread);
    Ok(())
}

/// `CLEAR THREADS`
fn clear_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect("THREADS")?;
    cursor.expect_end()?;
    code.emit_op(Opcode::ClearThreads);
    Ok(())
}
