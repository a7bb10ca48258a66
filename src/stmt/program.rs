use super::{expression, name, store, Compiler, Header, Result};
use crate::lang::Cursor;
use crate::mach::{ByteCode, Instruction, Opcode, ProgramKind};

pub(super) fn register(compiler: &Compiler) {
    compiler.register("CALL", call_statement);
    compiler.register("EXECUTE", execute_statement);
    compiler.register("CHAIN", chain_statement);
    compiler.register("REM", rem_statement);
    for kind in [
        ProgramKind::Program,
        ProgramKind::Function,
        ProgramKind::Verb,
        ProgramKind::Test,
    ] {
        compiler.register(
            kind.keyword(),
            move |_: &Compiler, cursor: &mut Cursor, _: &mut ByteCode| {
                header(kind, cursor).map(|_| ())
            },
        );
    }
}

/// The rest of a header line after its keyword: `name [(param, …)]`.
pub(super) fn header(kind: ProgramKind, cursor: &mut Cursor) -> Result<Header> {
    let name = cursor.expect_identifier()?.spelling;
    let mut params = vec![];
    if cursor.assume_next_token("(") && !cursor.assume_next_token(")") {
        loop {
            params.push(cursor.expect_identifier()?.spelling);
            if cursor.assume_next_token(")") {
                break;
            }
            cursor.expect(",")?;
        }
    }
    cursor.expect_end()?;
    Ok(Header { kind, name, params })
}

fn arguments(cursor: &mut Cursor, code: &mut ByteCode) -> Result<i64> {
    let mut argc = 0;
    if !cursor.assume_next_token("(") || cursor.assume_next_token(")") {
        return Ok(argc);
    }
    loop {
        expression(cursor, code)?;
        argc += 1;
        if cursor.assume_next_token(")") {
            return Ok(argc);
        }
        cursor.expect(",")?;
    }
}

/// `AS THREAD [var]` stores the thread id, or drops it.
fn as_thread(cursor: &mut Cursor) -> Result<Option<Option<String>>> {
    if !cursor.assume_next_token("AS") {
        return Ok(None);
    }
    cursor.expect("THREAD")?;
    if cursor.end_of_statement() {
        return Ok(Some(None));
    }
    Ok(Some(Some(cursor.expect_identifier()?.spelling)))
}

fn store_or_drop(code: &mut ByteCode, var: Option<String>) {
    match var {
        Some(var) => store(code, Opcode::Store, &var),
        None => {
            code.emit_op(Opcode::Drop);
        }
    }
}

/// `CALL name[(args)] [RETURNS var | AS THREAD [var]]`
fn call_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let program = name(cursor)?;
    let argc = arguments(cursor, code)?;
    if cursor.assume_next_token("RETURNS") {
        let var = cursor.expect_identifier()?.spelling;
        cursor.expect_end()?;
        code.emit(Instruction::new(Opcode::CallValue).with_str(program).with_int(argc));
        store(code, Opcode::Store, &var);
        return Ok(());
    }
    let thread = as_thread(cursor)?;
    cursor.expect_end()?;
    match thread {
        Some(var) => {
            code.emit(Instruction::new(Opcode::CallThread).with_str(program).with_int(argc));
            store_or_drop(code, var);
        }
        None => {
            code.emit(Instruction::new(Opcode::Call).with_str(program).with_int(argc));
        }
    }
    Ok(())
}

/// `EXECUTE text [AS THREAD [var]]`
fn execute_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    expression(cursor, code)?;
    let thread = as_thread(cursor)?;
    cursor.expect_end()?;
    match thread {
        Some(var) => {
            code.emit_op(Opcode::ExecuteThread);
            store_or_drop(code, var);
        }
        None => {
            code.emit_op(Opcode::Execute);
        }
    }
    Ok(())
}

fn rem_statement(_: &Compiler, _: &mut Cursor, _: &mut ByteCode) -> Result<()> {
    Ok(())
}

fn chain_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let program = name(cursor)?;
    cursor.expect_end()?;
    code.emit_str(Opcode::Chain, program);
    Ok(())
}

/// `NAME arg, arg …` runs the `VERB` program of that name.
pub(super) fn verb_call(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let verb = cursor.expect_identifier()?.spelling;
    let mut argc = 0;
    while !cursor.end_of_statement() {
        if argc > 0 {
            cursor.expect(",")?;
        }
        expression(cursor, code)?;
        argc += 1;
    }
    code.emit(
        Instruction::new(Opcode::Call)
            .with_str(format!("{}{}", ProgramKind::Verb.prefix(), verb))
            .with_int(argc),
    );
    Ok(())
}
