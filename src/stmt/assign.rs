use super::{expression, store, Compiler, Result};
use crate::lang::Cursor;
use crate::mach::{ByteCode, Opcode, ValueType};

pub(super) fn register(compiler: &Compiler) {
    compiler.register("LET", |_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode| {
        assignment(cursor, code)
    });
    for (keyword, op) in [
        ("LOCAL", Opcode::Store),
        ("GLOBAL", Opcode::StoreGlobal),
        ("PARENT", Opcode::StoreParent),
        ("COMMON", Opcode::StoreCommon),
        ("CONSTANT", Opcode::StoreConstant),
    ] {
        compiler.register(
            keyword,
            move |_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode| {
                declaration(cursor, code, op)
            },
        );
    }
}

/// `[LET] name = expression`
pub(super) fn assignment(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let var = cursor.expect_identifier()?.spelling;
    cursor.expect("=")?;
    expression(cursor, code)?;
    cursor.expect_end()?;
    store(code, Opcode::Store, &var);
    Ok(())
}

/// `LOCAL a [= expr], b …` and friends. A name without a value gets the
/// empty value of its type.
fn declaration(cursor: &mut Cursor, code: &mut ByteCode, op: Opcode) -> Result<()> {
    loop {
        let var = cursor.expect_identifier()?.spelling;
        if cursor.assume_next_token("=") {
            expression(cursor, code)?;
        } else {
            match ValueType::for_name(&var) {
                Some(ValueType::String) => code.emit_str(Opcode::String, ""),
                _ => code.emit_int(Opcode::Integer, 0),
            };
        }
        store(code, op, &var);
        if cursor.end_of_statement() {
            return Ok(());
        }
        cursor.expect(",")?;
    }
}
