use super::{expression, target, Compiler, Result};
use crate::lang::{Cursor, Token, TokenKind};
use crate::mach::{ByteCode, Instruction, Opcode};

pub(super) fn register(compiler: &Compiler) {
    compiler.register("IF", if_statement);
    compiler.register("GOTO", goto_statement);
    compiler.register("GOSUB", gosub_statement);
    compiler.register("RETURN", return_statement);
    compiler.register("END", end_statement);
    compiler.register("STOP", stop_statement);
    compiler.register("ON", on_statement);
    compiler.register("SIGNAL", signal_statement);
}

fn rest(cursor: &mut Cursor) -> Vec<Token> {
    let mut tokens = vec![];
    while !cursor.end_of_statement() {
        tokens.push(cursor.next_token());
    }
    tokens
}

/// Index of the `ELSE` that belongs to this `IF`. Each nested `IF`
/// claims the first unclaimed `ELSE` after it.
fn find_else(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0;
    for (i, t) in tokens.iter().enumerate() {
        if t.is("IF") {
            depth += 1;
        } else if t.is("ELSE") {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

/// `THEN 100` and `ELSE DONE` are jumps, not statements.
fn jump_target(compiler: &Compiler, tokens: &[Token]) -> Option<String> {
    match tokens {
        [t] if t.kind == TokenKind::Integer => Some(t.spelling.clone()),
        [t] if t.kind == TokenKind::Identifier
            && !t.is_reserved()
            && !compiler.is_verb(&t.spelling) =>
        {
            Some(t.spelling.clone())
        }
        _ => None,
    }
}

/// `IF cond THEN (stmts | target) [ELSE (stmts | target)]`
fn if_statement(compiler: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    expression(cursor, code)?;
    cursor.expect("THEN")?;
    let tokens = rest(cursor);
    if tokens.is_empty() {
        return Err(cursor.unexpected("EXPECTED STATEMENT"));
    }
    let (then_part, else_part) = match find_else(&tokens) {
        Some(i) => (&tokens[..i], Some(&tokens[i + 1..])),
        None => (&tokens[..], None),
    };
    if let Some(label) = jump_target(compiler, then_part) {
        code.emit_label(Opcode::BranchTrue, label);
        if let Some(else_part) = else_part {
            compile_branch(compiler, else_part, code)?;
        }
        return Ok(());
    }
    let skip = code.emit_forward(Opcode::BranchFalse);
    compiler.compile_tokens(then_part, code)?;
    match else_part {
        Some(else_part) => {
            let done = code.emit_forward(Opcode::Branch);
            code.patch(skip, code.len())?;
            compile_branch(compiler, else_part, code)?;
            code.patch(done, code.len())?;
        }
        None => code.patch(skip, code.len())?,
    }
    Ok(())
}

fn compile_branch(compiler: &Compiler, tokens: &[Token], code: &mut ByteCode) -> Result<()> {
    match jump_target(compiler, tokens) {
        Some(label) => {
            code.emit_label(Opcode::Branch, label);
            Ok(())
        }
        None => compiler.compile_tokens(tokens, code),
    }
}

fn goto_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let label = target(cursor)?;
    cursor.expect_end()?;
    code.emit_label(Opcode::Branch, label);
    Ok(())
}

fn gosub_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let label = target(cursor)?;
    cursor.expect_end()?;
    code.emit_label(Opcode::Gosub, label);
    Ok(())
}

fn return_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    if cursor.end_of_statement() {
        code.emit_op(Opcode::Return);
        return Ok(());
    }
    expression(cursor, code)?;
    cursor.expect_end()?;
    code.emit_op(Opcode::ReturnValue);
    Ok(())
}

/// `END` or `END LOOP`.
fn end_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let op = if cursor.assume_next_token("LOOP") {
        Opcode::ExitLoop
    } else {
        Opcode::End
    };
    cursor.expect_end()?;
    code.emit_op(op);
    Ok(())
}

fn stop_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    cursor.expect_end()?;
    code.emit_op(Opcode::Stop);
    Ok(())
}

/// `ON ERROR|name GOTO|GOSUB target`
fn on_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let name = cursor.peek(0).clone();
    if name.kind != TokenKind::Identifier {
        return Err(cursor.unexpected("EXPECTED SIGNAL NAME"));
    }
    cursor.next_token();
    let op = if cursor.assume_next_token("GOTO") {
        Opcode::OnErrorGoto
    } else if cursor.assume_next_token("GOSUB") {
        Opcode::OnErrorGosub
    } else {
        return Err(cursor.unexpected("EXPECTED GOTO OR GOSUB"));
    };
    let label = target(cursor)?;
    cursor.expect_end()?;
    code.emit_str(Opcode::String, name.spelling.as_str());
    code.emit_label(op, label);
    Ok(())
}

/// `SIGNAL name [, value]`
fn signal_statement(_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let name = cursor.peek(0).clone();
    if name.kind != TokenKind::Identifier {
        return Err(cursor.unexpected("EXPECTED SIGNAL NAME"));
    }
    cursor.next_token();
    let with_value = cursor.assume_next_token(",");
    if with_value {
        expression(cursor, code)?;
    }
    cursor.expect_end()?;
    code.emit(
        Instruction::new(Opcode::Signal)
            .with_str(name.spelling.as_str())
            .with_int(with_value as i64),
    );
    Ok(())
}
