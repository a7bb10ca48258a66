use crate::error;
use crate::lang::{Cursor, Error, TokenKind};
use crate::mach::{ByteCode, Function, Instruction, Opcode, ValueType};

type Result<T> = std::result::Result<T, Error>;

/// Compile one expression, leaving its value on the stack.
///
/// Precedence from loosest to tightest: `OR`, `AND`, `NOT`, relations,
/// `+ -`, `* / MOD`, `^`, unary minus, then primaries. `AND` and `OR`
/// short-circuit and always produce a boolean.
pub fn expression(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    or_expr(cursor, code)
}

fn short_circuit(
    cursor: &mut Cursor,
    code: &mut ByteCode,
    keyword: &str,
    branch: Opcode,
    operand: fn(&mut Cursor, &mut ByteCode) -> Result<()>,
) -> Result<()> {
    operand(cursor, code)?;
    while cursor.assume_next_token(keyword) {
        let decided = code.emit_forward(branch);
        operand(cursor, code)?;
        code.emit_int(Opcode::Convert, ValueType::Boolean.code());
        let done = code.emit_forward(Opcode::Branch);
        code.patch(decided, code.len())?;
        code.emit_int(Opcode::Boolean, (branch == Opcode::BranchTrue) as i64);
        code.patch(done, code.len())?;
    }
    Ok(())
}

fn or_expr(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    short_circuit(cursor, code, "OR", Opcode::BranchTrue, and_expr)
}

fn and_expr(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    short_circuit(cursor, code, "AND", Opcode::BranchFalse, not_expr)
}

fn not_expr(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    if cursor.assume_next_token("NOT") {
        not_expr(cursor, code)?;
        code.emit_op(Opcode::Not);
        return Ok(());
    }
    relation(cursor, code)
}

fn relation(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    additive(cursor, code)?;
    let op = match cursor.peek(0).spelling.as_str() {
        "=" => Opcode::Eq,
        "<>" => Opcode::Ne,
        "<" => Opcode::Lt,
        "<=" => Opcode::Le,
        ">" => Opcode::Gt,
        ">=" => Opcode::Ge,
        _ => return Ok(()),
    };
    if cursor.peek(0).kind != TokenKind::Special {
        return Ok(());
    }
    cursor.next_token();
    additive(cursor, code)?;
    code.emit_op(op);
    Ok(())
}

fn additive(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    term(cursor, code)?;
    loop {
        let op = if cursor.assume_next_token("+") {
            Opcode::Add
        } else if cursor.assume_next_token("-") {
            Opcode::Sub
        } else {
            return Ok(());
        };
        term(cursor, code)?;
        code.emit_op(op);
    }
}

fn term(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    power(cursor, code)?;
    loop {
        let op = if cursor.assume_next_token("*") {
            Opcode::Mul
        } else if cursor.assume_next_token("/") {
            Opcode::Div
        } else if cursor.assume_next_token("MOD") {
            Opcode::Mod
        } else {
            return Ok(());
        };
        power(cursor, code)?;
        code.emit_op(op);
    }
}

fn power(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    unary(cursor, code)?;
    if cursor.assume_next_token("^") {
        power(cursor, code)?;
        code.emit_op(Opcode::Pow);
    }
    Ok(())
}

fn unary(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    if cursor.assume_next_token("+") {
        return unary(cursor, code);
    }
    if !cursor.assume_next_token("-") {
        return primary(cursor, code);
    }
    let token = cursor.peek(0).clone();
    match token.kind {
        TokenKind::Integer => {
            if let Some(n) = token.integer() {
                cursor.next_token();
                code.emit_int(Opcode::Integer, -n);
                return Ok(());
            }
        }
        TokenKind::Double => {
            if let Some(n) = token.double() {
                cursor.next_token();
                code.emit_float(Opcode::Double, -n);
                return Ok(());
            }
        }
        _ => {}
    }
    unary(cursor, code)?;
    code.emit_op(Opcode::Neg);
    Ok(())
}

/// Comma separated expressions up to `close`. Returns how many.
fn arguments(cursor: &mut Cursor, code: &mut ByteCode, close: &str) -> Result<usize> {
    let mut count = 0;
    if cursor.assume_next_token(close) {
        return Ok(count);
    }
    loop {
        expression(cursor, code)?;
        count += 1;
        if cursor.assume_next_token(close) {
            return Ok(count);
        }
        cursor.expect(",")?;
    }
}

fn primary(cursor: &mut Cursor, code: &mut ByteCode) -> Result<()> {
    let start = cursor.position();
    let token = cursor.next_token();
    match token.kind {
        TokenKind::Integer => match token.integer() {
            Some(n) => code.emit_int(Opcode::Integer, n),
            None => return Err(error!(Overflow, ..&token.column)),
        },
        TokenKind::Double => match token.double() {
            Some(n) => code.emit_float(Opcode::Double, n),
            None => return Err(error!(SyntaxError, ..&token.column; "INVALID NUMBER")),
        },
        TokenKind::String => code.emit_str(Opcode::String, token.spelling.as_str()),
        TokenKind::Special if token.is("(") => {
            expression(cursor, code)?;
            cursor.expect(")")?;
            0
        }
        TokenKind::Special if token.is("[") => {
            let n = arguments(cursor, code, "]")?;
            code.emit_int(Opcode::Array, n as i64)
        }
        TokenKind::Identifier if token.is("TRUE") => code.emit_int(Opcode::Boolean, 1),
        TokenKind::Identifier if token.is("FALSE") => code.emit_int(Opcode::Boolean, 0),
        TokenKind::Identifier if !token.is_reserved() => {
            if cursor.assume_next_token("(") {
                let argc = arguments(cursor, code, ")")?;
                call(cursor, code, &token.spelling, argc, start)?;
            } else {
                code.emit_str(Opcode::Load, token.spelling.as_str());
            }
            0
        }
        _ => {
            cursor.set_position(start);
            return Err(cursor.unexpected("EXPECTED EXPRESSION"));
        }
    };
    while cursor.assume_next_token("[") {
        expression(cursor, code)?;
        cursor.expect("]")?;
        code.emit_op(Opcode::Index);
    }
    Ok(())
}

fn call(cursor: &Cursor, code: &mut ByteCode, name: &str, argc: usize, start: usize) -> Result<()> {
    let conversion = match name {
        "INTEGER" => Some(ValueType::Integer),
        "DOUBLE" => Some(ValueType::Double),
        "STRING" => Some(ValueType::String),
        "BOOLEAN" => Some(ValueType::Boolean),
        _ => None,
    };
    let wrong_count = || {
        let col = cursor.column_since(start);
        error!(ArgumentCount, ..&col; name)
    };
    if let Some(to) = conversion {
        if argc != 1 {
            return Err(wrong_count());
        }
        code.emit_int(Opcode::Convert, to.code());
        return Ok(());
    }
    if let Some(arity) = Function::arity(name) {
        if !arity.contains(&argc) {
            return Err(wrong_count());
        }
    }
    code.emit(
        Instruction::new(Opcode::CallFn)
            .with_str(name)
            .with_int(argc as i64),
    );
    Ok(())
}
