use super::*;
use crate::mach::Instruction;

#[test]
fn test_let_folds_constants() {
    assert_eq!(
        listing("LET X = 3 + 4", false),
        vec!["INTEGER 3", "INTEGER 4", "ADD", "STORE X"]
    );
    assert_eq!(listing("X = 3 + 4", true), vec!["INTEGER 7", "STORE X"]);
}

#[test]
fn test_typed_store_converts() {
    assert_eq!(
        listing("N% = 2.5", false),
        vec!["DOUBLE 2.5", "CONVERT INTEGER", "STORE N%"]
    );
    assert_eq!(listing("N% = 2.5", true), vec!["INTEGER 2", "STORE N%"]);
}

#[test]
fn test_precedence() {
    assert_eq!(
        listing("X = 1 + 2 * 3 ^ 2", false),
        vec![
            "INTEGER 1",
            "INTEGER 2",
            "INTEGER 3",
            "INTEGER 2",
            "POW",
            "MUL",
            "ADD",
            "STORE X"
        ]
    );
    assert_eq!(
        listing("X = -A + -2", false),
        vec!["LOAD A", "NEG", "INTEGER -2", "ADD", "STORE X"]
    );
}

#[test]
fn test_and_short_circuits() {
    assert_eq!(
        listing("X = A AND B", false),
        vec![
            "LOAD A",
            "BRFALSE 5",
            "LOAD B",
            "CONVERT BOOLEAN",
            "BRANCH 6",
            "BOOLEAN 0",
            "STORE X"
        ]
    );
}

#[test]
fn test_if_patches_forward() {
    let code = compile("IF X THEN Y = 1 ELSE Y = 2", false).unwrap();
    let ops: Vec<Opcode> = code.iter().map(|i| i.opcode).collect();
    assert_eq!(
        ops,
        vec![
            Opcode::Load,
            Opcode::BranchFalse,
            Opcode::Integer,
            Opcode::Store,
            Opcode::Branch,
            Opcode::Integer,
            Opcode::Store
        ]
    );
    assert_eq!(code.get(1).and_then(Instruction::target), Some(5));
    assert_eq!(code.get(4).and_then(Instruction::target), Some(7));
}

#[test]
fn test_if_then_line_number() {
    let code = compile("IF X > 1 THEN 100 ELSE DONE", false).unwrap();
    let jumps: Vec<(Opcode, String, bool)> = code
        .iter()
        .filter(|i| i.opcode.is_branch())
        .map(|i| (i.opcode, i.name().to_string(), i.resolved))
        .collect();
    assert_eq!(
        jumps,
        vec![
            (Opcode::BranchTrue, "100".to_string(), false),
            (Opcode::Branch, "DONE".to_string(), false)
        ]
    );
}

#[test]
fn test_nested_if_claims_first_else() {
    let code = compile("IF A THEN IF B THEN X = 1 ELSE X = 2 ELSE X = 3", false).unwrap();
    let stores = code.iter().filter(|i| i.opcode == Opcode::Store).count();
    assert_eq!(stores, 3);
    assert!(code.iter().all(|i| i.resolved));
}

#[test]
fn test_if_takes_rest_of_line() {
    let code = compile("A = 1: IF A THEN B = 1: C = 1", false).unwrap();
    let skip = code
        .iter()
        .position(|i| i.opcode == Opcode::BranchFalse)
        .unwrap();
    assert_eq!(code.get(skip).and_then(Instruction::target), Some(code.len()));
}

#[test]
fn test_loops_emit_unresolved_markers() {
    let code = compile("DO WHILE I < 3", false).unwrap();
    assert_eq!(code.get(0).map(|i| i.opcode), Some(Opcode::Do));
    assert!(!code.get(0).unwrap().resolved);
    assert_eq!(code.get(code.len() - 1).map(|i| i.opcode), Some(Opcode::ExitFalse));
    assert_eq!(
        listing("FOR I = 1 TO 10 STEP 2", false),
        vec![
            "INTEGER 1",
            "STORE I",
            "INTEGER 10",
            "INTEGER 2",
            "FOR ? I (unresolved)"
        ]
    );
    assert_eq!(listing("NEXT I", false), vec!["NEXT ? I (unresolved)"]);
    assert_eq!(listing("END LOOP", false), vec!["EXITLOOP"]);
}

#[test]
fn test_on_error_and_signal() {
    assert_eq!(
        listing("ON ERROR GOTO 500", false),
        vec!["STRING \"ERROR\"", "ONGOTO ? 500 (unresolved)"]
    );
    assert_eq!(
        listing("SIGNAL OOPS, 3", false),
        vec!["INTEGER 3", "SIGNAL 1 OOPS"]
    );
}

#[test]
fn test_call_forms() {
    assert_eq!(
        listing("CALL WORK(1, 2) RETURNS R", false),
        vec!["INTEGER 1", "INTEGER 2", "CALLVAL 2 WORK", "STORE R"]
    );
    assert_eq!(
        listing("CALL WORK AS THREAD T", false),
        vec!["CALLTHREAD 0 WORK", "STORE T"]
    );
    assert_eq!(listing("GREET 1", false), vec!["INTEGER 1", "CALL 1 VERB$GREET"]);
}

#[test]
fn test_syntax_errors() {
    assert_eq!(error_code("LET = 3"), ErrorCode::SyntaxError);
    assert_eq!(error_code("FOR I = 1"), ErrorCode::SyntaxError);
    assert_eq!(error_code("X = (1 + 2"), ErrorCode::SyntaxError);
    assert_eq!(error_code("X = MID$(1)"), ErrorCode::ArgumentCount);
    assert_eq!(error_code("GOTO"), ErrorCode::SyntaxError);
    let e = compile("20 PRINT 1 +", false).unwrap_err();
    assert_eq!(e.line_number(), Some(20));
    assert_eq!(e.column(), 9..9);
}

#[test]
fn test_registered_verb() {
    let compiler = Compiler::new(false);
    compiler.register(
        "BEEP",
        |_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode| {
            cursor.expect_end()?;
            code.emit_str(Opcode::String, "\x07");
            code.emit_int(Opcode::Print, 1);
            Ok::<(), Error>(())
        },
    );
    let code = compiler.compile_line(&Line::new("BEEP").unwrap()).unwrap();
    assert_eq!(code.len(), 2);
    assert!(compiler.is_verb("BEEP"));
}

#[test]
fn test_parse_header() {
    let line = Line::new("FUNCTION TWICE(N, M$)").unwrap();
    assert_eq!(
        Compiler::parse_header(&line).unwrap(),
        Some(Header {
            kind: ProgramKind::Function,
            name: "TWICE".to_string(),
            params: vec!["N".to_string(), "M$".to_string()],
        })
    );
    let line = Line::new("PRINT 1").unwrap();
    assert_eq!(Compiler::parse_header(&line).unwrap(), None);
    let code = compile("TEST CHECK", false).unwrap();
    assert!(code.is_empty());
}
