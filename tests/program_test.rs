mod common;
use basic::lang::ErrorCode;
use basic::mach::Value;
use common::*;
use std::time::{Duration, Instant};

#[test]
fn test_call_returns() {
    let source = r#"
CALL TRIPLE(14) RETURNS R
PRINT R
CALL TRIPLE(1)
PRINT "DONE"
PROGRAM TRIPLE(N)
RETURN N * 3
"#;
    assert_eq!(run(source), "42\nDONE\n");
}

#[test]
fn test_call_sees_caller_variables() {
    let source = r#"
X = 5
CALL SHOW
PRINT X
PROGRAM SHOW
PRINT X
X = 6
PARENT X = 7
"#;
    assert_eq!(run(source), "5\n7\n");
}

#[test]
fn test_chain_passes_common() {
    let source = r#"
COMMON SCORE = 10
OTHER = 1
CHAIN NEXTPART
PRINT "NOT REACHED"
PROGRAM NEXTPART
PRINT SCORE
PRINT OTHER
"#;
    assert_eq!(run(source), "10\n?UNKNOWN VARIABLE IN 120; OTHER\n");
}

#[test]
fn test_execute() {
    assert_eq!(
        run("X = 2\nEXECUTE \"PRINT X * 10: Y = 3\"\nPRINT Y\n"),
        "20\n3\n"
    );
    let out = run("10 EXECUTE \"PRINT (\"\n");
    assert!(out.starts_with("?SYNTAX ERROR"), "{}", out);
}

#[test]
fn test_run_returns_value() {
    let (mut s, _c) = session();
    s.load("RETURN 6 * 7\n").unwrap();
    assert_eq!(s.run(None).unwrap(), Some(Value::Integer(42)));
    s.load("PRINT 1\n").unwrap();
    assert_eq!(s.run(None).unwrap(), None);
}

#[test]
fn test_unknown_program() {
    assert_eq!(run("10 CALL NOWHERE\n"), "?UNKNOWN PROGRAM IN 10; NOWHERE\n");
    let (mut s, _c) = session();
    assert_eq!(
        s.run(Some("NOWHERE")).unwrap_err().code(),
        ErrorCode::UnknownProgram
    );
}

#[test]
fn test_immediate_statements_share_variables() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "A = 20"), "");
    assert_eq!(exec(&mut s, &c, "PRINT A + 1"), "21\n");
    assert_eq!(s.lookup("a"), Some(Value::Integer(20)));
    assert_eq!(exec(&mut s, &c, "PRINT 1 / 0"), "?DIVISION BY ZERO\n");
}

#[test]
fn test_save_and_load() {
    let source = r#"
10 FOR I = 1 TO 2
20 PRINT I
30 NEXT I
FUNCTION SQUARE(N)
RETURN N * N
"#;
    let (mut s, _c) = session();
    s.load(source).unwrap();
    let saved = s.save();
    assert!(saved.contains("10 FOR I = 1 TO 2\n20   PRINT I\n30 NEXT I\n"), "{}", saved);
    assert!(saved.contains("FUNCTION SQUARE(N)"), "{}", saved);

    let (mut t, c) = session();
    t.load(&saved).unwrap();
    assert_eq!(t.save(), saved);
    t.run(None).unwrap();
    assert_eq!(c.take_output(), "1\n2\n");
    assert_eq!(exec(&mut t, &c, "PRINT SQUARE(9)"), "81\n");
}

#[test]
fn test_link_and_unlink() {
    let (mut s, c) = session();
    s.load("10 X = 1 + 2\n20 PRINT X\n").unwrap();
    s.link(None, false).unwrap();
    let listing = s.disassemble(None).unwrap();
    assert!(listing.contains(&"; 10 X = 1 + 2".to_string()), "{:?}", listing);
    assert!(
        listing.iter().any(|l| l.contains("INTEGER") && l.ends_with(" 3")),
        "{:?}",
        listing
    );
    s.unlink(None).unwrap();
    assert_eq!(exec(&mut s, &c, "20 PRINT X * 2"), "");
    s.run(None).unwrap();
    assert_eq!(c.take_output(), "6\n");
}

#[test]
fn test_stripped_program_still_runs() {
    let (mut s, c) = session();
    s.load("10 PRINT \"KEPT\"\n").unwrap();
    s.link(None, true).unwrap();
    let listing = s.disassemble(None).unwrap();
    assert!(listing.iter().all(|l| !l.starts_with("; 10 PRINT")), "{:?}", listing);
    assert_eq!(s.list(None).unwrap(), vec!["10 PRINT \"KEPT\""]);
    s.run(None).unwrap();
    assert_eq!(c.take_output(), "KEPT\n");
}

#[test]
fn test_run_tests() {
    let source = r#"
PRINT "MAIN"
TEST GOOD
IF 1 + 1 <> 2 THEN SIGNAL WRONG
TEST BAD
SIGNAL WRONG
"#;
    let (mut s, _c) = session();
    s.load(source).unwrap();
    let results: Vec<(String, bool)> = s
        .run_tests()
        .into_iter()
        .map(|(name, r)| (name, r.is_ok()))
        .collect();
    assert_eq!(
        results,
        vec![("BAD".to_string(), false), ("GOOD".to_string(), true)]
    );
}

#[test]
fn test_registered_statement() {
    use basic::lang::{Cursor, Error};
    use basic::mach::{ByteCode, Opcode};
    use basic::stmt::Compiler;

    let (mut s, c) = session();
    s.register_verb(
        "SHOUT",
        |_: &Compiler, cursor: &mut Cursor, code: &mut ByteCode| {
            let text = cursor.next_token().spelling.to_uppercase();
            cursor.expect_end()?;
            code.emit_str(Opcode::String, format!("{}!\n", text).as_str());
            code.emit_int(Opcode::Print, 1);
            Ok::<(), Error>(())
        },
    );
    assert_eq!(exec(&mut s, &c, "SHOUT \"hey\""), "HEY!\n");
}

#[test]
fn test_edit_active_program() {
    let source = r#"
CALL WORK AS THREAD
PROGRAM WORK
SLEEP 1
"#;
    let (mut s, _c) = session();
    s.load(source).unwrap();
    s.run(None).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let active = s
            .context()
            .registry
            .find("WORK")
            .map_or(false, |p| p.lock().is_active());
        if active || Instant::now() > deadline {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    s.select_program("WORK").unwrap();
    assert_eq!(s.enter("120 PRINT 2").unwrap_err().code(), ErrorCode::ProgramActive);
    s.clear_threads();
    s.enter("120 PRINT 2").unwrap();
}
