mod common;
use common::*;

#[test]
fn test_on_error_goto() {
    let source = r#"
ON ERROR GOTO HANDLER
SIGNAL "FOO"
PRINT "NOT REACHED"
END
HANDLER: PRINT "CAUGHT "; $STATUS
"#;
    assert_eq!(run(source), "CAUGHT FOO\n");
}

#[test]
fn test_unhandled_signal_ends_program() {
    assert_eq!(
        run("10 PRINT \"A\"\n20 SIGNAL \"FOO\"\n30 PRINT \"B\"\n"),
        "A\n?SIGNAL IN 20; FOO\n"
    );
    assert_eq!(run("10 SIGNAL OOPS, 3\n"), "?SIGNAL IN 10; OOPS(3)\n");
}

#[test]
fn test_on_error_gosub_resumes_after_statement() {
    let source = r#"
ON ERROR GOSUB FIX
X = 1 / 0
PRINT "AFTER"
END
FIX: PRINT "FIX "; $STATUS
RETURN
"#;
    assert_eq!(run(source), "FIX DIVZERO\nAFTER\n");
}

#[test]
fn test_named_handler_and_value() {
    let source = r#"
ON OOPS GOTO CAUGHT
CALL WORK
PRINT "NO"
END
CAUGHT: PRINT "CAUGHT "; $STATUS_ARG
PROGRAM WORK
SIGNAL OOPS, 7
PRINT "NO"
"#;
    assert_eq!(run(source), "CAUGHT 7\n");
}

#[test]
fn test_latest_handler_wins() {
    let source = r#"
10 ON ERROR GOTO 100
20 ON TYPEMISMATCH GOTO 200
30 X = "A" - 1
100 PRINT "GENERIC"
110 END
200 PRINT "SPECIFIC"
"#;
    assert_eq!(run(source), "SPECIFIC\n");
}

#[test]
fn test_other_names_pass_through() {
    let source = r#"
10 ON OOPS GOTO 100
20 SIGNAL OTHER
100 PRINT "NO"
"#;
    assert_eq!(run(source), "?SIGNAL IN 20; OTHER\n");
}

#[test]
fn test_signal_builtin_name() {
    assert_eq!(run("10 SIGNAL DIVZERO\n"), "?DIVISION BY ZERO IN 10\n");
}

#[test]
fn test_handler_inside_loop_keeps_loop() {
    let source = r#"
10 ON ERROR GOTO 40
20 FOR I = 1 TO 3
30 SIGNAL SKIP
40 PRINT I;
50 NEXT I
60 PRINT
"#;
    assert_eq!(run(source), "123\n");
}

#[test]
fn test_gosub_handler_from_callee_returns_to_caller() {
    let source = r#"
ON ERROR GOSUB LOG
CALL WORK
PRINT "BACK"
END
LOG: PRINT "LOG "; $STATUS
RETURN
PROGRAM WORK
PRINT "WORK"
SIGNAL BAD
PRINT "NO"
"#;
    assert_eq!(run(source), "WORK\nLOG BAD\nBACK\n");
}

#[test]
fn test_gosub_handler_skips_statement_waiting_for_value() {
    let source = r#"
ON ERROR GOSUB LOG
CALL WORK RETURNS V
PRINT "BACK"
X = F(1) + 2
PRINT "AGAIN"
END
LOG: PRINT "LOG "; $STATUS
RETURN
PROGRAM WORK
SIGNAL BAD
FUNCTION F(N)
SIGNAL WORSE
"#;
    assert_eq!(run(source), "LOG BAD\nBACK\nLOG WORSE\nAGAIN\n");
}
