mod common;
use basic::mach::Value;
use common::*;

#[test]
fn test_let_arithmetic() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "LET X = 3 + 4"), "");
    assert_eq!(s.lookup("X"), Some(Value::Integer(7)));
    assert_eq!(exec(&mut s, &c, "PRINT X * 2; \"!\""), "14!\n");
}

#[test]
fn test_typed_names_convert() {
    let (mut s, c) = session();
    exec(&mut s, &c, "N% = 7.9: T$ = 12");
    assert_eq!(s.lookup("N%"), Some(Value::Integer(7)));
    assert_eq!(s.lookup("T$"), Some(Value::from("12")));
}

#[test]
fn test_for_next() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "FOR I = 1 TO 3: PRINT I;: NEXT I: PRINT"), "123\n");
    assert_eq!(
        exec(&mut s, &c, "FOR I = 3 TO 1 STEP -1: PRINT I;: NEXT: PRINT"),
        "321\n"
    );
    assert_eq!(exec(&mut s, &c, "FOR I = 5 TO 1: PRINT I: NEXT I: PRINT \"X\""), "X\n");
}

#[test]
fn test_for_each() {
    let (mut s, c) = session();
    assert_eq!(
        exec(&mut s, &c, "FOR EACH V IN [\"A\", \"B\"]: PRINT V;: NEXT: PRINT"),
        "AB\n"
    );
    assert_eq!(exec(&mut s, &c, "FOR EACH V IN []: PRINT V: NEXT: PRINT \"NONE\""), "NONE\n");
}

#[test]
fn test_goto_out_of_nested_for() {
    let source = "
10 FOR Y = 1 TO 2
20 FOR X = 8 TO 9
30 PRINT Y; X
40 GOTO 60
50 NEXT X
60 NEXT Y
";
    assert_eq!(run(source), "18\n28\n");
}

#[test]
fn test_do_while_false_skips_body() {
    let source = "
X = 1
DO WHILE FALSE
X = 2
LOOP
PRINT X
";
    assert_eq!(run(source), "1\n");
}

#[test]
fn test_do_loop_until_and_while_wend() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "I = 0: DO: I = I + 1: LOOP UNTIL I = 5: PRINT I"), "5\n");
    let source = "
I = 0
WHILE I < 3
I = I + 1
WEND
PRINT I
";
    assert_eq!(run(source), "3\n");
}

#[test]
fn test_end_and_continue_loop() {
    let source = "
FOR I = 1 TO 10
IF I MOD 2 = 0 THEN CONTINUE LOOP
IF I > 6 THEN END LOOP
PRINT I;
NEXT I
PRINT
";
    assert_eq!(run(source), "135\n");
}

#[test]
fn test_if_else() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "A = 2: IF A > 1 THEN PRINT \"BIG\" ELSE PRINT \"SMALL\""), "BIG\n");
    assert_eq!(exec(&mut s, &c, "IF A < 1 THEN PRINT \"BIG\" ELSE PRINT \"SMALL\""), "SMALL\n");
    assert_eq!(exec(&mut s, &c, "IF FALSE THEN PRINT 1: PRINT 2"), "");
}

#[test]
fn test_nested_gosub_return() {
    let source = "
10 X = 1
20 GOSUB 100
30 PRINT \"DONE\"; X
40 END
100 PRINT \"A\"
110 GOSUB 200
120 PRINT \"C\"
130 RETURN
200 PRINT \"B\"
210 X = 2
220 RETURN
";
    assert_eq!(run(source), "A\nB\nC\nDONE2\n");
}

#[test]
fn test_gosub_label() {
    let source = "
GOSUB SHOW
PRINT \"BACK\"
END
SHOW: PRINT \"SHOW\"
RETURN
";
    assert_eq!(run(source), "SHOW\nBACK\n");
}

#[test]
fn test_stop_ends_everything() {
    let source = "
10 GOSUB 100
20 PRINT \"NOT REACHED\"
100 STOP
";
    assert_eq!(run(source), "");
}

#[test]
fn test_short_circuit() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "IF FALSE AND MISSING THEN PRINT 1 ELSE PRINT 2"), "2\n");
    assert_eq!(exec(&mut s, &c, "PRINT TRUE OR MISSING"), "true\n");
}

#[test]
fn test_arrays_and_index() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "A = [10, 20, 30]: PRINT A[2]; LEN(A)"), "203\n");
    assert_eq!(exec(&mut s, &c, "PRINT \"HELLO\"[1]"), "H\n");
    assert_eq!(exec(&mut s, &c, "PRINT A[4]"), "?SUBSCRIPT OUT OF RANGE\n");
}

#[test]
fn test_constants_and_scopes() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "CONSTANT LIMIT = 10"), "");
    assert_eq!(exec(&mut s, &c, "LIMIT = 11"), "?READ-ONLY VARIABLE; LIMIT\n");
    exec(&mut s, &c, "GLOBAL G = 1");
    assert_eq!(s.globals().lookup("G"), Some(Value::Integer(1)));
    assert_eq!(s.lookup("G"), Some(Value::Integer(1)));
}

#[test]
fn test_unknown_variable() {
    let (mut s, c) = session();
    assert_eq!(exec(&mut s, &c, "PRINT NOPE"), "?UNKNOWN VARIABLE; NOPE\n");
}

#[test]
fn test_program_lines_edit() {
    let (mut s, c) = session();
    exec(&mut s, &c, "20 PRINT \"B\"");
    exec(&mut s, &c, "10 PRINT \"A\"");
    assert_eq!(s.list(None).unwrap(), vec!["10 PRINT \"A\"", "20 PRINT \"B\""]);
    s.run(None).unwrap();
    assert_eq!(c.take_output(), "A\nB\n");
    exec(&mut s, &c, "10");
    assert_eq!(s.list(None).unwrap().len(), 1);
    s.run(None).unwrap();
    assert_eq!(c.take_output(), "B\n");
}

#[test]
fn test_input() {
    let (mut s, c) = session();
    c.push_input("ALICE");
    c.push_input("41");
    let out = exec(&mut s, &c, "INPUT \"NAME\"; N$: INPUT A%: PRINT N$; A% + 1");
    assert_eq!(out, "NAMEALICE\n? 41\nALICE42\n");
    let out = exec(&mut s, &c, "INPUT X");
    assert_eq!(out, "? ?INPUT PAST END; CONSOLE\n");
}

#[test]
fn test_undefined_line_reports_line() {
    let out = run("10 PRINT 1\n20 GOTO 99\n");
    assert_eq!(out, "?UNDEFINED LABEL IN 20; 99\n");
}
