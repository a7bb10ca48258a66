use super::*;
use proptest::prelude::*;

fn position(exe: &Executable, opcode: Opcode) -> Address {
    exe.code().iter().position(|i| i.opcode == opcode).unwrap()
}

#[test]
fn test_pairs_for_with_next() {
    let mut p = program(&["10 FOR I = 1 TO 3", "20 PRINT I", "30 NEXT I"]);
    let exe = Linker::new(false).link(&mut p, false).unwrap();
    let head = position(&exe, Opcode::For);
    let tail = position(&exe, Opcode::Next);
    assert_eq!(exe.get(head).and_then(Instruction::target), Some(tail + 1));
    assert_eq!(exe.get(tail).and_then(Instruction::target), Some(head));
    assert!(exe.code().iter().all(|i| i.resolved));
    assert!(p.is_linked());
}

#[test]
fn test_nested_loops_pair_innermost_first() {
    let mut p = program(&[
        "10 DO",
        "20 FOR I = 1 TO 2: NEXT",
        "30 LOOP UNTIL TRUE",
    ]);
    let exe = Linker::new(false).link(&mut p, false).unwrap();
    let head = position(&exe, Opcode::Do);
    let tail = position(&exe, Opcode::Loop);
    assert_eq!(exe.get(tail).and_then(Instruction::target), Some(head));
    let next = position(&exe, Opcode::Next);
    assert!(next < tail);
    assert_eq!(
        exe.get(position(&exe, Opcode::For)).and_then(Instruction::target),
        Some(next + 1)
    );
}

#[test]
fn test_loop_errors() {
    assert_eq!(link_error(&["10 NEXT I"]), ErrorCode::UnbalancedLoop);
    assert_eq!(link_error(&["10 FOR I = 1 TO 3"]), ErrorCode::UnbalancedLoop);
    assert_eq!(link_error(&["10 DO", "20 NEXT"]), ErrorCode::LoopMismatch);
    assert_eq!(
        link_error(&["10 FOR I = 1 TO 3", "20 NEXT J"]),
        ErrorCode::LoopMismatch
    );
    assert_eq!(link_error(&["10 END LOOP"]), ErrorCode::NoActiveLoop);
}

#[test]
fn test_error_names_line() {
    let e = Linker::new(false)
        .link(&mut program(&["10 PRINT 1", "20 GOTO 99"]), false)
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::UndefinedLabel);
    assert_eq!(e.line_number(), Some(20));
}

#[test]
fn test_error_line_in_long_program() {
    let mut lines: Vec<String> = (1..=500).map(|n| format!("{} X = X + {}", n * 10, n)).collect();
    lines.push("5010 GOTO NOWHERE".to_string());
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let e = Linker::new(false)
        .link(&mut program(&refs), false)
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::UndefinedLabel);
    assert_eq!(e.line_number(), Some(5010));
}

#[test]
fn test_duplicate_label() {
    assert_eq!(
        link_error(&["10 AGAIN: PRINT 1", "20 AGAIN: PRINT 2"]),
        ErrorCode::DuplicateLabel
    );
}

#[test]
fn test_resolves_labels_and_lines() {
    let mut p = program(&["10 GOTO DONE", "20 PRINT 1", "30 DONE: GOSUB 20", "40 END"]);
    let exe = Linker::new(false).link(&mut p, false).unwrap();
    let done = exe.label("DONE").unwrap();
    assert_eq!(exe.label("30"), Some(done));
    assert_eq!(exe.get(0).and_then(Instruction::target), Some(done));
    let gosub = position(&exe, Opcode::Gosub);
    assert_eq!(exe.get(gosub).and_then(Instruction::target), exe.label("20"));
    assert_eq!(exe.line_for(gosub), Some(30));
    assert_eq!(exe.next_statement(gosub), exe.label("40").unwrap());
    assert_eq!(exe.next_statement(exe.len() - 1), exe.len());
    assert_eq!(exe.text_for(30), Some("30 DONE: GOSUB 20"));
}

#[test]
fn test_link_leaves_fragments_alone() {
    let mut p = program(&["10 FOR I = 1 TO 3", "20 IF I > 1 THEN 40", "30 PRINT I", "40 NEXT"]);
    let before: Vec<ByteCode> = p.statements().map(|s| s.code().clone()).collect();
    let linker = Linker::new(true);
    let first = linker.link(&mut p, false).unwrap();
    linker.unlink(&mut p).unwrap();
    assert!(!p.is_linked());
    let after: Vec<ByteCode> = p.statements().map(|s| s.code().clone()).collect();
    assert_eq!(before, after);
    let second = linker.link(&mut p, false).unwrap();
    assert_eq!(first.code(), second.code());
}

#[test]
fn test_strip_source() {
    let mut p = program(&["10 PRINT 1"]);
    let exe = Linker::new(false).link(&mut p, true).unwrap();
    assert!(!exe.has_source());
    assert_eq!(exe.text_for(10), None);
    assert_eq!(exe.line_for(0), Some(10));
}

/// Statement bodies that link on their own or as a balanced block.
fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    let body = prop::sample::select(vec![
        "X = X + 1",
        "PRINT X; \"A\"",
        "IF X > 2 THEN Y = 1 ELSE Y = 2",
        "A = B AND C OR NOT D",
        "GOSUB 1000",
    ]);
    let block = (0..4usize, prop::collection::vec(body, 0..4));
    prop::collection::vec(block, 1..6).prop_map(|blocks| {
        let mut lines = vec![];
        for (kind, inner) in blocks {
            let (open, close) = match kind {
                0 => ("FOR I = 1 TO 3", "NEXT I"),
                1 => ("DO WHILE X < 5", "LOOP"),
                2 => ("WHILE X < 5", "WEND"),
                _ => ("REM", "REM"),
            };
            lines.push(open.to_string());
            lines.extend(inner.into_iter().map(str::to_string));
            lines.push(close.to_string());
        }
        lines.push("END".to_string());
        lines.push("RETURN".to_string());
        lines
            .iter()
            .enumerate()
            .map(|(n, s)| {
                let number = if n + 1 == lines.len() { 1000 } else { 10 * (n + 1) };
                format!("{} {}", number, s)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn link_unlink_round_trip(lines in arb_lines(), optimize in any::<bool>()) {
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut p = program(&refs);
        let before: Vec<ByteCode> = p.statements().map(|s| s.code().clone()).collect();
        let linker = Linker::new(optimize);
        let first = linker.link(&mut p, false).unwrap();
        prop_assert!(first.code().iter().all(|i| i.resolved));
        linker.unlink(&mut p).unwrap();
        let after: Vec<ByteCode> = p.statements().map(|s| s.code().clone()).collect();
        prop_assert_eq!(before, after);
        let second = linker.link(&mut p, false).unwrap();
        prop_assert_eq!(first.code(), second.code());
    }
}
