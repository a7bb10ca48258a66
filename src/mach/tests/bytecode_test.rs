use super::*;

fn sample() -> ByteCode {
    let mut code = ByteCode::new(Some(10));
    code.emit_int(Opcode::Integer, 1);
    code.emit_branch(Opcode::BranchFalse, 3);
    code.emit_int(Opcode::Integer, 2);
    code.emit_op(Opcode::Drop);
    code
}

#[test]
fn test_insert_shifts_targets_and_marks() {
    let mut code = sample();
    let mark = code.mark(3);
    code.insert(2, Instruction::new(Opcode::Nop)).unwrap();
    assert_eq!(code.get(1).and_then(Instruction::target), Some(4));
    assert_eq!(code.position(mark), Some(4));
    assert_eq!(code.get(4).map(|i| i.opcode), Some(Opcode::Drop));
}

#[test]
fn test_insert_after_target_leaves_it() {
    let mut code = sample();
    code.insert(4, Instruction::new(Opcode::Nop)).unwrap();
    assert_eq!(code.get(1).and_then(Instruction::target), Some(3));
    assert!(code.insert(9, Instruction::new(Opcode::Nop)).is_err());
}

#[test]
fn test_remove_retargets_to_follower() {
    let mut code = sample();
    let mark = code.mark(3);
    let removed = code.remove(2).unwrap();
    assert_eq!(removed.opcode, Opcode::Integer);
    assert_eq!(code.get(1).and_then(Instruction::target), Some(2));
    assert_eq!(code.position(mark), Some(2));
    let e = code.remove(7).unwrap_err();
    assert_eq!(e.code(), ErrorCode::InternalError);
    assert_eq!(e.line_number(), Some(10));
}

#[test]
fn test_patch_once() {
    let mut code = ByteCode::new(None);
    let jump = code.emit_forward(Opcode::Branch);
    code.emit_int(Opcode::Integer, 1);
    assert!(!code.get(jump).unwrap().resolved);
    code.patch(jump, code.end()).unwrap();
    assert_eq!(code.get(jump).and_then(Instruction::target), Some(2));
    assert!(code.patch(jump, 1).is_err());
    assert!(code.patch(1, 0).is_err());
}

#[test]
fn test_patch_here_follows_mark() {
    let mut code = ByteCode::new(None);
    code.emit_int(Opcode::Integer, 1);
    let jump = code.emit_forward(Opcode::BranchTrue);
    let mark = code.mark(jump);
    code.insert(0, Instruction::new(Opcode::Nop)).unwrap();
    code.emit_int(Opcode::Integer, 2);
    code.patch_here(mark).unwrap();
    assert_eq!(code.get(2).and_then(Instruction::target), Some(4));
    assert_eq!(code.position(mark), None);
    assert!(code.patch_here(mark).is_err());
}

#[test]
fn test_concat_relocates() {
    let mut code = sample();
    code.concat(sample());
    assert_eq!(code.len(), 8);
    assert_eq!(code.get(5).and_then(Instruction::target), Some(7));
    assert_eq!(code.targets(), vec![3, 7]);
    assert!(code.is_target(7));
    assert!(!code.is_target(6));
}

#[test]
fn test_labels_stay_unresolved() {
    let mut code = ByteCode::new(None);
    code.emit_label(Opcode::Gosub, "500");
    code.insert(0, Instruction::new(Opcode::Nop)).unwrap();
    let gosub = code.get(1).unwrap();
    assert!(!gosub.resolved);
    assert_eq!(gosub.target(), None);
    assert_eq!(gosub.name(), "500");
}
