use super::{Address, ByteCode, Instruction, Opcode, Operation};

/// ## Peephole optimizer
///
/// Rewrites short instruction windows until nothing more changes, so a
/// second run over its own output always reports zero changes. A window
/// is left alone if any position after its first is a branch target or
/// a recorded mark, which keeps statement starts and jump destinations
/// intact.

pub struct Optimizer {}

impl Optimizer {
    /// Returns the number of rewrites made.
    pub fn optimize(code: &mut ByteCode) -> usize {
        let mut total = 0;
        loop {
            let mut changes = 0;
            let mut pc = 0;
            while pc < code.len() {
                if Optimizer::rewrite(code, pc) {
                    changes += 1;
                } else {
                    pc += 1;
                }
            }
            if changes == 0 {
                return total;
            }
            total += changes;
        }
    }

    fn protected(code: &ByteCode, pc: Address) -> bool {
        code.is_target(pc) || code.is_marked(pc)
    }

    fn at(code: &ByteCode, pc: Address) -> Option<Instruction> {
        code.get(pc).cloned()
    }

    /// Where a chain of unconditional branches starting at `target` ends.
    /// `None` if the chain loops back on itself.
    fn final_target(code: &ByteCode, target: Address) -> Option<Address> {
        let mut seen = vec![target];
        let mut at = target;
        while let Some(next) = code
            .get(at)
            .filter(|i| i.opcode == Opcode::Branch)
            .and_then(Instruction::target)
        {
            if seen.contains(&next) {
                return None;
            }
            seen.push(next);
            at = next;
        }
        Some(at)
    }

    /// Try each rule at `pc`. Returns true if the stream changed.
    fn rewrite(code: &mut ByteCode, pc: Address) -> bool {
        let first = match Optimizer::at(code, pc) {
            Some(i) => i,
            None => return false,
        };
        let second = match Optimizer::at(code, pc + 1) {
            Some(i) if !Optimizer::protected(code, pc + 1) => Some(i),
            _ => None,
        };

        if first.opcode == Opcode::Nop {
            return code.remove(pc).is_ok();
        }

        if let Some(target) = first.target() {
            match first.opcode {
                Opcode::Branch if target == pc + 1 => return code.remove(pc).is_ok(),
                Opcode::BranchFalse | Opcode::BranchTrue if target == pc + 1 => {
                    if let Some(i) = code.get_mut(pc) {
                        *i = Instruction::new(Opcode::Drop);
                    }
                    return true;
                }
                Opcode::Branch | Opcode::BranchFalse | Opcode::BranchTrue | Opcode::Gosub => {
                    if let Some(next) = Optimizer::final_target(code, target) {
                        if next != target {
                            if let Some(i) = code.get_mut(pc) {
                                i.set_target(next);
                            }
                            return true;
                        }
                    }
                }
                _ => {}
            }
        }

        let second = match second {
            Some(i) => i,
            None => return false,
        };

        match (first.opcode, second.opcode) {
            (Opcode::Store, Opcode::Load) if first.name() == second.name() => {
                let name = first.name().to_string();
                if let Some(i) = code.get_mut(pc) {
                    *i = Instruction::new(Opcode::Dup);
                }
                if let Some(i) = code.get_mut(pc + 1) {
                    *i = Instruction::new(Opcode::Store).with_str(name);
                }
                return true;
            }
            (Opcode::Convert, Opcode::Convert) if first.int_operand == second.int_operand => {
                return code.remove(pc + 1).is_ok();
            }
            (op, Opcode::Convert) if op.is_constant() => {
                let folded = first
                    .constant()
                    .zip(second.convert_type())
                    .and_then(|(v, t)| v.convert(t).ok())
                    .and_then(|v| Instruction::literal(&v));
                if let Some(literal) = folded {
                    if let Some(i) = code.get_mut(pc) {
                        *i = literal;
                    }
                    return code.remove(pc + 1).is_ok();
                }
            }
            (op, Opcode::Drop) if op.is_constant() || op == Opcode::Dup => {
                return code.remove(pc + 1).is_ok() && code.remove(pc).is_ok();
            }
            _ => {}
        }

        if first.opcode.is_constant() && second.opcode.is_constant() {
            if let Some(third) = Optimizer::at(code, pc + 2) {
                if matches!(third.opcode, Opcode::Add | Opcode::Sub | Opcode::Mul)
                    && !Optimizer::protected(code, pc + 2)
                {
                    let folded = match (first.constant(), second.constant()) {
                        (Some(l), Some(r)) => Operation::binary(third.opcode, l, r).ok(),
                        _ => None,
                    };
                    if let Some(literal) = folded.as_ref().and_then(Instruction::literal) {
                        if let Some(i) = code.get_mut(pc) {
                            *i = literal;
                        }
                        return code.remove(pc + 2).is_ok() && code.remove(pc + 1).is_ok();
                    }
                }
            }
        }
        false
    }
}
