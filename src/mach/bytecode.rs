use super::{Address, Instruction, Opcode};
use crate::error;
use crate::lang::{Error, LineNumber};

type Result<T> = std::result::Result<T, Error>;

/// A recorded position in a `ByteCode` stream. Inserting or removing
/// instructions keeps a mark on the same instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// ## Instruction stream
///
/// Statement compilers build one of these per statement. Resolved branch
/// targets are offsets into this stream, so `insert`, `remove` and
/// `concat` renumber them along with every mark.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ByteCode {
    code: Vec<Instruction>,
    owner: Option<LineNumber>,
    marks: Vec<Option<Address>>,
}

impl ByteCode {
    pub fn new(owner: Option<LineNumber>) -> ByteCode {
        ByteCode {
            code: vec![],
            owner,
            marks: vec![],
        }
    }

    /// Line number of the statement this stream was compiled from.
    pub fn owner(&self) -> Option<LineNumber> {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The offset one past the last instruction. Branches may target it.
    pub fn end(&self) -> Address {
        self.code.len()
    }

    pub fn get(&self, index: Address) -> Option<&Instruction> {
        self.code.get(index)
    }

    pub fn get_mut(&mut self, index: Address) -> Option<&mut Instruction> {
        self.code.get_mut(index)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.code
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.code.iter()
    }

    pub fn emit(&mut self, instruction: Instruction) -> Address {
        self.code.push(instruction);
        self.code.len() - 1
    }

    pub fn emit_op(&mut self, opcode: Opcode) -> Address {
        self.emit(Instruction::new(opcode))
    }

    pub fn emit_int(&mut self, opcode: Opcode, n: i64) -> Address {
        self.emit(Instruction::new(opcode).with_int(n))
    }

    pub fn emit_str<S: Into<String>>(&mut self, opcode: Opcode, s: S) -> Address {
        self.emit(Instruction::new(opcode).with_str(s))
    }

    pub fn emit_float(&mut self, opcode: Opcode, n: f64) -> Address {
        self.emit(Instruction::new(opcode).with_float(n))
    }

    /// Emit a branch with a placeholder target to be filled in by `patch`.
    pub fn emit_forward(&mut self, opcode: Opcode) -> Address {
        debug_assert!(opcode.is_branch());
        self.emit(Instruction::new(opcode))
    }

    /// Emit a branch to an offset already known in this stream.
    pub fn emit_branch(&mut self, opcode: Opcode, target: Address) -> Address {
        self.emit(Instruction::branch(opcode, target))
    }

    /// Emit a branch to a label or line number for the linker to resolve.
    pub fn emit_label<S: Into<String>>(&mut self, opcode: Opcode, label: S) -> Address {
        self.emit(Instruction::branch_to_label(opcode, label))
    }

    pub fn insert(&mut self, index: Address, instruction: Instruction) -> Result<()> {
        if index > self.code.len() {
            return Err(self.internal("INSERT OUT OF RANGE"));
        }
        for i in self.code.iter_mut() {
            if let Some(target) = i.target() {
                if target >= index {
                    i.set_target(target + 1);
                }
            }
        }
        for mark in self.marks.iter_mut().flatten() {
            if *mark >= index {
                *mark += 1;
            }
        }
        self.code.insert(index, instruction);
        Ok(())
    }

    /// Remove an instruction. Branches that pointed at it now point at the
    /// instruction that follows it.
    pub fn remove(&mut self, index: Address) -> Result<Instruction> {
        if index >= self.code.len() {
            return Err(self.internal("REMOVE OUT OF RANGE"));
        }
        let removed = self.code.remove(index);
        for i in self.code.iter_mut() {
            if let Some(target) = i.target() {
                if target > index {
                    i.set_target(target - 1);
                }
            }
        }
        for mark in self.marks.iter_mut().flatten() {
            if *mark > index {
                *mark -= 1;
            }
        }
        Ok(removed)
    }

    /// Fill in the target of a placeholder branch. Each placeholder is
    /// patched exactly once.
    pub fn patch(&mut self, index: Address, target: Address) -> Result<()> {
        let len = self.code.len();
        let instruction = match self.code.get_mut(index) {
            Some(i) => i,
            None => return Err(error!(InternalError; "PATCH OUT OF RANGE")),
        };
        if !instruction.opcode.is_branch() || instruction.resolved {
            return Err(error!(InternalError; "PATCH OF RESOLVED INSTRUCTION"));
        }
        if target > len {
            return Err(error!(InternalError; "PATCH TARGET OUT OF RANGE"));
        }
        instruction.set_target(target);
        Ok(())
    }

    /// Append another stream, relocating its resolved branches.
    pub fn concat(&mut self, other: ByteCode) {
        let base = self.code.len();
        for mut i in other.code {
            if let Some(target) = i.target() {
                i.set_target(target + base);
            }
            self.code.push(i);
        }
    }

    pub fn mark(&mut self, index: Address) -> Mark {
        self.marks.push(Some(index));
        Mark(self.marks.len() - 1)
    }

    pub fn position(&self, mark: Mark) -> Option<Address> {
        self.marks.get(mark.0).copied().flatten()
    }

    pub fn unmark(&mut self, mark: Mark) {
        if let Some(m) = self.marks.get_mut(mark.0) {
            *m = None;
        }
    }

    /// Patch the placeholder recorded by `mark` to point at the current end.
    pub fn patch_here(&mut self, mark: Mark) -> Result<()> {
        match self.position(mark) {
            Some(index) => {
                let end = self.end();
                self.unmark(mark);
                self.patch(index, end)
            }
            None => Err(self.internal("PATCH OF UNKNOWN MARK")),
        }
    }

    /// Offsets that some resolved branch points at.
    pub fn targets(&self) -> Vec<Address> {
        let mut v: Vec<Address> = self.code.iter().filter_map(|i| i.target()).collect();
        v.sort_unstable();
        v.dedup();
        v
    }

    pub fn is_target(&self, index: Address) -> bool {
        self.code.iter().any(|i| i.target() == Some(index))
    }

    pub fn is_marked(&self, index: Address) -> bool {
        self.marks.iter().any(|m| *m == Some(index))
    }

    fn internal(&self, msg: &'static str) -> Error {
        error!(InternalError, self.owner; msg)
    }
}

impl From<Vec<Instruction>> for ByteCode {
    fn from(code: Vec<Instruction>) -> ByteCode {
        ByteCode {
            code,
            owner: None,
            marks: vec![],
        }
    }
}
