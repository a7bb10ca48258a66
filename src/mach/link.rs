use super::{Address, ByteCode, Instruction, Mark, Opcode, Optimizer, Program, ProgramKind};
use crate::error;
use crate::lang::{Error, LineNumber};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

/// ## Linked program
///
/// One flat instruction stream with every branch resolved to an offset
/// in it. Immutable once built; executors share it by `Arc`.

#[derive(Debug)]
pub struct Executable {
    name: String,
    kind: ProgramKind,
    params: Vec<String>,
    code: Vec<Instruction>,
    labels: BTreeMap<String, Address>,
    lines: Vec<(Address, LineNumber)>,
    source: Option<BTreeMap<LineNumber, String>>,
    active: Arc<AtomicUsize>,
}

impl Executable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn get(&self, pc: Address) -> Option<&Instruction> {
        self.code.get(pc)
    }

    pub fn label(&self, name: &str) -> Option<Address> {
        self.labels.get(name).copied()
    }

    /// Statement start offsets in program order.
    pub fn lines(&self) -> &[(Address, LineNumber)] {
        &self.lines
    }

    /// The statement an offset belongs to.
    pub fn line_for(&self, pc: Address) -> Option<LineNumber> {
        let idx = self.lines.partition_point(|(addr, _)| *addr <= pc);
        if idx == 0 {
            None
        } else {
            Some(self.lines[idx - 1].1)
        }
    }

    /// Offset of the first statement that starts after `pc`.
    pub fn next_statement(&self, pc: Address) -> Address {
        self.lines
            .iter()
            .map(|(addr, _)| *addr)
            .find(|addr| *addr > pc)
            .unwrap_or(self.code.len())
    }

    /// Statement text, unless the program was linked with source stripped.
    pub fn text_for(&self, line: LineNumber) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.get(&line))
            .map(|s| s.as_str())
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub(super) fn active_counter(&self) -> &Arc<AtomicUsize> {
        &self.active
    }
}

/// ## Linker
///
/// Concatenates statement fragments, pairs loop openers with their
/// closers, resolves label and line number references, optimizes and
/// installs the result. Statement fragments are cloned, never changed.

#[derive(Debug, Clone)]
pub struct Linker {
    optimize: bool,
}

/// Where a statement begins in the concatenated stream. Immediate
/// statements have no line number.
struct Start {
    mark: Mark,
    line: Option<LineNumber>,
    label: Option<String>,
}

struct OpenLoop {
    opcode: Opcode,
    addr: Address,
    var: Option<String>,
}

impl Linker {
    pub fn new(optimize: bool) -> Linker {
        Linker { optimize }
    }

    pub fn link(&self, program: &mut Program, strip_source: bool) -> Result<Arc<Executable>> {
        program.check_inactive()?;
        let (mut stream, starts) = Linker::concat(program)?;
        Linker::pair_loops(&mut stream, &starts)?;
        Linker::resolve_labels(&mut stream, &starts)?;
        if self.optimize {
            let changes = Optimizer::optimize(&mut stream);
            debug!(
                "optimized {}: {} changes, {} instructions",
                program.name(),
                changes,
                stream.len()
            );
        }
        Linker::verify(&stream, &starts)?;
        let mut labels = BTreeMap::new();
        let mut lines = vec![];
        for start in &starts {
            let addr = stream.position(start.mark).unwrap_or(stream.end());
            if let Some(line) = start.line {
                lines.push((addr, line));
                labels.insert(line.to_string(), addr);
            }
            if let Some(label) = &start.label {
                labels.insert(label.clone(), addr);
            }
        }
        let source = if strip_source {
            None
        } else {
            Some(
                program
                    .statements()
                    .map(|s| (s.number(), s.to_string()))
                    .collect(),
            )
        };
        let executable = Arc::new(Executable {
            name: program.name().to_string(),
            kind: program.kind(),
            params: program.params().to_vec(),
            code: stream.into_instructions(),
            labels,
            lines,
            source,
            active: program.active_counter(),
        });
        debug!(
            "linked {} ({} statements, {} instructions)",
            program.name(),
            program.len(),
            executable.len()
        );
        program.install(Arc::clone(&executable));
        Ok(executable)
    }

    pub fn unlink(&self, program: &mut Program) -> Result<()> {
        program.unlink()
    }

    fn concat(program: &Program) -> Result<(ByteCode, Vec<Start>)> {
        let mut stream = ByteCode::new(None);
        let mut starts: Vec<Start> = vec![];
        let mut seen: HashMap<String, LineNumber> = HashMap::new();
        for statement in program.statements() {
            let base = stream.len();
            if let Some(label) = statement.label() {
                if seen.insert(label.to_string(), statement.number()).is_some() {
                    return Err(error!(DuplicateLabel, statement.line().number(); label));
                }
            }
            starts.push(Start {
                mark: stream.mark(base),
                line: statement.line().number(),
                label: statement.label().map(|s| s.to_string()),
            });
            stream.concat(statement.code().clone());
        }
        Ok((stream, starts))
    }

    /// Start address and line number of each statement, in address order.
    fn line_table(starts: &[Start], stream: &ByteCode) -> Vec<(Address, Option<LineNumber>)> {
        starts
            .iter()
            .filter_map(|s| stream.position(s.mark).map(|p| (p, s.line)))
            .collect()
    }

    fn line_at(table: &[(Address, Option<LineNumber>)], addr: Address) -> Option<LineNumber> {
        match table.partition_point(|(p, _)| *p <= addr) {
            0 => None,
            n => table.get(n - 1).and_then(|(_, line)| *line),
        }
    }

    fn pair_loops(stream: &mut ByteCode, starts: &[Start]) -> Result<()> {
        let lines = Linker::line_table(starts, stream);
        let mut open: Vec<OpenLoop> = vec![];
        for addr in 0..stream.len() {
            let (opcode, resolved, var) = match stream.get(addr) {
                Some(i) => (i.opcode, i.resolved, i.str_operand.clone()),
                None => break,
            };
            let line = Linker::line_at(&lines, addr);
            if opcode.is_loop_opener() && !resolved {
                open.push(OpenLoop { opcode, addr, var });
            } else if opcode.is_loop_closer() && !resolved {
                let opener = match open.pop() {
                    Some(o) => o,
                    None => {
                        return Err(error!(UnbalancedLoop, line; format!("{} WITHOUT OPENER", opcode)))
                    }
                };
                if !opener.opcode.closes(opcode) {
                    return Err(error!(LoopMismatch, line;
                        format!("{} DOES NOT CLOSE {}", opcode, opener.opcode)));
                }
                if let (Some(want), Some(got)) = (&opener.var, &var) {
                    if want != got {
                        return Err(error!(LoopMismatch, line;
                            format!("NEXT {} DOES NOT CLOSE FOR {}", got, want)));
                    }
                }
                if let Some(closer) = stream.get_mut(addr) {
                    closer.set_target(opener.addr);
                }
                if let Some(head) = stream.get_mut(opener.addr) {
                    head.set_target(addr + 1);
                }
            } else if matches!(
                opcode,
                Opcode::ExitLoop | Opcode::ContinueLoop | Opcode::ExitFalse | Opcode::ExitTrue
            ) && open.is_empty()
            {
                return Err(error!(NoActiveLoop, line; format!("{} OUTSIDE LOOP", opcode)));
            }
        }
        match open.pop() {
            Some(opener) => {
                let line = Linker::line_at(&lines, opener.addr);
                Err(error!(UnbalancedLoop, line; format!("{} WITHOUT CLOSER", opener.opcode)))
            }
            None => Ok(()),
        }
    }

    fn resolve_labels(stream: &mut ByteCode, starts: &[Start]) -> Result<()> {
        let mut table: HashMap<String, Address> = HashMap::new();
        for start in starts {
            let addr = stream.position(start.mark).unwrap_or(stream.end());
            if let Some(line) = start.line {
                table.insert(line.to_string(), addr);
            }
            if let Some(label) = &start.label {
                table.insert(label.clone(), addr);
            }
        }
        let lines = Linker::line_table(starts, stream);
        for addr in 0..stream.len() {
            let line = Linker::line_at(&lines, addr);
            if let Some(i) = stream.get_mut(addr) {
                if i.resolved || !i.opcode.is_branch() {
                    continue;
                }
                let label = i.name().to_string();
                match table.get(&label) {
                    Some(target) => i.set_target(*target),
                    None => return Err(error!(UndefinedLabel, line; label)),
                }
            }
        }
        Ok(())
    }

    fn verify(stream: &ByteCode, starts: &[Start]) -> Result<()> {
        let lines = Linker::line_table(starts, stream);
        for (addr, i) in stream.iter().enumerate() {
            let bad = !i.resolved || i.target().map_or(false, |t| t > stream.len());
            if bad {
                let line = Linker::line_at(&lines, addr);
                return Err(error!(InternalError, line; format!("UNRESOLVED {}", i)));
            }
        }
        Ok(())
    }
}
