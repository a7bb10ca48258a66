use super::{ByteCode, Executable};
use crate::error;
use crate::lang::{Error, Line, LineNumber};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

/// What a program's header declares it to be. The registry keeps each
/// kind under its own name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Program,
    Function,
    Verb,
    Test,
}

impl ProgramKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ProgramKind::Program => "",
            ProgramKind::Function => "FUNC$",
            ProgramKind::Verb => "VERB$",
            ProgramKind::Test => "TEST$",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ProgramKind::Program => "PROGRAM",
            ProgramKind::Function => "FUNCTION",
            ProgramKind::Verb => "VERB",
            ProgramKind::Test => "TEST",
        }
    }

    pub fn from_keyword(s: &str) -> Option<ProgramKind> {
        match s {
            "PROGRAM" => Some(ProgramKind::Program),
            "FUNCTION" => Some(ProgramKind::Function),
            "VERB" => Some(ProgramKind::Verb),
            "TEST" => Some(ProgramKind::Test),
            _ => None,
        }
    }
}

/// One source line and the fragment compiled from it.
#[derive(Debug, Clone)]
pub struct Statement {
    line: Line,
    code: ByteCode,
    indent: usize,
}

impl Statement {
    pub fn new(line: Line, code: ByteCode) -> Statement {
        Statement {
            line,
            code,
            indent: 0,
        }
    }

    /// Every stored statement is numbered.
    pub fn number(&self) -> LineNumber {
        self.line.number().unwrap_or(0)
    }

    pub fn label(&self) -> Option<&str> {
        self.line.label()
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn code(&self) -> &ByteCode {
        &self.code
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    fn opens(&self) -> usize {
        self.code
            .iter()
            .filter(|i| i.opcode.is_loop_opener() && !i.resolved)
            .count()
    }

    fn closes(&self) -> usize {
        self.code
            .iter()
            .filter(|i| i.opcode.is_loop_closer() && !i.resolved)
            .count()
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.line)
    }
}

/// ## Stored program
///
/// An ordered set of numbered statements. Any edit discards the linked
/// executable; the linker rebuilds it on the next run. A program that an
/// executor is running cannot be edited or relinked.

#[derive(Debug)]
pub struct Program {
    name: String,
    kind: ProgramKind,
    params: Vec<String>,
    statements: BTreeMap<LineNumber, Statement>,
    executable: Option<Arc<Executable>>,
    active: Arc<AtomicUsize>,
}

impl Program {
    pub fn new<S: Into<String>>(name: S, kind: ProgramKind) -> Program {
        Program {
            name: name.into(),
            kind,
            params: vec![],
            statements: BTreeMap::new(),
            executable: None,
            active: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    /// The name the registry stores this program under.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.name)
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn set_params(&mut self, params: Vec<String>) -> Result<()> {
        self.check_inactive()?;
        self.params = params;
        self.executable = None;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.values()
    }

    pub fn get(&self, number: LineNumber) -> Option<&Statement> {
        self.statements.get(&number)
    }

    /// The number an unnumbered line appended to this program receives.
    pub fn next_line_number(&self) -> LineNumber {
        match self.statements.keys().next_back() {
            Some(n) => n.saturating_add(10) / 10 * 10,
            None => 100,
        }
    }

    /// Store a statement, replacing any statement with the same number.
    pub fn store(&mut self, statement: Statement) -> Result<()> {
        self.check_inactive()?;
        self.statements.insert(statement.number(), statement);
        self.executable = None;
        self.reindent();
        Ok(())
    }

    pub fn remove(&mut self, number: LineNumber) -> Result<Option<Statement>> {
        self.check_inactive()?;
        let removed = self.statements.remove(&number);
        if removed.is_some() {
            self.executable = None;
            self.reindent();
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.check_inactive()?;
        self.statements.clear();
        self.executable = None;
        Ok(())
    }

    pub fn executable(&self) -> Option<Arc<Executable>> {
        self.executable.clone()
    }

    pub fn is_linked(&self) -> bool {
        self.executable.is_some()
    }

    pub(super) fn install(&mut self, executable: Arc<Executable>) {
        self.executable = Some(executable);
    }

    /// Discard the executable. The statement fragments are untouched.
    pub fn unlink(&mut self) -> Result<()> {
        self.check_inactive()?;
        self.executable = None;
        Ok(())
    }

    /// Number of executors currently running this program.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    pub(super) fn active_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.active)
    }

    pub(super) fn check_inactive(&self) -> Result<()> {
        if self.is_active() {
            Err(error!(ProgramActive; self.name.as_str()))
        } else {
            Ok(())
        }
    }

    fn reindent(&mut self) {
        let mut depth: usize = 0;
        for statement in self.statements.values_mut() {
            let closes = statement.closes();
            let opens = statement.opens();
            let before = depth.saturating_sub(closes.saturating_sub(opens));
            statement.indent = before;
            depth = (depth + opens).saturating_sub(closes);
        }
    }
}
