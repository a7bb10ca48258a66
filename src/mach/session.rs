use super::{
    Console, Executable, Executor, FileTable, Linker, Listing, LockRegistry, Program,
    ProgramKind, ProgramRegistry, Statement, SymbolTable, ThreadTable, Value,
};
use crate::error;
use crate::lang::{Error, Line};
use crate::stmt::{Compiler, Header, StatementCompiler};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Result<T> = std::result::Result<T, Error>;

/// Tunables for compiling and running.
#[derive(Debug, Clone)]
pub struct Config {
    /// Run the peephole optimizer on fragments and linked programs.
    pub optimize: bool,
    /// Log every executed instruction at trace level.
    pub trace: bool,
    pub max_stack: usize,
    pub max_frames: usize,
    /// How often a blocked thread wakes to check for KILL THREAD.
    pub lock_poll: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            optimize: true,
            trace: false,
            max_stack: 4096,
            max_frames: 256,
            lock_poll: Duration::from_millis(10),
        }
    }
}

/// ## Shared session state
///
/// Everything the executors of one session share. Passed around as
/// `Arc<Context>`; nothing here is global to the process.

pub struct Context {
    pub config: Config,
    pub globals: Arc<SymbolTable>,
    pub registry: ProgramRegistry,
    pub locks: LockRegistry,
    pub threads: ThreadTable,
    pub files: FileTable,
    pub console: Arc<dyn Console>,
    pub compiler: Compiler,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("threads", &self.threads)
            .finish()
    }
}

impl Context {
    pub fn new(config: Config, console: Arc<dyn Console>) -> Context {
        let compiler = Compiler::new(config.optimize);
        Context {
            config,
            globals: SymbolTable::global(),
            registry: ProgramRegistry::new(),
            locks: LockRegistry::new(),
            threads: ThreadTable::new(),
            files: FileTable::new(),
            console,
            compiler,
        }
    }

    pub fn linker(&self) -> Linker {
        Linker::new(self.config.optimize)
    }

    /// Compile and link text that is not part of any stored program.
    pub fn immediate(&self, text: &str) -> Result<Arc<Executable>> {
        let line = Line::new(text)?;
        let code = self.compiler.compile_line(&line)?;
        let mut program = Program::new("IMMEDIATE", ProgramKind::Program);
        program.store(Statement::new(line, code))?;
        self.linker().link(&mut program, false)
    }
}

/// ## Interactive session
///
/// Owns a context and the state of the console user: the program being
/// edited and the symbol table immediate statements run in.

pub struct Session {
    context: Arc<Context>,
    current: String,
    console_symbols: Arc<SymbolTable>,
    interrupt: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: Config, console: Arc<dyn Console>) -> Session {
        let context = Arc::new(Context::new(config, console));
        let console_symbols = SymbolTable::new("CONSOLE", &context.globals);
        Session {
            context,
            current: "MAIN".to_string(),
            console_symbols,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Setting this flag aborts whatever the console thread is running.
    pub fn interrupt(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn current_program(&self) -> &str {
        &self.current
    }

    /// Make `name` the program numbered lines edit, creating it if needed.
    pub fn select_program(&mut self, name: &str) -> Result<()> {
        let name = name.to_ascii_uppercase();
        if self.context.registry.find(&name).is_none() {
            self.context
                .registry
                .register(Program::new(name.as_str(), ProgramKind::Program))?;
        }
        self.current = name;
        Ok(())
    }

    /// Replace the current program with an empty one.
    pub fn new_program(&mut self, name: Option<&str>) -> Result<()> {
        let name = name.map_or_else(|| self.current.clone(), |n| n.to_ascii_uppercase());
        self.context
            .registry
            .register(Program::new(name.as_str(), ProgramKind::Program))?;
        self.current = name;
        Ok(())
    }

    pub fn register_verb<C>(&self, keyword: &str, compiler: C)
    where
        C: StatementCompiler + 'static,
    {
        self.context.compiler.register(keyword, compiler);
    }

    /// A numbered line edits the current program; a line number alone
    /// deletes that line. Anything else runs immediately.
    pub fn enter(&mut self, text: &str) -> Result<()> {
        let line = Line::new(text)?;
        let number = match line.number() {
            Some(n) => n,
            None => return self.execute(text),
        };
        let program = match self.context.registry.find(&self.current) {
            Some(p) => p,
            None => self.context.registry.register(Program::new(
                self.current.as_str(),
                ProgramKind::Program,
            ))?,
        };
        let mut program = program.lock();
        if line.is_empty() && line.label().is_none() {
            program.remove(number)?;
            return Ok(());
        }
        let code = self.context.compiler.compile_line(&line)?;
        program.store(Statement::new(line, code))
    }

    /// Store the programs in `text`. Lines before the first header go to
    /// the current program; unnumbered lines are numbered in steps of 10.
    /// Returns the qualified names registered.
    pub fn load(&mut self, text: &str) -> Result<Vec<String>> {
        let mut programs: Vec<Program> = vec![];
        for raw in text.lines() {
            if raw.trim().is_empty() {
                continue;
            }
            let line = Line::new(raw)?;
            if let Some(Header { kind, name, params }) = Compiler::parse_header(&line)? {
                let mut program = Program::new(name, kind);
                program.set_params(params)?;
                programs.push(program);
            }
            if programs.is_empty() {
                programs.push(Program::new(self.current.as_str(), ProgramKind::Program));
            }
            let program = match programs.last_mut() {
                Some(p) => p,
                None => return Err(error!(InternalError)),
            };
            let number = line.number().unwrap_or_else(|| program.next_line_number());
            let line = line.with_number(number);
            let code = self.context.compiler.compile_line(&line)?;
            program.store(Statement::new(line, code))?;
        }
        let mut names = vec![];
        let mut selected = false;
        for program in programs {
            let name = program.qualified_name();
            if program.kind() == ProgramKind::Program && !selected {
                self.current = name.clone();
                selected = true;
            }
            self.context.registry.register(program)?;
            debug!("loaded {}", name);
            names.push(name);
        }
        Ok(names)
    }

    /// Run a stored program on the console thread.
    pub fn run(&mut self, name: Option<&str>) -> Result<Option<Value>> {
        let program = self
            .context
            .registry
            .executable(&self.qualified(name), &self.context.linker())?;
        let symbols = SymbolTable::new(program.name(), &self.context.globals);
        self.interrupt.store(false, Ordering::SeqCst);
        let mut executor = Executor::new(Arc::clone(&self.context), "MAIN", self.interrupt());
        executor.run(program, symbols, vec![])
    }

    /// Run one line of statements in the console's symbol table.
    pub fn execute(&mut self, text: &str) -> Result<()> {
        let program = self.context.immediate(text)?;
        self.interrupt.store(false, Ordering::SeqCst);
        let mut executor = Executor::new(Arc::clone(&self.context), "MAIN", self.interrupt());
        executor.run(program, Arc::clone(&self.console_symbols), vec![])?;
        Ok(())
    }

    pub fn link(&self, name: Option<&str>, strip_source: bool) -> Result<()> {
        let program = self.program(name)?;
        let mut program = program.lock();
        self.context.linker().link(&mut program, strip_source)?;
        Ok(())
    }

    pub fn unlink(&self, name: Option<&str>) -> Result<()> {
        let program = self.program(name)?;
        let mut program = program.lock();
        self.context.linker().unlink(&mut program)
    }

    pub fn list(&self, name: Option<&str>) -> Result<Vec<String>> {
        let program = self.program(name)?;
        let program = program.lock();
        Ok(Listing::source(&program))
    }

    pub fn disassemble(&self, name: Option<&str>) -> Result<Vec<String>> {
        let qualified = self.qualified(name);
        let program = self
            .context
            .registry
            .executable(&qualified, &self.context.linker())?;
        Ok(Listing::executable(&program))
    }

    /// The text `SAVE` writes: the current program first, then every
    /// other program behind its header.
    pub fn save(&self) -> String {
        let mut names = self.context.registry.names();
        names.sort_by_key(|name| *name != self.current);
        let mut s = String::new();
        for name in names {
            if let Some(program) = self.context.registry.find(&name) {
                let program = program.lock();
                let headed = program
                    .statements()
                    .next()
                    .map_or(false, |st| matches!(Compiler::parse_header(st.line()), Ok(Some(_))));
                if !headed && name != self.current {
                    s.push_str(&format!("{} {}\n", program.kind().keyword(), program.name()));
                }
                for line in Listing::source(&program) {
                    s.push_str(&line);
                    s.push('\n');
                }
            }
        }
        s
    }

    /// Run every `TEST` program, each in a fresh table.
    pub fn run_tests(&mut self) -> Vec<(String, Result<()>)> {
        let mut results = vec![];
        for name in self.context.registry.names_of(ProgramKind::Test) {
            let qualified = format!("{}{}", ProgramKind::Test.prefix(), name);
            let result = self.run(Some(&qualified)).map(|_| ());
            match &result {
                Ok(()) => info!("test {} passed", name),
                Err(e) => warn!("test {} failed: {}", name, e),
            }
            results.push((name, result));
        }
        results
    }

    pub fn clear_threads(&self) {
        self.context.threads.join_all("MAIN");
    }

    /// A variable as the console sees it.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.console_symbols.lookup(&name.to_ascii_uppercase())
    }

    pub fn globals(&self) -> &Arc<SymbolTable> {
        &self.context.globals
    }

    fn qualified(&self, name: Option<&str>) -> String {
        name.map_or_else(|| self.current.clone(), |n| n.to_ascii_uppercase())
    }

    fn program(&self, name: Option<&str>) -> Result<Arc<parking_lot::Mutex<Program>>> {
        let qualified = self.qualified(name);
        match self.context.registry.find(&qualified) {
            Some(p) => Ok(p),
            None => Err(error!(UnknownProgram; qualified)),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.context.threads.abort_all();
        self.context.threads.join_all("MAIN");
        self.context.files.close_all();
    }
}
