use crate::lang::{Error, LineNumber};
use crate::mach::{Config, Console, Listing, Session};
use crate::error;
use ansi_term::Style;
use linefeed::{Completer, Completion, DefaultTerminal, Interface, Prompter, ReadResult, Signal, Terminal};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub fn main(config: Config, file: Option<String>, execute: Option<String>) {
    if let Err(error) = main_loop(config, file, execute) {
        eprintln!("{}", error);
    }
}

/// `PRINT` and `INPUT` on the terminal. Output goes through linefeed so
/// a pending prompt is redrawn below it.
struct TermConsole {
    interface: Interface<DefaultTerminal>,
}

impl Console for TermConsole {
    fn print(&self, s: &str) {
        let _ = self.interface.write_fmt(format_args!("{}", s));
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        self.interface.set_prompt(prompt).ok()?;
        match self.interface.read_line() {
            Ok(ReadResult::Input(s)) => Some(s),
            _ => None,
        }
    }
}

fn main_loop(config: Config, file: Option<String>, execute: Option<String>) -> std::io::Result<()> {
    let command = Interface::new("BASIC")?;
    let input = Interface::new("INPUT")?;
    input.set_report_signal(Signal::Interrupt, true);
    let mut session = Session::new(config, Arc::new(TermConsole { interface: input }));
    let interrupt = session.interrupt();
    ctrlc::set_handler(move || {
        interrupt.store(true, Ordering::SeqCst);
    })
    .map_err(|e| std::io::Error::new(ErrorKind::Other, e.to_string()))?;

    if let Some(file) = file {
        let result = load(&mut session, &file).and_then(|_| session.run(None).map(|_| ()));
        if let Err(error) = result {
            report(&command, &session, "", &error)?;
        }
        if execute.is_none() {
            return Ok(());
        }
    }
    if let Some(text) = execute {
        if let Err(error) = session.execute(&text) {
            report(&command, &session, &text, &error)?;
        }
        return Ok(());
    }

    command.set_prompt("READY.\n")?;
    loop {
        command.set_completer(Arc::new(LineCompleter::new(&session)));
        let string = match command.read_line()? {
            ReadResult::Input(string) => string,
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        if string.trim().is_empty() {
            continue;
        }
        command.add_history_unique(string.clone());
        match dispatch(&mut session, &command, &string) {
            Ok(true) => {}
            Ok(false) => break,
            Err(error) => report(&command, &session, &string, &error)?,
        }
    }
    Ok(())
}

/// Console commands, then program lines and immediate statements.
/// Returns false on `QUIT`.
fn dispatch(
    session: &mut Session,
    command: &Interface<DefaultTerminal>,
    text: &str,
) -> Result<bool, Error> {
    let mut words = text.split_whitespace();
    let verb = words.next().unwrap_or("").to_ascii_uppercase();
    let arg = words.next().map(|w| w.trim_matches('"').to_string());
    let write = |s: String| {
        let _ = command.write_fmt(format_args!("{}\n", s));
    };
    match verb.as_str() {
        "QUIT" => return Ok(false),
        "RUN" => {
            session.run(arg.as_deref())?;
        }
        "LIST" => {
            for line in session.list(arg.as_deref())? {
                write(line);
            }
        }
        "DISASM" => {
            for line in session.disassemble(arg.as_deref())? {
                write(line);
            }
        }
        "NEW" => session.new_program(arg.as_deref())?,
        "LINK" => session.link(arg.as_deref(), false)?,
        "UNLINK" => session.unlink(arg.as_deref())?,
        "SHOW" if arg.as_deref().map(|a| a.eq_ignore_ascii_case("PROGRAM")) == Some(true) => {
            for name in session.context().registry.names() {
                let marker = if name == session.current_program() { "*" } else { " " };
                write(format!("{} {}", marker, name));
            }
        }
        "LOAD" => match arg {
            Some(file) => load(session, &file)?,
            None => return Err(error!(SyntaxError; "LOAD \"FILE\"")),
        },
        "SAVE" => match arg {
            Some(file) => std::fs::write(&file, session.save())
                .map_err(|e| error!(FileError; e.to_string()))?,
            None => return Err(error!(SyntaxError; "SAVE \"FILE\"")),
        },
        _ => session.enter(text)?,
    }
    Ok(true)
}

fn load(session: &mut Session, file: &str) -> Result<(), Error> {
    let text = std::fs::read_to_string(file).map_err(|e| error!(FileError; e.to_string()))?;
    session.load(&text)?;
    Ok(())
}

/// Bold error text, with the failing statement and a caret run under the
/// offending columns when the column is known.
fn report(
    command: &Interface<DefaultTerminal>,
    session: &Session,
    entered: &str,
    error: &Error,
) -> std::io::Result<()> {
    command.write_fmt(format_args!("{}\n", Style::new().bold().paint(error.to_string())))?;
    if error.column() == (0..0) {
        return Ok(());
    }
    let source = match error.line_number() {
        Some(number) => statement_text(session, number),
        None => Some(entered.trim().to_string()),
    };
    if let Some(source) = source {
        command.write_fmt(format_args!("{}\n", error.pointer(&source)))?;
    }
    Ok(())
}

fn statement_text(session: &Session, number: LineNumber) -> Option<String> {
    let program = session.context().registry.find(session.current_program())?;
    let program = program.lock();
    program.get(number).map(|s| s.line().text().to_string())
}

/// Tab after a line number recalls that line for editing.
struct LineCompleter {
    lines: BTreeMap<LineNumber, String>,
}

impl LineCompleter {
    fn new(session: &Session) -> LineCompleter {
        let mut lines = BTreeMap::new();
        if let Some(program) = session.context().registry.find(session.current_program()) {
            let program = program.lock();
            for line in Listing::source(&program) {
                let number = line
                    .split_whitespace()
                    .next()
                    .and_then(|n| n.parse::<LineNumber>().ok());
                if let Some(number) = number {
                    lines.insert(number, line);
                }
            }
        }
        LineCompleter { lines }
    }
}

impl<Term: Terminal> Completer<Term> for LineCompleter {
    fn complete(
        &self,
        _word: &str,
        prompter: &Prompter<Term>,
        _start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        let number = prompter.buffer().trim().parse::<LineNumber>().ok()?;
        let line = self.lines.get(&number)?;
        let mut completion = Completion::simple(line.clone());
        completion.suffix = linefeed::complete::Suffix::None;
        Some(vec![completion])
    }
}
