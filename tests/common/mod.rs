#![allow(dead_code)]

use basic::mach::{BufferConsole, Config, Session};
use std::sync::Arc;

pub fn session() -> (Session, Arc<BufferConsole>) {
    let console = Arc::new(BufferConsole::new());
    let session = Session::new(Config::default(), console.clone());
    (session, console)
}

/// Load `source` into a fresh session and run its first program.
/// Returns what it printed, followed by the error that ended it, if any.
pub fn run(source: &str) -> String {
    let (mut session, console) = session();
    run_in(&mut session, &console, source)
}

pub fn run_in(session: &mut Session, console: &BufferConsole, source: &str) -> String {
    let result = session.load(source).and_then(|_| session.run(None));
    let mut s = console.take_output();
    if let Err(error) = result {
        s.push_str(&format!("?{}\n", error));
    }
    s
}

/// Run `text` as immediate statements.
pub fn exec(session: &mut Session, console: &BufferConsole, text: &str) -> String {
    let result = session.enter(text);
    let mut s = console.take_output();
    if let Err(error) = result {
        s.push_str(&format!("?{}\n", error));
    }
    s
}
