use parking_lot::Mutex;
use std::collections::VecDeque;

/// ## Console device
///
/// Where `PRINT` writes and `INPUT` reads. Shared by every thread of a
/// session.

pub trait Console: Send + Sync {
    fn print(&self, s: &str);
    /// `None` when no more input is available.
    fn read_line(&self, prompt: &str) -> Option<String>;
}

/// Collects output in memory and answers input from a queue.
#[derive(Debug, Default)]
pub struct BufferConsole {
    output: Mutex<String>,
    input: Mutex<VecDeque<String>>,
}

impl BufferConsole {
    pub fn new() -> BufferConsole {
        BufferConsole::default()
    }

    pub fn push_input<S: Into<String>>(&self, line: S) {
        self.input.lock().push_back(line.into());
    }

    pub fn output(&self) -> String {
        self.output.lock().clone()
    }

    /// Returns and clears everything printed so far.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.output.lock())
    }
}

impl Console for BufferConsole {
    fn print(&self, s: &str) {
        self.output.lock().push_str(s);
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        self.print(prompt);
        let line = self.input.lock().pop_front();
        if let Some(line) = &line {
            self.print(line);
            self.print("\n");
        }
        line
    }
}
