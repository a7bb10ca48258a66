use super::{Address, Executable, Handler, SymbolTable, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// The outermost program of a thread.
    Program,
    /// `CALL` or `EXECUTE`.
    Call,
    /// A `FUNCTION` program invoked from an expression.
    Function,
    Gosub,
    /// An `ON … GOSUB` handler invocation.
    Handler,
}

impl FrameKind {
    /// Gosub and handler frames run inside their caller's program.
    pub fn is_subroutine(self) -> bool {
        matches!(self, FrameKind::Gosub | FrameKind::Handler)
    }
}

/// Where a returning program's value goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    Discard,
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Do,
    For,
    ForEach,
}

/// ## Active loop
///
/// Pushed when an opener is entered, popped when the loop finishes or is
/// left with `END LOOP`. `start` is the opener's offset and `end` the
/// offset just past the closer.

#[derive(Debug, Clone, PartialEq)]
pub struct LoopMarker {
    pub kind: LoopKind,
    pub start: Address,
    pub end: Address,
    pub var: Option<String>,
    pub limit: Value,
    pub step: Value,
    pub items: Vec<Value>,
    pub index: usize,
}

impl LoopMarker {
    pub fn new(kind: LoopKind, start: Address, end: Address) -> LoopMarker {
        LoopMarker {
            kind,
            start,
            end,
            var: None,
            limit: Value::Integer(0),
            step: Value::Integer(1),
            items: vec![],
            index: 0,
        }
    }
}

/// Counts an executor as running a program for as long as it lives.
#[derive(Debug)]
struct ActiveGuard(Arc<Executable>);

impl ActiveGuard {
    fn new(program: &Arc<Executable>) -> ActiveGuard {
        program.active_counter().fetch_add(1, Ordering::SeqCst);
        ActiveGuard(Arc::clone(program))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active_counter().fetch_sub(1, Ordering::SeqCst);
    }
}

/// ## Call frame

#[derive(Debug)]
pub struct Frame {
    pub program: Arc<Executable>,
    pub symbols: Arc<SymbolTable>,
    pub handlers: Vec<Handler>,
    pub loops: Vec<LoopMarker>,
    pub return_pc: Address,
    pub returns: Returns,
    pub kind: FrameKind,
    pub stack_base: usize,
    _active: Option<ActiveGuard>,
}

impl Frame {
    pub fn new(
        kind: FrameKind,
        program: Arc<Executable>,
        symbols: Arc<SymbolTable>,
        return_pc: Address,
        stack_base: usize,
    ) -> Frame {
        let active = if kind.is_subroutine() {
            None
        } else {
            Some(ActiveGuard::new(&program))
        };
        Frame {
            program,
            symbols,
            handlers: vec![],
            loops: vec![],
            return_pc,
            returns: Returns::Discard,
            kind,
            stack_base,
            _active: active,
        }
    }

    pub fn returning(mut self, returns: Returns) -> Frame {
        self.returns = returns;
        self
    }

    /// Replaces any earlier handler for the same name.
    pub fn register(&mut self, handler: Handler) {
        self.handlers.retain(|h| h.name != handler.name);
        self.handlers.push(handler);
    }

    pub fn find_loop(&self, start: Address) -> Option<usize> {
        self.loops.iter().rposition(|m| m.start == start)
    }
}
