use super::session::Context;
use super::{
    Address, Executable, Flow, Frame, FrameKind, Function, Handler, HandlerStyle, Instruction,
    LoopKind, LoopMarker, Opcode, Operation, Returns, Scope, Signal, Stack, SymbolTable, Value,
    ValueType,
};
use super::{FileMode, ProgramKind, ThreadId};
use crate::error;
use crate::lang::Error;
use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Error>;

/// ## Virtual machine
///
/// One executor runs one thread of BASIC. It owns the operand stack and
/// the frame stack; each frame owns its loop markers and `ON` handlers.
/// Everything else is shared through the session context.

pub struct Executor {
    context: Arc<Context>,
    thread: ThreadId,
    abort: Arc<AtomicBool>,
    stack: Stack<Value>,
    frames: Stack<Frame>,
    pc: Address,
    result: Option<Value>,
}

impl Executor {
    pub fn new(context: Arc<Context>, thread: &str, abort: Arc<AtomicBool>) -> Executor {
        let max_stack = context.config.max_stack;
        let max_frames = context.config.max_frames;
        Executor {
            context,
            thread: thread.to_string(),
            abort,
            stack: Stack::new("OPERAND STACK OVERFLOW", max_stack),
            frames: Stack::new("TOO MANY NESTED CALLS", max_frames),
            pc: 0,
            result: None,
        }
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// Run a program to completion in `symbols`, returning the value of
    /// its final `RETURN`, if any.
    pub fn run(
        &mut self,
        program: Arc<Executable>,
        symbols: Arc<SymbolTable>,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        self.stack.clear();
        self.frames.clear();
        self.result = None;
        self.pc = 0;
        Executor::bind_params(&program, &symbols, args)?;
        self.frames
            .push(Frame::new(FrameKind::Program, program, symbols, 0, 0))?;
        let result = self.execute();
        self.frames.clear();
        self.stack.clear();
        if result.is_err() {
            self.context.files.close_owned(&self.thread);
        }
        result
    }

    fn execute(&mut self) -> Result<Option<Value>> {
        loop {
            let program = match self.frames.last() {
                Some(frame) => Arc::clone(&frame.program),
                None => return Ok(self.result.take()),
            };
            if self.abort.load(Ordering::SeqCst) {
                return Err(error!(Aborted, program.line_for(self.pc)));
            }
            let result = match program.get(self.pc) {
                None => self.return_from(None, true),
                Some(instruction) => {
                    if self.context.config.trace {
                        trace!("{} {}:{} {}", self.thread, program.name(), self.pc, instruction);
                    }
                    if instruction.resolved {
                        self.step(instruction)
                    } else {
                        Err(error!(InternalError; format!("UNRESOLVED {}", instruction)))
                    }
                }
            };
            match result.unwrap_or_else(|e| Flow::Unwind(Signal::from_error(e))) {
                Flow::Continue => self.pc += 1,
                Flow::Branch(addr) => self.pc = addr,
                Flow::Halt => return Ok(self.result.take()),
                Flow::Unwind(signal) => {
                    let signal = signal.in_line(program.line_for(self.pc));
                    self.unwind(signal)?;
                }
            }
        }
    }

    fn frame(&self) -> Result<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| error!(InternalError; "NO ACTIVE FRAME"))
    }

    fn frame_mut(&mut self) -> Result<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| error!(InternalError; "NO ACTIVE FRAME"))
    }

    fn symbols(&self) -> Result<Arc<SymbolTable>> {
        Ok(Arc::clone(&self.frame()?.symbols))
    }

    fn pop_string(&mut self) -> Result<String> {
        Ok(self.stack.pop()?.to_string())
    }

    fn target(instruction: &Instruction) -> Result<Address> {
        instruction
            .target()
            .ok_or_else(|| error!(InternalError; format!("UNRESOLVED {}", instruction)))
    }

    fn count(instruction: &Instruction) -> usize {
        instruction.int_operand.unwrap_or(0).max(0) as usize
    }

    fn step(&mut self, instruction: &Instruction) -> Result<Flow> {
        use Opcode::*;
        match instruction.opcode {
            Integer | Double | String | Boolean => match instruction.constant() {
                Some(value) => self.stack.push(value)?,
                None => return Err(error!(InternalError; "MISSING OPERAND")),
            },
            Load => {
                let name = instruction.name();
                match self.frame()?.symbols.lookup(name) {
                    Some(value) => self.stack.push(value)?,
                    None => return Err(error!(UnknownVariable; name)),
                }
            }
            Store => self.store(Scope::Local, instruction.name())?,
            StoreGlobal => self.store(Scope::Global, instruction.name())?,
            StoreParent => self.store(Scope::Parent, instruction.name())?,
            StoreCommon => self.store(Scope::Common, instruction.name())?,
            StoreConstant => self.store(Scope::Constant, instruction.name())?,
            Dup => {
                let top = self.stack.top()?;
                self.stack.push(top)?;
            }
            Drop => {
                self.stack.pop()?;
            }
            Array => {
                let items = self.stack.pop_n(Executor::count(instruction))?;
                self.stack.push(Value::Array(items))?;
            }
            Index => {
                let (container, index) = self.stack.pop_2()?;
                self.stack.push(Executor::index(container, index)?)?;
            }
            Convert => {
                let to = instruction
                    .convert_type()
                    .ok_or_else(|| error!(InternalError; "BAD CONVERSION"))?;
                let value = self.stack.pop()?;
                self.stack.push(value.convert(to)?)?;
            }
            Nop => {}
            Add | Sub | Mul | Div | Mod | Pow | Eq | Ne | Lt | Le | Gt | Ge => {
                let (lhs, rhs) = self.stack.pop_2()?;
                self.stack
                    .push(Operation::binary(instruction.opcode, lhs, rhs)?)?;
            }
            Neg => {
                let value = self.stack.pop()?;
                self.stack.push(Operation::negate(value)?)?;
            }
            Not => {
                let value = self.stack.pop()?;
                self.stack.push(Operation::not(value)?)?;
            }
            CallFn => return self.call_function(instruction),
            Branch => return Ok(Flow::Branch(Executor::target(instruction)?)),
            BranchFalse => {
                let target = Executor::target(instruction)?;
                if !self.stack.pop()?.is_true()? {
                    return Ok(Flow::Branch(target));
                }
            }
            BranchTrue => {
                let target = Executor::target(instruction)?;
                if self.stack.pop()?.is_true()? {
                    return Ok(Flow::Branch(target));
                }
            }
            Gosub => {
                let target = Executor::target(instruction)?;
                let frame = self.frame()?;
                let gosub = Frame::new(
                    FrameKind::Gosub,
                    Arc::clone(&frame.program),
                    Arc::clone(&frame.symbols),
                    self.pc + 1,
                    self.stack.len(),
                );
                self.frames.push(gosub)?;
                return Ok(Flow::Branch(target));
            }
            Return => return self.return_from(None, false),
            ReturnValue => {
                let value = self.stack.pop()?;
                return self.return_from(Some(value), false);
            }
            End => return self.return_from(None, true),
            Stop => {
                self.frames.clear();
                return Ok(Flow::Halt);
            }
            Do => {
                let end = Executor::target(instruction)?;
                self.enter_loop(LoopMarker::new(LoopKind::Do, self.pc, end))?;
            }
            For => return self.enter_for(instruction),
            ForEach => return self.enter_for_each(instruction),
            Loop | Next => {
                let start = Executor::target(instruction)?;
                let frame = self.frame_mut()?;
                match frame.find_loop(start) {
                    Some(idx) => frame.loops.truncate(idx + 1),
                    None => return Err(error!(NoActiveLoop; format!("{} WITHOUT ACTIVE LOOP", instruction.opcode))),
                }
                return self.iterate();
            }
            ContinueLoop => return self.iterate(),
            ExitLoop => return self.exit_loop(),
            ExitFalse => {
                if !self.stack.pop()?.is_true()? {
                    return self.exit_loop();
                }
            }
            ExitTrue => {
                if self.stack.pop()?.is_true()? {
                    return self.exit_loop();
                }
            }
            OnErrorGoto | OnErrorGosub => {
                let target = Executor::target(instruction)?;
                let name = self.pop_string()?.to_ascii_uppercase();
                let style = if instruction.opcode == OnErrorGoto {
                    HandlerStyle::Goto
                } else {
                    HandlerStyle::Gosub
                };
                self.frame_mut()?.register(Handler {
                    name,
                    style,
                    target,
                });
            }
            Signal => {
                let value = if instruction.int_operand == Some(1) {
                    Some(self.stack.pop()?)
                } else {
                    None
                };
                return Ok(Flow::Unwind(super::Signal::user(instruction.name(), value)));
            }
            Call | CallValue => {
                let args = self.stack.pop_n(Executor::count(instruction))?;
                let program = self
                    .context
                    .registry
                    .executable(instruction.name(), &self.context.linker())?;
                let returns = if instruction.opcode == CallValue {
                    Returns::Stack
                } else {
                    Returns::Discard
                };
                let symbols = SymbolTable::new(program.name(), &self.frame()?.symbols);
                return self.call(FrameKind::Call, program, symbols, args, returns);
            }
            CallThread => {
                let args = self.stack.pop_n(Executor::count(instruction))?;
                let program = self
                    .context
                    .registry
                    .executable(instruction.name(), &self.context.linker())?;
                let id = self.spawn(program, args)?;
                self.stack.push(Value::String(id))?;
            }
            Execute => {
                let text = self.pop_string()?;
                let program = self.context.immediate(&text)?;
                let symbols = self.symbols()?;
                return self.call(FrameKind::Call, program, symbols, vec![], Returns::Discard);
            }
            ExecuteThread => {
                let text = self.pop_string()?;
                let program = self.context.immediate(&text)?;
                let id = self.spawn(program, vec![])?;
                self.stack.push(Value::String(id))?;
            }
            Chain => return self.chain(instruction.name()),
            Lock => self.context.locks.lock(
                instruction.name(),
                &self.thread,
                &self.abort,
                self.context.config.lock_poll,
            )?,
            Unlock => self.context.locks.unlock(instruction.name(), &self.thread)?,
            Sleep => {
                let seconds = self.stack.pop()?.as_double()?;
                self.sleep(seconds)?;
            }
            KillThread => {
                let id = self.pop_string()?;
                self.context.threads.kill(&id)?;
            }
            ClearThreads => self.context.threads.join_all(&self.thread),
            Print => {
                let values = self.stack.pop_n(Executor::count(instruction))?;
                let s: std::string::String = values.iter().map(|v| v.to_string()).collect();
                self.context.console.print(&s);
            }
            Input => {
                let prompt = self.pop_string()?;
                let line = match self.context.console.read_line(&prompt) {
                    Some(line) => line,
                    None => return Err(error!(EndOfFile; "CONSOLE")),
                };
                let value = match instruction.int_operand.and_then(ValueType::from_code) {
                    Some(to) => Value::String(line).convert(to)?,
                    None => Executor::parse_input(line),
                };
                self.stack.push(value)?;
            }
            OpenFile => {
                let mode = instruction
                    .int_operand
                    .and_then(FileMode::from_code)
                    .ok_or_else(|| error!(InternalError; "BAD FILE MODE"))?;
                let handle = self.stack.pop()?.as_integer()?;
                let path = self.pop_string()?;
                self.context
                    .files
                    .open(handle, &path, mode, &self.thread)?;
            }
            CloseFile => {
                let handle = self.stack.pop()?.as_integer()?;
                self.context.files.close(handle)?;
            }
            PrintFile => {
                let values = self.stack.pop_n(Executor::count(instruction))?;
                let handle = self.stack.pop()?.as_integer()?;
                let s: std::string::String = values.iter().map(|v| v.to_string()).collect();
                self.context.files.write(handle, &s)?;
            }
            ReadLine => {
                let handle = self.stack.pop()?.as_integer()?;
                let line = self.context.files.read_line(handle)?;
                self.stack.push(Value::String(line))?;
            }
        }
        Ok(Flow::Continue)
    }

    fn store(&mut self, scope: Scope, name: &str) -> Result<()> {
        let value = self.stack.pop()?;
        self.frame()?.symbols.insert(scope, name, value)
    }

    fn index(container: Value, index: Value) -> Result<Value> {
        let i = index.as_integer()?;
        if i < 1 {
            return Err(error!(SubscriptOutOfRange));
        }
        let i = (i - 1) as usize;
        match container {
            Value::Array(mut items) => {
                if i < items.len() {
                    Ok(items.swap_remove(i))
                } else {
                    Err(error!(SubscriptOutOfRange))
                }
            }
            Value::String(s) => match s.chars().nth(i) {
                Some(c) => Ok(Value::String(c.to_string())),
                None => Err(error!(SubscriptOutOfRange)),
            },
            _ => Err(error!(TypeMismatch; "NOT AN ARRAY")),
        }
    }

    fn parse_input(line: String) -> Value {
        let trimmed = line.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            Value::Integer(n)
        } else if let Ok(n) = trimmed.parse::<f64>() {
            Value::Double(n)
        } else {
            Value::String(line)
        }
    }

    fn bind_params(program: &Executable, symbols: &SymbolTable, args: Vec<Value>) -> Result<()> {
        if args.len() < program.params().len() {
            return Err(error!(ArgumentCount; format!(
                "{} EXPECTS {}",
                program.name(),
                program.params().len()
            )));
        }
        for (name, value) in program.params().iter().zip(args.iter()) {
            let value = match ValueType::for_name(name) {
                Some(to) => value.convert(to)?,
                None => value.clone(),
            };
            symbols.insert_local(name, value)?;
        }
        symbols.insert_system("$ARGS", Value::Array(args));
        Ok(())
    }

    fn call(
        &mut self,
        kind: FrameKind,
        program: Arc<Executable>,
        symbols: Arc<SymbolTable>,
        args: Vec<Value>,
        returns: Returns,
    ) -> Result<Flow> {
        if !Arc::ptr_eq(&symbols, &self.frame()?.symbols) {
            Executor::bind_params(&program, &symbols, args)?;
        }
        let frame = Frame::new(kind, program, symbols, self.pc + 1, self.stack.len());
        self.frames.push(frame.returning(returns))?;
        Ok(Flow::Branch(0))
    }

    fn call_function(&mut self, instruction: &Instruction) -> Result<Flow> {
        let name = instruction.name();
        let args = self.stack.pop_n(Executor::count(instruction))?;
        if Function::is_builtin(name) {
            let value = Function::call(name, args, &self.thread)?;
            self.stack.push(value)?;
            return Ok(Flow::Continue);
        }
        if self.context.registry.find_kind(name, ProgramKind::Function).is_none() {
            return Err(error!(UnknownFunction; name));
        }
        let qualified = format!("{}{}", ProgramKind::Function.prefix(), name);
        let program = self
            .context
            .registry
            .executable(&qualified, &self.context.linker())?;
        let symbols = SymbolTable::new(program.name(), &self.frame()?.symbols);
        self.call(FrameKind::Function, program, symbols, args, Returns::Stack)
    }

    /// `RETURN` pops one frame. `END` and running off the end of the code
    /// first discard any `GOSUB` frames of the current program.
    fn return_from(&mut self, value: Option<Value>, end: bool) -> Result<Flow> {
        if end {
            while self.frame()?.kind.is_subroutine() {
                self.frames.pop()?;
            }
        }
        let frame = self.frames.pop()?;
        self.stack.truncate(frame.stack_base);
        if frame.kind.is_subroutine() {
            return Ok(Flow::Branch(frame.return_pc));
        }
        if self.frames.is_empty() {
            self.result = value;
            return Ok(Flow::Halt);
        }
        if frame.returns == Returns::Stack {
            match value {
                Some(value) => self.stack.push(value)?,
                None => return Err(error!(NoReturnValue; frame.program.name())),
            }
        }
        Ok(Flow::Branch(frame.return_pc))
    }

    fn enter_loop(&mut self, marker: LoopMarker) -> Result<()> {
        let frame = self.frame_mut()?;
        // A loop entered again from the top replaces its stale marker.
        if let Some(idx) = frame.find_loop(marker.start) {
            frame.loops.truncate(idx);
        }
        frame.loops.push(marker);
        Ok(())
    }

    fn for_continues(current: &Value, limit: &Value, step: &Value) -> Result<bool> {
        if Operation::less_bool(step, &Value::Integer(0))? {
            Ok(!Operation::less_bool(current, limit)?)
        } else {
            Ok(!Operation::less_bool(limit, current)?)
        }
    }

    fn enter_for(&mut self, instruction: &Instruction) -> Result<Flow> {
        let end = Executor::target(instruction)?;
        let (limit, step) = self.stack.pop_2()?;
        let var = instruction.name();
        let current = match self.frame()?.symbols.lookup(var) {
            Some(v) => v,
            None => return Err(error!(UnknownVariable; var)),
        };
        if !Executor::for_continues(&current, &limit, &step)? {
            let pc = self.pc;
            let frame = self.frame_mut()?;
            if let Some(idx) = frame.find_loop(pc) {
                frame.loops.truncate(idx);
            }
            return Ok(Flow::Branch(end));
        }
        let mut marker = LoopMarker::new(LoopKind::For, self.pc, end);
        marker.var = Some(var.to_string());
        marker.limit = limit;
        marker.step = step;
        self.enter_loop(marker)?;
        Ok(Flow::Continue)
    }

    fn enter_for_each(&mut self, instruction: &Instruction) -> Result<Flow> {
        let end = Executor::target(instruction)?;
        let items = match self.stack.pop()? {
            Value::Array(items) => items,
            other => vec![other],
        };
        let var = instruction.name();
        match items.first() {
            Some(first) => self.frame()?.symbols.insert_local(var, first.clone())?,
            None => return Ok(Flow::Branch(end)),
        }
        let mut marker = LoopMarker::new(LoopKind::ForEach, self.pc, end);
        marker.var = Some(var.to_string());
        marker.items = items;
        self.enter_loop(marker)?;
        Ok(Flow::Continue)
    }

    /// Advance the innermost loop: back to the top of the body, or out.
    fn iterate(&mut self) -> Result<Flow> {
        let frame = self.frame_mut()?;
        let symbols = Arc::clone(&frame.symbols);
        let marker = match frame.loops.last_mut() {
            Some(m) => m,
            None => return Err(error!(NoActiveLoop)),
        };
        let var = marker.var.clone().unwrap_or_default();
        let again = match marker.kind {
            LoopKind::Do => true,
            LoopKind::For => {
                let current = match symbols.lookup(&var) {
                    Some(v) => v,
                    None => return Err(error!(UnknownVariable; var)),
                };
                let next = Operation::sum(current, marker.step.clone())?;
                let again = Executor::for_continues(&next, &marker.limit, &marker.step)?;
                symbols.insert_local(&var, next)?;
                again
            }
            LoopKind::ForEach => {
                marker.index += 1;
                match marker.items.get(marker.index) {
                    Some(item) => {
                        symbols.insert_local(&var, item.clone())?;
                        true
                    }
                    None => false,
                }
            }
        };
        if again {
            Ok(Flow::Branch(marker.start + 1))
        } else {
            let end = marker.end;
            frame.loops.pop();
            Ok(Flow::Branch(end))
        }
    }

    fn exit_loop(&mut self) -> Result<Flow> {
        match self.frame_mut()?.loops.pop() {
            Some(marker) => Ok(Flow::Branch(marker.end)),
            None => Err(error!(NoActiveLoop)),
        }
    }

    /// Search frames innermost first for a handler. Without one the
    /// signal ends the thread.
    fn unwind(&mut self, signal: Signal) -> Result<()> {
        if !signal.is_fatal() {
            for k in (0..self.frames.len()).rev() {
                let handler = self.frames.get(k).and_then(|f| {
                    f.handlers
                        .iter()
                        .rev()
                        .find(|h| signal.matches(&h.name))
                        .cloned()
                });
                if let Some(handler) = handler {
                    return self.dispatch(k, handler, &signal);
                }
            }
        }
        Err(signal.into_error())
    }

    fn dispatch(&mut self, k: usize, handler: Handler, signal: &Signal) -> Result<()> {
        let top = self.frames.len() - 1;
        let (return_pc, base) = if k == top {
            let frame = self.frame()?;
            (frame.program.next_statement(self.pc), frame.stack_base)
        } else {
            // A callee whose value an expression is waiting for can't be
            // resumed mid-statement; continue after the caller's statement.
            match (self.frames.get(k), self.frames.get(k + 1)) {
                (Some(frame), Some(above)) if above.returns == Returns::Stack => (
                    frame.program.next_statement(above.return_pc.saturating_sub(1)),
                    above.stack_base,
                ),
                (_, Some(above)) => (above.return_pc, above.stack_base),
                _ => return Err(error!(InternalError; "LOST FRAME")),
            }
        };
        self.frames.truncate(k + 1);
        let frame = self.frame_mut()?;
        frame
            .symbols
            .insert_system("$STATUS", Value::String(signal.name().to_string()));
        frame.symbols.insert_system("$STATUS_ARG", signal.argument());
        let target = handler.target;
        match handler.style {
            HandlerStyle::Goto => {
                frame.loops.retain(|m| m.start < target && target < m.end);
                let stack_base = frame.stack_base;
                self.stack.truncate(stack_base);
            }
            HandlerStyle::Gosub => {
                let program = Arc::clone(&frame.program);
                let symbols = Arc::clone(&frame.symbols);
                self.stack.truncate(base);
                self.frames.push(Frame::new(
                    FrameKind::Handler,
                    program,
                    symbols,
                    return_pc,
                    base,
                ))?;
            }
        }
        self.pc = target;
        Ok(())
    }

    /// Start `program` on its own thread. It gets a fresh table holding
    /// copies of the caller's `COMMON` variables.
    fn spawn(&self, program: Arc<Executable>, args: Vec<Value>) -> Result<ThreadId> {
        let context = Arc::clone(&self.context);
        let commons = self.frame()?.symbols.common_entries();
        self.context.threads.spawn(move |id, abort| {
            let symbols = SymbolTable::new(program.name(), &context.globals);
            for (name, value) in commons {
                symbols.insert_common(&name, value)?;
            }
            let mut executor = Executor::new(Arc::clone(&context), &id, abort);
            let result = executor.run(program, symbols, args);
            context.locks.release_all(&id);
            context.files.close_owned(&id);
            result.map(|_| ())
        })
    }

    /// Replace everything this thread is running with another program,
    /// carrying `COMMON` variables across.
    fn chain(&mut self, name: &str) -> Result<Flow> {
        let program = self
            .context
            .registry
            .executable(name, &self.context.linker())?;
        let commons = self.frame()?.symbols.common_entries();
        let symbols = SymbolTable::new(program.name(), &self.context.globals);
        for (name, value) in commons {
            symbols.insert_common(&name, value)?;
        }
        self.frames.clear();
        self.stack.clear();
        self.frames
            .push(Frame::new(FrameKind::Program, program, symbols, 0, 0))?;
        Ok(Flow::Branch(0))
    }

    fn sleep(&self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(error!(Overflow; "INVALID SLEEP"));
        }
        let deadline = Instant::now() + Duration::from_secs_f64(seconds);
        let poll = self.context.config.lock_poll;
        loop {
            if self.abort.load(Ordering::SeqCst) {
                return Err(error!(Aborted));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(poll.min(deadline - now));
        }
    }
}
