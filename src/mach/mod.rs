/*!
## Rust Machine Module

This Rust module is the bytecode substrate for BASIC: the instruction
stream that statement compilers emit into, the linker and optimizer that
turn per-statement fragments into one executable, and the virtual
machine that runs it.

*/

pub type Address = usize;

mod bytecode;
mod console;
mod files;
mod frame;
mod function;
mod instruction;
mod link;
mod listing;
mod opcode;
mod operation;
mod optimize;
mod program;
mod registry;
mod runtime;
mod session;
mod signal;
mod stack;
mod symbols;
mod thread;
mod value;

pub use bytecode::ByteCode;
pub use bytecode::Mark;
pub use console::{BufferConsole, Console};
pub use files::{FileMode, FileTable};
pub use frame::{Frame, FrameKind, LoopKind, LoopMarker, Returns};
pub use function::Function;
pub use instruction::Instruction;
pub use link::{Executable, Linker};
pub use listing::Listing;
pub use opcode::Opcode;
pub use operation::Operation;
pub use optimize::Optimizer;
pub use program::{Program, ProgramKind, Statement};
pub use registry::ProgramRegistry;
pub use runtime::Executor;
pub use session::{Config, Context, Session};
pub use signal::{Flow, Handler, HandlerStyle, Signal};
pub use stack::Stack;
pub use symbols::{Scope, SymbolTable};
pub use thread::{LockRegistry, ThreadId, ThreadStatus, ThreadTable};
pub use value::{Value, ValueType};

#[cfg(test)]
mod tests;
