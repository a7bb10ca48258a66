//! # BASIC
//!
//! A BASIC dialect compiled statement by statement into stack machine
//! bytecode, linked into one executable per program and run by a virtual
//! machine with signals and cooperative threads.
//!
//! ```text
//! 100 FOR I = 1 TO 3
//! 110   PRINT "HELLO "; I
//! 120 NEXT I
//! RUN
//! ```
//!
//! The `lang` module tokenizes source lines, `stmt` compiles them into
//! fragments, and `mach` links and executes the fragments.

pub mod lang;
pub mod mach;
pub mod stmt;
pub mod term;
