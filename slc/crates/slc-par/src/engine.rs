//! The engine contract.
//!
//! The front end hands a fully parsed, type-checked [`crate::Program`] to an
//! engine — an interpreter, a code emitter, a tracer. The engine sees one
//! token per step and answers with a relative jump; the driver loop in
//! [`crate::Program::run`] owns the instruction pointer.

use slc_util::LangResult;

use crate::program::Program;
use crate::token::InsnIdx;

/// What an engine wants after one step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Advance to `current + 1 + skip`; `skip` may be negative (loops) and
    /// is 0 for straight-line execution
    Skip(i64),
    /// Terminate the program with the given exit code
    Exit(i64),
}

/// A consumer of the fully parsed, type-checked program
pub trait Engine {
    /// Called once before the first step
    fn before(&mut self, program: &Program) -> LangResult<()>;

    /// Execute (or otherwise process) the token at `idx`
    fn step(&mut self, program: &Program, idx: InsnIdx) -> LangResult<Step>;

    /// Called once after the last step, including on [`Step::Exit`]
    fn close(&mut self, program: &Program) -> LangResult<()>;

    /// Whether a top-level `exit` was reached; a program that runs off its
    /// end without one did not exit properly
    fn exited(&self) -> bool;
}
