//! slc-sem - Static stack-effect checking for Slate.
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The type checker simulates the operand stack abstractly over the linear
//! instruction list. Every stack slot is an [`Entry`]: the type of the value
//! together with the source location of the token that produced it, so every
//! mismatch can point at both the operator and the offending value.
//!
//! Control flow is reconciled with snapshots:
//!
//! - at `if`/`while`/`proc` the current stack is saved as the *origin* of the
//!   block and as the reference snapshot for its first branch;
//! - `elif`/`else` compare the finished branch against the previous branch's
//!   snapshot and restart from the origin;
//! - `end` compares the final branch, requires `while` bodies to restore the
//!   loop entry stack, and requires `proc` bodies to leave exactly the
//!   declared outputs.
//!
//! A program is accepted only if the stack is empty when the walk finishes;
//! memory declarations are verified separately (their body must evaluate to
//! a single `int`).

mod checker;

pub use checker::{check, Checker, Entry};
