//! slc-par - Parsing and flow resolution for Slate.
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! This crate turns the lexical token stream into the *intermediate token
//! list*: a dense, position-indexed sequence of resolved instructions with
//! all block structure linked and all preprocessing constructs expanded.
//!
//! - [`Op`] is the closed instruction enumeration (~80 kinds).
//! - [`Token`] couples an `Op` with its [`slc_util::SourceInfo`] and, for
//!   flow tokens, an index-based [`FlowInfo`] linkage.
//! - [`Program`] owns the instruction list and the symbol table and drives
//!   parsing; after [`Program::parse`] returns, both are read-only.
//! - [`Engine`] is the contract through which the driver hands the finished
//!   program to an interpreter or emitter.
//!
//! Ordering guarantees: tokens are appended in strict source-traversal order
//! with includes inlined at their `include` token; `position` is a dense
//! index that every region splice renormalizes, so `list[t.position] == t`
//! always holds.

mod engine;
mod op;
mod program;
mod symbols;
pub mod tables;
mod token;
mod types;

pub use engine::{Engine, Step};
pub use op::Op;
pub use program::Program;
pub use symbols::{MacroDef, MemoryDef, ProcArg, ProcOut, Procedure, SymbolDef};
pub use token::{Binding, FlowInfo, InsnIdx, Token};
pub use types::TypeDesc;
