//! slc-util - Shared infrastructure for the Slate toolchain.
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! Every phase of the toolchain (lexer, parser, type checker, engines) shares
//! a small set of concerns that live here:
//!
//! 1. SOURCE TRACKING
//!    Spans, file identities and the source map. Every token and every error
//!    carries a [`SourceInfo`], which also records the include or macro call
//!    site that produced it, so diagnostics can walk back to the user's code.
//!
//! 2. ERROR TAXONOMY
//!    One closed [`ErrorKind`] enumeration plus [`LangError`], a chainable
//!    error value. All failures in the toolchain are fatal to the current
//!    compilation; there is no recovery and no multi-error collection.
//!
//! 3. DIAGNOSTIC RENDERING
//!    A plain-text renderer that prints the error chain newest-first with
//!    file/line/caret snippets pulled from the [`SourceMap`].
//!
//! 4. STRING INTERNING
//!    [`Symbol`], a 4-byte handle into a global string table. Identifiers,
//!    macro/procedure/memory names and local bindings are all symbols, which
//!    makes name comparison an integer compare.
//!
//! 5. TYPED INDICES
//!    [`IndexVec`] and the [`define_idx!`] macro. The instruction list is
//!    indexed by a dedicated index type, and all flow linkage between tokens
//!    is expressed as indices rather than owning references, so the list is
//!    the sole owner of every token.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{render, Level};
pub use error::{ErrorKind, LangError, LangResult};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceInfo, SourceMap, Span};
pub use symbol::Symbol;

// Re-export commonly used hash collections
pub use rustc_hash::{FxHashMap, FxHashSet};
