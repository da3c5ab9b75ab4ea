//! Core error types for the Slate toolchain.
//!
//! All failures share one closed [`ErrorKind`] enumeration and one error
//! value, [`LangError`]. Every error carries a primary [`SourceInfo`] span
//! and an optional chained cause; branch-reconciliation failures and
//! `Reporting` wrappers use the chain to point at both the offending value
//! and the construct that required it.
//!
//! Errors are fatal to the current compilation. The driver formats a single
//! diagnostic (see [`crate::diagnostic`]) and returns a non-zero exit code.

use crate::span::SourceInfo;
use std::fmt;
use thiserror::Error;

/// The closed set of error kinds produced by the toolchain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized lexical or semantic token
    UnknownToken,
    /// Structural violation: mismatched `end`, malformed `proc`/`macro`/`memory`
    InvalidSyntax,
    /// Type mismatch
    InvalidType,
    /// Stack underflow at type-check time
    NotEnoughTokens,
    /// Duplicate name in the symbol table
    SymbolRedefined,
    /// Include path not found
    FileError,
    /// Branch reconciliation: one branch dropped a value
    MissingToken,
    /// Branch reconciliation: one branch pushed an extra value
    AddedToken,
    /// Residual data on the stack at program end
    StackNotEmpty,
    /// Residual data on the stack inside a `proc` body
    ProcedureError,
    /// Chained cause anchored at an `if` branch
    IfException,
    /// Chained cause anchored at an `elif` branch
    ElifException,
    /// Chained cause anchored at an `else` branch
    ElseException,
    /// Chained cause anchored at a `while` loop
    WhileException,
    /// Wrapper attaching a secondary span to another error
    Reporting,
    /// Fault raised by an engine while executing the program
    RuntimeError,
}

impl ErrorKind {
    /// Stable name used in rendered diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::UnknownToken => "UnknownToken",
            ErrorKind::InvalidSyntax => "InvalidSyntax",
            ErrorKind::InvalidType => "InvalidType",
            ErrorKind::NotEnoughTokens => "NotEnoughTokens",
            ErrorKind::SymbolRedefined => "SymbolRedefined",
            ErrorKind::FileError => "FileError",
            ErrorKind::MissingToken => "MissingToken",
            ErrorKind::AddedToken => "AddedToken",
            ErrorKind::StackNotEmpty => "StackNotEmpty",
            ErrorKind::ProcedureError => "ProcedureError",
            ErrorKind::IfException => "IfException",
            ErrorKind::ElifException => "ElifException",
            ErrorKind::ElseException => "ElseException",
            ErrorKind::WhileException => "WhileException",
            ErrorKind::Reporting => "Reporting",
            ErrorKind::RuntimeError => "RuntimeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fatal toolchain error with a primary span and an optional cause chain
#[derive(Clone, Debug, Error)]
#[error("{kind}: {message}")]
pub struct LangError {
    /// What class of failure this is
    pub kind: ErrorKind,
    /// Primary location
    pub info: SourceInfo,
    /// Human-readable message (may be empty for pure chain anchors)
    pub message: String,
    /// The chained cause, if any
    #[source]
    pub cause: Option<Box<LangError>>,
}

impl LangError {
    /// Create a new error without a cause
    pub fn new(kind: ErrorKind, info: SourceInfo, message: impl Into<String>) -> Self {
        Self {
            kind,
            info,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a cause to this error
    pub fn with_cause(mut self, cause: LangError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Walk the cause chain, newest (outermost) first
    pub fn chain(&self) -> impl Iterator<Item = &LangError> {
        std::iter::successors(Some(self), |err| err.cause.as_deref())
    }

    /// Returns true if `kind` occurs anywhere in the chain
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.chain().any(|err| err.kind == kind)
    }

    pub fn unknown_token(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownToken, info, message)
    }

    pub fn invalid_syntax(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSyntax, info, message)
    }

    pub fn invalid_type(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidType, info, message)
    }

    pub fn not_enough_tokens(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotEnoughTokens, info, message)
    }

    pub fn symbol_redefined(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SymbolRedefined, info, message)
    }

    pub fn file_error(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileError, info, message)
    }

    pub fn runtime(info: SourceInfo, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, info, message)
    }

    /// `Reporting` wrapper: a secondary span pointing at `cause`
    pub fn reporting(info: SourceInfo, message: impl Into<String>, cause: LangError) -> Self {
        Self::new(ErrorKind::Reporting, info, message).with_cause(cause)
    }
}

/// Result alias used across the toolchain
pub type LangResult<T> = Result<T, LangError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order() {
        let inner = LangError::invalid_type(SourceInfo::dummy(), "invalid type for `+`");
        let outer = LangError::reporting(SourceInfo::dummy(), "int must be bool", inner);
        let kinds: Vec<_> = outer.chain().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::Reporting, ErrorKind::InvalidType]);
    }

    #[test]
    fn test_has_kind() {
        let inner = LangError::new(ErrorKind::IfException, SourceInfo::dummy(), "");
        let outer = LangError::new(ErrorKind::AddedToken, SourceInfo::dummy(), "was added")
            .with_cause(inner);
        assert!(outer.has_kind(ErrorKind::IfException));
        assert!(!outer.has_kind(ErrorKind::WhileException));
    }

    #[test]
    fn test_display() {
        let err = LangError::unknown_token(SourceInfo::dummy(), "is not a recognized symbol");
        assert_eq!(err.to_string(), "UnknownToken: is not a recognized symbol");
    }
}
