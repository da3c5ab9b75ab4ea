//! Span module - Source location tracking.
//!
//! This module provides types for representing source code locations:
//! byte offsets, line/column information, file identification, and the
//! provenance chain used for tokens that were produced by an `include`
//! or a macro expansion.

mod source_map;

pub use source_map::{SourceFile, SourceMap};

use static_assertions::const_assert;
use std::sync::Arc;

// Spans are stored on every token; keep them copyable and small.
const_assert!(std::mem::size_of::<Span>() <= 48);

/// A unique identifier for a source file
///
/// FileIds are assigned sequentially as files are added to the [`SourceMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

impl FileId {
    /// Create a new FileId
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw index value
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// A dummy FileId for testing
    pub const DUMMY: FileId = FileId(usize::MAX);
}

impl Default for FileId {
    #[inline]
    fn default() -> Self {
        Self::DUMMY
    }
}

/// Source location span
///
/// A `Span` represents a range in source code, identified by:
/// - Byte offsets (start, end)
/// - Line and column numbers of the start (1-based, for human-readable output)
/// - File ID (for multi-file compilations with includes)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset in source
    pub start: usize,
    /// End byte offset in source
    pub end: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub column: u32,
    /// File identifier
    pub file_id: FileId,
}

impl Span {
    /// Dummy span for testing
    pub const DUMMY: Span = Span {
        start: 0,
        end: 0,
        line: 0,
        column: 0,
        file_id: FileId::DUMMY,
    };

    /// Create a new span
    #[inline]
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
            file_id: FileId::DUMMY,
        }
    }

    /// Create a new span associated with a specific file
    #[inline]
    pub fn with_file(start: usize, end: usize, file_id: FileId, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
            file_id,
        }
    }

    /// Returns true if this span is empty (start == end)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the length of the span in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Merge two spans into a single span covering both
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: if self.start <= other.start {
                self.column
            } else {
                other.column
            },
            file_id: self.file_id,
        }
    }
}

/// Provenance record attached to every token and every error.
///
/// `span` is the location of the token itself. `parent` points at the
/// location that *produced* the token: the `include` token for tokens of an
/// included file, or the call-site word for tokens coming out of a macro
/// expansion. Walking `parent` transitively always ends at a span written by
/// the user, which is what nested-error traces print.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceInfo {
    /// Location of the token in its own file
    pub span: Span,
    /// Include or expansion site that produced this token, if any
    pub parent: Option<Arc<SourceInfo>>,
}

impl SourceInfo {
    /// Create a source info with no provenance parent
    #[inline]
    pub fn new(span: Span) -> Self {
        Self { span, parent: None }
    }

    /// Create a source info produced by `parent` (include or macro call site)
    #[inline]
    pub fn nested(span: Span, parent: SourceInfo) -> Self {
        Self {
            span,
            parent: Some(Arc::new(parent)),
        }
    }

    /// A dummy info for synthesized tokens and tests
    pub fn dummy() -> Self {
        Self::new(Span::DUMMY)
    }

    /// Iterate the provenance chain, starting at this info
    pub fn chain(&self) -> impl Iterator<Item = &SourceInfo> {
        std::iter::successors(Some(self), |info| info.parent.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new() {
        let span = Span::new(10, 20, 1, 5);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
        assert_eq!(span.line, 1);
        assert_eq!(span.column, 5);
    }

    #[test]
    fn test_span_len() {
        let span = Span::new(10, 20, 1, 5);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(Span::new(10, 10, 1, 5).is_empty());
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(10, 20, 1, 5);
        let b = Span::new(25, 35, 2, 3);
        let merged = a.merge(b);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 35);
        assert_eq!(merged.column, 5);
    }

    #[test]
    fn test_source_info_chain() {
        let root = SourceInfo::new(Span::new(0, 7, 1, 1));
        let child = SourceInfo::nested(Span::new(3, 5, 2, 1), root.clone());
        let chain: Vec<_> = child.chain().collect();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].span, root.span);
    }
}
