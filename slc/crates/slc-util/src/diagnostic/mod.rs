//! Diagnostic module - rendering fatal errors for humans.
//!
//! The toolchain aborts on the first error, so there is no diagnostic
//! collection here; the single [`LangError`] chain is rendered newest-first.
//! For each link the renderer prints the error-kind name, the message, the
//! file path with line number, the raw source line and a caret underlining
//! the span. Tokens that came out of an `include` or a macro expansion also
//! print their provenance chain as `note: included from ...` lines.

use crate::error::LangError;
use crate::span::{SourceInfo, SourceMap, Span};
use std::fmt;
use std::fmt::Write;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that aborts the compilation
    Error,
    /// Additional information about a diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// Render a full error chain against the given sources
pub fn render(err: &LangError, sources: &SourceMap) -> String {
    let mut out = String::new();
    for (depth, link) in err.chain().enumerate() {
        let level = if depth == 0 { Level::Error } else { Level::Note };
        render_one(&mut out, level, link, sources);
    }
    out
}

fn render_one(out: &mut String, level: Level, err: &LangError, sources: &SourceMap) {
    if err.message.is_empty() {
        let _ = writeln!(out, "{}[{}]", level, err.kind.name());
    } else {
        let _ = writeln!(out, "{}[{}]: {}", level, err.kind.name(), err.message);
    }
    render_snippet(out, &err.info, sources);
    for site in err.info.chain().skip(1) {
        let _ = writeln!(out, "note: included from");
        render_snippet(out, &SourceInfo::new(site.span), sources);
    }
}

fn render_snippet(out: &mut String, info: &SourceInfo, sources: &SourceMap) {
    let span = info.span;
    let Some(file) = sources.file_of(span) else {
        return;
    };
    let _ = writeln!(out, "  --> {}:{}:{}", file.name(), span.line, span.column);
    let Some(line) = file.line_text(span.line) else {
        return;
    };
    let gutter = format!("{:>4}", span.line);
    let _ = writeln!(out, "{} |", " ".repeat(gutter.len()));
    let _ = writeln!(out, "{} | {}", gutter, line);
    let caret_pad = span.column.saturating_sub(1) as usize;
    let caret_len = caret_width(span, line, caret_pad);
    let _ = writeln!(
        out,
        "{} | {}{}",
        " ".repeat(gutter.len()),
        " ".repeat(caret_pad),
        "^".repeat(caret_len)
    );
}

fn caret_width(span: Span, line: &str, pad: usize) -> usize {
    let width = span.len().max(1);
    // never run the underline past the end of the printed line
    width.min(line.len().saturating_sub(pad).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::span::{SourceInfo, SourceMap, Span};

    fn info_at(sources: &SourceMap, start: usize, end: usize, line: u32, col: u32) -> SourceInfo {
        let file = sources.file(crate::FileId(0)).unwrap();
        SourceInfo::new(Span::with_file(start, end, file.id(), line, col))
    }

    #[test]
    fn test_render_caret() {
        let mut sources = SourceMap::new();
        sources.add_file("main.sl", "1 true +\n");
        let err = LangError::new(
            ErrorKind::InvalidType,
            info_at(&sources, 7, 8, 1, 8),
            "invalid type for `+`",
        );
        let text = render(&err, &sources);
        assert!(text.contains("error[InvalidType]: invalid type for `+`"));
        assert!(text.contains("main.sl:1:8"));
        assert!(text.contains("1 true +"));
        assert!(text.contains("       ^"));
    }

    #[test]
    fn test_render_chain() {
        let mut sources = SourceMap::new();
        sources.add_file("main.sl", "1 2 +\n");
        let inner = LangError::new(
            ErrorKind::IfException,
            info_at(&sources, 4, 5, 1, 5),
            "",
        );
        let outer = LangError::new(
            ErrorKind::AddedToken,
            info_at(&sources, 0, 1, 1, 1),
            "was added",
        )
        .with_cause(inner);
        let text = render(&outer, &sources);
        let error_pos = text.find("error[AddedToken]").unwrap();
        let note_pos = text.find("note[IfException]").unwrap();
        assert!(error_pos < note_pos);
    }

    #[test]
    fn test_render_without_file() {
        let sources = SourceMap::new();
        let err = LangError::unknown_token(SourceInfo::dummy(), "mystery");
        let text = render(&err, &sources);
        assert!(text.contains("error[UnknownToken]: mystery"));
        assert!(!text.contains("-->"));
    }
}
