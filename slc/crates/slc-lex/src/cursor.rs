//! Character cursor for traversing source code.
//!
//! The cursor owns a shared handle to the file content (sources live in the
//! [`slc_util::SourceMap`] for the whole compilation) and maintains position
//! state while the scanner walks it: byte offset plus 1-based line/column
//! numbers for error reporting.

use std::sync::Arc;

/// A cursor for traversing source code character by character
pub struct Cursor {
    /// The source text being traversed
    source: Arc<str>,

    /// Current byte position in the source
    position: usize,

    /// Current line number (1-based)
    line: u32,

    /// Current column number (1-based)
    column: u32,
}

impl Cursor {
    /// Creates a new cursor for the given source text
    pub fn new(source: Arc<str>) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the current character, or `'\0'` at the end of the source
    #[inline]
    pub fn current_char(&self) -> char {
        self.char_at(0)
    }

    /// Returns the character at the given byte offset from the current
    /// position, or `'\0'` past the end
    #[inline]
    pub fn char_at(&self, offset: usize) -> char {
        let pos = self.position + offset;
        if pos >= self.source.len() {
            return '\0';
        }

        // Fast path for ASCII (most common case)
        let b = self.source.as_bytes()[pos];
        if b < 128 {
            return b as char;
        }

        self.source[pos..].chars().next().unwrap_or('\0')
    }

    /// Returns true if the cursor has consumed all input
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Advances past the current character, updating line/column tracking
    pub fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        let c = self.current_char();
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Returns the current byte position in the source
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the current line number (1-based)
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the current column number (1-based)
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Returns the source text between two byte positions
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.source[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(text: &str) -> Cursor {
        Cursor::new(Arc::from(text))
    }

    #[test]
    fn test_advance_tracks_columns() {
        let mut c = cursor("ab");
        assert_eq!((c.line(), c.column()), (1, 1));
        c.advance();
        assert_eq!((c.line(), c.column()), (1, 2));
    }

    #[test]
    fn test_advance_tracks_lines() {
        let mut c = cursor("a\nb");
        c.advance();
        c.advance();
        assert_eq!((c.line(), c.column()), (2, 1));
        assert_eq!(c.current_char(), 'b');
    }

    #[test]
    fn test_char_at_past_end() {
        let c = cursor("x");
        assert_eq!(c.char_at(5), '\0');
    }

    #[test]
    fn test_is_at_end() {
        let mut c = cursor("x");
        assert!(!c.is_at_end());
        c.advance();
        assert!(c.is_at_end());
        c.advance();
        assert!(c.is_at_end());
    }
}
