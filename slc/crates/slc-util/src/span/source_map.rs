//! Source map - ownership of all loaded source files.
//!
//! Files are added once (the main file, then each include as it is reached)
//! and are kept alive for the whole compilation so diagnostics can extract
//! raw source lines at render time.

use std::sync::Arc;

use super::{FileId, Span};

/// A source file with its content and metadata
#[derive(Clone)]
pub struct SourceFile {
    /// Unique file identifier
    id: FileId,
    /// File name (path or display name)
    name: String,
    /// File content
    content: Arc<str>,
    /// Precomputed line start offsets
    line_starts: Arc<[usize]>,
}

impl SourceFile {
    /// Create a new source file
    pub fn new(id: usize, name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        let content = content.into();
        let line_starts = Self::compute_line_starts(&content);
        Self {
            id: FileId(id),
            name: name.into(),
            content,
            line_starts,
        }
    }

    /// Compute line start offsets from content
    fn compute_line_starts(content: &str) -> Arc<[usize]> {
        let mut line_starts = vec![0];
        for (i, ch) in content.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        line_starts.into()
    }

    /// Get the file identifier
    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Get the file name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the file content
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get a shared handle to the file content
    #[inline]
    pub fn content_arc(&self) -> Arc<str> {
        Arc::clone(&self.content)
    }

    /// Get the total number of lines
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the raw text of a line (1-based), without its trailing newline
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        let idx = (line - 1) as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| next)
            .unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// All source files of one compilation
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a file and return its identifier
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<Arc<str>>) -> FileId {
        let id = self.files.len();
        self.files.push(SourceFile::new(id, name, content));
        FileId(id)
    }

    /// Look up a file by id
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// Look up the file a span belongs to
    pub fn file_of(&self, span: Span) -> Option<&SourceFile> {
        self.file(span.file_id)
    }

    /// Number of files loaded
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut map = SourceMap::new();
        let id = map.add_file("main.sl", "1 2 + dump\n0 exit\n");
        let file = map.file(id).unwrap();
        assert_eq!(file.name(), "main.sl");
        assert_eq!(file.line_count(), 3);
    }

    #[test]
    fn test_line_text() {
        let mut map = SourceMap::new();
        let id = map.add_file("main.sl", "1 2 +\n0 exit");
        let file = map.file(id).unwrap();
        assert_eq!(file.line_text(1), Some("1 2 +"));
        assert_eq!(file.line_text(2), Some("0 exit"));
        assert_eq!(file.line_text(3), None);
        assert_eq!(file.line_text(0), None);
    }

    #[test]
    fn test_missing_file() {
        let map = SourceMap::new();
        assert!(map.file(FileId(0)).is_none());
        assert!(map.file_of(Span::DUMMY).is_none());
    }
}
