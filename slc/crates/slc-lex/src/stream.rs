//! Token stream with nested sources.
//!
//! The parser pulls tokens from one [`TokenStream`]. When an `include` is
//! expanded, the stream is extended with a scanner over the included file;
//! the outer source resumes once the nested one is exhausted. `Eof` is only
//! surfaced for the outermost source, so the consumer sees one finite,
//! seamless token sequence.

use slc_util::LangResult;

use crate::scanner::Scanner;
use crate::token::{LexKind, LexToken};

/// A stack of scanners behaving as one token source
pub struct TokenStream {
    stack: Vec<Scanner>,
}

impl TokenStream {
    /// Create a stream over one top-level scanner
    pub fn new(scanner: Scanner) -> Self {
        Self {
            stack: vec![scanner],
        }
    }

    /// Prepend a nested token source (an included file)
    ///
    /// The nested source is drained completely before the current source
    /// resumes.
    pub fn extend(&mut self, scanner: Scanner) {
        self.stack.push(scanner);
    }

    /// Pull the next token
    ///
    /// Scanners of exhausted nested sources are dropped here, which closes
    /// their handles deterministically, including on error paths.
    pub fn next_token(&mut self) -> LangResult<LexToken> {
        loop {
            let scanner = self
                .stack
                .last_mut()
                .expect("token stream always holds the outermost scanner");
            let token = scanner.next_token()?;
            if token.kind == LexKind::Eof && self.stack.len() > 1 {
                self.stack.pop();
                continue;
            }
            return Ok(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slc_util::{SourceInfo, SourceMap, Span};

    #[test]
    fn test_nested_source_resumes_outer() {
        let mut sources = SourceMap::new();
        let outer = sources.add_file("outer.sl", "1 2");
        let inner = sources.add_file("inner.sl", "9");

        let mut stream = TokenStream::new(Scanner::new(sources.file(outer).unwrap()));
        let first = stream.next_token().unwrap();
        assert_eq!(first.text, "1");

        let site = SourceInfo::new(Span::new(0, 1, 1, 1));
        stream.extend(Scanner::with_parent(sources.file(inner).unwrap(), site));

        let nested = stream.next_token().unwrap();
        assert_eq!(nested.text, "9");
        assert!(nested.info.parent.is_some());

        let resumed = stream.next_token().unwrap();
        assert_eq!(resumed.text, "2");
        assert!(resumed.info.parent.is_none());

        assert_eq!(stream.next_token().unwrap().kind, LexKind::Eof);
    }
}
