//! The scanner: source bytes -> lexical tokens.
//!
//! Direct-coded, single pass: whitespace is skipped (line breaks become
//! [`LexKind::NewLine`] tokens), `//` comments are consumed to the end of
//! the line, and everything else dispatches on the current character.
//! Operators use longest-match (`/%` before `/`, `!64` before `!`, ...).
//!
//! All failures are fatal [`ErrorKind::UnknownToken`] errors carrying the
//! offending span: unterminated strings, invalid escapes, malformed or
//! out-of-range numbers, and characters outside the language alphabet.

use slc_util::{ErrorKind, FileId, LangError, LangResult, SourceFile, SourceInfo, Span};

use crate::cursor::Cursor;
use crate::token::{parse_int, LexKind, LexToken};

/// A scanner over one token source (one file, or one included file)
pub struct Scanner {
    /// Character cursor over the file content
    cursor: Cursor,

    /// The file this scanner reads
    file_id: FileId,

    /// Include site that opened this source, if nested
    parent: Option<SourceInfo>,

    /// Byte offset where the current token started
    token_start: usize,

    /// Line where the current token started (1-based)
    token_start_line: u32,

    /// Column where the current token started (1-based)
    token_start_column: u32,
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Scanner {
    /// Creates a scanner for a top-level source file
    pub fn new(file: &SourceFile) -> Self {
        Self {
            cursor: Cursor::new(file.content_arc()),
            file_id: file.id(),
            parent: None,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Creates a scanner for an included file, parented at the include site
    pub fn with_parent(file: &SourceFile, parent: SourceInfo) -> Self {
        let mut scanner = Self::new(file);
        scanner.parent = Some(parent);
        scanner
    }

    /// Returns the next token from the source
    pub fn next_token(&mut self) -> LangResult<LexToken> {
        self.skip_blanks_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(self.token(LexKind::Eof, String::new()));
        }

        match self.cursor.current_char() {
            '\n' => {
                self.cursor.advance();
                Ok(self.token(LexKind::NewLine, "\n"))
            }
            '"' => self.lex_string(),
            '\'' => self.lex_char(),
            '-' if self.cursor.char_at(1).is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_word_start(c) => self.lex_word(),
            _ => self.lex_operator(),
        }
    }

    /// Skips spaces, tabs, carriage returns and `//` comments.
    ///
    /// Line breaks are not consumed here; they become `NewLine` tokens. A
    /// comment runs from `//` to the end of its line, so the break that
    /// terminates it is still reported.
    fn skip_blanks_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' => self.cursor.advance(),
                '/' if self.cursor.char_at(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_word(&mut self) -> LangResult<LexToken> {
        while is_word_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        if self.cursor.current_char() == '*' {
            // pointer-suffix form, e.g. `int*` or `ptr**`
            while self.cursor.current_char() == '*' {
                self.cursor.advance();
            }
            let text = self.current_text().to_owned();
            return Ok(self.token(LexKind::Cast, text));
        }
        let text = self.current_text().to_owned();
        Ok(self.token(LexKind::Word, text))
    }

    fn lex_number(&mut self) -> LangResult<LexToken> {
        if self.cursor.current_char() == '-' {
            self.cursor.advance();
        }
        if self.cursor.current_char() == '0'
            && matches!(self.cursor.char_at(1), 'x' | 'X')
            && self.cursor.char_at(2).is_ascii_hexdigit()
        {
            self.cursor.advance();
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_hexdigit() {
                self.cursor.advance();
            }
        } else {
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        if is_word_continue(self.cursor.current_char()) {
            while is_word_continue(self.cursor.current_char()) {
                self.cursor.advance();
            }
            return Err(self.error(format!("`{}` is a malformed number", self.current_text())));
        }
        let text = self.current_text().to_owned();
        if parse_int(&text).is_none() {
            return Err(self.error(format!("`{text}` does not fit in 64 bits")));
        }
        Ok(self.token(LexKind::Number, text))
    }

    fn lex_string(&mut self) -> LangResult<LexToken> {
        self.cursor.advance();
        let mut content = String::new();
        loop {
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    break;
                }
                '\n' | '\0' => {
                    return Err(self.error("unterminated string literal"));
                }
                '\\' => {
                    self.cursor.advance();
                    content.push(self.lex_escape()?);
                }
                c => {
                    content.push(c);
                    self.cursor.advance();
                }
            }
        }
        Ok(self.token(LexKind::Str, content))
    }

    fn lex_char(&mut self) -> LangResult<LexToken> {
        self.cursor.advance();
        let c = match self.cursor.current_char() {
            '\'' | '\n' | '\0' => {
                return Err(self.error("empty character literal"));
            }
            '\\' => {
                self.cursor.advance();
                self.lex_escape()?
            }
            c => {
                self.cursor.advance();
                c
            }
        };
        if self.cursor.current_char() != '\'' {
            return Err(self.error("unterminated character literal"));
        }
        self.cursor.advance();
        Ok(self.token(LexKind::Char, c.to_string()))
    }

    /// Consumes the character(s) after a backslash
    fn lex_escape(&mut self) -> LangResult<char> {
        let c = self.cursor.current_char();
        self.cursor.advance();
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => {
                let hi = self.cursor.current_char();
                self.cursor.advance();
                let lo = self.cursor.current_char();
                self.cursor.advance();
                let (Some(hi), Some(lo)) = (hi.to_digit(16), lo.to_digit(16)) else {
                    return Err(self.error("invalid hex escape sequence"));
                };
                char::from_u32(hi * 16 + lo).expect("two hex digits are always a valid char")
            }
            _ => {
                return Err(self.error(format!("`\\{c}` is not a valid escape sequence")));
            }
        })
    }

    fn lex_operator(&mut self) -> LangResult<LexToken> {
        let c = self.cursor.current_char();
        self.cursor.advance();
        let spelling: &str = match c {
            '+' => self.maybe('+', "++", "+"),
            '-' => self.maybe('-', "--", "-"),
            '*' => "*",
            '/' => self.maybe('%', "/%", "/"),
            '%' => "%",
            '&' => "&",
            '|' => "|",
            '^' => "^",
            '=' => {
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    "=="
                } else {
                    return Err(self.error("`=` is not a recognized symbol"));
                }
            }
            '!' => match self.cursor.current_char() {
                '=' => {
                    self.cursor.advance();
                    "!="
                }
                _ => self.maybe_width('!'),
            },
            '@' => self.maybe_width('@'),
            '<' => match self.cursor.current_char() {
                '=' => {
                    self.cursor.advance();
                    "<="
                }
                '<' => {
                    self.cursor.advance();
                    "<<"
                }
                _ => "<",
            },
            '>' => match self.cursor.current_char() {
                '=' => {
                    self.cursor.advance();
                    ">="
                }
                '>' => {
                    self.cursor.advance();
                    ">>"
                }
                _ => ">",
            },
            _ => {
                return Err(self.error(format!("`{c}` is not a recognized symbol")));
            }
        };
        Ok(self.token(LexKind::Op, spelling))
    }

    fn maybe(&mut self, next: char, double: &'static str, single: &'static str) -> &'static str {
        if self.cursor.current_char() == next {
            self.cursor.advance();
            double
        } else {
            single
        }
    }

    /// `!`/`@` optionally followed by a width suffix 16, 32 or 64
    fn maybe_width(&mut self, base: char) -> &'static str {
        let suffix = (self.cursor.current_char(), self.cursor.char_at(1));
        let widths: &[(char, char, &'static str, &'static str)] = &[
            ('1', '6', "!16", "@16"),
            ('3', '2', "!32", "@32"),
            ('6', '4', "!64", "@64"),
        ];
        for &(a, b, store, load) in widths {
            if suffix == (a, b) {
                self.cursor.advance();
                self.cursor.advance();
                return if base == '!' { store } else { load };
            }
        }
        if base == '!' {
            "!"
        } else {
            "@"
        }
    }

    fn current_text(&self) -> &str {
        self.cursor.slice(self.token_start, self.cursor.position())
    }

    fn current_info(&self) -> SourceInfo {
        let span = Span::with_file(
            self.token_start,
            self.cursor.position(),
            self.file_id,
            self.token_start_line,
            self.token_start_column,
        );
        match &self.parent {
            Some(parent) => SourceInfo::nested(span, parent.clone()),
            None => SourceInfo::new(span),
        }
    }

    fn token(&self, kind: LexKind, text: impl Into<String>) -> LexToken {
        LexToken::new(kind, text, self.current_info())
    }

    fn error(&self, message: impl Into<String>) -> LangError {
        LangError::new(ErrorKind::UnknownToken, self.current_info(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slc_util::SourceMap;

    fn scan(source: &str) -> Vec<LexToken> {
        try_scan(source).expect("scan failed")
    }

    fn try_scan(source: &str) -> LangResult<Vec<LexToken>> {
        let mut sources = SourceMap::new();
        let id = sources.add_file("test.sl", source);
        let mut scanner = Scanner::new(sources.file(id).unwrap());
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token()?;
            if token.kind == LexKind::Eof {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    fn kinds(source: &str) -> Vec<LexKind> {
        scan(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_words_and_numbers() {
        let tokens = scan("dup 35 -42 0xff");
        assert_eq!(tokens[0].kind, LexKind::Word);
        assert_eq!(tokens[0].text, "dup");
        assert_eq!(tokens[1].kind, LexKind::Number);
        assert_eq!(tokens[2].text, "-42");
        assert_eq!(tokens[3].text, "0xff");
    }

    #[test]
    fn test_operators_longest_match() {
        let texts: Vec<_> = scan("+ ++ / /% ! !16 !64 @ @32 < <= << >= >> == !=")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "+", "++", "/", "/%", "!", "!16", "!64", "@", "@32", "<", "<=", "<<", ">=", ">>",
                "==", "!="
            ]
        );
    }

    #[test]
    fn test_string_unescapes() {
        let tokens = scan(r#""hi\n\t\x41""#);
        assert_eq!(tokens[0].kind, LexKind::Str);
        assert_eq!(tokens[0].text, "hi\n\tA");
    }

    #[test]
    fn test_char_literal() {
        let tokens = scan(r"'a' '\n'");
        assert_eq!(tokens[0].kind, LexKind::Char);
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].text, "\n");
    }

    #[test]
    fn test_cast_suffix() {
        let tokens = scan("int* ptr** char");
        assert_eq!(tokens[0].kind, LexKind::Cast);
        assert_eq!(tokens[0].text, "int*");
        assert_eq!(tokens[1].text, "ptr**");
        assert_eq!(tokens[2].kind, LexKind::Word);
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        assert_eq!(
            kinds("1 // 2 3 \"unterminated\n4"),
            vec![LexKind::Number, LexKind::NewLine, LexKind::Number]
        );
    }

    #[test]
    fn test_newlines_are_tokens() {
        assert_eq!(
            kinds("1\n2"),
            vec![LexKind::Number, LexKind::NewLine, LexKind::Number]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = scan("1\n dup");
        assert_eq!(tokens[0].info.span.line, 1);
        assert_eq!(tokens[0].info.span.column, 1);
        assert_eq!(tokens[2].info.span.line, 2);
        assert_eq!(tokens[2].info.span.column, 2);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(try_scan("\"oops").is_err());
        assert!(try_scan("\"oops\nmore\"").is_err());
    }

    #[test]
    fn test_malformed_number() {
        assert!(try_scan("12ab").is_err());
        assert!(try_scan("0xffffffffffffffffff").is_err());
    }

    #[test]
    fn test_illegal_character() {
        assert!(try_scan("#").is_err());
        assert!(try_scan("=").is_err());
    }

    #[test]
    fn test_minus_vs_negative() {
        let tokens = scan("1 - 2 -3 --");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "-", "2", "-3", "--"]);
        assert_eq!(tokens[1].kind, LexKind::Op);
        assert_eq!(tokens[3].kind, LexKind::Number);
    }
}
