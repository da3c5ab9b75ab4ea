//! slc-lex - Lexical analysis for Slate.
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The scanner transforms source bytes into a finite stream of lexical
//! tokens with precise source positions:
//!
//! ```text
//! Source (.sl)  ->  Scanner  ->  LexToken stream  ->  Parser
//! ```
//!
//! Token categories (see [`LexKind`]): integer literals (decimal and hex,
//! signed, 64-bit), double-quoted strings with C-style escapes, single-quoted
//! character literals, words, punctuation operators, pointer-suffix casts
//! (`int*`), line breaks, and end-of-file.
//!
//! Two properties matter to the rest of the pipeline:
//!
//! - **Positions**: every token carries a [`slc_util::SourceInfo`] with byte
//!   span and line/column, and — for tokens of included files — a `parent`
//!   pointing at the include site.
//! - **Nesting**: [`TokenStream::extend`] prepends a nested token source.
//!   This is how `include` splices files into the stream; the outer file
//!   resumes when the nested one is exhausted.
//!
//! Comments (`//` to end of line) are consumed by the scanner; line breaks
//! are surfaced as [`LexKind::NewLine`] tokens and discarded upstream.
//!
//! All lexical failures (unterminated string, invalid escape, malformed
//! number, illegal character) are fatal `UnknownToken` errors.

pub mod cursor;
mod scanner;
mod stream;
mod token;

pub use scanner::Scanner;
pub use stream::TokenStream;
pub use token::{parse_int, LexKind, LexToken};

#[cfg(test)]
mod roundtrip {
    use super::*;
    use proptest::prelude::*;
    use slc_util::SourceMap;

    const WORDS: &[&str] = &[
        "true", "false", "dump", "udump", "cdump", "hexdump", "blsh", "brsh", "band", "bor",
        "bxor", "syscall", "syscall3", "rsyscall1", "drop", "dup", "dup2", "swap", "swap2",
        "over", "rot", "rrot", "exit", "if", "elif", "else", "while", "do", "macro", "proc",
        "in", "out", "memory", "include", "end", "let", "with", "argc", "argv", "store", "load",
        "some_name", "x",
    ];

    const OPS: &[&str] = &[
        "+", "-", "*", "/", "%", "/%", "++", "--", "==", "!=", ">", ">=", "<", "<=", "!", "!16",
        "!32", "!64", "@", "@16", "@32", "@64", "<<", ">>", "&", "|", "^",
    ];

    fn scan(source: &str) -> Vec<LexToken> {
        let mut sources = SourceMap::new();
        let id = sources.add_file("prop.sl", source);
        let mut scanner = Scanner::new(sources.file(id).unwrap());
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token().expect("round-trip input must scan");
            if token.kind == LexKind::Eof {
                return tokens;
            }
            if token.kind != LexKind::NewLine {
                tokens.push(token);
            }
        }
    }

    fn spelling_strategy() -> impl Strategy<Value = String> {
        let word = proptest::sample::select(WORDS.to_vec()).prop_map(str::to_owned);
        let op = proptest::sample::select(OPS.to_vec()).prop_map(str::to_owned);
        let num = any::<i64>().prop_map(|n| n.to_string());
        prop_oneof![word, op, num]
    }

    proptest! {
        // Lexing, re-emitting each token's spelling and lexing again must
        // reproduce the same kinds and texts.
        #[test]
        fn lex_emit_lex_round_trip(spellings in proptest::collection::vec(spelling_strategy(), 0..40)) {
            let source = spellings.join(" ");
            let first = scan(&source);
            let emitted = first
                .iter()
                .map(|t| t.text.clone())
                .collect::<Vec<_>>()
                .join(" ");
            let second = scan(&emitted);
            let a: Vec<_> = first.iter().map(|t| (t.kind, t.text.clone())).collect();
            let b: Vec<_> = second.iter().map(|t| (t.kind, t.text.clone())).collect();
            prop_assert_eq!(a, b);
        }
    }
}
