//! Lexical token model.
//!
//! The scanner produces raw lexical tokens; the parser resolves them into
//! instruction tokens. A lexical token is a category plus the relevant text:
//! for strings and chars the text is already unescaped, for numbers it is
//! the literal spelling (sign and `0x` prefix included).

use slc_util::SourceInfo;

/// The closed set of lexical token categories
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexKind {
    /// Signed decimal or hex integer literal
    Number,
    /// Double-quoted string literal (text carries the unescaped content)
    Str,
    /// Single-quoted character literal (text carries the unescaped character)
    Char,
    /// Identifier: letters, digits, underscore; not starting with a digit
    Word,
    /// One of the punctuation operators
    Op,
    /// An identifier with pointer-suffix stars, e.g. `int*` or `ptr**`
    Cast,
    /// A line break; significant only for the upstream pipeline
    NewLine,
    /// End of this token source
    Eof,
}

/// A single lexical token with its text and provenance
#[derive(Clone, Debug, PartialEq)]
pub struct LexToken {
    /// Token category
    pub kind: LexKind,
    /// Category-dependent text payload
    pub text: String,
    /// Location, including the include site for nested sources
    pub info: SourceInfo,
}

impl LexToken {
    pub fn new(kind: LexKind, text: impl Into<String>, info: SourceInfo) -> Self {
        Self {
            kind,
            text: text.into(),
            info,
        }
    }
}

/// Parse an integer literal as spelled in source: optional sign, decimal or
/// `0x`/`0X` hex. Returns `None` when the value does not fit an `i64`.
pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        rest.parse::<u64>().ok()?
    };
    if negative {
        if magnitude > i64::MIN.unsigned_abs() {
            return None;
        }
        Some((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("1337"), Some(1337));
        assert_eq!(parse_int("-42"), Some(-42));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_int("0xff"), Some(255));
        assert_eq!(parse_int("0X10"), Some(16));
        assert_eq!(parse_int("-0x10"), Some(-16));
    }

    #[test]
    fn test_parse_limits() {
        assert_eq!(parse_int("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_int("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_int("9223372036854775808"), None);
        assert_eq!(parse_int("0xffffffffffffffff"), None);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("12ab"), None);
        assert_eq!(parse_int("0x"), None);
    }
}
