use std::fmt;

/// An error that occurred while compiling a regular expression.
///
/// Every error carries a kind, the offending fragment of the pattern (which
/// may be empty) and the full pattern that failed to compile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    arg: String,
    pattern: String,
}

/// The kind of compile failure.
///
/// The set of kinds mirrors RE2's status codes one for one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// An unexpected internal failure.
    Internal,
    /// A bad escape sequence, e.g., `\8` or `\q`.
    BadEscape,
    /// A bad character class, e.g., an unknown Unicode class.
    BadCharClass,
    /// A bad character class range, e.g., `[z-a]` or `[[:foo:]]`.
    BadCharRange,
    /// A missing closing `]`.
    MissingBracket,
    /// A missing closing `)`.
    MissingParen,
    /// A `)` with no opening `(`.
    UnexpectedParen,
    /// A pattern that ends in a single `\`.
    TrailingBackslash,
    /// A repetition operator with nothing to repeat, e.g., `*a`.
    RepeatArgument,
    /// A bad repetition count, e.g., `a{1001}` or `a{2,1}`.
    RepeatSize,
    /// A bad repetition operator, e.g., `a**`.
    RepeatOp,
    /// A bad Perl operator, e.g., `(?=a)` or `(?x)`.
    BadPerlOp,
    /// Invalid UTF-8 in a pattern compiled in UTF-8 mode.
    BadUTF8,
    /// A bad or duplicate capture group name.
    BadNamedCapture,
    /// The compiled program exceeds the memory budget.
    PatternTooLarge,
}

impl ErrorKind {
    /// Returns the canonical message for this kind of error.
    pub fn as_str(&self) -> &'static str {
        use self::ErrorKind::*;
        match *self {
            Internal => "unexpected error",
            BadEscape => "invalid escape sequence",
            BadCharClass => "invalid character class",
            BadCharRange => "invalid character class range",
            MissingBracket => "missing ]",
            MissingParen => "missing )",
            UnexpectedParen => "unexpected )",
            TrailingBackslash => "trailing \\",
            RepeatArgument => "no argument for repetition operator",
            RepeatSize => "invalid repetition size",
            RepeatOp => "bad repetition operator",
            BadPerlOp => "invalid perl operator",
            BadUTF8 => "invalid UTF-8",
            BadNamedCapture => "invalid named capture group",
            PatternTooLarge => "pattern too large - compile failed",
        }
    }
}

impl Error {
    pub(crate) fn new<S: Into<String>>(kind: ErrorKind, arg: S) -> Error {
        Error { kind, arg: arg.into(), pattern: String::new() }
    }

    pub(crate) fn with_pattern<S: Into<String>>(mut self, pattern: S) -> Error {
        self.pattern = pattern.into();
        self
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The fragment of the pattern responsible for this error.
    ///
    /// This may be empty, e.g., for `TrailingBackslash`.
    pub fn arg(&self) -> &str {
        &self.arg
    }

    /// The pattern that failed to compile.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.arg.is_empty() {
            write!(f, "{}", self.kind.as_str())
        } else {
            write!(f, "{}: {}", self.kind.as_str(), self.arg)
        }
    }
}

/// An error found while validating or applying a rewrite template.
///
/// Templates may only contain `\0` through `\9` and `\\` escapes, and may not
/// refer to more groups than the regex has.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RewriteError {
    /// The template ends with a lone `\`.
    TrailingBackslash,
    /// A `\` is followed by something other than a digit or `\`.
    BadEscape,
    /// The template asks for more groups than the regex defines.
    TooManyGroups {
        /// The largest group number in the template.
        requested: usize,
        /// The number of capturing groups in the regex.
        available: usize,
    },
    /// A group reference was beyond the capture vector given to `rewrite`.
    InvalidSubstitution {
        /// The group number in the template.
        group: usize,
        /// The number of entries in the capture vector.
        groups: usize,
    },
}

impl std::error::Error for RewriteError {}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RewriteError::TrailingBackslash => {
                write!(f, "Rewrite schema error: '\\' not allowed at end.")
            }
            RewriteError::BadEscape => write!(
                f,
                "Rewrite schema error: '\\' must be followed by a digit \
                 or '\\'."
            ),
            RewriteError::TooManyGroups { requested, available } => write!(
                f,
                "Rewrite schema requests {} matches, but the regexp only \
                 has {} parenthesized subexpressions.",
                requested, available,
            ),
            RewriteError::InvalidSubstitution { group, groups } => write!(
                f,
                "invalid substitution \\{} from {} groups",
                group, groups,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_arg() {
        let err = Error::new(ErrorKind::MissingParen, "(abc");
        assert_eq!("missing ): (abc", err.to_string());
        let err = Error::new(ErrorKind::RepeatSize, "{1001}");
        assert_eq!("invalid repetition size: {1001}", err.to_string());
    }

    #[test]
    fn display_without_arg() {
        let err = Error::new(ErrorKind::TrailingBackslash, "");
        assert_eq!("trailing \\", err.to_string());
    }

    #[test]
    fn rewrite_messages() {
        assert_eq!(
            "Rewrite schema error: '\\' not allowed at end.",
            RewriteError::TrailingBackslash.to_string()
        );
        assert_eq!(
            "Rewrite schema requests 3 matches, but the regexp only has 1 \
             parenthesized subexpressions.",
            RewriteError::TooManyGroups { requested: 3, available: 1 }
                .to_string()
        );
    }
}
