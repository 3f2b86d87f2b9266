use crate::error::Error;
use crate::exec::MatchEngine;
use crate::hir::{Config, Flags};
use crate::re::Regex;

/// The text encoding of a pattern and the haystacks it searches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Patterns and haystacks are UTF-8. A pattern that isn't valid UTF-8
    /// fails to compile. Haystacks aren't validated: invalid bytes simply
    /// never match a character.
    Utf8,
    /// Every byte is a character, with the code point of the byte's value.
    Latin1,
}

/// The construction-time options of a regex.
///
/// The defaults give Perl-like syntax over UTF-8 with leftmost-first
/// semantics. Inline flags in the pattern (e.g., `(?i)`) override the
/// corresponding options for the part of the pattern they cover.
///
/// `perl_classes`, `word_boundary` and `one_line` are only consulted when
/// `posix_syntax` is set. Perl syntax always has them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Options {
    encoding: Encoding,
    posix_syntax: bool,
    longest_match: bool,
    log_errors: bool,
    max_mem: usize,
    literal: bool,
    never_nl: bool,
    dot_nl: bool,
    never_capture: bool,
    case_sensitive: bool,
    perl_classes: bool,
    word_boundary: bool,
    one_line: bool,
}

/// The default memory budget: 8 MiB.
const DEFAULT_MAX_MEM: usize = 8 << 20;

impl Default for Options {
    fn default() -> Options {
        Options {
            encoding: Encoding::Utf8,
            posix_syntax: false,
            longest_match: false,
            log_errors: true,
            max_mem: DEFAULT_MAX_MEM,
            literal: false,
            never_nl: false,
            dot_nl: false,
            never_capture: false,
            case_sensitive: true,
            perl_classes: false,
            word_boundary: false,
            one_line: false,
        }
    }
}

macro_rules! option {
    ($(#[$doc:meta])* $get:ident, $set:ident) => {
        $(#[$doc])*
        pub fn $get(&self) -> bool {
            self.$get
        }

        #[doc = concat!("Sets `", stringify!($get), "`.")]
        pub fn $set(&mut self, yes: bool) {
            self.$get = yes;
        }
    };
}

impl Options {
    /// Options for Latin-1 patterns and haystacks.
    pub fn latin1() -> Options {
        Options { encoding: Encoding::Latin1, ..Options::default() }
    }

    /// Options for POSIX egrep syntax with leftmost-longest matching.
    pub fn posix() -> Options {
        Options {
            posix_syntax: true,
            longest_match: true,
            ..Options::default()
        }
    }

    /// The default options, except that compile failures aren't logged.
    pub fn quiet() -> Options {
        Options { log_errors: false, ..Options::default() }
    }

    /// The encoding of patterns and haystacks.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Sets the encoding.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// The memory budget of a compiled regex, in bytes.
    ///
    /// Two thirds of it go to the forward program and one third to the
    /// reverse program. Whatever the instructions don't use bounds the lazy
    /// DFA's state cache.
    pub fn max_mem(&self) -> usize {
        self.max_mem
    }

    /// Sets the memory budget.
    pub fn set_max_mem(&mut self, bytes: usize) {
        self.max_mem = bytes;
    }

    option!(
        /// Restrict the syntax to POSIX egrep.
        posix_syntax,
        set_posix_syntax
    );
    option!(
        /// Report the leftmost-longest match instead of the leftmost-first.
        longest_match,
        set_longest_match
    );
    option!(
        /// Log compile and rewrite failures through `log::error!`.
        log_errors,
        set_log_errors
    );
    option!(
        /// Interpret the pattern as a literal string.
        literal,
        set_literal
    );
    option!(
        /// Never match `\n`, even if it is in the pattern.
        never_nl,
        set_never_nl
    );
    option!(
        /// Let `.` match `\n`.
        dot_nl,
        set_dot_nl
    );
    option!(
        /// Parse every group as non-capturing.
        never_capture,
        set_never_capture
    );
    option!(
        /// Match letters case sensitively. Case folding is ASCII only.
        case_sensitive,
        set_case_sensitive
    );
    option!(
        /// Allow `\d \s \w \D \S \W` under POSIX syntax.
        perl_classes,
        set_perl_classes
    );
    option!(
        /// Allow `\b \B` under POSIX syntax.
        word_boundary,
        set_word_boundary
    );
    option!(
        /// Under POSIX syntax, make `^` and `$` match only at the beginning
        /// and end of the text instead of at every line.
        one_line,
        set_one_line
    );

    /// The parser configuration these options call for.
    pub(crate) fn parser_config(&self) -> Config {
        let perl = !self.posix_syntax;
        Config {
            flags: Flags {
                case_insensitive: !self.case_sensitive,
                multi_line: self.posix_syntax && !self.one_line,
                dot_matches_new_line: self.dot_nl,
                swap_greed: false,
            },
            latin1: self.encoding == Encoding::Latin1,
            literal: self.literal,
            perl_extensions: perl,
            perl_classes: perl || self.perl_classes,
            word_boundary: perl || self.word_boundary,
            never_nl: self.never_nl,
            never_capture: self.never_capture,
            ..Config::default()
        }
    }
}

/// A configurable builder for a regular expression.
///
/// A builder can be used to configure how the regex is built, for example,
/// by setting the default flags (which can be overridden in the expression
/// itself) or the memory budget.
#[derive(Clone, Debug)]
pub struct RegexBuilder {
    pattern: Vec<u8>,
    options: Options,
    match_engine: MatchEngine,
}

impl RegexBuilder {
    /// Create a new regular expression builder with the given pattern.
    ///
    /// If the pattern is invalid, then an error will be returned when
    /// `build` is called.
    pub fn new<P: AsRef<[u8]>>(pattern: P) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.as_ref().to_vec(),
            options: Options::default(),
            match_engine: MatchEngine::Automatic,
        }
    }

    /// Consume the builder and compile the regular expression.
    ///
    /// Note that calling `pattern` on the resulting `Regex` will produce the
    /// pattern given to `new` verbatim. Notably, it will not incorporate any
    /// of the flags set on this builder.
    pub fn build(&self) -> Result<Regex, Error> {
        let options = self.options.clone();
        Regex::with_engine(&self.pattern, options, self.match_engine)
    }

    /// Replace every option at once.
    pub fn options(&mut self, options: Options) -> &mut RegexBuilder {
        self.options = options;
        self
    }

    /// Set the encoding of the pattern and of the haystacks.
    pub fn encoding(&mut self, encoding: Encoding) -> &mut RegexBuilder {
        self.options.set_encoding(encoding);
        self
    }

    /// Set the memory budget of the compiled regex.
    ///
    /// A pattern whose program doesn't fit fails with `PatternTooLarge`.
    pub fn max_mem(&mut self, bytes: usize) -> &mut RegexBuilder {
        self.options.set_max_mem(bytes);
        self
    }

    /// Restrict the syntax to POSIX egrep.
    pub fn posix_syntax(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_posix_syntax(yes);
        self
    }

    /// Report leftmost-longest matches.
    pub fn longest_match(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_longest_match(yes);
        self
    }

    /// Log compile and rewrite failures.
    pub fn log_errors(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_log_errors(yes);
        self
    }

    /// Interpret the pattern as a literal string.
    pub fn literal(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_literal(yes);
        self
    }

    /// Never match `\n`.
    pub fn never_nl(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_never_nl(yes);
        self
    }

    /// Set the value for the any character (`s`) flag, where in `.` matches
    /// anything when `s` is set and matches anything except for new line
    /// when it is not set (the default).
    pub fn dot_nl(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_dot_nl(yes);
        self
    }

    /// Parse every group as non-capturing.
    pub fn never_capture(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_never_capture(yes);
        self
    }

    /// Set the value for the case insensitive (`i`) flag, negated.
    ///
    /// When disabled, ASCII letters in the pattern will match both upper case
    /// and lower case variants.
    pub fn case_sensitive(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_case_sensitive(yes);
        self
    }

    /// Allow Perl classes under POSIX syntax.
    pub fn perl_classes(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_perl_classes(yes);
        self
    }

    /// Allow word boundaries under POSIX syntax.
    pub fn word_boundary(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_word_boundary(yes);
        self
    }

    /// Make `^` and `$` match only at text boundaries under POSIX syntax.
    pub fn one_line(&mut self, yes: bool) -> &mut RegexBuilder {
        self.options.set_one_line(yes);
        self
    }

    /// Force a matching engine. For testing.
    #[doc(hidden)]
    pub fn match_engine(&mut self, engine: MatchEngine) -> &mut RegexBuilder {
        self.match_engine = engine;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Encoding, Options};

    #[test]
    fn canned_options() {
        let opts = Options::default();
        assert_eq!(opts.encoding(), Encoding::Utf8);
        assert!(opts.case_sensitive() && opts.log_errors());
        assert_eq!(opts.max_mem(), 8 << 20);

        assert_eq!(Options::latin1().encoding(), Encoding::Latin1);
        let posix = Options::posix();
        assert!(posix.posix_syntax() && posix.longest_match());
        assert!(!Options::quiet().log_errors());
    }

    #[test]
    fn posix_syntax_restricts_the_parser() {
        let config = Options::default().parser_config();
        assert!(config.perl_extensions && config.perl_classes);
        assert!(!config.flags.multi_line);

        let mut opts = Options::posix();
        let config = opts.parser_config();
        assert!(!config.perl_extensions && !config.perl_classes);
        assert!(!config.word_boundary);
        assert!(config.flags.multi_line);

        opts.set_one_line(true);
        opts.set_word_boundary(true);
        let config = opts.parser_config();
        assert!(!config.flags.multi_line);
        assert!(config.word_boundary);
    }
}
