use core::cell::{Cell, RefCell};

use crate::{
    error::{Error, ErrorKind},
    hir::{self, Class, ClassRange, Config, Flags, Hir, HirKind, Look},
};

const PERL_DIGIT: &[(char, char)] = &[('0', '9')];
const PERL_SPACE: &[(char, char)] =
    &[('\t', '\n'), ('\x0C', '\r'), (' ', ' ')];
const PERL_WORD: &[(char, char)] =
    &[('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')];

/// A regular expression parser.
///
/// This parses a pattern, given as a sequence of characters, into a `Hir`.
/// The grammar is RE2's: Perl extensions and POSIX syntax are selected by
/// the `Config`.
#[derive(Clone, Debug)]
pub(super) struct Parser<'a> {
    /// The configuration of the parser as given by the caller.
    config: Config,
    /// The pattern we're parsing as given by the caller.
    pattern: &'a [char],
    /// The call depth of the parser. This is incremented for each
    /// sub-expression parsed. Its peak value is the maximum nesting of the
    /// pattern.
    depth: Cell<u32>,
    /// The current position of the parser, in characters.
    pos: Cell<usize>,
    /// The current capture index.
    capture_index: Cell<u32>,
    /// The flags that are currently set.
    flags: RefCell<Flags>,
    /// A sorted sequence of capture names. This is used to detect duplicate
    /// capture names and report an error if one is detected.
    capture_names: RefCell<Vec<String>>,
}

/// The constructor and a variety of helper routines.
impl<'a> Parser<'a> {
    /// Build a parser from this configuration with the given pattern.
    pub(super) fn new(config: Config, pattern: &'a [char]) -> Parser<'a> {
        Parser {
            config,
            pattern,
            depth: Cell::new(0),
            pos: Cell::new(0),
            capture_index: Cell::new(0),
            flags: RefCell::new(config.flags),
            capture_names: RefCell::new(vec![]),
        }
    }

    /// Return the current offset of the parser.
    fn pos(&self) -> usize {
        self.pos.get()
    }

    /// Increments the call depth of the parser.
    ///
    /// If the call depth would exceed the configured nest limit, then this
    /// returns an error.
    ///
    /// This returns the old depth.
    fn increment_depth(&self) -> Result<u32, Error> {
        let old = self.depth.get();
        if old > self.config.nest_limit {
            return Err(Error::new(ErrorKind::PatternTooLarge, ""));
        }
        self.depth.set(old + 1);
        Ok(old)
    }

    /// Decrements the call depth of the parser.
    fn decrement_depth(&self) {
        let old = self.depth.get();
        self.depth.set(old.saturating_sub(1));
    }

    /// Return the character at the current position of the parser.
    ///
    /// This panics if the parser is positioned at the end of the pattern.
    fn char(&self) -> char {
        self.pattern[self.pos()]
    }

    /// Returns true if the next call to `bump` would return false.
    fn is_done(&self) -> bool {
        self.pos() >= self.pattern.len()
    }

    /// Returns true if the parser is positioned at the given character.
    fn is(&self, ch: char) -> bool {
        !self.is_done() && self.char() == ch
    }

    /// Returns the flags that are current set for this regex.
    fn flags(&self) -> Flags {
        *self.flags.borrow()
    }

    /// Bump the parser to the next character.
    ///
    /// If the end of the input has been reached, then `false` is returned.
    fn bump(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.pos.set(self.pos() + 1);
        !self.is_done()
    }

    /// If the pattern at the current position has the given prefix, then
    /// bump past it and return true. Otherwise, don't bump the parser and
    /// return false.
    fn bump_if(&self, prefix: &str) -> bool {
        let rest = &self.pattern[self.pos()..];
        let n = prefix.chars().count();
        if rest.len() >= n && prefix.chars().zip(rest).all(|(a, &b)| a == b) {
            self.pos.set(self.pos() + n);
            true
        } else {
            false
        }
    }

    /// Peek at the next character in the input without advancing the parser.
    fn peek(&self) -> Option<char> {
        self.pattern.get(self.pos() + 1).copied()
    }

    /// Returns the pattern text between the two offsets.
    fn text(&self, start: usize, end: usize) -> String {
        let end = core::cmp::min(end, self.pattern.len());
        self.pattern[start..end].iter().collect()
    }

    /// Builds an error whose argument is the pattern text between the two
    /// offsets.
    fn error(&self, kind: ErrorKind, start: usize, end: usize) -> Error {
        Error::new(kind, self.text(start, end))
    }

    /// Return the next capturing index. Each subsequent call increments the
    /// internal index. Capture indices are assigned in the order their
    /// opening parentheses appear.
    fn next_capture_index(&self) -> Result<u32, Error> {
        let current = self.capture_index.get();
        let next = current
            .checked_add(1)
            .ok_or_else(|| Error::new(ErrorKind::PatternTooLarge, ""))?;
        self.capture_index.set(next);
        Ok(next)
    }

    /// Adds the given capture name to this parser. Returns false if the name
    /// has already been used.
    fn add_capture_name(&self, name: &str) -> bool {
        let mut names = self.capture_names.borrow_mut();
        match names.binary_search_by(|n| n.as_str().cmp(name)) {
            Ok(_) => false,
            Err(i) => {
                names.insert(i, name.to_string());
                true
            }
        }
    }

    /// The largest character this pattern can mention.
    fn max_char(&self) -> char {
        self.config.max_char()
    }
}

/// The actual parser. We try to break out each kind of regex syntax into its
/// own routine.
impl<'a> Parser<'a> {
    pub(super) fn parse(&self) -> Result<Hir, Error> {
        if self.config.literal {
            let lits =
                self.pattern.iter().map(|&ch| self.hir_char(ch)).collect();
            return Ok(Hir::concat(lits));
        }
        let hir = self.parse_inner()?;
        // The parser's depth check only counts groups. Stacked repetitions
        // nest without recursing in the parser, so check the whole tree.
        check_hir_nesting(&hir, self.config.nest_limit)?;
        Ok(hir)
    }

    fn parse_inner(&self) -> Result<Hir, Error> {
        let depth = self.increment_depth()?;
        let mut alternates = vec![];
        let mut concat = vec![];
        // Where the previous item began, if it was a repetition operator.
        let mut last_repeat: Option<usize> = None;
        loop {
            if self.is_done() {
                break;
            }
            let start = self.pos();
            let mut repeat = None;
            match self.char() {
                '(' => {
                    // Save the old flags and reset them only when we close
                    // the group. A flag directive like `(?i)` stays active
                    // until the end of the enclosing group.
                    let oldflags = self.flags();
                    if let Some(sub) = self.parse_group()? {
                        concat.push(sub);
                        *self.flags.borrow_mut() = oldflags;
                    }
                    if !self.is(')') {
                        let len = self.pattern.len();
                        return Err(self.error(ErrorKind::MissingParen, 0, len));
                    }
                    self.bump();
                }
                ')' => {
                    if depth == 0 {
                        let len = self.pattern.len();
                        return Err(self.error(
                            ErrorKind::UnexpectedParen,
                            0,
                            len,
                        ));
                    }
                    break;
                }
                '|' => {
                    alternates.push(Hir::concat(core::mem::take(&mut concat)));
                    self.bump();
                }
                '[' => concat.push(self.parse_class()?),
                '?' | '*' | '+' => {
                    self.parse_uncounted_repetition(&mut concat, last_repeat)?;
                    repeat = Some(start);
                }
                '{' => {
                    if self.parse_counted_repetition(&mut concat, last_repeat)? {
                        repeat = Some(start);
                    } else {
                        concat.push(self.hir_char('{'));
                        self.bump();
                    }
                }
                '\\' if self.config.perl_extensions
                    && self.peek() == Some('Q') =>
                {
                    self.parse_quoted(&mut concat);
                }
                _ => concat.push(self.parse_primitive()?),
            }
            last_repeat = repeat;
        }
        self.decrement_depth();
        alternates.push(Hir::concat(concat));
        // N.B. This strips off the "alternation" if there's only one branch.
        Ok(Hir::alternation(alternates))
    }

    /// Parses a "primitive" pattern. A primitive is any expression that does
    /// not contain any sub-expressions.
    ///
    /// This assumes the parser is pointing at the beginning of the primitive.
    fn parse_primitive(&self) -> Result<Hir, Error> {
        let start = self.pos();
        let ch = self.char();
        self.bump();
        match ch {
            '\\' => self.parse_escape(start),
            '.' => Ok(self.hir_dot()),
            '^' => Ok(self.hir_anchor_start()),
            '$' => Ok(self.hir_anchor_end()),
            ch => Ok(self.hir_char(ch)),
        }
    }

    /// Parses `\Q...\E`, pushing every quoted character as its own literal.
    ///
    /// The closing `\E` is optional at the end of the pattern.
    fn parse_quoted(&self, concat: &mut Vec<Hir>) {
        self.bump_if("\\Q");
        while !self.is_done() {
            if self.bump_if("\\E") {
                break;
            }
            concat.push(self.hir_char(self.char()));
            self.bump();
        }
    }

    /// Parse an escape sequence outside of a character class.
    ///
    /// `start` is the position of the backslash. The parser is positioned
    /// just after it.
    fn parse_escape(&self, start: usize) -> Result<Hir, Error> {
        if self.is_done() {
            return Err(Error::new(ErrorKind::TrailingBackslash, ""));
        }
        let ch = self.char();
        if self.config.word_boundary && (ch == 'b' || ch == 'B') {
            self.bump();
            return Ok(Hir::look(if ch == 'b' {
                Look::WordBoundary
            } else {
                Look::NotWordBoundary
            }));
        }
        if self.config.perl_extensions {
            let hir = match ch {
                'A' => Some(Hir::look(Look::StartText)),
                'z' => Some(Hir::look(Look::EndText)),
                'C' => Some(Hir::any_byte()),
                _ => None,
            };
            if let Some(hir) = hir {
                self.bump();
                return Ok(hir);
            }
            if ch == 'p' || ch == 'P' {
                let mut ranges = vec![];
                self.parse_unicode_class(start, &mut ranges)?;
                return Ok(Hir::class(Class::new(ranges)));
            }
        }
        if let Some((group, negated)) = self.perl_group(ch) {
            self.bump();
            let mut ranges = vec![];
            self.add_group(&mut ranges, group, negated);
            return Ok(Hir::class(Class::new(ranges)));
        }
        let ch = self.parse_escape_char(start)?;
        Ok(self.hir_char(ch))
    }

    /// Returns the ranges for `\d`, `\s` or `\w` (or their negations) if
    /// Perl classes are enabled and `ch` names one.
    fn perl_group(&self, ch: char) -> Option<(&'static [(char, char)], bool)> {
        if !self.config.perl_classes {
            return None;
        }
        let group = match ch.to_ascii_lowercase() {
            'd' => PERL_DIGIT,
            's' => PERL_SPACE,
            'w' => PERL_WORD,
            _ => return None,
        };
        Some((group, ch.is_ascii_uppercase()))
    }

    /// Parses the character denoted by an escape sequence.
    ///
    /// `start` is the position of the backslash. The parser is positioned
    /// just after it, and is left just past the sequence.
    fn parse_escape_char(&self, start: usize) -> Result<char, Error> {
        if self.is_done() {
            return Err(Error::new(ErrorKind::TrailingBackslash, ""));
        }
        let bad = || self.error(ErrorKind::BadEscape, start, self.pos());
        let max = u32::from(self.max_char());
        let ch = self.char();
        self.bump();
        match ch {
            '1'..='7' | '0' => {
                // A single non-zero digit would be a backreference, which
                // isn't supported.
                if ch != '0' && !self.is_done() && !is_octal(self.char()) {
                    return Err(bad());
                }
                if ch != '0' && self.is_done() {
                    return Err(bad());
                }
                let mut code = digit_value(ch);
                for _ in 0..2 {
                    if self.is_done() || !is_octal(self.char()) {
                        break;
                    }
                    code = code * 8 + digit_value(self.char());
                    self.bump();
                }
                if code > max {
                    return Err(bad());
                }
                char::from_u32(code).ok_or_else(bad)
            }
            '8' | '9' => Err(bad()),
            'x' => {
                if self.is_done() {
                    return Err(bad());
                }
                if self.is('{') {
                    self.bump();
                    let mut nhex = 0;
                    let mut code: u32 = 0;
                    while !self.is_done() && is_hex(self.char()) {
                        nhex += 1;
                        code = code * 16 + digit_value(self.char());
                        self.bump();
                        if code > max {
                            return Err(bad());
                        }
                    }
                    if nhex == 0 || !self.is('}') {
                        if !self.is_done() {
                            self.bump();
                        }
                        return Err(bad());
                    }
                    self.bump();
                    return char::from_u32(code).ok_or_else(bad);
                }
                let c1 = self.char();
                self.bump();
                if self.is_done() {
                    return Err(bad());
                }
                let c2 = self.char();
                self.bump();
                if !is_hex(c1) || !is_hex(c2) {
                    return Err(bad());
                }
                let code = digit_value(c1) * 16 + digit_value(c2);
                if code > max {
                    return Err(bad());
                }
                char::from_u32(code).ok_or_else(bad)
            }
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'a' => Ok('\x07'),
            'f' => Ok('\x0C'),
            'v' => Ok('\x0B'),
            // Escaped punctuation always means itself.
            ch if ch.is_ascii() && !ch.is_ascii_alphanumeric() => Ok(ch),
            _ => Err(bad()),
        }
    }

    /// Parses `\pN`, `\p{Name}`, `\PN` or `\P{^Name}` and adds its ranges.
    ///
    /// Only `Any` is a known class name. `start` is the position of the
    /// backslash and the parser is positioned at the `p` or `P`.
    fn parse_unicode_class(
        &self,
        start: usize,
        ranges: &mut Vec<ClassRange>,
    ) -> Result<(), Error> {
        let mut negated = self.char() == 'P';
        self.bump();
        if self.is_done() {
            return Err(self.error(ErrorKind::BadCharRange, start, self.pos()));
        }
        let name = if self.is('{') {
            let open = self.pos();
            let close = match self.pattern[open..].iter().position(|&c| c == '}')
            {
                Some(i) => open + i,
                None => {
                    let len = self.pattern.len();
                    return Err(self.error(ErrorKind::BadCharRange, start, len));
                }
            };
            self.pos.set(close + 1);
            self.text(open + 1, close)
        } else {
            let name = self.char().to_string();
            self.bump();
            name
        };
        let name = match name.strip_prefix('^') {
            Some(rest) => {
                negated = !negated;
                rest.to_string()
            }
            None => name,
        };
        if name != "Any" {
            return Err(self.error(ErrorKind::BadCharRange, start, self.pos()));
        }
        let any = [('\0', self.max_char())];
        self.add_group(ranges, &any, negated);
        Ok(())
    }

    /// Parses a `?`, `*` or `+` operator applied to the last item of the
    /// concatenation.
    ///
    /// This assumes the parser is positioned at the operator and advances
    /// the parser to the first character after the operator. (Note that the
    /// operator may include a single additional `?`, which makes the operator
    /// non-greedy.)
    fn parse_uncounted_repetition(
        &self,
        concat: &mut Vec<Hir>,
        last_repeat: Option<usize>,
    ) -> Result<(), Error> {
        let start = self.pos();
        let (min, max) = match self.char() {
            '?' => (0, Some(1)),
            '*' => (0, None),
            '+' => (1, None),
            unk => unreachable!("unrecognized repetition operator '{}'", unk),
        };
        self.bump();
        let greedy = self.parse_greed(last_repeat)?;
        let sub = match concat.pop() {
            Some(hir) => Box::new(hir),
            None => {
                return Err(self.error(
                    ErrorKind::RepeatArgument,
                    start,
                    self.pos(),
                ));
            }
        };
        concat.push(Hir::repetition(hir::Repetition { min, max, greedy, sub }));
        Ok(())
    }

    /// Parses the optional non-greedy `?` after a repetition operator and
    /// rejects stacked operators like `a**` in Perl mode.
    fn parse_greed(&self, last_repeat: Option<usize>) -> Result<bool, Error> {
        let mut greedy = true;
        if self.config.perl_extensions {
            if self.is('?') {
                greedy = false;
                self.bump();
            }
            if let Some(last) = last_repeat {
                return Err(self.error(ErrorKind::RepeatOp, last, self.pos()));
            }
        }
        if self.flags().swap_greed {
            greedy = !greedy;
        }
        Ok(greedy)
    }

    /// Parses a counted repetition operation, i.e., `{n}`, `{n,}` or
    /// `{n,m}`, applied to the last item of the concatenation.
    ///
    /// If the text at the `{` isn't a well formed counted repetition, then
    /// the parser isn't moved and `false` is returned. The caller should
    /// treat the `{` as a literal.
    fn parse_counted_repetition(
        &self,
        concat: &mut Vec<Hir>,
        last_repeat: Option<usize>,
    ) -> Result<bool, Error> {
        let start = self.pos();
        let (min, max) = match self.parse_counted_bounds() {
            Some(bounds) => bounds,
            None => {
                self.pos.set(start);
                return Ok(false);
            }
        };
        let greedy = self.parse_greed(last_repeat)?;
        let end = self.pos();
        let too_big = |n: u32| n > hir::MAX_REPEAT;
        if max.map_or(false, |max| max < min)
            || too_big(min)
            || max.map_or(false, too_big)
        {
            return Err(self.error(ErrorKind::RepeatSize, start, end));
        }
        let sub = match concat.pop() {
            Some(hir) => Box::new(hir),
            None => {
                return Err(self.error(ErrorKind::RepeatArgument, start, end));
            }
        };
        let rep = Hir::repetition(hir::Repetition { min, max, greedy, sub });
        if (min >= 2 || max.map_or(false, |max| max >= 2))
            && rep.repetition_product() > u64::from(hir::MAX_REPEAT)
        {
            return Err(self.error(ErrorKind::RepeatSize, start, end));
        }
        concat.push(rep);
        Ok(true)
    }

    /// Parses `{n}`, `{n,}` or `{n,m}` at the current position.
    fn parse_counted_bounds(&self) -> Option<(u32, Option<u32>)> {
        if !self.is('{') {
            return None;
        }
        self.bump();
        let min = self.parse_integer()?;
        if self.is_done() {
            return None;
        }
        let max = if self.is(',') {
            self.bump();
            if self.is_done() {
                return None;
            }
            if self.is('}') {
                None
            } else {
                Some(self.parse_integer()?)
            }
        } else {
            Some(min)
        };
        if !self.is('}') {
            return None;
        }
        self.bump();
        Some((min, max))
    }

    /// Parses a decimal number without leading zeros.
    fn parse_integer(&self) -> Option<u32> {
        if self.is_done() || !self.char().is_ascii_digit() {
            return None;
        }
        if self.char() == '0'
            && self.peek().map_or(false, |c| c.is_ascii_digit())
        {
            return None;
        }
        let mut n: u32 = 0;
        while !self.is_done() && self.char().is_ascii_digit() {
            if n >= 100_000_000 {
                return None;
            }
            n = n * 10 + digit_value(self.char());
            self.bump();
        }
        Some(n)
    }

    /// Parses the part of a pattern that starts with a `(`. This is usually
    /// a group sub-expression, but might just be a directive that enables
    /// (or disables) certain flags.
    ///
    /// This assumes the parser is pointing at the opening `(`. On success,
    /// the parser is left at the closing `)` (or the end of the pattern).
    fn parse_group(&self) -> Result<Option<Hir>, Error> {
        let start = self.pos();
        self.bump();
        if self.config.perl_extensions && self.is('?') {
            return self.parse_perl_group(start);
        }
        self.parse_capture(None)
    }

    fn parse_capture(&self, name: Option<String>) -> Result<Option<Hir>, Error> {
        if self.config.never_capture {
            return self.parse_inner().map(Some);
        }
        let index = self.next_capture_index()?;
        let sub = Box::new(self.parse_inner()?);
        let name = name.map(Box::from);
        Ok(Some(Hir::capture(hir::Capture { index, name, sub })))
    }

    /// Parses a group beginning with `(?`: a named capture, a flag
    /// directive or a non-capturing group with flags.
    ///
    /// `start` is the position of the `(`. The parser is positioned at the
    /// `?`.
    fn parse_perl_group(&self, start: usize) -> Result<Option<Hir>, Error> {
        let rest = &self.pattern[start..];
        // Look-around is rejected outright.
        let look = (rest.len() > 3 && (rest[2] == '=' || rest[2] == '!'))
            || (rest.len() > 4
                && rest[2] == '<'
                && (rest[3] == '=' || rest[3] == '!'));
        if look {
            let n = if rest[2] == '<' { 4 } else { 3 };
            return Err(self.error(ErrorKind::BadPerlOp, start, start + n));
        }
        let named = (rest.len() > 4 && rest[2] == 'P' && rest[3] == '<')
            || (rest.len() > 3 && rest[2] == '<');
        if named {
            let begin = start + if rest[2] == 'P' { 4 } else { 3 };
            let end = match rest[2..].iter().position(|&c| c == '>') {
                Some(i) => start + 2 + i,
                None => {
                    let len = self.pattern.len();
                    return Err(self.error(
                        ErrorKind::BadNamedCapture,
                        start,
                        len,
                    ));
                }
            };
            let name = self.text(begin, end);
            if !is_capture_name(&name) || !self.add_capture_name(&name) {
                return Err(self.error(
                    ErrorKind::BadNamedCapture,
                    start,
                    end + 1,
                ));
            }
            self.pos.set(end + 1);
            return self.parse_capture(Some(name));
        }

        // Otherwise, this is a flag group: `(?flags)` or `(?flags:re)`.
        self.bump();
        let mut flags = self.flags();
        let mut negated = false;
        let mut sawflag = false;
        let bad = || self.error(ErrorKind::BadPerlOp, start, self.pos());
        loop {
            if self.is_done() {
                return Err(bad());
            }
            let ch = self.char();
            self.bump();
            match ch {
                'i' => {
                    sawflag = true;
                    flags.case_insensitive = !negated;
                }
                'm' => {
                    sawflag = true;
                    flags.multi_line = !negated;
                }
                's' => {
                    sawflag = true;
                    flags.dot_matches_new_line = !negated;
                }
                'U' => {
                    sawflag = true;
                    flags.swap_greed = !negated;
                }
                '-' => {
                    if negated {
                        return Err(bad());
                    }
                    negated = true;
                    // Negating nothing is an error, e.g., `(?-)`.
                    sawflag = false;
                }
                ':' | ')' => {
                    if negated && !sawflag {
                        return Err(bad());
                    }
                    *self.flags.borrow_mut() = flags;
                    if ch == ')' {
                        // Leave the parser at the `)` for the caller.
                        self.pos.set(self.pos() - 1);
                        return Ok(None);
                    }
                    return self.parse_inner().map(Some);
                }
                _ => return Err(bad()),
            }
        }
    }

    /// Parses a standard character class, e.g., `[a-z]` or `[^[:digit:]]`.
    ///
    /// This assumes the parser is positioned at the opening `[` and advances
    /// the parser past the closing `]`.
    fn parse_class(&self) -> Result<Hir, Error> {
        let start = self.pos();
        let missing = || {
            self.error(ErrorKind::MissingBracket, start, self.pattern.len())
        };
        self.bump();
        let mut ranges = vec![];
        let mut negated = false;
        if self.is('^') {
            negated = true;
            self.bump();
            // If `\n` can never match, put it in the set so that negation
            // takes it out.
            if self.config.never_nl {
                ranges.push(ClassRange::new('\n', '\n'));
            }
        }
        let mut first = true;
        while !self.is_done() && (self.char() != ']' || first) {
            // A `-` is only a literal at the start or end of a class in
            // POSIX mode.
            if self.char() == '-'
                && !first
                && !self.config.perl_extensions
                && self.peek() != Some(']')
            {
                let end = self.pos() + 2;
                return Err(self.error(ErrorKind::BadCharRange, self.pos(), end));
            }
            first = false;
            if self.is('[') && self.peek() == Some(':') {
                if self.maybe_parse_posix_class(&mut ranges)? {
                    continue;
                }
            }
            if self.is('\\') {
                if let Some(next) = self.peek() {
                    if self.config.perl_extensions
                        && (next == 'p' || next == 'P')
                    {
                        let esc = self.pos();
                        self.bump();
                        self.parse_unicode_class(esc, &mut ranges)?;
                        continue;
                    }
                    if let Some((group, negated)) = self.perl_group(next) {
                        self.bump();
                        self.bump();
                        self.add_group(&mut ranges, group, negated);
                        continue;
                    }
                }
            }
            let range_start = self.pos();
            let lo = self.parse_class_char(&missing)?;
            let mut hi = lo;
            if self.is('-') && self.peek().map_or(false, |c| c != ']') {
                self.bump();
                hi = self.parse_class_char(&missing)?;
                if hi < lo {
                    return Err(self.error(
                        ErrorKind::BadCharRange,
                        range_start,
                        self.pos(),
                    ));
                }
            }
            // Unlike named classes, an explicit range keeps `\n` unless it
            // can never match.
            self.add_range(&mut ranges, lo, hi);
        }
        if self.is_done() {
            return Err(missing());
        }
        self.bump();
        let mut class = Class::new(ranges);
        if negated {
            class.negate(self.max_char());
        }
        Ok(Hir::class(class))
    }

    /// Parses a single character inside a class, which may be escaped.
    fn parse_class_char<F: Fn() -> Error>(
        &self,
        missing: &F,
    ) -> Result<char, Error> {
        if self.is_done() {
            return Err(missing());
        }
        let ch = self.char();
        if ch == '\\' {
            let start = self.pos();
            self.bump();
            return self.parse_escape_char(start);
        }
        self.bump();
        Ok(ch)
    }

    /// Attempt to parse a POSIX character class, e.g., `[:alnum:]`, at the
    /// current position.
    ///
    /// Returns false, without moving the parser, if there is no closing
    /// `:]` anywhere in the rest of the pattern. An unknown name is an error.
    fn maybe_parse_posix_class(
        &self,
        ranges: &mut Vec<ClassRange>,
    ) -> Result<bool, Error> {
        let start = self.pos();
        let len = self.pattern.len();
        let mut q = start + 2;
        while q + 1 < len
            && !(self.pattern[q] == ':' && self.pattern[q + 1] == ']')
        {
            q += 1;
        }
        if q + 1 >= len {
            return Ok(false);
        }
        let name = self.text(start + 2, q);
        let (negated, name) = match name.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, name.as_str()),
        };
        let group = match posix_class(name) {
            Some(group) => group,
            None => {
                return Err(self.error(ErrorKind::BadCharRange, start, q + 2));
            }
        };
        self.pos.set(q + 2);
        self.add_group(ranges, group, negated);
        Ok(true)
    }

    /// Adds a single range, applying case folding and removing `\n` when it
    /// can never match.
    fn add_range(&self, ranges: &mut Vec<ClassRange>, lo: char, hi: char) {
        let mut class = Class::new(vec![ClassRange::new(lo, hi)]);
        if self.config.never_nl {
            class.remove('\n');
        }
        if self.flags().case_insensitive {
            class.ascii_case_fold();
        }
        ranges.extend(class.ranges.iter().copied());
    }

    /// Adds a named group of ranges, or its negation.
    ///
    /// A negated group under case folding is computed by folding the positive
    /// group first, so that `(?i)\W` doesn't match letters of either case.
    fn add_group(
        &self,
        ranges: &mut Vec<ClassRange>,
        group: &[(char, char)],
        negated: bool,
    ) {
        if !negated {
            for &(lo, hi) in group {
                self.add_range(ranges, lo, hi);
            }
            return;
        }
        let mut class =
            Class::new(group.iter().map(|&(lo, hi)| ClassRange::new(lo, hi)));
        if self.flags().case_insensitive {
            class.ascii_case_fold();
        }
        if self.config.never_nl {
            class.ranges.push(ClassRange::new('\n', '\n'));
            class.canonicalize();
        }
        class.negate(self.max_char());
        ranges.extend(class.ranges.iter().copied());
    }

    /// Returns a class matching any character, except `\n` unless `(?s)`
    /// is active.
    fn hir_dot(&self) -> Hir {
        let mut class = Class::new(vec![ClassRange::new('\0', self.max_char())]);
        if !self.flags().dot_matches_new_line || self.config.never_nl {
            class.remove('\n');
        }
        Hir::class(class)
    }

    /// Returns the look for `^`, which depends on the multi-line flag.
    fn hir_anchor_start(&self) -> Hir {
        if self.flags().multi_line {
            Hir::look(Look::StartLine)
        } else {
            Hir::look(Look::StartText)
        }
    }

    /// Returns the look for `$`, which depends on the multi-line flag.
    fn hir_anchor_end(&self) -> Hir {
        if self.flags().multi_line {
            Hir::look(Look::EndLine)
        } else {
            Hir::look(Look::EndText)
        }
    }

    /// Returns a literal character, folding its case if `(?i)` is active.
    fn hir_char(&self, ch: char) -> Hir {
        if self.config.never_nl && ch == '\n' {
            return Hir::fail();
        }
        if self.flags().case_insensitive && ch.is_ascii_alphabetic() {
            let (lower, upper) =
                (ch.to_ascii_lowercase(), ch.to_ascii_uppercase());
            return Hir::class(Class::new(vec![
                ClassRange::new(upper, upper),
                ClassRange::new(lower, lower),
            ]));
        }
        Hir::char(ch)
    }
}

/// This checks the depth of the given `Hir` value, and if it exceeds the given
/// limit, then an error is returned.
fn check_hir_nesting(hir: &Hir, limit: u32) -> Result<(), Error> {
    fn recurse(hir: &Hir, limit: u32, depth: u32) -> Result<(), Error> {
        if depth > limit {
            return Err(Error::new(ErrorKind::PatternTooLarge, ""));
        }
        let next_depth = depth + 1;
        match *hir.kind() {
            HirKind::Empty
            | HirKind::Char(_)
            | HirKind::Class(_)
            | HirKind::AnyByte
            | HirKind::Look(_) => Ok(()),
            HirKind::Repetition(hir::Repetition { ref sub, .. }) => {
                recurse(sub, limit, next_depth)
            }
            HirKind::Capture(hir::Capture { ref sub, .. }) => {
                recurse(sub, limit, next_depth)
            }
            HirKind::Concat(ref subs) | HirKind::Alternation(ref subs) => {
                for sub in subs.iter() {
                    recurse(sub, limit, next_depth)?;
                }
                Ok(())
            }
        }
    }
    recurse(hir, limit, 0)
}

/// Returns the ranges of the named POSIX class, e.g., `alpha`.
fn posix_class(name: &str) -> Option<&'static [(char, char)]> {
    let ranges: &'static [(char, char)] = match name {
        "alnum" => &[('0', '9'), ('A', 'Z'), ('a', 'z')],
        "alpha" => &[('A', 'Z'), ('a', 'z')],
        "ascii" => &[('\x00', '\x7F')],
        "blank" => &[('\t', '\t'), (' ', ' ')],
        "cntrl" => &[('\x00', '\x1F'), ('\x7F', '\x7F')],
        "digit" => &[('0', '9')],
        "graph" => &[('!', '~')],
        "lower" => &[('a', 'z')],
        "print" => &[(' ', '~')],
        "punct" => &[('!', '/'), (':', '@'), ('[', '`'), ('{', '~')],
        "space" => &[('\t', '\r'), (' ', ' ')],
        "upper" => &[('A', 'Z')],
        "word" => PERL_WORD,
        "xdigit" => &[('0', '9'), ('A', 'F'), ('a', 'f')],
        _ => return None,
    };
    Some(ranges)
}

fn is_octal(c: char) -> bool {
    ('0'..='7').contains(&c)
}

/// Returns true if the given character is a hexadecimal digit.
fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn digit_value(c: char) -> u32 {
    c.to_digit(16).unwrap_or(0)
}

/// Returns true if the given string is a valid capture group name:
/// one or more of `[A-Za-z0-9_]`.
fn is_capture_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    fn posix_config() -> Config {
        Config {
            perl_extensions: false,
            perl_classes: false,
            word_boundary: false,
            flags: Flags { multi_line: true, ..Flags::default() },
            ..Config::default()
        }
    }

    fn chars(pattern: &str) -> Vec<char> {
        pattern.chars().collect()
    }

    fn pc(config: Config, pattern: &str) -> Hir {
        Parser::new(config, &chars(pattern)).parse().unwrap()
    }

    fn p(pattern: &str) -> Hir {
        pc(config(), pattern)
    }

    fn perrc(config: Config, pattern: &str) -> (ErrorKind, String) {
        let err = Parser::new(config, &chars(pattern)).parse().unwrap_err();
        (err.kind(), err.arg().to_string())
    }

    fn perr(pattern: &str) -> (ErrorKind, String) {
        perrc(config(), pattern)
    }

    fn class<I: IntoIterator<Item = (char, char)>>(it: I) -> Hir {
        Hir::class(Class::new(
            it.into_iter().map(|(start, end)| ClassRange { start, end }),
        ))
    }

    fn cap(index: u32, sub: Hir) -> Hir {
        Hir::capture(hir::Capture { index, name: None, sub: Box::new(sub) })
    }

    fn rep(min: u32, max: Option<u32>, greedy: bool, sub: Hir) -> Hir {
        Hir::repetition(hir::Repetition {
            min,
            max,
            greedy,
            sub: Box::new(sub),
        })
    }

    #[test]
    fn ok_literal() {
        assert_eq!(p("a"), Hir::char('a'));
        assert_eq!(p("ab"), Hir::concat(vec![Hir::char('a'), Hir::char('b')]));
        assert_eq!(p(r"\{"), Hir::char('{'));
        assert_eq!(p(r"\_"), Hir::char('_'));
        assert_eq!(p(r"\n"), Hir::char('\n'));
        assert_eq!(p(r"\x41"), Hir::char('A'));
        assert_eq!(p(r"\x{263a}"), Hir::char('\u{263a}'));
        assert_eq!(p(r"\012"), Hir::char('\n'));
        assert_eq!(p(r"\0"), Hir::char('\0'));
    }

    #[test]
    fn ok_literal_mode() {
        let config = Config { literal: true, ..Config::default() };
        assert_eq!(
            pc(config, "a+"),
            Hir::concat(vec![Hir::char('a'), Hir::char('+')])
        );
    }

    #[test]
    fn ok_quoted() {
        assert_eq!(
            p(r"\Qa.b\E+"),
            Hir::concat(vec![
                Hir::char('a'),
                Hir::char('.'),
                rep(1, None, true, Hir::char('b')),
            ])
        );
        assert_eq!(p(r"\Q*"), Hir::char('*'));
    }

    #[test]
    fn ok_counted_repetition() {
        assert_eq!(p("a{2}"), rep(2, Some(2), true, Hir::char('a')));
        assert_eq!(p("a{2,}?"), rep(2, None, false, Hir::char('a')));
        assert_eq!(p("a{2,5}"), rep(2, Some(5), true, Hir::char('a')));
        // Malformed counted repetitions are literals.
        assert_eq!(
            p("a{,5}"),
            Hir::concat("a{,5}".chars().map(Hir::char).collect())
        );
        assert_eq!(
            p("a{01}"),
            Hir::concat("a{01}".chars().map(Hir::char).collect())
        );
        assert_eq!(p("{"), Hir::char('{'));
    }

    #[test]
    fn ok_flags() {
        assert_eq!(p("(?i)a"), class([('A', 'A'), ('a', 'a')]));
        assert_eq!(p("(?i:a)b"), Hir::concat(vec![
            class([('A', 'A'), ('a', 'a')]),
            Hir::char('b'),
        ]));
        assert_eq!(p("(?U)a*"), rep(0, None, false, Hir::char('a')));
        assert_eq!(p("(?U)a*?"), rep(0, None, true, Hir::char('a')));
        assert_eq!(p("^"), Hir::look(Look::StartText));
        assert_eq!(p("(?m)^$"), Hir::concat(vec![
            Hir::look(Look::StartLine),
            Hir::look(Look::EndLine),
        ]));
        assert_eq!(p("(?)a"), Hir::char('a'));
    }

    #[test]
    fn ok_dot() {
        assert_eq!(p("."), class([('\0', '\t'), ('\x0B', char::MAX)]));
        assert_eq!(p("(?s)."), class([('\0', char::MAX)]));
        let latin1 = Config { latin1: true, ..Config::default() };
        assert_eq!(pc(latin1, "."), class([('\0', '\t'), ('\x0B', '\u{FF}')]));
    }

    #[test]
    fn ok_class() {
        assert_eq!(p("[a-c]"), class([('a', 'c')]));
        assert_eq!(p("[]a]"), class([(']', ']'), ('a', 'a')]));
        assert_eq!(p("[a-]"), class([('-', '-'), ('a', 'a')]));
        assert_eq!(p("[^a]"), class([('\0', '`'), ('b', char::MAX)]));
        assert_eq!(p(r"[\d]"), class([('0', '9')]));
        assert_eq!(p("[[:digit:]x]"), class([('0', '9'), ('x', 'x')]));
        assert_eq!(
            p("[[:^alpha:]]"),
            class([('\0', '@'), ('[', '`'), ('{', char::MAX)])
        );
        assert_eq!(p("(?i)[k]"), class([('K', 'K'), ('k', 'k')]));
        assert_eq!(p(r"\P{Any}"), Hir::fail());
        assert_eq!(p(r"\p{^Any}"), Hir::fail());
        assert_eq!(p(r"\p{Any}"), class([('\0', char::MAX)]));
    }

    #[test]
    fn ok_never_nl() {
        let config = Config { never_nl: true, ..Config::default() };
        assert_eq!(pc(config, "\n"), Hir::fail());
        assert_eq!(pc(config, "[^a]"), class([
            ('\0', '\t'),
            ('\x0B', '`'),
            ('b', char::MAX),
        ]));
        assert_eq!(pc(config, "[\n-\x0B]"), class([('\x0B', '\x0B')]));
    }

    #[test]
    fn ok_groups() {
        assert_eq!(p("(a)"), cap(1, Hir::char('a')));
        assert_eq!(
            p("(a)(?:b)(c)"),
            Hir::concat(vec![
                cap(1, Hir::char('a')),
                Hir::char('b'),
                cap(2, Hir::char('c')),
            ])
        );
        let config = Config { never_capture: true, ..Config::default() };
        assert_eq!(pc(config, "(a)"), Hir::char('a'));
    }

    #[test]
    fn ok_posix_syntax() {
        let config = posix_config();
        // Stacked repetitions nest in POSIX mode.
        assert_eq!(
            pc(config, "a**"),
            rep(0, None, true, rep(0, None, true, Hir::char('a')))
        );
        assert_eq!(pc(config, "^"), Hir::look(Look::StartLine));
        assert_eq!(perrc(config, r"\b").0, ErrorKind::BadEscape);
        // Without Perl extensions, `(?` is a group starting with `?`.
        assert_eq!(
            perrc(config, "(?i)"),
            (ErrorKind::RepeatArgument, "?".to_string())
        );
    }

    #[test]
    fn capture_indices() {
        let hir = p("(?P<A>expr(?P<B>expr)(?P<C>expr))((expr)(?P<D>expr))");
        let mut names = vec![];
        let mut stack = vec![&hir];
        while let Some(h) = stack.pop() {
            if let HirKind::Capture(ref c) = *h.kind() {
                names.push((c.index, c.name.as_deref().map(String::from)));
            }
            for sub in h.kind().subs().iter().rev() {
                stack.push(sub);
            }
        }
        assert_eq!(
            names,
            vec![
                (1, Some("A".to_string())),
                (2, Some("B".to_string())),
                (3, Some("C".to_string())),
                (4, None),
                (5, None),
                (6, Some("D".to_string())),
            ]
        );
    }

    #[test]
    fn err_escape() {
        use ErrorKind::*;
        assert_eq!(perr(r"\8"), (BadEscape, r"\8".to_string()));
        assert_eq!(perr(r"a\1"), (BadEscape, r"\1".to_string()));
        assert_eq!(perr(r"\q"), (BadEscape, r"\q".to_string()));
        assert_eq!(perr(r"\xZZ"), (BadEscape, r"\xZZ".to_string()));
        assert_eq!(perr(r"\x{}"), (BadEscape, r"\x{}".to_string()));
        assert_eq!(perr(r"\x{110000}").0, BadEscape);
        assert_eq!(perr("a\\"), (TrailingBackslash, "".to_string()));
        assert_eq!(perr(r"[\b]"), (BadEscape, r"\b".to_string()));
        let latin1 = Config { latin1: true, ..Config::default() };
        assert_eq!(perrc(latin1, r"\x{100}").0, BadEscape);
    }

    #[test]
    fn err_repetition() {
        use ErrorKind::*;
        assert_eq!(perr("*"), (RepeatArgument, "*".to_string()));
        assert_eq!(perr("(*)"), (RepeatArgument, "*".to_string()));
        assert_eq!(perr("a|*"), (RepeatArgument, "*".to_string()));
        assert_eq!(perr("{1}"), (RepeatArgument, "{1}".to_string()));
        assert_eq!(perr("a**"), (RepeatOp, "**".to_string()));
        assert_eq!(perr("a*+"), (RepeatOp, "*+".to_string()));
        assert_eq!(perr("a??*"), (RepeatOp, "??*".to_string()));
        assert_eq!(perr("a{1001}"), (RepeatSize, "{1001}".to_string()));
        assert_eq!(perr("a{2,1}"), (RepeatSize, "{2,1}".to_string()));
        assert_eq!(perr("(a{100}){11}"), (RepeatSize, "{11}".to_string()));
        assert_eq!(perr("((a{2}){2}){251}").0, RepeatSize);
        // Exactly at the limit is fine.
        p("(a{10}){100}");
        p("a{1000}");
    }

    #[test]
    fn err_groups() {
        use ErrorKind::*;
        assert_eq!(perr("(abc"), (MissingParen, "(abc".to_string()));
        assert_eq!(perr("a)"), (UnexpectedParen, "a)".to_string()));
        assert_eq!(perr("(?=a)"), (BadPerlOp, "(?=".to_string()));
        assert_eq!(perr("(?<!a)"), (BadPerlOp, "(?<!".to_string()));
        assert_eq!(perr("(?x)"), (BadPerlOp, "(?x".to_string()));
        assert_eq!(perr("(?i-)"), (BadPerlOp, "(?i-)".to_string()));
        assert_eq!(perr("(?--i)"), (BadPerlOp, "(?--".to_string()));
        assert_eq!(perr("(?i"), (BadPerlOp, "(?i".to_string()));
        assert_eq!(perr("(?P<n>a)(?P<n>b)"), (
            BadNamedCapture,
            "(?P<n>".to_string()
        ));
        assert_eq!(perr("(?P<a-b>x)"), (
            BadNamedCapture,
            "(?P<a-b>".to_string()
        ));
        assert_eq!(perr("(?P<name"), (
            BadNamedCapture,
            "(?P<name".to_string()
        ));
        assert_eq!(perr("(?P<>a)"), (BadNamedCapture, "(?P<>".to_string()));
    }

    #[test]
    fn err_class() {
        use ErrorKind::*;
        assert_eq!(perr("[a"), (MissingBracket, "[a".to_string()));
        assert_eq!(perr("x[^a"), (MissingBracket, "[^a".to_string()));
        assert_eq!(perr("[z-a]"), (BadCharRange, "z-a".to_string()));
        assert_eq!(perr("[[:foo:]]"), (BadCharRange, "[:foo:]".to_string()));
        assert_eq!(perr(r"\p{Greek}"), (BadCharRange, r"\p{Greek}".to_string()));
        assert_eq!(perrc(posix_config(), "[a-b-c]"), (
            BadCharRange,
            "-c".to_string()
        ));
        assert_eq!(perrc(posix_config(), r"\pL").0, BadEscape);
        // Perl mode permits a dash anywhere.
        p("[a-b-c]");
    }

    #[test]
    fn err_nesting() {
        let pattern = "(".repeat(300) + &")".repeat(300);
        assert_eq!(perr(&pattern).0, ErrorKind::PatternTooLarge);
    }
}
