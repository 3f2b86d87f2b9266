use crate::error::Error;

mod parse;

/// The largest count permitted in a counted repetition, e.g., `a{1000}`.
///
/// This also bounds the product of nested counted repetitions, so that
/// `(a{100}){100}` is rejected.
pub(crate) const MAX_REPEAT: u32 = 1000;

/// The configuration for a regex parser.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Config {
    /// The maximum depth of nested groups and repetitions.
    pub(crate) nest_limit: u32,
    /// Various flags that control how a pattern is interpreted.
    pub(crate) flags: Flags,
    /// When set, patterns and haystacks are Latin-1 and every character is a
    /// single byte.
    pub(crate) latin1: bool,
    /// When set, the entire pattern is a literal string.
    pub(crate) literal: bool,
    /// Perl extensions: non-greedy operators, `(?flags)`, named groups,
    /// `\A`, `\z`, `\C`, `\Q...\E` and Unicode class escapes.
    pub(crate) perl_extensions: bool,
    /// Whether `\d`, `\s` and `\w` are recognized.
    pub(crate) perl_classes: bool,
    /// Whether `\b` and `\B` are recognized.
    pub(crate) word_boundary: bool,
    /// Never match `\n`, even if it appears in the pattern.
    pub(crate) never_nl: bool,
    /// Treat every group as non-capturing.
    pub(crate) never_capture: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            nest_limit: 250,
            flags: Flags::default(),
            latin1: false,
            literal: false,
            perl_extensions: true,
            perl_classes: true,
            word_boundary: true,
            never_nl: false,
            never_capture: false,
        }
    }
}

impl Config {
    /// The largest character a pattern can mention under this configuration.
    fn max_char(&self) -> char {
        if self.latin1 {
            '\u{FF}'
        } else {
            char::MAX
        }
    }
}

/// Various flags that control the interpretation of the pattern.
///
/// These can be set via explicit configuration in code, or change dynamically
/// during parsing via inline flags. For example, `foo(?i:bar)baz` will match
/// `foo` and `baz` case sensitively and `bar` case insensitively.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Flags {
    /// Whether to match case insensitively.
    ///
    /// This is the `i` flag.
    pub(crate) case_insensitive: bool,
    /// Whether `^` and `$` should be treated as line anchors or not.
    ///
    /// This is the `m` flag.
    pub(crate) multi_line: bool,
    /// Whether `.` should match line terminators or not.
    ///
    /// This is the `s` flag.
    pub(crate) dot_matches_new_line: bool,
    /// Whether to swap the meaning of greedy and non-greedy operators.
    ///
    /// This is the `U` flag.
    pub(crate) swap_greed: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Hir {
    kind: HirKind,
    is_start_anchored: bool,
    is_end_anchored: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum HirKind {
    Empty,
    Char(char),
    Class(Class),
    /// Any single byte, regardless of encoding. This is `\C`.
    AnyByte,
    Look(Look),
    Repetition(Repetition),
    Capture(Capture),
    Concat(Vec<Hir>),
    Alternation(Vec<Hir>),
}

impl Hir {
    /// Parses the given pattern with the given configuration into a
    /// structured representation. If the pattern is invalid, then an error
    /// is returned.
    pub(crate) fn parse(config: Config, pattern: &[char]) -> Result<Hir, Error> {
        self::parse::Parser::new(config, pattern).parse()
    }

    /// Returns the underlying kind of this high-level intermediate
    /// representation.
    pub(crate) fn kind(&self) -> &HirKind {
        &self.kind
    }

    /// Returns true if and only if this expression can only match at the
    /// beginning of a haystack.
    pub(crate) fn is_start_anchored(&self) -> bool {
        self.is_start_anchored
    }

    /// Returns true if and only if this expression can only match at the end
    /// of a haystack.
    pub(crate) fn is_end_anchored(&self) -> bool {
        self.is_end_anchored
    }

    /// An expression that never matches anything.
    fn fail() -> Hir {
        Hir::class(Class { ranges: vec![] })
    }

    fn empty() -> Hir {
        Hir {
            kind: HirKind::Empty,
            is_start_anchored: false,
            is_end_anchored: false,
        }
    }

    fn char(ch: char) -> Hir {
        Hir {
            kind: HirKind::Char(ch),
            is_start_anchored: false,
            is_end_anchored: false,
        }
    }

    fn class(class: Class) -> Hir {
        Hir {
            kind: HirKind::Class(class),
            is_start_anchored: false,
            is_end_anchored: false,
        }
    }

    fn any_byte() -> Hir {
        Hir {
            kind: HirKind::AnyByte,
            is_start_anchored: false,
            is_end_anchored: false,
        }
    }

    fn look(look: Look) -> Hir {
        Hir {
            kind: HirKind::Look(look),
            is_start_anchored: look == Look::StartText,
            is_end_anchored: look == Look::EndText,
        }
    }

    fn repetition(rep: Repetition) -> Hir {
        if rep.min == 0 && rep.max == Some(0) {
            return Hir::empty();
        } else if rep.min == 1 && rep.max == Some(1) {
            return *rep.sub;
        }
        let is_start_anchored = rep.min > 0 && rep.sub.is_start_anchored;
        let is_end_anchored = rep.min > 0 && rep.sub.is_end_anchored;
        Hir {
            kind: HirKind::Repetition(rep),
            is_start_anchored,
            is_end_anchored,
        }
    }

    fn capture(cap: Capture) -> Hir {
        let is_start_anchored = cap.sub.is_start_anchored;
        let is_end_anchored = cap.sub.is_end_anchored;
        Hir {
            kind: HirKind::Capture(cap),
            is_start_anchored,
            is_end_anchored,
        }
    }

    fn concat(mut subs: Vec<Hir>) -> Hir {
        if subs.is_empty() {
            return Hir::empty();
        }
        if subs.len() == 1 {
            if let Some(sub) = subs.pop() {
                return sub;
            }
        }
        let is_start_anchored = subs[0].is_start_anchored;
        let is_end_anchored = subs[subs.len() - 1].is_end_anchored;
        Hir {
            kind: HirKind::Concat(subs),
            is_start_anchored,
            is_end_anchored,
        }
    }

    fn alternation(mut subs: Vec<Hir>) -> Hir {
        if subs.is_empty() {
            return Hir::fail();
        }
        if subs.len() == 1 {
            if let Some(sub) = subs.pop() {
                return sub;
            }
        }
        let is_start_anchored = subs.iter().all(|sub| sub.is_start_anchored);
        let is_end_anchored = subs.iter().all(|sub| sub.is_end_anchored);
        Hir {
            kind: HirKind::Alternation(subs),
            is_start_anchored,
            is_end_anchored,
        }
    }

    /// Returns the largest product of nested repetition counts along any
    /// path through this expression.
    ///
    /// The count of a repetition is its maximum, or its minimum when it is
    /// unbounded. Counts of zero don't contribute.
    fn repetition_product(&self) -> u64 {
        let mut stack = vec![(self, 1u64)];
        let mut largest = 1;
        while let Some((hir, product)) = stack.pop() {
            let product = match hir.kind {
                HirKind::Repetition(ref rep) => {
                    let n = u64::from(rep.max.unwrap_or(rep.min));
                    if n > 0 {
                        product.saturating_mul(n)
                    } else {
                        product
                    }
                }
                _ => product,
            };
            largest = core::cmp::max(largest, product);
            for sub in hir.kind.subs() {
                stack.push((sub, product));
            }
        }
        largest
    }
}

impl HirKind {
    /// Returns a slice of this kind's sub-expressions, if any.
    pub(crate) fn subs(&self) -> &[Hir] {
        use core::slice::from_ref;

        match *self {
            HirKind::Empty
            | HirKind::Char(_)
            | HirKind::Class(_)
            | HirKind::AnyByte
            | HirKind::Look(_) => &[],
            HirKind::Repetition(Repetition { ref sub, .. }) => from_ref(sub),
            HirKind::Capture(Capture { ref sub, .. }) => from_ref(sub),
            HirKind::Concat(ref subs) => subs,
            HirKind::Alternation(ref subs) => subs,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Class {
    pub(crate) ranges: Vec<ClassRange>,
}

impl Class {
    /// Create a new class from the given ranges. The ranges may be provided
    /// in any order or may even overlap. They will be automatically
    /// canonicalized.
    fn new<I: IntoIterator<Item = ClassRange>>(ranges: I) -> Class {
        let mut class = Class { ranges: ranges.into_iter().collect() };
        class.canonicalize();
        class
    }

    /// Returns true if this class matches nothing.
    pub(crate) fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the number of characters in this class.
    pub(crate) fn len(&self) -> usize {
        self.ranges
            .iter()
            .map(|r| (u32::from(r.end) - u32::from(r.start) + 1) as usize)
            .sum()
    }

    /// Expand this class such that it matches the ASCII codepoints in this set
    /// case insensitively.
    fn ascii_case_fold(&mut self) {
        let len = self.ranges.len();
        for i in 0..len {
            let range = self.ranges[i];
            range.ascii_case_fold(&mut self.ranges);
        }
        self.canonicalize();
    }

    /// Negate this set with respect to the characters `\x00` through `max`.
    fn negate(&mut self, max: char) {
        const MIN: char = '\x00';

        if self.ranges.is_empty() {
            self.ranges.push(ClassRange { start: MIN, end: max });
            return;
        }
        let drain_end = self.ranges.len();
        if self.ranges[0].start > MIN {
            if let Some(end) = prev_char(self.ranges[0].start) {
                self.ranges.push(ClassRange { start: MIN, end });
            }
        }
        for i in 1..drain_end {
            let gap = next_char(self.ranges[i - 1].end)
                .zip(prev_char(self.ranges[i].start));
            if let Some((start, end)) = gap {
                self.ranges.push(ClassRange { start, end });
            }
        }
        if self.ranges[drain_end - 1].end < max {
            if let Some(start) = next_char(self.ranges[drain_end - 1].end) {
                self.ranges.push(ClassRange { start, end: max });
            }
        }
        self.ranges.drain(..drain_end);
    }

    /// Removes a single character from this set.
    fn remove(&mut self, ch: char) {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        for r in self.ranges.drain(..) {
            if ch < r.start || ch > r.end {
                out.push(r);
                continue;
            }
            if r.start < ch {
                if let Some(end) = prev_char(ch) {
                    out.push(ClassRange { start: r.start, end });
                }
            }
            if ch < r.end {
                if let Some(start) = next_char(ch) {
                    out.push(ClassRange { start, end: r.end });
                }
            }
        }
        self.ranges = out;
    }

    /// Converts this set into a canonical ordering.
    fn canonicalize(&mut self) {
        if self.is_canonical() {
            return;
        }
        self.ranges.sort();
        let drain_end = self.ranges.len();
        for oldi in 0..drain_end {
            // If we've added at least one new range, then check if we can
            // merge this range in the previously added range.
            if self.ranges.len() > drain_end {
                let (last, rest) = match self.ranges.split_last_mut() {
                    Some(split) => split,
                    None => break,
                };
                if let Some(union) = last.union(&rest[oldi]) {
                    *last = union;
                    continue;
                }
            }
            self.ranges.push(self.ranges[oldi]);
        }
        self.ranges.drain(..drain_end);
    }

    /// Returns true if and only if this class is in a canonical ordering.
    fn is_canonical(&self) -> bool {
        for pair in self.ranges.windows(2) {
            if pair[0] >= pair[1] {
                return false;
            }
            if pair[0].is_contiguous(&pair[1]) {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub(crate) struct ClassRange {
    pub(crate) start: char,
    pub(crate) end: char,
}

impl ClassRange {
    fn new(start: char, end: char) -> ClassRange {
        ClassRange { start, end }
    }

    /// Apply simple case folding to this range, adding the opposite case of
    /// any ASCII letters it contains to `ranges`.
    fn ascii_case_fold(&self, ranges: &mut Vec<ClassRange>) {
        // Letters of one case are exactly 32 codepoints from the other.
        let shift = |ch: char, up: bool| -> char {
            let n = u32::from(ch);
            let n = if up { n + 32 } else { n - 32 };
            char::from_u32(n).unwrap_or(ch)
        };
        if !ClassRange::new('a', 'z').is_intersection_empty(self) {
            let start = core::cmp::max(self.start, 'a');
            let end = core::cmp::min(self.end, 'z');
            ranges.push(ClassRange::new(shift(start, false), shift(end, false)));
        }
        if !ClassRange::new('A', 'Z').is_intersection_empty(self) {
            let start = core::cmp::max(self.start, 'A');
            let end = core::cmp::min(self.end, 'Z');
            ranges.push(ClassRange::new(shift(start, true), shift(end, true)));
        }
    }

    /// Union the given overlapping range into this range.
    ///
    /// If the two ranges aren't contiguous, then this returns `None`.
    fn union(&self, other: &ClassRange) -> Option<ClassRange> {
        if !self.is_contiguous(other) {
            return None;
        }
        let start = core::cmp::min(self.start, other.start);
        let end = core::cmp::max(self.end, other.end);
        Some(ClassRange { start, end })
    }

    /// Returns true if and only if the two ranges are contiguous. Two ranges
    /// are contiguous if and only if the ranges are either overlapping or
    /// adjacent.
    fn is_contiguous(&self, other: &ClassRange) -> bool {
        let (s1, e1) = (u32::from(self.start), u32::from(self.end));
        let (s2, e2) = (u32::from(other.start), u32::from(other.end));
        core::cmp::max(s1, s2) <= core::cmp::min(e1, e2).saturating_add(1)
    }

    /// Returns true if and only if the intersection of this range and the
    /// other range is empty.
    fn is_intersection_empty(&self, other: &ClassRange) -> bool {
        let (s1, e1) = (self.start, self.end);
        let (s2, e2) = (other.start, other.end);
        core::cmp::max(s1, s2) > core::cmp::min(e1, e2)
    }
}

/// A zero-width assertion.
///
/// The discriminants double as the empty-width flag bits used by the lazy
/// DFA and the one-pass engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Look {
    /// `^` in multi-line mode: start of text or just after a `\n`.
    StartLine = 1 << 0,
    /// `$` in multi-line mode: end of text or just before a `\n`.
    EndLine = 1 << 1,
    /// `\A`, or `^` outside of multi-line mode.
    StartText = 1 << 2,
    /// `\z`, or `$` outside of multi-line mode.
    EndText = 1 << 3,
    /// `\b`, an ASCII word boundary.
    WordBoundary = 1 << 4,
    /// `\B`, the negation of an ASCII word boundary.
    NotWordBoundary = 1 << 5,
}

impl Look {
    /// Returns true if the given position in the given haystack matches this
    /// assertion.
    pub(crate) fn is_match(&self, haystack: &[u8], at: usize) -> bool {
        use self::Look::*;

        match *self {
            StartLine => at == 0 || haystack[at - 1] == b'\n',
            EndLine => at == haystack.len() || haystack[at] == b'\n',
            StartText => at == 0,
            EndText => at == haystack.len(),
            WordBoundary | NotWordBoundary => {
                let word_before = at > 0 && is_word_byte(haystack[at - 1]);
                let word_after =
                    at < haystack.len() && is_word_byte(haystack[at]);
                (word_before != word_after) == (*self == WordBoundary)
            }
        }
    }

    /// The assertion that means the same thing when the haystack is read
    /// backwards.
    pub(crate) fn reversed(&self) -> Look {
        use self::Look::*;

        match *self {
            StartLine => EndLine,
            EndLine => StartLine,
            StartText => EndText,
            EndText => StartText,
            WordBoundary => WordBoundary,
            NotWordBoundary => NotWordBoundary,
        }
    }

    /// This assertion as a single flag bit.
    pub(crate) fn as_bit(&self) -> u32 {
        *self as u32
    }
}

/// Returns true if the byte is an ASCII word character: `[0-9A-Za-z_]`.
pub(crate) fn is_word_byte(b: u8) -> bool {
    match b {
        b'_' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' => true,
        _ => false,
    }
}

/// The high-level intermediate representation of a repetition operator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Repetition {
    /// The minimum range of the repetition.
    ///
    /// Note that special cases like `?`, `+` and `*` all get translated into
    /// the ranges `{0,1}`, `{1,}` and `{0,}`, respectively.
    pub(crate) min: u32,
    /// The maximum range of the repetition, or `None` if unbounded.
    pub(crate) max: Option<u32>,
    /// Whether this repetition operator prefers to match as much as it can.
    pub(crate) greedy: bool,
    /// The expression being repeated.
    pub(crate) sub: Box<Hir>,
}

/// A capturing group.
///
/// There is no explicit representation of a non-capturing group. Those are
/// handled by the recursive structure of the `Hir` itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Capture {
    /// The capture index of the capture, starting at 1.
    pub(crate) index: u32,
    /// The name of the capture, if it exists.
    pub(crate) name: Option<Box<str>>,
    /// The expression inside the capturing group, which may be empty.
    pub(crate) sub: Box<Hir>,
}

fn next_char(ch: char) -> Option<char> {
    // Skip over the surrogate range.
    if ch == '\u{D7FF}' {
        return Some('\u{E000}');
    }
    char::from_u32(u32::from(ch).checked_add(1)?)
}

fn prev_char(ch: char) -> Option<char> {
    // Skip over the surrogate range.
    if ch == '\u{E000}' {
        return Some('\u{D7FF}');
    }
    char::from_u32(u32::from(ch).checked_sub(1)?)
}

impl Drop for Hir {
    fn drop(&mut self) {
        use core::mem;

        match *self.kind() {
            HirKind::Empty
            | HirKind::Char(_)
            | HirKind::Class(_)
            | HirKind::AnyByte
            | HirKind::Look(_) => return,
            HirKind::Capture(ref x) if x.sub.kind.subs().is_empty() => return,
            HirKind::Repetition(ref x) if x.sub.kind.subs().is_empty() => {
                return
            }
            HirKind::Concat(ref x) if x.is_empty() => return,
            HirKind::Alternation(ref x) if x.is_empty() => return,
            _ => {}
        }

        let mut stack = vec![mem::replace(self, Hir::empty())];
        while let Some(mut expr) = stack.pop() {
            match expr.kind {
                HirKind::Empty
                | HirKind::Char(_)
                | HirKind::Class(_)
                | HirKind::AnyByte
                | HirKind::Look(_) => {}
                HirKind::Capture(ref mut x) => {
                    stack.push(mem::replace(&mut *x.sub, Hir::empty()));
                }
                HirKind::Repetition(ref mut x) => {
                    stack.push(mem::replace(&mut *x.sub, Hir::empty()));
                }
                HirKind::Concat(ref mut x) => {
                    stack.extend(x.drain(..));
                }
                HirKind::Alternation(ref mut x) => {
                    stack.extend(x.drain(..));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(class: &Class) -> Vec<(char, char)> {
        class.ranges.iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn negate_unicode() {
        let mut cls = Class::new(vec![ClassRange::new('a', 'z')]);
        cls.negate(char::MAX);
        assert_eq!(
            vec![('\x00', '`'), ('{', char::MAX)],
            ranges(&cls)
        );
    }

    #[test]
    fn negate_latin1() {
        let mut cls = Class::new(vec![ClassRange::new('\n', '\n')]);
        cls.negate('\u{FF}');
        assert_eq!(vec![('\x00', '\x09'), ('\x0B', '\u{FF}')], ranges(&cls));
    }

    #[test]
    fn fold_and_remove() {
        let mut cls = Class::new(vec![ClassRange::new('a', 'c')]);
        cls.ascii_case_fold();
        assert_eq!(vec![('A', 'C'), ('a', 'c')], ranges(&cls));
        cls.remove('b');
        assert_eq!(vec![('A', 'C'), ('a', 'a'), ('c', 'c')], ranges(&cls));
        assert_eq!(5, cls.len());

        let mut cls = Class::new(vec![ClassRange::new('X', 'c')]);
        cls.ascii_case_fold();
        assert_eq!(vec![('A', 'C'), ('X', 'c'), ('x', 'z')], ranges(&cls));
    }

    #[test]
    fn look_is_match() {
        let hay = b"ab\ncd";
        assert!(Look::StartLine.is_match(hay, 3));
        assert!(!Look::StartText.is_match(hay, 3));
        assert!(Look::EndLine.is_match(hay, 2));
        assert!(Look::WordBoundary.is_match(hay, 2));
        assert!(Look::NotWordBoundary.is_match(hay, 1));
        assert_eq!(Look::EndLine, Look::StartLine.reversed());
    }
}
