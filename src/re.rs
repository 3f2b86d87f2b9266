// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;
use std::str::{self, FromStr};
use std::sync::Arc;

use log::error;

use crate::error::{Error, ErrorKind, RewriteError};
use crate::exec::{Exec, ExecBuilder, MatchEngine};
use crate::expand;
use crate::input::{Anchor, Slot};
use crate::re_builder::{Encoding, Options};

/// Escapes all regular expression meta characters in `text`.
///
/// The bytes returned may be safely used as a literal in a regular
/// expression: every byte other than an ASCII letter, digit or `_` is
/// escaped, except that bytes of multi-byte characters are copied as is and
/// a NUL byte becomes `\x00`.
pub fn quote_meta<B: AsRef<[u8]>>(text: B) -> Vec<u8> {
    let text = text.as_ref();
    let mut quoted = Vec::with_capacity(text.len() * 2);
    for &b in text {
        if b == 0 {
            quoted.extend_from_slice(b"\\x00");
            continue;
        }
        if !b.is_ascii_alphanumeric() && b != b'_' && b < 0x80 {
            quoted.push(b'\\');
        }
        quoted.push(b);
    }
    quoted
}

/// Returns the largest group number that the rewrite template refers to
/// with `\N`, or `0` if it refers to none.
pub fn max_submatch<B: AsRef<[u8]>>(rewrite: B) -> usize {
    expand::max_submatch(rewrite.as_ref())
}

/// A compiled regular expression for searching bytes.
///
/// A `Regex` is immutable. It may be cloned cheaply and shared between
/// threads; each concurrent search borrows its own scratch space.
///
/// All searching is done with an implicit `.*?` at the beginning of an
/// expression unless the search is anchored. All positions are byte offsets
/// into the haystack.
///
/// # Examples
///
/// ```rust
/// # use regex_re2::Regex;
/// let re = Regex::new("[0-9]{3}-[0-9]{3}-[0-9]{4}").unwrap();
/// assert_eq!(re.find(b"phone: 111-222-3333"), Some((7, 19)));
/// ```
#[derive(Clone)]
pub struct Regex {
    pattern: Arc<[u8]>,
    options: Options,
    exec: Exec,
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.pattern))
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Regex")
            .field(&String::from_utf8_lossy(&self.pattern))
            .finish()
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    fn from_str(s: &str) -> Result<Regex, Error> {
        Regex::new(s)
    }
}

impl Regex {
    /// Compiles a regular expression with the default options. Once
    /// compiled, it can be used repeatedly to search, split or replace text.
    pub fn new<P: AsRef<[u8]>>(pattern: P) -> Result<Regex, Error> {
        Regex::with_options(pattern, Options::default())
    }

    /// Compiles a regular expression with the given options.
    pub fn with_options<P: AsRef<[u8]>>(
        pattern: P,
        options: Options,
    ) -> Result<Regex, Error> {
        Regex::with_engine(pattern.as_ref(), options, MatchEngine::Automatic)
    }

    pub(crate) fn with_engine(
        pattern: &[u8],
        options: Options,
        match_engine: MatchEngine,
    ) -> Result<Regex, Error> {
        let compiled = decode_pattern(pattern, options.encoding()).and_then(
            |chars| {
                ExecBuilder::new(&chars, options.parser_config())
                    .max_mem(options.max_mem())
                    .longest(options.longest_match())
                    .match_engine(match_engine)
                    .build()
            },
        );
        match compiled {
            Ok(exec) => {
                Ok(Regex { pattern: Arc::from(pattern), options, exec })
            }
            Err(err) => {
                let err = err.with_pattern(String::from_utf8_lossy(pattern));
                if options.log_errors() {
                    error!("Error parsing '{}': {}", err.pattern(), err);
                }
                Err(err)
            }
        }
    }

    /// Returns true if and only if the regex matches somewhere in `text`.
    ///
    /// This only decides whether there is a match, which is the fastest
    /// question to answer.
    pub fn is_match(&self, text: &[u8]) -> bool {
        self.exec.is_match(text, 0, text.len(), Anchor::Unanchored)
    }

    /// Returns true if and only if the regex matches all of `text`.
    pub fn full_match(&self, text: &[u8]) -> bool {
        self.exec.is_match(text, 0, text.len(), Anchor::AnchorBoth)
    }

    /// Returns the start and end byte range of the leftmost match in
    /// `text`. If no match exists, then `None` is returned.
    pub fn find(&self, text: &[u8]) -> Option<(usize, usize)> {
        self.find_at(text, 0)
    }

    /// Returns an iterator for each successive non-overlapping match in
    /// `text`, returning the start and end byte indices with respect to
    /// `text`.
    ///
    /// An empty match right where the previous match ended is skipped.
    pub fn find_iter<'r, 't>(&'r self, text: &'t [u8]) -> Matches<'r, 't> {
        Matches { re: self, text, last_end: 0, last_match: None }
    }

    /// Returns the capture groups of the leftmost match in `text`. If no
    /// match is found, then `None` is returned.
    ///
    /// Group `0` always corresponds to the entire match.
    pub fn captures<'t>(&self, text: &'t [u8]) -> Option<Captures<'t>> {
        self.captures_at(text, 0, text.len(), Anchor::Unanchored)
    }

    /// Returns the capture groups of the first match in `text[start..end]`
    /// with the given anchoring.
    ///
    /// Assertions such as `^` and `\b` look at all of `text`, so `^` never
    /// matches at `start > 0` unless it is a line anchor after a `\n`.
    pub fn captures_at<'t>(
        &self,
        text: &'t [u8],
        start: usize,
        end: usize,
        anchor: Anchor,
    ) -> Option<Captures<'t>> {
        let ngroups = self.number_of_capturing_groups() + 1;
        let locs = self.exec_slots(text, start, end, anchor, ngroups)?;
        Some(Captures {
            text,
            locs,
            named_groups: self.exec.prog().capture_name_idx.clone(),
        })
    }

    /// Searches `text[start..end]` and returns the bounds of the first
    /// `nsubmatch` groups of the match, group `0` being the whole match.
    ///
    /// Groups beyond those of the regex, and groups that didn't take part
    /// in the match, are `None`. With `nsubmatch == 0`, only whether there
    /// is a match is computed. An invalid range never matches.
    pub fn search(
        &self,
        text: &[u8],
        start: usize,
        end: usize,
        anchor: Anchor,
        nsubmatch: usize,
    ) -> Option<Vec<Option<(usize, usize)>>> {
        let locs = self.exec_slots(text, start, end, anchor, nsubmatch)?;
        let mut groups: Vec<_> =
            locs.chunks(2).map(|pair| group_span(pair)).collect();
        groups.resize(nsubmatch, None);
        Some(groups)
    }

    /// Matches the regex at the start of `input` and, on success, advances
    /// `input` past the match.
    ///
    /// Returns the text of groups `1..` of the match.
    pub fn consume<'t>(
        &self,
        input: &mut &'t [u8],
    ) -> Option<Vec<Option<&'t [u8]>>> {
        self.consume_anchored(input, Anchor::AnchorStart)
    }

    /// Like `consume`, but the match may begin anywhere in `input`. The
    /// text before the match is skipped along with the match.
    pub fn find_and_consume<'t>(
        &self,
        input: &mut &'t [u8],
    ) -> Option<Vec<Option<&'t [u8]>>> {
        self.consume_anchored(input, Anchor::Unanchored)
    }

    fn consume_anchored<'t>(
        &self,
        input: &mut &'t [u8],
        anchor: Anchor,
    ) -> Option<Vec<Option<&'t [u8]>>> {
        let text: &'t [u8] = *input;
        let caps = self.captures_at(text, 0, text.len(), anchor)?;
        let (_, end) = caps.pos(0)?;
        let groups = (1..caps.len()).map(|i| caps.get(i)).collect();
        *input = &text[end..];
        Some(groups)
    }

    /// Returns an iterator of substrings of `text` delimited by a match of
    /// the regular expression. Namely, each element of the iterator
    /// corresponds to text that *isn't* matched by the regular expression.
    ///
    /// Matches are found as with `find_iter`. The text after the last
    /// match is always yielded, even if it is empty.
    pub fn split<'r, 't>(&'r self, text: &'t [u8]) -> Split<'r, 't> {
        Split { finder: self.find_iter(text), last: 0, remaining: None }
    }

    /// Like `split`, but yields at most `limit` pieces. The last piece is
    /// whatever remains after the first `limit - 1` matches.
    pub fn splitn<'r, 't>(
        &'r self,
        text: &'t [u8],
        limit: usize,
    ) -> Split<'r, 't> {
        Split { finder: self.find_iter(text), last: 0, remaining: Some(limit) }
    }

    /// Replaces the leftmost match in `text` with `rewrite`, in which `\0`
    /// to `\9` refer to capture groups and `\\` is a backslash.
    ///
    /// Returns the new text and whether a replacement happened. A malformed
    /// template is rejected before searching.
    pub fn replace(
        &self,
        text: &[u8],
        rewrite: &[u8],
    ) -> Result<(Vec<u8>, bool), RewriteError> {
        self.check_rewrite_logged(rewrite)?;
        let nsubmatch = 1 + expand::max_submatch(rewrite);
        let locs = match self.exec_slots(
            text,
            0,
            text.len(),
            Anchor::Unanchored,
            nsubmatch,
        ) {
            None => return Ok((text.to_vec(), false)),
            Some(locs) => locs,
        };
        let (s, e) = match group_span(&locs) {
            None => return Ok((text.to_vec(), false)),
            Some(span) => span,
        };
        let mut new = Vec::with_capacity(text.len());
        new.extend_from_slice(&text[..s]);
        self.expand_logged(&mut new, rewrite, &group_texts(text, &locs))?;
        new.extend_from_slice(&text[e..]);
        Ok((new, true))
    }

    /// Replaces every non-overlapping match in `text` with `rewrite`.
    ///
    /// Returns the new text and the number of replacements. Matches are
    /// found as with `find_iter`: after an empty match the search moves on
    /// by one character, so `b*` in `"aa"` replaced by `-` gives `-a-a-`.
    pub fn replace_all(
        &self,
        text: &[u8],
        rewrite: &[u8],
    ) -> Result<(Vec<u8>, usize), RewriteError> {
        self.check_rewrite_logged(rewrite)?;
        let nsubmatch = 1 + expand::max_submatch(rewrite);
        let mut new = Vec::with_capacity(text.len());
        let mut count = 0;
        let mut at = 0;
        let mut last_end = None;
        while at <= text.len() {
            let locs = match self.exec_slots(
                text,
                at,
                text.len(),
                Anchor::Unanchored,
                nsubmatch,
            ) {
                None => break,
                Some(locs) => locs,
            };
            let (s, e) = match group_span(&locs) {
                None => break,
                Some(span) => span,
            };
            new.extend_from_slice(&text[at..s]);
            if s == e && Some(s) == last_end {
                // An empty match where the last one ended. Copy over the
                // next character and look again after it.
                if at >= text.len() {
                    break;
                }
                let next = at + self.char_len(text, at);
                new.extend_from_slice(&text[at..next]);
                at = next;
                continue;
            }
            self.expand_logged(&mut new, rewrite, &group_texts(text, &locs))?;
            at = e;
            last_end = Some(e);
            count += 1;
        }
        if count == 0 {
            return Ok((text.to_vec(), 0));
        }
        if at < text.len() {
            new.extend_from_slice(&text[at..]);
        }
        Ok((new, count))
    }

    /// Expands `rewrite` against the leftmost match in `text`, discarding
    /// the rest of the text.
    ///
    /// Returns `None` if there is no match.
    pub fn extract(
        &self,
        text: &[u8],
        rewrite: &[u8],
    ) -> Result<Option<Vec<u8>>, RewriteError> {
        self.check_rewrite_logged(rewrite)?;
        let nsubmatch = 1 + expand::max_submatch(rewrite);
        let locs = match self.exec_slots(
            text,
            0,
            text.len(),
            Anchor::Unanchored,
            nsubmatch,
        ) {
            None => return Ok(None),
            Some(locs) => locs,
        };
        let mut out = vec![];
        self.expand_logged(&mut out, rewrite, &group_texts(text, &locs))?;
        Ok(Some(out))
    }

    /// Appends `rewrite` to `out`, with each `\N` replaced by `groups[N]`.
    ///
    /// Fails if the template is malformed or refers to a group beyond the
    /// end of `groups`.
    pub fn rewrite(
        &self,
        out: &mut Vec<u8>,
        rewrite: &[u8],
        groups: &[Option<&[u8]>],
    ) -> Result<(), RewriteError> {
        self.expand_logged(out, rewrite, groups)
    }

    /// Checks that `rewrite` is a well formed template for this regex:
    /// only `\0` to `\9` and `\\` escapes, with no group beyond the number
    /// of capturing groups.
    pub fn check_rewrite_string(
        &self,
        rewrite: &[u8],
    ) -> Result<(), RewriteError> {
        expand::check(rewrite, self.number_of_capturing_groups())
    }

    /// Returns the pattern this regex was compiled from.
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Returns the options this regex was compiled with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The number of instructions in the forward program. A rough measure
    /// of the cost of the regex.
    pub fn program_size(&self) -> usize {
        self.exec.prog().len()
    }

    /// The number of instructions in the reverse program, or `None` if it
    /// didn't fit in its share of the memory budget.
    pub fn reverse_program_size(&self) -> Option<usize> {
        self.exec.reverse_prog().map(|prog| prog.len())
    }

    /// The number of capturing groups, not counting the whole match.
    pub fn number_of_capturing_groups(&self) -> usize {
        self.exec.prog().captures.len() - 1
    }

    /// Maps the name of each named group to its index.
    pub fn named_capturing_groups(&self) -> &HashMap<String, usize> {
        &self.exec.prog().capture_name_idx
    }

    /// Maps the index of each named group to its name.
    pub fn capturing_group_names(&self) -> BTreeMap<usize, &str> {
        self.exec
            .prog()
            .captures
            .iter()
            .enumerate()
            .filter_map(|(i, name)| name.as_deref().map(|name| (i, name)))
            .collect()
    }

    /// Returns a range `(min, max)` such that every match of the regex
    /// anchored at the start of a text satisfies `min <= m <= max` in byte
    /// order, looking only at the first `max_len` bytes of each match.
    ///
    /// Returns `None` if no useful range exists, e.g., when a match can
    /// begin with arbitrarily many `\xFF` bytes.
    pub fn possible_match_range(
        &self,
        max_len: usize,
    ) -> Option<(Vec<u8>, Vec<u8>)> {
        self.exec.possible_match_range(max_len)
    }

    fn find_at(&self, text: &[u8], start: usize) -> Option<(usize, usize)> {
        let locs =
            self.exec_slots(text, start, text.len(), Anchor::Unanchored, 1)?;
        group_span(&locs)
    }

    /// Runs a search asking for `nsubmatch` groups and returns their slots,
    /// at most two per group of the regex.
    fn exec_slots(
        &self,
        text: &[u8],
        start: usize,
        end: usize,
        anchor: Anchor,
        nsubmatch: usize,
    ) -> Option<Vec<Slot>> {
        if start > end || end > text.len() {
            if self.options.log_errors() {
                error!(
                    "invalid search range {}..{} of {}",
                    start,
                    end,
                    text.len()
                );
            }
            return None;
        }
        let ngroups = self.number_of_capturing_groups() + 1;
        let mut locs = vec![None; 2 * std::cmp::min(nsubmatch, ngroups)];
        if self.exec.search(text, start, end, anchor, &mut locs) {
            Some(locs)
        } else {
            None
        }
    }

    fn check_rewrite_logged(
        &self,
        rewrite: &[u8],
    ) -> Result<(), RewriteError> {
        self.check_rewrite_string(rewrite).map_err(|err| {
            self.log_rewrite_error(rewrite, &err);
            err
        })
    }

    fn expand_logged(
        &self,
        out: &mut Vec<u8>,
        rewrite: &[u8],
        groups: &[Option<&[u8]>],
    ) -> Result<(), RewriteError> {
        expand::expand(out, rewrite, groups).map_err(|err| {
            self.log_rewrite_error(rewrite, &err);
            err
        })
    }

    fn log_rewrite_error(&self, rewrite: &[u8], err: &RewriteError) {
        if self.options.log_errors() {
            error!(
                "invalid rewrite pattern '{}': {}",
                String::from_utf8_lossy(rewrite),
                err
            );
        }
    }

    /// The length of the character at `text[at]`. Bytes that don't start a
    /// valid UTF-8 sequence count as one character.
    fn char_len(&self, text: &[u8], at: usize) -> usize {
        if self.options.encoding() == Encoding::Latin1 {
            return 1;
        }
        let len = match text[at] {
            0x00..=0x7F => return 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return 1,
        };
        match text.get(at..at + len) {
            Some(seq) if str::from_utf8(seq).is_ok() => len,
            _ => 1,
        }
    }
}

/// Converts a pattern into characters according to its encoding.
fn decode_pattern(
    pattern: &[u8],
    encoding: Encoding,
) -> Result<Vec<char>, Error> {
    match encoding {
        Encoding::Latin1 => {
            Ok(pattern.iter().map(|&b| char::from(b)).collect())
        }
        Encoding::Utf8 => match str::from_utf8(pattern) {
            Ok(pattern) => Ok(pattern.chars().collect()),
            Err(_) => Err(Error::new(ErrorKind::BadUTF8, "")),
        },
    }
}

/// The span of a group from its pair of slots.
fn group_span(slots: &[Slot]) -> Option<(usize, usize)> {
    match (slots.first(), slots.get(1)) {
        (Some(&Some(s)), Some(&Some(e))) => Some((s, e)),
        _ => None,
    }
}

/// The text of every group in `locs`.
fn group_texts<'t>(text: &'t [u8], locs: &[Slot]) -> Vec<Option<&'t [u8]>> {
    locs.chunks(2)
        .map(|pair| group_span(pair).map(|(s, e)| &text[s..e]))
        .collect()
}

/// Captures represents a group of captured byte strings for a single match.
///
/// The 0th capture always corresponds to the entire match. Each subsequent
/// index corresponds to the next capture group in the regex. If a capture
/// group is named, then the matched string is *also* available via the
/// `name` method. (Note that the 0th capture is always unnamed and so must
/// be accessed with the `get` method.)
///
/// Positions returned from a capture group are always byte indices.
///
/// `'t` is the lifetime of the matched text.
#[derive(Clone, Debug)]
pub struct Captures<'t> {
    text: &'t [u8],
    locs: Vec<Slot>,
    named_groups: Arc<HashMap<String, usize>>,
}

impl<'t> Captures<'t> {
    /// Returns the start and end positions of the Nth capture group. Returns
    /// `None` if `i` is not a valid capture group or if the capture group
    /// did not match anything. The positions returned are *always* byte
    /// indices with respect to the original text matched.
    pub fn pos(&self, i: usize) -> Option<(usize, usize)> {
        self.locs.get(i * 2..i * 2 + 2).and_then(group_span)
    }

    /// Returns the matched text for the capture group `i`. If `i` isn't a
    /// valid capture group or didn't match anything, then `None` is
    /// returned.
    pub fn get(&self, i: usize) -> Option<&'t [u8]> {
        self.pos(i).map(|(s, e)| &self.text[s..e])
    }

    /// Returns the matched text for the capture group named `name`. If
    /// `name` isn't a valid capture group or didn't match anything, then
    /// `None` is returned.
    pub fn name(&self, name: &str) -> Option<&'t [u8]> {
        self.named_groups.get(name).and_then(|&i| self.get(i))
    }

    /// Returns the number of groups, including the whole match.
    #[inline]
    pub fn len(&self) -> usize {
        self.locs.len() / 2
    }

    /// Returns true if and only if there are no groups.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Get a group by index.
///
/// # Panics
///
/// If there is no group at the given index.
impl<'t> Index<usize> for Captures<'t> {
    type Output = [u8];

    fn index(&self, i: usize) -> &[u8] {
        self.get(i).unwrap_or_else(|| panic!("no group at index '{}'", i))
    }
}

/// Get a group by name.
///
/// # Panics
///
/// If there is no group named by the given value.
impl<'t, 'i> Index<&'i str> for Captures<'t> {
    type Output = [u8];

    fn index<'a>(&'a self, name: &'i str) -> &'a [u8] {
        self.name(name).unwrap_or_else(|| panic!("no group named '{}'", name))
    }
}

/// An iterator over all non-overlapping matches for a particular string.
///
/// The iterator yields a tuple of integers corresponding to the start and
/// end of the match. The indices are byte offsets. The iterator stops when
/// no more matches can be found.
///
/// `'r` is the lifetime of the compiled regular expression and `'t` is the
/// lifetime of the matched text.
#[derive(Debug)]
pub struct Matches<'r, 't> {
    re: &'r Regex,
    text: &'t [u8],
    last_end: usize,
    last_match: Option<usize>,
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        loop {
            if self.last_end > self.text.len() {
                return None;
            }
            let (s, e) = self.re.find_at(self.text, self.last_end)?;
            // Don't accept empty matches immediately following a match.
            // i.e., no infinite loops please.
            if s == e && Some(s) == self.last_match {
                if self.last_end >= self.text.len() {
                    return None;
                }
                self.last_end += self.re.char_len(self.text, self.last_end);
                continue;
            }
            self.last_end = e;
            self.last_match = Some(e);
            return Some((s, e));
        }
    }
}

/// Yields all substrings delimited by a regular expression match.
///
/// `'r` is the lifetime of the compiled regular expression and `'t` is the
/// lifetime of the text being split.
#[derive(Debug)]
pub struct Split<'r, 't> {
    finder: Matches<'r, 't>,
    last: usize,
    /// The number of pieces left to yield, if limited.
    remaining: Option<usize>,
}

impl<'r, 't> Iterator for Split<'r, 't> {
    type Item = &'t [u8];

    fn next(&mut self) -> Option<&'t [u8]> {
        let text = self.finder.text;
        if self.last > text.len() {
            return None;
        }
        match self.remaining {
            Some(0) => return None,
            Some(1) => {
                self.remaining = Some(0);
                let rest = &text[self.last..];
                self.last = text.len() + 1;
                return Some(rest);
            }
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        match self.finder.next() {
            None => {
                let rest = &text[self.last..];
                self.last = text.len() + 1;
                Some(rest)
            }
            Some((s, e)) => {
                let piece = &text[self.last..s];
                self.last = e;
                Some(piece)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{max_submatch, quote_meta, Regex};
    use crate::input::Anchor;

    #[test]
    fn quote_meta_escapes() {
        assert_eq!(quote_meta("a.b*c"), b"a\\.b\\*c".to_vec());
        assert_eq!(quote_meta("foo_bar9"), b"foo_bar9".to_vec());
        assert_eq!(quote_meta("a\0b"), b"a\\x00b".to_vec());
        assert_eq!(quote_meta("é"), "é".as_bytes().to_vec());
    }

    #[test]
    fn max_submatch_of_template() {
        assert_eq!(max_submatch("\\2-\\1"), 2);
        assert_eq!(max_submatch("plain"), 0);
    }

    #[test]
    fn char_len_steps_over_characters() {
        let re = Regex::new("x").unwrap();
        let text = "aé☃\u{1F600}".as_bytes();
        assert_eq!(re.char_len(text, 0), 1);
        assert_eq!(re.char_len(text, 1), 2);
        assert_eq!(re.char_len(text, 3), 3);
        assert_eq!(re.char_len(text, 6), 4);
        assert_eq!(re.char_len(b"\xFF\xE2\x98", 0), 1);
        assert_eq!(re.char_len(b"\xE2\x98", 0), 1);
    }

    #[test]
    fn search_pads_groups() {
        let re = Regex::new("(a)(b)?").unwrap();
        assert_eq!(
            re.search(b"xa", 0, 2, Anchor::Unanchored, 4),
            Some(vec![Some((1, 2)), Some((1, 2)), None, None])
        );
        assert_eq!(
            re.search(b"xa", 0, 2, Anchor::Unanchored, 0),
            Some(vec![])
        );
        assert_eq!(re.search(b"xa", 2, 1, Anchor::Unanchored, 1), None);
    }

    #[test]
    fn regex_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Regex>();
    }
}
