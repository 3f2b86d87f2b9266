// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// A capture slot: the byte offset of one end of a capture group, if the
/// group participated in the match.
pub type Slot = Option<usize>;

/// Where a search must match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// A match may start and end anywhere within the searched span.
    Unanchored,
    /// A match must start at the beginning of the searched span.
    AnchorStart,
    /// A match must start at the beginning of the searched span and end at
    /// the end of it.
    AnchorBoth,
}

/// The parameters of a single search, shared by every matching engine.
///
/// The engines only consume bytes in `start..end`. Zero-width assertions
/// still look at the whole haystack, so `^` doesn't match at `start` unless
/// `start` is really the beginning of the text (or follows a `\n` in
/// multi-line mode).
#[derive(Clone, Copy, Debug)]
pub struct Input<'t> {
    haystack: &'t [u8],
    start: usize,
    end: usize,
    anchor: Anchor,
    longest: bool,
}

impl<'t> Input<'t> {
    /// A search of the entire haystack for the leftmost-first match.
    pub fn new(haystack: &'t [u8]) -> Input<'t> {
        Input {
            haystack,
            start: 0,
            end: haystack.len(),
            anchor: Anchor::Unanchored,
            longest: false,
        }
    }

    /// Restrict the search to `start..end` of the haystack.
    pub fn span(mut self, start: usize, end: usize) -> Input<'t> {
        debug_assert!(start <= end && end <= self.haystack.len());
        self.start = start;
        self.end = end;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Input<'t> {
        self.anchor = anchor;
        self
    }

    /// When set, report the leftmost-longest match instead of the
    /// leftmost-first one.
    pub fn longest(mut self, yes: bool) -> Input<'t> {
        self.longest = yes;
        self
    }

    pub fn haystack(&self) -> &'t [u8] {
        self.haystack
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_anchored_start(&self) -> bool {
        self.anchor != Anchor::Unanchored
    }

    pub fn is_anchored_end(&self) -> bool {
        self.anchor == Anchor::AnchorBoth
    }

    pub fn is_longest(&self) -> bool {
        self.longest
    }

    /// The number of bytes in the searched span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns the byte at `at` if it is inside the searched span.
    #[inline(always)]
    pub fn byte(&self, at: usize) -> Option<u8> {
        if at < self.end {
            Some(self.haystack[at])
        } else {
            None
        }
    }

    /// Returns true if a match ending at `at` satisfies the end anchor.
    #[inline(always)]
    pub fn is_end_ok(&self, at: usize) -> bool {
        !self.is_anchored_end() || at == self.end
    }
}
