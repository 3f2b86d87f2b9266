// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::mem;

use aho_corasick::{AhoCorasick, MatchKind};
use memchr::memchr;
use memchr::memmem::Finder;

use crate::hir::{Hir, HirKind};

/// The most literals a prefix set may hold before we stop growing it.
const LIMIT_COUNT: usize = 64;
/// The longest any single literal may grow.
const LIMIT_LEN: usize = 32;
/// Classes with more characters than this are not expanded into literals.
const LIMIT_CLASS: usize = 10;

/// A searcher for the literal prefixes of a regular expression.
///
/// Every match of the regex begins with one of the literals, so a search can
/// skip straight to the next occurrence of any of them. A regex without
/// useful prefixes gets the `Empty` searcher, which never advances.
///
/// There are a variety of ways to efficiently scan the search text for a
/// prefix:
///
/// 1. The prefix is a single byte. Just use memchr.
/// 2. The prefix is a single string. Use a memmem searcher.
/// 3. In all other cases, build an Aho-Corasick automaton that reports the
///    leftmost occurrence of any literal.
#[derive(Clone, Debug)]
pub enum LiteralSearcher {
    /// No prefixes. (Never advances through the input.)
    Empty,
    /// A single byte prefix.
    Byte(u8),
    /// A single multi-byte prefix.
    Single(Finder<'static>),
    /// Two or more prefixes.
    Multi(AhoCorasick),
}

impl LiteralSearcher {
    /// Returns a matcher that never matches and never advances the input.
    pub fn empty() -> Self {
        LiteralSearcher::Empty
    }

    /// Extracts the prefixes of the given expression and builds a searcher
    /// for them.
    ///
    /// When `latin1` is set, each character contributes one byte instead of
    /// its UTF-8 encoding.
    pub(crate) fn prefixes(expr: &Hir, latin1: bool) -> Self {
        let lits = match prefixes(expr, latin1) {
            None => return LiteralSearcher::Empty,
            Some(lits) => lits,
        };
        LiteralSearcher::new(lits)
    }

    fn new(mut lits: Vec<Vec<u8>>) -> Self {
        lits.sort();
        lits.dedup();
        if lits.is_empty() || lits.iter().any(|lit| lit.is_empty()) {
            return LiteralSearcher::Empty;
        }
        if lits.len() == 1 {
            let lit = &lits[0];
            if lit.len() == 1 {
                return LiteralSearcher::Byte(lit[0]);
            }
            return LiteralSearcher::Single(Finder::new(lit).into_owned());
        }
        match AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostFirst)
            .build(&lits)
        {
            Ok(ac) => LiteralSearcher::Multi(ac),
            Err(err) => {
                log::debug!("could not build prefix automaton: {}", err);
                LiteralSearcher::Empty
            }
        }
    }

    /// Returns true if this searcher has no prefixes.
    pub fn is_empty(&self) -> bool {
        match *self {
            LiteralSearcher::Empty => true,
            _ => false,
        }
    }

    /// Find the position of a literal in `haystack` if it exists.
    pub fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        use self::LiteralSearcher::*;
        match *self {
            Empty => Some((0, 0)),
            Byte(b) => memchr(b, haystack).map(|i| (i, i + 1)),
            Single(ref finder) => finder
                .find(haystack)
                .map(|i| (i, i + finder.needle().len())),
            Multi(ref ac) => ac.find(haystack).map(|m| (m.start(), m.end())),
        }
    }

    /// Return the approximate heap usage of literals in bytes.
    pub fn approximate_size(&self) -> usize {
        use self::LiteralSearcher::*;
        match *self {
            Empty | Byte(_) => 0,
            Single(ref finder) => finder.needle().len(),
            Multi(ref ac) => ac.memory_usage(),
        }
    }
}

/// Returns a set of literals such that every match of `expr` begins with at
/// least one of them, or `None` if no such set was found.
fn prefixes(expr: &Hir, latin1: bool) -> Option<Vec<Vec<u8>>> {
    let (lits, _) = literals(expr, latin1)?;
    if lits.iter().any(|lit| lit.is_empty()) {
        None
    } else {
        Some(lits)
    }
}

/// Returns the literals that begin every match of `expr`, along with whether
/// the literals are exact, i.e., the whole of every match is one of them.
///
/// `None` means that a match can begin with anything.
fn literals(expr: &Hir, latin1: bool) -> Option<(Vec<Vec<u8>>, bool)> {
    match *expr.kind() {
        HirKind::Empty => Some((vec![vec![]], true)),
        HirKind::Char(ch) => Some((vec![encode(ch, latin1)], true)),
        HirKind::Class(ref cls) => {
            if cls.is_empty() || cls.len() > LIMIT_CLASS {
                return None;
            }
            let mut lits = vec![];
            for r in &cls.ranges {
                for cp in (r.start as u32)..=(r.end as u32) {
                    lits.push(encode(char::from_u32(cp)?, latin1));
                }
            }
            Some((lits, true))
        }
        HirKind::AnyByte => None,
        // Nothing is consumed, but whatever follows can't be extended onto
        // literals that came before without checking the assertion.
        HirKind::Look(_) => Some((vec![vec![]], false)),
        HirKind::Capture(ref cap) => literals(&cap.sub, latin1),
        HirKind::Repetition(ref rep) => {
            if rep.min == 0 {
                Some((vec![vec![]], false))
            } else {
                let (lits, _) = literals(&rep.sub, latin1)?;
                Some((lits, false))
            }
        }
        HirKind::Alternation(ref subs) => {
            let mut lits = vec![];
            let mut exact = true;
            for sub in subs {
                let (sublits, subexact) = literals(sub, latin1)?;
                lits.extend(sublits);
                exact = exact && subexact;
                if lits.len() > LIMIT_COUNT {
                    return None;
                }
            }
            Some((lits, exact))
        }
        HirKind::Concat(ref subs) => {
            let mut lits = vec![vec![]];
            for sub in subs {
                let (sublits, subexact) = match literals(sub, latin1) {
                    None => return Some((lits, false)),
                    Some(x) => x,
                };
                if lits.len() * sublits.len() > LIMIT_COUNT {
                    return Some((lits, false));
                }
                let mut next = Vec::with_capacity(lits.len() * sublits.len());
                for prefix in mem::replace(&mut lits, vec![]) {
                    for suffix in &sublits {
                        let mut lit = prefix.clone();
                        lit.extend_from_slice(suffix);
                        lit.truncate(LIMIT_LEN);
                        next.push(lit);
                    }
                }
                lits = next;
                if !subexact || lits.iter().any(|lit| lit.len() >= LIMIT_LEN)
                {
                    return Some((lits, false));
                }
            }
            Some((lits, true))
        }
    }
}

fn encode(ch: char, latin1: bool) -> Vec<u8> {
    if latin1 {
        vec![ch as u32 as u8]
    } else {
        let mut buf = [0; 4];
        ch.encode_utf8(&mut buf).as_bytes().to_vec()
    }
}
