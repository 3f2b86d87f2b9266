// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This crate provides regular expressions with RE2's syntax and semantics.
//! Notably, backreferences and arbitrary lookahead/lookbehind assertions are
//! not provided. In return, searching has excellent worst-case performance:
//! once a pattern is compiled, every search runs in time linear in the
//! length of the text.
//!
//! Patterns and haystacks are bytes. By default both are UTF-8, but a regex
//! may instead be compiled for Latin-1, where every byte is a character. All
//! positions reported are byte offsets.
//!
//! # First example: find a date
//!
//! ```rust
//! use regex_re2::Regex;
//! let re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
//! assert!(re.is_match(b"2014-01-01"));
//! ```
//!
//! Every expression is executed with an implicit `.*?` at the beginning,
//! which allows it to match anywhere in the text. Anchors, `full_match` or
//! an anchored `search` restrict where a match may occur.
//!
//! # Leftmost-first and leftmost-longest
//!
//! By default, alternations prefer their left branch and repetitions are
//! greedy, as in Perl: `a|ab` finds `a` in `ab`. With the `longest_match`
//! option (implied by `Options::posix()`), the longest of the leftmost
//! matches wins instead and `a|ab` finds `ab`.
//!
//! # Rewriting
//!
//! `replace`, `replace_all` and `extract` take a template in which `\0` to
//! `\9` stand for capture groups and `\\` stands for a backslash:
//!
//! ```rust
//! use regex_re2::Regex;
//! let re = Regex::new(r"(\w+)@(\w+)").unwrap();
//! let (new, n) = re.replace_all(b"bob@a and al@b", br"\2!\1").unwrap();
//! assert_eq!(new, b"a!bob and b!al".to_vec());
//! assert_eq!(n, 2);
//! ```
//!
//! # Syntax
//!
//! <pre class="rust">
//! .             any character except new line (includes new line with s flag)
//! \C            any single byte
//! [xyz]         character class
//! [^xyz]        negated character class
//! [[:alpha:]]   ASCII character class
//! \d \s \w      Perl character classes (and their negations \D \S \W)
//! \p{Any}       any character (\P{Any} matches nothing)
//!
//! xy    concatenation
//! x|y   alternation, prefer x
//! x* x+ x? x{n,m} x{n,} x{n}   greedy repetition (n, m <= 1000)
//! x*? x+? x?? x{n,m}?          non-greedy repetition
//!
//! (exp)          numbered capture group
//! (?P&lt;name>exp)  named capture group (also (?&lt;name>exp))
//! (?:exp)        non-capturing group
//! (?flags)       set flags for the rest of the group
//! (?flags:exp)   set flags for exp
//!
//! i     case-insensitive (ASCII)
//! m     multi-line mode: ^ and $ match at line boundaries
//! s     allow . to match \n
//! U     swap the meaning of x* and x*?
//!
//! ^ $   beginning and end of text (or line, with m)
//! \A \z beginning and end of text
//! \b \B ASCII word boundary and its negation
//! \Q...\E  literal text
//! </pre>

#![deny(missing_docs)]

pub use crate::error::{Error, ErrorKind, RewriteError};
pub use crate::input::Anchor;
pub use crate::re::{
    max_submatch, quote_meta, Captures, Matches, Regex, Split,
};
pub use crate::re_builder::{Encoding, Options, RegexBuilder};

mod backtrack;
mod compile;
mod dfa;
mod error;
mod exec;
mod expand;
mod hir;
mod input;
mod literal;
mod nfa;
mod onepass;
mod pool;
mod prog;
mod re;
mod re_builder;
mod sparse;

/// The `internal` module exists to support testing of every matching
/// engine. It is not part of the public API.
#[doc(hidden)]
pub mod internal {
    pub use crate::exec::MatchEngine;
}
