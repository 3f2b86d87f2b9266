// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::backtrack::{self, Bounded};
use crate::compile::Compiler;
use crate::dfa::{self, Dfa, DfaCache, DfaResult};
use crate::error::Error;
use crate::hir::{Config, Hir};
use crate::input::{Anchor, Input, Slot};
use crate::nfa::{Nfa, NfaCache};
use crate::onepass::OnePass;
use crate::pool::Pool;
use crate::prog::Program;

/// Exec manages the execution of a regular expression.
///
/// In particular, this manages the forward and reverse programs of a single
/// regular expression, the one-pass DFA (if the regex is one-pass) and the
/// choice of which matching engine to use for each search.
pub struct Exec {
    /// All read only state.
    ro: Arc<ExecReadOnly>,
    /// Caches for the matching engines, one per concurrent searcher.
    cache: Pool<ProgramCache>,
}

/// The read only part of an `Exec`, shared by its clones.
#[derive(Debug)]
struct ExecReadOnly {
    /// The forward program. Submatches always come from this one.
    prog: Program,
    /// The reverse program, used by the DFA to find where a match starts.
    ///
    /// This is `None` if the reverse program didn't fit in its share of the
    /// memory budget, in which case searches that need it use the NFA.
    rprog: Option<Program>,
    /// The one-pass DFA, if the program is one-pass.
    onepass: Option<OnePass>,
    /// Whether searches report the leftmost-longest match.
    longest: bool,
    /// A preference for matching engine selection.
    ///
    /// This defaults to Automatic, which means the matching engine is
    /// selected based on heuristics (such as the nature and size of the
    /// compiled program, in addition to the size of the search text).
    ///
    /// If either Nfa or Backtrack is set, then it is always used because
    /// either is capable of executing every compiled program on any input.
    /// The other choices fall back to the NFA when they can't be used.
    match_engine: MatchEngine,
}

/// The scratch space of every matching engine.
///
/// The DFA keeps one cache per kind of search, since its states differ
/// between leftmost-first, leftmost-longest and reverse matching.
#[derive(Debug)]
pub struct ProgramCache {
    nfa: NfaCache,
    backtrack: backtrack::Cache,
    dfa: DfaCache,
    dfa_longest: DfaCache,
    dfa_reverse: DfaCache,
}

impl ProgramCache {
    fn new() -> Self {
        ProgramCache {
            nfa: NfaCache::new(),
            backtrack: backtrack::Cache::new(),
            dfa: DfaCache::new(),
            dfa_longest: DfaCache::new(),
            dfa_reverse: DfaCache::new(),
        }
    }
}

/// The result of asking the DFA for the bounds of a match.
enum Bounds {
    Match(usize, usize),
    NoMatch,
    /// The DFA gave up. Some other engine must answer.
    Quit,
}

/// The matching engines offered by this regex implementation.
///
/// N.B. This is exported for use in testing.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchEngine {
    /// Automatically choose the best matching engine based on heuristics.
    Automatic,
    /// A full NFA simulation. Can always be employed but almost always the
    /// slowest choice.
    Nfa,
    /// A bounded backtracking implementation. About twice as fast as the
    /// NFA, but can only work on small regexes and small input.
    Backtrack,
    /// The one-pass DFA for submatches, with the lazy DFA finding the span
    /// of unanchored matches. Falls back to the NFA when the regex isn't
    /// one-pass.
    OnePass,
    /// The lazy DFA for match bounds and the NFA for submatches.
    Dfa,
}

/// A builder for `Exec`. It parses and compiles a pattern.
pub struct ExecBuilder<'p> {
    pattern: &'p [char],
    config: Config,
    max_mem: usize,
    longest: bool,
    match_engine: MatchEngine,
}

impl<'p> ExecBuilder<'p> {
    /// Create a builder for the given pattern and parser configuration.
    pub fn new(pattern: &'p [char], config: Config) -> Self {
        ExecBuilder {
            pattern,
            config,
            max_mem: 8 << 20,
            longest: false,
            match_engine: MatchEngine::Automatic,
        }
    }

    /// The total memory budget. Two thirds go to the forward program and
    /// one third to the reverse program.
    pub fn max_mem(mut self, bytes: usize) -> Self {
        self.max_mem = bytes;
        self
    }

    /// Report leftmost-longest matches instead of leftmost-first.
    pub fn longest(mut self, yes: bool) -> Self {
        self.longest = yes;
        self
    }

    /// Force a particular matching engine.
    pub fn match_engine(mut self, engine: MatchEngine) -> Self {
        self.match_engine = engine;
        self
    }

    /// Parse and compile the pattern.
    pub fn build(self) -> Result<Exec, Error> {
        let hir = Hir::parse(self.config, self.pattern)?;
        let latin1 = self.config.latin1;
        let prog = Compiler::new()
            .size_limit(self.max_mem / 3 * 2)
            .latin1(latin1)
            .compile(&hir)?;
        let rprog = match Compiler::new()
            .size_limit(self.max_mem / 3)
            .latin1(latin1)
            .reverse(true)
            .compile(&hir)
        {
            Ok(rprog) => Some(rprog),
            Err(err) => {
                debug!("no reverse program ({}), the NFA finds starts", err);
                None
            }
        };
        let onepass = match self.match_engine {
            MatchEngine::Automatic | MatchEngine::OnePass => {
                let onepass = OnePass::new(&prog);
                debug!("one-pass: {}", onepass.is_some());
                onepass
            }
            _ => None,
        };
        let ro = Arc::new(ExecReadOnly {
            prog,
            rprog,
            onepass,
            longest: self.longest,
            match_engine: self.match_engine,
        });
        Ok(Exec { cache: new_pool(), ro })
    }
}

fn new_pool() -> Pool<ProgramCache> {
    Pool::new(Box::new(ProgramCache::new))
}

impl Clone for Exec {
    fn clone(&self) -> Exec {
        Exec { ro: self.ro.clone(), cache: new_pool() }
    }
}

impl fmt::Debug for Exec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Exec")
            .field("prog", &self.ro.prog)
            .field("onepass", &self.ro.onepass.is_some())
            .field("longest", &self.ro.longest)
            .field("match_engine", &self.ro.match_engine)
            .finish()
    }
}

impl Exec {
    /// The forward program.
    pub fn prog(&self) -> &Program {
        &self.ro.prog
    }

    /// The reverse program, if it could be compiled.
    pub fn reverse_prog(&self) -> Option<&Program> {
        self.ro.rprog.as_ref()
    }

    /// Returns true if the regex matches anywhere in `text[start..end]`.
    ///
    /// Assertions see all of `text`.
    pub fn is_match(
        &self,
        text: &[u8],
        start: usize,
        end: usize,
        anchor: Anchor,
    ) -> bool {
        self.search(text, start, end, anchor, &mut [])
    }

    /// Search `text[start..end]` for a match, filling in `slots`.
    ///
    /// `slots` may be empty, in which case only whether there is a match is
    /// computed. Otherwise, slots `2*i` and `2*i+1` receive the bounds of
    /// group `i`, where group `0` is the whole match.
    pub fn search(
        &self,
        text: &[u8],
        start: usize,
        end: usize,
        anchor: Anchor,
        slots: &mut [Slot],
    ) -> bool {
        debug_assert!(start <= end && end <= text.len());
        for slot in slots.iter_mut() {
            *slot = None;
        }
        let input = Input::new(text)
            .span(start, end)
            .anchor(anchor)
            .longest(self.ro.longest);
        let mut cache = self.cache.get();
        let cache = &mut *cache;
        match self.ro.match_engine {
            MatchEngine::Nfa => self.exec_nfa(cache, slots, input),
            MatchEngine::Backtrack => {
                Bounded::exec(&self.ro.prog, &mut cache.backtrack, slots, input)
            }
            MatchEngine::Automatic => {
                self.exec_cascade(cache, slots, input, true, true)
            }
            MatchEngine::OnePass => {
                self.exec_cascade(cache, slots, input, true, false)
            }
            MatchEngine::Dfa => {
                self.exec_cascade(cache, slots, input, false, false)
            }
        }
    }

    /// Computes the range of strings that a match could start with,
    /// considering at most `max_len` bytes.
    pub fn possible_match_range(
        &self,
        max_len: usize,
    ) -> Option<(Vec<u8>, Vec<u8>)> {
        let mut cache = self.cache.get();
        dfa::possible_match_range(
            &self.ro.prog,
            &mut cache.dfa_longest,
            max_len,
        )
    }

    /// The DFA finds whether and where there is a match, then a submatch
    /// engine runs on exactly that span.
    fn exec_cascade(
        &self,
        cache: &mut ProgramCache,
        slots: &mut [Slot],
        input: Input<'_>,
        use_onepass: bool,
        use_backtrack: bool,
    ) -> bool {
        let mut input = input;
        if slots.is_empty() {
            match self.exec_dfa(cache, input, true) {
                DfaResult::Match(_) => return true,
                DfaResult::NoMatch => return false,
                DfaResult::Quit => {}
            }
        } else if input.is_anchored_start() && self.ro.onepass.is_some() {
            // The one-pass DFA finds submatches in a single scan, so there
            // is nothing for the DFA to narrow down.
        } else {
            match self.find_bounds(cache, input) {
                Bounds::Match(s, e) => {
                    if slots.len() <= 2 {
                        slots[0] = Some(s);
                        if let Some(slot) = slots.get_mut(1) {
                            *slot = Some(e);
                        }
                        return true;
                    }
                    input = input.span(s, e).anchor(Anchor::AnchorBoth);
                }
                Bounds::NoMatch => return false,
                Bounds::Quit => {}
            }
        }
        self.exec_submatch(cache, slots, input, use_onepass, use_backtrack)
    }

    fn exec_submatch(
        &self,
        cache: &mut ProgramCache,
        slots: &mut [Slot],
        input: Input<'_>,
        use_onepass: bool,
        use_backtrack: bool,
    ) -> bool {
        let prog = &self.ro.prog;
        if let Some(ref onepass) = self.ro.onepass {
            if use_onepass && input.is_anchored_start() {
                return onepass.exec(slots, input);
            }
        }
        if use_backtrack && backtrack::should_exec(prog.len(), input.len()) {
            Bounded::exec(prog, &mut cache.backtrack, slots, input)
        } else {
            self.exec_nfa(cache, slots, input)
        }
    }

    fn exec_nfa(
        &self,
        cache: &mut ProgramCache,
        slots: &mut [Slot],
        input: Input<'_>,
    ) -> bool {
        Nfa::exec(&self.ro.prog, &mut cache.nfa, slots, input)
    }

    /// Run the forward DFA. An anchored end needs the longest match to
    /// decide whether some match reaches the end of the span.
    fn exec_dfa(
        &self,
        cache: &mut ProgramCache,
        input: Input<'_>,
        earliest: bool,
    ) -> DfaResult {
        let input = if input.is_anchored_end() {
            input.longest(true)
        } else {
            input
        };
        let dfa_cache = if input.is_longest() {
            &mut cache.dfa_longest
        } else {
            &mut cache.dfa
        };
        let result = Dfa::exec(&self.ro.prog, dfa_cache, input, earliest);
        if let DfaResult::Quit = result {
            debug!("forward DFA gave up, falling back");
        }
        result
    }

    /// Find the bounds of the leftmost match with the DFA. The forward scan
    /// finds where the match ends and, unless the search is anchored, a
    /// reverse scan from there finds where it starts.
    fn find_bounds(
        &self,
        cache: &mut ProgramCache,
        input: Input<'_>,
    ) -> Bounds {
        let end = match self.exec_dfa(cache, input, false) {
            DfaResult::Match(end) => end,
            DfaResult::NoMatch => return Bounds::NoMatch,
            DfaResult::Quit => return Bounds::Quit,
        };
        if input.is_anchored_start() {
            return Bounds::Match(input.start(), end);
        }
        let rprog = match self.ro.rprog {
            Some(ref rprog) => rprog,
            None => return Bounds::Quit,
        };
        let rinput = Input::new(input.haystack())
            .span(input.start(), end)
            .anchor(Anchor::AnchorStart)
            .longest(true);
        match Dfa::exec(rprog, &mut cache.dfa_reverse, rinput, false) {
            DfaResult::Match(start) => Bounds::Match(start, end),
            DfaResult::NoMatch => {
                debug_assert!(false, "reverse DFA missed a forward match");
                Bounds::Quit
            }
            DfaResult::Quit => {
                debug!("reverse DFA gave up, falling back");
                Bounds::Quit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Exec, ExecBuilder, MatchEngine};
    use crate::hir::Config;
    use crate::input::Anchor;

    const ENGINES: &[MatchEngine] = &[
        MatchEngine::Automatic,
        MatchEngine::Nfa,
        MatchEngine::Backtrack,
        MatchEngine::OnePass,
        MatchEngine::Dfa,
    ];

    fn exec(pattern: &str, engine: MatchEngine, longest: bool) -> Exec {
        let chars: Vec<char> = pattern.chars().collect();
        ExecBuilder::new(&chars, Config::default())
            .longest(longest)
            .match_engine(engine)
            .build()
            .unwrap()
    }

    fn search(
        pattern: &str,
        text: &str,
        anchor: Anchor,
        longest: bool,
    ) -> Vec<Option<usize>> {
        let mut results = vec![];
        for &engine in ENGINES {
            let exec = exec(pattern, engine, longest);
            let mut slots = vec![None; exec.prog().slot_count()];
            let text = text.as_bytes();
            if !exec.search(text, 0, text.len(), anchor, &mut slots) {
                slots = vec![];
            }
            let matched = exec.is_match(text, 0, text.len(), anchor);
            assert_eq!(matched, !slots.is_empty(), "{:?}", engine);
            results.push(slots);
        }
        for (i, slots) in results.iter().enumerate().skip(1) {
            assert_eq!(&results[0], slots, "{:?}", ENGINES[i]);
        }
        results.swap_remove(0)
    }

    #[test]
    fn engines_agree_on_submatches() {
        assert_eq!(
            search("(foo)|(bar)baz", "barbazbla", Anchor::Unanchored, false),
            vec![Some(0), Some(6), None, None, Some(0), Some(3)]
        );
        assert_eq!(
            search("a(b*)", "xxabbb", Anchor::Unanchored, false),
            vec![Some(2), Some(6), Some(3), Some(6)]
        );
        assert_eq!(
            search("a(b*?)", "xxabbb", Anchor::Unanchored, false),
            vec![Some(2), Some(3), Some(3), Some(3)]
        );
    }

    #[test]
    fn engines_agree_on_anchors() {
        assert_eq!(
            search("a+", "baaa", Anchor::AnchorStart, false),
            Vec::<Option<usize>>::new()
        );
        assert_eq!(
            search("(a+)", "aaab", Anchor::AnchorStart, false),
            vec![Some(0), Some(3), Some(0), Some(3)]
        );
        assert_eq!(
            search("a|ab", "ab", Anchor::AnchorBoth, false),
            vec![Some(0), Some(2)]
        );
    }

    #[test]
    fn engines_agree_on_longest() {
        assert_eq!(
            search("(a|ab)(c|bcd)", "abcd", Anchor::Unanchored, true),
            vec![Some(0), Some(4), Some(0), Some(1), Some(1), Some(4)]
        );
        assert_eq!(
            search("a|ab", "xab", Anchor::Unanchored, true),
            vec![Some(1), Some(3)]
        );
    }

    #[test]
    fn span_limits_the_search() {
        let exec = exec("a+", MatchEngine::Automatic, false);
        let mut slots = vec![None; 2];
        assert!(exec.search(b"baaab", 2, 3, Anchor::Unanchored, &mut slots));
        assert_eq!(slots, vec![Some(2), Some(3)]);
        assert!(!exec.search(b"baaab", 4, 5, Anchor::Unanchored, &mut slots));
    }

    #[test]
    fn clones_share_programs_not_caches() {
        let exec = exec("a(b)c", MatchEngine::Automatic, false);
        let clone = exec.clone();
        let mut slots = vec![None; 4];
        assert!(clone.search(b"abc", 0, 3, Anchor::Unanchored, &mut slots));
        assert_eq!(exec.prog().slot_count(), clone.prog().slot_count());
    }
}
