// Copyright 2014-2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/*!
The DFA matching engine.

A DFA provides faster matching because the engine is in exactly one state at
any point in time. In the NFA, there may be multiple active states, and
considerable CPU cycles are spent shuffling them around. In finite automata
speak, the DFA follows epsilon transitions in the regex far less than the NFA.

A DFA is a classic trade off between time and space. The NFA is slower, but
its memory requirements are typically small and predictable. The DFA is faster,
but given the right regex and the right input, the number of states in the
DFA can grow exponentially. To mitigate this space problem, we do two things:

1. We implement an *online* DFA. That is, the DFA is constructed from the NFA
   during a search. When a new state is computed, it is stored in a cache so
   that it may be reused. An important consequence of this implementation
   is that states that are never reached for a particular input are never
   computed. (This is impossible in an "offline" DFA which needs to compute
   all possible states up front.)
2. If the cache gets too big, we wipe it and continue matching.

In pathological cases, a new state can be created for every byte of input.
(e.g., The regex `(a|b)*a(a|b){20}` on a long sequence of a's and b's.)
When the cache is wiped too often while making too little progress, the DFA
quits and the caller falls back to the NFA simulation.

The DFA comes in two flavors. In leftmost-first mode, the NFA states of a DFA
state are kept in priority order and everything after the first `Match` is
dropped. In leftmost-longest mode, NFA states are grouped by the position at
which their thread started (groups are separated by marks), and a match in
one group cuts off every later group.

Zero-width assertions, including ASCII word boundaries, are handled by
recording in each state the flags that held just after the last byte
(`StartLine` after a `\n`, and whether that byte was a word byte) along with
the set of assertions the state's NFA states care about. The flags that hold
just before the next byte are only known once that byte is seen, which is
why every match is reported one byte late.

N.B. While this implementation is heavily commented, Russ Cox's series of
articles on regexes is strongly recommended: https://swtch.com/~rsc/regexp/
(As is the DFA implementation in RE2, which heavily influenced this
implementation.)
*/

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::mem;

use log::debug;

use crate::hir::{is_word_byte, Look};
use crate::input::Input;
use crate::prog::{Inst, Program};
use crate::sparse::SparseSet;

/// A reusable cache of DFA states.
///
/// This cache is reused between multiple invocations of the same regex
/// program. (It is not shared simultaneously between threads. If there is
/// contention, then new caches are created.)
///
/// A cache must only ever be used with one program in one matching mode
/// (leftmost-first or leftmost-longest), since the states it holds depend on
/// both.
#[derive(Debug)]
pub struct DfaCache {
    /// Everything the DFA mutates while it runs, except for the scratch
    /// queues.
    inner: CacheInner,
    /// qcur and qnext are ordered sets with constant time
    /// addition/membership/clearing-whole-set and linear time iteration. They
    /// are used to manage the sets of NFA states in DFA states when computing
    /// cached DFA states. In particular, the order of the NFA states matters
    /// for leftmost-first style matching.
    qcur: Workq,
    qnext: Workq,
}

/// The part of a DFA cache that the `Dfa` borrows for the whole search.
#[derive(Debug)]
struct CacheInner {
    /// A cache of pre-compiled DFA states, keyed by the ordered set of NFA
    /// states and the flags recorded when the state was observed.
    ///
    /// A StatePtr is effectively a `*State`, but to avoid reference counting,
    /// we just pass indexes around manually. This also lets us use 32 bit
    /// indexes, which lets us cram more states into our memory bounds.
    compiled: HashMap<StateKey, StatePtr>,
    /// Our heap of states. Both `CacheInner.compiled` and `State.next` point
    /// into this vec.
    states: Vec<State>,
    /// A set of cached start states, one for each kind of context preceding
    /// the start of a search (beginning of text, after a `\n`, after a word
    /// byte, after some other byte) times anchored and unanchored.
    ///
    /// N.B. A start state can be "dead" (i.e., no possible match), so we
    /// represent it with a StatePtr.
    start_states: Vec<StatePtr>,
    /// Stack scratch space used to follow epsilon transitions in the NFA.
    /// (This permits us to avoid recursion.)
    stack: Vec<InstPtr>,
    /// The total number of times this cache has been flushed by the DFA
    /// because of space constraints.
    flush_count: u64,
}

/// Dfa encapsulates the actual execution of the DFA.
///
/// Why don't we just store the DfaCache directly in this struct? Well, it
/// turns out that we often want to "iterate over {qcur,qnext} and perform
/// some possibly mutable operation." The borrow checker forbids this, even
/// if the callee doesn't mutate {qcur,qnext}. Therefore, we borrow the rest
/// of the cache here and pass {qcur,qnext} around as parameters.
#[derive(Debug)]
pub struct Dfa<'a> {
    /// prog contains the NFA instruction opcodes. It is either the forward
    /// or the reverse program of a regex.
    prog: &'a Program,
    /// Whether this DFA finds leftmost-longest matches instead of
    /// leftmost-first ones.
    longest: bool,
    /// The start state. We record it here because the pointer may change
    /// when the cache is wiped.
    start: StatePtr,
    /// The current position in the input.
    at: usize,
    /// The approximate number of bytes the state cache may use.
    limit: usize,
    /// When false, a full cache makes the DFA quit instead of wiping it.
    /// Used when walking the state graph, since a wipe would invalidate the
    /// state pointers held by the walker.
    can_flush: bool,
    /// The input position of the last cache flush. We use this to determine
    /// if we're thrashing in the cache too often. If so, the DFA quits so
    /// that we can fall back to the NFA algorithm.
    last_cache_flush: usize,
    cache: &'a mut CacheInner,
}

/// The result of running the DFA.
///
/// Generally, the result is either a match or not a match, but sometimes the
/// DFA runs too slow because the cache size is too small. In that case, it
/// gives up with the intent of falling back to the NFA algorithm.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DfaResult {
    /// A match was found. Forward searches report where the match ends and
    /// reverse searches report where it starts.
    Match(usize),
    NoMatch,
    Quit,
}

/// State is a DFA state. It contains transitions to next states (given an
/// input byte), an ordered set of NFA states (not necessarily complete) and
/// a flag word.
#[derive(Clone)]
struct State {
    /// The set of transitions out of this state to other states.
    ///
    /// This is tricky and is NOT a simple vec with length 256. A vec with
    /// length 256 would work fine if not for the following:
    ///
    /// 1. Empty assertions can lead to matches "at the boundary" of the input,
    ///    so it is useful to have one extra transition that corresponds to
    ///    EOF. So why doesn't a vec with length 257 work?
    /// 2. If the vec has length 257 and each StatePtr is 4 bytes (even on 64
    ///    bit), then every state occupies at least 1KB on the heap. That's
    ///    ridiculous. As an optimization, we compute the set of all
    ///    equivalence classes of bytes in the regex. Each equivalence class
    ///    is defined to be the set of bytes that are indistinguishable when
    ///    searching for a match. For example, in the regex `[a-z]`, the byte
    ///    ranges `0..ord(a)-1`, `ord(a)-ord(z)` and `ord(z)+1..257` all
    ///    correspond to distinct classes. Therefore, we only need a vec of
    ///    length *3* for that particular regex, which is quite a bit better.
    ///    (Equivalence classes are computed during compilation.)
    next: Vec<StatePtr>,
    /// The set of NFA states in this DFA state, which are computed by
    /// following epsilon transitions. Note that not all epsilon transitions
    /// are necessarily followed! Namely, epsilon transitions that correspond
    /// to empty assertions are only followed if the flags set at the current
    /// position satisfy the assertion. In leftmost-longest mode, `MARK`
    /// separates threads that started at different positions.
    insts: Vec<InstPtr>,
    /// The assertions that held just after the byte that led here, whether
    /// that byte was a word byte, whether the previous state contained a
    /// match and the set of assertions used by `insts`.
    flags: StateFlags,
}

/// A state's key for identifying it in the cache. In particular, if two
/// state's cache keys are equivalent, then they cannot be discriminatory in
/// a match.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct StateKey {
    /// An ordered set of NFA states.
    insts: Vec<InstPtr>,
    /// The flag word of the state.
    flags: StateFlags,
}

/// InstPtr is a 32 bit pointer into a sequence of opcodes (i.e., it indexes
/// an NFA state).
///
/// Throughout this library, this is usually set to `usize`, but we force a
/// `u32` here to save on space.
type InstPtr = u32;

/// Separates groups of NFA states that started at different positions.
const MARK: InstPtr = ::std::u32::MAX;

/// StatePtr is a 32 bit pointer into a sequence of states.
///
/// It has two special values: STATE_UNKNOWN and STATE_DEAD. All other values
/// are valid indexes into a cache's state sequence.
///
/// (We use sentinel values here to save on space. A more sensible
/// representation is a sum type.)
type StatePtr = u32;

/// An unknown state means that the state has not been computed yet, and that
/// the only way to progress is to compute it.
const STATE_UNKNOWN: StatePtr = 0;

/// A dead state means that the state has been computed and it is known that
/// once it is entered, no match can ever occur.
const STATE_DEAD: StatePtr = 1;

/// Byte is a u8 in spirit, but a u16 in practice so that we can represent the
/// special EOF sentinel value.
#[derive(Copy, Clone, Debug)]
struct Byte(u16);

/// The flag word of a DFA state.
///
/// The low six bits are empty-width flags (the `Look` bits). Above them are
/// the match bit and the last-byte-was-a-word-byte bit. The assertions used
/// by the state's NFA states live above `NEED_SHIFT`.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
struct StateFlags(u32);

const EMPTY_MASK: u32 = 0x3F;
const FLAG_MATCH: u32 = 1 << 6;
const FLAG_LAST_WORD: u32 = 1 << 7;
const NEED_SHIFT: u32 = 8;

/// The number of distinct start contexts. See `start_context`.
const START_CONTEXTS: usize = 4;

/// An ordered set of NFA states that can also hold marks.
///
/// Marks are the ids at or above `n`. Leading and repeated marks are never
/// inserted.
#[derive(Clone, Debug)]
struct Workq {
    set: SparseSet,
    n: usize,
    next_mark: usize,
    last_was_mark: bool,
}

impl Workq {
    fn new(n: usize, nmark: usize) -> Workq {
        Workq {
            set: SparseSet::new(n + nmark),
            n,
            next_mark: n,
            last_was_mark: true,
        }
    }

    fn is_mark(&self, id: usize) -> bool {
        id >= self.n
    }

    fn clear(&mut self) {
        self.set.clear();
        self.next_mark = self.n;
        self.last_was_mark = true;
    }

    fn mark(&mut self) {
        if self.last_was_mark {
            return;
        }
        let id = self.next_mark;
        self.next_mark += 1;
        self.insert_new(id);
    }

    fn contains(&self, id: usize) -> bool {
        self.set.contains(id)
    }

    fn insert_new(&mut self, id: usize) {
        self.last_was_mark = self.is_mark(id);
        self.set.insert(id);
    }

    fn iter(&self) -> ::std::slice::Iter<'_, usize> {
        self.set.iter()
    }
}

impl DfaCache {
    /// Create new empty cache for the DFA engine.
    pub fn new() -> Self {
        DfaCache {
            inner: CacheInner {
                compiled: HashMap::new(),
                states: vec![State::invalid(), State::invalid()],
                start_states: vec![STATE_UNKNOWN; 2 * START_CONTEXTS],
                stack: vec![],
                flush_count: 0,
            },
            qcur: Workq::new(0, 0),
            qnext: Workq::new(0, 0),
        }
    }

    /// Resizes ensures that the cache is the right size for the given program.
    ///
    /// N.B. This exists because it is inconvenient (i.e., my failing) to tie
    /// the initial creation of the cache with knowledge about the program, so
    /// we resize it once.
    fn resize(&mut self, num_insts: usize, longest: bool) {
        // There is never more than one mark per NFA state in a queue.
        let nmark = if longest { num_insts } else { 0 };
        if num_insts == self.qcur.n
            && num_insts + nmark == self.qcur.set.capacity()
        {
            return;
        }
        self.qcur = Workq::new(num_insts, nmark);
        self.qnext = Workq::new(num_insts, nmark);
    }
}

impl<'a> Dfa<'a> {
    /// The main entry point to executing a DFA.
    ///
    /// A forward program scans `input.start()..input.end()` left to right and
    /// reports the end of the match. A reverse program scans the same span
    /// right to left and reports the start of the match. Leftmost-longest
    /// semantics are used when `input.is_longest()`.
    ///
    /// When `earliest` is set, the search stops at the first match state it
    /// sees, which is enough to answer whether there is a match at all.
    ///
    /// Anchoring at both ends is only supported in leftmost-longest mode,
    /// since leftmost-first mode prunes threads that might have matched at
    /// the end.
    pub fn exec(
        prog: &'a Program,
        cache: &'a mut DfaCache,
        input: Input,
        earliest: bool,
    ) -> DfaResult {
        debug_assert!(!input.is_anchored_end() || input.is_longest());
        let longest = input.is_longest();
        cache.resize(prog.len(), longest);
        let at = if prog.is_reverse { input.end() } else { input.start() };
        let DfaCache { ref mut inner, ref mut qcur, ref mut qnext } = *cache;
        let mut dfa = Dfa::new(prog, inner, longest, at);
        if !dfa.has_room() {
            debug!(
                "DFA quitting: {} bytes of cache cannot hold enough states",
                dfa.limit
            );
            return DfaResult::Quit;
        }
        let anchored = input.is_anchored_start();
        dfa.start = match dfa.start_state(qcur, input.haystack(), at, anchored)
        {
            None => return DfaResult::Quit,
            Some(STATE_DEAD) => return DfaResult::NoMatch,
            Some(si) => si,
        };
        debug_assert!(dfa.start != STATE_UNKNOWN);
        if prog.is_reverse {
            dfa.exec_at_reverse(qcur, qnext, input, earliest)
        } else {
            dfa.exec_at(qcur, qnext, input, earliest)
        }
    }

    fn new(
        prog: &'a Program,
        cache: &'a mut CacheInner,
        longest: bool,
        at: usize,
    ) -> Dfa<'a> {
        // Leftmost-first and leftmost-longest forward searches each get half
        // of the budget. The reverse program has its own budget.
        let limit = if prog.is_reverse {
            prog.dfa_size_limit
        } else {
            prog.dfa_size_limit / 2
        };
        Dfa {
            prog,
            longest,
            start: STATE_UNKNOWN,
            at,
            limit,
            can_flush: true,
            last_cache_flush: at,
            cache,
        }
    }

    /// Executes the DFA on a forward NFA.
    ///
    /// {qcur,qnext} are scratch ordered sets which may be non-empty.
    fn exec_at(
        &mut self,
        qcur: &mut Workq,
        qnext: &mut Workq,
        input: Input,
        earliest: bool,
    ) -> DfaResult {
        // For the most part, the DFA is basically:
        //
        //   last_match = null
        //   while current_byte != EOF:
        //     si = current_state.next[current_byte]
        //     if si is match
        //       last_match = si
        //   return last_match
        //
        // However, we need to deal with a few things:
        //
        //   1. This is an *online* DFA, so the current state's next list
        //      may not point to anywhere yet, so we must go out and compute
        //      them. (They are then cached into the current state's next list
        //      to avoid re-computation.)
        //   2. If we come across a state that is known to be dead (i.e., never
        //      leads to a match), then we can quit early.
        //   3. If the caller just wants to know if a match occurs, then we
        //      can quit as soon as we know we have a match. (Full leftmost
        //      first semantics require continuing on.)
        //   4. If we're in the start state, then we can use a pre-computed set
        //      of prefix literals to skip quickly along the input.
        //   5. After the span is exhausted, we run the DFA on one more symbol:
        //      the byte just past the span, or EOF at the end of the text.
        //      This is what lets empty width assertions at the end of the
        //      span see the real text.
        //   6. We can't actually do state.next[byte]. Instead, we have to do
        //      state.next[byte_classes[byte]], which permits us to keep the
        //      'next' list very small.
        debug_assert!(!self.prog.is_reverse);
        let text = input.haystack();
        let end = input.end();
        let anchored_end = input.is_anchored_end();
        // Skipping ahead while in the start state is only valid if the start
        // state doesn't depend on the bytes that were skipped.
        let use_prefixes = !self.prog.prefixes.is_empty()
            && !input.is_anchored_start()
            && self.cache.states[self.start as usize].flags.needs() == 0;

        let (mut si, mut result) = (self.start, DfaResult::NoMatch);
        while self.at < end {
            // Our set of literal prefixes can itself be a DFA, but it is
            // offline and can generally be quite a bit faster. (For instance,
            // memchr is used if possible.)
            if use_prefixes && si == self.start {
                self.at = match self.prefix_at(text, self.at, end) {
                    None => return result,
                    Some(i) => i,
                };
            }

            // The following logic is essentially what `self.next_state` does,
            // but we inline it manually here to avoid the extra branch and
            // also because we know we have a real `u8` (not a `Byte`, which
            // may be the special EOF sentinel value).
            let cls = self.prog.byte_classes[text[self.at] as usize];
            let mut next_si = self.cache.states[si as usize].next[cls as usize];
            if next_si <= STATE_DEAD {
                if next_si == STATE_DEAD {
                    return result;
                }
                // The next state may not have been cached, so re-compute it
                // (i.e., follow epsilon transitions).
                let b = Byte::byte(text[self.at]);
                next_si = match self.exec_byte(qcur, qnext, si, b) {
                    None => return DfaResult::Quit,
                    Some(next_si) => next_si,
                };
                debug_assert!(next_si != STATE_UNKNOWN);
                if next_si == STATE_DEAD {
                    return result;
                }
            }
            si = next_si;
            // A match state means the previous state matched, so the match
            // ends just before the byte we consumed.
            if self.cache.states[si as usize].flags.is_match() && !anchored_end {
                result = DfaResult::Match(self.at);
                if earliest {
                    return result;
                }
            }
            self.at += 1;
        }
        let b = if end < text.len() {
            Byte::byte(text[end])
        } else {
            Byte::eof()
        };
        si = match self.next_state(qcur, qnext, si, b) {
            None => return DfaResult::Quit,
            Some(si) => si,
        };
        debug_assert!(si != STATE_UNKNOWN);
        if si != STATE_DEAD && self.cache.states[si as usize].flags.is_match() {
            result = DfaResult::Match(end);
        }
        result
    }

    /// Executes the DFA on a reverse NFA.
    fn exec_at_reverse(
        &mut self,
        qcur: &mut Workq,
        qnext: &mut Workq,
        input: Input,
        earliest: bool,
    ) -> DfaResult {
        // The comments in `exec_at` above mostly apply here too. The main
        // difference is that we move backwards over the input.
        debug_assert!(self.prog.is_reverse);
        let text = input.haystack();
        let start = input.start();
        let anchored_end = input.is_anchored_end();

        let (mut si, mut result) = (self.start, DfaResult::NoMatch);
        while self.at > start {
            self.at -= 1;

            let cls = self.prog.byte_classes[text[self.at] as usize];
            let mut next_si = self.cache.states[si as usize].next[cls as usize];
            if next_si <= STATE_DEAD {
                if next_si == STATE_DEAD {
                    return result;
                }
                let b = Byte::byte(text[self.at]);
                next_si = match self.exec_byte(qcur, qnext, si, b) {
                    None => return DfaResult::Quit,
                    Some(next_si) => next_si,
                };
                debug_assert!(next_si != STATE_UNKNOWN);
                if next_si == STATE_DEAD {
                    return result;
                }
            }
            si = next_si;
            if self.cache.states[si as usize].flags.is_match() && !anchored_end {
                result = DfaResult::Match(self.at + 1);
                if earliest {
                    return result;
                }
            }
        }
        let b = if start > 0 {
            Byte::byte(text[start - 1])
        } else {
            Byte::eof()
        };
        si = match self.next_state(qcur, qnext, si, b) {
            None => return DfaResult::Quit,
            Some(si) => si,
        };
        debug_assert!(si != STATE_UNKNOWN);
        if si != STATE_DEAD && self.cache.states[si as usize].flags.is_match() {
            result = DfaResult::Match(start);
        }
        result
    }

    /// Computes the next state given the current state and the current input
    /// byte (which may be EOF).
    ///
    /// If STATE_DEAD is returned, then there is no valid state transition.
    /// This implies that no permutation of future input can lead to a match
    /// state.
    ///
    /// STATE_UNKNOWN can never be returned.
    fn exec_byte(
        &mut self,
        qcur: &mut Workq,
        qnext: &mut Workq,
        mut si: StatePtr,
        b: Byte,
    ) -> Option<StatePtr> {
        let prog = self.prog;

        // Initialize a queue with the current DFA state's NFA states.
        qcur.clear();
        for &ip in &self.cache.states[si as usize].insts {
            if ip == MARK {
                qcur.mark();
            } else if !qcur.contains(ip as usize) {
                qcur.insert_new(ip as usize);
            }
        }

        // Compute the flags that hold immediately before the current byte.
        // The state remembers what held just after the previous byte. The
        // end-of-line and word boundary flags depend on the current byte.
        let state_flags = self.cache.states[si as usize].flags;
        let mut before = state_flags.empty();
        let old_before = before;
        let mut after = 0;
        if b.is_eof() {
            before |= Look::EndLine.as_bit() | Look::EndText.as_bit();
        } else if b.as_byte() == Some(b'\n') {
            before |= Look::EndLine.as_bit();
            after |= Look::StartLine.as_bit();
        }
        let is_word = b.as_byte().map_or(false, is_word_byte);
        if is_word == state_flags.is_last_word() {
            before |= Look::NotWordBoundary.as_bit();
        } else {
            before |= Look::WordBoundary.as_bit();
        }

        // Only re-follow epsilon transitions if a flag the state cares about
        // just became true. A state that needs flags also records the
        // epsilon instructions it went through, in visiting order, so that
        // replaying it visits instructions in the same order as the NFA.
        if before & !old_before & state_flags.needs() != 0 {
            qnext.clear();
            for &ip in qcur.iter() {
                if qcur.is_mark(ip) {
                    qnext.mark();
                    continue;
                }
                if qnext.contains(ip) {
                    continue;
                }
                match prog[ip] {
                    Inst::EmptyLook(ref inst)
                        if before & inst.look.as_bit() != 0 =>
                    {
                        self.follow_epsilons(usize_to_u32(ip), qnext, before);
                    }
                    _ => qnext.insert_new(ip),
                }
            }
            mem::swap(qcur, qnext);
        }

        // Now step every NFA state over the byte. If the current state
        // contains a matching NFA state, then the *next* DFA state is marked
        // as a match. This is precisely how we delay the DFA matching by one
        // byte.
        let mut is_match = false;
        qnext.clear();
        for &ip in qcur.iter() {
            if qcur.is_mark(ip) {
                // A match from an earlier starting position beats anything
                // that started later.
                if is_match {
                    break;
                }
                qnext.mark();
                continue;
            }
            match prog[ip] {
                // These states are handled when following epsilon transitions.
                Inst::Save(_)
                | Inst::Split(_)
                | Inst::EmptyLook(_)
                | Inst::Fail => {}
                Inst::Match => {
                    is_match = true;
                    if !self.longest {
                        break;
                    }
                }
                Inst::Bytes(ref inst) => {
                    if b.as_byte().map_or(false, |b| inst.matches(b)) {
                        self.follow_epsilons(
                            usize_to_u32(inst.goto),
                            qnext,
                            after,
                        );
                    }
                }
            }
        }
        let mut flags = after;
        if is_match {
            flags |= FLAG_MATCH;
        }
        if is_word {
            flags |= FLAG_LAST_WORD;
        }

        // We've now built up the set of NFA states that ought to comprise the
        // next DFA state, so try to find it in the cache, and if it doesn't
        // exist, cache it.
        //
        // N.B. We pass `&mut si` here because the cache may clear itself if
        // it has gotten too full. When that happens, the location of the
        // current state may change.
        let next = match self.cached_state(qnext, flags, Some(&mut si)) {
            None => return None,
            Some(next) => next,
        };
        debug_assert!(next != STATE_UNKNOWN);
        // And now store our state in the current state's next list.
        let cls = self.byte_class(b);
        self.cache.states[si as usize].next[cls] = next;
        Some(next)
    }

    /// Follows the epsilon transitions starting at (and including) `ip`. The
    /// resulting states are inserted into the ordered set `q`.
    ///
    /// Conditional epsilon transitions (i.e., empty width assertions) are only
    /// followed if they are satisfied by the given flags, which should
    /// represent the flags set at the current location in the input.
    ///
    /// In leftmost-longest mode, a mark is placed before the loop that
    /// starts new threads at later positions, so that those threads land in
    /// a lower priority group than every thread already in `q`.
    fn follow_epsilons(&mut self, ip: InstPtr, q: &mut Workq, flags: u32) {
        let prog = self.prog;
        let marks_starts = self.longest && prog.start_unanchored != prog.start;

        // We need to traverse the NFA to follow epsilon transitions, so avoid
        // recursion with an explicit stack.
        self.cache.stack.push(ip);
        while let Some(ip) = self.cache.stack.pop() {
            if ip == MARK {
                q.mark();
                continue;
            }
            // Don't visit states we've already added.
            if q.contains(ip as usize) {
                continue;
            }
            q.insert_new(ip as usize);
            match prog[ip as usize] {
                Inst::Match | Inst::Bytes(_) | Inst::Fail => {}
                Inst::EmptyLook(ref inst) => {
                    // Only follow empty assertion states if our flags satisfy
                    // the assertion.
                    if flags & inst.look.as_bit() != 0 {
                        self.cache.stack.push(usize_to_u32(inst.goto));
                    }
                }
                Inst::Save(ref inst) => {
                    self.cache.stack.push(usize_to_u32(inst.goto))
                }
                Inst::Split(ref inst) => {
                    self.cache.stack.push(usize_to_u32(inst.goto2));
                    if marks_starts && ip as usize == prog.start_unanchored {
                        self.cache.stack.push(MARK);
                    }
                    self.cache.stack.push(usize_to_u32(inst.goto1));
                }
            }
        }
    }

    /// Find a previously computed state matching the given set of instructions
    /// and flags.
    ///
    /// The given set of instructions should represent a single state in the
    /// NFA along with all states reachable without consuming any input.
    ///
    /// If the cache is full, then it is wiped before caching a new state.
    ///
    /// The current state should be specified if it exists, since it will need
    /// to be preserved if the cache clears itself. (Start states are
    /// always saved, so they should not be passed here.) It takes a mutable
    /// pointer to the index because if the cache is cleared, the state's
    /// location may change.
    fn cached_state(
        &mut self,
        q: &Workq,
        flags: u32,
        current_state: Option<&mut StatePtr>,
    ) -> Option<StatePtr> {
        // If we couldn't come up with a non-empty key to represent this state,
        // then it is dead and can never lead to a match.
        let key = match self.cached_state_key(q, flags) {
            None => return Some(STATE_DEAD),
            Some(key) => key,
        };
        // In the cache? Cool. Done.
        if let Some(&si) = self.cache.compiled.get(&key) {
            return Some(si);
        }

        // If the cache has gotten too big, wipe it.
        if self.approximate_size() > self.limit
            && !self.clear_cache_and_save(current_state)
        {
            // Ooops. DFA is giving up.
            return None;
        }

        // OK, now there's enough room to push our new state.
        let next = vec![STATE_UNKNOWN; self.num_byte_classes()];
        let si = usize_to_u32(self.cache.states.len());
        self.cache.states.push(State {
            next,
            insts: key.insts.clone(),
            flags: key.flags,
        });
        self.cache.compiled.insert(key, si);
        Some(si)
    }

    /// Produces a key suitable for describing a state in the DFA cache.
    ///
    /// The key invariant here is that equivalent keys are produced for any two
    /// sets of ordered NFA states (and flags) that do not discriminate a
    /// match for any input.
    fn cached_state_key(&self, q: &Workq, flags: u32) -> Option<StateKey> {
        // We need to build up enough information to recognize pre-built states
        // in the DFA. Generally speaking, this includes every instruction
        // except for those which are purely epsilon transitions, e.g., the
        // Save and Split instructions.
        //
        // Empty width assertions are also epsilon transitions, but since they
        // are conditional, we need to make them part of a state's key in the
        // cache. While any are pending, Save and Split are kept too, since
        // they block revisits when the assertions are followed later.
        let mut needs = 0;
        let mut insts = vec![];
        let mut saw_match = false;
        for &ip in q.iter() {
            // Nothing after a match has priority over it in leftmost-first
            // mode. In leftmost-longest mode, later groups started later.
            if saw_match && (!self.longest || q.is_mark(ip)) {
                break;
            }
            if q.is_mark(ip) {
                if insts.last().map_or(false, |&last| last != MARK) {
                    insts.push(MARK);
                }
                continue;
            }
            match self.prog[ip] {
                Inst::Fail => {}
                Inst::Save(_) | Inst::Split(_) | Inst::Bytes(_) => {
                    insts.push(usize_to_u32(ip))
                }
                Inst::EmptyLook(ref inst) => {
                    needs |= inst.look.as_bit();
                    insts.push(usize_to_u32(ip));
                }
                Inst::Match => {
                    saw_match = true;
                    insts.push(usize_to_u32(ip));
                }
            }
        }
        // Epsilon instructions only matter when assertions will be
        // re-followed. Otherwise drop them to share more states.
        if needs == 0 {
            let prog = self.prog;
            let mut kept = Vec::with_capacity(insts.len());
            for ip in insts {
                if ip == MARK {
                    if kept.last().map_or(false, |&last| last != MARK) {
                        kept.push(MARK);
                    }
                    continue;
                }
                match prog[ip as usize] {
                    Inst::Save(_) | Inst::Split(_) => {}
                    _ => kept.push(ip),
                }
            }
            insts = kept;
        }
        if insts.last() == Some(&MARK) {
            insts.pop();
        }
        // Without assertions to check, the flags of the surrounding text
        // can't matter, so drop them to share more states.
        let mut flags = flags;
        if needs == 0 {
            flags &= FLAG_MATCH;
        }
        // If we couldn't transition to any other instructions and we didn't
        // see a match when expanding NFA states previously, then this is a
        // dead state and no amount of additional input can transition out
        // of this state.
        if insts.is_empty() && flags == 0 {
            return None;
        }
        // The order of NFA states within a group doesn't matter in
        // leftmost-longest mode.
        if self.longest {
            for group in insts.split_mut(|&ip| ip == MARK) {
                group.sort_unstable();
            }
        }
        flags |= needs << NEED_SHIFT;
        Some(StateKey { insts, flags: StateFlags(flags) })
    }

    /// Clears the cache, but saves and restores current_state if it is not
    /// none.
    ///
    /// The current state must be provided here in case its location in the
    /// cache changes.
    ///
    /// This returns false if the cache is not cleared and the DFA should
    /// give up.
    fn clear_cache_and_save(
        &mut self,
        current_state: Option<&mut StatePtr>,
    ) -> bool {
        if self.cache.states.len() <= 2 {
            // Why <= 2? Well, the states list always has its first two
            // positions filled by marker states for STATE_UNKNOWN and
            // STATE_DEAD. These states aren't actually used, but exist to
            // make sure no other state lives in those locations. Therefore,
            // a state vec with length <= 2 is actually "empty."
            return true;
        }
        match current_state {
            None => self.clear_cache(),
            Some(si) => {
                let cur = self.copy_state(*si);
                if !self.clear_cache() {
                    return false;
                }
                *si = self.restore_state(cur);
                true
            }
        }
    }

    /// Wipes the state cache, but saves and restores the current start state.
    ///
    /// This returns false if the cache is not cleared and the DFA should
    /// give up.
    fn clear_cache(&mut self) -> bool {
        if !self.can_flush {
            return false;
        }
        // Bail out of the DFA if we're moving too "slowly."
        // A heuristic from RE2: assume the DFA is too slow if it is processing
        // 10 or fewer bytes per state.
        // Additionally, we permit the cache to be flushed a few times before
        // calling it quits.
        let progress = if self.at >= self.last_cache_flush {
            self.at - self.last_cache_flush
        } else {
            self.last_cache_flush - self.at
        };
        if self.cache.flush_count >= 3 && progress <= 10 * self.cache.states.len() {
            debug!(
                "DFA giving up after {} cache flushes at offset {}",
                self.cache.flush_count, self.at
            );
            return false;
        }
        // Update statistics tracking cache flushes.
        self.last_cache_flush = self.at;
        self.cache.flush_count += 1;
        debug!(
            "DFA cache full with {} states, flushing (flush #{})",
            self.cache.states.len(),
            self.cache.flush_count
        );

        // OK, actually flush the cache.
        let start = if self.start > STATE_DEAD {
            Some(self.copy_state(self.start))
        } else {
            None
        };
        self.cache.states.clear();
        self.cache.compiled.clear();
        for start in self.cache.start_states.iter_mut() {
            *start = STATE_UNKNOWN;
        }
        self.cache.states.push(State::invalid());
        self.cache.states.push(State::invalid());
        if let Some(start) = start {
            self.start = self.restore_state(start);
        }
        true
    }

    /// Returns a fresh copy of state si with all of its next pointers set to
    /// unknown.
    fn copy_state(&self, si: StatePtr) -> State {
        let mut state = self.cache.states[si as usize].clone();
        // Make sure to erase any pointers from this state, so that
        // they are forced to be re-computed.
        state.next = vec![STATE_UNKNOWN; self.num_byte_classes()];
        state
    }

    /// Restores the given state back into the cache, and returns a pointer
    /// to it.
    fn restore_state(&mut self, state: State) -> StatePtr {
        let key = StateKey { insts: state.insts.clone(), flags: state.flags };
        if let Some(&si) = self.cache.compiled.get(&key) {
            return si;
        }
        let si = usize_to_u32(self.cache.states.len());
        self.cache.states.push(state);
        self.cache.compiled.insert(key, si);
        si
    }

    /// Returns the next state given the current state si and current byte
    /// b. {qcur,qnext} are used as scratch space for storing ordered NFA
    /// states.
    ///
    /// This tries to fetch the next state from the cache, but if that fails,
    /// it computes the next state, caches it and returns a pointer to it.
    ///
    /// The pointer can be to a real state, or it can be STATE_DEAD.
    /// STATE_UNKNOWN cannot be returned.
    ///
    /// None is returned if a new state could not be allocated (i.e., the DFA
    /// ran out of space and thinks it's running too slowly).
    fn next_state(
        &mut self,
        qcur: &mut Workq,
        qnext: &mut Workq,
        si: StatePtr,
        b: Byte,
    ) -> Option<StatePtr> {
        let cls = self.byte_class(b);
        match self.cache.states[si as usize].next[cls] {
            STATE_UNKNOWN => self.exec_byte(qcur, qnext, si, b),
            STATE_DEAD => Some(STATE_DEAD),
            nsi => Some(nsi),
        }
    }

    /// Computes and returns the start state, where searching begins at
    /// position `at` in `text`. If the state has already been computed,
    /// then it is pulled from the cache. If the state hasn't been cached,
    /// then it is computed, cached and a pointer to it is returned.
    ///
    /// This may return STATE_DEAD but never STATE_UNKNOWN.
    fn start_state(
        &mut self,
        q: &mut Workq,
        text: &[u8],
        at: usize,
        anchored: bool,
    ) -> Option<StatePtr> {
        let (context, flags) = if self.prog.is_reverse {
            start_context_reverse(text, at)
        } else {
            start_context(text, at)
        };
        let index = context + if anchored { START_CONTEXTS } else { 0 };
        match self.cache.start_states[index] {
            STATE_UNKNOWN => {}
            si => return Some(si),
        }
        let start = if anchored {
            self.prog.start
        } else {
            self.prog.start_unanchored
        };
        q.clear();
        self.follow_epsilons(usize_to_u32(start), q, flags & EMPTY_MASK);
        // Start states can never be match states because we delay every match
        // by one byte. Given an empty string and an empty match, the match
        // won't actually occur until the DFA processes the special EOF
        // sentinel byte.
        let si = self.cached_state(q, flags, None)?;
        self.cache.start_states[index] = si;
        Some(si)
    }

    /// Quickly finds the next occurrence of any literal prefixes in the regex.
    /// If there are no literal prefixes, then the current position is
    /// returned. If there are literal prefixes and one could not be found,
    /// then None is returned.
    ///
    /// This should only be called when the DFA is in a start state.
    fn prefix_at(&self, text: &[u8], at: usize, end: usize) -> Option<usize> {
        self.prog.prefixes.find(&text[at..end]).map(|(s, _)| at + s)
    }

    /// Returns the number of byte classes required to discriminate transitions
    /// in each state.
    ///
    /// invariant: num_byte_classes() == len(State.next)
    fn num_byte_classes(&self) -> usize {
        // We add 1 to account for the special EOF byte.
        self.prog.num_byte_classes() + 1
    }

    /// Given an input byte or the special EOF sentinel, return its
    /// corresponding byte class.
    fn byte_class(&self, b: Byte) -> usize {
        if b.is_eof() {
            self.num_byte_classes() - 1
        } else {
            self.prog.byte_classes[b.0 as usize] as usize
        }
    }

    /// Approximate size returns the approximate heap space currently used by
    /// the DFA. It is used to determine whether the DFA's state cache needs to
    /// be wiped. Namely, it is possible that for certain regexes on certain
    /// inputs, a new state could be created for every byte of input. (This is
    /// bad for memory use, so we bound it with a cache.)
    ///
    /// The approximation is guaranteed to be done in constant time (and
    /// indeed, this requirement is why it's approximate).
    fn approximate_size(&self) -> usize {
        use std::mem::size_of as size;
        // Estimate that there are about 32 instructions per state consuming
        // 128 = 32 * 4 bytes of space. (This is hopefully a blatant
        // overestimate.)
        let compiled = (self.cache.compiled.len() * (size::<StateKey>() + 128))
            + (self.cache.compiled.len() * size::<StatePtr>());
        let states = self.cache.states.len()
            * (size::<State>()
                + 128
                + (self.num_byte_classes() * size::<StatePtr>()));
        let start_states = self.cache.start_states.len() * size::<StatePtr>();
        compiled + states + start_states
    }

    /// Returns true if the cache limit leaves room for a reasonable number
    /// of states. Below that, the DFA would thrash from the start.
    fn has_room(&self) -> bool {
        use std::mem::size_of as size;
        let one_state = size::<State>()
            + size::<StateKey>()
            + size::<StatePtr>()
            + (self.num_byte_classes() * size::<StatePtr>())
            + (self.prog.len() * size::<InstPtr>());
        self.limit >= 20 * one_state
    }
}

/// Computes a range `(min, max)` of strings such that every string matched
/// by the program from its (anchored) start satisfies `min <= s <= max` when
/// only its first `max_len` bytes are considered.
///
/// The range is found by walking the leftmost-longest DFA from its start
/// state, following the smallest byte that leads to a live state for `min`
/// and the largest for `max`. Each state is expanded at most once, so loops
/// are cut short. When `max` had to be cut short it is rounded up to the
/// smallest string greater than all of its extensions.
///
/// Returns `None` when no useful maximum exists (e.g., `(?s).*` in Latin-1
/// can match a run of `\xFF` bytes of any length) or when the state cache
/// runs out of room.
pub fn possible_match_range(
    prog: &Program,
    cache: &mut DfaCache,
    max_len: usize,
) -> Option<(Vec<u8>, Vec<u8>)> {
    debug_assert!(!prog.is_reverse);
    if max_len == 0 {
        return None;
    }
    cache.resize(prog.len(), true);
    let DfaCache { ref mut inner, ref mut qcur, ref mut qnext } = *cache;
    let mut dfa = Dfa::new(prog, inner, true, 0);
    dfa.can_flush = false;
    if !dfa.has_room() {
        return None;
    }
    let start = dfa.start_state(qcur, &[], 0, true)?;
    if start == STATE_DEAD {
        // No strings match.
        return Some((vec![], vec![]));
    }
    dfa.start = start;

    // A state has an arrow on a byte if it leads somewhere that can still
    // consume input.
    let mut visited = HashSet::new();
    let mut min = vec![];
    let mut si = start;
    for _ in 0..max_len {
        if !visited.insert(si) {
            break;
        }
        // Stop if min is a match.
        let eof = dfa.next_state(qcur, qnext, si, Byte::eof())?;
        if eof != STATE_DEAD && dfa.cache.states[eof as usize].flags.is_match() {
            break;
        }
        let mut found = None;
        for b in 0..=255u8 {
            let ns = dfa.next_state(qcur, qnext, si, Byte::byte(b))?;
            if ns > STATE_DEAD && !dfa.cache.states[ns as usize].insts.is_empty() {
                found = Some((b, ns));
                break;
            }
        }
        match found {
            None => break,
            Some((b, ns)) => {
                min.push(b);
                si = ns;
            }
        }
    }

    // Build the maximum, which must not stop at matches.
    visited.clear();
    let mut max = vec![];
    si = start;
    for _ in 0..max_len {
        if !visited.insert(si) {
            break;
        }
        let mut found = None;
        for b in (0..=255u8).rev() {
            let ns = dfa.next_state(qcur, qnext, si, Byte::byte(b))?;
            if ns > STATE_DEAD && !dfa.cache.states[ns as usize].insts.is_empty() {
                found = Some((b, ns));
                break;
            }
        }
        match found {
            // Every match is a prefix of max, so max is exact.
            None => return Some((min, max)),
            Some((b, ns)) => {
                max.push(b);
                si = ns;
            }
        }
    }
    prefix_successor(&mut max);
    if max.is_empty() {
        None
    } else {
        Some((min, max))
    }
}

/// Replaces `bytes` with the smallest string that is greater than every
/// string starting with `bytes`. A string of nothing but `\xFF` bytes has
/// no such successor, and becomes empty.
fn prefix_successor(bytes: &mut Vec<u8>) {
    while let Some(last) = bytes.pop() {
        if last != 0xFF {
            bytes.push(last + 1);
            return;
        }
    }
}

/// Computes the start context and flags for a forward search beginning at
/// `at` in `text`.
fn start_context(text: &[u8], at: usize) -> (usize, u32) {
    if at == 0 {
        (0, Look::StartText.as_bit() | Look::StartLine.as_bit())
    } else if text[at - 1] == b'\n' {
        (1, Look::StartLine.as_bit())
    } else if is_word_byte(text[at - 1]) {
        (2, FLAG_LAST_WORD)
    } else {
        (3, 0)
    }
}

/// Computes the start context and flags for a reverse search beginning at
/// `at` in `text`. The reverse program has its assertions flipped, so the
/// end of the text looks like the start of it.
fn start_context_reverse(text: &[u8], at: usize) -> (usize, u32) {
    if at == text.len() {
        (0, Look::StartText.as_bit() | Look::StartLine.as_bit())
    } else if text[at] == b'\n' {
        (1, Look::StartLine.as_bit())
    } else if is_word_byte(text[at]) {
        (2, FLAG_LAST_WORD)
    } else {
        (3, 0)
    }
}

impl State {
    /// Return an invalid state. This is only used to "pad" the state cache so
    /// that the special sentinel values (STATE_UNKNOWN and STATE_DEAD) are
    /// never used.
    fn invalid() -> State {
        State { next: vec![], insts: vec![], flags: StateFlags(0) }
    }
}

impl StateFlags {
    /// The empty-width flags that held just after the last byte.
    #[inline]
    fn empty(&self) -> u32 {
        self.0 & EMPTY_MASK
    }

    #[inline]
    fn is_match(&self) -> bool {
        self.0 & FLAG_MATCH != 0
    }

    #[inline]
    fn is_last_word(&self) -> bool {
        self.0 & FLAG_LAST_WORD != 0
    }

    /// The empty-width flags that the state's NFA states depend on.
    #[inline]
    fn needs(&self) -> u32 {
        self.0 >> NEED_SHIFT
    }
}

impl Byte {
    #[inline]
    fn byte(b: u8) -> Self {
        Byte(b as u16)
    }

    #[inline]
    fn eof() -> Self {
        Byte(256)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.0 == 256
    }

    #[inline]
    fn as_byte(&self) -> Option<u8> {
        if self.is_eof() {
            None
        } else {
            Some(self.0 as u8)
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut next = vec![];
        for (b, next_sp) in self.next.iter().enumerate() {
            match *next_sp {
                STATE_UNKNOWN => {}
                STATE_DEAD => next.push((vb(b), "DEAD".to_string())),
                si => next.push((vb(b), si.to_string())),
            }
        }
        let insts: Vec<String> = self
            .insts
            .iter()
            .map(|&ip| {
                if ip == MARK {
                    "|".to_string()
                } else {
                    ip.to_string()
                }
            })
            .collect();
        f.debug_struct("State")
            .field("flags", &self.flags)
            .field("insts", &insts)
            .field("next", &next)
            .finish()
    }
}

impl fmt::Debug for StateFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StateFlags")
            .field("empty", &format_args!("{:06b}", self.empty()))
            .field("match", &self.is_match())
            .field("last_word", &self.is_last_word())
            .field("needs", &format_args!("{:06b}", self.needs()))
            .finish()
    }
}

/// Helper function for formatting a byte class as a nice-to-read escaped
/// string.
fn vb(b: usize) -> String {
    use std::ascii::escape_default;

    if b > ::std::u8::MAX as usize {
        "EOF".to_owned()
    } else {
        let escaped = escape_default(b as u8).collect::<Vec<u8>>();
        String::from_utf8_lossy(&escaped).into_owned()
    }
}

fn usize_to_u32(n: usize) -> u32 {
    if (n as u64) > (::std::u32::MAX as u64) {
        panic!("BUG: {} is too big to fit into u32", n)
    }
    n as u32
}
