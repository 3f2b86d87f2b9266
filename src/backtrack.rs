// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// This is the backtracking matching engine. It has the same exact capability
// as the full NFA simulation, except it is artificially restricted to small
// regexes on small inputs because of its memory requirements.
//
// In particular, this is a *bounded* backtracking engine. It retains worst
// case linear time by keeping track of the states that is has visited (using a
// bitmap). Namely, once a state is visited, it is never visited again. Since a
// state is keyed by `(instruction index, input index)`, we have that its time
// complexity is `O(mn)`.
//
// The backtracking engine can beat out the NFA simulation on small
// regexes/inputs because it doesn't have to keep track of multiple copies of
// the capture groups. In benchmarks, the backtracking engine is roughly twice
// as fast as the full NFA simulation.

use crate::input::{Input, Slot};
use crate::prog::{Inst, InstPtr, Program};

type Bits = u32;

const BIT_SIZE: usize = 32;
const MAX_SIZE_BYTES: usize = 256 * (1 << 10); // 256 KB

/// Returns true iff the given regex and input should be executed by this
/// engine with reasonable memory usage.
pub fn should_exec(num_insts: usize, text_len: usize) -> bool {
    // Total memory usage in bytes is determined by:
    //
    //   ((len(insts) * (len(input) + 1) + bits - 1) / bits) * (size_of(u32))
    //
    // The actual limit picked is pretty much a heuristic.
    // See: https://github.com/rust-lang/regex/issues/215
    let size = ((num_insts * (text_len + 1) + BIT_SIZE - 1) / BIT_SIZE) * 4;
    size <= MAX_SIZE_BYTES
}

/// A backtracking matching engine.
#[derive(Debug)]
pub struct Bounded<'a, 'r, 't> {
    prog: &'r Program,
    input: Input<'t>,
    slots: &'a mut [Slot],
    m: &'a mut Cache,
    /// The best match found so far, used by leftmost-longest searches.
    best: Vec<Slot>,
}

/// Shared cached state between multiple invocations of a backtracking engine
/// in the same thread.
#[derive(Clone, Debug)]
pub struct Cache {
    jobs: Vec<Job>,
    visited: Vec<Bits>,
}

impl Cache {
    /// Create new empty cache for the backtracking engine.
    pub fn new() -> Self {
        Cache { jobs: vec![], visited: vec![] }
    }
}

/// A job is an explicit unit of stack space in the backtracking engine.
///
/// The "normal" representation is a single state transition, which corresponds
/// to an NFA state and a byte in the input. However, the backtracking engine
/// must keep track of old capture group values. We use the explicit stack to
/// do it.
#[derive(Clone, Copy, Debug)]
enum Job {
    Inst { ip: InstPtr, at: usize },
    SaveRestore { slot: usize, old_pos: Slot },
}

impl<'a, 'r, 't> Bounded<'a, 'r, 't> {
    /// Execute the backtracking matching engine.
    ///
    /// If there's a match, `exec` returns `true` and populates the given
    /// capture slots accordingly.
    pub fn exec(
        prog: &'r Program,
        cache: &'a mut Cache,
        slots: &'a mut [Slot],
        input: Input<'t>,
    ) -> bool {
        // Leftmost-longest needs the bounds of the match even when the
        // caller didn't ask for them.
        let mut bounds = [None, None];
        let slots = if slots.len() < 2 { &mut bounds[..] } else { slots };
        let mut b = Bounded { prog, input, slots, m: cache, best: vec![] };
        b.exec_()
    }

    /// Clears the cache such that the backtracking engine can be executed
    /// on some input of fixed length.
    fn clear(&mut self) {
        // Reset the job memory so that we start fresh.
        self.m.jobs.clear();

        // Now we need to clear the bit state set.
        // We do this by figuring out how much space we need to keep track
        // of the states we've visited.
        // Then we reset all existing allocated space to 0.
        // Finally, we request more space if we need it.
        //
        // This is all a little circuitous, but doing this using unchecked
        // operations doesn't seem to have a measurable impact on performance.
        // (Probably because backtracking is limited to such small
        // inputs/regexes in the first place.)
        let visited_len =
            (self.prog.len() * (self.input.len() + 1) + BIT_SIZE - 1)
                / BIT_SIZE;
        self.m.visited.truncate(visited_len);
        for v in &mut self.m.visited {
            *v = 0;
        }
        if visited_len > self.m.visited.len() {
            let len = self.m.visited.len();
            self.m.visited.reserve_exact(visited_len - len);
            for _ in 0..(visited_len - len) {
                self.m.visited.push(0);
            }
        }
    }

    /// Start backtracking at every position in the span until a match is
    /// found.
    fn exec_(&mut self) -> bool {
        self.clear();
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        let mut at = self.input.start();
        let end = self.input.end();
        // If this is an anchored search, then we only want to try one
        // position.
        if self.input.is_anchored_start() {
            return self.backtrack(at);
        }
        let prefixes = &self.prog.prefixes;
        loop {
            if !prefixes.is_empty() {
                at = match prefixes.find(&self.input.haystack()[at..end]) {
                    None => return false,
                    Some((s, _)) => at + s,
                };
            }
            if self.backtrack(at) {
                return true;
            }
            if at >= end {
                return false;
            }
            at += 1;
        }
    }

    /// The main backtracking loop starting at the given input position.
    fn backtrack(&mut self, start: usize) -> bool {
        // N.B. We use an explicit stack to avoid recursion.
        // To avoid excessive pushing and popping, most transitions are handled
        // in the `step` helper function, which only pushes to the stack when
        // there's a capture or a branch.
        let mut matched = false;
        self.m.jobs.push(Job::Inst { ip: self.prog.start, at: start });
        while let Some(job) = self.m.jobs.pop() {
            match job {
                Job::Inst { ip, at } => {
                    if self.step(ip, at) {
                        // Only quit if we're matching one regex.
                        // If we're matching a regex set, then mush on and
                        // try to find other matches (if we want them).
                        if !self.input.is_longest() {
                            return true;
                        }
                        matched = true;
                    }
                }
                Job::SaveRestore { slot, old_pos } => {
                    if slot < self.slots.len() {
                        self.slots[slot] = old_pos;
                    }
                }
            }
        }
        if matched {
            self.slots.copy_from_slice(&self.best);
        }
        matched
    }

    fn step(&mut self, mut ip: InstPtr, mut at: usize) -> bool {
        loop {
            // This loop is an optimization to avoid constantly pushing/popping
            // from the stack. Namely, if we're pushing a job only to run it
            // next, avoid the push and just mutate `ip` (and possibly `at`)
            // in place.
            if self.has_visited(ip, at) {
                return false;
            }
            match self.prog[ip] {
                Inst::Match => {
                    if !self.input.is_end_ok(at) {
                        return false;
                    }
                    if !self.input.is_longest() {
                        return true;
                    }
                    // Every match found from one starting position begins
                    // at the same place, so longer is better.
                    let longer = match self.best.get(1) {
                        None => true,
                        Some(&end) => Some(at) > end,
                    };
                    if longer {
                        self.best = self.slots.to_vec();
                        self.best[1] = Some(at);
                    }
                    return true;
                }
                Inst::Save(ref inst) => {
                    if let Some(&old_pos) = self.slots.get(inst.slot) {
                        // If this path doesn't work out, then we save the old
                        // capture index (if one exists) in an alternate
                        // job. If the next path fails, then the alternate
                        // job is popped and the old capture index is restored.
                        self.m.jobs.push(Job::SaveRestore {
                            slot: inst.slot,
                            old_pos,
                        });
                        self.slots[inst.slot] = Some(at);
                    }
                    ip = inst.goto;
                }
                Inst::Split(ref inst) => {
                    self.m.jobs.push(Job::Inst { ip: inst.goto2, at });
                    ip = inst.goto1;
                }
                Inst::EmptyLook(ref inst) => {
                    if inst.look.is_match(self.input.haystack(), at) {
                        ip = inst.goto;
                    } else {
                        return false;
                    }
                }
                Inst::Bytes(ref inst) => match self.input.byte(at) {
                    Some(b) if inst.matches(b) => {
                        ip = inst.goto;
                        at += 1;
                    }
                    _ => return false,
                },
                Inst::Fail => return false,
            }
        }
    }

    fn has_visited(&mut self, ip: InstPtr, at: usize) -> bool {
        let k = ip * (self.input.len() + 1) + (at - self.input.start());
        let k1 = k / BIT_SIZE;
        let k2 = (1 << (k & (BIT_SIZE - 1))) as Bits;
        if self.m.visited[k1] & k2 == 0 {
            self.m.visited[k1] |= k2;
            false
        } else {
            true
        }
    }
}
