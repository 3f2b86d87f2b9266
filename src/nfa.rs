// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// This is the Pike VM: a simulation of the NFA that tracks capture groups
// for every thread. It is the only engine that can execute any program on
// any input with captures, so it is the fallback for everything else.
//
// Threads live in a list ordered by priority. In leftmost-first mode, the
// first thread to reach a Match kills every thread of lower priority. In
// leftmost-longest mode, all threads that started no later than the best
// match so far keep running, and a match replaces the best one only if it
// is longer.
//
// The unanchored prefix `.*?` is simulated by adding a fresh thread at the
// start instruction before every step, until a match is found.

use std::mem;

use crate::input::{Input, Slot};
use crate::prog::{Inst, InstPtr, Program};
use crate::sparse::SparseSet;

/// An NFA simulation matching engine.
#[derive(Debug)]
pub struct Nfa<'r, 't> {
    /// The sequence of opcodes (among other things) that is actually executed.
    prog: &'r Program,
    /// An explicit stack used for following epsilon transitions. (This is
    /// borrowed from the cache.)
    stack: &'r mut Vec<FollowEpsilon>,
    /// The search to run.
    input: Input<'t>,
}

/// A cached allocation that can be reused on each execution.
#[derive(Clone, Debug)]
pub struct NfaCache {
    /// A pair of ordered sets for tracking NFA states.
    clist: Threads,
    nlist: Threads,
    /// An explicit stack used for following epsilon transitions.
    stack: Vec<FollowEpsilon>,
}

/// An ordered set of NFA states and their captures.
#[derive(Clone, Debug)]
struct Threads {
    /// An ordered set of opcodes (each opcode is an NFA state).
    set: SparseSet,
    /// Captures for every NFA state.
    ///
    /// It is stored in row-major order, where the columns are the capture
    /// slots and the rows are the states.
    caps: Vec<Slot>,
    /// The number of capture slots stored per thread. (Every capture has
    /// two slots.)
    slots_per_thread: usize,
}

/// A representation of an explicit stack frame when following epsilon
/// transitions. This is used to avoid recursion.
#[derive(Clone, Debug)]
enum FollowEpsilon {
    /// Follow transitions at the given instruction pointer.
    IP(InstPtr),
    /// Restore the capture slot with the given position in the input.
    Capture { slot: usize, pos: Slot },
}

impl NfaCache {
    /// Create a new allocation used by the NFA machine to record execution
    /// and captures.
    pub fn new() -> Self {
        NfaCache { clist: Threads::new(), nlist: Threads::new(), stack: vec![] }
    }
}

impl<'r, 't> Nfa<'r, 't> {
    /// Execute the NFA matching engine.
    ///
    /// If there's a match, `exec` returns `true` and populates the given
    /// capture slots accordingly. Slots `0` and `1` hold the bounds of the
    /// whole match; an empty `slots` only asks whether there is a match.
    pub fn exec(
        prog: &'r Program,
        cache: &mut NfaCache,
        slots: &mut [Slot],
        input: Input<'t>,
    ) -> bool {
        // The bounds of the match are always tracked, even when the caller
        // doesn't want them, because leftmost-longest needs them.
        let nslots = std::cmp::max(2, std::cmp::min(slots.len(), prog.slot_count()));
        cache.clist.resize(prog.len(), nslots);
        cache.nlist.resize(prog.len(), nslots);
        let mut matched = vec![None; nslots];
        let ok = Nfa { prog, stack: &mut cache.stack, input }.exec_(
            &mut cache.clist,
            &mut cache.nlist,
            &mut matched,
            slots.is_empty(),
        );
        if ok {
            for (slot, val) in slots.iter_mut().zip(matched.iter()) {
                *slot = *val;
            }
        }
        ok
    }

    fn exec_<'c>(
        &mut self,
        mut clist: &'c mut Threads,
        mut nlist: &'c mut Threads,
        slots: &mut [Slot],
        quit_after_match: bool,
    ) -> bool {
        let mut matched = false;
        let mut at = self.input.start();
        let end = self.input.end();
        let anchored = self.input.is_anchored_start();
        let longest = self.input.is_longest();
        clist.set.clear();
        nlist.set.clear();
        loop {
            if clist.set.is_empty() {
                // Three ways to bail out when our current set of threads is
                // empty.
                //
                // 1. We have a match---so we're done exploring any possible
                //    alternatives. Time to quit.
                //
                // 2. If the search is anchored, we can terminate as soon as
                //    the last thread dies.
                if matched || (anchored && at > self.input.start()) {
                    break;
                }

                // 3. If there's a literal prefix for the program, try to
                //    jump ahead quickly. If it can't be found, then we can
                //    bail out early.
                if !anchored && !self.prog.prefixes.is_empty() && at < end {
                    let hay = &self.input.haystack()[at..end];
                    at = match self.prog.prefixes.find(hay) {
                        None => break,
                        Some((s, _)) => at + s,
                    };
                }
            }

            // This simulates a preceding '.*?' for every regex by adding
            // a state starting at the current position in the input for the
            // beginning of the program only if we don't already have a match.
            if !matched && (!anchored || at == self.input.start()) {
                let mut tcaps = vec![None; clist.slots_per_thread];
                self.add(clist, &mut tcaps, self.prog.start, at);
            }
            let byte = self.input.byte(at);
            for i in 0..clist.set.len() {
                let ip = clist.set[i];
                let mut tcaps = clist.caps(ip).to_vec();
                if longest && matched && tcaps[0] > slots[0] {
                    // Any thread that started after the current best match
                    // can't produce a leftmost match.
                    continue;
                }
                if self.step(nlist, slots, &mut tcaps, ip, at, byte, matched)
                {
                    matched = true;
                    if quit_after_match {
                        return true;
                    }
                    if !longest {
                        // We don't need to check the rest of the threads in
                        // this set because we've matched something
                        // ("leftmost-first"). However, we still need to
                        // check threads in the next set to support things
                        // like greedy matching.
                        break;
                    }
                }
            }
            if at >= end {
                break;
            }
            at += 1;
            mem::swap(&mut clist, &mut nlist);
            nlist.set.clear();
        }
        matched
    }

    /// Step through the input, one byte at a time.
    ///
    /// nlist is the set of states that will be processed on the next byte
    /// in the input.
    ///
    /// slots is the set of captures passed by the caller of the NFA. They are
    /// written to only when a match state is visited.
    ///
    /// thread_caps is the set of captures set for the current NFA state, ip.
    ///
    /// Returns true if ip is a Match instruction whose captures were copied
    /// to slots.
    #[allow(clippy::too_many_arguments)]
    fn step(
        &mut self,
        nlist: &mut Threads,
        slots: &mut [Slot],
        thread_caps: &mut [Slot],
        ip: usize,
        at: usize,
        byte: Option<u8>,
        matched: bool,
    ) -> bool {
        match self.prog[ip] {
            Inst::Match => {
                if !self.input.is_end_ok(at) {
                    return false;
                }
                if self.input.is_longest() && matched {
                    // Threads are only visited here if they started no
                    // later than the best match, so only the end can
                    // improve.
                    let better = thread_caps[0] < slots[0]
                        || (thread_caps[0] == slots[0]
                            && thread_caps[1] > slots[1]);
                    if !better {
                        return false;
                    }
                }
                slots.copy_from_slice(thread_caps);
                true
            }
            Inst::Bytes(ref inst) => {
                if let Some(b) = byte {
                    if inst.matches(b) {
                        self.add(nlist, thread_caps, inst.goto, at + 1);
                    }
                }
                false
            }
            Inst::Fail
            | Inst::EmptyLook(_)
            | Inst::Save(_)
            | Inst::Split(_) => false,
        }
    }

    /// Follows epsilon transitions and adds them for processing to nlist,
    /// starting at and including ip.
    #[inline(always)]
    fn add(
        &mut self,
        nlist: &mut Threads,
        thread_caps: &mut [Slot],
        ip: usize,
        at: usize,
    ) {
        self.stack.push(FollowEpsilon::IP(ip));
        while let Some(frame) = self.stack.pop() {
            match frame {
                FollowEpsilon::IP(ip) => {
                    self.add_step(nlist, thread_caps, ip, at);
                }
                FollowEpsilon::Capture { slot, pos } => {
                    thread_caps[slot] = pos;
                }
            }
        }
    }

    /// A helper function for add that avoids excessive pushing to the stack.
    fn add_step(
        &mut self,
        nlist: &mut Threads,
        thread_caps: &mut [Slot],
        mut ip: usize,
        at: usize,
    ) {
        // Instead of pushing and popping to the stack, we mutate ip as we
        // traverse the set of states. We only push to the stack when we
        // absolutely need recursion (restoring captures or following a
        // branch).
        loop {
            // Don't visit states we've already added.
            if nlist.set.contains(ip) {
                return;
            }
            nlist.set.insert(ip);
            match self.prog[ip] {
                Inst::EmptyLook(ref inst) => {
                    if inst.look.is_match(self.input.haystack(), at) {
                        ip = inst.goto;
                    } else {
                        return;
                    }
                }
                Inst::Save(ref inst) => {
                    if inst.slot < thread_caps.len() {
                        self.stack.push(FollowEpsilon::Capture {
                            slot: inst.slot,
                            pos: thread_caps[inst.slot],
                        });
                        thread_caps[inst.slot] = Some(at);
                    }
                    ip = inst.goto;
                }
                Inst::Split(ref inst) => {
                    self.stack.push(FollowEpsilon::IP(inst.goto2));
                    ip = inst.goto1;
                }
                Inst::Fail => return,
                Inst::Match | Inst::Bytes(_) => {
                    let t = nlist.caps(ip);
                    t.copy_from_slice(thread_caps);
                    return;
                }
            }
        }
    }
}

impl Threads {
    fn new() -> Self {
        Threads { set: SparseSet::new(0), caps: vec![], slots_per_thread: 0 }
    }

    fn resize(&mut self, num_insts: usize, nslots: usize) {
        if num_insts == self.set.capacity() && nslots == self.slots_per_thread
        {
            return;
        }
        self.slots_per_thread = nslots;
        self.set = SparseSet::new(num_insts);
        self.caps = vec![None; self.slots_per_thread * num_insts];
    }

    fn caps(&mut self, pc: usize) -> &mut [Slot] {
        let i = pc * self.slots_per_thread;
        &mut self.caps[i..i + self.slots_per_thread]
    }
}
