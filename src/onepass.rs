/*!
A one-pass regex tells us that there are no non-deterministic branches in
the regex, which means that we can use a DFA to implement capture groups
without resorting to magic too deep! The main advantages of a one-pass DFA
are:

1. The potential exponential blowup from converting an NFA to a DFA via the
   powerset construction goes away. The exponential blowup comes from
   compound states, which are a result of non-determinism. This means that
   we don't need to muck about with dynamic DFA construction or caching.

2. There are no compound states so, we can implement captures with a DFA.
   The reason that a general DFA can't handle captures is that you don't
   know what to do when the DFA reaches a compound state which includes one
   capturing state, but also other states. For a one-pass regex there will
   never be a compound state for the DFA, so captures can be implemented
   right in the DFA.

A regex is one-pass when, at every position of an anchored search, at most
one alternative can make progress on the next byte. Concretely, starting
from any state and following empty transitions:

* no instruction is reachable by two different paths,
* at most one `Match` instruction is reachable,
* no two `Bytes` instructions disagree about where a byte goes.

Every state owns one action per byte class plus a match condition. An action
packs the zero-width assertions that must hold before the byte is consumed,
the capture slots to record, whether a match at this position takes priority
over going on, and the index of the next state.
*/

use std::fmt;

use crate::hir::Look;
use crate::input::{Input, Slot};
use crate::prog::{Inst, InstPtr, Program};
use crate::sparse::SparseSet;

type Action = u64;

/// The zero-width assertions an action depends on. These are the bits of
/// `Look`.
const EMPTY_ALL: Action = 0x3F;
/// Set when a match seen before consuming this byte beats continuing.
const MATCH_WINS: Action = 1 << 6;
/// The bit of capture slot `0`.
const CAP_SHIFT: u32 = 7;
/// The most capture slots an action can record.
const MAX_SLOTS: usize = 32;
/// The bits above this hold the next state.
const INDEX_SHIFT: u32 = 40;
/// An action that can never be taken, since a position can't both be and
/// not be a word boundary. Unset actions hold this.
const IMPOSSIBLE: Action =
    (Look::WordBoundary as u64) | (Look::NotWordBoundary as u64);
/// The most states a one-pass DFA may have.
const MAX_STATES: usize = 1 << 24;

const LOOKS: [Look; 6] = [
    Look::StartLine,
    Look::EndLine,
    Look::StartText,
    Look::EndText,
    Look::WordBoundary,
    Look::NotWordBoundary,
];

/// A one-pass DFA.
#[derive(Clone)]
pub struct OnePass {
    /// The flattened transition table of all of the different DFA states.
    /// Each state is `stride` actions long: one per byte class, followed by
    /// the condition under which the state matches.
    table: Vec<Action>,
    /// The number of actions per state.
    stride: usize,
    /// The byte classes of this regex.
    byte_classes: Vec<u8>,
    /// The number of capture slots in the program.
    nslots: usize,
}

impl OnePass {
    /// Builds a one-pass DFA from the given program, or returns `None` if
    /// the program isn't one-pass or the DFA would be too big.
    pub fn new(prog: &Program) -> Option<OnePass> {
        if prog.is_reverse || prog.slot_count() > MAX_SLOTS {
            return None;
        }
        let stride = prog.num_byte_classes() + 1;
        let num_bytes =
            prog.iter().filter(|inst| matches!(**inst, Inst::Bytes(_))).count();
        let max_states = num_bytes + 2;
        let state_size = stride * std::mem::size_of::<Action>();
        if max_states >= MAX_STATES
            || prog.dfa_size_limit / 4 / state_size < max_states
        {
            log::debug!("one-pass DFA would need too many states");
            return None;
        }
        match Builder::new(prog, stride).build() {
            Ok(table) => Some(OnePass {
                table,
                stride,
                byte_classes: prog.byte_classes.clone(),
                nslots: prog.slot_count(),
            }),
            Err(ip) => {
                log::trace!("not one-pass at instruction {}", ip);
                None
            }
        }
    }

    /// Execute the one-pass DFA, populating the list of capture slots as
    /// you go.
    ///
    /// The search is always anchored at the start of the span. Returns true
    /// if there is a match and false otherwise.
    pub fn exec(&self, slots: &mut [Slot], input: Input<'_>) -> bool {
        let text = input.haystack();
        let full = input.is_anchored_end();
        let longest = input.is_longest();
        let nslots = std::cmp::min(self.nslots, MAX_SLOTS);
        let mut cap = [None; MAX_SLOTS];
        let mut matchcap = [None; MAX_SLOTS];
        let mut matched = false;

        let mut state = 0;
        let mut nextmatchcond = self.matchcond(state);
        let mut at = input.start();
        let mut dead = false;
        while at < input.end() {
            let class = self.byte_classes[text[at] as usize] as usize;
            let matchcond = nextmatchcond;
            let cond = self.table[state * self.stride + class];
            log::trace!("one-pass: state {} byte {:?} at {}", state,
                        text[at] as char, at);
            if cond & EMPTY_ALL == 0 || satisfy(cond, text, at) {
                state = (cond >> INDEX_SHIFT) as usize;
                nextmatchcond = self.matchcond(state);
            } else {
                dead = true;
                nextmatchcond = IMPOSSIBLE;
            }

            // A match before the end of the span can't satisfy an anchored
            // end.
            if !full
                && matchcond != IMPOSSIBLE
                && (matchcond & EMPTY_ALL == 0 || satisfy(matchcond, text, at))
            {
                matchcap[..nslots].copy_from_slice(&cap[..nslots]);
                apply(matchcond, at, &mut matchcap[..nslots]);
                matched = true;
                // In leftmost-first mode, we can stop if the match takes
                // priority over the next state for this input byte. That bit
                // is per input byte and thus in `cond`, not `matchcond`.
                if !longest && cond & MATCH_WINS != 0 {
                    return finish(slots, &matchcap[..nslots]);
                }
            }
            if dead {
                break;
            }
            apply(cond, at, &mut cap[..nslots]);
            at += 1;
        }
        if !dead {
            // Look for a match at the end of the span.
            let matchcond = self.matchcond(state);
            if matchcond != IMPOSSIBLE
                && (matchcond & EMPTY_ALL == 0 || satisfy(matchcond, text, at))
            {
                apply(matchcond, at, &mut cap[..nslots]);
                matchcap[..nslots].copy_from_slice(&cap[..nslots]);
                matched = true;
            }
        }
        if !matched {
            return false;
        }
        finish(slots, &matchcap[..nslots])
    }

    fn matchcond(&self, state: usize) -> Action {
        self.table[state * self.stride + self.stride - 1]
    }
}

fn finish(slots: &mut [Slot], matchcap: &[Slot]) -> bool {
    for (slot, &val) in slots.iter_mut().zip(matchcap) {
        *slot = val;
    }
    true
}

/// Returns true if every assertion in `cond` holds at `at`.
fn satisfy(cond: Action, haystack: &[u8], at: usize) -> bool {
    LOOKS.iter().all(|look| {
        cond & Action::from(look.as_bit()) == 0 || look.is_match(haystack, at)
    })
}

/// Records `at` in every capture slot named by `cond`.
fn apply(cond: Action, at: usize, cap: &mut [Slot]) {
    for (i, slot) in cap.iter_mut().enumerate() {
        if cond & (1 << (CAP_SHIFT + i as u32)) != 0 {
            *slot = Some(at);
        }
    }
}

/// Computes the one-pass transition table of a program.
struct Builder<'p> {
    prog: &'p Program,
    stride: usize,
    table: Vec<Action>,
    /// The state of every instruction that is the target of a byte.
    state_of: Vec<Option<usize>>,
    /// Instructions whose states still need their actions computed.
    todo: Vec<InstPtr>,
    /// The instructions reached from the current state.
    seen: SparseSet,
    stack: Vec<(InstPtr, Action)>,
}

impl<'p> Builder<'p> {
    fn new(prog: &'p Program, stride: usize) -> Builder<'p> {
        Builder {
            prog,
            stride,
            table: vec![],
            state_of: vec![None; prog.len()],
            todo: vec![],
            seen: SparseSet::new(prog.len()),
            stack: vec![],
        }
    }

    /// Returns the finished table, or the instruction at which the program
    /// was found not to be one-pass.
    fn build(mut self) -> Result<Vec<Action>, InstPtr> {
        self.state(self.prog.start);
        let mut i = 0;
        while i < self.todo.len() {
            let ip = self.todo[i];
            i += 1;
            self.compute(ip)?;
        }
        Ok(self.table)
    }

    /// Returns the state for the given instruction, adding one if needed.
    fn state(&mut self, ip: InstPtr) -> usize {
        if let Some(state) = self.state_of[ip] {
            return state;
        }
        let state = self.table.len() / self.stride;
        self.table.extend(std::iter::repeat(IMPOSSIBLE).take(self.stride));
        self.state_of[ip] = Some(state);
        self.todo.push(ip);
        state
    }

    /// Fills in the actions of the state for `ip` by following every empty
    /// transition from it in priority order.
    fn compute(&mut self, ip: InstPtr) -> Result<(), InstPtr> {
        let state = self.state(ip);
        let base = state * self.stride;
        let mut matched = false;
        self.seen.clear();
        self.stack.clear();
        self.stack.push((ip, 0));
        while let Some((mut ip, mut cond)) = self.stack.pop() {
            loop {
                if self.seen.contains(ip) {
                    // Two paths lead here.
                    return Err(ip);
                }
                self.seen.insert(ip);
                match self.prog[ip] {
                    Inst::Fail => break,
                    Inst::Match => {
                        if matched {
                            return Err(ip);
                        }
                        matched = true;
                        self.table[base + self.stride - 1] = cond;
                        break;
                    }
                    Inst::Save(ref inst) => {
                        if inst.slot < MAX_SLOTS {
                            cond |= 1 << (CAP_SHIFT + inst.slot as u32);
                        }
                        ip = inst.goto;
                    }
                    Inst::EmptyLook(ref inst) => {
                        cond |= Action::from(inst.look.as_bit());
                        ip = inst.goto;
                    }
                    Inst::Split(ref inst) => {
                        self.stack.push((inst.goto2, cond));
                        ip = inst.goto1;
                    }
                    Inst::Bytes(ref inst) => {
                        let next = self.state(inst.goto) as Action;
                        let mut action = (next << INDEX_SHIFT) | cond;
                        if matched {
                            action |= MATCH_WINS;
                        }
                        for b in inst.start..=inst.end {
                            let class = self.prog.byte_classes[b as usize];
                            let slot = &mut self.table[base + class as usize];
                            if *slot & IMPOSSIBLE == IMPOSSIBLE {
                                *slot = action;
                            } else if *slot != action {
                                return Err(ip);
                            }
                        }
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for OnePass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn action(a: Action) -> String {
            if a & IMPOSSIBLE == IMPOSSIBLE {
                return "D".to_string();
            }
            let mut s = format!("{}", a >> INDEX_SHIFT);
            if a & MATCH_WINS != 0 {
                s.push('!');
            }
            if a & EMPTY_ALL != 0 {
                s.push_str(&format!("/e{:x}", a & EMPTY_ALL));
            }
            let caps = (a >> CAP_SHIFT) & ((1 << MAX_SLOTS) - 1);
            if caps != 0 {
                s.push_str(&format!("/c{:x}", caps));
            }
            s
        }

        for (i, state) in self.table.chunks(self.stride).enumerate() {
            let (trans, matchcond) = state.split_at(self.stride - 1);
            write!(f, "{:04}: ", i)?;
            for (class, &a) in trans.iter().enumerate() {
                if a & IMPOSSIBLE != IMPOSSIBLE {
                    write!(f, "{}/{} ", class, action(a))?;
                }
            }
            if matchcond[0] != IMPOSSIBLE {
                write!(f, "M({})", action(matchcond[0]))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
