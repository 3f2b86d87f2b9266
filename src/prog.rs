use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::ops::Deref;
use std::slice;
use std::sync::Arc;

use crate::hir::Look;
use crate::literal::LiteralSearcher;

/// `InstPtr` represents the index of an instruction in a regex program.
pub type InstPtr = usize;

/// Program is a sequence of instructions and various facts about those
/// instructions.
///
/// Every program runs on bytes. UTF-8 decoding is compiled into the
/// instructions themselves, and Latin-1 programs use one byte per character.
#[derive(Clone)]
pub struct Program {
    /// A sequence of instructions that represents an NFA.
    pub insts: Vec<Inst>,
    /// The ordered sequence of all capture groups extracted from the pattern,
    /// including the implicit group `0` for the whole match. Unnamed groups
    /// are `None`.
    pub captures: Vec<Option<String>>,
    /// Pointers to all named capture groups into `captures`.
    pub capture_name_idx: Arc<HashMap<String, usize>>,
    /// A pointer to the start instruction for anchored searches.
    pub start: InstPtr,
    /// A pointer to the start instruction for unanchored searches. This is a
    /// non-greedy `(?s-u:.)*?` loop that leads to `start`.
    pub start_unanchored: InstPtr,
    /// A set of equivalence classes for discriminating bytes in the compiled
    /// program.
    pub byte_classes: Vec<u8>,
    /// When true, the program matches text in reverse.
    pub is_reverse: bool,
    /// Whether the regex must match from the start of the input.
    pub is_anchored_start: bool,
    /// Whether the regex must match at the end of the input.
    pub is_anchored_end: bool,
    /// Whether this program contains a `\b` or `\B` instruction.
    pub has_word_boundary: bool,
    /// When true, every character in the pattern and the haystack is a
    /// single Latin-1 byte.
    pub latin1: bool,
    /// A possibly empty machine for very quickly matching prefix literals.
    pub prefixes: LiteralSearcher,
    /// A limit on the size of the cache that the DFA is allowed to use while
    /// matching.
    ///
    /// Once the state cache exceeds the size, it is wiped and all states must
    /// be re-computed. If that happens too often, the DFA gives up.
    ///
    /// Also note that this limit is *per thread of execution*. That is,
    /// if the same regex is used to search text across multiple threads
    /// simultaneously, then the DFA cache is not shared. Instead, copies are
    /// made.
    pub dfa_size_limit: usize,
}

impl Program {
    /// Creates an empty instruction sequence. Fields are given default
    /// values.
    pub fn new() -> Self {
        Program {
            insts: vec![],
            captures: vec![],
            capture_name_idx: Arc::new(HashMap::new()),
            start: 0,
            start_unanchored: 0,
            byte_classes: vec![0; 256],
            is_reverse: false,
            is_anchored_start: false,
            is_anchored_end: false,
            has_word_boundary: false,
            latin1: false,
            prefixes: LiteralSearcher::empty(),
            dfa_size_limit: 2 * (1 << 20),
        }
    }

    /// If pc is an index to a no-op instruction (like Save), then return the
    /// next pc that is not a no-op instruction.
    pub fn skip(&self, mut pc: usize) -> usize {
        loop {
            match self[pc] {
                Inst::Save(ref inst) => pc = inst.goto,
                _ => return pc,
            }
        }
    }

    /// Return true if and only if an execution engine at instruction `pc` will
    /// always lead to a match.
    pub fn leads_to_match(&self, pc: usize) -> bool {
        match self[self.skip(pc)] {
            Inst::Match => true,
            _ => false,
        }
    }

    /// The number of capture slots needed to record every group of a match,
    /// including the whole match.
    pub fn slot_count(&self) -> usize {
        self.captures.len() * 2
    }

    /// Returns the number of distinct byte classes in this program.
    pub fn num_byte_classes(&self) -> usize {
        self.byte_classes[255] as usize + 1
    }

    /// Return the approximate heap usage of this instruction sequence in
    /// bytes.
    pub fn approximate_size(&self) -> usize {
        (self.len() * mem::size_of::<Inst>())
            + (self.captures.len() * mem::size_of::<Option<String>>())
            + (self.capture_name_idx.len()
                * (mem::size_of::<String>() + mem::size_of::<usize>()))
            + (self.byte_classes.len() * mem::size_of::<u8>())
            + self.prefixes.approximate_size()
    }
}

impl Deref for Program {
    type Target = [Inst];

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &*self.insts
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (pc, inst) in self.iter().enumerate() {
            write!(f, "{:04} {:?}", pc, inst)?;
            if let Some(goto) = inst.goto() {
                if pc + 1 != goto {
                    write!(f, " (goto: {})", goto)?;
                }
            }
            if pc == self.start {
                write!(f, " (start)")?;
            }
            if pc == self.start_unanchored && pc != self.start {
                write!(f, " (start unanchored)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Inst;
    type IntoIter = slice::Iter<'a, Inst>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An instruction in a regex program.
#[derive(Clone)]
pub enum Inst {
    /// Match indicates that the program has reached a match state.
    Match,
    /// Fail kills the thread that reaches it. This is what an empty class,
    /// like `\P{Any}`, compiles to.
    Fail,
    /// Save causes the program to save the current location of the input in
    /// the slot indicated by InstSave.
    Save(InstSave),
    /// Split causes the program to diverge to one of two paths in the
    /// program, preferring goto1 in InstSplit.
    Split(InstSplit),
    /// EmptyLook represents a zero-width assertion in a regex program. A
    /// zero-width assertion does not consume any of the input text.
    EmptyLook(InstEmptyLook),
    /// Bytes expresses a single byte range. It is used in conjunction with
    /// Split instructions to implement multi-byte character classes.
    Bytes(InstBytes),
}

impl Inst {
    /// Returns true if and only if this is a match instruction.
    pub fn is_match(&self) -> bool {
        match *self {
            Inst::Match => true,
            _ => false,
        }
    }

    /// Returns the single successor of this instruction, if it has one.
    pub fn goto(&self) -> Option<InstPtr> {
        match *self {
            Inst::Match | Inst::Fail | Inst::Split(_) => None,
            Inst::Save(ref inst) => Some(inst.goto),
            Inst::EmptyLook(ref inst) => Some(inst.goto),
            Inst::Bytes(ref inst) => Some(inst.goto),
        }
    }
}

impl fmt::Debug for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn visible_byte(b: u8) -> String {
            use std::ascii::escape_default;
            let escaped = escape_default(b).collect::<Vec<u8>>();
            String::from_utf8_lossy(&escaped).into_owned()
        }

        match *self {
            Inst::Match => write!(f, "Match"),
            Inst::Fail => write!(f, "Fail"),
            Inst::Save(ref inst) => write!(f, "Save({})", inst.slot),
            Inst::Split(ref inst) => {
                write!(f, "Split({}, {})", inst.goto1, inst.goto2)
            }
            Inst::EmptyLook(ref inst) => write!(f, "{:?}", inst.look),
            Inst::Bytes(ref inst) => write!(
                f,
                "Bytes({}, {})",
                visible_byte(inst.start),
                visible_byte(inst.end)
            ),
        }
    }
}

/// Representation of the Save instruction.
#[derive(Clone, Debug)]
pub struct InstSave {
    /// The next location to execute in the program.
    pub goto: InstPtr,
    /// The capture slot (there are two slots for every capture in a regex,
    /// including the zeroth capture for the entire match).
    pub slot: usize,
}

/// Representation of the Split instruction.
#[derive(Clone, Debug)]
pub struct InstSplit {
    /// The first instruction to try. A match resulting from following goto1
    /// has precedence over a match resulting from following goto2.
    pub goto1: InstPtr,
    /// The second instruction to try. A match resulting from following goto1
    /// has precedence over a match resulting from following goto2.
    pub goto2: InstPtr,
}

/// Representation of the `EmptyLook` instruction.
#[derive(Clone, Debug)]
pub struct InstEmptyLook {
    /// The next location to execute in the program if this instruction
    /// succeeds.
    pub goto: InstPtr,
    /// The type of zero-width assertion to check.
    pub(crate) look: Look,
}

/// Representation of the Bytes instruction.
#[derive(Clone, Debug)]
pub struct InstBytes {
    /// The next location to execute in the program if this instruction
    /// succeeds.
    pub goto: InstPtr,
    /// The start (inclusive) of this byte range.
    pub start: u8,
    /// The end (inclusive) of this byte range.
    pub end: u8,
}

impl InstBytes {
    /// Returns true if and only if the given byte is in this range.
    pub fn matches(&self, byte: u8) -> bool {
        self.start <= byte && byte <= self.end
    }
}
