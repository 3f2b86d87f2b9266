use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::mem::size_of;
use std::result;
use std::sync::Arc;

use utf8_ranges::{Utf8Range, Utf8Sequence, Utf8Sequences};

use crate::error::{Error, ErrorKind};
use crate::hir::{self, is_word_byte, Hir, HirKind, Look};
use crate::literal::LiteralSearcher;
use crate::prog::{
    Inst, InstBytes, InstEmptyLook, InstPtr, InstSave, InstSplit, Program,
};

type Result = result::Result<Patch, Error>;
type ResultOrEmpty = result::Result<Option<Patch>, Error>;

/// The most instructions a program may have, regardless of memory budget.
const MAX_INSTS: usize = 100_000;

#[derive(Debug)]
struct Patch {
    hole: Hole,
    entry: InstPtr,
}

/// A compiler translates a regular expression HIR to a sequence of
/// instructions. The sequence of instructions represents an NFA.
#[allow(missing_debug_implementations)]
pub struct Compiler {
    insts: Vec<MaybeInst>,
    compiled: Program,
    capture_name_idx: HashMap<String, usize>,
    budget: usize,
    max_insts: usize,
    suffix_cache: SuffixCache,
    utf8_seqs: Option<Utf8Sequences>,
    byte_classes: ByteClassSet,
    // Empty sub-expressions don't emit instructions, but a large repetition
    // of them can still burn a lot of CPU time. Count them as though they
    // did, so that the instruction limit eventually stops compilation.
    extra_insts: usize,
}

impl Compiler {
    /// Create a new regular expression compiler.
    ///
    /// Various options can be set before calling `compile` on an expression.
    pub fn new() -> Self {
        Compiler {
            insts: vec![],
            compiled: Program::new(),
            capture_name_idx: HashMap::new(),
            budget: 0,
            max_insts: MAX_INSTS,
            suffix_cache: SuffixCache::new(1000),
            utf8_seqs: Some(Utf8Sequences::new('\x00', '\x00')),
            byte_classes: ByteClassSet::new(),
            extra_insts: 0,
        }
    }

    /// The memory budget of the resulting program, in bytes.
    ///
    /// A quarter of the budget bounds the instructions. If the program would
    /// need more, then compilation stops with a `PatternTooLarge` error. What
    /// the instructions don't use is left to the lazy DFA's state cache.
    ///
    /// A budget of `0` means no budget: the instruction limit is fixed and
    /// the DFA gets a small default cache.
    pub fn size_limit(mut self, budget: usize) -> Self {
        self.budget = budget;
        self.max_insts = if budget == 0 {
            MAX_INSTS
        } else {
            std::cmp::min(MAX_INSTS, budget / 4 / size_of::<Inst>())
        };
        self
    }

    /// When set, the machine returned is suitable for matching text in
    /// reverse. In particular, all concatenations are flipped, every
    /// assertion is swapped for its mirror image and no capture slots are
    /// recorded.
    pub fn reverse(mut self, yes: bool) -> Self {
        self.compiled.is_reverse = yes;
        self
    }

    /// When set, every character is compiled to a single Latin-1 byte
    /// instead of its UTF-8 encoding.
    pub fn latin1(mut self, yes: bool) -> Self {
        self.compiled.latin1 = yes;
        self
    }

    /// Compile a regular expression given its HIR.
    ///
    /// The compiler is guaranteed to succeed unless the program exceeds the
    /// instruction limit derived from the memory budget.
    pub fn compile(mut self, expr: &Hir) -> result::Result<Program, Error> {
        let (anchored_start, anchored_end) = if self.compiled.is_reverse {
            (expr.is_end_anchored(), expr.is_start_anchored())
        } else {
            (expr.is_start_anchored(), expr.is_end_anchored())
        };
        self.compiled.is_anchored_start = anchored_start;
        self.compiled.is_anchored_end = anchored_end;
        self.compiled.captures = capture_names(expr);
        for (i, name) in self.compiled.captures.iter().enumerate() {
            if let Some(ref name) = *name {
                self.capture_name_idx.insert(name.clone(), i);
            }
        }

        let patch =
            self.c_capture(0, expr)?.unwrap_or_else(|| self.next_inst());
        self.compiled.start = patch.entry;
        self.fill_to_next(patch.hole);
        self.push_compiled(Inst::Match);

        // An unanchored search begins with a non-greedy loop over any byte.
        // Engines that find the leftmost match get it for free this way.
        if self.compiled.is_anchored_start {
            self.compiled.start_unanchored = self.compiled.start;
        } else {
            let split = self.insts.len();
            self.push_compiled(Inst::Split(InstSplit {
                goto1: self.compiled.start,
                goto2: split + 1,
            }));
            self.push_compiled(Inst::Bytes(InstBytes {
                goto: split,
                start: 0x00,
                end: 0xFF,
            }));
            self.compiled.start_unanchored = split;
        }
        self.check_size()?;
        if !self.compiled.is_reverse {
            self.compiled.prefixes =
                LiteralSearcher::prefixes(expr, self.compiled.latin1);
        }
        self.compile_finish()
    }

    fn compile_finish(mut self) -> result::Result<Program, Error> {
        self.compiled.insts =
            self.insts.into_iter().map(|inst| inst.unwrap()).collect();
        self.compiled.byte_classes = self.byte_classes.byte_classes();
        self.compiled.capture_name_idx = Arc::new(self.capture_name_idx);
        self.compiled.dfa_size_limit = if self.budget == 0 {
            1 << 20
        } else {
            self.budget.saturating_sub(self.compiled.approximate_size())
        };
        Ok(self.compiled)
    }

    /// Compile expr into self.insts, returning a patch on success,
    /// or an error if we run out of memory.
    ///
    /// All of the c_* methods of the compiler share the contract outlined
    /// here.
    ///
    /// The main thing that a c_* method does is mutate `self.insts`
    /// to add a list of mostly compiled instructions required to execute
    /// the given expression. `self.insts` contains MaybeInsts rather than
    /// Insts because there is some backpatching required.
    ///
    /// The `Patch` value returned by each c_* method provides metadata
    /// about the compiled instructions emitted to `self.insts`. The
    /// `entry` member of the patch refers to the first instruction
    /// (the entry point), while the `hole` member contains zero or
    /// more offsets to partial instructions that need to be backpatched.
    /// The c_* routine can't know where its list of instructions are going to
    /// jump to after execution, so it is up to the caller to patch
    /// these jumps to point to the right place.
    ///
    /// Ok(None) is returned when an expression is compiled to no
    /// instruction, and so no patch.entry value makes sense.
    fn c(&mut self, expr: &Hir) -> ResultOrEmpty {
        self.check_size()?;
        match *expr.kind() {
            HirKind::Empty => self.c_empty(),
            HirKind::Char(ch) => self.c_char(ch),
            HirKind::Class(ref cls) => self.c_class(cls),
            HirKind::AnyByte => self.c_byte_range(0x00, 0xFF),
            HirKind::Look(look) => self.c_empty_look(look),
            HirKind::Capture(hir::Capture { index, ref sub, .. }) => {
                self.c_capture(2 * index as usize, sub)
            }
            HirKind::Concat(ref es) => {
                if self.compiled.is_reverse {
                    self.c_concat(es.iter().rev())
                } else {
                    self.c_concat(es)
                }
            }
            HirKind::Alternation(ref es) => self.c_alternate(es),
            HirKind::Repetition(ref rep) => self.c_repeat(rep),
        }
    }

    fn c_empty(&mut self) -> ResultOrEmpty {
        self.extra_insts += 1;
        Ok(None)
    }

    fn c_capture(&mut self, first_slot: usize, expr: &Hir) -> ResultOrEmpty {
        if self.compiled.is_reverse {
            // Reverse programs only ever find the start of a match, so
            // they never record submatches.
            return self.c(expr);
        }
        let entry = self.insts.len();
        let hole = self.push_hole(InstHole::Save { slot: first_slot });
        let patch = self.c(expr)?.unwrap_or_else(|| self.next_inst());
        self.fill(hole, patch.entry);
        self.fill_to_next(patch.hole);
        let hole = self.push_hole(InstHole::Save { slot: first_slot + 1 });
        Ok(Some(Patch { hole, entry }))
    }

    fn c_char(&mut self, c: char) -> ResultOrEmpty {
        if self.compiled.latin1 {
            let b = c as u32 as u8;
            return self.c_byte_range(b, b);
        }
        let mut buf = [0; 4];
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        if self.compiled.is_reverse {
            self.c_bytes(bytes.iter().rev().copied())
        } else {
            self.c_bytes(bytes.iter().copied())
        }
    }

    /// Compiles a sequence of single bytes.
    fn c_bytes<I: Iterator<Item = u8>>(&mut self, bytes: I) -> ResultOrEmpty {
        let mut patch: Option<Patch> = None;
        for b in bytes {
            let next = self.c_byte_range(b, b)?;
            patch = match (patch, next) {
                (None, next) => next,
                (Some(p), Some(n)) => {
                    self.fill(p.hole, n.entry);
                    Some(Patch { hole: n.hole, entry: p.entry })
                }
                (Some(p), None) => Some(p),
            };
        }
        Ok(patch)
    }

    fn c_byte_range(&mut self, start: u8, end: u8) -> ResultOrEmpty {
        self.byte_classes.set_range(start, end);
        let hole = self.push_hole(InstHole::Bytes { start, end });
        Ok(Some(Patch { hole, entry: self.insts.len() - 1 }))
    }

    fn c_class(&mut self, cls: &hir::Class) -> ResultOrEmpty {
        if cls.is_empty() {
            // A class that matches nothing still needs an entry point, so
            // it compiles to an instruction that kills its thread.
            let entry = self.insts.len();
            self.push_compiled(Inst::Fail);
            return Ok(Some(Patch { hole: Hole::None, entry }));
        }
        if self.compiled.latin1 {
            let ranges: Vec<(u8, u8)> = cls
                .ranges
                .iter()
                .map(|r| (r.start as u32 as u8, r.end as u32 as u8))
                .collect();
            return self.c_class_bytes(&ranges);
        }
        Ok(Some(CompileClass { c: self, ranges: &cls.ranges }.compile()?))
    }

    fn c_class_bytes(&mut self, ranges: &[(u8, u8)]) -> ResultOrEmpty {
        debug_assert!(!ranges.is_empty());

        let first_split_entry = self.insts.len();
        let mut holes = vec![];
        let mut prev_hole = Hole::None;
        for &(start, end) in &ranges[0..ranges.len() - 1] {
            self.fill_to_next(prev_hole);
            let split = self.push_split_hole();
            let next = self.insts.len();
            self.byte_classes.set_range(start, end);
            holes.push(self.push_hole(InstHole::Bytes { start, end }));
            prev_hole = self.fill_split(split, Some(next), None);
        }
        let next = self.insts.len();
        let (start, end) = ranges[ranges.len() - 1];
        self.byte_classes.set_range(start, end);
        holes.push(self.push_hole(InstHole::Bytes { start, end }));
        self.fill(prev_hole, next);
        Ok(Some(Patch { hole: Hole::Many(holes), entry: first_split_entry }))
    }

    fn c_empty_look(&mut self, look: Look) -> ResultOrEmpty {
        let look =
            if self.compiled.is_reverse { look.reversed() } else { look };
        match look {
            Look::StartLine | Look::EndLine => {
                self.byte_classes.set_range(b'\n', b'\n');
            }
            Look::WordBoundary | Look::NotWordBoundary => {
                self.compiled.has_word_boundary = true;
                self.byte_classes.set_word_boundary();
            }
            Look::StartText | Look::EndText => {}
        }
        let hole = self.push_hole(InstHole::EmptyLook { look });
        Ok(Some(Patch { hole, entry: self.insts.len() - 1 }))
    }

    fn c_concat<'a, I>(&mut self, exprs: I) -> ResultOrEmpty
    where
        I: IntoIterator<Item = &'a Hir>,
    {
        let mut exprs = exprs.into_iter();
        let Patch { mut hole, entry } = loop {
            match exprs.next() {
                None => return self.c_empty(),
                Some(e) => {
                    if let Some(p) = self.c(e)? {
                        break p;
                    }
                }
            }
        };
        for e in exprs {
            if let Some(p) = self.c(e)? {
                self.fill(hole, p.entry);
                hole = p.hole;
            }
        }
        Ok(Some(Patch { hole, entry }))
    }

    fn c_alternate(&mut self, exprs: &[Hir]) -> ResultOrEmpty {
        debug_assert!(
            exprs.len() >= 2,
            "alternates must have at least 2 exprs"
        );

        // Initial entry point is always the first split.
        let first_split_entry = self.insts.len();

        // Save up all of the holes from each alternate. They will all get
        // patched to point to the same location.
        let mut holes = vec![];

        // true indicates that the hole is a split where we want to fill
        // the second branch.
        let mut prev_hole = (Hole::None, false);
        for e in &exprs[0..exprs.len() - 1] {
            if prev_hole.1 {
                let next = self.insts.len();
                self.fill_split(prev_hole.0, None, Some(next));
            } else {
                self.fill_to_next(prev_hole.0);
            }
            let split = self.push_split_hole();
            if let Some(Patch { hole, entry }) = self.c(e)? {
                holes.push(hole);
                prev_hole = (self.fill_split(split, Some(entry), None), false);
            } else {
                let (split1, split2) = split.dup_one();
                holes.push(split1);
                prev_hole = (split2, true);
            }
        }
        if let Some(Patch { hole, entry }) = self.c(&exprs[exprs.len() - 1])? {
            holes.push(hole);
            if prev_hole.1 {
                self.fill_split(prev_hole.0, None, Some(entry));
            } else {
                self.fill(prev_hole.0, entry);
            }
        } else {
            // We ignore prev_hole.1. When it's true, it means we have two
            // empty branches both pushing prev_hole.0 into holes, so both
            // branches will go to the same place anyway.
            holes.push(prev_hole.0);
        }
        Ok(Some(Patch { hole: Hole::Many(holes), entry: first_split_entry }))
    }

    fn c_repeat(&mut self, rep: &hir::Repetition) -> ResultOrEmpty {
        match (rep.min, rep.max) {
            (0, Some(1)) => self.c_repeat_zero_or_one(&rep.sub, rep.greedy),
            (0, None) => self.c_repeat_zero_or_more(&rep.sub, rep.greedy),
            (1, None) => self.c_repeat_one_or_more(&rep.sub, rep.greedy),
            (min, None) => {
                self.c_repeat_range_min_or_more(&rep.sub, rep.greedy, min)
            }
            (min, Some(max)) => {
                self.c_repeat_range(&rep.sub, rep.greedy, min, max)
            }
        }
    }

    fn c_repeat_zero_or_one(
        &mut self,
        expr: &Hir,
        greedy: bool,
    ) -> ResultOrEmpty {
        let split_entry = self.insts.len();
        let split = self.push_split_hole();
        let Patch { hole: hole_rep, entry: entry_rep } = match self.c(expr)? {
            Some(p) => p,
            None => return self.pop_split_hole(),
        };
        let split_hole = if greedy {
            self.fill_split(split, Some(entry_rep), None)
        } else {
            self.fill_split(split, None, Some(entry_rep))
        };
        let holes = vec![hole_rep, split_hole];
        Ok(Some(Patch { hole: Hole::Many(holes), entry: split_entry }))
    }

    fn c_repeat_zero_or_more(
        &mut self,
        expr: &Hir,
        greedy: bool,
    ) -> ResultOrEmpty {
        let split_entry = self.insts.len();
        let split = self.push_split_hole();
        let Patch { hole: hole_rep, entry: entry_rep } = match self.c(expr)? {
            Some(p) => p,
            None => return self.pop_split_hole(),
        };

        self.fill(hole_rep, split_entry);
        let split_hole = if greedy {
            self.fill_split(split, Some(entry_rep), None)
        } else {
            self.fill_split(split, None, Some(entry_rep))
        };
        Ok(Some(Patch { hole: split_hole, entry: split_entry }))
    }

    fn c_repeat_one_or_more(
        &mut self,
        expr: &Hir,
        greedy: bool,
    ) -> ResultOrEmpty {
        let Patch { hole: hole_rep, entry: entry_rep } = match self.c(expr)? {
            Some(p) => p,
            None => return Ok(None),
        };
        self.fill_to_next(hole_rep);
        let split = self.push_split_hole();

        let split_hole = if greedy {
            self.fill_split(split, Some(entry_rep), None)
        } else {
            self.fill_split(split, None, Some(entry_rep))
        };
        Ok(Some(Patch { hole: split_hole, entry: entry_rep }))
    }

    fn c_repeat_range_min_or_more(
        &mut self,
        expr: &Hir,
        greedy: bool,
        min: u32,
    ) -> ResultOrEmpty {
        let min = min as usize;
        // Using next_inst() is ok, because we can't return it (concat would
        // have to return Some(_) while c_repeat_range_min_or_more returns
        // None).
        let patch_concat = self
            .c_concat(iter::repeat(expr).take(min))?
            .unwrap_or_else(|| self.next_inst());
        if let Some(patch_rep) = self.c_repeat_zero_or_more(expr, greedy)? {
            self.fill(patch_concat.hole, patch_rep.entry);
            Ok(Some(Patch { hole: patch_rep.hole, entry: patch_concat.entry }))
        } else {
            Ok(None)
        }
    }

    fn c_repeat_range(
        &mut self,
        expr: &Hir,
        greedy: bool,
        min: u32,
        max: u32,
    ) -> ResultOrEmpty {
        let (min, max) = (min as usize, max as usize);
        debug_assert!(min <= max);
        let patch_concat = self.c_concat(iter::repeat(expr).take(min))?;
        if min == max {
            return Ok(patch_concat);
        }
        // Same reasoning as in c_repeat_range_min_or_more (we know that min <
        // max at this point).
        let patch_concat = patch_concat.unwrap_or_else(|| self.next_inst());
        let initial_entry = patch_concat.entry;
        // It is much simpler to compile, e.g., `a{2,5}` as:
        //
        //     aaa?a?a?
        //
        // But you end up with a sequence of instructions where the splits
        // form a chain, which has to be resolved every time a transition is
        // followed. Instead, every optional copy jumps straight out.
        let mut holes = vec![];
        let mut prev_hole = patch_concat.hole;
        for _ in min..max {
            self.fill_to_next(prev_hole);
            let split = self.push_split_hole();
            let Patch { hole, entry } = match self.c(expr)? {
                Some(p) => p,
                None => return self.pop_split_hole(),
            };
            prev_hole = hole;
            if greedy {
                holes.push(self.fill_split(split, Some(entry), None));
            } else {
                holes.push(self.fill_split(split, None, Some(entry)));
            }
        }
        holes.push(prev_hole);
        Ok(Some(Patch { hole: Hole::Many(holes), entry: initial_entry }))
    }

    /// Can be used as a default value for the c_* functions when the call to
    /// c_function is followed by inserting at least one instruction that is
    /// always executed after the ones written by the c* function.
    fn next_inst(&self) -> Patch {
        Patch { hole: Hole::None, entry: self.insts.len() }
    }

    fn fill(&mut self, hole: Hole, goto: InstPtr) {
        match hole {
            Hole::None => {}
            Hole::One(pc) => {
                self.insts[pc].fill(goto);
            }
            Hole::Many(holes) => {
                for hole in holes {
                    self.fill(hole, goto);
                }
            }
        }
    }

    fn fill_to_next(&mut self, hole: Hole) {
        let next = self.insts.len();
        self.fill(hole, next);
    }

    fn fill_split(
        &mut self,
        hole: Hole,
        goto1: Option<InstPtr>,
        goto2: Option<InstPtr>,
    ) -> Hole {
        match hole {
            Hole::None => Hole::None,
            Hole::One(pc) => match (goto1, goto2) {
                (Some(goto1), Some(goto2)) => {
                    self.insts[pc].fill_split(goto1, goto2);
                    Hole::None
                }
                (Some(goto1), None) => {
                    self.insts[pc].half_fill_split_goto1(goto1);
                    Hole::One(pc)
                }
                (None, Some(goto2)) => {
                    self.insts[pc].half_fill_split_goto2(goto2);
                    Hole::One(pc)
                }
                (None, None) => unreachable!(
                    "at least one of the split \
                     holes must be filled"
                ),
            },
            Hole::Many(holes) => {
                let mut new_holes = vec![];
                for hole in holes {
                    new_holes.push(self.fill_split(hole, goto1, goto2));
                }
                match new_holes.len() {
                    0 => Hole::None,
                    1 => new_holes.pop().unwrap_or(Hole::None),
                    _ => Hole::Many(new_holes),
                }
            }
        }
    }

    fn push_compiled(&mut self, inst: Inst) {
        self.insts.push(MaybeInst::Compiled(inst));
    }

    fn push_hole(&mut self, inst: InstHole) -> Hole {
        let hole = self.insts.len();
        self.insts.push(MaybeInst::Uncompiled(inst));
        Hole::One(hole)
    }

    fn push_split_hole(&mut self) -> Hole {
        let hole = self.insts.len();
        self.insts.push(MaybeInst::Split);
        Hole::One(hole)
    }

    fn pop_split_hole(&mut self) -> ResultOrEmpty {
        self.insts.pop();
        Ok(None)
    }

    fn check_size(&self) -> result::Result<(), Error> {
        if self.insts.len() + self.extra_insts > self.max_insts {
            log::debug!(
                "program exceeds {} instructions, giving up",
                self.max_insts
            );
            Err(Error::new(ErrorKind::PatternTooLarge, ""))
        } else {
            Ok(())
        }
    }
}

/// Returns the name of every capture group, indexed by group number. Group
/// `0`, the whole match, has no name.
fn capture_names(expr: &Hir) -> Vec<Option<String>> {
    let mut names = vec![None];
    let mut stack = vec![expr];
    while let Some(hir) = stack.pop() {
        if let HirKind::Capture(ref cap) = *hir.kind() {
            let index = cap.index as usize;
            if names.len() <= index {
                names.resize(index + 1, None);
            }
            names[index] = cap.name.as_deref().map(String::from);
        }
        stack.extend(hir.kind().subs());
    }
    names
}

#[derive(Debug)]
enum Hole {
    None,
    One(InstPtr),
    Many(Vec<Hole>),
}

impl Hole {
    fn dup_one(self) -> (Self, Self) {
        match self {
            Hole::One(pc) => (Hole::One(pc), Hole::One(pc)),
            Hole::None | Hole::Many(_) => {
                unreachable!("must be called on single hole")
            }
        }
    }
}

#[derive(Clone, Debug)]
enum MaybeInst {
    Compiled(Inst),
    Uncompiled(InstHole),
    Split,
    Split1(InstPtr),
    Split2(InstPtr),
}

impl MaybeInst {
    fn fill(&mut self, goto: InstPtr) {
        let maybeinst = match *self {
            MaybeInst::Split => MaybeInst::Split1(goto),
            MaybeInst::Uncompiled(ref inst) => {
                MaybeInst::Compiled(inst.fill(goto))
            }
            MaybeInst::Split1(goto1) => {
                MaybeInst::Compiled(Inst::Split(InstSplit {
                    goto1,
                    goto2: goto,
                }))
            }
            MaybeInst::Split2(goto2) => {
                MaybeInst::Compiled(Inst::Split(InstSplit {
                    goto1: goto,
                    goto2,
                }))
            }
            _ => unreachable!(
                "not all instructions were compiled! \
                 found uncompiled instruction: {:?}",
                self
            ),
        };
        *self = maybeinst;
    }

    fn fill_split(&mut self, goto1: InstPtr, goto2: InstPtr) {
        let filled = match *self {
            MaybeInst::Split => Inst::Split(InstSplit { goto1, goto2 }),
            _ => unreachable!(
                "must be called on Split instruction, \
                 instead it was called on: {:?}",
                self
            ),
        };
        *self = MaybeInst::Compiled(filled);
    }

    fn half_fill_split_goto1(&mut self, goto1: InstPtr) {
        let half_filled = match *self {
            MaybeInst::Split => goto1,
            _ => unreachable!(
                "must be called on Split instruction, \
                 instead it was called on: {:?}",
                self
            ),
        };
        *self = MaybeInst::Split1(half_filled);
    }

    fn half_fill_split_goto2(&mut self, goto2: InstPtr) {
        let half_filled = match *self {
            MaybeInst::Split => goto2,
            _ => unreachable!(
                "must be called on Split instruction, \
                 instead it was called on: {:?}",
                self
            ),
        };
        *self = MaybeInst::Split2(half_filled);
    }

    fn unwrap(self) -> Inst {
        match self {
            MaybeInst::Compiled(inst) => inst,
            _ => unreachable!(
                "must be called on a compiled instruction, \
                 instead it was called on: {:?}",
                self
            ),
        }
    }
}

#[derive(Clone, Debug)]
enum InstHole {
    Save { slot: usize },
    EmptyLook { look: Look },
    Bytes { start: u8, end: u8 },
}

impl InstHole {
    fn fill(&self, goto: InstPtr) -> Inst {
        match *self {
            InstHole::Save { slot } => Inst::Save(InstSave { goto, slot }),
            InstHole::EmptyLook { look } => {
                Inst::EmptyLook(InstEmptyLook { goto, look })
            }
            InstHole::Bytes { start, end } => {
                Inst::Bytes(InstBytes { goto, start, end })
            }
        }
    }
}

struct CompileClass<'a, 'b> {
    c: &'a mut Compiler,
    ranges: &'b [hir::ClassRange],
}

impl<'a, 'b> CompileClass<'a, 'b> {
    fn compile(mut self) -> Result {
        let mut holes = vec![];
        let mut initial_entry = None;
        let mut last_split = Hole::None;
        let mut utf8_seqs = match self.c.utf8_seqs.take() {
            Some(seqs) => seqs,
            None => Utf8Sequences::new('\x00', '\x00'),
        };
        self.c.suffix_cache.clear();

        for (i, range) in self.ranges.iter().enumerate() {
            let is_last_range = i + 1 == self.ranges.len();
            utf8_seqs.reset(range.start, range.end);
            let mut it = (&mut utf8_seqs).peekable();
            loop {
                let utf8_seq = match it.next() {
                    None => break,
                    Some(utf8_seq) => utf8_seq,
                };
                if is_last_range && it.peek().is_none() {
                    let Patch { hole, entry } = self.c_utf8_seq(&utf8_seq)?;
                    holes.push(hole);
                    self.c.fill(last_split, entry);
                    last_split = Hole::None;
                    if initial_entry.is_none() {
                        initial_entry = Some(entry);
                    }
                } else {
                    if initial_entry.is_none() {
                        initial_entry = Some(self.c.insts.len());
                    }
                    self.c.fill_to_next(last_split);
                    last_split = self.c.push_split_hole();
                    let Patch { hole, entry } = self.c_utf8_seq(&utf8_seq)?;
                    holes.push(hole);
                    last_split =
                        self.c.fill_split(last_split, Some(entry), None);
                }
            }
        }
        self.c.utf8_seqs = Some(utf8_seqs);
        let entry = initial_entry.unwrap_or_else(|| self.c.insts.len());
        Ok(Patch { hole: Hole::Many(holes), entry })
    }

    fn c_utf8_seq(&mut self, seq: &Utf8Sequence) -> Result {
        self.c.check_size()?;
        if self.c.compiled.is_reverse {
            self.c_utf8_seq_(seq.as_slice())
        } else {
            self.c_utf8_seq_(seq.as_slice().iter().rev())
        }
    }

    fn c_utf8_seq_<'r, I>(&mut self, seq: I) -> Result
    where
        I: IntoIterator<Item = &'r Utf8Range>,
    {
        // The initial instruction for each UTF-8 sequence should be the same.
        let mut from_inst = ::std::usize::MAX;
        let mut last_hole = Hole::None;
        for byte_range in seq {
            let key = SuffixCacheKey {
                from_inst,
                start: byte_range.start,
                end: byte_range.end,
            };
            {
                let pc = self.c.insts.len();
                if let Some(cached_pc) = self.c.suffix_cache.get(key, pc) {
                    from_inst = cached_pc;
                    continue;
                }
            }
            self.c.byte_classes.set_range(byte_range.start, byte_range.end);
            if from_inst == ::std::usize::MAX {
                last_hole = self.c.push_hole(InstHole::Bytes {
                    start: byte_range.start,
                    end: byte_range.end,
                });
            } else {
                self.c.push_compiled(Inst::Bytes(InstBytes {
                    goto: from_inst,
                    start: byte_range.start,
                    end: byte_range.end,
                }));
            }
            from_inst = self.c.insts.len() - 1;
        }
        debug_assert!(from_inst < ::std::usize::MAX);
        Ok(Patch { hole: last_hole, entry: from_inst })
    }
}

/// `SuffixCache` is a simple bounded hash map for caching suffix entries in
/// UTF-8 automata. For example, consider the Unicode range \u{0}-\u{FFFF}.
/// The set of byte ranges looks like this:
///
/// [0-7F]
/// [C2-DF][80-BF]
/// [E0][A0-BF][80-BF]
/// [E1-EC][80-BF][80-BF]
/// [ED][80-9F][80-BF]
/// [EE-EF][80-BF][80-BF]
///
/// Each line above translates to one alternate in the compiled regex program.
/// However, all but one of the alternates end in the same suffix, which is
/// a waste of an instruction. The suffix cache facilitates reusing them across
/// alternates.
///
/// Note that a HashMap could be trivially used for this, but we don't need its
/// overhead. Some small bounded space (LRU style) is more than enough.
#[derive(Debug)]
struct SuffixCache {
    sparse: Box<[usize]>,
    dense: Vec<SuffixCacheEntry>,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
struct SuffixCacheEntry {
    key: SuffixCacheKey,
    pc: InstPtr,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
struct SuffixCacheKey {
    from_inst: InstPtr,
    start: u8,
    end: u8,
}

impl SuffixCache {
    fn new(size: usize) -> Self {
        SuffixCache {
            sparse: vec![0usize; size].into(),
            dense: Vec::with_capacity(size),
        }
    }

    fn get(&mut self, key: SuffixCacheKey, pc: InstPtr) -> Option<InstPtr> {
        let hash = self.hash(&key);
        let pos = &mut self.sparse[hash];
        if let Some(entry) = self.dense.get(*pos) {
            if entry.key == key {
                return Some(entry.pc);
            }
        }
        *pos = self.dense.len();
        self.dense.push(SuffixCacheEntry { key, pc });
        None
    }

    fn clear(&mut self) {
        self.dense.clear();
    }

    fn hash(&self, suffix: &SuffixCacheKey) -> usize {
        // Basic FNV-1a hash as described:
        // https://en.wikipedia.org/wiki/Fowler%E2%80%93Noll%E2%80%93Vo_hash_function
        const FNV_PRIME: u64 = 1_099_511_628_211;
        let mut h = 14_695_981_039_346_656_037;
        h = (h ^ (suffix.from_inst as u64)).wrapping_mul(FNV_PRIME);
        h = (h ^ (suffix.start as u64)).wrapping_mul(FNV_PRIME);
        h = (h ^ (suffix.end as u64)).wrapping_mul(FNV_PRIME);
        (h as usize) % self.sparse.len()
    }
}

struct ByteClassSet([bool; 256]);

impl ByteClassSet {
    fn new() -> Self {
        ByteClassSet([false; 256])
    }

    fn set_range(&mut self, start: u8, end: u8) {
        debug_assert!(start <= end);
        if start > 0 {
            self.0[start as usize - 1] = true;
        }
        self.0[end as usize] = true;
    }

    fn set_word_boundary(&mut self) {
        // We need to mark all ranges of bytes whose pairs result in
        // evaluating \b differently.
        let iswb = is_word_byte;
        let mut b1: u16 = 0;
        let mut b2: u16;
        while b1 <= 255 {
            b2 = b1 + 1;
            while b2 <= 255 && iswb(b1 as u8) == iswb(b2 as u8) {
                b2 += 1;
            }
            self.set_range(b1 as u8, (b2 - 1) as u8);
            b1 = b2;
        }
    }

    fn byte_classes(&self) -> Vec<u8> {
        // N.B. If you're debugging the DFA, it's useful to simply return
        // `(0..256).collect()`, which effectively removes the byte classes
        // and makes the transitions easier to read.
        let mut byte_classes = vec![0; 256];
        let mut class = 0u8;
        let mut i = 0;
        loop {
            byte_classes[i] = class;
            if i >= 255 {
                break;
            }
            if self.0[i] {
                class = class.saturating_add(1);
            }
            i += 1;
        }
        byte_classes
    }
}

impl fmt::Debug for ByteClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteClassSet").field(&&self.0[..]).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteClassSet, Compiler};
    use crate::error::ErrorKind;
    use crate::hir::{Config, Hir};
    use crate::prog::{Inst, Program};

    fn compile_with(pattern: &str, config: Config, reverse: bool) -> Program {
        let chars: Vec<char> = pattern.chars().collect();
        let hir = Hir::parse(config, &chars).unwrap();
        Compiler::new()
            .size_limit(8 << 20)
            .latin1(config.latin1)
            .reverse(reverse)
            .compile(&hir)
            .unwrap()
    }

    fn compile(pattern: &str) -> Program {
        compile_with(pattern, Config::default(), false)
    }

    #[test]
    fn byte_classes() {
        let mut set = ByteClassSet::new();
        set.set_range(b'a', b'z');
        let classes = set.byte_classes();
        assert_eq!(classes[0], 0);
        assert_eq!(classes[1], 0);
        assert_eq!(classes[2], 0);
        assert_eq!(classes[b'a' as usize - 1], 0);
        assert_eq!(classes[b'a' as usize], 1);
        assert_eq!(classes[b'm' as usize], 1);
        assert_eq!(classes[b'z' as usize], 1);
        assert_eq!(classes[b'z' as usize + 1], 2);
        assert_eq!(classes[254], 2);
        assert_eq!(classes[255], 2);

        let mut set = ByteClassSet::new();
        set.set_range(0, 2);
        set.set_range(4, 6);
        let classes = set.byte_classes();
        assert_eq!(classes[0], 0);
        assert_eq!(classes[1], 0);
        assert_eq!(classes[2], 0);
        assert_eq!(classes[3], 1);
        assert_eq!(classes[4], 2);
        assert_eq!(classes[5], 2);
        assert_eq!(classes[6], 2);
        assert_eq!(classes[7], 3);
        assert_eq!(classes[255], 3);
    }

    #[test]
    fn full_byte_classes() {
        let mut set = ByteClassSet::new();
        for i in 0..256u16 {
            set.set_range(i as u8, i as u8);
        }
        assert_eq!(set.byte_classes().len(), 256);
    }

    #[test]
    fn captures_and_names() {
        let prog = compile(r"(?P<first>a)(b)(?P<last>c)");
        assert_eq!(
            prog.captures,
            vec![None, Some("first".to_string()), None, Some("last".into())]
        );
        assert_eq!(prog.capture_name_idx.get("last"), Some(&3));
        assert_eq!(prog.slot_count(), 8);
    }

    #[test]
    fn anchored_programs_have_no_unanchored_loop() {
        let prog = compile(r"^abc");
        assert!(prog.is_anchored_start);
        assert_eq!(prog.start, prog.start_unanchored);
        let prog = compile(r"abc");
        assert_ne!(prog.start, prog.start_unanchored);
    }

    #[test]
    fn reverse_program_has_no_saves() {
        let prog = compile_with(r"(a)(b)$", Config::default(), true);
        assert!(prog.is_reverse);
        assert!(prog.is_anchored_start);
        assert!(!prog.iter().any(|inst| match *inst {
            Inst::Save(_) => true,
            _ => false,
        }));
    }

    #[test]
    fn latin1_chars_are_single_bytes() {
        let config = Config { latin1: true, ..Config::default() };
        let prog = compile_with("\u{E9}", config, false);
        assert!(prog.iter().any(|inst| match *inst {
            Inst::Bytes(ref b) => b.start == 0xE9 && b.end == 0xE9,
            _ => false,
        }));
    }

    #[test]
    fn empty_class_is_fail() {
        let prog = compile(r"a\P{Any}");
        assert!(prog.iter().any(|inst| match *inst {
            Inst::Fail => true,
            _ => false,
        }));
    }

    #[test]
    fn too_big() {
        let chars: Vec<char> = ".{512}x".chars().collect();
        let hir = Hir::parse(Config::default(), &chars).unwrap();
        let err = Compiler::new().size_limit(100).compile(&hir).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PatternTooLarge);
    }
}
