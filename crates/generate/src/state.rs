//! Dependency and structure tracking over an instruction stream as it's generated.

use std::collections::BTreeMap;

use rtg_core::{Class, EncodedInstruction, Register, RegisterSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardKind {
    Raw,
    War,
    Waw,
}

/// A half open range of byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: i32,
    pub end: i32,
}

impl Interval {
    #[must_use]
    pub const fn new(offset: i32, width: u8) -> Self {
        Self { start: offset, end: offset + width as i32 }
    }

    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A forward control transfer whose target hasn't been emitted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchTarget {
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub stack_size: u32,
    pub saved: Vec<Register>,
    pub arguments: Vec<Register>,
}

/// Everything the pattern generator needs to know about the instructions committed so far.
///
/// Each register has at most one last writer; its reader list only holds reads since that
/// write, and is cleared by the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticState {
    window: usize,
    next: usize,
    writers: [Option<usize>; Register::COUNT as usize],
    readers: [Vec<usize>; Register::COUNT as usize],
    footprints: BTreeMap<Register, Vec<Interval>>,
    branch_targets: Vec<BranchTarget>,
    loops: Vec<Register>,
    frame: Option<Frame>,
}

fn forward_target(source: usize, offset: i32) -> Option<usize> {
    match offset > 0 && offset % 4 == 0 {
        true => Some(source + (offset / 4) as usize),
        false => None,
    }
}

impl SemanticState {
    /// `window` bounds how far back [`Self::candidate_registers_for_hazard`] looks.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            next: 0,
            writers: [None; Register::COUNT as usize],
            readers: Default::default(),
            footprints: BTreeMap::new(),
            branch_targets: Vec::new(),
            loops: Vec::new(),
            frame: None,
        }
    }

    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Index the next recorded instruction will get.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.next
    }

    pub fn record(&mut self, instruction: &EncodedInstruction<'_>) {
        let index = self.next;
        self.next += 1;

        self.branch_targets.retain(|it| it.target > index);

        for register in instruction.sources().filter(|it| !it.is_zero()) {
            let readers = &mut self.readers[register.index()];
            if readers.last() != Some(&index) {
                readers.push(index);
            }
        }

        let spec = instruction.spec();
        let operands = instruction.operands();

        if let (Some(width), Some(base), Some(offset)) =
            (spec.access_width(), operands.rs1, operands.imm)
        {
            let interval = Interval::new(offset, width);
            let footprint = self.footprints.entry(base).or_default();
            if !footprint.contains(&interval) {
                footprint.push(interval);
            }
        }

        if matches!(spec.class(), Class::Branch | Class::Jal) {
            if let Some(target) = operands.imm.and_then(|offset| forward_target(index, offset)) {
                self.branch_targets.push(BranchTarget { source: index, target });
            }
        }

        // writes land after the reads of the same instruction.
        if let Some(rd) = instruction.destination() {
            self.writers[rd.index()] = Some(index);
            self.readers[rd.index()].clear();
            self.footprints.remove(&rd);
        }
    }

    #[must_use]
    pub fn last_writer_of(&self, register: Register) -> Option<usize> {
        self.writers[register.index()]
    }

    #[must_use]
    pub fn readers_of(&self, register: Register) -> &[usize] {
        &self.readers[register.index()]
    }

    /// Registers that the next instruction could form a `kind` hazard with, without any
    /// further setup. `x0` never qualifies.
    #[must_use]
    pub fn candidate_registers_for_hazard(&self, kind: HazardKind) -> Vec<Register> {
        let recent = |index: usize| self.next - index <= self.window;

        Register::all()
            .filter(|it| !it.is_zero())
            .filter(|it| match kind {
                HazardKind::Raw | HazardKind::Waw => self.writers[it.index()].is_some_and(recent),
                HazardKind::War => self.readers[it.index()].last().is_some_and(|&it| recent(it)),
            })
            .collect()
    }

    #[must_use]
    pub fn open_branch_targets(&self) -> &[BranchTarget] {
        &self.branch_targets
    }

    /// Offsets accessed through `base` since it was last written.
    #[must_use]
    pub fn footprint(&self, base: Register) -> &[Interval] {
        self.footprints.get(&base).map_or(&[], Vec::as_slice)
    }

    /// Registers that code inside the open loops and function must leave unwritten: every
    /// loop counter, and in a function `sp`, `ra`, the saved and the argument registers.
    #[must_use]
    pub fn reserved(&self) -> RegisterSet {
        let mut reserved: RegisterSet = self.loops.iter().copied().collect();

        if let Some(frame) = &self.frame {
            let frame_registers = [Register::SP, Register::RA]
                .into_iter()
                .chain(frame.saved.iter().copied())
                .chain(Register::ARGUMENTS);

            for register in frame_registers {
                reserved.insert(register);
            }
        }

        reserved
    }

    #[must_use]
    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    #[must_use]
    pub fn current_loop_counter(&self) -> Option<Register> {
        self.loops.last().copied()
    }

    pub fn enter_loop(&mut self, counter: Register) {
        self.loops.push(counter);
    }

    pub fn exit_loop(&mut self) -> Option<Register> {
        self.loops.pop()
    }

    #[must_use]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn enter_function(&mut self) {
        self.frame = Some(Frame::default());
    }

    pub fn allocate_stack(&mut self, bytes: u32) {
        self.frame.get_or_insert_with(Frame::default).stack_size += bytes;
    }

    pub fn save_register(&mut self, register: Register) {
        let frame = self.frame.get_or_insert_with(Frame::default);
        if !frame.saved.contains(&register) {
            frame.saved.push(register);
        }
    }

    pub fn use_argument(&mut self, register: Register) {
        let frame = self.frame.get_or_insert_with(Frame::default);
        if !frame.arguments.contains(&register) {
            frame.arguments.push(register);
        }
    }

    pub fn exit_function(&mut self) -> Option<Frame> {
        self.frame.take()
    }
}
