//! Basic blocks, counted loops, if/else diamonds and leaf functions.

use rand::Rng;
use rand::seq::IndexedRandom;
use rtg_core::{Class, EncodedInstruction, InstructionSpec, Operands, Register, RegisterSet, Role};

use crate::generator::{Generation, Generator};
use crate::sample::{self, ImmPick, Pick, Request};

/// Stack bytes reserved by a generated function: `ra` plus up to two saved registers.
const FRAME: u32 = 16;

/// Furthest a forward basic block terminator may jump, in instructions.
const MAX_REACH: usize = 1024;

fn emit(spec: &InstructionSpec, operands: Operands) -> EncodedInstruction<'_> {
    rtg_encode::encoded(spec, &operands)
}

const fn offset(instructions: usize) -> i32 {
    4 * instructions as i32
}

impl<'c> Generator<'c> {
    /// A control transfer `offset` bytes away through an entry accepted by `filter` that can
    /// encode it.
    fn transfer<R: Rng>(
        &self,
        rng: &mut R,
        filter: impl Fn(&InstructionSpec) -> bool,
        offset: i32,
        request: Request,
    ) -> Option<EncodedInstruction<'c>> {
        let spec = self.pick(rng, |spec| {
            filter(spec) && spec.imm().is_some_and(|shape| shape.contains(offset))
        })?;

        self.sample(rng, spec, &request.with_imm(ImmPick::Fixed(offset)))
    }

    /// `count` straight line instructions that leave the tracker's reserved registers alone.
    fn nested_fillers<R: Rng>(
        &self,
        rng: &mut R,
        generation: &Generation<'c>,
        count: usize,
    ) -> Option<Vec<EncodedInstruction<'c>>> {
        let reserved = generation.state.reserved();
        self.fillers(rng, count, &Request::ANY.with(Role::Rd, Pick::Avoid(reserved)))
    }

    /// Straight line instructions ending in a branch or `jal` that either jumps back into the
    /// block or forward by at most the look-ahead window.
    pub(crate) fn basic_block<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        let body = budget.min(self.config.block_size) - 1;

        let target = match body > 0 && rng.random_bool(0.5) {
            true => -offset(rng.random_range(1..=body)),
            false => offset(rng.random_range(1..=self.config.lookahead.min(MAX_REACH))),
        };

        let body = self.fillers(rng, body, &Request::ANY)?;
        let terminator = self.transfer(
            rng,
            |spec| matches!(spec.class(), Class::Branch | Class::Jal),
            target,
            Request::ANY,
        )?;

        generation.commit_all(body);
        generation.commit(terminator);
        Some(())
    }

    /// `addi c, x0, n`, a body that leaves `c` alone, `addi c, c, -1`, `bne c, x0, body`.
    pub(crate) fn counted_loop<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        if budget < 4 {
            return None;
        }

        let addi = self.mnemonic("addi")?;
        let bne = self.mnemonic("bne")?;

        let counter = sample::register(
            rng,
            &self.constraints_for(addi).rd,
            Pick::Avoid(RegisterSet::of(Register::ZERO)),
        )?;

        let len = rng.random_range(1..=self.config.block_size.min(budget - 3));
        let back = -offset(len + 1);
        if !bne.imm()?.contains(back) {
            return None;
        }

        generation.state.enter_loop(counter);
        let Some(body) = self.nested_fillers(rng, generation, len) else {
            generation.state.exit_loop();
            return None;
        };

        let iterations = i32::from(self.config.loop_iterations).clamp(1, 2047);
        let init = emit(
            addi,
            Operands { rd: Some(counter), rs1: Some(Register::ZERO), rs2: None, imm: Some(iterations) },
        );
        let decrement = emit(
            addi,
            Operands { rd: Some(counter), rs1: Some(counter), rs2: None, imm: Some(-1) },
        );
        let branch = emit(
            bne,
            Operands { rd: None, rs1: Some(counter), rs2: Some(Register::ZERO), imm: Some(back) },
        );

        generation.commit(init);
        generation.commit_all(body);
        generation.commit_all([decrement, branch]);
        generation.state.exit_loop();
        Some(())
    }

    /// A branch over a then-block that ends in `jal x0` over an else-block.
    pub(crate) fn conditional<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        if budget < 4 {
            return None;
        }

        let then_len = rng.random_range(1..=self.config.block_size.min(budget - 3));
        let else_len = rng.random_range(1..=self.config.block_size.min(budget - 2 - then_len));

        let branch = self.transfer(
            rng,
            |spec| spec.class() == Class::Branch,
            offset(then_len + 2),
            Request::ANY,
        )?;
        let then_block = self.fillers(rng, then_len, &Request::ANY)?;

        let skip = self.transfer(
            rng,
            |spec| spec.class() == Class::Jal,
            offset(else_len + 1),
            Request::ANY.with(Role::Rd, Pick::Fixed(Register::ZERO)),
        )?;
        let else_block = self.fillers(rng, else_len, &Request::ANY)?;

        generation.commit(branch);
        generation.commit_all(then_block);
        generation.commit(skip);
        generation.commit_all(else_block);
        Some(())
    }

    /// A leaf function: frame setup saving `ra` and up to two `s` registers, a body that
    /// writes none of `sp`, `ra`, the saved or the argument registers, then the matching
    /// teardown and `jalr x0, 0(ra)`.
    pub(crate) fn function<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        if budget < 6 {
            return None;
        }

        let addi = self.mnemonic("addi")?;
        let sw = self.mnemonic("sw")?;
        let lw = self.mnemonic("lw")?;
        let jalr = self.mnemonic("jalr")?;

        let saved_count = rng.random_range(0..=((budget - 6) / 2).min(2));
        let saved: Vec<Register> = Register::SAVED.choose_multiple(rng, saved_count).copied().collect();

        let len = rng.random_range(1..=self.config.block_size.min(budget - 5 - 2 * saved_count));

        generation.state.enter_function();
        generation.state.save_register(Register::RA);
        for &register in &saved {
            generation.state.save_register(register);
        }

        let Some(body) = self.nested_fillers(rng, generation, len) else {
            generation.state.exit_function();
            return None;
        };

        let frame = FRAME as i32;
        let return_slot = frame - 4;
        let slot = |index: usize| return_slot - offset(index + 1);

        let sp = Some(Register::SP);
        let ra = Some(Register::RA);

        let mut prologue = vec![
            emit(addi, Operands { rd: sp, rs1: sp, rs2: None, imm: Some(-frame) }),
            emit(sw, Operands { rd: None, rs1: sp, rs2: ra, imm: Some(return_slot) }),
        ];
        prologue.extend(saved.iter().enumerate().map(|(index, &register)| {
            emit(sw, Operands { rd: None, rs1: sp, rs2: Some(register), imm: Some(slot(index)) })
        }));

        let mut epilogue: Vec<_> = saved
            .iter()
            .enumerate()
            .rev()
            .map(|(index, &register)| {
                emit(lw, Operands { rd: Some(register), rs1: sp, rs2: None, imm: Some(slot(index)) })
            })
            .collect();
        epilogue.extend([
            emit(lw, Operands { rd: ra, rs1: sp, rs2: None, imm: Some(return_slot) }),
            emit(addi, Operands { rd: sp, rs1: sp, rs2: None, imm: Some(frame) }),
            emit(jalr, Operands { rd: Some(Register::ZERO), rs1: ra, rs2: None, imm: Some(0) }),
        ]);

        generation.state.allocate_stack(FRAME);
        generation.commit_all(prologue);

        for instruction in body {
            for register in instruction.sources().filter(|it| Register::ARGUMENTS.contains(it)) {
                generation.state.use_argument(register);
            }

            generation.commit(instruction);
        }

        generation.commit_all(epilogue);
        generation.state.exit_function();
        Some(())
    }
}
