//! RAW, WAR and WAW pairs.

use rand::Rng;
use rand::seq::IndexedRandom;
use rtg_core::{Class, EncodedInstruction, InstructionSpec, Register, RegisterSet, Role};

use crate::generator::{Generation, Generator};
use crate::pattern::Hazard;
use crate::sample::{self, Pick, Request};
use crate::state::HazardKind;

const SOURCES: [Role; 2] = [Role::Rs1, Role::Rs2];

const NOT_ZERO: Pick = Pick::Avoid(RegisterSet::of(Register::ZERO));

/// Reads its sources without transferring control unconditionally or trapping.
fn is_reader(spec: &InstructionSpec) -> bool {
    !matches!(spec.class(), Class::Jal | Class::Jalr | Class::System)
        && (spec.reads_rs1() || spec.reads_rs2())
}

fn is_writer(spec: &InstructionSpec) -> bool {
    spec.is_straight_line() && spec.writes_rd()
}

impl<'c> Generator<'c> {
    /// Source roles of `spec` that may hold `register`.
    fn source_roles(&self, spec: &InstructionSpec, register: Register) -> Vec<Role> {
        let constraints = self.constraints_for(spec);
        SOURCES
            .into_iter()
            .filter(|&role| spec.uses(role) && constraints.register(role).contains(register))
            .collect()
    }

    /// An instruction reading `register` through one of its sources; everything else is
    /// drawn with `request`.
    fn reader<R: Rng>(
        &self,
        rng: &mut R,
        register: Register,
        request: Request,
    ) -> Option<EncodedInstruction<'c>> {
        let spec =
            self.pick(rng, |spec| is_reader(spec) && !self.source_roles(spec, register).is_empty())?;
        let role = *self.source_roles(spec, register).choose(rng)?;
        self.sample(rng, spec, &request.with(role, Pick::Fixed(register)))
    }

    fn writer<R: Rng>(
        &self,
        rng: &mut R,
        register: Register,
        request: Request,
    ) -> Option<EncodedInstruction<'c>> {
        let spec = self.pick(rng, |spec| {
            is_writer(spec) && self.constraints_for(spec).rd.contains(register)
        })?;

        self.sample(rng, spec, &request.with(Role::Rd, Pick::Fixed(register)))
    }

    /// Distance from the first half of a pair to the second, minus one.
    fn gap<R: Rng>(&self, rng: &mut R, budget: usize) -> usize {
        rng.random_range(0..=(self.config.lookahead - 1).min(budget - 2))
    }

    /// Half of the time tries to finish a hazard against something already emitted, otherwise
    /// (or if that's impossible) emits both halves.
    pub(crate) fn hazard<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        kind: HazardKind,
        budget: usize,
    ) -> Option<()> {
        if rng.random_bool(0.5) && self.complete(rng, generation, kind).is_some() {
            return Some(());
        }

        match kind {
            HazardKind::Raw => self.raw_pair(rng, generation, budget),
            HazardKind::War => self.war_pair(rng, generation, budget),
            HazardKind::Waw => self.waw_pair(rng, generation, budget),
        }
    }

    fn complete<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        kind: HazardKind,
    ) -> Option<()> {
        let state = &generation.state;
        let register = *state.candidate_registers_for_hazard(kind).choose(rng)?;
        let not_register = Pick::Avoid(RegisterSet::of(register));

        let (first, instruction) = match kind {
            HazardKind::Raw => {
                (state.last_writer_of(register)?, self.reader(rng, register, Request::ANY)?)
            }
            HazardKind::War => {
                let request = Request::ANY.with(Role::Rs1, not_register).with(Role::Rs2, not_register);
                (*state.readers_of(register).last()?, self.writer(rng, register, request)?)
            }
            HazardKind::Waw => {
                (state.last_writer_of(register)?, self.writer(rng, register, Request::ANY)?)
            }
        };

        let second = generation.len();
        generation.commit(instruction);
        generation.hazards.push(Hazard { kind, register, first, second });

        Some(())
    }

    fn raw_pair<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        let spec = self.pick(rng, is_writer)?;
        let register = sample::register(rng, &self.constraints_for(spec).rd, NOT_ZERO)?;
        let writer = self.sample(rng, spec, &Request::ANY.with(Role::Rd, Pick::Fixed(register)))?;

        let gap = self.gap(rng, budget);
        let keep = Request::ANY.with(Role::Rd, Pick::Avoid(RegisterSet::of(register)));
        let fillers = self.fillers(rng, gap, &keep)?;

        let reader = self.reader(rng, register, Request::ANY)?;

        generation.commit_hazard(HazardKind::Raw, register, writer, fillers, reader);
        Some(())
    }

    fn war_pair<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        let spec = self.pick(rng, is_reader)?;
        let constraints = self.constraints_for(spec);
        let roles: Vec<_> = SOURCES.into_iter().filter(|&it| spec.uses(it)).collect();
        let role = *roles.choose(rng)?;
        let register = sample::register(rng, constraints.register(role), NOT_ZERO)?;

        let untouched = Pick::Avoid(RegisterSet::of(register));
        let request = Request::ANY.with(role, Pick::Fixed(register)).with(Role::Rd, untouched);
        let reader = self.sample(rng, spec, &request)?;

        let gap = self.gap(rng, budget);
        let fillers = self.fillers(rng, gap, &Request::all(untouched))?;

        let request = Request::ANY.with(Role::Rs1, untouched).with(Role::Rs2, untouched);
        let writer = self.writer(rng, register, request)?;

        generation.commit_hazard(HazardKind::War, register, reader, fillers, writer);
        Some(())
    }

    fn waw_pair<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        let spec = self.pick(rng, is_writer)?;
        let register = sample::register(rng, &self.constraints_for(spec).rd, NOT_ZERO)?;
        let first = self.sample(rng, spec, &Request::ANY.with(Role::Rd, Pick::Fixed(register)))?;

        let gap = self.gap(rng, budget);
        let keep = Request::ANY.with(Role::Rd, Pick::Avoid(RegisterSet::of(register)));
        let fillers = self.fillers(rng, gap, &keep)?;

        let second = self.writer(rng, register, Request::ANY)?;

        generation.commit_hazard(HazardKind::Waw, register, first, fillers, second);
        Some(())
    }
}
