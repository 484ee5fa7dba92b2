use rand::Rng;
use rand::seq::IndexedRandom;
use rtg_core::{Class, InstructionSpec, Operands, Register, RegisterSet};

use crate::ATTEMPTS;
use crate::generator::{Generation, Generator};
use crate::sample::{self, Pick};
use crate::state::Interval;

impl<'c> Generator<'c> {
    /// Draws an offset for `spec` inside `window`, redrawing while the accessed interval is
    /// already in `taken`.
    fn offset<R: Rng>(
        &self,
        rng: &mut R,
        spec: &InstructionSpec,
        window: (i32, i32),
        taken: &[Interval],
    ) -> Option<Interval> {
        let shape = spec.imm()?;
        let width = spec.access_width()?;
        let constraint = self.constraints_for(spec).immediate(spec.format());

        let mut interval = None;
        for _ in 0..ATTEMPTS {
            let candidate = Interval::new(sample::immediate(rng, shape, constraint, Some(window)), width);
            interval = Some(candidate);

            if self.config.load_store.allow_identical || !taken.contains(&candidate) {
                break;
            }
        }

        interval
    }

    /// A load followed by a store through the same base register, the store writing back
    /// the loaded value.
    pub(crate) fn load_store<R: Rng>(&self, rng: &mut R, generation: &mut Generation<'c>) -> Option<()> {
        let load = self.pick(rng, |spec| spec.class() == Class::Load)?;
        let store = self.pick(rng, |spec| spec.class() == Class::Store)?;
        let (load_constraints, store_constraints) = (self.constraints_for(load), self.constraints_for(store));

        let bases: Vec<_> = load_constraints
            .rs1
            .candidates()
            .filter(|it| !it.is_zero() && store_constraints.rs1.contains(*it))
            .collect();
        let base = *bases.choose(rng)?;

        let avoid = RegisterSet::of(Register::ZERO).with(base);
        let data = sample::register(rng, &load_constraints.rd, Pick::Avoid(avoid))?;
        let source = match store_constraints.rs2.contains(data) {
            true => data,
            false => sample::register(rng, &store_constraints.rs2, Pick::Any)?,
        };

        let window = self.config.load_store.ranges.choose(rng)?;
        let window = (window.min(), window.max() as i32);

        let mut taken = generation.state.footprint(base).to_vec();
        let load_at = self.offset(rng, load, window, &taken)?;
        taken.push(load_at);
        let store_at = self.offset(rng, store, window, &taken)?;

        let load = rtg_encode::encoded(
            load,
            &Operands { rd: Some(data), rs1: Some(base), rs2: None, imm: Some(load_at.start) },
        );

        let store = rtg_encode::encoded(
            store,
            &Operands { rd: None, rs1: Some(base), rs2: Some(source), imm: Some(store_at.start) },
        );

        generation.commit_all([load, store]);
        Some(())
    }
}
