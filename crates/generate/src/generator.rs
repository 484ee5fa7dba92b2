use fnv::FnvHashMap;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rtg_constraint::{ConstraintSet, InvalidConstraint, InvalidKind, Scope, validate_offsets};
use rtg_core::{Catalog, EncodedInstruction, InstructionSpec, Register};

use crate::config::GeneratorConfig;
use crate::pattern::{Hazard, PatternKind, PatternRecord};
use crate::sample::{self, Request};
use crate::select::{NoSelectableInstruction, Selector};
use crate::sequence::Sequence;
use crate::state::{HazardKind, SemanticState};
use crate::{ATTEMPTS, GenerateError};

/// The output of one run, and the accumulator every step of the run threads through.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation<'c> {
    pub(crate) instructions: Vec<EncodedInstruction<'c>>,
    pub(crate) state: SemanticState,
    pub(crate) hazards: Vec<Hazard>,
    pub(crate) patterns: Vec<PatternRecord>,
}

impl<'c> Generation<'c> {
    fn new(window: usize) -> Self {
        Self {
            instructions: Vec::new(),
            state: SemanticState::new(window),
            hazards: Vec::new(),
            patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn instructions(&self) -> &[EncodedInstruction<'c>] {
        &self.instructions
    }

    #[must_use]
    pub fn into_instructions(self) -> Vec<EncodedInstruction<'c>> {
        self.instructions
    }

    #[must_use]
    pub const fn state(&self) -> &SemanticState {
        &self.state
    }

    #[must_use]
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    #[must_use]
    pub fn patterns(&self) -> &[PatternRecord] {
        &self.patterns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub(crate) fn commit(&mut self, instruction: EncodedInstruction<'c>) {
        tracing::trace!(index = self.instructions.len(), word = instruction.word(), %instruction);
        self.state.record(&instruction);
        self.instructions.push(instruction);
    }

    pub(crate) fn commit_all(&mut self, instructions: impl IntoIterator<Item = EncodedInstruction<'c>>) {
        for instruction in instructions {
            self.commit(instruction);
        }
    }

    /// Commits `first`, then `fillers`, then `second`, and records the hazard between the two.
    pub(crate) fn commit_hazard(
        &mut self,
        kind: HazardKind,
        register: Register,
        first: EncodedInstruction<'c>,
        fillers: Vec<EncodedInstruction<'c>>,
        second: EncodedInstruction<'c>,
    ) {
        let start = self.len();
        self.commit(first);
        self.commit_all(fillers);

        let end = self.len();
        self.commit(second);
        self.hazards.push(Hazard { kind, register, first: start, second: end });
    }
}

/// Chance of starting a pattern at a decision point such that, for two-instruction patterns,
/// about `density` of all emitted instructions end up inside one.
fn pattern_probability(density: f64) -> f64 {
    density / (2.0 * (1.0 - density) + density)
}

pub struct Generator<'c> {
    pub(crate) catalog: &'c Catalog,
    pub(crate) config: GeneratorConfig,
    constraints: FnvHashMap<&'c str, ConstraintSet>,
    fallback: ConstraintSet,
    selector: Selector<'c>,
    pub(crate) sequences: Vec<Sequence<'c>>,
}

impl<'c> Generator<'c> {
    /// Validates `config` against `catalog` and resolves the constraints of every entry.
    pub fn new(catalog: &'c Catalog, config: GeneratorConfig) -> Result<Self, GenerateError> {
        config.weights.validate()?;
        config.constraints.validate()?;

        if let Some((scope, name)) = config.constraints.referenced().find(|(_, it)| !catalog.contains(it)) {
            let kind = InvalidKind::UnknownInstruction(name.to_owned());
            return Err(InvalidConstraint::new(scope, kind).into());
        }

        validate_offsets(&config.load_store.ranges)
            .map_err(|kind| InvalidConstraint::new(Scope::LoadStore, kind))?;

        if config.lookahead == 0 {
            return Err(GenerateError::InvalidConfig("lookahead must be at least 1"));
        }

        if config.block_size == 0 {
            return Err(GenerateError::InvalidConfig("block size must be at least 1"));
        }

        if config.mixed.contains(&PatternKind::Mixed) {
            return Err(GenerateError::InvalidConfig("mixed patterns cannot include `mixed`"));
        }

        let constraints = catalog
            .iter()
            .map(|spec| Ok((spec.mnemonic(), config.constraints.resolve(spec.mnemonic())?)))
            .collect::<Result<FnvHashMap<_, _>, InvalidConstraint>>()?;

        let selector = Selector::new(catalog, |spec| {
            constraints.get(spec.mnemonic()).map_or(1.0, |it| it.weight)
        });

        let sequences = config
            .sequences
            .iter()
            .map(|template| Sequence::compile(catalog, template))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            catalog,
            config,
            constraints,
            fallback: ConstraintSet::default(),
            selector,
            sequences,
        })
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The resolved constraints for `spec`.
    #[must_use]
    pub fn constraints_for(&self, spec: &InstructionSpec) -> &ConstraintSet {
        self.constraints.get(spec.mnemonic()).unwrap_or(&self.fallback)
    }

    /// Generates `count` instructions with a fresh RNG seeded from the configuration.
    pub fn generate(
        &self,
        kind: PatternKind,
        count: usize,
        density: f64,
    ) -> Result<Generation<'c>, GenerateError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.generate_with(&mut rng, kind, count, density)
    }

    /// Generates `count` instructions, starting a `kind` pattern at each decision point with a
    /// probability derived from `density` (clamped to `0.0..=1.0`).
    pub fn generate_with<R: Rng>(
        &self,
        rng: &mut R,
        kind: PatternKind,
        count: usize,
        density: f64,
    ) -> Result<Generation<'c>, GenerateError> {
        let density = match density.is_nan() {
            true => 0.0,
            false => density.clamp(0.0, 1.0),
        };

        let _span = tracing::debug_span!("generate", %kind, count, density).entered();

        let mut generation = Generation::new(self.config.lookahead);
        while generation.len() < count {
            let budget = count - generation.len();
            self.step(rng, &mut generation, kind, budget, density)?;
        }

        tracing::debug!(
            hazards = generation.hazards.len(),
            patterns = generation.patterns.len(),
            "generation finished"
        );

        Ok(generation)
    }

    /// Emits at least one and at most `budget` instructions.
    fn step<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        kind: PatternKind,
        budget: usize,
        density: f64,
    ) -> Result<(), GenerateError> {
        let kind = match kind {
            PatternKind::Mixed => self.config.mixed.choose(rng).copied().unwrap_or(PatternKind::Random),
            kind => kind,
        };

        let chance = match kind {
            PatternKind::Random => 0.0,
            PatternKind::Sequence => density,
            _ => pattern_probability(density),
        };

        if budget >= 2 && chance > 0.0 && rng.random_bool(chance) {
            let start = generation.len();
            if self.pattern(rng, generation, kind, budget).is_some() {
                let len = generation.len() - start;
                generation.patterns.push(PatternRecord { kind, start, len });
                return Ok(());
            }

            tracing::debug!(%kind, index = start, "pattern not realizable, emitting a random instruction");
        }

        self.random(rng, generation)
    }

    /// Runs one `kind` pattern. Nothing is committed unless the whole pattern could be built.
    fn pattern<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        kind: PatternKind,
        budget: usize,
    ) -> Option<()> {
        match kind {
            PatternKind::Random | PatternKind::Mixed => None,
            PatternKind::Raw => self.hazard(rng, generation, HazardKind::Raw, budget),
            PatternKind::War => self.hazard(rng, generation, HazardKind::War, budget),
            PatternKind::Waw => self.hazard(rng, generation, HazardKind::Waw, budget),
            PatternKind::LoadStore => self.load_store(rng, generation),
            PatternKind::BasicBlock => self.basic_block(rng, generation, budget),
            PatternKind::Loop => self.counted_loop(rng, generation, budget),
            PatternKind::Conditional => self.conditional(rng, generation, budget),
            PatternKind::Function => self.function(rng, generation, budget),
            PatternKind::Sequence => self.sequence(rng, generation, budget),
        }
    }

    /// One plain weighted pick, honoring the configured category restriction.
    fn random<R: Rng>(&self, rng: &mut R, generation: &mut Generation<'c>) -> Result<(), GenerateError> {
        for _ in 0..ATTEMPTS {
            let spec = self.selector.select(rng, &self.config.weights, self.config.restriction, |_| true)?;
            if let Some(instruction) = self.sample(rng, spec, &Request::ANY) {
                generation.commit(instruction);
                return Ok(());
            }
        }

        Err(NoSelectableInstruction.into())
    }

    pub(crate) fn pick<R: Rng>(
        &self,
        rng: &mut R,
        filter: impl Fn(&InstructionSpec) -> bool,
    ) -> Option<&'c InstructionSpec> {
        self.selector.select(rng, &self.config.weights, None, filter).ok()
    }

    pub(crate) fn sample<R: Rng>(
        &self,
        rng: &mut R,
        spec: &'c InstructionSpec,
        request: &Request,
    ) -> Option<EncodedInstruction<'c>> {
        let constraints = self.constraints_for(spec);
        let operands =
            sample::operands(rng, spec, constraints, request, &self.config.load_store.ranges)?;

        Some(rtg_encode::encoded(spec, &operands))
    }

    /// `count` straight line instructions drawn with `request`.
    pub(crate) fn fillers<R: Rng>(
        &self,
        rng: &mut R,
        count: usize,
        request: &Request,
    ) -> Option<Vec<EncodedInstruction<'c>>> {
        (0..count)
            .map(|_| {
                let spec = self.pick(rng, InstructionSpec::is_straight_line)?;
                self.sample(rng, spec, request)
            })
            .collect()
    }

    pub(crate) fn mnemonic(&self, mnemonic: &str) -> Option<&'c InstructionSpec> {
        self.catalog.get(mnemonic)
    }
}

#[cfg(test)]
mod tests;
