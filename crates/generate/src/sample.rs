//! Operand samplers.

use rand::Rng;
use rand::seq::IndexedRandom;
use rtg_constraint::{ConstraintSet, ImmediateConstraint, OffsetRange, RegisterDomain};
use rtg_core::{ImmShape, InstructionSpec, Operands, Register, RegisterSet, Role};

/// How one register operand should be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pick {
    /// Uniform over the role's domain.
    #[default]
    Any,
    /// Exactly this register, regardless of the domain.
    Fixed(Register),
    /// Uniform over the role's domain minus these registers.
    Avoid(RegisterSet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImmPick {
    #[default]
    Any,
    /// Narrowed further to `min..=max`.
    Within { min: i32, max: i32 },
    Fixed(i32),
}

/// Per-operand picks for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Request {
    pub rd: Pick,
    pub rs1: Pick,
    pub rs2: Pick,
    pub imm: ImmPick,
}

impl Request {
    pub const ANY: Self = Self { rd: Pick::Any, rs1: Pick::Any, rs2: Pick::Any, imm: ImmPick::Any };

    #[must_use]
    pub const fn pick(&self, role: Role) -> Pick {
        match role {
            Role::Rd => self.rd,
            Role::Rs1 => self.rs1,
            Role::Rs2 => self.rs2,
        }
    }

    #[must_use]
    pub fn with(mut self, role: Role, pick: Pick) -> Self {
        match role {
            Role::Rd => self.rd = pick,
            Role::Rs1 => self.rs1 = pick,
            Role::Rs2 => self.rs2 = pick,
        }

        self
    }

    /// The same pick for every register role.
    #[must_use]
    pub fn all(pick: Pick) -> Self {
        Self { rd: pick, rs1: pick, rs2: pick, imm: ImmPick::Any }
    }

    #[must_use]
    pub const fn with_imm(mut self, imm: ImmPick) -> Self {
        self.imm = imm;
        self
    }
}

/// `None` if the pick leaves nothing to choose from.
pub fn register<R: Rng>(rng: &mut R, domain: &RegisterDomain, pick: Pick) -> Option<Register> {
    let avoid = match pick {
        Pick::Fixed(register) => return Some(register),
        Pick::Any => RegisterSet::EMPTY,
        Pick::Avoid(avoid) => avoid,
    };

    let candidates: Vec<_> = domain.candidates().filter(|it| !avoid.contains(*it)).collect();
    candidates.choose(rng).copied()
}

fn intersect(a: (i64, i64), b: (i64, i64)) -> Option<(i64, i64)> {
    let (min, max) = (a.0.max(b.0), a.1.min(b.1));
    (min <= max).then_some((min, max))
}

/// Rounds `value` to the nearest multiple of `alignment` (ties up), keeping it inside
/// `min..=max` where a multiple exists.
fn align(value: i64, alignment: i64, (min, max): (i64, i64)) -> i64 {
    if alignment <= 1 {
        return value;
    }

    let mut aligned = (value + alignment / 2).div_euclid(alignment) * alignment;
    if aligned > max {
        aligned -= alignment;
    }

    if aligned < min {
        aligned += alignment;
    }

    aligned.clamp(min, max)
}

/// Draws an immediate for `shape`.
///
/// An allowed-value list wins outright. Otherwise the draw is uniform over the shape's
/// range narrowed by `constraint` and then by `window`; a narrowing that leaves nothing is
/// skipped.
pub fn immediate<R: Rng>(
    rng: &mut R,
    shape: ImmShape,
    constraint: Option<&ImmediateConstraint>,
    window: Option<(i32, i32)>,
) -> i32 {
    if let Some(&value) = constraint.and_then(|it| it.allowed.as_deref()).and_then(|it| it.choose(rng))
    {
        return value;
    }

    let declared = (i64::from(shape.min), i64::from(shape.max));

    let requested = constraint.map_or(declared, |it| {
        (it.min.map_or(declared.0, i64::from), it.max.map_or(declared.1, i64::from))
    });

    let range = intersect(declared, requested).unwrap_or(declared);
    let range = window
        .and_then(|(min, max)| intersect(range, (i64::from(min), i64::from(max))))
        .unwrap_or(range);

    let alignment = shape.alignment.max(constraint.and_then(|it| it.alignment).unwrap_or(1));
    let value = rng.random_range(range.0..=range.1);

    align(value, i64::from(alignment), range) as i32
}

/// Samples every operand `spec` uses. Loads and stores without an explicit immediate pick
/// draw their offset from one of `offsets`.
pub fn operands<R: Rng>(
    rng: &mut R,
    spec: &InstructionSpec,
    constraints: &ConstraintSet,
    request: &Request,
    offsets: &[OffsetRange],
) -> Option<Operands> {
    let mut operands = Operands::default();

    for role in Role::ALL.into_iter().filter(|it| spec.uses(*it)) {
        operands.set(role, register(rng, constraints.register(role), request.pick(role))?);
    }

    if let Some(shape) = spec.imm() {
        let constraint = constraints.immediate(spec.format());

        let imm = match request.imm {
            ImmPick::Fixed(value) => value,
            ImmPick::Within { min, max } => immediate(rng, shape, constraint, Some((min, max))),
            ImmPick::Any => {
                let window = match spec.access_width() {
                    Some(_) => offsets.choose(rng).map(|it| (it.min(), it.max() as i32)),
                    None => None,
                };

                immediate(rng, shape, constraint, window)
            }
        };

        operands.imm = Some(imm);
    }

    Some(operands)
}
