//! User defined instruction sequences with register variables.

use std::collections::BTreeMap;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use rtg_core::{Catalog, EncodedInstruction, InstructionSpec, Register, Role};
use serde::Deserialize;

use crate::GenerateError;
use crate::generator::{Generation, Generator};
use crate::sample::{ImmPick, Pick, Request};

fn default_weight() -> f64 {
    1.0
}

/// A named, weighted list of steps emitted back to back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceTemplate {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Register variables; each starts out as a distinct random non-zero register.
    #[serde(default)]
    pub variables: Vec<String>,
    pub steps: Vec<SequenceStep>,
}

/// One instruction of a sequence.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequenceStep {
    /// Candidate mnemonics, one of which is chosen uniformly.
    pub instructions: Vec<String>,
    pub rd: RegisterRef,
    pub rs1: RegisterRef,
    pub rs2: RegisterRef,
    pub imm: ImmediateRef,
    /// After this step, each variable takes the register chosen for the given role.
    pub bind: BTreeMap<String, Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterRef {
    #[default]
    Any,
    Fixed(u8),
    OneOf(Vec<u8>),
    Variable(String),
    DifferentFrom(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmediateRef {
    #[default]
    Any,
    Fixed(i32),
    OneOf(Vec<i32>),
    Range { min: i32, max: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Any,
    Fixed(Register),
    OneOf(Vec<Register>),
    Variable(usize),
    DifferentFrom(Vec<usize>),
}

impl Slot {
    fn pick<R: Rng>(&self, rng: &mut R, bindings: &[Register]) -> Option<Pick> {
        let pick = match self {
            Self::Any => Pick::Any,
            Self::Fixed(register) => Pick::Fixed(*register),
            Self::OneOf(registers) => Pick::Fixed(*registers.choose(rng)?),
            Self::Variable(index) => Pick::Fixed(bindings[*index]),
            Self::DifferentFrom(indices) => {
                Pick::Avoid(indices.iter().map(|&index| bindings[index]).collect())
            }
        };

        Some(pick)
    }
}

impl ImmediateRef {
    fn pick<R: Rng>(&self, rng: &mut R) -> Option<ImmPick> {
        let pick = match self {
            Self::Any => ImmPick::Any,
            Self::Fixed(value) => ImmPick::Fixed(*value),
            Self::OneOf(values) => ImmPick::Fixed(*values.choose(rng)?),
            Self::Range { min, max } => ImmPick::Within { min: *min, max: *max },
        };

        Some(pick)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Step<'c> {
    specs: Vec<&'c InstructionSpec>,
    registers: [Slot; 3],
    imm: ImmediateRef,
    bind: Vec<(usize, Role)>,
}

/// A [`SequenceTemplate`] checked against a catalog, with names resolved to indices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sequence<'c> {
    name: String,
    weight: f64,
    variables: usize,
    steps: Vec<Step<'c>>,
}

struct Compiler<'a> {
    name: &'a str,
    variables: &'a [String],
}

impl Compiler<'_> {
    fn error(&self, reason: impl Into<String>) -> GenerateError {
        GenerateError::InvalidSequence { name: self.name.to_owned(), reason: reason.into() }
    }

    fn variable(&self, step: usize, name: &str) -> Result<usize, GenerateError> {
        self.variables
            .iter()
            .position(|it| it == name)
            .ok_or_else(|| self.error(format!("step {step}: unknown variable `{name}`")))
    }

    fn register(&self, step: usize, index: u8) -> Result<Register, GenerateError> {
        Register::new(index).ok_or_else(|| self.error(format!("step {step}: register x{index} does not exist")))
    }

    fn slot(&self, step: usize, reference: &RegisterRef) -> Result<Slot, GenerateError> {
        let slot = match reference {
            RegisterRef::Any => Slot::Any,
            RegisterRef::Fixed(index) => Slot::Fixed(self.register(step, *index)?),
            RegisterRef::OneOf(indices) if indices.is_empty() => {
                return Err(self.error(format!("step {step}: empty register list")));
            }
            RegisterRef::OneOf(indices) => Slot::OneOf(
                indices.iter().map(|&it| self.register(step, it)).collect::<Result<_, _>>()?,
            ),
            RegisterRef::Variable(name) => Slot::Variable(self.variable(step, name)?),
            RegisterRef::DifferentFrom(names) => Slot::DifferentFrom(
                names.iter().map(|it| self.variable(step, it)).collect::<Result<_, _>>()?,
            ),
        };

        Ok(slot)
    }

    fn imm(&self, step: usize, reference: &ImmediateRef) -> Result<ImmediateRef, GenerateError> {
        match reference {
            ImmediateRef::OneOf(values) if values.is_empty() => {
                Err(self.error(format!("step {step}: empty immediate list")))
            }
            ImmediateRef::Range { min, max } if min > max => {
                Err(self.error(format!("step {step}: immediate range {min}..={max} is inverted")))
            }
            reference => Ok(reference.clone()),
        }
    }

    fn step<'c>(
        &self,
        catalog: &'c Catalog,
        index: usize,
        step: &SequenceStep,
    ) -> Result<Step<'c>, GenerateError> {
        if step.instructions.is_empty() {
            return Err(self.error(format!("step {index} names no instructions")));
        }

        let specs = step
            .instructions
            .iter()
            .map(|it| catalog.get(it).ok_or_else(|| GenerateError::UnknownMnemonic(it.clone())))
            .collect::<Result<_, _>>()?;

        let bind = step
            .bind
            .iter()
            .map(|(name, &role)| Ok((self.variable(index, name)?, role)))
            .collect::<Result<_, GenerateError>>()?;

        Ok(Step {
            specs,
            registers: [
                self.slot(index, &step.rd)?,
                self.slot(index, &step.rs1)?,
                self.slot(index, &step.rs2)?,
            ],
            imm: self.imm(index, &step.imm)?,
            bind,
        })
    }
}

impl<'c> Sequence<'c> {
    pub(crate) fn compile(catalog: &'c Catalog, template: &SequenceTemplate) -> Result<Self, GenerateError> {
        let compiler = Compiler { name: &template.name, variables: &template.variables };

        if template.steps.is_empty() {
            return Err(compiler.error("has no steps"));
        }

        if !(template.weight.is_finite() && template.weight >= 0.0) {
            return Err(compiler.error(format!(
                "weight {} is not a finite non-negative number",
                template.weight
            )));
        }

        if template.variables.len() >= usize::from(Register::COUNT) {
            return Err(compiler.error("more variables than non-zero registers"));
        }

        for (index, name) in template.variables.iter().enumerate() {
            if template.variables[..index].contains(name) {
                return Err(compiler.error(format!("variable `{name}` is declared twice")));
            }
        }

        let steps = template
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| compiler.step(catalog, index, step))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            name: template.name.clone(),
            weight: template.weight,
            variables: template.variables.len(),
            steps,
        })
    }

    fn len(&self) -> usize {
        self.steps.len()
    }

    /// Draws every step; `None` if some step has nothing legal to choose.
    fn instantiate<R: Rng>(
        &self,
        rng: &mut R,
        generator: &Generator<'c>,
    ) -> Option<Vec<EncodedInstruction<'c>>> {
        let registers: Vec<_> = Register::all().filter(|it| !it.is_zero()).collect();
        let mut bindings: Vec<Register> = registers.choose_multiple(rng, self.variables).copied().collect();

        let mut instructions = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let spec = *step.specs.choose(rng)?;

            let mut request = Request::ANY.with_imm(step.imm.pick(rng)?);
            for (role, slot) in Role::ALL.into_iter().zip(&step.registers) {
                request = request.with(role, slot.pick(rng, &bindings)?);
            }

            let instruction = generator.sample(rng, spec, &request)?;
            for &(variable, role) in &step.bind {
                if let Some(register) = instruction.operands().get(role) {
                    bindings[variable] = register;
                }
            }

            instructions.push(instruction);
        }

        Some(instructions)
    }
}

impl<'c> Generator<'c> {
    /// Emits one configured sequence, chosen by weight among those that fit in `budget`.
    pub(crate) fn sequence<R: Rng>(
        &self,
        rng: &mut R,
        generation: &mut Generation<'c>,
        budget: usize,
    ) -> Option<()> {
        let fitting: Vec<_> =
            self.sequences.iter().filter(|it| it.len() <= budget && it.weight > 0.0).collect();

        let index = WeightedIndex::new(fitting.iter().map(|it| it.weight)).ok()?;
        let sequence = fitting[index.sample(rng)];

        let instructions = sequence.instantiate(rng, self)?;
        tracing::trace!(name = %sequence.name, len = instructions.len(), "sequence");

        generation.commit_all(instructions);
        Some(())
    }
}
