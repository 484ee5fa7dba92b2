//! Randomized, dependency aware RISC-V instruction stream generation.
//!
//! A [`Generator`] draws instructions from a [`Catalog`](rtg_core::Catalog) under a
//! [`GeneratorConfig`], shaping the stream into data hazards, memory access pairs and
//! control flow blocks while a [`SemanticState`] tracks what has been emitted so far.

#![forbid(unsafe_code)]
#![allow(clippy::match_bool)]
#![warn(clippy::must_use_candidate, clippy::clone_on_copy)]

use rtg_constraint::InvalidConstraint;
use thiserror::Error;

mod config;
mod generator;
mod pattern;
pub mod sample;
mod select;
mod sequence;
pub mod state;

pub use config::{GeneratorConfig, LoadStoreConfig};
pub use generator::{Generation, Generator};
pub use pattern::{Hazard, PatternKind, PatternRecord};
pub use select::{CategoryWeights, NoSelectableInstruction, Selector};
pub use sequence::{ImmediateRef, RegisterRef, SequenceStep, SequenceTemplate};
pub use state::{HazardKind, SemanticState};

/// How often a pattern retries a draw before giving up on it.
const ATTEMPTS: usize = 4;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerateError {
    #[error(transparent)]
    NoSelectableInstruction(#[from] NoSelectableInstruction),

    #[error(transparent)]
    InvalidConstraint(#[from] InvalidConstraint),

    #[error("unknown instruction `{0}`")]
    UnknownMnemonic(String),

    #[error("sequence `{name}`: {reason}")]
    InvalidSequence { name: String, reason: String },

    #[error("invalid generator configuration: {0}")]
    InvalidConfig(&'static str),
}
