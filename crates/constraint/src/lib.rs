//! Layered operand constraints.
//!
//! Constraints come in three layers of increasing specificity: a global layer, named groups
//! of instructions, and per-instruction overrides. [`resolve`] folds them into the
//! [`ConstraintSet`] the samplers draw from.

#![forbid(unsafe_code)]

mod error;
mod layer;
mod resolve;

pub use error::{InvalidConstraint, InvalidKind, Scope};
pub use layer::{
    ConstraintConfig, Group, ImmediateConstraint, ImmediateConstraints, Layer, OffsetRange,
    RegisterConstraint, validate_offsets,
};
pub use resolve::{ConstraintSet, RegisterDomain, resolve};
