use core::fmt;

use rtg_core::{Format, Role};
use thiserror::Error;

/// Where an offending constraint was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Group(String),
    Override(String),
    /// The merged constraints of one instruction.
    Resolved(String),
    LoadStore,
    CategoryWeights,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global constraints"),
            Self::Group(name) => write!(f, "group `{name}`"),
            Self::Override(mnemonic) => write!(f, "override for `{mnemonic}`"),
            Self::Resolved(mnemonic) => write!(f, "resolved constraints for `{mnemonic}`"),
            Self::LoadStore => f.write_str("load/store offset ranges"),
            Self::CategoryWeights => f.write_str("category weights"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidKind {
    #[error("{role} register x{index} does not exist")]
    RegisterOutOfRange { role: Role, index: u8 },

    #[error("{role} range {min}..={max} is inverted")]
    InvertedRegisterRange { role: Role, min: u8, max: u8 },

    #[error("no register satisfies the {role} constraints")]
    EmptyRegisterDomain { role: Role },

    #[error("{format}-type immediate range {min}..={max} is inverted")]
    InvertedImmediateRange { format: Format, min: i32, max: i32 },

    #[error("{format}-type alignment {alignment} is not a power of two")]
    BadAlignment { format: Format, alignment: u32 },

    #[error("{format}-type allowed values are empty")]
    EmptyAllowedValues { format: Format },

    #[error("weight {0} is not a finite non-negative number")]
    InvalidWeight(f64),

    #[error("unknown instruction `{0}`")]
    UnknownInstruction(String),

    #[error("offset range starting at {base} is empty")]
    EmptyOffsetRange { base: i32 },

    #[error("offset range {min}..={max} leaves the 12 bit immediate range")]
    OffsetOutOfRange { min: i64, max: i64 },

    #[error("no offset ranges given")]
    NoOffsetRanges,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid constraint in {scope}: {kind}")]
pub struct InvalidConstraint {
    pub scope: Scope,
    pub kind: InvalidKind,
}

impl InvalidConstraint {
    #[must_use]
    pub const fn new(scope: Scope, kind: InvalidKind) -> Self {
        Self { scope, kind }
    }
}
