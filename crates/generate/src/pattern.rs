use core::fmt;

use rtg_core::Register;
use serde::Deserialize;

use crate::state::HazardKind;

mod control;
mod hazard;
mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    Random,
    Raw,
    War,
    Waw,
    LoadStore,
    BasicBlock,
    Mixed,
    Loop,
    Conditional,
    Function,
    Sequence,
}

impl PatternKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Raw => "raw",
            Self::War => "war",
            Self::Waw => "waw",
            Self::LoadStore => "load-store",
            Self::BasicBlock => "basic-block",
            Self::Mixed => "mixed",
            Self::Loop => "loop",
            Self::Conditional => "conditional",
            Self::Function => "function",
            Self::Sequence => "sequence",
        }
    }

    /// The hazard this pattern produces, if it's one of the pair patterns.
    #[must_use]
    pub const fn hazard(self) -> Option<HazardKind> {
        match self {
            Self::Raw => Some(HazardKind::Raw),
            Self::War => Some(HazardKind::War),
            Self::Waw => Some(HazardKind::Waw),
            _ => None,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A realized hazard: `second` depends on `first` through `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hazard {
    pub kind: HazardKind,
    pub register: Register,
    pub first: usize,
    pub second: usize,
}

/// The instructions `start..start + len` were emitted by one `kind` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRecord {
    pub kind: PatternKind,
    pub start: usize,
    pub len: usize,
}
