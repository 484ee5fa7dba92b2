use std::collections::BTreeMap;

use rtg_core::{Format, Register, Role};
use serde::Deserialize;

use crate::error::InvalidKind;

/// Register restrictions for one operand role. Every field is optional so that a more
/// specific layer can override a single field and inherit the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterConstraint {
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub exclude_zero: Option<bool>,
    pub allowed: Option<Vec<u8>>,
}

impl RegisterConstraint {
    fn overlay(&mut self, other: &Self) {
        self.min = other.min.or(self.min);
        self.max = other.max.or(self.max);
        self.exclude_zero = other.exclude_zero.or(self.exclude_zero);
        if other.allowed.is_some() {
            self.allowed.clone_from(&other.allowed);
        }
    }

    fn validate(&self, role: Role) -> Result<(), InvalidKind> {
        let indices = self.min.iter().chain(&self.max).chain(self.allowed.iter().flatten());
        for &index in indices {
            if Register::new(index).is_none() {
                return Err(InvalidKind::RegisterOutOfRange { role, index });
            }
        }

        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => {
                Err(InvalidKind::InvertedRegisterRange { role, min, max })
            }
            _ => Ok(()),
        }
    }
}

/// Immediate restrictions for one format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImmediateConstraint {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub alignment: Option<u32>,
    /// When present, values are drawn from this list only.
    pub allowed: Option<Vec<i32>>,
}

impl ImmediateConstraint {
    fn overlay(&mut self, other: &Self) {
        self.min = other.min.or(self.min);
        self.max = other.max.or(self.max);
        self.alignment = other.alignment.or(self.alignment);
        if other.allowed.is_some() {
            self.allowed.clone_from(&other.allowed);
        }
    }

    pub(crate) fn validate(&self, format: Format) -> Result<(), InvalidKind> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(InvalidKind::InvertedImmediateRange { format, min, max });
            }
        }

        if let Some(alignment) = self.alignment {
            if !alignment.is_power_of_two() {
                return Err(InvalidKind::BadAlignment { format, alignment });
            }
        }

        match &self.allowed {
            Some(values) if values.is_empty() => Err(InvalidKind::EmptyAllowedValues { format }),
            _ => Ok(()),
        }
    }
}

/// Immediate restrictions keyed by format. R-type has no immediate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImmediateConstraints {
    pub i_type: ImmediateConstraint,
    pub s_type: ImmediateConstraint,
    pub b_type: ImmediateConstraint,
    pub u_type: ImmediateConstraint,
    pub j_type: ImmediateConstraint,
}

impl ImmediateConstraints {
    #[must_use]
    pub const fn get(&self, format: Format) -> Option<&ImmediateConstraint> {
        match format {
            Format::R => None,
            Format::I => Some(&self.i_type),
            Format::S => Some(&self.s_type),
            Format::B => Some(&self.b_type),
            Format::U => Some(&self.u_type),
            Format::J => Some(&self.j_type),
        }
    }

    pub fn get_mut(&mut self, format: Format) -> Option<&mut ImmediateConstraint> {
        match format {
            Format::R => None,
            Format::I => Some(&mut self.i_type),
            Format::S => Some(&mut self.s_type),
            Format::B => Some(&mut self.b_type),
            Format::U => Some(&mut self.u_type),
            Format::J => Some(&mut self.j_type),
        }
    }

    fn pairs(&self) -> [(Format, &ImmediateConstraint); 5] {
        [
            (Format::I, &self.i_type),
            (Format::S, &self.s_type),
            (Format::B, &self.b_type),
            (Format::U, &self.u_type),
            (Format::J, &self.j_type),
        ]
    }

    fn overlay(&mut self, other: &Self) {
        self.i_type.overlay(&other.i_type);
        self.s_type.overlay(&other.s_type);
        self.b_type.overlay(&other.b_type);
        self.u_type.overlay(&other.u_type);
        self.j_type.overlay(&other.j_type);
    }

    pub(crate) fn validate(&self) -> Result<(), InvalidKind> {
        self.pairs().into_iter().try_for_each(|(format, it)| it.validate(format))
    }
}

/// One level of constraints: global, a group, or a per-instruction override.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layer {
    pub rd: RegisterConstraint,
    pub rs1: RegisterConstraint,
    pub rs2: RegisterConstraint,
    pub immediates: ImmediateConstraints,
    /// Multiplies with the weights of the other layers; absent means `1.0`.
    pub weight: Option<f64>,
}

impl Layer {
    #[must_use]
    pub const fn register(&self, role: Role) -> &RegisterConstraint {
        match role {
            Role::Rd => &self.rd,
            Role::Rs1 => &self.rs1,
            Role::Rs2 => &self.rs2,
        }
    }

    pub fn register_mut(&mut self, role: Role) -> &mut RegisterConstraint {
        match role {
            Role::Rd => &mut self.rd,
            Role::Rs1 => &mut self.rs1,
            Role::Rs2 => &mut self.rs2,
        }
    }

    /// Field-wise overlay: anything `other` sets replaces what `self` had. Weights are not
    /// touched; they multiply instead.
    pub(crate) fn overlay(&mut self, other: &Self) {
        self.rd.overlay(&other.rd);
        self.rs1.overlay(&other.rs1);
        self.rs2.overlay(&other.rs2);
        self.immediates.overlay(&other.immediates);
    }

    pub fn validate(&self) -> Result<(), InvalidKind> {
        for role in Role::ALL {
            self.register(role).validate(role)?;
        }

        self.immediates.validate()?;

        match self.weight {
            Some(weight) if !(weight.is_finite() && weight >= 0.0) => {
                Err(InvalidKind::InvalidWeight(weight))
            }
            _ => Ok(()),
        }
    }
}

/// A named set of instructions sharing a layer.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Group {
    pub name: String,
    pub instructions: Vec<String>,
    pub constraints: Layer,
}

impl Group {
    #[must_use]
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.instructions.iter().any(|it| it == mnemonic)
    }
}

/// All constraint layers. Groups apply in the order they are listed.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintConfig {
    pub global: Layer,
    pub groups: Vec<Group>,
    pub overrides: BTreeMap<String, Layer>,
}

/// A window of load/store offsets: `size` consecutive values starting at `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OffsetRange {
    pub base: i32,
    pub size: u32,
}

impl OffsetRange {
    /// The full 12 bit signed offset range.
    pub const FULL: Self = Self { base: -2048, size: 4096 };

    #[must_use]
    pub const fn new(base: i32, size: u32) -> Self {
        Self { base, size }
    }

    /// `min..=max`, which must not be inverted.
    #[must_use]
    pub const fn from_bounds(min: i32, max: i32) -> Self {
        Self { base: min, size: (max as i64 - min as i64 + 1) as u32 }
    }

    #[must_use]
    pub const fn min(self) -> i32 {
        self.base
    }

    #[must_use]
    pub const fn max(self) -> i64 {
        self.base as i64 + self.size as i64 - 1
    }

    fn validate(self) -> Result<(), InvalidKind> {
        if self.size == 0 {
            return Err(InvalidKind::EmptyOffsetRange { base: self.base });
        }

        let (min, max) = (i64::from(self.min()), self.max());
        if min < -2048 || max > 2047 {
            return Err(InvalidKind::OffsetOutOfRange { min, max });
        }

        Ok(())
    }
}

impl Default for OffsetRange {
    fn default() -> Self {
        Self::FULL
    }
}

pub fn validate_offsets(ranges: &[OffsetRange]) -> Result<(), InvalidKind> {
    if ranges.is_empty() {
        return Err(InvalidKind::NoOffsetRanges);
    }

    ranges.iter().try_for_each(|it| it.validate())
}
