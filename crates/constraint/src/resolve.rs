use std::iter;

use rtg_core::{Format, Register, RegisterSet, Role};

use crate::error::{InvalidConstraint, InvalidKind, Scope};
use crate::layer::{ConstraintConfig, Group, ImmediateConstraint, ImmediateConstraints, Layer, RegisterConstraint};

/// The registers one operand role may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDomain {
    pub min: u8,
    pub max: u8,
    pub exclude_zero: bool,
    pub allowed: Option<RegisterSet>,
}

impl Default for RegisterDomain {
    fn default() -> Self {
        Self { min: 0, max: Register::COUNT - 1, exclude_zero: false, allowed: None }
    }
}

impl RegisterDomain {
    #[must_use]
    pub fn contains(&self, register: Register) -> bool {
        (self.min..=self.max).contains(&register.get())
            && !(self.exclude_zero && register.is_zero())
            && self.allowed.is_none_or(|it| it.contains(register))
    }

    pub fn candidates(&self) -> impl Iterator<Item = Register> + '_ {
        Register::all().filter(|it| self.contains(*it))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates().next().is_none()
    }

    fn resolve(constraint: &RegisterConstraint, role: Role) -> Result<Self, InvalidKind> {
        let default = Self::default();
        let min = constraint.min.unwrap_or(default.min);
        let max = constraint.max.unwrap_or(default.max);

        if min > max {
            return Err(InvalidKind::InvertedRegisterRange { role, min, max });
        }

        let allowed = constraint
            .allowed
            .as_ref()
            .map(|it| it.iter().filter_map(|&index| Register::new(index)).collect());

        let domain =
            Self { min, max, exclude_zero: constraint.exclude_zero.unwrap_or(false), allowed };

        match domain.is_empty() {
            true => Err(InvalidKind::EmptyRegisterDomain { role }),
            false => Ok(domain),
        }
    }
}

/// Fully merged constraints for one instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    pub rd: RegisterDomain,
    pub rs1: RegisterDomain,
    pub rs2: RegisterDomain,
    pub immediates: ImmediateConstraints,
    pub weight: f64,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            rd: RegisterDomain::default(),
            rs1: RegisterDomain::default(),
            rs2: RegisterDomain::default(),
            immediates: ImmediateConstraints::default(),
            weight: 1.0,
        }
    }
}

impl ConstraintSet {
    #[must_use]
    pub const fn register(&self, role: Role) -> &RegisterDomain {
        match role {
            Role::Rd => &self.rd,
            Role::Rs1 => &self.rs1,
            Role::Rs2 => &self.rs2,
        }
    }

    #[must_use]
    pub const fn immediate(&self, format: Format) -> Option<&ImmediateConstraint> {
        self.immediates.get(format)
    }

    fn from_merged(merged: &Layer, weight: f64) -> Result<Self, InvalidKind> {
        merged.immediates.validate()?;

        Ok(Self {
            rd: RegisterDomain::resolve(&merged.rd, Role::Rd)?,
            rs1: RegisterDomain::resolve(&merged.rs1, Role::Rs1)?,
            rs2: RegisterDomain::resolve(&merged.rs2, Role::Rs2)?,
            immediates: merged.immediates.clone(),
            weight,
        })
    }
}

/// Merges `global`, then each of `groups` in order, then `over` into the constraints for
/// `mnemonic`. For every field the most specific layer that sets it wins; weights multiply.
///
/// Every layer is checked before it's applied, and the merged result is checked again, so
/// a set is only produced if nothing along the way was malformed.
pub fn resolve(
    mnemonic: &str,
    global: &Layer,
    groups: &[&Group],
    over: Option<&Layer>,
) -> Result<ConstraintSet, InvalidConstraint> {
    let layers = iter::once((Scope::Global, global))
        .chain(groups.iter().map(|group| (Scope::Group(group.name.clone()), &group.constraints)))
        .chain(over.map(|layer| (Scope::Override(mnemonic.to_owned()), layer)));

    let mut merged = Layer::default();
    let mut weight = 1.0;

    for (scope, layer) in layers {
        layer.validate().map_err(|kind| InvalidConstraint::new(scope, kind))?;
        merged.overlay(layer);
        weight *= layer.weight.unwrap_or(1.0);
    }

    let set = ConstraintSet::from_merged(&merged, weight)
        .map_err(|kind| InvalidConstraint::new(Scope::Resolved(mnemonic.to_owned()), kind))?;

    tracing::trace!(mnemonic, groups = groups.len(), weight, "resolved constraints");

    Ok(set)
}

impl ConstraintConfig {
    /// Groups listing `mnemonic`, in definition order.
    pub fn groups_for<'a>(&'a self, mnemonic: &'a str) -> impl Iterator<Item = &'a Group> {
        self.groups.iter().filter(move |group| group.contains(mnemonic))
    }

    pub fn resolve(&self, mnemonic: &str) -> Result<ConstraintSet, InvalidConstraint> {
        let groups: Vec<_> = self.groups_for(mnemonic).collect();
        resolve(mnemonic, &self.global, &groups, self.overrides.get(mnemonic))
    }

    /// Checks every layer, including those no instruction ends up using.
    pub fn validate(&self) -> Result<(), InvalidConstraint> {
        let layers = iter::once((Scope::Global, &self.global))
            .chain(self.groups.iter().map(|it| (Scope::Group(it.name.clone()), &it.constraints)))
            .chain(self.overrides.iter().map(|(name, it)| (Scope::Override(name.clone()), it)));

        for (scope, layer) in layers {
            layer.validate().map_err(|kind| InvalidConstraint::new(scope, kind))?;
        }

        Ok(())
    }

    /// Every mnemonic a group or override refers to, with where it was named.
    pub fn referenced(&self) -> impl Iterator<Item = (Scope, &str)> {
        let groups = self.groups.iter().flat_map(|group| {
            group.instructions.iter().map(move |it| (Scope::Group(group.name.clone()), it.as_str()))
        });

        let overrides =
            self.overrides.keys().map(|name| (Scope::Override(name.clone()), name.as_str()));

        groups.chain(overrides)
    }
}
