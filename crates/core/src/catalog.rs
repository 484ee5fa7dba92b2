//! The instruction catalog: every instruction the generator knows, indexed by mnemonic and
//! by major opcode.

use std::sync::OnceLock;

use fnv::FnvHashMap;
use thiserror::Error;

use crate::opcode::{Category, Class, Format};
use crate::spec::{Descriptor, ImmShape, InstructionSpec};

mod rv32im;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CatalogError {
    #[error("`{0}` is listed more than once")]
    DuplicateMnemonic(String),

    #[error("`{first}` and `{second}` share an encoding")]
    OverlappingEncoding { first: String, second: String },

    #[error("`{mnemonic}`: unknown format `{tag}`")]
    UnknownFormat { mnemonic: String, tag: String },

    #[error("`{mnemonic}`: {field} value {value:#x} does not fit in {bits} bits")]
    FieldOverflow { mnemonic: String, field: &'static str, value: u32, bits: u8 },

    #[error("`{mnemonic}`: format {format} requires {field}")]
    MissingField { mnemonic: String, format: Format, field: &'static str },

    #[error("`{mnemonic}`: {field} is not part of a {class:?} instruction in format {format}")]
    UnexpectedField { mnemonic: String, format: Format, class: Class, field: &'static str },

    #[error("`{mnemonic}`: {class:?} instructions cannot be encoded in format {format}")]
    ClassMismatch { mnemonic: String, format: Format, class: Class },

    #[error("`{mnemonic}`: immediate shape is invalid: {reason}")]
    ImmediateShape { mnemonic: String, reason: &'static str },

    #[error("`{mnemonic}`: immediate range {min}..={max} does not fit the {bits} bit field")]
    ImmediateRange { mnemonic: String, min: i32, max: i32, bits: u8 },
}

fn narrow<T: TryFrom<u32>>(
    mnemonic: &str,
    field: &'static str,
    value: u32,
    bits: u8,
) -> Result<T, CatalogError> {
    match value >> bits {
        0 => T::try_from(value).map_err(|_| CatalogError::FieldOverflow {
            mnemonic: mnemonic.to_owned(),
            field,
            value,
            bits,
        }),
        _ => Err(CatalogError::FieldOverflow { mnemonic: mnemonic.to_owned(), field, value, bits }),
    }
}

impl TryFrom<Descriptor> for InstructionSpec {
    type Error = CatalogError;

    fn try_from(descriptor: Descriptor) -> Result<Self, Self::Error> {
        let Descriptor { mnemonic, format, class, opcode, funct3, funct7, funct12, imm } =
            descriptor;

        let format: Format = format
            .parse()
            .map_err(|_| CatalogError::UnknownFormat { mnemonic: mnemonic.clone(), tag: format })?;

        let class = class.unwrap_or(Class::default_for(format));
        let opcode = narrow(&mnemonic, "opcode", opcode, 7)?;
        let funct3 = funct3.map(|it| narrow(&mnemonic, "funct3", it, 3)).transpose()?;
        let funct7 = funct7.map(|it| narrow(&mnemonic, "funct7", it, 7)).transpose()?;
        let funct12 = funct12.map(|it| narrow(&mnemonic, "funct12", it, 12)).transpose()?;

        let mut spec = Self::new(mnemonic, format, class, opcode);
        if let Some(funct3) = funct3 {
            spec = spec.with_funct3(funct3);
        }
        if let Some(funct7) = funct7 {
            spec = spec.with_funct7(funct7);
        }
        if let Some(funct12) = funct12 {
            spec = spec.with_funct12(funct12);
        }
        if let Some(imm) = imm {
            spec = spec.with_imm(imm);
        }

        Ok(spec)
    }
}

fn validate(spec: &InstructionSpec) -> Result<(), CatalogError> {
    let mnemonic = || spec.mnemonic().to_owned();
    let format = spec.format();
    let class = spec.class();

    if !class.admits(format) {
        return Err(CatalogError::ClassMismatch { mnemonic: mnemonic(), format, class });
    }

    if spec.opcode() > 0x7f {
        return Err(CatalogError::FieldOverflow {
            mnemonic: mnemonic(),
            field: "opcode",
            value: spec.opcode().into(),
            bits: 7,
        });
    }

    let overflow = |field, value: u32, bits| {
        (value >> bits != 0).then(|| CatalogError::FieldOverflow {
            mnemonic: mnemonic(),
            field,
            value,
            bits,
        })
    };

    let fields = [
        ("funct3", spec.funct3().map(u32::from), 3),
        ("funct7", spec.funct7().map(u32::from), 7),
        ("funct12", spec.funct12().map(u32::from), 12),
    ];

    for (field, value, bits) in fields {
        if let Some(err) = value.and_then(|value| overflow(field, value, bits)) {
            return Err(err);
        }
    }

    let wants_funct3 = matches!(format, Format::R | Format::I | Format::S | Format::B);
    let wants_funct7 = format == Format::R || class == Class::Shift;
    let wants_funct12 = class == Class::System;
    let wants_imm = format != Format::R && class != Class::System;

    let presence = [
        ("funct3", wants_funct3, spec.funct3().is_some()),
        ("funct7", wants_funct7, spec.funct7().is_some()),
        ("funct12", wants_funct12, spec.funct12().is_some()),
        ("immediate", wants_imm, spec.imm().is_some()),
    ];

    for (field, wanted, present) in presence {
        match (wanted, present) {
            (true, false) => {
                return Err(CatalogError::MissingField { mnemonic: mnemonic(), format, field });
            }
            (false, true) => {
                return Err(CatalogError::UnexpectedField {
                    mnemonic: mnemonic(),
                    format,
                    class,
                    field,
                });
            }
            _ => {}
        }
    }

    if let Some(shape) = spec.imm() {
        validate_shape(spec, shape)?;
    }

    Ok(())
}

fn validate_shape(spec: &InstructionSpec, shape: ImmShape) -> Result<(), CatalogError> {
    let invalid =
        |reason| Err(CatalogError::ImmediateShape { mnemonic: spec.mnemonic().to_owned(), reason });

    let capacity = match spec.class() {
        Class::Shift => 5,
        _ => spec.format().immediate_capacity(),
    };

    if shape.bits == 0 || shape.bits > capacity {
        return invalid("bit width does not fit the format's immediate field");
    }

    if !shape.alignment.is_power_of_two() {
        return invalid("alignment must be a power of two");
    }

    if u64::from(shape.alignment) >= 1 << shape.bits {
        return invalid("alignment is wider than the field");
    }

    let (lo, hi) = shape.representable();
    if shape.min > shape.max || i64::from(shape.min) < lo || i64::from(shape.max) > hi {
        return Err(CatalogError::ImmediateRange {
            mnemonic: spec.mnemonic().to_owned(),
            min: shape.min,
            max: shape.max,
            bits: shape.bits,
        });
    }

    Ok(())
}

/// `None` matches anything, so two entries overlap unless some field is defined by both
/// and differs.
fn overlaps(a: &InstructionSpec, b: &InstructionSpec) -> bool {
    fn compatible<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    a.opcode() == b.opcode()
        && compatible(a.funct3(), b.funct3())
        && compatible(a.funct7(), b.funct7())
        && compatible(a.funct12(), b.funct12())
}

#[derive(Debug)]
pub struct Catalog {
    specs: Vec<InstructionSpec>,
    by_mnemonic: FnvHashMap<String, usize>,
    by_opcode: FnvHashMap<u8, Vec<usize>>,
}

impl Catalog {
    pub fn new(specs: impl IntoIterator<Item = InstructionSpec>) -> Result<Self, CatalogError> {
        let specs: Vec<_> = specs.into_iter().collect();

        let mut by_mnemonic = FnvHashMap::default();
        let mut by_opcode: FnvHashMap<u8, Vec<usize>> = FnvHashMap::default();

        for (idx, spec) in specs.iter().enumerate() {
            validate(spec)?;

            if by_mnemonic.insert(spec.mnemonic().to_owned(), idx).is_some() {
                return Err(CatalogError::DuplicateMnemonic(spec.mnemonic().to_owned()));
            }

            let same_opcode = by_opcode.entry(spec.opcode()).or_default();
            if let Some(&other) = same_opcode.iter().find(|&&other| overlaps(&specs[other], spec)) {
                return Err(CatalogError::OverlappingEncoding {
                    first: specs[other].mnemonic().to_owned(),
                    second: spec.mnemonic().to_owned(),
                });
            }

            same_opcode.push(idx);
        }

        tracing::debug!(instructions = specs.len(), "catalog built");

        Ok(Self { specs, by_mnemonic, by_opcode })
    }

    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = Descriptor>,
    ) -> Result<Self, CatalogError> {
        let specs = descriptors
            .into_iter()
            .map(InstructionSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(specs)
    }

    /// The RV32I base set plus the M extension.
    #[must_use]
    pub fn rv32im() -> &'static Self {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();

        CATALOG.get_or_init(|| Self::new(rv32im::specs()).expect("built-in catalog is valid"))
    }

    #[must_use]
    pub fn get(&self, mnemonic: &str) -> Option<&InstructionSpec> {
        self.by_mnemonic.get(mnemonic).map(|&idx| &self.specs[idx])
    }

    #[must_use]
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.by_mnemonic.contains_key(mnemonic)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InstructionSpec> {
        self.specs.iter()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &InstructionSpec> {
        self.specs.iter().filter(move |spec| spec.category() == category)
    }

    /// Entries sharing a major opcode, in catalog order.
    pub fn with_opcode(&self, opcode: u8) -> impl Iterator<Item = &InstructionSpec> {
        self.by_opcode.get(&opcode).into_iter().flatten().map(|&idx| &self.specs[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a InstructionSpec;
    type IntoIter = std::slice::Iter<'a, InstructionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests;
