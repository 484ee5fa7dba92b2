#![forbid(unsafe_code)]
#![allow(clippy::match_bool)]
#![warn(clippy::must_use_candidate, clippy::clone_on_copy)]

use std::fmt;

pub mod catalog;
#[cfg(feature = "disassemble")]
pub mod disassemble;
pub mod instruction;
pub mod opcode;
pub mod register;
pub mod spec;

pub use catalog::{Catalog, CatalogError};
pub use instruction::{AsmOperand, EncodedInstruction, Operands, Role};
pub use opcode::{Category, Class, Format};
pub use register::{Register, RegisterSet};
pub use spec::{Descriptor, ImmShape, InstructionSpec};

/// Displays each element on its own line.
pub struct DisplayDeferSlice<'a, T: fmt::Display>(pub &'a [T]);

impl<T: fmt::Display> fmt::Display for DisplayDeferSlice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(first) = iter.next() {
            first.fmt(f)?;
            for item in iter {
                write!(f, "\n{item}")?;
            }
        }

        Ok(())
    }
}
