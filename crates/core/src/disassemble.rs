use core::fmt;

use crate::instruction::EncodedInstruction;

/// Renders an instruction as assembly, e.g. `lw x1, -4(x2)`.
pub struct FmtInstruction<'a, 'c> {
    instruction: &'a EncodedInstruction<'c>,
}

impl<'a, 'c> FmtInstruction<'a, 'c> {
    #[must_use]
    pub const fn new(instruction: &'a EncodedInstruction<'c>) -> Self {
        Self { instruction }
    }
}

impl fmt::Display for FmtInstruction<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instruction.mnemonic())?;

        let mut operands = self.instruction.asm_operands().into_iter();
        if let Some(first) = operands.next() {
            write!(f, " {first}")?;
            for operand in operands {
                write!(f, ", {operand}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for EncodedInstruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FmtInstruction::new(self).fmt(f)
    }
}
