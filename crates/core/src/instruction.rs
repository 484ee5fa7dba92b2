use core::fmt;

use crate::opcode::{Class, Format};
use crate::register::Register;
use crate::spec::InstructionSpec;

/// A register operand position.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Role {
    Rd,
    Rs1,
    Rs2,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Rd, Self::Rs1, Self::Rs2];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rd => "rd",
            Self::Rs1 => "rs1",
            Self::Rs2 => "rs2",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand values for one instruction.
///
/// Which fields are meaningful depends on the instruction's format and class;
/// [`Operands::masked`] drops the rest.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Default)]
pub struct Operands {
    pub rd: Option<Register>,
    pub rs1: Option<Register>,
    pub rs2: Option<Register>,
    pub imm: Option<i32>,
}

impl Operands {
    #[must_use]
    pub const fn get(&self, role: Role) -> Option<Register> {
        match role {
            Role::Rd => self.rd,
            Role::Rs1 => self.rs1,
            Role::Rs2 => self.rs2,
        }
    }

    pub fn set(&mut self, role: Role, register: Register) {
        match role {
            Role::Rd => self.rd = Some(register),
            Role::Rs1 => self.rs1 = Some(register),
            Role::Rs2 => self.rs2 = Some(register),
        }
    }

    /// Normalizes to exactly what `spec`'s encoding can carry: unused roles are cleared,
    /// used-but-missing roles become `x0`, and the immediate is truncated to its field.
    #[must_use]
    pub fn masked(self, spec: &InstructionSpec) -> Self {
        let role = |role: Role| spec.uses(role).then(|| self.get(role).unwrap_or(Register::ZERO));

        Self {
            rd: role(Role::Rd),
            rs1: role(Role::Rs1),
            rs2: role(Role::Rs2),
            imm: spec.imm().map(|shape| shape.truncate(self.imm.unwrap_or(0))),
        }
    }
}

/// An operand as it appears in assembly.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum AsmOperand {
    Register(Register),
    Immediate(i32),
    /// `offset(base)`
    Memory { offset: i32, base: Register },
}

impl fmt::Display for AsmOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(register) => register.fmt(f),
            Self::Immediate(imm) => imm.fmt(f),
            Self::Memory { offset, base } => write!(f, "{offset}({base})"),
        }
    }
}

/// A 32 bit instruction word together with the catalog entry and operands it encodes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EncodedInstruction<'c> {
    word: u32,
    spec: &'c InstructionSpec,
    operands: Operands,
}

impl<'c> EncodedInstruction<'c> {
    /// `operands` must already be masked for `spec` and agree with `word`;
    /// the encoder and decoder are the intended callers.
    #[must_use]
    pub const fn from_parts(word: u32, spec: &'c InstructionSpec, operands: Operands) -> Self {
        Self { word, spec, operands }
    }

    #[must_use]
    pub const fn word(&self) -> u32 {
        self.word
    }

    #[must_use]
    pub const fn spec(&self) -> &'c InstructionSpec {
        self.spec
    }

    #[must_use]
    pub fn mnemonic(&self) -> &'c str {
        self.spec.mnemonic()
    }

    #[must_use]
    pub const fn operands(&self) -> &Operands {
        &self.operands
    }

    /// The architecturally written register; writes to `x0` are discarded by the hardware.
    #[must_use]
    pub fn destination(&self) -> Option<Register> {
        self.operands.rd.filter(|it| !it.is_zero())
    }

    pub fn sources(&self) -> impl Iterator<Item = Register> + use<> {
        [self.operands.rs1, self.operands.rs2].into_iter().flatten()
    }

    #[must_use]
    pub fn reads(&self, register: Register) -> bool {
        self.sources().any(|it| it == register)
    }

    #[must_use]
    pub fn writes(&self, register: Register) -> bool {
        self.destination() == Some(register)
    }

    /// Operands in assembly order, e.g. `rs2, imm(rs1)` for stores.
    #[must_use]
    pub fn asm_operands(&self) -> Vec<AsmOperand> {
        let Operands { rd, rs1, rs2, imm } = self.operands;
        let rd = AsmOperand::Register(rd.unwrap_or(Register::ZERO));
        let rs1_reg = rs1.unwrap_or(Register::ZERO);
        let rs1 = AsmOperand::Register(rs1_reg);
        let rs2 = AsmOperand::Register(rs2.unwrap_or(Register::ZERO));
        let offset = imm.unwrap_or(0);
        let imm = AsmOperand::Immediate(offset);
        let memory = AsmOperand::Memory { offset, base: rs1_reg };

        match (self.spec.class(), self.spec.format()) {
            (Class::Alu, Format::R) => vec![rd, rs1, rs2],
            (Class::Alu | Class::Shift, _) => vec![rd, rs1, imm],
            (Class::Load | Class::Jalr, _) => vec![rd, memory],
            (Class::Store, _) => vec![rs2, memory],
            (Class::Branch, _) => vec![rs1, rs2, imm],
            (Class::Upper | Class::Jal, _) => vec![rd, imm],
            (Class::System, _) => Vec::new(),
        }
    }
}
