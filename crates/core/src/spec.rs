use crate::instruction::Role;
use crate::opcode::{self, Category, Class, Format};

/// Shape of an instruction's immediate operand.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct ImmShape {
    /// Encodable width, counting implicit low zero bits (13 for branches, 21 for `jal`).
    pub bits: u8,
    pub signed: bool,
    pub alignment: u32,
    pub min: i32,
    pub max: i32,
}

#[must_use]
pub const fn sign_extend(value: u32, bits: u8) -> i32 {
    let shift = 32 - bits as u32;
    ((value << shift) as i32) >> shift
}

impl ImmShape {
    pub const I12: Self = Self { bits: 12, signed: true, alignment: 1, min: -2048, max: 2047 };
    pub const SHAMT: Self = Self { bits: 5, signed: false, alignment: 1, min: 0, max: 31 };
    pub const B13: Self = Self { bits: 13, signed: true, alignment: 2, min: -4096, max: 4094 };
    pub const U20: Self = Self { bits: 20, signed: false, alignment: 1, min: 0, max: 0xf_ffff };
    pub const J21: Self =
        Self { bits: 21, signed: true, alignment: 2, min: -1_048_576, max: 1_048_574 };

    /// The widest range a field of this shape can hold.
    #[must_use]
    pub const fn representable(self) -> (i64, i64) {
        let bits = self.bits as u32;
        match self.signed {
            true => (-(1 << (bits - 1)), (1 << (bits - 1)) - 1),
            false => (0, (1 << bits) - 1),
        }
    }

    #[must_use]
    pub const fn mask(self) -> u32 {
        u32::MAX >> (32 - self.bits as u32)
    }

    /// Reduces `value` to what the field can carry: masked to width, alignment bits cleared,
    /// then sign-extended for signed fields.
    #[must_use]
    pub const fn truncate(self, value: i32) -> i32 {
        let raw = (value as u32) & self.mask() & !(self.alignment - 1);
        match self.signed {
            true => sign_extend(raw, self.bits),
            false => raw as i32,
        }
    }

    #[must_use]
    pub const fn contains(self, value: i32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// One catalog entry.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct InstructionSpec {
    mnemonic: String,
    format: Format,
    class: Class,
    opcode: u8,
    funct3: Option<u8>,
    funct7: Option<u8>,
    funct12: Option<u16>,
    imm: Option<ImmShape>,
}

impl InstructionSpec {
    #[must_use]
    pub fn new(mnemonic: impl Into<String>, format: Format, class: Class, opcode: u8) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            format,
            class,
            opcode,
            funct3: None,
            funct7: None,
            funct12: None,
            imm: None,
        }
    }

    #[must_use]
    pub fn with_funct3(mut self, funct3: u8) -> Self {
        self.funct3 = Some(funct3);
        self
    }

    #[must_use]
    pub fn with_funct7(mut self, funct7: u8) -> Self {
        self.funct7 = Some(funct7);
        self
    }

    #[must_use]
    pub fn with_funct12(mut self, funct12: u16) -> Self {
        self.funct12 = Some(funct12);
        self
    }

    #[must_use]
    pub fn with_imm(mut self, imm: ImmShape) -> Self {
        self.imm = Some(imm);
        self
    }

    #[must_use]
    pub fn r(mnemonic: impl Into<String>, funct3: u8, funct7: u8) -> Self {
        Self::new(mnemonic, Format::R, Class::Alu, opcode::OP).with_funct3(funct3).with_funct7(funct7)
    }

    #[must_use]
    pub fn i(mnemonic: impl Into<String>, funct3: u8) -> Self {
        Self::new(mnemonic, Format::I, Class::Alu, opcode::OP_IMM)
            .with_funct3(funct3)
            .with_imm(ImmShape::I12)
    }

    #[must_use]
    pub fn shift(mnemonic: impl Into<String>, funct3: u8, funct7: u8) -> Self {
        Self::new(mnemonic, Format::I, Class::Shift, opcode::OP_IMM)
            .with_funct3(funct3)
            .with_funct7(funct7)
            .with_imm(ImmShape::SHAMT)
    }

    #[must_use]
    pub fn load(mnemonic: impl Into<String>, funct3: u8) -> Self {
        Self::new(mnemonic, Format::I, Class::Load, opcode::LOAD)
            .with_funct3(funct3)
            .with_imm(ImmShape::I12)
    }

    #[must_use]
    pub fn store(mnemonic: impl Into<String>, funct3: u8) -> Self {
        Self::new(mnemonic, Format::S, Class::Store, opcode::STORE)
            .with_funct3(funct3)
            .with_imm(ImmShape::I12)
    }

    #[must_use]
    pub fn branch(mnemonic: impl Into<String>, funct3: u8) -> Self {
        Self::new(mnemonic, Format::B, Class::Branch, opcode::BRANCH)
            .with_funct3(funct3)
            .with_imm(ImmShape::B13)
    }

    #[must_use]
    pub fn upper(mnemonic: impl Into<String>, opcode: u8) -> Self {
        Self::new(mnemonic, Format::U, Class::Upper, opcode).with_imm(ImmShape::U20)
    }

    #[must_use]
    pub fn jal(mnemonic: impl Into<String>) -> Self {
        Self::new(mnemonic, Format::J, Class::Jal, opcode::JAL).with_imm(ImmShape::J21)
    }

    #[must_use]
    pub fn jalr(mnemonic: impl Into<String>) -> Self {
        Self::new(mnemonic, Format::I, Class::Jalr, opcode::JALR)
            .with_funct3(0)
            .with_imm(ImmShape::I12)
    }

    #[must_use]
    pub fn system(mnemonic: impl Into<String>, funct12: u16) -> Self {
        Self::new(mnemonic, Format::I, Class::System, opcode::SYSTEM)
            .with_funct3(0)
            .with_funct12(funct12)
    }

    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub const fn class(&self) -> Class {
        self.class
    }

    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    #[must_use]
    pub const fn funct3(&self) -> Option<u8> {
        self.funct3
    }

    #[must_use]
    pub const fn funct7(&self) -> Option<u8> {
        self.funct7
    }

    #[must_use]
    pub const fn funct12(&self) -> Option<u16> {
        self.funct12
    }

    #[must_use]
    pub const fn imm(&self) -> Option<ImmShape> {
        self.imm
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        match self.class {
            Class::System => Category::Special,
            _ => match self.format {
                Format::R => Category::R,
                Format::I => Category::I,
                Format::S => Category::S,
                Format::B => Category::B,
                Format::U => Category::U,
                Format::J => Category::J,
            },
        }
    }

    #[must_use]
    pub const fn writes_rd(&self) -> bool {
        match self.format {
            Format::R | Format::U | Format::J => true,
            Format::I => !matches!(self.class, Class::System),
            Format::S | Format::B => false,
        }
    }

    #[must_use]
    pub const fn reads_rs1(&self) -> bool {
        match self.format {
            Format::R | Format::S | Format::B => true,
            Format::I => !matches!(self.class, Class::System),
            Format::U | Format::J => false,
        }
    }

    #[must_use]
    pub const fn reads_rs2(&self) -> bool {
        matches!(self.format, Format::R | Format::S | Format::B)
    }

    #[must_use]
    pub const fn uses(&self, role: Role) -> bool {
        match role {
            Role::Rd => self.writes_rd(),
            Role::Rs1 => self.reads_rs1(),
            Role::Rs2 => self.reads_rs2(),
        }
    }

    /// Bytes touched by a load or store, taken from the low bits of `funct3`.
    #[must_use]
    pub const fn access_width(&self) -> Option<u8> {
        match (self.class, self.funct3) {
            (Class::Load | Class::Store, Some(funct3)) => Some(1 << (funct3 & 0b11)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_control_transfer(&self) -> bool {
        matches!(self.class, Class::Branch | Class::Jal | Class::Jalr)
    }

    /// Neither transfers control nor traps.
    #[must_use]
    pub const fn is_straight_line(&self) -> bool {
        !self.is_control_transfer() && !matches!(self.class, Class::System)
    }
}

/// An already-parsed catalog entry as supplied by an external table.
///
/// Numeric fields are wider than the fields they describe so that over-wide values can be
/// reported instead of silently truncated.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Descriptor {
    pub mnemonic: String,
    pub format: String,
    pub class: Option<Class>,
    pub opcode: u32,
    pub funct3: Option<u32>,
    pub funct7: Option<u32>,
    pub funct12: Option<u32>,
    pub imm: Option<ImmShape>,
}
