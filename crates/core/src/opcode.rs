//! Major opcodes, instruction formats, and the coarse groupings built on them.

use core::fmt;
use core::str::FromStr;

pub const LOAD: u8 = 0b000_0011;
pub const OP_IMM: u8 = 0b001_0011;
pub const AUIPC: u8 = 0b001_0111;
pub const STORE: u8 = 0b010_0011;
pub const OP: u8 = 0b011_0011;
pub const LUI: u8 = 0b011_0111;
pub const BRANCH: u8 = 0b110_0011;
pub const JALR: u8 = 0b110_0111;
pub const JAL: u8 = 0b110_1111;
pub const SYSTEM: u8 = 0b111_0011;

/// The six base encoding formats.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Format {
    pub const ALL: [Self; 6] = [Self::R, Self::I, Self::S, Self::B, Self::U, Self::J];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::R => "R",
            Self::I => "I",
            Self::S => "S",
            Self::B => "B",
            Self::U => "U",
            Self::J => "J",
        }
    }

    /// Width of the immediate field this format can carry, including implicit low bits.
    #[must_use]
    pub const fn immediate_capacity(self) -> u8 {
        match self {
            Self::R => 0,
            Self::I | Self::S => 12,
            Self::B => 13,
            Self::U => 20,
            Self::J => 21,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "R" | "r" => Ok(Self::R),
            "I" | "i" => Ok(Self::I),
            "S" | "s" => Ok(Self::S),
            "B" | "b" => Ok(Self::B),
            "U" | "u" => Ok(Self::U),
            "J" | "j" => Ok(Self::J),
            _ => Err(UnknownFormat(s.to_owned())),
        }
    }
}

/// Selection buckets: one per format, plus `Special` for operand-less system instructions.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Category {
    R,
    I,
    S,
    B,
    U,
    J,
    Special,
}

impl Category {
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] =
        [Self::R, Self::I, Self::S, Self::B, Self::U, Self::J, Self::Special];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::R => "R",
            Self::I => "I",
            Self::S => "S",
            Self::B => "B",
            Self::U => "U",
            Self::J => "J",
            Self::Special => "special",
        }
    }
}

impl From<Format> for Category {
    fn from(format: Format) -> Self {
        match format {
            Format::R => Self::R,
            Format::I => Self::I,
            Format::S => Self::S,
            Format::B => Self::B,
            Format::U => Self::U,
            Format::J => Self::J,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an instruction does with its operands.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Class {
    Alu,
    /// I-type with a 5 bit shift amount and `funct7` in bits 31:25.
    Shift,
    Load,
    Store,
    Branch,
    Jal,
    Jalr,
    Upper,
    /// No operands; the immediate field holds a fixed `funct12`.
    System,
}

impl Class {
    #[must_use]
    pub const fn default_for(format: Format) -> Self {
        match format {
            Format::R | Format::I => Self::Alu,
            Format::S => Self::Store,
            Format::B => Self::Branch,
            Format::U => Self::Upper,
            Format::J => Self::Jal,
        }
    }

    /// Whether an instruction of this class can be encoded in `format`.
    #[must_use]
    pub const fn admits(self, format: Format) -> bool {
        match self {
            Self::Alu => matches!(format, Format::R | Format::I),
            Self::Shift | Self::Load | Self::Jalr | Self::System => matches!(format, Format::I),
            Self::Store => matches!(format, Format::S),
            Self::Branch => matches!(format, Format::B),
            Self::Jal => matches!(format, Format::J),
            Self::Upper => matches!(format, Format::U),
        }
    }
}
