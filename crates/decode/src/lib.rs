#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
#![forbid(unsafe_code)]

use rtg_core::{Catalog, EncodedInstruction, Format, InstructionSpec, Operands, Register};

mod error;
mod imm;
pub use error::DecodeError;

#[inline]
const fn decode_register(instruction: u32) -> Register {
    Register::from_bits(instruction)
}

#[must_use]
fn decode_rs(instruction: u32) -> (Register, Register) {
    let rs1 = decode_register(instruction >> 15);
    let rs2 = decode_register(instruction >> 20);
    (rs1, rs2)
}

#[must_use]
fn decode_rd(instruction: u32) -> Register {
    decode_register(instruction >> 7)
}

fn matches(spec: &InstructionSpec, instruction: u32) -> bool {
    let funct3 = ((instruction >> 12) & 0b111) as u8;
    let funct7 = (instruction >> 25) as u8;
    let funct12 = (instruction >> 20) as u16;

    let system = match spec.funct12() {
        Some(it) => {
            let (rs1, _) = decode_rs(instruction);
            it == funct12 && decode_rd(instruction).is_zero() && rs1.is_zero()
        }
        None => true,
    };

    spec.funct3().is_none_or(|it| it == funct3) && spec.funct7().is_none_or(|it| it == funct7) && system
}

/// Finds the catalog entry `instruction` encodes and recovers its operands.
pub fn instruction(catalog: &Catalog, instruction: u32) -> Result<EncodedInstruction<'_>, DecodeError> {
    let opcode = (instruction & 0x7f) as u8;

    let spec = catalog
        .with_opcode(opcode)
        .find(|spec| matches(spec, instruction))
        .ok_or(DecodeError::UnknownEncoding(instruction))?;

    let imm = match spec.format() {
        Format::R => None,
        Format::I => Some(imm::i(instruction)),
        Format::S => Some(imm::s(instruction)),
        Format::B => Some(imm::b(instruction)),
        Format::U => Some(imm::u(instruction)),
        Format::J => Some(imm::j(instruction)),
    };

    let (rs1, rs2) = decode_rs(instruction);
    let operands = Operands {
        rd: Some(decode_rd(instruction)),
        rs1: Some(rs1),
        rs2: Some(rs2),
        imm: imm.map(|it| it as i32),
    };

    Ok(EncodedInstruction::from_parts(instruction, spec, operands.masked(spec)))
}

#[cfg(test)]
mod test {
    use rtg_core::{Catalog, Operands, Register};

    use crate::DecodeError;

    fn decode(instruction: u32) -> (&'static str, Operands) {
        let decoded = super::instruction(Catalog::rv32im(), instruction).unwrap();
        (decoded.mnemonic(), *decoded.operands())
    }

    fn regs(rd: Option<Register>, rs1: Option<Register>, rs2: Option<Register>, imm: Option<i32>) -> Operands {
        Operands { rd, rs1, rs2, imm }
    }

    #[test]
    fn decode_add() {
        let expected = regs(Some(Register::RA), Some(Register::SP), Some(Register::GP), None);
        assert_eq!(decode(0x0031_00b3), ("add", expected));
    }

    #[test]
    fn decode_negative_i() {
        let expected = regs(Some(Register::RA), Some(Register::ZERO), None, Some(-1));
        assert_eq!(decode(0xfff0_0093), ("addi", expected));
    }

    #[test]
    fn decode_shifts() {
        assert_eq!(decode(0x4031_5093).0, "srai");
        assert_eq!(decode(0x0031_5093).0, "srli");
        assert_eq!(decode(0x4031_5093).1.imm, Some(3));
    }

    #[test]
    fn decode_store() {
        let expected = regs(None, Some(Register::RA), Some(Register::SP), Some(8));
        assert_eq!(decode(0x0020_a423), ("sw", expected));
    }

    #[test]
    fn decode_branch() {
        let expected = regs(None, Some(Register::ZERO), Some(Register::ZERO), Some(-4));
        assert_eq!(decode(0xfe00_0ee3), ("beq", expected));
    }

    #[test]
    fn decode_upper_and_jump() {
        assert_eq!(decode(0x1234_52b7), ("lui", regs(Some(Register::T0), None, None, Some(0x12345))));
        assert_eq!(decode(0x0010_00ef), ("jal", regs(Some(Register::RA), None, None, Some(2048))));
    }

    #[test]
    fn decode_ebreak() {
        assert_eq!(decode(0x0010_0073), ("ebreak", Operands::default()));
        assert_eq!(decode(0x0000_0073), ("ecall", Operands::default()));
    }

    #[test]
    fn unknown() {
        let catalog = Catalog::rv32im();
        for raw in [0, u32::MAX, 0x0431_00b3, 0x0000_00f3, 0x0020_f423] {
            assert_eq!(super::instruction(catalog, raw), Err(DecodeError::UnknownEncoding(raw)));
        }
    }
}
