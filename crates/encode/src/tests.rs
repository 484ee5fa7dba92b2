use proptest::prelude::*;
use rtg_core::{Catalog, ImmShape, InstructionSpec, Operands, Register};

fn encode(mnemonic: &str, rd: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let spec = Catalog::rv32im().get(mnemonic).unwrap();
    let operands = Operands {
        rd: Register::new(rd),
        rs1: Register::new(rs1),
        rs2: Register::new(rs2),
        imm: Some(imm),
    };

    super::instruction(spec, &operands)
}

#[test]
fn known_words() {
    assert_eq!(encode("add", 1, 2, 3, 0), 0x0031_00b3);
    assert_eq!(encode("addi", 1, 0, 0, -1), 0xfff0_0093);
    assert_eq!(encode("srai", 1, 2, 0, 3), 0x4031_5093);
    assert_eq!(encode("sw", 0, 1, 2, 8), 0x0020_a423);
    assert_eq!(encode("beq", 0, 0, 0, -4), 0xfe00_0ee3);
    assert_eq!(encode("lui", 5, 0, 0, 0x12345), 0x1234_52b7);
    assert_eq!(encode("jal", 1, 0, 0, 2048), 0x0010_00ef);
    assert_eq!(encode("mul", 10, 11, 12, 0), 0x02c5_8533);
}

#[test]
fn system() {
    assert_eq!(encode("ecall", 1, 2, 3, 7), 0x0000_0073);
    assert_eq!(encode("ebreak", 0, 0, 0, 0), 0x0010_0073);
}

#[test]
fn truncates_out_of_range() {
    // 4096 is 1 << 12, which doesn't survive a 12 bit field.
    assert_eq!(encode("addi", 1, 0, 0, 4096), encode("addi", 1, 0, 0, 0));
    // shamt is 5 bits, the 6th must not leak into funct7.
    assert_eq!(encode("slli", 1, 1, 0, 33), encode("slli", 1, 1, 0, 1));
    // branch offsets lose their low bit.
    assert_eq!(encode("bne", 0, 1, 2, 7), encode("bne", 0, 1, 2, 6));
}

#[test]
fn encoded_keeps_masked_operands() {
    let spec = Catalog::rv32im().get("lui").unwrap();
    let operands =
        Operands { rd: Some(Register::A0), rs1: Some(Register::A1), rs2: None, imm: Some(-1) };

    let encoded = super::encoded(spec, &operands);
    assert_eq!(encoded.word(), 0xffff_f537);
    assert_eq!(
        *encoded.operands(),
        Operands { rd: Some(Register::A0), rs1: None, rs2: None, imm: Some(0xf_ffff) }
    );
}

#[test]
fn signed_shift_amount_keeps_funct7() {
    let shape = ImmShape { bits: 5, signed: true, alignment: 1, min: -16, max: 15 };
    let catalog = Catalog::new([InstructionSpec::shift("slli", 0b001, 0).with_imm(shape)]).unwrap();
    let spec = catalog.get("slli").unwrap();

    let operands =
        Operands { rd: Some(Register::RA), rs1: Some(Register::SP), rs2: None, imm: Some(-1) };
    let word = super::instruction(spec, &operands);
    assert_eq!(word, 0x01f1_1093);

    let decoded = rtg_decode::instruction(&catalog, word).unwrap();
    assert_eq!(decoded.mnemonic(), "slli");
    assert_eq!(decoded.operands().imm, Some(-1));
}

proptest! {
    #[test]
    fn roundtrip(
        index in 0..Catalog::rv32im().len(),
        rd in 0_u8..32,
        rs1 in 0_u8..32,
        rs2 in 0_u8..32,
        imm in any::<i32>(),
    ) {
        let catalog = Catalog::rv32im();
        let spec = catalog.iter().nth(index).unwrap();
        let operands = Operands {
            rd: Register::new(rd),
            rs1: Register::new(rs1),
            rs2: Register::new(rs2),
            imm: Some(imm),
        };

        let word = super::instruction(spec, &operands);
        let decoded = rtg_decode::instruction(catalog, word).unwrap();

        prop_assert_eq!(decoded.mnemonic(), spec.mnemonic());
        prop_assert_eq!(*decoded.operands(), operands.masked(spec));
    }
}

#[test]
#[ignore = "test is very slow"]
fn roundtrip_all() {
    let catalog = Catalog::rv32im();
    for raw in 0_u32..=u32::MAX {
        if let Ok(instruction) = rtg_decode::instruction(catalog, raw) {
            let res = super::instruction(instruction.spec(), instruction.operands());

            assert!(raw == res, "roundtrip failed ({raw:032b} != {res:032b}): {instruction:?}");
        }
    }
}
