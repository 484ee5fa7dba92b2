use super::{Catalog, CatalogError};
use crate::opcode::{self, Category, Class, Format};
use crate::spec::{Descriptor, ImmShape, InstructionSpec};

fn descriptor(mnemonic: &str, format: &str, opcode: u32) -> Descriptor {
    Descriptor { mnemonic: mnemonic.to_owned(), format: format.to_owned(), opcode, ..Descriptor::default() }
}

#[test]
fn rv32im_contents() {
    let catalog = Catalog::rv32im();
    assert_eq!(catalog.len(), 47);

    let counts: Vec<_> =
        Category::ALL.iter().map(|&category| catalog.in_category(category).count()).collect();
    assert_eq!(counts, [18, 15, 3, 6, 2, 1, 2]);

    let ebreak = catalog.get("ebreak").unwrap();
    assert_eq!(ebreak.format(), Format::I);
    assert_eq!(ebreak.category(), Category::Special);
    assert_eq!(ebreak.funct12(), Some(1));
    assert!(catalog.get("fence").is_none());
}

#[test]
fn derived_roles() {
    let catalog = Catalog::rv32im();

    let sw = catalog.get("sw").unwrap();
    assert!(!sw.writes_rd() && sw.reads_rs1() && sw.reads_rs2());
    assert_eq!(sw.access_width(), Some(4));

    let lhu = catalog.get("lhu").unwrap();
    assert!(lhu.writes_rd() && lhu.reads_rs1() && !lhu.reads_rs2());
    assert_eq!(lhu.access_width(), Some(2));

    let auipc = catalog.get("auipc").unwrap();
    assert!(auipc.writes_rd() && !auipc.reads_rs1());

    let ecall = catalog.get("ecall").unwrap();
    assert!(!ecall.writes_rd() && !ecall.reads_rs1() && !ecall.is_straight_line());

    assert!(catalog.get("jalr").unwrap().is_control_transfer());
    assert!(catalog.get("mulhsu").unwrap().is_straight_line());
}

#[test]
fn opcode_index() {
    let catalog = Catalog::rv32im();
    let system: Vec<_> = catalog.with_opcode(opcode::SYSTEM).map(InstructionSpec::mnemonic).collect();
    assert_eq!(system, ["ecall", "ebreak"]);
    assert_eq!(catalog.with_opcode(0).count(), 0);
}

#[test]
fn from_descriptors() {
    let catalog = Catalog::from_descriptors([
        Descriptor { funct3: Some(0), funct7: Some(0), ..descriptor("add", "R", 0b011_0011) },
        Descriptor { imm: Some(ImmShape::U20), ..descriptor("lui", "u", 0b011_0111) },
    ])
    .unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get("lui").unwrap().class(), Class::Upper);
    assert_eq!(catalog.get("add").unwrap().class(), Class::Alu);
}

#[test]
fn unknown_format() {
    let err = Catalog::from_descriptors([descriptor("vadd", "V", 0b101_0111)]).unwrap_err();
    assert_eq!(err, CatalogError::UnknownFormat { mnemonic: "vadd".to_owned(), tag: "V".to_owned() });
}

#[test]
fn field_overflow() {
    let err = Catalog::from_descriptors([Descriptor {
        funct3: Some(8),
        funct7: Some(0),
        ..descriptor("add", "R", 0b011_0011)
    }])
    .unwrap_err();

    assert_eq!(err.to_string(), "`add`: funct3 value 0x8 does not fit in 3 bits");
}

#[test]
fn opcode_overflow() {
    let err = Catalog::from_descriptors([Descriptor {
        imm: Some(ImmShape::J21),
        ..descriptor("jal", "J", 0x80)
    }])
    .unwrap_err();

    assert!(matches!(err, CatalogError::FieldOverflow { field: "opcode", .. }));
}

#[test]
fn duplicate_mnemonic() {
    let err = Catalog::new([InstructionSpec::i("addi", 0), InstructionSpec::i("addi", 1)]).unwrap_err();
    assert_eq!(err, CatalogError::DuplicateMnemonic("addi".to_owned()));
}

#[test]
fn overlapping_encoding() {
    let err = Catalog::new([InstructionSpec::i("addi", 0), InstructionSpec::shift("slli", 0, 0)])
        .unwrap_err();

    assert_eq!(
        err,
        CatalogError::OverlappingEncoding { first: "addi".to_owned(), second: "slli".to_owned() }
    );
}

#[test]
fn system_entries_need_distinct_funct12() {
    let err = Catalog::new([InstructionSpec::system("ecall", 0), InstructionSpec::system("trap", 0)])
        .unwrap_err();

    assert!(matches!(err, CatalogError::OverlappingEncoding { .. }));
}

#[test]
fn immediate_range_must_fit() {
    let wide = ImmShape { max: 4096, ..ImmShape::I12 };
    let err = Catalog::new([InstructionSpec::i("addi", 0).with_imm(wide)]).unwrap_err();

    assert_eq!(
        err,
        CatalogError::ImmediateRange { mnemonic: "addi".to_owned(), min: -2048, max: 4096, bits: 12 }
    );
}

#[test]
fn immediate_wider_than_format() {
    let err = Catalog::new([InstructionSpec::i("addi", 0).with_imm(ImmShape::B13)]).unwrap_err();
    assert!(matches!(err, CatalogError::ImmediateShape { .. }));
}

#[test]
fn missing_fields() {
    let err = Catalog::new([InstructionSpec::new("add", Format::R, Class::Alu, opcode::OP).with_funct3(0)])
        .unwrap_err();

    assert_eq!(
        err,
        CatalogError::MissingField { mnemonic: "add".to_owned(), format: Format::R, field: "funct7" }
    );

    let err = Catalog::new([InstructionSpec::new("addi", Format::I, Class::Alu, opcode::OP_IMM).with_funct3(0)])
        .unwrap_err();

    assert!(matches!(err, CatalogError::MissingField { field: "immediate", .. }));
}

#[test]
fn class_mismatch() {
    let err = Catalog::new([InstructionSpec::new("sw", Format::I, Class::Store, opcode::STORE)])
        .unwrap_err();

    assert!(matches!(err, CatalogError::ClassMismatch { class: Class::Store, .. }));
}
