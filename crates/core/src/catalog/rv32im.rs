use crate::opcode;
use crate::spec::InstructionSpec;

const BASE: u8 = 0b000_0000;
const ALT: u8 = 0b010_0000;
const MULDIV: u8 = 0b000_0001;

pub(super) fn specs() -> Vec<InstructionSpec> {
    vec![
        InstructionSpec::r("add", 0b000, BASE),
        InstructionSpec::r("sub", 0b000, ALT),
        InstructionSpec::r("sll", 0b001, BASE),
        InstructionSpec::r("slt", 0b010, BASE),
        InstructionSpec::r("sltu", 0b011, BASE),
        InstructionSpec::r("xor", 0b100, BASE),
        InstructionSpec::r("srl", 0b101, BASE),
        InstructionSpec::r("sra", 0b101, ALT),
        InstructionSpec::r("or", 0b110, BASE),
        InstructionSpec::r("and", 0b111, BASE),
        InstructionSpec::r("mul", 0b000, MULDIV),
        InstructionSpec::r("mulh", 0b001, MULDIV),
        InstructionSpec::r("mulhsu", 0b010, MULDIV),
        InstructionSpec::r("mulhu", 0b011, MULDIV),
        InstructionSpec::r("div", 0b100, MULDIV),
        InstructionSpec::r("divu", 0b101, MULDIV),
        InstructionSpec::r("rem", 0b110, MULDIV),
        InstructionSpec::r("remu", 0b111, MULDIV),
        InstructionSpec::i("addi", 0b000),
        InstructionSpec::i("slti", 0b010),
        InstructionSpec::i("sltiu", 0b011),
        InstructionSpec::i("xori", 0b100),
        InstructionSpec::i("ori", 0b110),
        InstructionSpec::i("andi", 0b111),
        InstructionSpec::shift("slli", 0b001, BASE),
        InstructionSpec::shift("srli", 0b101, BASE),
        InstructionSpec::shift("srai", 0b101, ALT),
        InstructionSpec::load("lb", 0b000),
        InstructionSpec::load("lh", 0b001),
        InstructionSpec::load("lw", 0b010),
        InstructionSpec::load("lbu", 0b100),
        InstructionSpec::load("lhu", 0b101),
        InstructionSpec::jalr("jalr"),
        InstructionSpec::store("sb", 0b000),
        InstructionSpec::store("sh", 0b001),
        InstructionSpec::store("sw", 0b010),
        InstructionSpec::branch("beq", 0b000),
        InstructionSpec::branch("bne", 0b001),
        InstructionSpec::branch("blt", 0b100),
        InstructionSpec::branch("bge", 0b101),
        InstructionSpec::branch("bltu", 0b110),
        InstructionSpec::branch("bgeu", 0b111),
        InstructionSpec::upper("lui", opcode::LUI),
        InstructionSpec::upper("auipc", opcode::AUIPC),
        InstructionSpec::jal("jal"),
        InstructionSpec::system("ecall", 0),
        InstructionSpec::system("ebreak", 1),
    ]
}
