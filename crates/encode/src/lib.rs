#![allow(clippy::cast_sign_loss)]
#![forbid(unsafe_code)]

use rtg_core::{EncodedInstruction, Format, ImmShape, InstructionSpec, Operands, Register};

#[inline]
const fn encode_register(register: Option<Register>) -> u32 {
    match register {
        None => 0,
        Some(it) => it.get() as u32,
    }
}

#[must_use]
fn encode_rs(rs1: Option<Register>, rs2: Option<Register>) -> u32 {
    let rs1 = encode_register(rs1) << 15;
    let rs2 = encode_register(rs2) << 20;

    rs1 | rs2
}

#[must_use]
fn encode_rd(rd: Option<Register>) -> u32 {
    encode_register(rd) << 7
}

// each of these take an immediate that has already been truncated to its field.

fn i_imm(spec: &InstructionSpec, imm: u32) -> u32 {
    // a narrower field (shamt) shares its upper bits with funct7.
    let mask = spec.imm().map_or(0xfff, ImmShape::mask);

    match spec.funct12() {
        Some(funct12) => u32::from(funct12) << 20,
        None => (imm & mask & 0xfff) << 20,
    }
}

fn s_imm(imm: u32) -> u32 {
    ((imm & 0xfe0) << 20) | ((imm & 0b1_1111) << 7)
}

fn b_imm(imm: u32) -> u32 {
    ((imm & 0x1000) << 19) | ((imm & 0x7e0) << 20) | ((imm & 0x800) >> 4) | ((imm & 0x1e) << 7)
}

fn u_imm(imm: u32) -> u32 {
    (imm & 0xf_ffff) << 12
}

fn j_imm(imm: u32) -> u32 {
    ((imm & 0x10_0000) << 11) | ((imm & 0x7fe) << 20) | ((imm & 0x800) << 9) | (imm & 0xf_f000)
}

/// Encodes `operands` as an instance of `spec`.
///
/// This never fails: values that don't fit their field are truncated, exactly as
/// [`Operands::masked`] describes.
#[must_use]
pub fn instruction(spec: &InstructionSpec, operands: &Operands) -> u32 {
    let Operands { rd, rs1, rs2, imm } = operands.masked(spec);
    let imm = imm.unwrap_or(0) as u32;

    let opcode = u32::from(spec.opcode());
    let funct3 = spec.funct3().map_or(0, |it| u32::from(it) << 12);
    let funct7 = spec.funct7().map_or(0, |it| u32::from(it) << 25);

    let fields = match spec.format() {
        Format::R => encode_rd(rd) | encode_rs(rs1, rs2),
        Format::I => encode_rd(rd) | encode_rs(rs1, None) | i_imm(spec, imm),
        Format::S => encode_rs(rs1, rs2) | s_imm(imm),
        Format::B => encode_rs(rs1, rs2) | b_imm(imm),
        Format::U => encode_rd(rd) | u_imm(imm),
        Format::J => encode_rd(rd) | j_imm(imm),
    };

    opcode | funct3 | funct7 | fields
}

/// Like [`instruction`], but keeps the entry and the (masked) operands alongside the word.
#[must_use]
pub fn encoded<'c>(spec: &'c InstructionSpec, operands: &Operands) -> EncodedInstruction<'c> {
    let word = instruction(spec, operands);
    EncodedInstruction::from_parts(word, spec, operands.masked(spec))
}

#[cfg(test)]
mod tests;
