// raw immediate fields, implicit low bits included; sign extension is left to the entry's shape.

pub(crate) const fn i(instruction: u32) -> u32 {
    (instruction >> 20) & 0x0fff
}

pub(crate) const fn s(instruction: u32) -> u32 {
    ((instruction >> 20) & 0b1111_1110_0000) | ((instruction >> 7) & 0b0000_0001_1111)
}

pub(crate) const fn b(instruction: u32) -> u32 {
    ((instruction >> 19) & 0b0001_0000_0000_0000)
        | ((instruction >> 20) & 0b0000_0111_1110_0000)
        | ((instruction << 4) & 0b0000_1000_0000_0000)
        | ((instruction >> 7) & 0b0000_0000_0001_1110)
}

pub(crate) const fn u(instruction: u32) -> u32 {
    instruction >> 12
}

pub(crate) const fn j(instruction: u32) -> u32 {
    // abbb_bbbb_bbbc_dddd_dddd_xxxx_xxxx_xxxx -> 000a_dddd_dddd_cbbb_bbbb_bbb0
    ((instruction >> 11) & 0b0001_0000_0000_0000_0000_0000)
        | ((instruction >> 20) & 0b0000_0000_0000_0111_1111_1110)
        | ((instruction >> 9) & 0b0000_0000_0000_1000_0000_0000)
        | (instruction & 0b0000_1111_1111_0000_0000_0000)
}
