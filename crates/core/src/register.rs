use core::fmt;

/// An integer register, `x0..=x31`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Register(u8);

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}", self.0)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

// all of these functions are super trivial and should *always* be inlined.
#[allow(clippy::inline_always)]
impl Register {
    #[inline(always)]
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        match index < Self::COUNT {
            true => Some(Self(index)),
            false => None,
        }
    }

    /// Takes the low 5 bits of `bits`, as found in an instruction's register fields.
    #[inline(always)]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self((bits & 0b1_1111) as u8)
    }

    #[inline(always)]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..Self::COUNT).map(Self)
    }

    pub const COUNT: u8 = 32;

    pub const ZERO: Self = Self(0);
    pub const RA: Self = Self(1);
    pub const SP: Self = Self(2);
    pub const GP: Self = Self(3);
    pub const TP: Self = Self(4);
    pub const T0: Self = Self(5);
    pub const T1: Self = Self(6);
    pub const T2: Self = Self(7);
    pub const S0: Self = Self(8);
    pub const S1: Self = Self(9);
    pub const A0: Self = Self(10);
    pub const A1: Self = Self(11);
    pub const A2: Self = Self(12);
    pub const A3: Self = Self(13);
    pub const A4: Self = Self(14);
    pub const A5: Self = Self(15);
    pub const A6: Self = Self(16);
    pub const A7: Self = Self(17);
    pub const S2: Self = Self(18);
    pub const S3: Self = Self(19);
    pub const S4: Self = Self(20);
    pub const S5: Self = Self(21);
    pub const S6: Self = Self(22);
    pub const S7: Self = Self(23);
    pub const S8: Self = Self(24);
    pub const S9: Self = Self(25);
    pub const S10: Self = Self(26);
    pub const S11: Self = Self(27);
    pub const T3: Self = Self(28);
    pub const T4: Self = Self(29);
    pub const T5: Self = Self(30);
    pub const T6: Self = Self(31);

    /// Callee-saved registers, in the order a prologue saves them.
    pub const SAVED: [Self; 12] = [
        Self::S0,
        Self::S1,
        Self::S2,
        Self::S3,
        Self::S4,
        Self::S5,
        Self::S6,
        Self::S7,
        Self::S8,
        Self::S9,
        Self::S10,
        Self::S11,
    ];

    pub const ARGUMENTS: [Self; 8] =
        [Self::A0, Self::A1, Self::A2, Self::A3, Self::A4, Self::A5, Self::A6, Self::A7];
}

/// A set of registers stored as a 32 bit membership mask.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct RegisterSet(u32);

impl RegisterSet {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn of(register: Register) -> Self {
        Self(1 << register.0)
    }

    #[must_use]
    pub const fn with(self, register: Register) -> Self {
        Self(self.0 | (1 << register.0))
    }

    pub fn insert(&mut self, register: Register) {
        self.0 |= 1 << register.0;
    }

    #[must_use]
    pub const fn contains(self, register: Register) -> bool {
        self.0 & (1 << register.0) != 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Register> {
        Register::all().filter(move |it| self.contains(*it))
    }
}

impl FromIterator<Register> for RegisterSet {
    fn from_iter<I: IntoIterator<Item = Register>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for RegisterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
