use crate::memory::address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    /// Decode the 3-bit register field at bits 5-3 of an opcode. Returns None for the (HL)
    /// encoding.
    pub fn from_mid_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits((opcode >> 3) & 0x07)
    }

    /// Decode the 3-bit register field at bits 2-0 of an opcode. Returns None for the (HL)
    /// encoding.
    pub fn from_low_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode & 0x07)
    }

    fn from_opcode_bits(bits: u8) -> Option<Self> {
        match bits {
            0x00 => Some(Self::B),
            0x01 => Some(Self::C),
            0x02 => Some(Self::D),
            0x03 => Some(Self::E),
            0x04 => Some(Self::H),
            0x05 => Some(Self::L),
            0x07 => Some(Self::A),
            _ => None,
        }
    }

    pub fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegisterPair {
    AF,
    BC,
    DE,
    HL,
    SP,
}

/// The LR35902 register file. Only the upper nibble of `flags` is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl CpuRegisters {
    /// Create a register file holding the values the boot ROM leaves behind when it hands control
    /// to the cartridge entry point.
    pub fn new() -> Self {
        Self {
            accumulator: 0x01,
            flags: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: address::ENTRY_POINT,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_hl(&mut self, hl: u16) {
        let [h, l] = hl.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        *self.get_register_mut(register) = value;
    }

    pub fn get_register_mut(&mut self, register: CpuRegister) -> &mut u8 {
        match register {
            CpuRegister::A => &mut self.accumulator,
            CpuRegister::B => &mut self.b,
            CpuRegister::C => &mut self.c,
            CpuRegister::D => &mut self.d,
            CpuRegister::E => &mut self.e,
            CpuRegister::H => &mut self.h,
            CpuRegister::L => &mut self.l,
        }
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::AF => self.af(),
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
        }
    }

    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        match register_pair {
            CpuRegisterPair::AF => {
                let [a, f] = value.to_be_bytes();
                self.accumulator = a;
                // The lower 4 bits of F are hardwired to 0
                self.flags = f & 0xF0;
            }
            CpuRegisterPair::BC => {
                let [b, c] = value.to_be_bytes();
                self.b = b;
                self.c = c;
            }
            CpuRegisterPair::DE => {
                let [d, e] = value.to_be_bytes();
                self.d = d;
                self.e = e;
            }
            CpuRegisterPair::HL => {
                self.set_hl(value);
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
        }
    }

    pub fn zero_flag(&self) -> bool {
        self.flags & 0x80 != 0
    }

    pub fn subtract_flag(&self) -> bool {
        self.flags & 0x40 != 0
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags & 0x20 != 0
    }

    pub fn carry_flag(&self) -> bool {
        self.flags & 0x10 != 0
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}
