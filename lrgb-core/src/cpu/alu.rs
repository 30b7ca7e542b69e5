//! Arithmetic and flag computation. Every instruction that touches F goes through one of these
//! functions; each takes the F register by mutable reference and returns the computed result.

pub const ZERO_FLAG: u8 = 0x80;
pub const SUBTRACT_FLAG: u8 = 0x40;
pub const HALF_CARRY_FLAG: u8 = 0x20;
pub const CARRY_FLAG: u8 = 0x10;

/// Which encoding a rotate instruction came from. The unprefixed accumulator rotates (RLCA, RLA,
/// RRCA, RRA) always clear Z, while the CB-prefixed forms set Z from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateForm {
    Accumulator,
    Prefixed,
}

fn write_flags(flags: &mut u8, z: bool, n: bool, h: bool, c: bool) {
    *flags = (u8::from(z) << 7) | (u8::from(n) << 6) | (u8::from(h) << 5) | (u8::from(c) << 4);
}

fn write_some_flags(
    flags: &mut u8,
    z: Option<bool>,
    n: Option<bool>,
    h: Option<bool>,
    c: Option<bool>,
) {
    let masks = [(z, ZERO_FLAG), (n, SUBTRACT_FLAG), (h, HALF_CARRY_FLAG), (c, CARRY_FLAG)];
    for (value, mask) in masks {
        match value {
            Some(true) => {
                *flags |= mask;
            }
            Some(false) => {
                *flags &= !mask;
            }
            None => {}
        }
    }
}

/// ADD / ADC
pub fn add(flags: &mut u8, l_value: u8, r_value: u8, carry: bool) -> u8 {
    let carry = u8::from(carry);
    let sum = u16::from(l_value) + u16::from(r_value) + u16::from(carry);
    let h_flag = (l_value & 0x0F) + (r_value & 0x0F) + carry > 0x0F;
    let result = sum as u8;

    write_flags(flags, result == 0, false, h_flag, sum > 0xFF);

    result
}

/// SUB / SBC
pub fn sub(flags: &mut u8, l_value: u8, r_value: u8, carry: bool) -> u8 {
    let carry = u8::from(carry);
    let h_flag = l_value & 0x0F < (r_value & 0x0F) + carry;
    let c_flag = u16::from(l_value) < u16::from(r_value) + u16::from(carry);
    let result = l_value.wrapping_sub(r_value).wrapping_sub(carry);

    write_flags(flags, result == 0, true, h_flag, c_flag);

    result
}

/// CP: flags as SUB, result discarded
pub fn compare(flags: &mut u8, l_value: u8, r_value: u8) {
    sub(flags, l_value, r_value, false);
}

pub fn and(flags: &mut u8, l_value: u8, r_value: u8) -> u8 {
    let result = l_value & r_value;
    write_flags(flags, result == 0, false, true, false);
    result
}

pub fn or(flags: &mut u8, l_value: u8, r_value: u8) -> u8 {
    let result = l_value | r_value;
    write_flags(flags, result == 0, false, false, false);
    result
}

pub fn xor(flags: &mut u8, l_value: u8, r_value: u8) -> u8 {
    let result = l_value ^ r_value;
    write_flags(flags, result == 0, false, false, false);
    result
}

/// INC r / INC (HL). Leaves C untouched.
pub fn increment(flags: &mut u8, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    let h_flag = value & 0x0F == 0x0F;
    write_some_flags(flags, Some(result == 0), Some(false), Some(h_flag), None);
    result
}

/// DEC r / DEC (HL). Leaves C untouched.
pub fn decrement(flags: &mut u8, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    let h_flag = value & 0x0F == 0x00;
    write_some_flags(flags, Some(result == 0), Some(true), Some(h_flag), None);
    result
}

/// ADD HL, rr. Half carry out of bit 11, carry out of bit 15, Z untouched.
pub fn add_u16(flags: &mut u8, l_value: u16, r_value: u16) -> u16 {
    let (sum, c_flag) = l_value.overflowing_add(r_value);
    let h_flag = (l_value & 0x0FFF) + (r_value & 0x0FFF) > 0x0FFF;
    write_some_flags(flags, None, Some(false), Some(h_flag), Some(c_flag));
    sum
}

/// ADD SP, e and LD HL, SP+e. The flags come from an unsigned add of the offset's low byte to
/// the low byte of SP; Z is always cleared.
pub fn add_sp_offset(flags: &mut u8, sp: u16, offset: i8) -> u16 {
    let offset_byte = offset as u8;
    let h_flag = (sp & 0x000F) + u16::from(offset_byte & 0x0F) > 0x000F;
    let c_flag = (sp & 0x00FF) + u16::from(offset_byte) > 0x00FF;
    write_flags(flags, false, false, h_flag, c_flag);
    sp.wrapping_add_signed(offset.into())
}

/// DAA
pub fn decimal_adjust(flags: &mut u8, value: u8) -> u8 {
    let n_flag = *flags & SUBTRACT_FLAG != 0;
    let h_flag = *flags & HALF_CARRY_FLAG != 0;
    let c_flag = *flags & CARRY_FLAG != 0;

    let mut correction = 0x00;
    let result = if n_flag {
        if h_flag {
            correction |= 0x06;
        }
        if c_flag {
            correction |= 0x60;
        }
        value.wrapping_sub(correction)
    } else {
        if h_flag || value & 0x0F > 0x09 {
            correction |= 0x06;
        }
        if c_flag || value > 0x99 {
            correction |= 0x60;
        }
        value.wrapping_add(correction)
    };

    write_flags(flags, result == 0, n_flag, false, c_flag || correction & 0x60 != 0);

    result
}

fn write_shift_flags(flags: &mut u8, result: u8, carry: bool, form: RotateForm) {
    let z_flag = match form {
        RotateForm::Accumulator => false,
        RotateForm::Prefixed => result == 0,
    };
    write_flags(flags, z_flag, false, false, carry);
}

/// RLCA / RLC
pub fn rotate_left(flags: &mut u8, value: u8, form: RotateForm) -> u8 {
    let result = value.rotate_left(1);
    write_shift_flags(flags, result, value & 0x80 != 0, form);
    result
}

/// RLA / RL
pub fn rotate_left_thru_carry(flags: &mut u8, value: u8, form: RotateForm) -> u8 {
    let carry = *flags & CARRY_FLAG != 0;
    let result = (value << 1) | u8::from(carry);
    write_shift_flags(flags, result, value & 0x80 != 0, form);
    result
}

/// RRCA / RRC
pub fn rotate_right(flags: &mut u8, value: u8, form: RotateForm) -> u8 {
    let result = value.rotate_right(1);
    write_shift_flags(flags, result, value & 0x01 != 0, form);
    result
}

/// RRA / RR
pub fn rotate_right_thru_carry(flags: &mut u8, value: u8, form: RotateForm) -> u8 {
    let carry = *flags & CARRY_FLAG != 0;
    let result = (value >> 1) | (u8::from(carry) << 7);
    write_shift_flags(flags, result, value & 0x01 != 0, form);
    result
}

/// SLA
pub fn shift_left(flags: &mut u8, value: u8) -> u8 {
    let result = value << 1;
    write_shift_flags(flags, result, value & 0x80 != 0, RotateForm::Prefixed);
    result
}

/// SRA: bit 7 is preserved
pub fn arithmetic_shift_right(flags: &mut u8, value: u8) -> u8 {
    let result = (value >> 1) | (value & 0x80);
    write_shift_flags(flags, result, value & 0x01 != 0, RotateForm::Prefixed);
    result
}

/// SRL
pub fn logical_shift_right(flags: &mut u8, value: u8) -> u8 {
    let result = value >> 1;
    write_shift_flags(flags, result, value & 0x01 != 0, RotateForm::Prefixed);
    result
}

pub fn swap(flags: &mut u8, value: u8) -> u8 {
    let result = value.rotate_left(4);
    write_flags(flags, result == 0, false, false, false);
    result
}

/// BIT n: Z is set if the bit is clear. C is untouched.
pub fn test_bit(flags: &mut u8, value: u8, bit: u8) {
    let z_flag = value & (1 << bit) == 0;
    write_some_flags(flags, Some(z_flag), Some(false), Some(true), None);
}

/// CPL
pub fn complement(flags: &mut u8, value: u8) -> u8 {
    write_some_flags(flags, None, Some(true), Some(true), None);
    !value
}

/// SCF
pub fn set_carry(flags: &mut u8) {
    write_some_flags(flags, None, Some(false), Some(false), Some(true));
}

/// CCF
pub fn complement_carry(flags: &mut u8) {
    let carry = *flags & CARRY_FLAG != 0;
    write_some_flags(flags, None, Some(false), Some(false), Some(!carry));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_flags_full_input_space() {
        for a in 0..=u8::MAX {
            for b in 0..=u8::MAX {
                let mut flags = 0x00;
                let result = add(&mut flags, a, b, false);

                assert_eq!(a.wrapping_add(b), result);
                let carry = u16::from(a) + u16::from(b) > 0xFF;
                let half_carry = (a & 0x0F) + (b & 0x0F) > 0x0F;
                assert_eq!(carry, flags & CARRY_FLAG != 0, "{a:02X} + {b:02X}");
                assert_eq!(half_carry, flags & HALF_CARRY_FLAG != 0, "{a:02X} + {b:02X}");
                assert_eq!(result == 0, flags & ZERO_FLAG != 0);
                assert_eq!(0, flags & SUBTRACT_FLAG);
                assert_eq!(0, flags & 0x0F);
            }
        }
    }

    #[test]
    fn adc_includes_carry_in_both_flags() {
        let mut flags = 0x00;
        assert_eq!(0x10, add(&mut flags, 0x0F, 0x00, true));
        assert_eq!(HALF_CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x00, add(&mut flags, 0xFF, 0x00, true));
        assert_eq!(ZERO_FLAG | HALF_CARRY_FLAG | CARRY_FLAG, flags);
    }

    #[test]
    fn sub_self_is_zero() {
        for a in 0..=u8::MAX {
            let mut flags = CARRY_FLAG | HALF_CARRY_FLAG;
            assert_eq!(0, sub(&mut flags, a, a, false));
            assert_eq!(ZERO_FLAG | SUBTRACT_FLAG, flags, "{a:02X} - {a:02X}");
        }
    }

    #[test]
    fn sub_borrow_flags_full_input_space() {
        for a in 0..=u8::MAX {
            for b in 0..=u8::MAX {
                for borrow in [false, true] {
                    let mut flags = 0x00;
                    let result = sub(&mut flags, a, b, borrow);

                    let borrow_value = u8::from(borrow);
                    assert_eq!(a.wrapping_sub(b).wrapping_sub(borrow_value), result);
                    assert_eq!(
                        u16::from(a) < u16::from(b) + u16::from(borrow_value),
                        flags & CARRY_FLAG != 0
                    );
                    assert_eq!(
                        (a & 0x0F) < (b & 0x0F) + borrow_value,
                        flags & HALF_CARRY_FLAG != 0
                    );
                }
            }
        }
    }

    #[test]
    fn compare_leaves_operand_alone() {
        let mut flags = 0x00;
        compare(&mut flags, 0x3C, 0x40);
        assert_eq!(SUBTRACT_FLAG | CARRY_FLAG, flags);
    }

    #[test]
    fn logical_ops() {
        let mut flags = CARRY_FLAG;
        assert_eq!(0x00, and(&mut flags, 0xF0, 0x0F));
        assert_eq!(ZERO_FLAG | HALF_CARRY_FLAG, flags);

        let mut flags = 0xF0;
        assert_eq!(0xFF, or(&mut flags, 0xF0, 0x0F));
        assert_eq!(0x00, flags);

        let mut flags = 0xF0;
        assert_eq!(0x00, xor(&mut flags, 0x5A, 0x5A));
        assert_eq!(ZERO_FLAG, flags);
    }

    #[test]
    fn inc_dec_preserve_carry() {
        let mut flags = CARRY_FLAG;
        assert_eq!(0x00, increment(&mut flags, 0xFF));
        assert_eq!(ZERO_FLAG | HALF_CARRY_FLAG | CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x0F, decrement(&mut flags, 0x10));
        assert_eq!(SUBTRACT_FLAG | HALF_CARRY_FLAG, flags);

        let mut flags = CARRY_FLAG;
        assert_eq!(0x00, decrement(&mut flags, 0x01));
        assert_eq!(ZERO_FLAG | SUBTRACT_FLAG | CARRY_FLAG, flags);
    }

    #[test]
    fn add_u16_preserves_zero() {
        let mut flags = ZERO_FLAG | SUBTRACT_FLAG;
        assert_eq!(0x1000, add_u16(&mut flags, 0x0FFF, 0x0001));
        assert_eq!(ZERO_FLAG | HALF_CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x0000, add_u16(&mut flags, 0x8000, 0x8000));
        assert_eq!(CARRY_FLAG, flags);
    }

    #[test]
    fn sp_offset_flags_use_low_byte() {
        let mut flags = ZERO_FLAG;
        assert_eq!(0xFFF7, add_sp_offset(&mut flags, 0xFFF8, -1));
        assert_eq!(HALF_CARRY_FLAG | CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x0012, add_sp_offset(&mut flags, 0x0010, 2));
        assert_eq!(0x00, flags);

        let mut flags = 0x00;
        assert_eq!(0x0100, add_sp_offset(&mut flags, 0x00FF, 1));
        assert_eq!(HALF_CARRY_FLAG | CARRY_FLAG, flags);
    }

    #[test]
    fn decimal_adjust_after_add() {
        // 0x15 + 0x27 = 0x3C -> 42
        let mut flags = 0x00;
        let sum = add(&mut flags, 0x15, 0x27, false);
        assert_eq!(0x42, decimal_adjust(&mut flags, sum));
        assert_eq!(0x00, flags);

        // 0x99 + 0x01 = 0x9A -> 00 with carry
        let mut flags = 0x00;
        let sum = add(&mut flags, 0x99, 0x01, false);
        assert_eq!(0x00, decimal_adjust(&mut flags, sum));
        assert_eq!(ZERO_FLAG | CARRY_FLAG, flags);

        // 0x09 + 0x08 = 0x11 with half carry -> 17
        let mut flags = 0x00;
        let sum = add(&mut flags, 0x09, 0x08, false);
        assert_eq!(0x17, decimal_adjust(&mut flags, sum));
        assert_eq!(0x00, flags);
    }

    #[test]
    fn decimal_adjust_after_sub() {
        // 0x42 - 0x15 = 0x2D -> 27
        let mut flags = 0x00;
        let difference = sub(&mut flags, 0x42, 0x15, false);
        assert_eq!(0x27, decimal_adjust(&mut flags, difference));
        assert_eq!(SUBTRACT_FLAG, flags);

        // 0x10 - 0x20 = 0xF0 -> 90 with carry
        let mut flags = 0x00;
        let difference = sub(&mut flags, 0x10, 0x20, false);
        assert_eq!(0x90, decimal_adjust(&mut flags, difference));
        assert_eq!(SUBTRACT_FLAG | CARRY_FLAG, flags);

        // No threshold checks when subtracting
        let mut flags = SUBTRACT_FLAG;
        assert_eq!(0xAB, decimal_adjust(&mut flags, 0xAB));
        assert_eq!(SUBTRACT_FLAG, flags);
    }

    #[test]
    fn rotate_zero_flag_depends_on_form() {
        let mut flags = 0x00;
        assert_eq!(0x00, rotate_left(&mut flags, 0x00, RotateForm::Accumulator));
        assert_eq!(0x00, flags);

        let mut flags = 0x00;
        assert_eq!(0x00, rotate_left(&mut flags, 0x00, RotateForm::Prefixed));
        assert_eq!(ZERO_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x00, rotate_left_thru_carry(&mut flags, 0x80, RotateForm::Accumulator));
        assert_eq!(CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x00, rotate_left_thru_carry(&mut flags, 0x80, RotateForm::Prefixed));
        assert_eq!(ZERO_FLAG | CARRY_FLAG, flags);
    }

    #[test]
    fn rotates_through_carry() {
        let mut flags = CARRY_FLAG;
        assert_eq!(0x01, rotate_left_thru_carry(&mut flags, 0x00, RotateForm::Prefixed));
        assert_eq!(0x00, flags);

        let mut flags = CARRY_FLAG;
        assert_eq!(0xC0, rotate_right_thru_carry(&mut flags, 0x81, RotateForm::Prefixed));
        assert_eq!(CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x80, rotate_right(&mut flags, 0x01, RotateForm::Prefixed));
        assert_eq!(CARRY_FLAG, flags);
    }

    #[test]
    fn shifts_and_swap() {
        let mut flags = 0x00;
        assert_eq!(0x00, shift_left(&mut flags, 0x80));
        assert_eq!(ZERO_FLAG | CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0xC0, arithmetic_shift_right(&mut flags, 0x81));
        assert_eq!(CARRY_FLAG, flags);

        let mut flags = 0x00;
        assert_eq!(0x40, logical_shift_right(&mut flags, 0x81));
        assert_eq!(CARRY_FLAG, flags);

        let mut flags = CARRY_FLAG;
        assert_eq!(0x21, swap(&mut flags, 0x12));
        assert_eq!(0x00, flags);
    }

    #[test]
    fn bit_and_misc_flags() {
        let mut flags = CARRY_FLAG | SUBTRACT_FLAG;
        test_bit(&mut flags, 0x7F, 7);
        assert_eq!(ZERO_FLAG | HALF_CARRY_FLAG | CARRY_FLAG, flags);

        let mut flags = ZERO_FLAG;
        assert_eq!(0xA5, complement(&mut flags, 0x5A));
        assert_eq!(ZERO_FLAG | SUBTRACT_FLAG | HALF_CARRY_FLAG, flags);

        let mut flags = ZERO_FLAG | HALF_CARRY_FLAG;
        set_carry(&mut flags);
        assert_eq!(ZERO_FLAG | CARRY_FLAG, flags);
        complement_carry(&mut flags);
        assert_eq!(ZERO_FLAG, flags);
    }
}
