use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS};
use std::collections::HashMap;

#[test]
fn test_bit_register() {
    for register in ALL_REGISTERS {
        let ld_opcode = 0x06 | (register.to_opcode_bits() << 3);

        for bit in 0..8 {
            let bit_opcode = 0x40 | (bit << 3) | register.to_opcode_bits();

            // XOR A; LD <R>, 1 << bit; BIT <bit>, <R>
            run_test(
                &format!("AF{ld_opcode:02X}{:02X}CB{bit_opcode:02X}", 1_u8 << bit),
                &ExpectedState { f: Some(0x20), ..ExpectedState::empty() },
            );

            // XOR A; LD <R>, !(1 << bit); BIT <bit>, <R>
            run_test(
                &format!("AF{ld_opcode:02X}{:02X}CB{bit_opcode:02X}", !(1_u8 << bit)),
                &ExpectedState { f: Some(0xA0), ..ExpectedState::empty() },
            );
        }
    }
}

#[test]
fn test_bit_preserves_carry() {
    run_test(
        // SCF; LD H, 0x80; BIT 7, H
        "372680CB7C",
        &ExpectedState { f: Some(0x30), ..ExpectedState::empty() },
    );

    run_test(
        // XOR A; SCF; LD HL, 0xC000; LD (HL), 0xFE; BIT 0, (HL)
        "AF372100C036FECB46",
        &ExpectedState { f: Some(0xB0), ..ExpectedState::empty() },
    );
}

#[test]
fn set_and_reset_register() {
    for register in ALL_REGISTERS {
        let ld_opcode = 0x06 | (register.to_opcode_bits() << 3);
        // SET 3, <R>
        let set_opcode = 0xC0 | (3 << 3) | register.to_opcode_bits();
        // RES 7, <R>
        let res_opcode = 0x80 | (7 << 3) | register.to_opcode_bits();

        // LD <R>, 0x81; SET 3, <R>; RES 7, <R>
        let mut expected_state = ExpectedState { f: Some(0xB0), ..ExpectedState::empty() };
        set_in_state(&mut expected_state, register, 0x09);
        let program = format!("{ld_opcode:02X}81CB{set_opcode:02X}CB{res_opcode:02X}");
        run_test(&program, &expected_state);
    }
}

#[test]
fn set_and_reset_indirect_hl() {
    run_test(
        // LD HL, 0xC000; LD (HL), 0x10; SET 0, (HL); RES 4, (HL)
        "2100C03610CBC6CBA6",
        &ExpectedState { memory: hash_map! { 0xC000: 0x01 }, ..ExpectedState::empty() },
    );
}
