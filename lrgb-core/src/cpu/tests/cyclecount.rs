use super::run_cycle_test;
use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

#[test]
fn loads() {
    // NOP
    assert_eq!(4, run_cycle_test("00"));
    // LD B, C
    assert_eq!(4, run_cycle_test("41"));
    // LD B, 0x45
    assert_eq!(8, run_cycle_test("0645"));
    // LD B, (HL)
    assert_eq!(8, run_cycle_test("46"));
    // LD HL, 0xC000; LD (HL), 0x45
    assert_eq!(12 + 12, run_cycle_test("2100C03645"));
    // LD A, (BC)
    assert_eq!(8, run_cycle_test("0A"));
    // LD A, (HL+)
    assert_eq!(8, run_cycle_test("2A"));
    // LD A, (0xC000)
    assert_eq!(16, run_cycle_test("FA00C0"));
    // LD (0xC000), A
    assert_eq!(16, run_cycle_test("EA00C0"));
    // LDH (0x80), A
    assert_eq!(12, run_cycle_test("E080"));
    // LDH A, (0x80)
    assert_eq!(12, run_cycle_test("F080"));
    // LDH (C), A
    assert_eq!(8, run_cycle_test("E2"));
    // LD DE, 0x1234
    assert_eq!(12, run_cycle_test("113412"));
    // LD (0xC000), SP
    assert_eq!(20, run_cycle_test("0800C0"));
    // LD SP, HL
    assert_eq!(8, run_cycle_test("F9"));
    // LD HL, SP+1
    assert_eq!(12, run_cycle_test("F801"));
    // PUSH BC
    assert_eq!(16, run_cycle_test("C5"));
    // POP BC
    assert_eq!(12, run_cycle_test("C1"));
}

#[test]
fn arithmetic() {
    // ADD B
    assert_eq!(4, run_cycle_test("80"));
    // ADD 0x01
    assert_eq!(8, run_cycle_test("C601"));
    // CP (HL)
    assert_eq!(8, run_cycle_test("BE"));
    // INC B
    assert_eq!(4, run_cycle_test("04"));
    // LD HL, 0xC000; INC (HL)
    assert_eq!(12 + 12, run_cycle_test("2100C034"));
    // INC BC
    assert_eq!(8, run_cycle_test("03"));
    // ADD HL, DE
    assert_eq!(8, run_cycle_test("19"));
    // ADD SP, 0x02
    assert_eq!(16, run_cycle_test("E802"));
    // DAA
    assert_eq!(4, run_cycle_test("27"));
    // CPL
    assert_eq!(4, run_cycle_test("2F"));
}

#[test]
fn bit_operations() {
    // RLCA
    assert_eq!(4, run_cycle_test("07"));
    // RLC B
    assert_eq!(8, run_cycle_test("CB00"));
    // LD HL, 0xC000; RLC (HL)
    assert_eq!(12 + 16, run_cycle_test("2100C0CB06"));
    // BIT 0, B
    assert_eq!(8, run_cycle_test("CB40"));
    // BIT 0, (HL)
    assert_eq!(12, run_cycle_test("CB46"));
    // LD HL, 0xC000; SET 0, (HL)
    assert_eq!(12 + 16, run_cycle_test("2100C0CBC6"));
    // RES 7, A
    assert_eq!(8, run_cycle_test("CBBF"));
}

#[test]
fn unconditional_control_flow() {
    // JP 0x0153
    assert_eq!(16, run_cycle_test("C35301"));
    // LD HL, 0x0154; JP HL
    assert_eq!(12 + 4, run_cycle_test("215401E9"));
    // JR +0
    assert_eq!(12, run_cycle_test("1800"));
    // CALL 0x0155 (returns via RET), then JR +1 to the end
    assert_eq!(24 + 16 + 12, run_cycle_test("CD55011801C9"));
}

#[test]
fn conditional_control_flow() {
    // XOR A; JR NZ, +0 (not taken)
    assert_eq!(4 + 8, run_cycle_test("AF2000"));
    // XOR A; JR Z, +0 (taken)
    assert_eq!(4 + 12, run_cycle_test("AF2800"));

    // XOR A; JP NZ, 0x0154 (not taken)
    assert_eq!(4 + 12, run_cycle_test("AFC25401"));
    // XOR A; JP Z, 0x0154 (taken)
    assert_eq!(4 + 16, run_cycle_test("AFCA5401"));

    // XOR A; CALL NZ, 0x0154 (not taken)
    assert_eq!(4 + 12, run_cycle_test("AFC45401"));

    // 0150: CALL 0x0155
    // 0153: JR +2
    // 0155: XOR A
    // 0156: RET Z (taken)
    assert_eq!(24 + 4 + 20 + 12, run_cycle_test("CD55011802AFC8"));

    // 0150: CALL 0x0155
    // 0153: JR +3
    // 0155: XOR A
    // 0156: RET NZ (not taken)
    // 0157: RET
    assert_eq!(24 + 4 + 8 + 16 + 12, run_cycle_test("CD55011803AFC0C9"));
}

#[test]
fn control_flow_costs_depend_on_flags() {
    let mut registers = CpuRegisters::new();
    registers.flags = 0x00;

    assert_eq!(24, Instruction::CallCond(JumpCondition::NZ, 0x1234).cycles_required(&registers));
    assert_eq!(12, Instruction::CallCond(JumpCondition::Z, 0x1234).cycles_required(&registers));
    assert_eq!(20, Instruction::ReturnCond(JumpCondition::NC).cycles_required(&registers));
    assert_eq!(8, Instruction::ReturnCond(JumpCondition::C).cycles_required(&registers));

    registers.flags = 0x10;
    assert_eq!(16, Instruction::JumpCond(JumpCondition::C, 0x1234).cycles_required(&registers));
    assert_eq!(12, Instruction::JumpCond(JumpCondition::NC, 0x1234).cycles_required(&registers));
}

#[test]
fn fixed_costs() {
    let registers = CpuRegisters::new();

    for (instruction, expected) in [
        (Instruction::RestartCall(0x38), 16),
        (Instruction::ReturnFromInterruptHandler, 16),
        (Instruction::Halt, 4),
        (Instruction::Stop, 4),
        (Instruction::EnableInterrupts, 4),
        (Instruction::DisableInterrupts, 4),
        (Instruction::PushStack(CpuRegisterPair::AF), 16),
        (Instruction::Swap(ModifyTarget::Register(CpuRegister::E)), 8),
        (Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Accumulator), 8),
        (Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Accumulator), 8),
        (Instruction::RotateRightThruCarry(ModifyTarget::Accumulator), 4),
    ] {
        assert_eq!(expected, instruction.cycles_required(&registers), "{instruction:?}");
    }
}
