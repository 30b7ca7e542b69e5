use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("undefined opcode {opcode:02X} at address {pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}

// Reads instruction operands, tracking where the next instruction starts
struct OperandReader<'a> {
    address_space: &'a AddressSpace,
    pc: u16,
}

impl OperandReader<'_> {
    fn next_u8(&mut self) -> u8 {
        let value = self.address_space.read_address_u8(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn next_i8(&mut self) -> i8 {
        self.next_u8() as i8
    }

    fn next_u16(&mut self) -> u16 {
        let value = self.address_space.read_address_u16(self.pc);
        self.pc = self.pc.wrapping_add(2);
        value
    }
}

/// Decode the instruction at `pc`, returning it along with the address of the instruction that
/// follows it.
///
/// If `halt_bug_triggered` is set, the opcode fetch does not advance PC, so the opcode byte is
/// read a second time as the first operand byte (or as the next opcode for 1-byte instructions).
///
/// # Errors
///
/// Returns [`ParseError::InvalidOpcode`] for the 11 opcodes that the LR35902 leaves undefined.
pub fn parse_next_instruction(
    address_space: &AddressSpace,
    pc: u16,
    halt_bug_triggered: bool,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc);

    let operand_start = if halt_bug_triggered { pc } else { pc.wrapping_add(1) };
    let mut operands = OperandReader { address_space, pc: operand_start };

    let instruction = match opcode {
        0x76 => Instruction::Halt,
        0x40..=0x7F => Instruction::Load(write_target_mid(opcode), read_target_low(opcode)),
        0x80..=0xBF => alu_instruction(opcode, read_target_low(opcode)),
        0xCB => parse_cb_prefixed_opcode(operands.next_u8()),
        _ => parse_other_opcode(opcode, &mut operands)
            .ok_or(ParseError::InvalidOpcode { opcode, pc })?,
    };

    Ok((instruction, operands.pc))
}

// 0x00-0x3F and 0xC0-0xFF, minus the CB prefix
fn parse_other_opcode(opcode: u8, operands: &mut OperandReader<'_>) -> Option<Instruction> {
    let instruction = match opcode {
        0x00 => Instruction::NoOp,
        0x01 | 0x11 | 0x21 | 0x31 => Instruction::LoadRegisterPairImmediate(
            register_pair(opcode, CpuRegisterPair::SP),
            operands.next_u16(),
        ),
        0x02 => Instruction::Load(WriteTarget::IndirectBC, ReadTarget::Accumulator),
        0x12 => Instruction::Load(WriteTarget::IndirectDE, ReadTarget::Accumulator),
        0x22 => Instruction::Load(WriteTarget::IndirectHLInc, ReadTarget::Accumulator),
        0x32 => Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Accumulator),
        0x0A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectBC),
        0x1A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectDE),
        0x2A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLInc),
        0x3A => Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLDec),
        0x03 | 0x13 | 0x23 | 0x33 => {
            Instruction::IncRegisterPair(register_pair(opcode, CpuRegisterPair::SP))
        }
        0x0B | 0x1B | 0x2B | 0x3B => {
            Instruction::DecRegisterPair(register_pair(opcode, CpuRegisterPair::SP))
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            Instruction::AddHLRegister(register_pair(opcode, CpuRegisterPair::SP))
        }
        opcode if opcode <= 0x3F && opcode & 0x07 == 0x04 => {
            Instruction::Increment(modify_target_mid(opcode))
        }
        opcode if opcode <= 0x3F && opcode & 0x07 == 0x05 => {
            Instruction::Decrement(modify_target_mid(opcode))
        }
        opcode if opcode <= 0x3F && opcode & 0x07 == 0x06 => {
            Instruction::Load(write_target_mid(opcode), ReadTarget::Immediate(operands.next_u8()))
        }
        0x07 => Instruction::RotateLeft(ModifyTarget::Accumulator),
        0x0F => Instruction::RotateRight(ModifyTarget::Accumulator),
        0x17 => Instruction::RotateLeftThruCarry(ModifyTarget::Accumulator),
        0x1F => Instruction::RotateRightThruCarry(ModifyTarget::Accumulator),
        0x08 => Instruction::LoadDirectStackPointer(operands.next_u16()),
        0x10 => {
            // STOP is followed by a padding byte
            operands.next_u8();
            Instruction::Stop
        }
        0x18 => Instruction::RelativeJump(operands.next_i8()),
        0x20 | 0x28 | 0x30 | 0x38 => {
            Instruction::RelativeJumpCond(jump_condition(opcode), operands.next_i8())
        }
        0x27 => Instruction::DecimalAdjustAccumulator,
        0x2F => Instruction::ComplementAccumulator,
        0x37 => Instruction::SetCarryFlag,
        0x3F => Instruction::ComplementCarryFlag,
        0xC0 | 0xC8 | 0xD0 | 0xD8 => Instruction::ReturnCond(jump_condition(opcode)),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            Instruction::PopStack(register_pair(opcode, CpuRegisterPair::AF))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            Instruction::PushStack(register_pair(opcode, CpuRegisterPair::AF))
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            Instruction::JumpCond(jump_condition(opcode), operands.next_u16())
        }
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            Instruction::CallCond(jump_condition(opcode), operands.next_u16())
        }
        0xC3 => Instruction::Jump(operands.next_u16()),
        0xCD => Instruction::Call(operands.next_u16()),
        0xC9 => Instruction::Return,
        0xD9 => Instruction::ReturnFromInterruptHandler,
        0xE9 => Instruction::JumpHL,
        opcode if opcode & 0xC7 == 0xC6 => {
            alu_instruction(opcode, ReadTarget::Immediate(operands.next_u8()))
        }
        opcode if opcode & 0xC7 == 0xC7 => Instruction::RestartCall(opcode & 0x38),
        0xE0 => {
            Instruction::Load(WriteTarget::FFDirect(operands.next_u8()), ReadTarget::Accumulator)
        }
        0xF0 => {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFDirect(operands.next_u8()))
        }
        0xE2 => Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Accumulator),
        0xF2 => Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFIndirectC),
        0xEA => {
            Instruction::Load(WriteTarget::Direct(operands.next_u16()), ReadTarget::Accumulator)
        }
        0xFA => {
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::Direct(operands.next_u16()))
        }
        0xE8 => Instruction::AddSPImmediate(operands.next_i8()),
        0xF8 => Instruction::LoadHLStackPointerOffset(operands.next_i8()),
        0xF9 => Instruction::LoadStackPointerHL,
        0xF3 => Instruction::DisableInterrupts,
        0xFB => Instruction::EnableInterrupts,
        // D3 DB DD E3 E4 EB EC ED F4 FC FD
        _ => return None,
    };

    Some(instruction)
}

// Bits 5-3 of an ALU opcode select the operation, for both the register and immediate forms
fn alu_instruction(opcode: u8, read_target: ReadTarget) -> Instruction {
    match (opcode >> 3) & 0x07 {
        0x00 => Instruction::Add(read_target),
        0x01 => Instruction::AddWithCarry(read_target),
        0x02 => Instruction::Subtract(read_target),
        0x03 => Instruction::SubtractWithCarry(read_target),
        0x04 => Instruction::And(read_target),
        0x05 => Instruction::Xor(read_target),
        0x06 => Instruction::Or(read_target),
        _ => Instruction::Compare(read_target),
    }
}

fn parse_cb_prefixed_opcode(opcode: u8) -> Instruction {
    let modify_target = CpuRegister::from_low_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
    let bit = (opcode >> 3) & 0x07;

    match opcode >> 6 {
        0x00 => match bit {
            0x00 => Instruction::RotateLeft(modify_target),
            0x01 => Instruction::RotateRight(modify_target),
            0x02 => Instruction::RotateLeftThruCarry(modify_target),
            0x03 => Instruction::RotateRightThruCarry(modify_target),
            0x04 => Instruction::ShiftLeft(modify_target),
            0x05 => Instruction::ArithmeticShiftRight(modify_target),
            0x06 => Instruction::Swap(modify_target),
            _ => Instruction::LogicalShiftRight(modify_target),
        },
        0x01 => Instruction::TestBit(bit, read_target_low(opcode)),
        0x02 => Instruction::ResetBit(bit, modify_target),
        _ => Instruction::SetBit(bit, modify_target),
    }
}

fn read_target_low(opcode: u8) -> ReadTarget {
    CpuRegister::from_low_opcode_bits(opcode).map_or(ReadTarget::IndirectHL, ReadTarget::Register)
}

fn write_target_mid(opcode: u8) -> WriteTarget {
    CpuRegister::from_mid_opcode_bits(opcode).map_or(WriteTarget::IndirectHL, WriteTarget::Register)
}

fn modify_target_mid(opcode: u8) -> ModifyTarget {
    CpuRegister::from_mid_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

// Bits 5-4 select BC/DE/HL, with the fourth encoding meaning SP or AF depending on the opcode
fn register_pair(opcode: u8, fourth: CpuRegisterPair) -> CpuRegisterPair {
    match (opcode >> 4) & 0x03 {
        0x00 => CpuRegisterPair::BC,
        0x01 => CpuRegisterPair::DE,
        0x02 => CpuRegisterPair::HL,
        _ => fourth,
    }
}

fn jump_condition(opcode: u8) -> JumpCondition {
    match (opcode >> 3) & 0x03 {
        0x00 => JumpCondition::NZ,
        0x01 => JumpCondition::Z,
        0x02 => JumpCondition::NC,
        _ => JumpCondition::C,
    }
}
