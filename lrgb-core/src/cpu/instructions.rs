mod parse;

use crate::cpu::alu::{self, RotateForm};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::cpu::RunState;
use crate::memory::AddressSpace;

pub use parse::{parse_next_instruction, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Accumulator,
    Register(CpuRegister),
    Immediate(u8),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
    IndirectHLInc,
    IndirectHLDec,
}

impl ReadTarget {
    fn read_value(self, address_space: &AddressSpace, cpu_registers: &mut CpuRegisters) -> u8 {
        match self {
            Self::Accumulator => cpu_registers.accumulator,
            Self::Register(r) => cpu_registers.read_register(r),
            Self::Immediate(n) => n,
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
            Self::IndirectBC => address_space.read_address_u8(cpu_registers.bc()),
            Self::IndirectDE => address_space.read_address_u8(cpu_registers.de()),
            Self::Direct(nn) => address_space.read_address_u8(nn),
            Self::FFDirect(n) => address_space.read_address_u8(u16::from_be_bytes([0xFF, n])),
            Self::FFIndirectC => {
                address_space.read_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]))
            }
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_add(1));
                address_space.read_address_u8(hl)
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_sub(1));
                address_space.read_address_u8(hl)
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Accumulator | Self::Register(_) => 0,
            Self::Immediate(_)
            | Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC
            | Self::IndirectHLInc
            | Self::IndirectHLDec => 4,
            Self::FFDirect(_) => 8,
            Self::Direct(_) => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Accumulator,
    Register(CpuRegister),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
    IndirectHLInc,
    IndirectHLDec,
}

impl WriteTarget {
    fn write_value(
        self,
        value: u8,
        address_space: &mut AddressSpace,
        cpu_registers: &mut CpuRegisters,
    ) {
        match self {
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
            Self::Register(r) => {
                cpu_registers.set_register(r, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
            Self::IndirectBC => {
                address_space.write_address_u8(cpu_registers.bc(), value);
            }
            Self::IndirectDE => {
                address_space.write_address_u8(cpu_registers.de(), value);
            }
            Self::Direct(nn) => {
                address_space.write_address_u8(nn, value);
            }
            Self::FFDirect(n) => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, n]), value);
            }
            Self::FFIndirectC => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]), value);
            }
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_add(1));
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_sub(1));
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Accumulator | Self::Register(_) => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC
            | Self::IndirectHLInc
            | Self::IndirectHLDec => 4,
            Self::FFDirect(_) => 8,
            Self::Direct(_) => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    // Only used for the unprefixed accumulator rotates (RLCA/RLA/RRCA/RRA)
    Accumulator,
    Register(CpuRegister),
    IndirectHL,
}

impl ModifyTarget {
    fn read_value(self, address_space: &AddressSpace, cpu_registers: &CpuRegisters) -> u8 {
        match self {
            Self::Accumulator => cpu_registers.accumulator,
            Self::Register(r) => cpu_registers.read_register(r),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
        }
    }

    fn write_value(
        self,
        value: u8,
        address_space: &mut AddressSpace,
        cpu_registers: &mut CpuRegisters,
    ) {
        match self {
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
            Self::Register(r) => {
                cpu_registers.set_register(r, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
        }
    }

    fn rotate_form(self) -> RotateForm {
        match self {
            Self::Accumulator => RotateForm::Accumulator,
            Self::Register(_) | Self::IndirectHL => RotateForm::Prefixed,
        }
    }

    // Cost of a CB-prefixed instruction on this target
    fn prefixed_cycles_required(self) -> u32 {
        match self {
            Self::Accumulator => 4,
            Self::Register(_) => 8,
            Self::IndirectHL => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD r, r' / LD r, n / LD r, (HL) / LD (HL), r / LD (HL), n / LD A, (BC) / LD A, (DE)
    // LD (BC), A / LD (DE), A / LD A, (nn) / LD (nn), A / LDH A, (C) / LDH (C), A
    // LDH A, (n) / LDH (n), A / LD A, (HL-) / LD (HL-), A / LD A, (HL+) / LD (HL+), A
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LD HL, SP+e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD r / ADD (HL) / ADD n
    Add(ReadTarget),
    // ADC r / ADC (HL) / ADC n
    AddWithCarry(ReadTarget),
    // SUB r / SUB (HL) / SUB n
    Subtract(ReadTarget),
    // SBC r / SBC (HL) / SBC n
    SubtractWithCarry(ReadTarget),
    // CP r / CP (HL) / CP n
    Compare(ReadTarget),
    // INC r / INC (HL)
    Increment(ModifyTarget),
    // DEC r / DEC (HL)
    Decrement(ModifyTarget),
    // AND r / AND (HL) / AND n
    And(ReadTarget),
    // OR r / OR (HL) / OR n
    Or(ReadTarget),
    // XOR r / XOR (HL) / XOR n
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC r / RLC (HL)
    RotateLeft(ModifyTarget),
    // RLA / RL r / RL (HL)
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC r / RRC (HL)
    RotateRight(ModifyTarget),
    // RRA / RR r / RR (HL)
    RotateRightThruCarry(ModifyTarget),
    // SLA r / SLA (HL)
    ShiftLeft(ModifyTarget),
    // SRA r / SRA (HL)
    ArithmeticShiftRight(ModifyTarget),
    // SWAP r / SWAP (HL)
    Swap(ModifyTarget),
    // SRL r / SRL (HL)
    LogicalShiftRight(ModifyTarget),
    // BIT n, r / BIT n, (HL)
    TestBit(u8, ReadTarget),
    // SET n, r / SET n, (HL)
    SetBit(u8, ModifyTarget),
    // RES n, r / RES n, (HL)
    ResetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// Execute this instruction. PC must already point past the instruction's bytes.
    ///
    /// Returns the run state the CPU should move to, if the instruction changes it.
    pub fn execute(
        self,
        address_space: &mut AddressSpace,
        cpu_registers: &mut CpuRegisters,
    ) -> Option<RunState> {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                write_target.write_value(value, address_space, cpu_registers);
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::LoadHLStackPointerOffset(e) => {
                let hl = alu::add_sp_offset(&mut cpu_registers.flags, cpu_registers.sp, e);
                cpu_registers.set_hl(hl);
            }
            Self::PushStack(rr) => {
                push_stack(address_space, cpu_registers, cpu_registers.read_register_pair(rr));
            }
            Self::PopStack(rr) => {
                let value = pop_stack(address_space, cpu_registers);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::Add(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                cpu_registers.accumulator =
                    alu::add(&mut cpu_registers.flags, cpu_registers.accumulator, value, false);
            }
            Self::AddWithCarry(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                let carry = cpu_registers.carry_flag();
                cpu_registers.accumulator =
                    alu::add(&mut cpu_registers.flags, cpu_registers.accumulator, value, carry);
            }
            Self::Subtract(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                cpu_registers.accumulator =
                    alu::sub(&mut cpu_registers.flags, cpu_registers.accumulator, value, false);
            }
            Self::SubtractWithCarry(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                let carry = cpu_registers.carry_flag();
                cpu_registers.accumulator =
                    alu::sub(&mut cpu_registers.flags, cpu_registers.accumulator, value, carry);
            }
            Self::Compare(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                alu::compare(&mut cpu_registers.flags, cpu_registers.accumulator, value);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(address_space, cpu_registers);
                let result = alu::increment(&mut cpu_registers.flags, value);
                modify_target.write_value(result, address_space, cpu_registers);
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(address_space, cpu_registers);
                let result = alu::decrement(&mut cpu_registers.flags, value);
                modify_target.write_value(result, address_space, cpu_registers);
            }
            Self::And(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                cpu_registers.accumulator =
                    alu::and(&mut cpu_registers.flags, cpu_registers.accumulator, value);
            }
            Self::Or(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                cpu_registers.accumulator =
                    alu::or(&mut cpu_registers.flags, cpu_registers.accumulator, value);
            }
            Self::Xor(read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                cpu_registers.accumulator =
                    alu::xor(&mut cpu_registers.flags, cpu_registers.accumulator, value);
            }
            Self::AddHLRegister(rr) => {
                let hl = cpu_registers.hl();
                let value = cpu_registers.read_register_pair(rr);
                let sum = alu::add_u16(&mut cpu_registers.flags, hl, value);
                cpu_registers.set_hl(sum);
            }
            Self::IncRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                cpu_registers.set_register_pair(rr, value.wrapping_add(1));
            }
            Self::DecRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                cpu_registers.set_register_pair(rr, value.wrapping_sub(1));
            }
            Self::AddSPImmediate(e) => {
                cpu_registers.sp =
                    alu::add_sp_offset(&mut cpu_registers.flags, cpu_registers.sp, e);
            }
            Self::RotateLeft(modify_target) => {
                modify(modify_target, address_space, cpu_registers, |flags, value| {
                    alu::rotate_left(flags, value, modify_target.rotate_form())
                });
            }
            Self::RotateLeftThruCarry(modify_target) => {
                modify(modify_target, address_space, cpu_registers, |flags, value| {
                    alu::rotate_left_thru_carry(flags, value, modify_target.rotate_form())
                });
            }
            Self::RotateRight(modify_target) => {
                modify(modify_target, address_space, cpu_registers, |flags, value| {
                    alu::rotate_right(flags, value, modify_target.rotate_form())
                });
            }
            Self::RotateRightThruCarry(modify_target) => {
                modify(modify_target, address_space, cpu_registers, |flags, value| {
                    alu::rotate_right_thru_carry(flags, value, modify_target.rotate_form())
                });
            }
            Self::ShiftLeft(modify_target) => {
                modify(modify_target, address_space, cpu_registers, alu::shift_left);
            }
            Self::ArithmeticShiftRight(modify_target) => {
                modify(modify_target, address_space, cpu_registers, alu::arithmetic_shift_right);
            }
            Self::Swap(modify_target) => {
                modify(modify_target, address_space, cpu_registers, alu::swap);
            }
            Self::LogicalShiftRight(modify_target) => {
                modify(modify_target, address_space, cpu_registers, alu::logical_shift_right);
            }
            Self::TestBit(n, read_target) => {
                let value = read_target.read_value(address_space, cpu_registers);
                alu::test_bit(&mut cpu_registers.flags, value, n);
            }
            Self::SetBit(n, modify_target) => {
                let value = modify_target.read_value(address_space, cpu_registers);
                modify_target.write_value(value | (1 << n), address_space, cpu_registers);
            }
            Self::ResetBit(n, modify_target) => {
                let value = modify_target.read_value(address_space, cpu_registers);
                modify_target.write_value(value & !(1 << n), address_space, cpu_registers);
            }
            Self::ComplementCarryFlag => {
                alu::complement_carry(&mut cpu_registers.flags);
            }
            Self::SetCarryFlag => {
                alu::set_carry(&mut cpu_registers.flags);
            }
            Self::DecimalAdjustAccumulator => {
                cpu_registers.accumulator =
                    alu::decimal_adjust(&mut cpu_registers.flags, cpu_registers.accumulator);
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator =
                    alu::complement(&mut cpu_registers.flags, cpu_registers.accumulator);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
                }
            }
            Self::Call(nn) => {
                push_stack(address_space, cpu_registers, cpu_registers.pc);
                cpu_registers.pc = nn;
            }
            Self::CallCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    push_stack(address_space, cpu_registers, cpu_registers.pc);
                    cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                cpu_registers.pc = pop_stack(address_space, cpu_registers);
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = pop_stack(address_space, cpu_registers);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = pop_stack(address_space, cpu_registers);
                address_space.interrupts_mut().enable();
            }
            Self::RestartCall(rst_address) => {
                push_stack(address_space, cpu_registers, cpu_registers.pc);
                cpu_registers.pc = rst_address.into();
            }
            Self::Halt => {
                return Some(RunState::Halted);
            }
            Self::Stop => {
                return Some(RunState::Stopped);
            }
            Self::DisableInterrupts => {
                address_space.interrupts_mut().disable();
            }
            Self::EnableInterrupts => {
                address_space.interrupts_mut().schedule_enable();
            }
            Self::NoOp => {}
        }

        None
    }

    /// Return the number of clock cycles required to execute this instruction.
    ///
    /// Conditional control flow costs depend on whether the branch is taken, so this must be
    /// called with the registers as they were before executing the instruction.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::Load(write_target, read_target) => {
                4 + write_target.cycles_required() + read_target.cycles_required()
            }
            Self::LoadRegisterPairImmediate(..)
            | Self::LoadHLStackPointerOffset(..)
            | Self::PopStack(..) => 12,
            Self::LoadDirectStackPointer(..) => 20,
            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 8,
            Self::PushStack(..) | Self::AddSPImmediate(..) => 16,
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::Compare(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target) => 4 + read_target.cycles_required(),
            Self::Increment(modify_target) | Self::Decrement(modify_target) => match modify_target {
                ModifyTarget::IndirectHL => 12,
                ModifyTarget::Accumulator | ModifyTarget::Register(_) => 4,
            },
            Self::RotateLeft(modify_target)
            | Self::RotateLeftThruCarry(modify_target)
            | Self::RotateRight(modify_target)
            | Self::RotateRightThruCarry(modify_target)
            | Self::ShiftLeft(modify_target)
            | Self::ArithmeticShiftRight(modify_target)
            | Self::Swap(modify_target)
            | Self::LogicalShiftRight(modify_target)
            | Self::SetBit(_, modify_target)
            | Self::ResetBit(_, modify_target) => modify_target.prefixed_cycles_required(),
            Self::TestBit(_, read_target) => match read_target {
                ReadTarget::IndirectHL => 12,
                _ => 8,
            },
            Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::JumpHL
            | Self::Halt
            | Self::Stop
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 4,
            Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 16,
            Self::JumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJump(..) => 12,
            Self::RelativeJumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    12
                } else {
                    8
                }
            }
            Self::Call(..) => 24,
            Self::CallCond(cc, _) => {
                if cc.check(cpu_registers) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    20
                } else {
                    8
                }
            }
        }
    }
}

fn modify<F>(
    modify_target: ModifyTarget,
    address_space: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    op: F,
) where
    F: FnOnce(&mut u8, u8) -> u8,
{
    let value = modify_target.read_value(address_space, cpu_registers);
    let result = op(&mut cpu_registers.flags, value);
    modify_target.write_value(result, address_space, cpu_registers);
}

/// Push a 16-bit value; the high byte ends up at the higher address.
pub(crate) fn push_stack(
    address_space: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    value: u16,
) {
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    address_space.write_address_u16(cpu_registers.sp, value);
}

fn pop_stack(address_space: &AddressSpace, cpu_registers: &mut CpuRegisters) -> u16 {
    let value = address_space.read_address_u16(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
    value
}
