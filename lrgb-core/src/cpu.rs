pub(crate) mod alu;
pub(crate) mod instructions;
mod registers;


use crate::interrupts::{InterruptType, ISR_CYCLES_REQUIRED};
use crate::memory::AddressSpace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use instructions::ParseError;
pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    // Waiting for any enabled interrupt to be requested
    Halted,
    // Waiting for a joypad press
    Stopped,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("error decoding CPU instruction: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    registers: CpuRegisters,
    run_state: RunState,
    // Set by a HALT executed with IME=0 while an interrupt was already pending
    halt_bug_triggered: bool,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            registers: CpuRegisters::new(),
            run_state: RunState::Running,
            halt_bug_triggered: false,
        }
    }

    /// Restore the power-on register values and resume running.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut CpuRegisters {
        &mut self.registers
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Leave STOP mode. Has no effect in any other run state.
    pub fn wake(&mut self) {
        if self.run_state == RunState::Stopped {
            log::debug!("waking CPU from STOP");
            self.run_state = RunState::Running;
        }
    }

    /// Either service the highest priority pending interrupt or fetch, decode, and execute one
    /// instruction. Returns the number of clock cycles consumed, which is 0 while halted or
    /// stopped with nothing to do.
    ///
    /// # Errors
    ///
    /// Returns an error if PC points at an undefined opcode. PC is left pointing at the offending
    /// opcode and no other state is modified.
    pub fn step(&mut self, address_space: &mut AddressSpace) -> Result<u32, ExecutionError> {
        match self.run_state {
            RunState::Stopped => return Ok(0),
            RunState::Halted => {
                // HALT ends when an enabled interrupt is requested, even if IME is off
                if !address_space.interrupts().any_pending() {
                    return Ok(0);
                }
                log::trace!("resuming from HALT, IF={:02X}", address_space.interrupts().pending());
                self.run_state = RunState::Running;
            }
            RunState::Running => {}
        }

        if let Some(interrupt_type) = address_space.interrupts_mut().step(self.run_state) {
            self.execute_interrupt_service_routine(address_space, interrupt_type);
            return Ok(ISR_CYCLES_REQUIRED);
        }

        let (instruction, next_pc) = instructions::parse_next_instruction(
            address_space,
            self.registers.pc,
            self.halt_bug_triggered,
        )?;
        self.halt_bug_triggered = false;

        log::trace!("{:04X}: {instruction:?}", self.registers.pc);

        let cycles_required = instruction.cycles_required(&self.registers);

        self.registers.pc = next_pc;
        let new_run_state = instruction.execute(address_space, &mut self.registers);
        address_space.interrupts_mut().instruction_completed();

        match new_run_state {
            Some(RunState::Halted) => {
                let interrupts = address_space.interrupts();
                if !interrupts.ime() && interrupts.any_pending() {
                    log::trace!("HALT bug triggered at {:04X}", self.registers.pc);
                    self.halt_bug_triggered = true;
                } else {
                    self.run_state = RunState::Halted;
                }
            }
            Some(run_state) => {
                log::debug!("CPU run state changed to {run_state:?}");
                self.run_state = run_state;
            }
            None => {}
        }

        Ok(cycles_required)
    }

    fn execute_interrupt_service_routine(
        &mut self,
        address_space: &mut AddressSpace,
        interrupt_type: InterruptType,
    ) {
        log::trace!(
            "servicing {interrupt_type:?} interrupt, replacing PC {:04X} with {:04X}",
            self.registers.pc,
            interrupt_type.handler_address()
        );

        let pc = self.registers.pc;
        instructions::push_stack(address_space, &mut self.registers, pc);
        self.registers.pc = interrupt_type.handler_address();
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
