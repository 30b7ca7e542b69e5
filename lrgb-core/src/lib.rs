//! Sharp LR35902 interpreter: CPU core, ALU, interrupt controller, address space and MBC1
//! cartridge banking.

mod config;
mod cpu;
mod input;
mod interrupts;
mod memory;
mod serialize;
mod startup;

use crate::input::InputQueue;
use serde::{Deserialize, Serialize};

pub use crate::config::RunConfig;
pub use crate::cpu::{
    Cpu, CpuRegister, CpuRegisterPair, CpuRegisters, ExecutionError, ParseError, RunState,
};
pub use crate::input::{Button, InputParseError, InputSender, JoypadEvent, JoypadState};
pub use crate::interrupts::{InterruptController, InterruptType, ISR_CYCLES_REQUIRED};
pub use crate::memory::{address, AddressSpace, Cartridge, CartridgeLoadError};
pub use crate::serialize::{
    determine_save_state_path, load_state, load_state_from_file, save_state, save_state_to_file,
    SaveStateError,
};
pub use crate::startup::{
    determine_cartridge_ram_path, init_emulation_state, save_cartridge_ram, StartupError,
};

/// Everything needed to run a cartridge: the CPU, the address space it is attached to, and the
/// queue that joypad transitions arrive on.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmulationState {
    pub(crate) address_space: AddressSpace,
    pub(crate) cpu: Cpu,
    #[serde(skip)]
    input_queue: InputQueue,
}

impl EmulationState {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            address_space: AddressSpace::new(cartridge),
            cpu: Cpu::new(),
            input_queue: InputQueue::new(),
        }
    }

    /// Apply any queued joypad transitions, then advance the CPU by one step. Returns the number
    /// of clock cycles consumed.
    ///
    /// # Errors
    ///
    /// Propagates [`ExecutionError`] from the CPU, e.g. on an undefined opcode.
    pub fn step(&mut self) -> Result<u32, ExecutionError> {
        for event in self.input_queue.drain() {
            log::trace!("applying joypad event {event:?}");
            if self.address_space.joypad_mut().apply(event) {
                self.address_space.interrupts_mut().request_interrupt(InterruptType::Joypad);
                self.cpu.wake();
            }
        }

        self.cpu.step(&mut self.address_space)
    }

    /// A handle for feeding joypad transitions from any thread.
    pub fn input_sender(&self) -> InputSender {
        self.input_queue.sender()
    }

    /// Return the CPU to its power-on registers and clear interrupt state. Memory contents are
    /// kept.
    pub fn reset(&mut self) {
        log::debug!("resetting CPU and interrupt state");
        self.cpu.reset();
        *self.address_space.interrupts_mut() = InterruptController::new();
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn address_space_mut(&mut self) -> &mut AddressSpace {
        &mut self.address_space
    }

    pub(crate) fn move_unserializable_fields_from(&mut self, other: &mut Self) {
        self.address_space.move_unserializable_fields_from(&mut other.address_space);
        std::mem::swap(&mut self.input_queue, &mut other.input_queue);
    }
}
