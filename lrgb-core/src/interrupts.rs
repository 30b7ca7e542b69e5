use crate::cpu::RunState;
use serde::{Deserialize, Serialize};

/// The cycle cost of dispatching to an interrupt handler.
pub const ISR_CYCLES_REQUIRED: u32 = 20;

const INTERRUPT_BITS: u8 = 0x1F;

/// Interrupt sources, in priority order (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    const ALL: [Self; 5] = [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad];

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum PendingEnable {
    #[default]
    None,
    // EI was the instruction just executed
    Scheduled,
    // IME turns on once the instruction currently executing completes
    AfterCurrentInstruction,
}

/// The IE register (0xFFFF), the IF register (0xFF0F) and the master interrupt enable latch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterruptController {
    enabled: u8,
    pending: u8,
    ime: bool,
    pending_enable: PendingEnable,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the IF bit for the given source.
    pub fn request_interrupt(&mut self, interrupt_type: InterruptType) {
        log::trace!("interrupt requested: {interrupt_type:?}");
        self.pending |= interrupt_type.bit();
    }

    /// Returns the highest priority requested + enabled interrupt, or None if no enabled
    /// interrupts have been requested. Does not consult IME.
    pub fn highest_priority_interrupt(&self) -> Option<InterruptType> {
        let masked = self.enabled & self.pending;
        InterruptType::ALL.into_iter().find(|interrupt_type| masked & interrupt_type.bit() != 0)
    }

    /// Whether any enabled interrupt is pending, regardless of IME. This is what wakes the CPU
    /// from HALT.
    pub fn any_pending(&self) -> bool {
        self.enabled & self.pending & INTERRUPT_BITS != 0
    }

    /// Called by the CPU at an instruction boundary. If IME is set and an enabled interrupt is
    /// pending, clears that interrupt's IF bit and IME and returns it; the caller is responsible
    /// for pushing PC and jumping to [`InterruptType::handler_address`].
    pub fn step(&mut self, run_state: RunState) -> Option<InterruptType> {
        if run_state == RunState::Stopped || !self.ime {
            return None;
        }

        let interrupt_type = self.highest_priority_interrupt()?;
        self.pending &= !interrupt_type.bit();
        self.ime = false;
        self.pending_enable = PendingEnable::None;

        Some(interrupt_type)
    }

    pub fn ime(&self) -> bool {
        self.ime
    }

    /// EI: IME is set once the instruction following EI has completed.
    pub fn schedule_enable(&mut self) {
        if !self.ime && self.pending_enable == PendingEnable::None {
            self.pending_enable = PendingEnable::Scheduled;
        }
    }

    /// RETI: IME is set immediately.
    pub fn enable(&mut self) {
        self.ime = true;
        self.pending_enable = PendingEnable::None;
    }

    /// DI: clears IME immediately and cancels an EI that has not taken effect yet.
    pub fn disable(&mut self) {
        self.ime = false;
        self.pending_enable = PendingEnable::None;
    }

    /// Advance the EI delay by one instruction. Must be called after every executed instruction.
    pub fn instruction_completed(&mut self) {
        self.pending_enable = match self.pending_enable {
            PendingEnable::None => PendingEnable::None,
            PendingEnable::Scheduled => PendingEnable::AfterCurrentInstruction,
            PendingEnable::AfterCurrentInstruction => {
                self.ime = true;
                PendingEnable::None
            }
        };
    }

    pub fn read_ie(&self) -> u8 {
        self.enabled
    }

    pub fn write_ie(&mut self, value: u8) {
        self.enabled = value;
    }

    /// IF as seen on the bus; the unused upper 3 bits always read as 1.
    pub fn read_if(&self) -> u8 {
        0xE0 | self.pending
    }

    pub fn write_if(&mut self, value: u8) {
        self.pending = value & INTERRUPT_BITS;
    }

    pub fn pending(&self) -> u8 {
        self.pending
    }
}
