use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::mpsc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

impl Button {
    pub const ALL: [Self; 8] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::A,
        Self::B,
        Self::Start,
        Self::Select,
    ];

    // Bit in JoypadState::pressed; bits 0-3 are the direction group, 4-7 the action group, each
    // in the order they appear in the low nibble of P1
    fn bit(self) -> u8 {
        match self {
            Self::Right => 0x01,
            Self::Left => 0x02,
            Self::Up => 0x04,
            Self::Down => 0x08,
            Self::A => 0x10,
            Self::B => 0x20,
            Self::Select => 0x40,
            Self::Start => 0x80,
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::A => "A",
            Self::B => "B",
            Self::Start => "Start",
            Self::Select => "Select",
        };
        write!(f, "{s}")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    #[error("invalid button name: '{name}'")]
    InvalidButton { name: String },
}

impl FromStr for Button {
    type Err = InputParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|button| button.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| InputParseError::InvalidButton { name: s.into() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoypadEvent {
    Pressed(Button),
    Released(Button),
}

/// Button state plus the P1 (0xFF00) select lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoypadState {
    select_bits: u8,
    // 1 = pressed
    pressed: u8,
}

impl JoypadState {
    const DIRECTION_SELECT: u8 = 0x10;
    const ACTION_SELECT: u8 = 0x20;

    pub fn new() -> Self {
        Self { select_bits: Self::DIRECTION_SELECT | Self::ACTION_SELECT, pressed: 0x00 }
    }

    /// P1 as read by the CPU. Bits 7-6 read as 1, bits 5-4 echo the select lines, and bits 3-0
    /// are the active-low states of whichever button groups are selected (a select line is
    /// active when 0).
    pub fn read_register(&self) -> u8 {
        let mut pressed_nibble = 0x00;
        if self.select_bits & Self::DIRECTION_SELECT == 0 {
            pressed_nibble |= self.pressed & 0x0F;
        }
        if self.select_bits & Self::ACTION_SELECT == 0 {
            pressed_nibble |= self.pressed >> 4;
        }

        0xC0 | self.select_bits | (!pressed_nibble & 0x0F)
    }

    /// Only the select lines are writable.
    pub fn write_register(&mut self, value: u8) {
        self.select_bits = value & (Self::DIRECTION_SELECT | Self::ACTION_SELECT);
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed & button.bit() != 0
    }

    /// Apply a button transition. Returns true if a released button became pressed, which is
    /// what raises the joypad interrupt.
    pub fn apply(&mut self, event: JoypadEvent) -> bool {
        match event {
            JoypadEvent::Pressed(button) => {
                let newly_pressed = !self.is_pressed(button);
                self.pressed |= button.bit();
                newly_pressed
            }
            JoypadEvent::Released(button) => {
                self.pressed &= !button.bit();
                false
            }
        }
    }
}

impl Default for JoypadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle for joypad transitions. May be cloned and moved to other threads; the
/// emulation thread drains the queue once per CPU step.
#[derive(Debug, Clone)]
pub struct InputSender(mpsc::Sender<JoypadEvent>);

impl InputSender {
    /// Queue an input transition. Returns false if the emulation state has been dropped.
    pub fn send(&self, event: JoypadEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

#[derive(Debug)]
pub(crate) struct InputQueue {
    sender: mpsc::Sender<JoypadEvent>,
    receiver: mpsc::Receiver<JoypadEvent>,
}

impl InputQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub(crate) fn sender(&self) -> InputSender {
        InputSender(self.sender.clone())
    }

    pub(crate) fn drain(&self) -> impl Iterator<Item = JoypadEvent> + '_ {
        self.receiver.try_iter()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_selected_reads_released() {
        let mut joypad = JoypadState::new();
        joypad.apply(JoypadEvent::Pressed(Button::A));
        joypad.apply(JoypadEvent::Pressed(Button::Down));

        assert_eq!(0xFF, joypad.read_register());
    }

    #[test]
    fn direction_group() {
        let mut joypad = JoypadState::new();
        joypad.write_register(0x20);
        joypad.apply(JoypadEvent::Pressed(Button::Left));
        joypad.apply(JoypadEvent::Pressed(Button::Start));

        assert_eq!(0xE0 | 0x0D, joypad.read_register());
    }

    #[test]
    fn action_group() {
        let mut joypad = JoypadState::new();
        joypad.write_register(0x10);
        joypad.apply(JoypadEvent::Pressed(Button::Start));
        joypad.apply(JoypadEvent::Pressed(Button::A));
        joypad.apply(JoypadEvent::Pressed(Button::Up));

        assert_eq!(0xD0 | 0x06, joypad.read_register());
    }

    #[test]
    fn both_groups_selected() {
        let mut joypad = JoypadState::new();
        joypad.write_register(0x00);
        joypad.apply(JoypadEvent::Pressed(Button::Right));
        joypad.apply(JoypadEvent::Pressed(Button::B));

        assert_eq!(0xC0 | 0x0C, joypad.read_register());
    }

    #[test]
    fn only_new_presses_report_edges() {
        let mut joypad = JoypadState::new();
        assert!(joypad.apply(JoypadEvent::Pressed(Button::Select)));
        assert!(!joypad.apply(JoypadEvent::Pressed(Button::Select)));
        assert!(!joypad.apply(JoypadEvent::Released(Button::Select)));
        assert!(!joypad.is_pressed(Button::Select));
        assert!(joypad.apply(JoypadEvent::Pressed(Button::Select)));
    }

    #[test]
    fn parse_button_names() {
        assert_eq!(Ok(Button::Start), "start".parse());
        assert_eq!(Ok(Button::A), "A".parse());
        assert_eq!(Ok(Button::Select), "SELECT".parse());
        assert_eq!(
            Err(InputParseError::InvalidButton { name: "turbo".into() }),
            "turbo".parse::<Button>()
        );
    }

    #[test]
    fn queued_events_drain_in_order() {
        let queue = InputQueue::new();
        let sender = queue.sender();

        let handle = std::thread::spawn(move || {
            sender.send(JoypadEvent::Pressed(Button::A));
            sender.send(JoypadEvent::Released(Button::A));
        });
        handle.join().unwrap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(vec![JoypadEvent::Pressed(Button::A), JoypadEvent::Released(Button::A)], events);
        assert_eq!(0, queue.drain().count());
    }
}
