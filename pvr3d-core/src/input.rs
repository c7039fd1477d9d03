/// Controller snapshot and the input-source boundary
use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Controller button mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u32 {
        const B = 1 << 1;
        const A = 1 << 2;
        const START = 1 << 3;
        const DPAD_UP = 1 << 4;
        const DPAD_DOWN = 1 << 5;
        const DPAD_LEFT = 1 << 6;
        const DPAD_RIGHT = 1 << 7;
        const Y = 1 << 9;
        const X = 1 << 10;
    }
}

/// One polled controller reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub buttons: Buttons,
    /// 0 (released) to 255 (fully pressed)
    pub trigger_l: u8,
    pub trigger_r: u8,
    /// -128 (left) to 127 (right)
    pub stick_x: i8,
    /// -128 (up) to 127 (down)
    pub stick_y: i8,
}

impl ControllerState {
    /// True when every button in `button` is in the `pressed` state.
    pub fn test_button(&self, button: Buttons, pressed: bool) -> bool {
        self.buttons.contains(button) == pressed
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = |button: Buttons| u8::from(self.buttons.contains(button));
        writeln!(f, "Controller State:")?;
        writeln!(
            f,
            " A:{}  B:{}  X:{}  Y:{} S:{}",
            b(Buttons::A),
            b(Buttons::B),
            b(Buttons::X),
            b(Buttons::Y),
            b(Buttons::START)
        )?;
        writeln!(
            f,
            " U:{}  D:{}  L:{}  R:{}",
            b(Buttons::DPAD_UP),
            b(Buttons::DPAD_DOWN),
            b(Buttons::DPAD_LEFT),
            b(Buttons::DPAD_RIGHT)
        )?;
        writeln!(f, " L:{:04}  R:{:04}", self.trigger_l, self.trigger_r)?;
        write!(f, " X:{:04}  Y:{:04}", self.stick_x, self.stick_y)
    }
}

/// A polled source of controller snapshots
pub trait InputSource {
    type Error;

    fn read_state(&mut self) -> Result<ControllerState, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_bits_match_hardware_layout() {
        assert_eq!(Buttons::START.bits(), 0x08);
        assert_eq!(Buttons::DPAD_RIGHT.bits(), 0x80);
        assert_eq!(Buttons::X.bits(), 0x400);
    }

    #[test]
    fn test_button_states() {
        let state = ControllerState {
            buttons: Buttons::A | Buttons::DPAD_UP,
            ..Default::default()
        };
        assert!(state.test_button(Buttons::A, true));
        assert!(state.test_button(Buttons::START, false));
        assert!(!state.test_button(Buttons::DPAD_UP, false));
    }

    #[test]
    fn test_display_lists_buttons() {
        let state = ControllerState {
            buttons: Buttons::START,
            trigger_l: 12,
            ..Default::default()
        };
        let text = state.to_string();
        assert!(text.contains("S:1"));
        assert!(text.contains(" L:0012"));
    }
}
