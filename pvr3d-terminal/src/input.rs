/// Keyboard-backed controller for the terminal front end
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pvr3d_core::{Buttons, ControllerState, InputSource};

/// Turns the key presses queued since the last poll into a controller
/// snapshot. Terminals report presses rather than held keys, so a button is
/// "down" for the frame in which its key event arrived.
#[derive(Debug, Default)]
pub struct KeyboardInput {
    resized: Option<(u16, u16)>,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal size reported by the last resize event, if any
    pub fn take_resize(&mut self) -> Option<(u16, u16)> {
        self.resized.take()
    }
}

impl InputSource for KeyboardInput {
    type Error = io::Error;

    fn read_state(&mut self) -> io::Result<ControllerState> {
        let mut state = ControllerState::default();
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => apply_key(&mut state, key),
                Event::Resize(width, height) => self.resized = Some((width, height)),
                _ => {}
            }
        }
        Ok(state)
    }
}

/// Fold one key event into the controller state
pub fn apply_key(state: &mut ControllerState, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    let button = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Buttons::START,
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Buttons::START,
        KeyCode::Up | KeyCode::Char('w') => Buttons::DPAD_UP,
        KeyCode::Down | KeyCode::Char('s') => Buttons::DPAD_DOWN,
        KeyCode::Left | KeyCode::Char('a') => Buttons::DPAD_LEFT,
        KeyCode::Right | KeyCode::Char('d') => Buttons::DPAD_RIGHT,
        KeyCode::Char('z') => Buttons::A,
        KeyCode::Char('x') => Buttons::B,
        KeyCode::Char('l') => Buttons::X,
        KeyCode::Char('y') => Buttons::Y,
        KeyCode::Char('[') => {
            state.trigger_l = u8::MAX;
            return;
        }
        KeyCode::Char(']') => {
            state.trigger_r = u8::MAX;
            return;
        }
        _ => return,
    };
    state.buttons |= button;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_keys_map_to_buttons() {
        let mut state = ControllerState::default();
        apply_key(&mut state, press(KeyCode::Up));
        apply_key(&mut state, press(KeyCode::Char('z')));
        apply_key(&mut state, press(KeyCode::Char('l')));

        assert!(state.test_button(Buttons::DPAD_UP | Buttons::A | Buttons::X, true));
        assert!(state.test_button(Buttons::START, false));
    }

    #[test]
    fn test_quit_keys() {
        for key in [
            press(KeyCode::Char('q')),
            press(KeyCode::Esc),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut state = ControllerState::default();
            apply_key(&mut state, key);
            assert!(state.test_button(Buttons::START, true));
        }
    }

    #[test]
    fn test_triggers_and_releases() {
        let mut state = ControllerState::default();
        apply_key(&mut state, press(KeyCode::Char(']')));
        assert_eq!((state.trigger_l, state.trigger_r), (0, 255));

        let mut release = press(KeyCode::Char('z'));
        release.kind = KeyEventKind::Release;
        apply_key(&mut state, release);
        assert!(state.buttons.is_empty());
    }
}
