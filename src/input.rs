//! Keyboard bindings

use crate::display::InputEvent;
use crate::session::Command;
use sdl2::keyboard::Keycode;

/// Command bound to a key, if any
pub fn command_for_key(key: Keycode) -> Option<Command> {
    match key {
        Keycode::R => Some(Command::Rotate),
        Keycode::S => Some(Command::CycleScale),
        Keycode::Escape | Keycode::Q | Keycode::AcBack | Keycode::Return | Keycode::Space => {
            Some(Command::Exit)
        },
        _ => None,
    }
}

/// Translate a display event into a session command
pub fn command_for_event(event: &InputEvent) -> Option<Command> {
    match event {
        InputEvent::Quit => {
            log::info!("Quit event received");
            Some(Command::Exit)
        },
        InputEvent::KeyDown(key) => {
            let command = command_for_key(*key);
            if command == Some(Command::Exit) {
                log::info!("Exit key pressed ({})", key.name());
            }
            command
        },
    }
}

pub fn print_controls() {
    println!("Controls:");
    println!("  R                       - Rotate 90 degrees clockwise");
    println!("  S                       - Cycle scale");
    println!("  Esc/Q/Back/Enter/Space  - Quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings() {
        assert_eq!(command_for_key(Keycode::R), Some(Command::Rotate));
        assert_eq!(command_for_key(Keycode::S), Some(Command::CycleScale));
        for key in [
            Keycode::Escape,
            Keycode::Q,
            Keycode::AcBack,
            Keycode::Return,
            Keycode::Space,
        ] {
            assert_eq!(command_for_key(key), Some(Command::Exit), "{:?}", key);
        }
        assert_eq!(command_for_key(Keycode::A), None);
    }

    #[test]
    fn test_quit_event_exits() {
        assert_eq!(command_for_event(&InputEvent::Quit), Some(Command::Exit));
        assert_eq!(
            command_for_event(&InputEvent::KeyDown(Keycode::R)),
            Some(Command::Rotate)
        );
    }
}
