//! Key binding dispatch, grounded in the
//! `TuiApp::handle_key_event` in `tui/src/app/mod.rs`: match on
//! `KeyEvent`, return whether the loop should keep running.

use super::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the event loop should do after one key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Submit,
    Exit,
}

/// Applies one key event to the input buffer / app state. The event loop
/// owns `input_buffer` (pure presentation state, not part of `App`) and
/// is responsible for calling `App::submit_input` when this returns
/// [`KeyOutcome::Submit`].
pub fn handle_key_event(app: &mut App, input_buffer: &mut String, key: KeyEvent) -> KeyOutcome {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
            app.cancel_active_turn();
            app.quit();
            KeyOutcome::Exit
        }
        (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
            app.cancel_active_turn();
            app.quit();
            KeyOutcome::Exit
        }
        (KeyCode::Enter, _) => {
            if input_buffer.trim().is_empty() {
                KeyOutcome::Continue
            } else {
                KeyOutcome::Submit
            }
        }
        (KeyCode::Esc, _) => {
            input_buffer.clear();
            KeyOutcome::Continue
        }
        (KeyCode::PageUp, _) => {
            app.conversation.page_up(10);
            KeyOutcome::Continue
        }
        (KeyCode::PageDown, _) => {
            app.conversation.page_down(10);
            KeyOutcome::Continue
        }
        (KeyCode::BackTab, _) => {
            app.cycle_mode();
            KeyOutcome::Continue
        }
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
            input_buffer.push(c);
            KeyOutcome::Continue
        }
        (KeyCode::Backspace, _) => {
            input_buffer.pop();
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn app() -> App {
        App::new(Settings::default(), std::env::temp_dir())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn enter_on_empty_buffer_does_not_submit() {
        let mut app = app();
        let mut buffer = String::new();
        assert_eq!(handle_key_event(&mut app, &mut buffer, key(KeyCode::Enter)), KeyOutcome::Continue);
    }

    #[test]
    fn enter_on_non_empty_buffer_submits() {
        let mut app = app();
        let mut buffer = "hello".to_string();
        assert_eq!(handle_key_event(&mut app, &mut buffer, key(KeyCode::Enter)), KeyOutcome::Submit);
    }

    #[test]
    fn escape_clears_the_input_buffer() {
        let mut app = app();
        let mut buffer = "hello".to_string();
        handle_key_event(&mut app, &mut buffer, key(KeyCode::Esc));
        assert!(buffer.is_empty());
    }

    #[test]
    fn ctrl_c_exits_and_cancels_the_active_turn() {
        let mut app = app();
        let mut buffer = String::new();
        let outcome = handle_key_event(&mut app, &mut buffer, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(outcome, KeyOutcome::Exit);
        assert!(app.should_quit());
    }

    #[test]
    fn shift_tab_cycles_mode() {
        let mut app = app();
        let mut buffer = String::new();
        assert_eq!(app.mode(), crate::mode::Mode::Chat);
        handle_key_event(&mut app, &mut buffer, key(KeyCode::BackTab));
        assert_eq!(app.mode(), crate::mode::Mode::Architect);
    }

    #[test]
    fn typed_characters_append_to_the_buffer() {
        let mut app = app();
        let mut buffer = String::new();
        handle_key_event(&mut app, &mut buffer, key(KeyCode::Char('h')));
        handle_key_event(&mut app, &mut buffer, key(KeyCode::Char('i')));
        assert_eq!(buffer, "hi");
    }
}
