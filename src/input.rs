//! Key and mouse bindings.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Action from a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Quit,
    Up,
    Down,
    Confirm,
    Restart,
    /// Left button pressed at terminal (column, row).
    Click(u16, u16),
    /// Pointer moved to terminal (column, row).
    Pointer(u16, u16),
    None,
}

/// Map key event to action. Esc pauses, q quits.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    if kind != KeyEventKind::Press {
        return Action::None;
    }
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') => Action::Quit,
        KeyCode::Esc | KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::Click(mouse.column, mouse.row),
        MouseEventKind::Moved | MouseEventKind::Drag(_) => Action::Pointer(mouse.column, mouse.row),
        _ => Action::None,
    }
}

pub fn event_to_action(event: Event) -> Action {
    match event {
        Event::Key(key) => key_to_action(key),
        Event::Mouse(mouse) => mouse_to_action(mouse),
        _ => Action::None,
    }
}
