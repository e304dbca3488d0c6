use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

use crate::app::{Action, App, Screen};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Screen actions shadow global keys ('c' cancels a run on Jobs)
    if let KeyCode::Char(c) = key.code {
        if let Some(action) = action_for(app.screen, c) {
            app.perform(action);
            return;
        }
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => app.toggle_help(),

        // Screens
        KeyCode::Char('h') => app.set_screen(Screen::Home),
        KeyCode::Char('c') => app.set_screen(Screen::Clusters),
        KeyCode::Char('j') => app.set_screen(Screen::Jobs),
        KeyCode::Char('w') => app.set_screen(Screen::Warehouses),
        KeyCode::Tab => app.next_screen(),
        KeyCode::BackTab => app.prev_screen(),

        // Selection
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Char('r') => app.refresh_current(),

        // Arming
        KeyCode::Char('A') => app.arm(),
        KeyCode::Esc => app.go_back(),

        _ => {}
    }
}

/// The destructive action bound to `key` on `screen`, if any.
pub fn action_for(screen: Screen, key: char) -> Option<Action> {
    Action::for_screen(screen)
        .iter()
        .copied()
        .find(|action| action.key().chars().eq(std::iter::once(key)))
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}
