use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent};

use crate::app::App;

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
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // Metric selection (1..N over catalog order)
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.select_metric(index);
        }
        KeyCode::Left | KeyCode::Char('h') => {
            let index = app.metric_index();
            if index > 0 {
                app.select_metric(index - 1);
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            app.select_metric(app.metric_index() + 1);
        }

        // Time range cycling
        KeyCode::Char(']') | KeyCode::Char('t') => app.next_range(),
        KeyCode::Char('[') | KeyCode::Char('T') => app.prev_range(),

        // Live / paused toggle
        KeyCode::Char(' ') => app.toggle_live(),

        // Retry from the offline state
        KeyCode::Char('r') => app.retry(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path =
                std::path::PathBuf::from(format!("{}_export.json", app.metric().key));
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}
