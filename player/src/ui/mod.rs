pub mod components;
pub mod modal;

use std::time::Duration;

use anyhow::Result;
use ratatui::Frame;

use crate::app::App;
use components::{HelpOverlay, StatusMessage};

/// Draw the page, the widget and whatever floats above it
pub fn draw_ui(f: &mut Frame, app: &mut App) -> Result<()> {
    let size = f.area();

    // Hitboxes are rebuilt on every draw
    app.hitboxes.clear();
    app.modal_area = None;

    modal::draw_page(f, size);
    modal::draw_trigger(f, app, size);
    if app.controller.phase().is_open() {
        modal::draw_modal(f, app, size);
    }

    if let Some((msg, time, color)) = &app.status_message {
        f.render_widget(
            StatusMessage::new(msg, *color, time.elapsed()).max_age(Duration::from_secs(5)),
            size,
        );
    }

    if app.show_help {
        f.render_widget(HelpOverlay, modal::centered_rect(60, 80, size));
    }

    Ok(())
}
