//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`home`]: The workspace health snapshot
//! - [`resources`]: Cluster, job and warehouse tables
//! - [`common`]: Shared components (header, tabs, footer, toasts, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Screen content                       │
//! │ (home / resources)          [toasts] │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Footer (common::render_footer)       │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod common;
pub mod home;
pub mod resources;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Screen};

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 12;

/// Draw one frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let top = (area.height / 2).saturating_sub(2);
        let centered = Rect::new(0, top, area.width, 5.min(area.height - top));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Footer
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.screen {
        Screen::Home => home::render(frame, app, chunks[2]),
        Screen::Clusters => resources::render_clusters(frame, app, chunks[2]),
        Screen::Jobs => resources::render_jobs(frame, app, chunks[2]),
        Screen::Warehouses => resources::render_warehouses(frame, app, chunks[2]),
    }

    common::render_footer(frame, app, chunks[3]);
    common::render_notifications(frame, app, chunks[2]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
