//! Common UI components shared across screens.
//!
//! This module contains the header bar, tab bar, footer, toasts and the
//! help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, LoadState, Screen};

/// Render the header bar with workspace identity and Spark status.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" BRICKWATCH ", Style::default().add_modifier(Modifier::BOLD));

    let line = match &app.health {
        LoadState::Loading => Line::from(vec![title, Span::raw("│ Loading...")]),
        LoadState::Failed(_) => Line::from(vec![
            Span::styled(" ● ", Style::default().fg(app.theme.critical)),
            title,
            Span::raw("│ "),
            Span::styled("workspace unreachable", Style::default().fg(app.theme.critical)),
        ]),
        LoadState::Ready(snapshot) => {
            let spark_style = app.theme.spark_style(snapshot.spark_status);
            Line::from(vec![
                Span::styled(" ● ", spark_style),
                title,
                Span::raw("│ "),
                Span::raw(snapshot.workspace_host.clone()),
                Span::raw(" │ "),
                Span::raw(snapshot.workspace_user.clone()),
                Span::raw(" │ profile "),
                Span::styled(
                    snapshot.profile_display().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" │ Spark "),
                Span::styled(snapshot.spark_status.label(), spark_style),
            ])
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available screens.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Screen::ALL
        .iter()
        .map(|s| Line::from(format!(" {}:{} ", s.key(), s.label())))
        .collect();

    let selected = Screen::ALL.iter().position(|s| *s == app.screen).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the footer: arming badge, context hints, refresh indicator.
///
/// Destructive hints are dimmed while they cannot be used.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();

    if let Some(secs) = app.arm_remaining_seconds() {
        spans.push(Span::styled(format!(" ARMED {}s ", secs), app.theme.armed));
        spans.push(Span::raw(" "));
    } else {
        spans.push(Span::styled(
            " SAFE ",
            Style::default().add_modifier(Modifier::DIM),
        ));
        spans.push(Span::raw(" "));
    }

    for hint in app.context_actions() {
        let style = if !hint.enabled {
            Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
        } else if hint.destructive {
            Style::default()
                .fg(app.theme.critical)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("{}:{}", hint.key, hint.label), style));
        spans.push(Span::raw(" "));
    }

    if app.is_refreshing() {
        spans.push(Span::styled(
            "│ Refreshing…",
            Style::default().fg(app.theme.highlight),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render live toasts stacked in the bottom-right corner of `area`.
pub fn render_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let toasts = app.notifications();
    if toasts.is_empty() {
        return;
    }

    let width = 56u16.min(area.width.saturating_sub(2));
    let mut bottom = area.y + area.height;
    for toast in toasts.iter().rev().take(3) {
        let height = 3u16;
        if bottom < area.y + height {
            break;
        }
        bottom -= height;
        let toast_area = Rect::new(
            area.x + area.width.saturating_sub(width + 1),
            bottom,
            width,
            height,
        );

        let style = app.theme.severity_style(toast.severity);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(style);
        let paragraph = Paragraph::new(Span::styled(toast.message.clone(), style)).block(block);

        frame.render_widget(Clear, toast_area);
        frame.render_widget(paragraph, toast_area);
    }
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current screen.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  h c j w     Home / Clusters / Jobs / Warehouses"),
        Line::from("  Tab         Next screen"),
        Line::from("  ↑/↓         Select row"),
        Line::from("  Home/End    First / last row"),
        Line::from("  Esc         Disarm, then go home"),
        Line::from(""),
        section(" Actions (require arming)"),
        Line::from(format!(
            "  A           Arm for {}s",
            app.arm_window().as_secs()
        )),
        Line::from("  s t R       Start / terminate / restart cluster"),
        Line::from("  n c R       Run job now / cancel run / rerun"),
        Line::from("  s S         Start / stop warehouse"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Refresh"),
        Line::from("  ?           Toggle help"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 56u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
