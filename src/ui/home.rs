//! Home screen: the workspace health snapshot.

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, LoadState};
use crate::health::{HealthSnapshot, PLACEHOLDER};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Workspace health ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    match &app.health {
        LoadState::Loading => {
            let paragraph = Paragraph::new("Loading workspace health...")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, area);
        }
        LoadState::Failed(message) => {
            let lines = vec![
                Line::from(Span::styled(
                    "Workspace health unavailable",
                    Style::default()
                        .fg(app.theme.critical)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(message.clone()),
                Line::from(Span::styled(
                    app.source_description().to_string(),
                    Style::default().add_modifier(Modifier::DIM),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press r to retry",
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ];
            let paragraph = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(paragraph, area);
        }
        LoadState::Ready(snapshot) => render_snapshot(frame, app, snapshot, block, area),
    }
}

fn render_snapshot(
    frame: &mut Frame,
    app: &App,
    snapshot: &HealthSnapshot,
    block: Block<'_>,
    area: Rect,
) {
    let field = |value: &str| {
        if value == PLACEHOLDER {
            Cell::from(value.to_string()).style(Style::default().add_modifier(Modifier::DIM))
        } else {
            Cell::from(value.to_string())
        }
    };

    let warehouse_style = if snapshot.total_warehouses > 0 && snapshot.running_warehouses == 0 {
        Style::default().fg(app.theme.warning)
    } else {
        Style::default()
    };

    let mut rows = vec![
        Row::new(vec![Cell::from("Workspace"), field(&snapshot.workspace_host)]),
        Row::new(vec![Cell::from("User"), field(&snapshot.workspace_user)]),
        Row::new(vec![
            Cell::from("Profile"),
            Cell::from(snapshot.profile_display().to_string()),
        ]),
        Row::new(vec![
            Cell::from("Spark"),
            Cell::from(snapshot.spark_display.clone())
                .style(app.theme.spark_style(snapshot.spark_status)),
        ]),
        Row::new(vec![Cell::from("Clusters"), field(&snapshot.cluster_health_display)]),
        Row::new(vec![Cell::from("Jobs"), field(&snapshot.job_health_display)]),
        Row::new(vec![
            Cell::from("Warehouses"),
            field(&snapshot.warehouse_display).style(warehouse_style),
        ]),
        Row::new(vec![
            Cell::from("Last failure"),
            field(&snapshot.last_failure_display),
        ]),
        Row::new(vec![Cell::from(""), Cell::from("")]),
        Row::new(vec![
            Cell::from("Updated"),
            Cell::from(
                snapshot
                    .taken_at
                    .with_timezone(&Local)
                    .format("%H:%M:%S")
                    .to_string(),
            )
            .style(Style::default().add_modifier(Modifier::DIM)),
        ]),
    ];

    if let Some(diagnostic) = snapshot.diagnostic() {
        rows.push(Row::new(vec![
            Cell::from("Diagnostics"),
            Cell::from(diagnostic).style(Style::default().fg(app.theme.warning)),
        ]));
    }

    let table = Table::new(rows, [Constraint::Length(14), Constraint::Fill(1)])
        .block(block)
        .column_spacing(2);

    frame.render_widget(table, area);
}
