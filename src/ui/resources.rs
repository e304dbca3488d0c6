//! Resource screens: cluster, job and warehouse tables.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, LoadState};
use crate::health::duration::{age_since, format_age};

pub fn render_clusters(frame: &mut Frame, app: &App, area: Rect) {
    let Some(clusters) = ready_or_placeholder(frame, app, area, "Clusters", &app.clusters) else {
        return;
    };
    let now = Utc::now();

    let rows: Vec<Row> = clusters
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.name.clone()),
                Cell::from(c.state.label()).style(app.theme.cluster_style(c.state)),
                Cell::from(since(c.state_changed_at, now)),
                Cell::from(c.state_message.clone().unwrap_or_default()),
                Cell::from(c.id.clone()).style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Fill(3),
        Constraint::Fill(1),
    ];
    render_table(
        frame,
        app,
        area,
        "Clusters",
        &["Name", "State", "Since", "Message", "Id"],
        rows,
        widths,
        app.selected_cluster,
    );
}

pub fn render_jobs(frame: &mut Frame, app: &App, area: Rect) {
    let Some(jobs) = ready_or_placeholder(frame, app, area, "Jobs", &app.jobs) else {
        return;
    };
    let now = Utc::now();

    let rows: Vec<Row> = jobs
        .iter()
        .map(|j| {
            let (run, result, started, message) = match &j.last_run {
                Some(run) => (
                    run.run_id.to_string(),
                    Cell::from(run.result.label()).style(app.theme.run_style(run.result)),
                    since(Some(run.started_at), now),
                    run.message.clone().unwrap_or_default(),
                ),
                None => (
                    "-".to_string(),
                    Cell::from("never run").style(Style::default().add_modifier(Modifier::DIM)),
                    "-".to_string(),
                    String::new(),
                ),
            };
            Row::new(vec![
                Cell::from(j.name.clone()),
                Cell::from(run),
                result,
                Cell::from(started),
                Cell::from(message),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Fill(3),
    ];
    render_table(
        frame,
        app,
        area,
        "Jobs",
        &["Name", "Run", "Result", "Started", "Message"],
        rows,
        widths,
        app.selected_job,
    );
}

pub fn render_warehouses(frame: &mut Frame, app: &App, area: Rect) {
    let Some(warehouses) =
        ready_or_placeholder(frame, app, area, "Warehouses", &app.warehouses)
    else {
        return;
    };
    let now = Utc::now();

    let rows: Vec<Row> = warehouses
        .iter()
        .map(|w| {
            Row::new(vec![
                Cell::from(w.name.clone()),
                Cell::from(w.state.label()).style(app.theme.warehouse_style(w.state)),
                Cell::from(since(w.state_changed_at, now)),
                Cell::from(w.state_message.clone().unwrap_or_default()),
                Cell::from(w.id.clone()).style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Fill(3),
        Constraint::Fill(1),
    ];
    render_table(
        frame,
        app,
        area,
        "Warehouses",
        &["Name", "State", "Since", "Message", "Id"],
        rows,
        widths,
        app.selected_warehouse,
    );
}

fn since(at: Option<chrono::DateTime<Utc>>, now: chrono::DateTime<Utc>) -> String {
    at.map(|at| format_age(age_since(at, now)))
        .unwrap_or_else(|| "-".to_string())
}

fn block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

/// Draw the loading or error state and return `None`, or hand back the
/// roster when it is ready.
fn ready_or_placeholder<'s, T>(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    state: &'s LoadState<Vec<T>>,
) -> Option<&'s [T]> {
    let paragraph = match state {
        LoadState::Ready(items) => return Some(items.as_slice()),
        LoadState::Loading => Paragraph::new(format!("Loading {}...", title.to_lowercase())),
        LoadState::Failed(message) => Paragraph::new(format!(
            "Failed to load {}: {}\n\nPress r to retry",
            title.to_lowercase(),
            message
        ))
        .style(Style::default().fg(app.theme.critical)),
    };

    let paragraph = paragraph
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block(app, format!(" {} ", title)));
    frame.render_widget(paragraph, area);
    None
}

#[allow(clippy::too_many_arguments)]
fn render_table<const N: usize>(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    headers: &[&'static str; N],
    rows: Vec<Row>,
    widths: [Constraint; N],
    selected: usize,
) {
    let count = rows.len();
    let header = Row::new(headers.iter().map(|h| Cell::from(*h)))
        .height(1)
        .style(app.theme.header);

    let position_info = if count > 0 {
        format!(" [{}/{}]", selected.min(count - 1) + 1, count)
    } else {
        String::new()
    };
    let title = format!(" {} ({}){} ", title, count, position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(app, title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if count > 0 {
        state.select(Some(selected.min(count - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
