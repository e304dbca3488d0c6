//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::app::Severity;
use crate::client::{ClusterState, RunResult, WarehouseState};
use crate::health::SparkStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    pub warning: Color,
    pub critical: Color,
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    /// Badge shown while destructive actions are armed.
    pub armed: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            armed: Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            armed: Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn spark_style(&self, status: SparkStatus) -> Style {
        match status {
            SparkStatus::Connected => Style::default().fg(self.healthy),
            SparkStatus::Stale => Style::default().fg(self.warning),
            SparkStatus::Disconnected => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
            SparkStatus::Unknown => Style::default().add_modifier(Modifier::DIM),
        }
    }

    pub fn cluster_style(&self, state: ClusterState) -> Style {
        match state {
            ClusterState::Running => Style::default().fg(self.healthy),
            ClusterState::Pending
            | ClusterState::Restarting
            | ClusterState::Resizing
            | ClusterState::Terminating => Style::default().fg(self.warning),
            ClusterState::Error => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
            ClusterState::Terminated | ClusterState::Unknown => {
                Style::default().add_modifier(Modifier::DIM)
            }
        }
    }

    pub fn run_style(&self, result: RunResult) -> Style {
        match result {
            RunResult::Success => Style::default().fg(self.healthy),
            RunResult::Running => Style::default().fg(self.highlight),
            RunResult::Failed => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
            RunResult::Canceled | RunResult::Skipped => Style::default().fg(self.warning),
        }
    }

    pub fn warehouse_style(&self, state: WarehouseState) -> Style {
        match state {
            WarehouseState::Running => Style::default().fg(self.healthy),
            WarehouseState::Starting | WarehouseState::Stopping => {
                Style::default().fg(self.warning)
            }
            WarehouseState::Error => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
            WarehouseState::Stopped | WarehouseState::Deleted => {
                Style::default().add_modifier(Modifier::DIM)
            }
        }
    }

    pub fn severity_style(&self, severity: Severity) -> Style {
        match severity {
            Severity::Info => Style::default().fg(self.highlight),
            Severity::Success => Style::default().fg(self.healthy),
            Severity::Warning => Style::default().fg(self.warning),
            Severity::Error => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }
}
