//! # brickwatch
//!
//! A terminal dashboard for watching a compute workspace (clusters, jobs,
//! SQL warehouses, Spark connectivity) and acting on it with an explicit,
//! time-limited arming step in front of every destructive command.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 presentation loop (main thread)              │
//! │  ┌─────────┐   ┌──────────┐   ┌──────┐                       │
//! │  │ events  │──▶│   app    │──▶│  ui  │──▶ Terminal           │
//! │  └─────────┘   │ (state)  │   └──────┘                       │
//! │                └──┬────▲──┘                                  │
//! │          guard ◀──┘    │ pump()                              │
//! │                   trigger()                                  │
//! │                ┌──▼────┴──┐                                  │
//! │                │ refresh  │  tokio runtime                   │
//! │                └──┬───────┘                                  │
//! │                   ▼                                          │
//! │              health ──▶ client (WorkspaceClient)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`guard`]**: the arming state machine that gates destructive actions
//! - **[`refresh`]**: runs fetches on a tokio runtime and hands back only the
//!   newest result per resource
//! - **[`health`]**: probes the workspace concurrently and folds the results
//!   into an immutable [`HealthSnapshot`]
//! - **[`client`]**: the [`WorkspaceClient`] capability set and the JSON file
//!   backend [`FileClient`]
//! - **[`app`]**, **[`events`]**, **[`ui`]**: presentation state, key handling
//!   and ratatui rendering
//! - **[`config`]**, **[`logging`]**: layered settings and file logging
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a workspace state file
//! brickwatch --workspace workspace.json
//!
//! # Write one health snapshot as JSON and exit
//! brickwatch --workspace workspace.json --snapshot health.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use brickwatch::{FileClient, HealthAggregator, WorkspaceClient};
//!
//! # tokio_test::block_on(async {
//! let client: Arc<dyn WorkspaceClient> = Arc::new(FileClient::new("workspace.json"));
//! let snapshot = HealthAggregator::new(client, None).build().await.unwrap();
//! println!("spark: {}", snapshot.spark_display);
//! # });
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod events;
pub mod guard;
pub mod health;
pub mod logging;
pub mod refresh;
pub mod ui;

// Re-export main types for convenience
pub use app::{Action, App, HintItem, LoadState, Payload, RefreshKey, Screen, Severity};
pub use client::{ClientError, FileClient, WorkspaceClient, WorkspaceState};
pub use config::{DashboardConfig, Settings};
pub use guard::{ArmState, ArmingGuard, GuardEvent};
pub use health::{AggregationError, HealthAggregator, HealthSnapshot, SparkStatus, SparkThresholds};
pub use refresh::{Outcome, RefreshCoordinator};
