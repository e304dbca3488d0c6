//! Workspace health aggregation.
//!
//! This module turns independent subsystem probes into one immutable
//! [`HealthSnapshot`] suitable for display.
//!
//! ## Submodules
//!
//! - [`aggregator`]: runs the probes concurrently ([`HealthAggregator`])
//! - [`duration`]: parsing and formatting of durations and ages
//! - [`snapshot`]: the snapshot value and probe bookkeeping
//! - [`spark`]: Spark connectivity classification
//! - [`summary`]: roster summaries and last-failure selection
//!
//! ## Data Flow
//!
//! ```text
//! WorkspaceClient ──┬─ identity ──────┐
//!                   ├─ spark ─────────┤
//!                   ├─ clusters ──────┤  tokio::join!
//!                   ├─ jobs ──────────┼──────────────▶ ProbeSet
//!                   ├─ warehouses ────┤                   │
//!                   └─ last failure ──┘                   ▼
//!                                           HealthSnapshot::assemble()
//! ```

pub mod aggregator;
pub mod duration;
pub mod snapshot;
pub mod spark;
pub mod summary;

pub use aggregator::{AggregationError, HealthAggregator, DEFAULT_PROBE_TIMEOUT};
pub use snapshot::{HealthSnapshot, ProbeFailure, ProbeResult, ProbeSet, PLACEHOLDER};
pub use spark::{SparkStatus, SparkThresholds};
