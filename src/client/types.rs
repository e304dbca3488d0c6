//! Payloads returned by workspace clients.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One independently probed part of the workspace.
///
/// Declaration order is the tie-break priority used when several
/// subsystems report a failure at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Clusters,
    Jobs,
    Warehouses,
    LastFailure,
    Identity,
    Spark,
}

impl Subsystem {
    pub fn label(&self) -> &'static str {
        match self {
            Subsystem::Clusters => "clusters",
            Subsystem::Jobs => "jobs",
            Subsystem::Warehouses => "warehouses",
            Subsystem::LastFailure => "last-failure",
            Subsystem::Identity => "identity",
            Subsystem::Spark => "spark",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who and where we are connected as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceIdentity {
    pub host: String,
    pub user: String,
}

/// Last Spark activity reported by the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Heartbeat {
    Seen { at: DateTime<Utc> },
    /// The workspace has never seen Spark activity.
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Pending,
    Running,
    Restarting,
    Resizing,
    Terminating,
    Terminated,
    Error,
    Unknown,
}

impl ClusterState {
    pub fn label(&self) -> &'static str {
        match self {
            ClusterState::Pending => "PENDING",
            ClusterState::Running => "RUNNING",
            ClusterState::Restarting => "RESTARTING",
            ClusterState::Resizing => "RESIZING",
            ClusterState::Terminating => "TERMINATING",
            ClusterState::Terminated => "TERMINATED",
            ClusterState::Error => "ERROR",
            ClusterState::Unknown => "UNKNOWN",
        }
    }

    pub fn can_start(&self) -> bool {
        matches!(self, ClusterState::Terminated | ClusterState::Error)
    }

    pub fn can_terminate(&self) -> bool {
        matches!(
            self,
            ClusterState::Running
                | ClusterState::Pending
                | ClusterState::Resizing
                | ClusterState::Restarting
        )
    }

    pub fn can_restart(&self) -> bool {
        matches!(self, ClusterState::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub state: ClusterState,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub state_changed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResult {
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
}

impl RunResult {
    pub fn label(&self) -> &'static str {
        match self {
            RunResult::Running => "RUNNING",
            RunResult::Success => "SUCCESS",
            RunResult::Failed => "FAILED",
            RunResult::Canceled => "CANCELED",
            RunResult::Skipped => "SKIPPED",
        }
    }

    /// Only an active run can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, RunResult::Running)
    }

    /// A run can be repeated once it has finished, whatever the outcome.
    pub fn can_rerun(&self) -> bool {
        !self.can_cancel()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub run_id: u64,
    pub result: RunResult,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    /// Most recent run, if the job ever ran.
    #[serde(default)]
    pub last_run: Option<JobRun>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarehouseState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Deleted,
    Error,
}

impl WarehouseState {
    pub fn label(&self) -> &'static str {
        match self {
            WarehouseState::Starting => "STARTING",
            WarehouseState::Running => "RUNNING",
            WarehouseState::Stopping => "STOPPING",
            WarehouseState::Stopped => "STOPPED",
            WarehouseState::Deleted => "DELETED",
            WarehouseState::Error => "ERROR",
        }
    }

    pub fn can_start(&self) -> bool {
        matches!(self, WarehouseState::Stopped | WarehouseState::Error)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, WarehouseState::Running | WarehouseState::Starting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    pub state: WarehouseState,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub state_changed_at: Option<DateTime<Utc>>,
}

/// A failure reported by the workspace's own failure lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub subsystem: Subsystem,
    pub resource: String,
    pub message: String,
    pub at: DateTime<Utc>,
}
