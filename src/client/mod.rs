//! Workspace client abstraction.
//!
//! The dashboard never talks to the remote API directly: probes and action
//! handlers go through the [`WorkspaceClient`] capability set, so the
//! transport can be swapped without touching the health pipeline.
//!
//! - [`FileClient`]: serves a workspace described by a JSON file, re-reading
//!   it when it changes on disk

mod error;
mod file;
mod types;

pub use error::ClientError;
pub use file::{FileClient, WorkspaceState};
pub use types::{
    Cluster, ClusterState, FailureRecord, Heartbeat, Job, JobRun, RunResult, Subsystem, Warehouse,
    WarehouseState, WorkspaceIdentity,
};

use std::fmt::Debug;

use async_trait::async_trait;

/// Capabilities the dashboard needs from a remote workspace.
///
/// Every call may fail with a transport or auth error; callers treat such
/// failures as data, never as a reason to stop.
///
/// # Example
///
/// ```no_run
/// use brickwatch::{FileClient, WorkspaceClient};
///
/// # tokio_test::block_on(async {
/// let client = FileClient::new("workspace.json");
/// let clusters = client.list_clusters().await?;
/// println!("{} clusters", clusters.len());
/// # Ok::<_, brickwatch::ClientError>(())
/// # });
/// ```
#[async_trait]
pub trait WorkspaceClient: Send + Sync + Debug {
    /// Human-readable description of where data comes from.
    fn description(&self) -> &str;

    async fn fetch_identity(&self) -> Result<WorkspaceIdentity, ClientError>;

    /// Latest Spark heartbeat, `None` when the workspace has no data.
    async fn fetch_spark_heartbeat(&self) -> Result<Option<Heartbeat>, ClientError>;

    async fn list_clusters(&self) -> Result<Vec<Cluster>, ClientError>;

    async fn list_jobs(&self) -> Result<Vec<Job>, ClientError>;

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, ClientError>;

    async fn fetch_last_failure(&self) -> Result<Option<FailureRecord>, ClientError>;

    async fn start_cluster(&self, id: &str) -> Result<(), ClientError>;

    async fn terminate_cluster(&self, id: &str) -> Result<(), ClientError>;

    async fn restart_cluster(&self, id: &str) -> Result<(), ClientError>;

    /// Trigger a run of the job now and return the new run id.
    async fn run_job(&self, id: &str) -> Result<u64, ClientError>;

    /// Cancel the job's active run.
    async fn cancel_run(&self, job_id: &str) -> Result<(), ClientError>;

    /// Repeat the job's finished run and return the new run id.
    async fn rerun_job(&self, job_id: &str) -> Result<u64, ClientError>;

    async fn start_warehouse(&self, id: &str) -> Result<(), ClientError>;

    async fn stop_warehouse(&self, id: &str) -> Result<(), ClientError>;
}
