//! File-backed workspace client.
//!
//! Serves a workspace described by a JSON file. The file is re-read only
//! when its modification time changes, so it can be edited by hand (or by a
//! script) while the dashboard is running. Actions update the in-memory
//! state and write it back.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Cluster, ClusterState, ClientError, FailureRecord, Heartbeat, Job, JobRun, RunResult,
    Subsystem, Warehouse, WarehouseState, WorkspaceClient, WorkspaceIdentity,
};

/// Everything the file describes about a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceState {
    #[serde(default)]
    pub identity: WorkspaceIdentity,
    #[serde(default)]
    pub spark: Option<Heartbeat>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub last_failure: Option<FailureRecord>,
    /// Subsystems that fail every call, for simulating partial outages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<Subsystem>,
}

impl WorkspaceState {
    fn check(&self, subsystem: Subsystem) -> Result<(), ClientError> {
        if self.unavailable.contains(&subsystem) {
            Err(ClientError::Unavailable(subsystem))
        } else {
            Ok(())
        }
    }

    fn cluster_mut(&mut self, id: &str) -> Result<&mut Cluster, ClientError> {
        self.clusters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    fn job_mut(&mut self, id: &str) -> Result<&mut Job, ClientError> {
        self.jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    /// Start a fresh run of `job_id` with the next workspace-wide run id.
    fn start_run(&mut self, job_id: &str) -> Result<u64, ClientError> {
        let next_run_id = self
            .jobs
            .iter()
            .filter_map(|j| j.last_run.as_ref().map(|r| r.run_id))
            .max()
            .unwrap_or(0)
            + 1;
        let job = self.job_mut(job_id)?;
        job.last_run = Some(JobRun {
            run_id: next_run_id,
            result: RunResult::Running,
            started_at: Utc::now(),
            ended_at: None,
            message: None,
        });
        Ok(next_run_id)
    }

    fn warehouse_mut(&mut self, id: &str) -> Result<&mut Warehouse, ClientError> {
        self.warehouses
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }
}

#[derive(Debug, Default)]
struct Cache {
    last_modified: Option<SystemTime>,
    state: Option<WorkspaceState>,
}

/// A workspace client reading from a JSON file.
#[derive(Debug)]
pub struct FileClient {
    path: PathBuf,
    description: String,
    cache: Mutex<Cache>,
    /// Serialises read-modify-write cycles of actions.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileClient {
    /// Create a client for the given path. The file is read lazily.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            cache: Mutex::new(Cache::default()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the path being served.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn modified_time(&self) -> Option<SystemTime> {
        tokio::fs::metadata(&self.path).await.ok()?.modified().ok()
    }

    /// Current state, re-reading the file if it changed since the last read.
    async fn load(&self) -> Result<WorkspaceState, ClientError> {
        let current_modified = self.modified_time().await;
        {
            let cache = self.cache();
            if let (Some(state), Some(last), Some(current)) =
                (&cache.state, cache.last_modified, current_modified)
            {
                // Any mtime change invalidates, including a step backwards.
                if current == last {
                    return Ok(state.clone());
                }
            }
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ClientError::Io(format!("{}: {}", self.path.display(), e)))?;
        let state: WorkspaceState = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), "workspace file loaded");

        let mut cache = self.cache();
        cache.state = Some(state.clone());
        cache.last_modified = current_modified;
        Ok(state)
    }

    async fn read<T>(
        &self,
        subsystem: Subsystem,
        select: impl FnOnce(WorkspaceState) -> T,
    ) -> Result<T, ClientError> {
        let state = self.load().await?;
        state.check(subsystem)?;
        Ok(select(state))
    }

    /// Apply `change` to the current state and persist the result.
    async fn update<T>(
        &self,
        subsystem: Subsystem,
        change: impl FnOnce(&mut WorkspaceState) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let _write = self.write_lock.lock().await;

        let mut state = self.load().await?;
        state.check(subsystem)?;
        let value = change(&mut state)?;

        let json = serde_json::to_string_pretty(&state)?;
        tokio::fs::write(&self.path, json).await?;
        let modified = self.modified_time().await;

        let mut cache = self.cache();
        cache.state = Some(state);
        cache.last_modified = modified;
        Ok(value)
    }
}

fn invalid(id: &str, state: &str, action: &'static str) -> ClientError {
    ClientError::InvalidState {
        id: id.to_string(),
        state: state.to_string(),
        action,
    }
}

#[async_trait]
impl WorkspaceClient for FileClient {
    fn description(&self) -> &str {
        &self.description
    }

    async fn fetch_identity(&self) -> Result<WorkspaceIdentity, ClientError> {
        self.read(Subsystem::Identity, |s| s.identity).await
    }

    async fn fetch_spark_heartbeat(&self) -> Result<Option<Heartbeat>, ClientError> {
        self.read(Subsystem::Spark, |s| s.spark).await
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>, ClientError> {
        self.read(Subsystem::Clusters, |s| s.clusters).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
        self.read(Subsystem::Jobs, |s| s.jobs).await
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, ClientError> {
        self.read(Subsystem::Warehouses, |s| s.warehouses).await
    }

    async fn fetch_last_failure(&self) -> Result<Option<FailureRecord>, ClientError> {
        self.read(Subsystem::LastFailure, |s| s.last_failure).await
    }

    async fn start_cluster(&self, id: &str) -> Result<(), ClientError> {
        self.update(Subsystem::Clusters, |s| {
            let cluster = s.cluster_mut(id)?;
            if !cluster.state.can_start() {
                return Err(invalid(id, cluster.state.label(), "start"));
            }
            cluster.state = ClusterState::Running;
            cluster.state_message = None;
            cluster.state_changed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    async fn terminate_cluster(&self, id: &str) -> Result<(), ClientError> {
        self.update(Subsystem::Clusters, |s| {
            let cluster = s.cluster_mut(id)?;
            if !cluster.state.can_terminate() {
                return Err(invalid(id, cluster.state.label(), "terminate"));
            }
            cluster.state = ClusterState::Terminated;
            cluster.state_message = Some("Terminated by user".to_string());
            cluster.state_changed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    async fn restart_cluster(&self, id: &str) -> Result<(), ClientError> {
        self.update(Subsystem::Clusters, |s| {
            let cluster = s.cluster_mut(id)?;
            if !cluster.state.can_restart() {
                return Err(invalid(id, cluster.state.label(), "restart"));
            }
            cluster.state = ClusterState::Running;
            cluster.state_message = None;
            cluster.state_changed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    async fn run_job(&self, id: &str) -> Result<u64, ClientError> {
        self.update(Subsystem::Jobs, |s| s.start_run(id)).await
    }

    async fn cancel_run(&self, job_id: &str) -> Result<(), ClientError> {
        self.update(Subsystem::Jobs, |s| {
            let job = s.job_mut(job_id)?;
            let run = match job.last_run.as_mut() {
                Some(run) if run.result.can_cancel() => run,
                Some(run) => return Err(invalid(job_id, run.result.label(), "cancel")),
                None => return Err(invalid(job_id, "NEVER RUN", "cancel")),
            };
            run.result = RunResult::Canceled;
            run.ended_at = Some(Utc::now());
            run.message = Some("Canceled by user".to_string());
            Ok(())
        })
        .await
    }

    async fn rerun_job(&self, job_id: &str) -> Result<u64, ClientError> {
        self.update(Subsystem::Jobs, |s| {
            match s.job_mut(job_id)?.last_run.as_ref() {
                Some(run) if run.result.can_rerun() => {}
                Some(run) => return Err(invalid(job_id, run.result.label(), "rerun")),
                None => return Err(invalid(job_id, "NEVER RUN", "rerun")),
            }
            s.start_run(job_id)
        })
        .await
    }

    async fn start_warehouse(&self, id: &str) -> Result<(), ClientError> {
        self.update(Subsystem::Warehouses, |s| {
            let warehouse = s.warehouse_mut(id)?;
            if !warehouse.state.can_start() {
                return Err(invalid(id, warehouse.state.label(), "start"));
            }
            warehouse.state = WarehouseState::Running;
            warehouse.state_message = None;
            warehouse.state_changed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    async fn stop_warehouse(&self, id: &str) -> Result<(), ClientError> {
        self.update(Subsystem::Warehouses, |s| {
            let warehouse = s.warehouse_mut(id)?;
            if !warehouse.state.can_stop() {
                return Err(invalid(id, warehouse.state.label(), "stop"));
            }
            warehouse.state = WarehouseState::Stopped;
            warehouse.state_message = None;
            warehouse.state_changed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }
}
