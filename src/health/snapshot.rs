//! The aggregate health value published to the UI.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::spark::{self, SparkStatus, SparkThresholds};
use super::summary;
use crate::client::{
    Cluster, FailureRecord, Heartbeat, Job, Subsystem, Warehouse, WorkspaceIdentity,
};

/// Shown in place of a value whose probe failed.
pub const PLACEHOLDER: &str = "—";

/// A probe that did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub subsystem: Subsystem,
    pub message: String,
}

/// Outcome of one probe.
pub type ProbeResult<T> = Result<T, ProbeFailure>;

/// The settled results of every probe in one health refresh.
#[derive(Debug, Clone)]
pub struct ProbeSet {
    pub identity: ProbeResult<WorkspaceIdentity>,
    pub spark: ProbeResult<Option<Heartbeat>>,
    pub clusters: ProbeResult<Vec<Cluster>>,
    pub jobs: ProbeResult<Vec<Job>>,
    pub warehouses: ProbeResult<Vec<Warehouse>>,
    pub last_failure: ProbeResult<Option<FailureRecord>>,
}

impl ProbeSet {
    /// Every probe failure, in probe order.
    pub fn failures(&self) -> Vec<ProbeFailure> {
        [
            self.identity.as_ref().err(),
            self.spark.as_ref().err(),
            self.clusters.as_ref().err(),
            self.jobs.as_ref().err(),
            self.warehouses.as_ref().err(),
            self.last_failure.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }

    /// True when at least one probe produced a payload.
    pub fn any_succeeded(&self) -> bool {
        self.failures().len() < 6
    }
}

/// Fully populated workspace health at one instant.
///
/// Built once from a settled [`ProbeSet`] and never modified afterwards;
/// a failed probe leaves a placeholder, never a missing field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub workspace_host: String,
    pub workspace_user: String,
    pub active_profile: Option<String>,
    pub spark_status: SparkStatus,
    pub spark_display: String,
    pub cluster_health_display: String,
    pub job_health_display: String,
    pub running_warehouses: usize,
    pub total_warehouses: usize,
    pub warehouse_display: String,
    pub last_failure_display: String,
    /// Probes that failed, for the diagnostic line.
    pub probe_failures: Vec<ProbeFailure>,
    pub taken_at: DateTime<Utc>,
}

impl HealthSnapshot {
    /// Fold settled probe results into a snapshot.
    pub fn assemble(
        probes: &ProbeSet,
        active_profile: Option<String>,
        thresholds: &SparkThresholds,
        now: DateTime<Utc>,
    ) -> Self {
        let (workspace_host, workspace_user) = match &probes.identity {
            Ok(identity) => (identity.host.clone(), identity.user.clone()),
            Err(_) => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string()),
        };

        let (spark_status, spark_display) = match &probes.spark {
            Ok(heartbeat) => {
                let status = spark::classify(heartbeat.as_ref(), now, thresholds);
                (status, spark::describe(status, heartbeat.as_ref(), now))
            }
            Err(_) => (SparkStatus::Unknown, "unknown".to_string()),
        };

        let cluster_health_display = probes
            .clusters
            .as_ref()
            .map(|c| summary::summarize_clusters(c))
            .unwrap_or_else(|_| PLACEHOLDER.to_string());

        let job_health_display = probes
            .jobs
            .as_ref()
            .map(|j| summary::summarize_jobs(j))
            .unwrap_or_else(|_| PLACEHOLDER.to_string());

        let (running_warehouses, total_warehouses, warehouse_display) = match &probes.warehouses {
            Ok(warehouses) => {
                let (running, total) = summary::warehouse_counts(warehouses);
                (running, total, format!("{}/{} running", running, total))
            }
            Err(_) => (0, 0, PLACEHOLDER.to_string()),
        };

        Self {
            workspace_host,
            workspace_user,
            active_profile,
            spark_status,
            spark_display,
            cluster_health_display,
            job_health_display,
            running_warehouses,
            total_warehouses,
            warehouse_display,
            last_failure_display: Self::last_failure_display(probes, now),
            probe_failures: probes.failures(),
            taken_at: now,
        }
    }

    fn last_failure_display(probes: &ProbeSet, now: DateTime<Utc>) -> String {
        let sources_answered = probes.clusters.is_ok()
            || probes.jobs.is_ok()
            || probes.warehouses.is_ok()
            || probes.last_failure.is_ok();
        if !sources_answered {
            return PLACEHOLDER.to_string();
        }

        let candidates = probes
            .clusters
            .as_ref()
            .ok()
            .and_then(|c| summary::cluster_failure(c))
            .into_iter()
            .chain(probes.jobs.as_ref().ok().and_then(|j| summary::job_failure(j)))
            .chain(
                probes
                    .warehouses
                    .as_ref()
                    .ok()
                    .and_then(|w| summary::warehouse_failure(w)),
            )
            .chain(probes.last_failure.clone().ok().flatten());

        summary::describe_failure(summary::select_last_failure(candidates).as_ref(), now)
    }

    /// Profile name for display.
    pub fn profile_display(&self) -> &str {
        self.active_profile.as_deref().unwrap_or("default")
    }

    /// Diagnostic line for failed probes, e.g. "spark, jobs unavailable".
    pub fn diagnostic(&self) -> Option<String> {
        if self.probe_failures.is_empty() {
            return None;
        }
        let names: Vec<&str> = self.probe_failures.iter().map(|f| f.subsystem.label()).collect();
        Some(format!("{} unavailable", names.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClusterState, WarehouseState};

    fn fail<T>(subsystem: Subsystem) -> ProbeResult<T> {
        Err(ProbeFailure {
            subsystem,
            message: format!("{} unavailable", subsystem),
        })
    }

    fn probes(now: DateTime<Utc>) -> ProbeSet {
        ProbeSet {
            identity: Ok(WorkspaceIdentity {
                host: "adb-1.example.net".to_string(),
                user: "ops@example.com".to_string(),
            }),
            spark: Ok(Some(Heartbeat::Seen {
                at: now - chrono::Duration::seconds(10),
            })),
            clusters: Ok(vec![Cluster {
                id: "c-1".to_string(),
                name: "etl".to_string(),
                state: ClusterState::Running,
                state_message: None,
                state_changed_at: None,
            }]),
            jobs: Ok(vec![]),
            warehouses: Ok(vec![Warehouse {
                id: "w-1".to_string(),
                name: "bi".to_string(),
                state: WarehouseState::Running,
                state_message: None,
                state_changed_at: None,
            }]),
            last_failure: Ok(None),
        }
    }

    #[test]
    fn test_all_probes_succeed() {
        let now = Utc::now();
        let snapshot =
            HealthSnapshot::assemble(&probes(now), None, &SparkThresholds::default(), now);

        assert_eq!(snapshot.workspace_host, "adb-1.example.net");
        assert_eq!(snapshot.spark_status, SparkStatus::Connected);
        assert_eq!(snapshot.cluster_health_display, "1 running");
        assert_eq!(snapshot.job_health_display, "no jobs");
        assert_eq!(snapshot.warehouse_display, "1/1 running");
        assert_eq!(snapshot.last_failure_display, "none");
        assert_eq!(snapshot.profile_display(), "default");
        assert!(snapshot.diagnostic().is_none());
    }

    #[test]
    fn test_partial_failure_uses_placeholders() {
        let now = Utc::now();
        let mut set = probes(now);
        set.spark = fail(Subsystem::Spark);
        set.jobs = fail(Subsystem::Jobs);

        let snapshot = HealthSnapshot::assemble(
            &set,
            Some("prod".to_string()),
            &SparkThresholds::default(),
            now,
        );

        assert_eq!(snapshot.workspace_user, "ops@example.com");
        assert_eq!(snapshot.cluster_health_display, "1 running");
        assert_eq!(snapshot.running_warehouses, 1);
        assert_eq!(snapshot.spark_status, SparkStatus::Unknown);
        assert_eq!(snapshot.spark_display, "unknown");
        assert_eq!(snapshot.job_health_display, PLACEHOLDER);
        assert_eq!(snapshot.profile_display(), "prod");
        assert_eq!(snapshot.diagnostic().unwrap(), "spark, jobs unavailable");
        assert!(set.any_succeeded());
    }

    #[test]
    fn test_no_failure_sources_gives_placeholder() {
        let now = Utc::now();
        let mut set = probes(now);
        set.clusters = fail(Subsystem::Clusters);
        set.jobs = fail(Subsystem::Jobs);
        set.warehouses = fail(Subsystem::Warehouses);
        set.last_failure = fail(Subsystem::LastFailure);

        let snapshot = HealthSnapshot::assemble(&set, None, &SparkThresholds::default(), now);
        assert_eq!(snapshot.last_failure_display, PLACEHOLDER);
        assert_eq!(snapshot.warehouse_display, PLACEHOLDER);
        assert_eq!((snapshot.running_warehouses, snapshot.total_warehouses), (0, 0));
    }

    #[test]
    fn test_lookup_failure_is_reported() {
        let now = Utc::now();
        let mut set = probes(now);
        set.last_failure = Ok(Some(FailureRecord {
            subsystem: Subsystem::Jobs,
            resource: "nightly".to_string(),
            message: "Driver OOM".to_string(),
            at: now - chrono::Duration::seconds(30),
        }));

        let snapshot = HealthSnapshot::assemble(&set, None, &SparkThresholds::default(), now);
        assert_eq!(snapshot.last_failure_display, "jobs nightly: Driver OOM (30s ago)");
    }
}
