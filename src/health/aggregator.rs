//! Runs the health probes and folds them into a snapshot.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use super::snapshot::{HealthSnapshot, ProbeFailure, ProbeResult, ProbeSet};
use super::spark::SparkThresholds;
use crate::client::{ClientError, Subsystem, WorkspaceClient};

/// Default upper bound on a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Aggregation failed as a whole.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// Not a single probe produced data.
    #[error("all health probes failed: {}", describe_failures(.0))]
    AllProbesFailed(Vec<ProbeFailure>),
}

fn describe_failures(failures: &[ProbeFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.subsystem, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds [`HealthSnapshot`]s from a workspace client.
///
/// Cheap to clone; clones share the client.
#[derive(Debug, Clone)]
pub struct HealthAggregator {
    client: Arc<dyn WorkspaceClient>,
    profile: Option<String>,
    thresholds: SparkThresholds,
    probe_timeout: Duration,
}

impl HealthAggregator {
    pub fn new(client: Arc<dyn WorkspaceClient>, profile: Option<String>) -> Self {
        Self {
            client,
            profile,
            thresholds: SparkThresholds::default(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_thresholds(mut self, thresholds: SparkThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub async fn build(&self) -> Result<HealthSnapshot, AggregationError> {
        self.build_at(Utc::now()).await
    }

    /// Run every probe concurrently and assemble the snapshot once all of
    /// them have settled.
    pub async fn build_at(&self, now: DateTime<Utc>) -> Result<HealthSnapshot, AggregationError> {
        let probes = self.run_probes().await;

        if !probes.any_succeeded() {
            return Err(AggregationError::AllProbesFailed(probes.failures()));
        }

        let snapshot = HealthSnapshot::assemble(&probes, self.profile.clone(), &self.thresholds, now);
        debug!(
            failed = snapshot.probe_failures.len(),
            spark = snapshot.spark_status.label(),
            "health snapshot assembled"
        );
        Ok(snapshot)
    }

    /// Run the probes without assembling anything.
    pub async fn run_probes(&self) -> ProbeSet {
        let client = &self.client;
        let (identity, spark, clusters, jobs, warehouses, last_failure) = tokio::join!(
            self.probe(Subsystem::Identity, client.fetch_identity()),
            self.probe(Subsystem::Spark, client.fetch_spark_heartbeat()),
            self.probe(Subsystem::Clusters, client.list_clusters()),
            self.probe(Subsystem::Jobs, client.list_jobs()),
            self.probe(Subsystem::Warehouses, client.list_warehouses()),
            self.probe(Subsystem::LastFailure, client.fetch_last_failure()),
        );

        ProbeSet {
            identity,
            spark,
            clusters,
            jobs,
            warehouses,
            last_failure,
        }
    }

    async fn probe<T>(
        &self,
        subsystem: Subsystem,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> ProbeResult<T> {
        let result = match tokio::time::timeout(self.probe_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };
        result.map_err(|err| {
            warn!(%subsystem, error = %err, "health probe failed");
            ProbeFailure {
                subsystem,
                message: err.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        Cluster, ClusterState, FailureRecord, Heartbeat, Job, Warehouse, WarehouseState,
        WorkspaceIdentity,
    };
    use crate::health::{SparkStatus, PLACEHOLDER};
    use async_trait::async_trait;

    /// Answers from fixed data; listed subsystems fail, `Spark` may hang.
    #[derive(Debug, Default)]
    struct StubClient {
        failing: Vec<Subsystem>,
        hang_spark: bool,
    }

    impl StubClient {
        fn check(&self, subsystem: Subsystem) -> Result<(), ClientError> {
            if self.failing.contains(&subsystem) {
                Err(ClientError::Unavailable(subsystem))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl WorkspaceClient for StubClient {
        fn description(&self) -> &str {
            "stub"
        }

        async fn fetch_identity(&self) -> Result<WorkspaceIdentity, ClientError> {
            self.check(Subsystem::Identity)?;
            Ok(WorkspaceIdentity {
                host: "adb-1.example.net".to_string(),
                user: "ops@example.com".to_string(),
            })
        }

        async fn fetch_spark_heartbeat(&self) -> Result<Option<Heartbeat>, ClientError> {
            if self.hang_spark {
                std::future::pending::<()>().await;
            }
            self.check(Subsystem::Spark)?;
            Ok(Some(Heartbeat::Seen { at: Utc::now() }))
        }

        async fn list_clusters(&self) -> Result<Vec<Cluster>, ClientError> {
            self.check(Subsystem::Clusters)?;
            Ok(vec![Cluster {
                id: "c-1".to_string(),
                name: "etl".to_string(),
                state: ClusterState::Running,
                state_message: None,
                state_changed_at: None,
            }])
        }

        async fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
            self.check(Subsystem::Jobs)?;
            Ok(vec![])
        }

        async fn list_warehouses(&self) -> Result<Vec<Warehouse>, ClientError> {
            self.check(Subsystem::Warehouses)?;
            Ok(vec![Warehouse {
                id: "w-1".to_string(),
                name: "bi".to_string(),
                state: WarehouseState::Stopped,
                state_message: None,
                state_changed_at: None,
            }])
        }

        async fn fetch_last_failure(&self) -> Result<Option<FailureRecord>, ClientError> {
            self.check(Subsystem::LastFailure)?;
            Ok(None)
        }

        async fn start_cluster(&self, _id: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn terminate_cluster(&self, _id: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn restart_cluster(&self, _id: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn run_job(&self, _id: &str) -> Result<u64, ClientError> {
            Ok(1)
        }

        async fn cancel_run(&self, _job_id: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn rerun_job(&self, _job_id: &str) -> Result<u64, ClientError> {
            Ok(2)
        }

        async fn start_warehouse(&self, _id: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn stop_warehouse(&self, _id: &str) -> Result<(), ClientError> {
            Ok(())
        }
    }

    fn aggregator(client: StubClient) -> HealthAggregator {
        HealthAggregator::new(Arc::new(client), Some("prod".to_string()))
    }

    #[tokio::test]
    async fn test_build_with_all_probes() {
        let snapshot = aggregator(StubClient::default()).build().await.unwrap();
        assert_eq!(snapshot.workspace_host, "adb-1.example.net");
        assert_eq!(snapshot.spark_status, SparkStatus::Connected);
        assert_eq!(snapshot.warehouse_display, "0/1 running");
        assert!(snapshot.probe_failures.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_still_publishes() {
        let client = StubClient {
            failing: vec![Subsystem::Spark, Subsystem::Jobs],
            ..Default::default()
        };
        let snapshot = aggregator(client).build().await.unwrap();

        assert_eq!(snapshot.workspace_user, "ops@example.com");
        assert_eq!(snapshot.cluster_health_display, "1 running");
        assert_eq!(snapshot.total_warehouses, 1);
        assert_eq!(snapshot.spark_status, SparkStatus::Unknown);
        assert_eq!(snapshot.job_health_display, PLACEHOLDER);
        let failed: Vec<Subsystem> = snapshot.probe_failures.iter().map(|f| f.subsystem).collect();
        assert_eq!(failed, vec![Subsystem::Spark, Subsystem::Jobs]);
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let client = StubClient {
            failing: vec![
                Subsystem::Identity,
                Subsystem::Spark,
                Subsystem::Clusters,
                Subsystem::Jobs,
                Subsystem::Warehouses,
                Subsystem::LastFailure,
            ],
            ..Default::default()
        };
        let err = aggregator(client).build().await.unwrap_err();
        let AggregationError::AllProbesFailed(failures) = &err;
        assert_eq!(failures.len(), 6);
        assert!(err.to_string().starts_with("all health probes failed: identity"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_times_out() {
        let client = StubClient {
            hang_spark: true,
            ..Default::default()
        };
        let snapshot = aggregator(client)
            .with_probe_timeout(Duration::from_secs(2))
            .build()
            .await
            .unwrap();

        assert_eq!(snapshot.spark_status, SparkStatus::Unknown);
        assert_eq!(snapshot.probe_failures[0].message, "Request timed out");
    }
}
