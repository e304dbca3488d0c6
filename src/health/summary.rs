//! Display summaries derived from resource rosters.

use chrono::{DateTime, Utc};

use super::duration::{age_since, format_age};
use crate::client::{
    Cluster, ClusterState, FailureRecord, Job, RunResult, Subsystem, Warehouse, WarehouseState,
};

/// Counts by state, e.g. "2 running, 1 pending, 3 terminated".
///
/// Buckets appear in a fixed order and empty ones are left out.
pub fn summarize_clusters(clusters: &[Cluster]) -> String {
    if clusters.is_empty() {
        return "no clusters".to_string();
    }

    let mut running = 0;
    let mut pending = 0;
    let mut error = 0;
    let mut terminated = 0;
    let mut unknown = 0;
    for cluster in clusters {
        match cluster.state {
            ClusterState::Running => running += 1,
            ClusterState::Pending | ClusterState::Restarting | ClusterState::Resizing => {
                pending += 1
            }
            ClusterState::Error => error += 1,
            ClusterState::Terminating | ClusterState::Terminated => terminated += 1,
            ClusterState::Unknown => unknown += 1,
        }
    }

    join_counts(&[
        (running, "running"),
        (pending, "pending"),
        (error, "error"),
        (terminated, "terminated"),
        (unknown, "unknown"),
    ])
}

/// Job totals, e.g. "12 jobs, 1 running, 2 failing".
///
/// A job is failing when its most recent run failed.
pub fn summarize_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "no jobs".to_string();
    }

    let result_count = |wanted: RunResult| {
        jobs.iter()
            .filter(|j| j.last_run.as_ref().is_some_and(|r| r.result == wanted))
            .count()
    };
    let running = result_count(RunResult::Running);
    let failing = result_count(RunResult::Failed);

    let total = if jobs.len() == 1 {
        "1 job".to_string()
    } else {
        format!("{} jobs", jobs.len())
    };
    let rest = join_counts(&[(running, "running"), (failing, "failing")]);
    if rest.is_empty() {
        total
    } else {
        format!("{}, {}", total, rest)
    }
}

/// Running and total warehouse counts.
pub fn warehouse_counts(warehouses: &[Warehouse]) -> (usize, usize) {
    let running = warehouses
        .iter()
        .filter(|w| w.state == WarehouseState::Running)
        .count();
    (running, warehouses.len())
}

fn join_counts(buckets: &[(usize, &str)]) -> String {
    buckets
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{} {}", n, label))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Most recent cluster that ended up in the error state.
pub fn cluster_failure(clusters: &[Cluster]) -> Option<FailureRecord> {
    clusters
        .iter()
        .filter(|c| c.state == ClusterState::Error)
        .filter_map(|c| {
            Some(FailureRecord {
                subsystem: Subsystem::Clusters,
                resource: c.name.clone(),
                message: c
                    .state_message
                    .clone()
                    .unwrap_or_else(|| c.state.label().to_string()),
                at: c.state_changed_at?,
            })
        })
        .max_by_key(|f| f.at)
}

/// Most recent failed job run.
pub fn job_failure(jobs: &[Job]) -> Option<FailureRecord> {
    jobs.iter()
        .filter_map(|j| {
            let run = j.last_run.as_ref()?;
            (run.result == RunResult::Failed).then(|| FailureRecord {
                subsystem: Subsystem::Jobs,
                resource: j.name.clone(),
                message: run
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("run {} {}", run.run_id, run.result.label())),
                at: run.ended_at.unwrap_or(run.started_at),
            })
        })
        .max_by_key(|f| f.at)
}

/// Most recent warehouse that ended up in the error state.
pub fn warehouse_failure(warehouses: &[Warehouse]) -> Option<FailureRecord> {
    warehouses
        .iter()
        .filter(|w| w.state == WarehouseState::Error)
        .filter_map(|w| {
            Some(FailureRecord {
                subsystem: Subsystem::Warehouses,
                resource: w.name.clone(),
                message: w
                    .state_message
                    .clone()
                    .unwrap_or_else(|| w.state.label().to_string()),
                at: w.state_changed_at?,
            })
        })
        .max_by_key(|f| f.at)
}

/// Pick the most recent failure; equal timestamps go to the subsystem
/// that sorts first (clusters, then jobs, then warehouses).
pub fn select_last_failure(
    candidates: impl IntoIterator<Item = FailureRecord>,
) -> Option<FailureRecord> {
    candidates
        .into_iter()
        .min_by(|a, b| b.at.cmp(&a.at).then(a.subsystem.cmp(&b.subsystem)))
}

/// "jobs nightly: OOM (5m ago)", or "none".
pub fn describe_failure(failure: Option<&FailureRecord>, now: DateTime<Utc>) -> String {
    match failure {
        Some(f) => format!(
            "{} {}: {} ({} ago)",
            f.subsystem,
            f.resource,
            f.message,
            format_age(age_since(f.at, now))
        ),
        None => "none".to_string(),
    }
}
