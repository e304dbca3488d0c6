//! End-to-end flows over a workspace file: probe, aggregate, apply, act.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::NamedTempFile;
use tokio::runtime::Handle;

use brickwatch::client::ClusterState;
use brickwatch::health::PLACEHOLDER;
use brickwatch::{
    Action, AggregationError, App, ArmingGuard, FileClient, HealthAggregator, LoadState,
    RefreshCoordinator, Screen, Severity, SparkStatus, SparkThresholds, WorkspaceClient,
    WorkspaceState,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

fn workspace_json(unavailable: &str) -> String {
    format!(
        r#"{{
            "identity": {{ "host": "adb-1.example.net", "user": "ops@example.com" }},
            "spark": {{ "status": "seen", "at": "2026-10-18T08:58:00Z" }},
            "clusters": [
                {{ "id": "c-1", "name": "etl", "state": "RUNNING" }},
                {{ "id": "c-2", "name": "ml", "state": "ERROR",
                   "state_message": "capacity", "state_changed_at": "2026-10-18T08:50:00Z" }}
            ],
            "jobs": [
                {{ "id": "j-1", "name": "nightly",
                   "last_run": {{ "run_id": 7, "result": "FAILED",
                                  "started_at": "2026-10-18T08:00:00Z",
                                  "ended_at": "2026-10-18T08:55:00Z",
                                  "message": "OOM" }} }}
            ],
            "warehouses": [
                {{ "id": "w-1", "name": "bi", "state": "RUNNING" }},
                {{ "id": "w-2", "name": "adhoc", "state": "STOPPED" }}
            ],
            "unavailable": [{}]
        }}"#,
        unavailable
    )
}

fn workspace_file(unavailable: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", workspace_json(unavailable)).unwrap();
    file
}

fn aggregator(client: Arc<dyn WorkspaceClient>) -> HealthAggregator {
    HealthAggregator::new(client, Some("prod".to_string()))
        .with_thresholds(SparkThresholds::default())
        .with_probe_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn health_snapshot_from_workspace_file() {
    let file = workspace_file("");
    let client: Arc<dyn WorkspaceClient> = Arc::new(FileClient::new(file.path()));

    let snapshot = aggregator(client).build_at(now()).await.unwrap();

    assert_eq!(snapshot.workspace_host, "adb-1.example.net");
    assert_eq!(snapshot.profile_display(), "prod");
    assert_eq!(snapshot.spark_status, SparkStatus::Stale);
    assert_eq!(snapshot.cluster_health_display, "1 running, 1 error");
    assert_eq!(snapshot.job_health_display, "1 job, 1 failing");
    assert_eq!(snapshot.warehouse_display, "1/2 running");
    // The failed run ended after the cluster errored.
    assert_eq!(snapshot.last_failure_display, "jobs nightly: OOM (5m ago)");
    assert!(snapshot.diagnostic().is_none());
}

#[tokio::test]
async fn partial_outage_keeps_publishing() {
    let file = workspace_file(r#""spark", "jobs""#);
    let client: Arc<dyn WorkspaceClient> = Arc::new(FileClient::new(file.path()));

    let snapshot = aggregator(client).build_at(now()).await.unwrap();

    assert_eq!(snapshot.workspace_host, "adb-1.example.net");
    assert_eq!(snapshot.spark_status, SparkStatus::Unknown);
    assert_eq!(snapshot.spark_display, "unknown");
    assert_eq!(snapshot.job_health_display, PLACEHOLDER);
    assert_eq!(snapshot.cluster_health_display, "1 running, 1 error");
    assert_eq!(snapshot.warehouse_display, "1/2 running");
    assert_eq!(snapshot.last_failure_display, "clusters ml: capacity (10m ago)");
    assert_eq!(snapshot.diagnostic().as_deref(), Some("spark, jobs unavailable"));
}

#[tokio::test]
async fn unreadable_workspace_is_total_failure() {
    let client: Arc<dyn WorkspaceClient> =
        Arc::new(FileClient::new("/nonexistent/brickwatch/ws.json"));

    let err = aggregator(client).build().await.unwrap_err();
    let AggregationError::AllProbesFailed(failures) = err;
    assert_eq!(failures.len(), 6);
}

fn app_for(file: &NamedTempFile) -> App {
    let client: Arc<dyn WorkspaceClient> = Arc::new(FileClient::new(file.path()));
    App::new(
        Arc::clone(&client),
        aggregator(client),
        RefreshCoordinator::new(Handle::current()),
        ArmingGuard::default(),
    )
}

async fn settle(app: &mut App) {
    while app.next_outcome().await {}
}

fn read_state(file: &NamedTempFile) -> WorkspaceState {
    let content = std::fs::read_to_string(file.path()).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn failed_refresh_then_retry() {
    let file = workspace_file("");
    let mut app = app_for(&file);

    std::fs::write(file.path(), "{ not json").unwrap();
    app.start();
    settle(&mut app).await;
    assert!(matches!(app.health, LoadState::Failed(_)));

    std::fs::write(file.path(), workspace_json("")).unwrap();
    app.refresh_current();
    settle(&mut app).await;
    assert_eq!(
        app.health.ready().map(|s| s.workspace_host.as_str()),
        Some("adb-1.example.net")
    );
}

#[tokio::test]
async fn terminate_requires_arming() {
    let file = workspace_file("");
    let mut app = app_for(&file);

    app.set_screen(Screen::Clusters);
    settle(&mut app).await;
    assert_eq!(app.selected_cluster().unwrap().name, "etl");

    // Disarmed: nothing reaches the workspace.
    app.perform(Action::TerminateCluster);
    settle(&mut app).await;
    assert_eq!(read_state(&file).clusters[0].state, ClusterState::Running);
    assert_eq!(app.notifications().last().unwrap().severity, Severity::Warning);

    app.arm();
    app.perform(Action::TerminateCluster);
    settle(&mut app).await;

    assert_eq!(read_state(&file).clusters[0].state, ClusterState::Terminated);
    assert_eq!(
        app.selected_cluster().map(|c| c.state),
        Some(ClusterState::Terminated)
    );
    assert!(app
        .notifications()
        .iter()
        .any(|n| n.severity == Severity::Success));
}

#[tokio::test]
async fn run_job_allocates_new_run() {
    let file = workspace_file("");
    let mut app = app_for(&file);

    app.set_screen(Screen::Jobs);
    settle(&mut app).await;
    app.arm();
    app.perform(Action::RunJob);
    settle(&mut app).await;

    let run = read_state(&file).jobs[0].last_run.clone().unwrap();
    assert_eq!(run.run_id, 8);
    assert!(app
        .notifications()
        .iter()
        .any(|n| n.message == "Started run 8 of nightly"));
}

#[tokio::test]
async fn invalid_transition_is_reported() {
    let file = workspace_file("");
    let mut app = app_for(&file);

    app.set_screen(Screen::Warehouses);
    settle(&mut app).await;
    app.arm();
    // "bi" is already running.
    app.perform(Action::StartWarehouse);
    settle(&mut app).await;

    let last = app.notifications().last().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert!(last.message.contains("Failed to start bi"));
    assert!(last.message.contains("RUNNING"));
}
