//! Application state and the operator's actions.
//!
//! [`App`] is the presentation context. It owns everything the screen shows
//! (the health snapshot, resource rosters, arming state and toasts) and is
//! only ever touched from the UI loop. Slow work goes out through the
//! [`RefreshCoordinator`] and comes back through [`App::pump`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};

use crate::client::{Cluster, Job, JobRun, Warehouse, WorkspaceClient};
use crate::guard::{ArmState, ArmingGuard, GuardEvent};
use crate::health::{HealthAggregator, HealthSnapshot};
use crate::refresh::{Outcome, RefreshCoordinator};
use crate::ui::Theme;

/// How long a toast stays on screen.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Default interval between periodic refreshes of the current screen.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const MAX_NOTIFICATIONS: usize = 5;

/// The screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Clusters,
    Jobs,
    Warehouses,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Home, Screen::Clusters, Screen::Jobs, Screen::Warehouses];

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Clusters => "Clusters",
            Screen::Jobs => "Jobs",
            Screen::Warehouses => "Warehouses",
        }
    }

    /// Key that selects this screen.
    pub fn key(&self) -> char {
        match self {
            Screen::Home => 'h',
            Screen::Clusters => 'c',
            Screen::Jobs => 'j',
            Screen::Warehouses => 'w',
        }
    }

    /// The data this screen displays, refreshed on entry and periodically.
    pub fn refresh_key(&self) -> RefreshKey {
        match self {
            Screen::Home => RefreshKey::Health,
            Screen::Clusters => RefreshKey::Clusters,
            Screen::Jobs => RefreshKey::Jobs,
            Screen::Warehouses => RefreshKey::Warehouses,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Screen::Home => Screen::Clusters,
            Screen::Clusters => Screen::Jobs,
            Screen::Jobs => Screen::Warehouses,
            Screen::Warehouses => Screen::Home,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Screen::Home => Screen::Warehouses,
            Screen::Clusters => Screen::Home,
            Screen::Jobs => Screen::Clusters,
            Screen::Warehouses => Screen::Jobs,
        }
    }
}

/// Exclusivity key for background work.
///
/// Each logical resource has one key shared by manual, periodic and
/// screen-entry refreshes. Actions use their own non-exclusive key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshKey {
    Health,
    Clusters,
    Jobs,
    Warehouses,
    Action,
}

/// Result of a background request.
#[derive(Debug)]
pub enum Payload {
    Health(HealthSnapshot),
    Clusters(Vec<Cluster>),
    Jobs(Vec<Job>),
    Warehouses(Vec<Warehouse>),
    Action(ActionReport),
}

/// A mutating command the operator can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartCluster,
    TerminateCluster,
    RestartCluster,
    RunJob,
    CancelRun,
    RerunJob,
    StartWarehouse,
    StopWarehouse,
}

impl Action {
    /// Used in "Press A to arm before ..." warnings.
    pub fn label(&self) -> &'static str {
        match self {
            Action::StartCluster => "starting cluster",
            Action::TerminateCluster => "terminating cluster",
            Action::RestartCluster => "restarting cluster",
            Action::RunJob => "running job",
            Action::CancelRun => "cancelling run",
            Action::RerunJob => "rerunning job",
            Action::StartWarehouse => "starting warehouse",
            Action::StopWarehouse => "stopping warehouse",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Action::StartCluster | Action::StartWarehouse => "start",
            Action::TerminateCluster => "terminate",
            Action::RestartCluster => "restart",
            Action::RunJob => "run",
            Action::CancelRun => "cancel",
            Action::RerunJob => "rerun",
            Action::StopWarehouse => "stop",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Action::StartCluster | Action::StartWarehouse => "s",
            Action::TerminateCluster => "t",
            Action::RestartCluster | Action::RerunJob => "R",
            Action::RunJob => "n",
            Action::CancelRun => "c",
            Action::StopWarehouse => "S",
        }
    }

    /// Short footer hint.
    pub fn hint(&self) -> &'static str {
        match self {
            Action::RunJob => "run now",
            Action::CancelRun => "cancel run",
            other => other.verb(),
        }
    }

    pub fn screen(&self) -> Screen {
        match self {
            Action::StartCluster | Action::TerminateCluster | Action::RestartCluster => {
                Screen::Clusters
            }
            Action::RunJob | Action::CancelRun | Action::RerunJob => Screen::Jobs,
            Action::StartWarehouse | Action::StopWarehouse => Screen::Warehouses,
        }
    }

    /// Actions offered on `screen`.
    pub fn for_screen(screen: Screen) -> &'static [Action] {
        match screen {
            Screen::Home => &[],
            Screen::Clusters => &[
                Action::StartCluster,
                Action::TerminateCluster,
                Action::RestartCluster,
            ],
            Screen::Jobs => &[Action::RunJob, Action::CancelRun, Action::RerunJob],
            Screen::Warehouses => &[Action::StartWarehouse, Action::StopWarehouse],
        }
    }
}

/// A completed action, reported back to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: Action,
    pub target: String,
    /// Run id allocated by [`Action::RunJob`] or [`Action::RerunJob`].
    pub run_id: Option<u64>,
}

impl ActionReport {
    pub fn message(&self) -> String {
        match self.run_id {
            Some(run_id) => format!("Started run {} of {}", run_id, self.target),
            None => format!("Requested {} of {}", self.action.verb(), self.target),
        }
    }
}

/// Loading state of one piece of displayed data.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// What the home screen shows.
pub type HealthView = LoadState<HealthSnapshot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast shown for [`NOTIFICATION_TTL`].
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub created: Instant,
}

/// One footer hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintItem {
    pub key: &'static str,
    pub label: &'static str,
    pub destructive: bool,
    pub enabled: bool,
}

impl HintItem {
    fn plain(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            destructive: false,
            enabled: true,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub show_help: bool,

    client: Arc<dyn WorkspaceClient>,
    aggregator: HealthAggregator,
    coordinator: RefreshCoordinator<RefreshKey, Payload>,
    guard: ArmingGuard,

    pub health: HealthView,
    pub clusters: LoadState<Vec<Cluster>>,
    pub jobs: LoadState<Vec<Job>>,
    pub warehouses: LoadState<Vec<Warehouse>>,

    pub selected_cluster: usize,
    pub selected_job: usize,
    pub selected_warehouse: usize,

    refresh_interval: Duration,
    last_refresh: Instant,
    notifications: Vec<Notification>,

    pub theme: Theme,
}

impl App {
    /// Create the presentation context from its collaborators.
    pub fn new(
        client: Arc<dyn WorkspaceClient>,
        aggregator: HealthAggregator,
        coordinator: RefreshCoordinator<RefreshKey, Payload>,
        guard: ArmingGuard,
    ) -> Self {
        Self {
            running: true,
            screen: Screen::Home,
            show_help: false,
            client,
            aggregator,
            coordinator,
            guard,
            health: LoadState::Loading,
            clusters: LoadState::Loading,
            jobs: LoadState::Loading,
            warehouses: LoadState::Loading,
            selected_cluster: 0,
            selected_job: 0,
            selected_warehouse: 0,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            last_refresh: Instant::now(),
            notifications: Vec::new(),
            theme: Theme::dark(),
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Returns a description of the workspace backend.
    pub fn source_description(&self) -> &str {
        self.client.description()
    }

    /// Kick off the first health refresh.
    pub fn start(&mut self) {
        self.refresh(RefreshKey::Health);
        self.last_refresh = Instant::now();
    }

    // --- presentation interface ---

    pub fn on_snapshot_ready(&mut self, snapshot: HealthSnapshot) {
        if let Some(diagnostic) = snapshot.diagnostic() {
            warn!(%diagnostic, "health snapshot is partial");
        }
        self.health = LoadState::Ready(snapshot);
    }

    pub fn on_snapshot_error(&mut self, message: String) {
        warn!(%message, "health refresh failed");
        self.health = LoadState::Failed(message);
    }

    pub fn arm_state(&self) -> ArmState {
        self.guard.state()
    }

    pub fn is_armed(&self) -> bool {
        self.guard.is_armed()
    }

    /// Length of a fresh armed window.
    pub fn arm_window(&self) -> Duration {
        self.guard.window()
    }

    /// Seconds left in the armed window, for the countdown.
    pub fn arm_remaining_seconds(&self) -> Option<u64> {
        self.guard.remaining_seconds()
    }

    /// Footer hints for the current screen.
    ///
    /// Destructive entries are enabled only while armed and when they apply
    /// to the selected resource.
    pub fn context_actions(&self) -> Vec<HintItem> {
        let armed = self.is_armed();
        let mut hints: Vec<HintItem> = Action::for_screen(self.screen)
            .iter()
            .map(|action| HintItem {
                key: action.key(),
                label: action.hint(),
                destructive: true,
                enabled: armed && self.applies(*action),
            })
            .collect();

        hints.push(HintItem::plain("r", "refresh"));
        if armed {
            hints.push(HintItem::plain("Esc", "disarm"));
        } else {
            hints.push(HintItem::plain("A", "arm"));
        }
        hints.push(HintItem::plain("?", "help"));
        hints.push(HintItem::plain("q", "quit"));
        hints
    }

    // --- loop hooks ---

    /// Apply every outcome that has arrived and every guard event.
    ///
    /// Returns true if anything was applied.
    pub fn pump(&mut self) -> bool {
        let outcomes = self.coordinator.drain();
        let changed = !outcomes.is_empty();
        for outcome in outcomes {
            self.apply(outcome);
        }
        self.flush_guard_events();
        changed
    }

    /// Wait for the next outcome and apply it. Returns false once nothing
    /// is outstanding.
    pub async fn next_outcome(&mut self) -> bool {
        match self.coordinator.recv().await {
            Some(outcome) => {
                self.apply(outcome);
                self.flush_guard_events();
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Periodic work: guard expiry, timed refresh, toast expiry.
    pub fn tick_at(&mut self, now: Instant) {
        self.guard.tick_at(now);
        self.flush_guard_events();

        if now.saturating_duration_since(self.last_refresh) >= self.refresh_interval {
            self.last_refresh = now;
            self.refresh(self.screen.refresh_key());
        }

        self.notifications
            .retain(|n| now.saturating_duration_since(n.created) < NOTIFICATION_TTL);
    }

    // --- refresh ---

    /// Refresh the current screen on request.
    pub fn refresh_current(&mut self) {
        self.refresh(self.screen.refresh_key());
        self.last_refresh = Instant::now();
        self.notify(
            Severity::Info,
            format!("Refreshing {}...", self.screen.label().to_lowercase()),
        );
    }

    /// Trigger an exclusive refresh of `key`.
    pub fn refresh(&mut self, key: RefreshKey) {
        let client = Arc::clone(&self.client);
        match key {
            RefreshKey::Health => {
                let aggregator = self.aggregator.clone();
                self.coordinator.trigger(key, true, async move {
                    anyhow::Ok(Payload::Health(aggregator.build().await?))
                });
            }
            RefreshKey::Clusters => {
                self.coordinator.trigger(key, true, async move {
                    anyhow::Ok(Payload::Clusters(client.list_clusters().await?))
                });
            }
            RefreshKey::Jobs => {
                self.coordinator.trigger(key, true, async move {
                    anyhow::Ok(Payload::Jobs(client.list_jobs().await?))
                });
            }
            RefreshKey::Warehouses => {
                self.coordinator.trigger(key, true, async move {
                    anyhow::Ok(Payload::Warehouses(client.list_warehouses().await?))
                });
            }
            RefreshKey::Action => {}
        }
    }

    /// Whether the current screen has a refresh in flight.
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_pending(&self.screen.refresh_key())
    }

    fn apply(&mut self, outcome: Outcome<RefreshKey, Payload>) {
        match outcome.result {
            Ok(Payload::Health(snapshot)) => self.on_snapshot_ready(snapshot),
            Ok(Payload::Clusters(clusters)) => {
                self.selected_cluster = clamp(self.selected_cluster, clusters.len());
                self.clusters = LoadState::Ready(clusters);
            }
            Ok(Payload::Jobs(jobs)) => {
                self.selected_job = clamp(self.selected_job, jobs.len());
                self.jobs = LoadState::Ready(jobs);
            }
            Ok(Payload::Warehouses(warehouses)) => {
                self.selected_warehouse = clamp(self.selected_warehouse, warehouses.len());
                self.warehouses = LoadState::Ready(warehouses);
            }
            Ok(Payload::Action(report)) => {
                info!(action = report.action.label(), target = %report.target, "action completed");
                self.notify(Severity::Success, report.message());
                self.refresh(report.action.screen().refresh_key());
                self.refresh(RefreshKey::Health);
            }
            Err(message) => match outcome.key {
                RefreshKey::Health => self.on_snapshot_error(message),
                RefreshKey::Clusters => self.clusters = LoadState::Failed(message),
                RefreshKey::Jobs => self.jobs = LoadState::Failed(message),
                RefreshKey::Warehouses => self.warehouses = LoadState::Failed(message),
                RefreshKey::Action => {
                    warn!(%message, "action failed");
                    self.notify(Severity::Error, message);
                }
            },
        }
    }

    // --- arming and actions ---

    pub fn arm(&mut self) {
        self.guard.arm();
        self.flush_guard_events();
    }

    pub fn disarm(&mut self) {
        self.guard.disarm();
        self.flush_guard_events();
    }

    /// Gate for destructive actions; warns the operator when disarmed.
    pub fn require_armed(&mut self, action: &str) -> bool {
        let armed = self.guard.require_armed(action);
        self.flush_guard_events();
        armed
    }

    /// Issue `action` against the selected resource of the current screen.
    pub fn perform(&mut self, action: Action) {
        if action.screen() != self.screen {
            return;
        }
        if !self.require_armed(action.label()) {
            return;
        }
        let Some((id, name)) = self.target(action) else {
            self.notify(Severity::Warning, "Nothing selected".to_string());
            return;
        };

        info!(action = action.label(), %id, %name, "dispatching action");
        self.notify(
            Severity::Info,
            format!("Requesting {} of {}...", action.verb(), name),
        );

        let client = Arc::clone(&self.client);
        self.coordinator
            .trigger(RefreshKey::Action, false, async move {
                let run_id = match action {
                    Action::StartCluster => client.start_cluster(&id).await.map(|_| None),
                    Action::TerminateCluster => client.terminate_cluster(&id).await.map(|_| None),
                    Action::RestartCluster => client.restart_cluster(&id).await.map(|_| None),
                    Action::RunJob => client.run_job(&id).await.map(Some),
                    Action::CancelRun => client.cancel_run(&id).await.map(|_| None),
                    Action::RerunJob => client.rerun_job(&id).await.map(Some),
                    Action::StartWarehouse => client.start_warehouse(&id).await.map(|_| None),
                    Action::StopWarehouse => client.stop_warehouse(&id).await.map(|_| None),
                }
                .with_context(|| format!("Failed to {} {}", action.verb(), name))?;

                anyhow::Ok(Payload::Action(ActionReport {
                    action,
                    target: name,
                    run_id,
                }))
            });
    }

    fn target(&self, action: Action) -> Option<(String, String)> {
        match action.screen() {
            Screen::Clusters => self.selected_cluster().map(|c| (c.id.clone(), c.name.clone())),
            Screen::Jobs => self.selected_job().map(|j| (j.id.clone(), j.name.clone())),
            Screen::Warehouses => self
                .selected_warehouse()
                .map(|w| (w.id.clone(), w.name.clone())),
            Screen::Home => None,
        }
    }

    fn applies(&self, action: Action) -> bool {
        match action {
            Action::StartCluster => self.selected_cluster().is_some_and(|c| c.state.can_start()),
            Action::TerminateCluster => self
                .selected_cluster()
                .is_some_and(|c| c.state.can_terminate()),
            Action::RestartCluster => self
                .selected_cluster()
                .is_some_and(|c| c.state.can_restart()),
            Action::RunJob => self.selected_job().is_some(),
            Action::CancelRun => self.selected_run().is_some_and(|r| r.result.can_cancel()),
            Action::RerunJob => self.selected_run().is_some_and(|r| r.result.can_rerun()),
            Action::StartWarehouse => self
                .selected_warehouse()
                .is_some_and(|w| w.state.can_start()),
            Action::StopWarehouse => self
                .selected_warehouse()
                .is_some_and(|w| w.state.can_stop()),
        }
    }

    // --- notifications ---

    pub fn notify(&mut self, severity: Severity, message: String) {
        self.notifications.push(Notification {
            message,
            severity,
            created: Instant::now(),
        });
        if self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Live toasts, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    fn flush_guard_events(&mut self) {
        for event in self.guard.drain_events() {
            let severity = match event {
                GuardEvent::Armed { .. } | GuardEvent::Rejected { .. } => Severity::Warning,
                GuardEvent::Disarmed | GuardEvent::Expired => Severity::Info,
            };
            self.notify(severity, event.message());
        }
    }

    // --- navigation ---

    /// Switch screens; entering a screen refreshes its data.
    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.refresh(screen.refresh_key());
        self.last_refresh = Instant::now();
    }

    pub fn next_screen(&mut self) {
        self.set_screen(self.screen.next());
    }

    pub fn prev_screen(&mut self) {
        self.set_screen(self.screen.prev());
    }

    /// Esc: close help, else disarm, else return home.
    pub fn go_back(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.is_armed() {
            self.disarm();
        } else if self.screen != Screen::Home {
            self.set_screen(Screen::Home);
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn selected_cluster(&self) -> Option<&Cluster> {
        self.clusters.ready()?.get(self.selected_cluster)
    }

    pub fn selected_job(&self) -> Option<&Job> {
        self.jobs.ready()?.get(self.selected_job)
    }

    /// Latest run of the selected job.
    pub fn selected_run(&self) -> Option<&JobRun> {
        self.selected_job()?.last_run.as_ref()
    }

    pub fn selected_warehouse(&self) -> Option<&Warehouse> {
        self.warehouses.ready()?.get(self.selected_warehouse)
    }

    fn selection(&mut self) -> Option<(&mut usize, usize)> {
        match self.screen {
            Screen::Home => None,
            Screen::Clusters => Some((
                &mut self.selected_cluster,
                self.clusters.ready().map_or(0, Vec::len),
            )),
            Screen::Jobs => Some((&mut self.selected_job, self.jobs.ready().map_or(0, Vec::len))),
            Screen::Warehouses => Some((
                &mut self.selected_warehouse,
                self.warehouses.ready().map_or(0, Vec::len),
            )),
        }
    }

    pub fn select_next(&mut self) {
        if let Some((index, len)) = self.selection() {
            *index = clamp(*index + 1, len);
        }
    }

    pub fn select_prev(&mut self) {
        if let Some((index, _)) = self.selection() {
            *index = index.saturating_sub(1);
        }
    }

    pub fn select_first(&mut self) {
        if let Some((index, _)) = self.selection() {
            *index = 0;
        }
    }

    pub fn select_last(&mut self) {
        if let Some((index, len)) = self.selection() {
            *index = len.saturating_sub(1);
        }
    }
}

fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
