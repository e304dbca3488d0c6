use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use brickwatch::config::{DashboardConfig, Settings};
use brickwatch::ui::{self, Theme};
use brickwatch::{
    events, logging, App, ArmingGuard, FileClient, HealthAggregator, RefreshCoordinator,
    WorkspaceClient,
};

#[derive(Parser, Debug)]
#[command(name = "brickwatch")]
#[command(about = "Terminal dashboard for workspace clusters, jobs and warehouses")]
struct Args {
    /// Config file (TOML). Defaults to ./brickwatch.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the workspace state file
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Profile name shown in the header
    #[arg(short, long)]
    profile: Option<String>,

    /// How long arming lasts (e.g., "30s")
    #[arg(long)]
    arm_window: Option<String>,

    /// Periodic refresh interval (e.g., "60s", "2m")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Heartbeat age still considered connected (e.g., "60s")
    #[arg(long)]
    spark_fresh: Option<String>,

    /// Heartbeat age after which Spark is disconnected (e.g., "5m")
    #[arg(long)]
    spark_stale: Option<String>,

    /// Upper bound on a single health probe (e.g., "15s")
    #[arg(long)]
    probe_timeout: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Write one health snapshot as JSON to this file ("-" for stdout) and exit
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

impl Args {
    /// Flags given on the command line win over every other layer.
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.workspace {
            settings.workspace_file = path.clone();
        }
        if let Some(profile) = &self.profile {
            settings.profile = Some(profile.clone());
        }
        let overrides = [
            (&self.arm_window, &mut settings.arm_window),
            (&self.refresh, &mut settings.refresh_interval),
            (&self.spark_fresh, &mut settings.spark_fresh),
            (&self.spark_stale, &mut settings.spark_stale),
            (&self.probe_timeout, &mut settings.probe_timeout),
        ];
        for (flag, setting) in overrides {
            if let Some(value) = flag {
                *setting = value.clone();
            }
        }
        if let Some(path) = &self.log_file {
            settings.log_file = Some(path.clone());
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    let config = settings.resolve()?;

    logging::init_logging(&config.log_level, config.log_file.as_deref())?;
    info!(workspace = %config.workspace_file.display(), "starting brickwatch");

    let client: Arc<dyn WorkspaceClient> = Arc::new(FileClient::new(&config.workspace_file));
    let aggregator = HealthAggregator::new(Arc::clone(&client), config.profile.clone())
        .with_thresholds(config.spark)
        .with_probe_timeout(config.probe_timeout);

    let rt = tokio::runtime::Runtime::new()?;

    // Handle snapshot mode (non-interactive)
    if let Some(path) = &args.snapshot {
        return export_snapshot(&rt, &aggregator, path);
    }

    let app = App::new(
        client,
        aggregator,
        RefreshCoordinator::new(rt.handle().clone()),
        ArmingGuard::new(config.arm_window),
    )
    .with_refresh_interval(config.refresh_interval);

    run_tui(app, &config)
}

/// Build one snapshot and write it as pretty JSON.
fn export_snapshot(
    rt: &tokio::runtime::Runtime,
    aggregator: &HealthAggregator,
    path: &Path,
) -> Result<()> {
    let snapshot = rt.block_on(aggregator.build())?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    if path == Path::new("-") {
        println!("{}", json);
    } else {
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported health snapshot to: {}", path.display());
    }
    Ok(())
}

/// Run the TUI until the operator quits
fn run_tui(mut app: App, config: &DashboardConfig) -> Result<()> {
    // Query the background before raw mode takes over the terminal
    app.theme = Theme::auto_detect();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    app.start();
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!(workspace = %config.workspace_file.display(), "brickwatch stopped");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.pump();
        app.tick();

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}
