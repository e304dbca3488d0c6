//! Layered dashboard settings.
//!
//! Settings are read, lowest priority first, from built-in defaults, an
//! optional TOML file, and `BRICKWATCH_*` environment variables. The binary
//! applies command-line flags on top before calling [`Settings::resolve`].
//!
//! ```toml
//! workspace_file = "workspace.json"
//! profile = "prod"
//! arm_window = "30s"
//! refresh_interval = "60s"
//! spark_fresh = "60s"
//! spark_stale = "5m"
//! probe_timeout = "15s"
//! log_file = "brickwatch.log"
//! log_level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::health::duration::parse_duration;
use crate::health::SparkThresholds;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "brickwatch.toml";

/// Raw settings as written by the user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub workspace_file: PathBuf,
    pub profile: Option<String>,
    pub arm_window: String,
    pub refresh_interval: String,
    pub spark_fresh: String,
    pub spark_stale: String,
    pub probe_timeout: String,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_file: PathBuf::from("workspace.json"),
            profile: None,
            arm_window: "30s".to_string(),
            refresh_interval: "60s".to_string(),
            spark_fresh: "60s".to_string(),
            spark_stale: "300s".to_string(),
            probe_timeout: "15s".to_string(),
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

/// Validated settings with parsed durations.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub workspace_file: PathBuf,
    pub profile: Option<String>,
    pub arm_window: Duration,
    pub refresh_interval: Duration,
    pub spark: SparkThresholds,
    pub probe_timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Settings {
    /// Load settings from `path` (required if given) or from
    /// [`DEFAULT_CONFIG_FILE`] when present, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE))
                .format(FileFormat::Toml)
                .required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("BRICKWATCH"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Parse and validate into a [`DashboardConfig`].
    pub fn resolve(&self) -> Result<DashboardConfig> {
        let arm_window = parse_setting("arm_window", &self.arm_window)?;
        let refresh_interval = parse_setting("refresh_interval", &self.refresh_interval)?;
        let fresh_max = parse_setting("spark_fresh", &self.spark_fresh)?;
        let stale_max = parse_setting("spark_stale", &self.spark_stale)?;
        let probe_timeout = parse_setting("probe_timeout", &self.probe_timeout)?;

        for (name, value) in [
            ("arm_window", arm_window),
            ("refresh_interval", refresh_interval),
            ("probe_timeout", probe_timeout),
        ] {
            if value.is_zero() {
                bail!("{} must be greater than zero", name);
            }
        }
        if fresh_max >= stale_max {
            bail!(
                "spark_fresh ({}) must be shorter than spark_stale ({})",
                self.spark_fresh,
                self.spark_stale
            );
        }

        Ok(DashboardConfig {
            workspace_file: self.workspace_file.clone(),
            profile: self.profile.clone().filter(|p| !p.is_empty()),
            arm_window,
            refresh_interval,
            spark: SparkThresholds {
                fresh_max,
                stale_max,
            },
            probe_timeout,
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
        })
    }
}

fn parse_setting(name: &str, value: &str) -> Result<Duration> {
    parse_duration(value).with_context(|| format!("Invalid {}: {:?}", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_defaults_resolve() {
        let config = Settings::default().resolve().unwrap();
        assert_eq!(config.arm_window, Duration::from_secs(30));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.spark, SparkThresholds::default());
        assert_eq!(config.probe_timeout, Duration::from_secs(15));
        assert_eq!(config.workspace_file, PathBuf::from("workspace.json"));
    }

    #[test]
    fn test_load_from_file() {
        let file = toml_file(
            r#"
            workspace_file = "/data/ws.json"
            profile = "staging"
            arm_window = "45s"
            spark_stale = "10m"
            "#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.profile.as_deref(), Some("staging"));
        // Unset keys keep their defaults.
        assert_eq!(settings.refresh_interval, "60s");

        let config = settings.resolve().unwrap();
        assert_eq!(config.workspace_file, PathBuf::from("/data/ws.json"));
        assert_eq!(config.arm_window, Duration::from_secs(45));
        assert_eq!(config.spark.stale_max, Duration::from_secs(600));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        assert!(Settings::load(Some(Path::new("/nonexistent/brickwatch.toml"))).is_err());
    }

    #[test]
    fn test_fresh_must_be_below_stale() {
        let settings = Settings {
            spark_fresh: "5m".to_string(),
            spark_stale: "5m".to_string(),
            ..Default::default()
        };
        let err = settings.resolve().unwrap_err();
        assert!(err.to_string().contains("spark_fresh"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let settings = Settings {
            arm_window: "0s".to_string(),
            ..Default::default()
        };
        assert!(settings.resolve().is_err());
    }

    #[test]
    fn test_bad_duration_named_in_error() {
        let settings = Settings {
            refresh_interval: "often".to_string(),
            ..Default::default()
        };
        let err = settings.resolve().unwrap_err();
        assert!(err.to_string().contains("refresh_interval"));
    }

    #[test]
    fn test_empty_profile_means_default() {
        let settings = Settings {
            profile: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(settings.resolve().unwrap().profile, None);
    }
}
