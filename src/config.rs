//! Code for the configuration of the application.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Where the configuration is looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "printer-fleet.toml";

/// The configuration of the application.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Path of the sqlite database holding the printer profiles.
    pub database: PathBuf,
    /// The configuration for the dashboard.
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("printer-fleet.sqlite"),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from a toml file.
    pub fn from_file(file: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(file)?;
        Self::from_str(&config)
    }

    /// Parse a configuration from a toml string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }

    /// Load the configuration at `file`, or at [DEFAULT_CONFIG_PATH] when
    /// `None`. Only the default file is allowed to be missing.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(file) => Self::from_file(file),
            None => {
                let file = Path::new(DEFAULT_CONFIG_PATH);
                if file.exists() {
                    Self::from_file(file)
                } else {
                    tracing::debug!(path = %file.display(), "no configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}

/// The configuration for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Seconds between two polls of the same printer.
    pub poll_interval_secs: u64,
    /// Seconds before a request to a printer server gives up.
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl DashboardConfig {
    /// Time between two polls of the same printer. Never below one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Time before a request to a printer server gives up.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_config_from_str_empty() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database, PathBuf::from("printer-fleet.sqlite"));
        assert_eq!(config.dashboard.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.dashboard.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_from_str_full() {
        let config = r#"
            database = "/var/lib/printer-fleet/profiles.sqlite"

            [dashboard]
            poll_interval_secs = 2
            request_timeout_secs = 3
        "#;
        let config = Config::from_str(config).unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/printer-fleet/profiles.sqlite"));
        assert_eq!(config.dashboard.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.dashboard.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_config_from_str_partial_dashboard() {
        let config = r#"
            [dashboard]
            poll_interval_secs = 0
        "#;
        let config = Config::from_str(config).unwrap();
        assert_eq!(config.database, PathBuf::from("printer-fleet.sqlite"));
        assert_eq!(config.dashboard.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.dashboard.request_timeout_secs, 10);
    }

    #[test]
    fn test_dashboard_config_outlives_config() {
        let dashboard = Config::from_str("[dashboard]\npoll_interval_secs = 7").unwrap().dashboard;
        let copy = dashboard;
        assert_eq!(dashboard.poll_interval(), copy.poll_interval());
        assert_eq!(copy.poll_interval(), Duration::from_secs(7));
    }

    #[test]
    fn test_config_from_str_invalid() {
        assert!(Config::from_str("database = 5").is_err());
        assert!(Config::from_str("[dashboard]\npoll_interval_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_config_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn test_config_from_file() -> testresult::TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("printer-fleet.toml");
        std::fs::write(&path, "database = \"fleet.sqlite\"\n")?;

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.database, PathBuf::from("fleet.sqlite"));
        assert_eq!(config.dashboard, DashboardConfig::default());
        Ok(())
    }
}
