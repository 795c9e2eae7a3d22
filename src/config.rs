use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RosterResult;

/// Runtime settings, read from a TOML file.
///
/// ```toml
/// database_path = "/var/lib/roster/roster.db"
/// log_filter = "roster=debug,info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(".data").join("roster.db"),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads the file at `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> RosterResult<Config> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                Config::parse(&text)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn parse(text: &str) -> RosterResult<Config> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse("log_filter = \"debug\"").unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.database_path, Config::default().database_path);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        std::fs::write(&path, "database_path = \"/tmp/club.db\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/club.db"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn load_without_path_gives_defaults() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("database_path = [").is_err());
    }
}
