/// Runtime configuration from the environment (and `.env`).
///
/// Command-line flags override every value here; see `main.rs`.
use std::path::PathBuf;

use crate::logging::LogLevel;
use crate::model::{DEFAULT_MOVE_LOG, SortError};

pub const ENV_LOG_LEVEL: &str = "CSK_SORTER_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "CSK_SORTER_LOG_FILE";
pub const ENV_SITES_FILE: &str = "CSK_SORTER_SITES_FILE";
pub const ENV_MOVE_LOG: &str = "CSK_SORTER_MOVE_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Diagnostic log file, separate from the move log.
    pub log_file: Option<PathBuf>,
    /// Optional TOML file with additional site sets.
    pub sites_file: Option<PathBuf>,
    /// Move log file name inside the working directory.
    pub move_log_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::Info,
            log_file: None,
            sites_file: None,
            move_log_name: DEFAULT_MOVE_LOG.to_string(),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, SortError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SortError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level
                .parse()
                .map_err(|e| SortError::Config(format!("{ENV_LOG_LEVEL}: {e}")))?;
        }
        config.log_file = get(ENV_LOG_FILE).map(PathBuf::from);
        config.sites_file = get(ENV_SITES_FILE).map(PathBuf::from);
        if let Some(name) = get(ENV_MOVE_LOG) {
            config.move_log_name = validate_move_log_name(&name)?;
        }

        Ok(config)
    }
}

/// The move log lives directly in the working directory.
pub fn validate_move_log_name(name: &str) -> Result<String, SortError> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(SortError::Config(format!(
            "move log name must be a plain file name, got '{name}'"
        )));
    }
    Ok(name.to_string())
}
