// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{DbtError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - the dbt binary name is non-empty
/// - the project directory is non-empty
/// - `threads`, when set, is >= 1
///
/// It does **not** check that the binary exists or that the project
/// directory is a dbt project; dbt itself reports those much better.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.dbt.bin.trim().is_empty() {
        return Err(DbtError::ConfigError("[dbt].bin must not be empty".into()));
    }

    if cfg.dbt.project_dir.trim().is_empty() {
        return Err(DbtError::ConfigError(
            "[dbt].project_dir must not be empty (use \".\" for the current directory)".into(),
        ));
    }

    if cfg.dbt.threads == Some(0) {
        return Err(DbtError::ConfigError(
            "[dbt].threads must be >= 1 (got 0)".into(),
        ));
    }

    Ok(())
}
