// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [dbt]
/// bin = "dbt"
/// target = "dev"
/// models = "tag:nightly"
/// threads = 4
///
/// [dbt.vars]
/// start_date = "2024-01-01"
///
/// [env]
/// append = true
///
/// [env.vars]
/// DBT_PROFILES_DIR = "/secrets/dbt"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// dbt invocation settings from `[dbt]`.
    #[serde(default)]
    pub dbt: DbtConfig,

    /// Subprocess environment policy from `[env]`.
    #[serde(default)]
    pub env: EnvPolicy,
}

/// The flat bundle of options translated into dbt command-line flags.
///
/// Each optional field maps to exactly one flag; a `None` (or `false`)
/// field produces no flag at all. The bundle is immutable once built and
/// passed by value into the hook.
#[derive(Debug, Clone, Deserialize)]
pub struct DbtConfig {
    /// The dbt executable. Defaults to `dbt`, assumed to be on `PATH`.
    #[serde(default = "default_bin")]
    pub bin: String,

    /// Passed as `--profiles-dir` when set.
    #[serde(default)]
    pub profiles_dir: Option<String>,

    /// Passed as `--project-dir`, and used as the working directory of the
    /// subprocess. Defaults to the current directory.
    #[serde(default = "default_project_dir")]
    pub project_dir: String,

    /// Passed as `--target` when set.
    #[serde(default)]
    pub target: Option<String>,

    /// Passed as `--vars` when set, JSON-encoded.
    ///
    /// dbt accepts YAML here; JSON is a subset of YAML, so encoding the map
    /// with `serde_json` is always valid.
    #[serde(default)]
    pub vars: Option<BTreeMap<String, serde_json::Value>>,

    /// If true, incremental models are fully refreshed (`--full-refresh`).
    #[serde(default)]
    pub full_refresh: bool,

    /// Passed as `--data` when true (legacy `dbt test` flag).
    #[serde(default)]
    pub data: bool,

    /// Passed as `--schema` when true (legacy `dbt test` flag).
    #[serde(default)]
    pub schema: bool,

    /// Passed as `--models` when set.
    #[serde(default)]
    pub models: Option<String>,

    /// Passed as `--exclude` when set.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Passed as `--select` when set.
    #[serde(default)]
    pub select: Option<String>,

    /// Passed as `--selector` when set.
    #[serde(default)]
    pub selector: Option<String>,

    /// Passed as `--threads` when set.
    #[serde(default)]
    pub threads: Option<u32>,

    /// Passed as `--debug` when true (dbt's own debug logging).
    #[serde(default)]
    pub debug: bool,

    /// If true, `--warn-error` is inserted right after the binary and dbt
    /// treats warnings as errors.
    #[serde(default)]
    pub warn_error: bool,

    /// If true, the full command line is logged before execution.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

fn default_bin() -> String {
    "dbt".to_string()
}

fn default_project_dir() -> String {
    ".".to_string()
}

fn default_verbose() -> bool {
    true
}

impl Default for DbtConfig {
    fn default() -> Self {
        Self {
            bin: default_bin(),
            profiles_dir: None,
            project_dir: default_project_dir(),
            target: None,
            vars: None,
            full_refresh: false,
            data: false,
            schema: false,
            models: None,
            exclude: None,
            select: None,
            selector: None,
            threads: None,
            debug: false,
            warn_error: false,
            verbose: default_verbose(),
        }
    }
}

/// `[env]` section: how the subprocess environment is derived.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnvPolicy {
    /// If true, `vars` is merged on top of the parent environment.
    ///
    /// If false and `vars` is non-empty, `vars` *replaces* the parent
    /// environment entirely. If `vars` is empty, the parent environment is
    /// passed through unchanged either way.
    #[serde(default)]
    pub append: bool,

    /// Environment variable overrides for the subprocess.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}
