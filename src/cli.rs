// src/cli.rs

//! CLI argument parsing using `clap`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ConfigFile, DbtConfig};

/// Command-line arguments for `dbtrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dbtrun",
    version,
    about = "Run dbt CLI commands as supervised tasks, relaying their JSON logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dbtrun.toml` in the current working directory, used only
    /// if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DBTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: DbtSubcommand,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// One subcommand per dbt operator.
#[derive(Debug, Clone, Subcommand)]
pub enum DbtSubcommand {
    /// dbt run
    Run(DbtArgs),
    /// dbt test
    Test(DbtArgs),
    /// dbt seed
    Seed(DbtArgs),
    /// dbt snapshot
    Snapshot(DbtArgs),
    /// dbt compile
    Compile(DbtArgs),
    /// dbt deps
    Deps(DbtArgs),
    /// dbt clean
    Clean(DbtArgs),
    /// dbt docs generate
    DocsGenerate(DbtArgs),
    /// dbt source freshness
    SourceFreshness(DbtArgs),
}

impl DbtSubcommand {
    /// The flags shared by every subcommand.
    pub fn dbt_args(&self) -> &DbtArgs {
        match self {
            Self::Run(a)
            | Self::Test(a)
            | Self::Seed(a)
            | Self::Snapshot(a)
            | Self::Compile(a)
            | Self::Deps(a)
            | Self::Clean(a)
            | Self::DocsGenerate(a)
            | Self::SourceFreshness(a) => a,
        }
    }
}

/// Per-invocation overrides; each flag shadows the matching `[dbt]` config
/// field when given.
#[derive(Debug, Clone, Args)]
pub struct DbtArgs {
    /// The dbt executable to invoke.
    #[arg(long, value_name = "BIN")]
    pub dbt_bin: Option<String>,

    /// Directory containing `profiles.yml`.
    #[arg(long, value_name = "DIR")]
    pub profiles_dir: Option<String>,

    /// The dbt project directory (also the working directory).
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<String>,

    /// Profile target to load.
    #[arg(long)]
    pub target: Option<String>,

    /// Project variables, as a JSON object (e.g. '{"start_date":"2024-01-01"}').
    #[arg(long, value_name = "JSON")]
    pub vars: Option<String>,

    /// Model selection passed as `--models`.
    #[arg(long)]
    pub models: Option<String>,

    /// Model selection passed as `--exclude`.
    #[arg(long)]
    pub exclude: Option<String>,

    /// Node selection passed as `--select`.
    #[arg(long)]
    pub select: Option<String>,

    /// Named selector passed as `--selector`.
    #[arg(long)]
    pub selector: Option<String>,

    /// Number of threads dbt may use.
    #[arg(long)]
    pub threads: Option<u32>,

    /// Fully refresh incremental models.
    #[arg(long)]
    pub full_refresh: bool,

    /// Run data tests only (legacy `dbt test` flag).
    #[arg(long)]
    pub data: bool,

    /// Run schema tests only (legacy `dbt test` flag).
    #[arg(long)]
    pub schema: bool,

    /// Have dbt treat warnings as errors.
    #[arg(long)]
    pub warn_error: bool,

    /// Enable dbt's own debug logging (`--debug`).
    #[arg(long)]
    pub dbt_debug: bool,
}

impl DbtArgs {
    /// Layer these flags over a loaded config, producing the final bundle.
    pub fn apply(&self, mut cfg: DbtConfig) -> Result<DbtConfig> {
        if let Some(bin) = &self.dbt_bin {
            cfg.bin = bin.clone();
        }
        if let Some(profiles_dir) = &self.profiles_dir {
            cfg.profiles_dir = Some(profiles_dir.clone());
        }
        if let Some(project_dir) = &self.project_dir {
            cfg.project_dir = project_dir.clone();
        }
        if let Some(target) = &self.target {
            cfg.target = Some(target.clone());
        }
        if let Some(vars) = &self.vars {
            let parsed: BTreeMap<String, serde_json::Value> = serde_json::from_str(vars)
                .with_context(|| format!("parsing --vars as a JSON object: {vars}"))?;
            cfg.vars = Some(parsed);
        }
        if let Some(models) = &self.models {
            cfg.models = Some(models.clone());
        }
        if let Some(exclude) = &self.exclude {
            cfg.exclude = Some(exclude.clone());
        }
        if let Some(select) = &self.select {
            cfg.select = Some(select.clone());
        }
        if let Some(selector) = &self.selector {
            cfg.selector = Some(selector.clone());
        }
        if let Some(threads) = self.threads {
            cfg.threads = Some(threads);
        }
        if self.full_refresh {
            cfg.full_refresh = true;
        }
        if self.data {
            cfg.data = true;
        }
        if self.schema {
            cfg.schema = true;
        }
        if self.warn_error {
            cfg.warn_error = true;
        }
        if self.dbt_debug {
            cfg.debug = true;
        }
        Ok(cfg)
    }

    /// Resolve the effective bundle from an optional config file plus flags.
    pub fn resolve(&self, file: ConfigFile) -> Result<DbtConfig> {
        self.apply(file.dbt)
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
