// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod hook;
pub mod logging;
pub mod ops;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, DbtSubcommand};
use crate::config::{ConfigFile, load_and_validate};
use crate::context::TaskContext;
use crate::ops::{
    DbtCleanOperator, DbtCompileOperator, DbtDepsOperator, DbtDocsGenerateOperator,
    DbtRunOperator, DbtSeedOperator, DbtSnapshotOperator, DbtSourceFreshnessOperator,
    DbtTestOperator, Operator,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (TOML file + CLI flag overrides)
/// - operator construction for the chosen subcommand
/// - Ctrl-C → process-group cancellation
/// - execution, with failure mapped to a nonzero process exit by `main`
pub async fn run(args: CliArgs) -> Result<()> {
    let file = load_config_file(&args)?;
    let dbt_args = args.command.dbt_args();
    let cfg = dbt_args.resolve(file.clone())?;

    let mut operator = build_operator(&args.command, cfg, file.env);

    // No scheduler here; the CLI stands in with a wall-clock context.
    let ctx = TaskContext::now();
    debug!(execution_date = %ctx.execution_date_str(), "task context for this run");

    // Ctrl-C → terminate the dbt process group, then let the pump loop wind
    // down as the output pipe closes.
    let cancel = operator.prepare(&ctx);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("interrupt received, cancelling dbt command");
        cancel.terminate();
    });

    operator.execute(&ctx).await?;
    Ok(())
}

/// Load `--config` (required to exist when given), or `Dbtrun.toml` if
/// present, or fall back to built-in defaults.
fn load_config_file(args: &CliArgs) -> Result<ConfigFile> {
    if let Some(path) = &args.config {
        let cfg = load_and_validate(path)?;
        info!(config = %path, "loaded config file");
        return Ok(cfg);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        let cfg = load_and_validate(&default_path)?;
        info!(config = %default_path.display(), "loaded config file");
        return Ok(cfg);
    }

    debug!("no config file found, using defaults");
    Ok(ConfigFile::default())
}

fn build_operator(
    command: &DbtSubcommand,
    cfg: config::DbtConfig,
    env: config::EnvPolicy,
) -> Box<dyn Operator> {
    match command {
        DbtSubcommand::Run(_) => Box::new(DbtRunOperator::new(cfg, env)),
        DbtSubcommand::Test(_) => Box::new(DbtTestOperator::new(cfg, env)),
        DbtSubcommand::Seed(_) => Box::new(DbtSeedOperator::new(cfg, env)),
        DbtSubcommand::Snapshot(_) => Box::new(DbtSnapshotOperator::new(cfg, env)),
        DbtSubcommand::Compile(_) => Box::new(DbtCompileOperator::new(cfg, env)),
        DbtSubcommand::Deps(_) => Box::new(DbtDepsOperator::new(cfg, env)),
        DbtSubcommand::Clean(_) => Box::new(DbtCleanOperator::new(cfg, env)),
        DbtSubcommand::DocsGenerate(_) => Box::new(DbtDocsGenerateOperator::new(cfg, env)),
        DbtSubcommand::SourceFreshness(_) => Box::new(DbtSourceFreshnessOperator::new(cfg, env)),
    }
}
