// src/hook/command.rs

//! Translation of a [`DbtConfig`] bundle into a dbt argument vector.

use crate::config::DbtConfig;

/// Build the full argument vector for one dbt invocation.
///
/// The shape is always
/// `[bin, "--log-format", "json", <subcommand...>, <flags...>]`, where each
/// flag appears exactly when the corresponding config field is set (or, for
/// booleans, true), in a fixed order. `--log-format json` is not optional:
/// the output pump only understands dbt's JSON log lines.
///
/// `--warn-error` is the one exception to the ordering: dbt requires it
/// before the subcommand, so it is inserted directly after the binary.
pub fn build_command_line(cfg: &DbtConfig, subcommand: &[&str]) -> Vec<String> {
    let mut cmd: Vec<String> = vec![
        cfg.bin.clone(),
        "--log-format".to_string(),
        "json".to_string(),
    ];
    cmd.extend(subcommand.iter().map(|s| s.to_string()));

    if let Some(profiles_dir) = &cfg.profiles_dir {
        cmd.push("--profiles-dir".to_string());
        cmd.push(profiles_dir.clone());
    }

    cmd.push("--project-dir".to_string());
    cmd.push(cfg.project_dir.clone());

    if let Some(target) = &cfg.target {
        cmd.push("--target".to_string());
        cmd.push(target.clone());
    }

    if let Some(vars) = &cfg.vars {
        cmd.push("--vars".to_string());
        cmd.push(dump_vars(vars));
    }

    if cfg.data {
        cmd.push("--data".to_string());
    }

    if cfg.schema {
        cmd.push("--schema".to_string());
    }

    if let Some(models) = &cfg.models {
        cmd.push("--models".to_string());
        cmd.push(models.clone());
    }

    if let Some(exclude) = &cfg.exclude {
        cmd.push("--exclude".to_string());
        cmd.push(exclude.clone());
    }

    if let Some(select) = &cfg.select {
        cmd.push("--select".to_string());
        cmd.push(select.clone());
    }

    if let Some(selector) = &cfg.selector {
        cmd.push("--selector".to_string());
        cmd.push(selector.clone());
    }

    if let Some(threads) = cfg.threads {
        cmd.push("--threads".to_string());
        cmd.push(threads.to_string());
    }

    if cfg.debug {
        cmd.push("--debug".to_string());
    }

    if cfg.full_refresh {
        cmd.push("--full-refresh".to_string());
    }

    if cfg.warn_error {
        cmd.insert(1, "--warn-error".to_string());
    }

    cmd
}

/// Encode the `vars` map for `--vars`.
///
/// dbt parses this value as YAML; JSON is a subset of YAML, so a
/// `serde_json` encoding of the map is always acceptable. The map is a
/// `BTreeMap`, so key order (and thus the encoded string) is stable.
fn dump_vars(vars: &std::collections::BTreeMap<String, serde_json::Value>) -> String {
    serde_json::to_string(vars).unwrap_or_else(|_| "{}".to_string())
}
