//! Operator adapters: fixed subcommands and lazy hook construction.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use dbtrun::config::{DbtConfig, EnvPolicy};
use dbtrun::context::TaskContext;
use dbtrun::ops::{
    DbtCleanOperator, DbtCompileOperator, DbtDepsOperator, DbtDocsGenerateOperator,
    DbtRunOperator, DbtSeedOperator, DbtSnapshotOperator, DbtSourceFreshnessOperator,
    DbtTestOperator, Operator,
};

use crate::common::init_tracing;

fn fake_dbt(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-dbt");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn config_for(bin: &Path, dir: &Path) -> DbtConfig {
    DbtConfig {
        bin: bin.to_string_lossy().into_owned(),
        project_dir: dir.to_string_lossy().into_owned(),
        ..DbtConfig::default()
    }
}

#[test]
fn each_operator_forwards_its_fixed_subcommand() {
    assert_eq!(DbtRunOperator::subcommand(), ["run"]);
    assert_eq!(DbtTestOperator::subcommand(), ["test"]);
    assert_eq!(DbtSeedOperator::subcommand(), ["seed"]);
    assert_eq!(DbtSnapshotOperator::subcommand(), ["snapshot"]);
    assert_eq!(DbtCompileOperator::subcommand(), ["compile"]);
    assert_eq!(DbtDepsOperator::subcommand(), ["deps"]);
    assert_eq!(DbtCleanOperator::subcommand(), ["clean"]);
    assert_eq!(DbtDocsGenerateOperator::subcommand(), ["docs", "generate"]);
    assert_eq!(
        DbtSourceFreshnessOperator::subcommand(),
        ["source", "freshness"]
    );
}

#[tokio::test]
async fn execute_runs_the_subcommand_through_the_hook() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(dir.path(), "echo \"$@\" > args.txt\nexit 0");

    let mut op = DbtSnapshotOperator::new(config_for(&bin, dir.path()), EnvPolicy::default());
    op.execute(&TaskContext::now()).await.unwrap();

    let args = fs::read_to_string(dir.path().join("args.txt")).unwrap();
    assert!(
        args.trim().starts_with("--log-format json snapshot"),
        "unexpected argv: {args}"
    );
}

#[tokio::test]
async fn hook_construction_is_lazy_and_idempotent() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(dir.path(), "exit 0");

    let mut op = DbtRunOperator::new(config_for(&bin, dir.path()), EnvPolicy::default());
    assert!(!op.base().has_hook());

    let ctx = TaskContext::now();
    let _cancel = op.prepare(&ctx);
    assert!(op.base().has_hook());

    // Repeated executions reuse the already-constructed hook.
    op.execute(&ctx).await.unwrap();
    op.execute(&ctx).await.unwrap();
    assert!(op.base().has_hook());
}

#[tokio::test]
async fn operator_failure_surfaces_from_the_hook() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(dir.path(), "exit 1");

    let mut op = DbtTestOperator::new(config_for(&bin, dir.path()), EnvPolicy::default());
    let err = op.execute(&TaskContext::now()).await.unwrap_err();
    assert!(
        matches!(err, dbtrun::errors::DbtError::CommandFailed),
        "got {err:?}"
    );
}

#[tokio::test]
async fn prepare_returns_a_usable_cancel_handle() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(dir.path(), "exit 0");

    let mut op = DbtDepsOperator::new(config_for(&bin, dir.path()), EnvPolicy::default());
    let cancel = op.prepare(&TaskContext::now());

    // Nothing running yet; terminating is a no-op rather than a panic.
    cancel.terminate();
}
