//! External cancellation: SIGTERM goes to the whole process group.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use dbtrun::config::{DbtConfig, EnvPolicy};
use dbtrun::errors::DbtError;
use dbtrun::hook::DbtHook;

use crate::common::init_tracing;

fn fake_dbt(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-dbt");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn hook_for(bin: &Path, dir: &Path) -> DbtHook {
    let cfg = DbtConfig {
        bin: bin.to_string_lossy().into_owned(),
        project_dir: dir.to_string_lossy().into_owned(),
        ..DbtConfig::default()
    };
    DbtHook::new(cfg, EnvPolicy::default(), None)
}

#[tokio::test]
async fn terminate_kills_a_running_command() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(dir.path(), "sleep 30\nexit 0");

    let hook = Arc::new(hook_for(&bin, dir.path()));
    let cancel = hook.cancel_handle();

    let run = {
        let hook = Arc::clone(&hook);
        tokio::spawn(async move { hook.run_cli(&["run"]).await })
    };

    sleep(Duration::from_millis(400)).await;
    cancel.terminate();

    let result = timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not finish after cancellation")
        .unwrap();
    let err = result.unwrap_err();
    assert!(matches!(err, DbtError::CommandFailed), "got {err:?}");
}

#[tokio::test]
async fn signal_reaches_children_of_the_shell_not_just_the_shell() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // The shell handles TERM itself (so a signal to only its pid would be
    // absorbed), but `sleep` runs with the default disposition. Only a
    // process-group signal can end the sleep early; the shell then falls
    // through to `exit 7`.
    let bin = fake_dbt(dir.path(), "trap 'true' TERM\nsleep 30\nexit 7");

    let hook = Arc::new(hook_for(&bin, dir.path()));
    let cancel = hook.cancel_handle();

    let run = {
        let hook = Arc::clone(&hook);
        tokio::spawn(async move { hook.run_cli(&["run"]).await })
    };

    sleep(Duration::from_millis(400)).await;
    cancel.terminate();

    let result = timeout(Duration::from_secs(5), run)
        .await
        .expect("group signal did not reach the sleeping child")
        .unwrap();
    let err = result.unwrap_err();
    assert!(matches!(err, DbtError::CommandFailed), "got {err:?}");
}

#[tokio::test]
async fn terminate_without_a_running_command_is_a_no_op() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(dir.path(), "exit 0");

    let hook = hook_for(&bin, dir.path());
    let cancel = hook.cancel_handle();

    // Before any run.
    cancel.terminate();

    hook.run_cli(&["run"]).await.unwrap();

    // After the run completed and the pid slot was cleared.
    cancel.terminate();
}
