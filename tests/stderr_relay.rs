//! Trailing stderr output is relayed before `run_cli` returns.

#![cfg(unix)]

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dbtrun::config::{DbtConfig, EnvPolicy};
use dbtrun::errors::DbtError;
use dbtrun::hook::DbtHook;

fn fake_dbt(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-dbt");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A writer that appends everything to a shared buffer, so the test can
/// inspect exactly what was relayed and when.
#[derive(Clone)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// This test owns the process-global subscriber, so it lives alone in this
/// file: the capture buffer must see everything the runner relays.
#[tokio::test]
async fn late_stderr_from_the_process_group_is_relayed_before_return() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = CaptureWriter(Arc::clone(&buffer));
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .init();

    // The shell exits immediately, but a backgrounded group member keeps
    // the stderr pipe open and only logs its error after a delay. The
    // runner must not report back until that line has been relayed.
    let dir = tempfile::tempdir().unwrap();
    let bin = fake_dbt(
        dir.path(),
        concat!(
            "( exec 1>&-; sleep 0.3; ",
            "echo '{\"info\":{\"level\":\"error\",\"msg\":\"boom\"},\"data\":{}}' >&2 ) &\n",
            "exit 2",
        ),
    );

    let cfg = DbtConfig {
        bin: bin.to_string_lossy().into_owned(),
        project_dir: dir.path().to_string_lossy().into_owned(),
        ..DbtConfig::default()
    };
    let hook = DbtHook::new(cfg, EnvPolicy::default(), None);
    let err = hook.run_cli(&["run"]).await.unwrap_err();
    assert!(matches!(err, DbtError::CommandFailed), "got {err:?}");

    let logs = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(
        logs.contains("boom"),
        "stderr written after the main process exited was not relayed; captured: {logs:?}"
    );
}
