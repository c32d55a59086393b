// src/hook/runner.rs

//! The dbt CLI hook: spawns dbt, pumps its output, surfaces failure.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::{DbtConfig, EnvPolicy};
use crate::context::{TaskContext, build_env};
use crate::errors::{DbtError, Result};
use crate::hook::command::build_command_line;
use crate::hook::log_line::{Classified, RelayLevel, classify};

/// Simple wrapper around the dbt CLI.
///
/// One hook instance supervises one subprocess at a time: [`run_cli`] builds
/// the argument vector from the config bundle, spawns dbt with the derived
/// environment, relays its JSON log output line by line through `tracing`,
/// and returns [`DbtError::CommandFailed`] on any nonzero exit.
///
/// [`run_cli`]: DbtHook::run_cli
pub struct DbtHook {
    config: DbtConfig,
    env: EnvPolicy,
    context: Option<TaskContext>,
    /// Pid of the live child (also its process-group id), published for the
    /// duration of one run so that a [`CancelHandle`] can signal it.
    pid: Arc<Mutex<Option<u32>>>,
}

/// Cloneable handle for cancelling a running dbt command from outside the
/// pump loop (scheduler kill, Ctrl-C).
#[derive(Clone)]
pub struct CancelHandle {
    pid: Arc<Mutex<Option<u32>>>,
}

impl DbtHook {
    pub fn new(config: DbtConfig, env: EnvPolicy, context: Option<TaskContext>) -> Self {
        Self {
            config,
            env,
            context,
            pid: Arc::new(Mutex::new(None)),
        }
    }

    /// A handle that can terminate the currently running command.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            pid: Arc::clone(&self.pid),
        }
    }

    /// The argument vector [`run_cli`] would execute for `subcommand`.
    ///
    /// [`run_cli`]: DbtHook::run_cli
    pub fn command_line(&self, subcommand: &[&str]) -> Vec<String> {
        build_command_line(&self.config, subcommand)
    }

    /// Run one dbt subcommand (e.g. `["run"]`, `["docs", "generate"]`) to
    /// completion, relaying its log output.
    ///
    /// Returns `Ok(())` only for a zero exit code. A nonzero exit, or death
    /// by signal, yields [`DbtError::CommandFailed`]; whatever dbt said
    /// about the failure has already been relayed to the logs by then.
    pub async fn run_cli(&self, subcommand: &[&str]) -> Result<()> {
        let dbt_cmd = build_command_line(&self.config, subcommand);

        if self.config.verbose {
            info!(cmd = %dbt_cmd.join(" "), "running dbt command");
        }

        // Snapshot the parent environment here, at the outermost edge; the
        // actual merge logic is pure and lives in `context::build_env`.
        let base: BTreeMap<String, String> = std::env::vars().collect();
        let sub_env = build_env(&base, &self.env, self.context.as_ref());
        debug!(env_vars = sub_env.len(), "subprocess environment prepared");

        let mut cmd = Command::new(&dbt_cmd[0]);
        cmd.args(&dbt_cmd[1..])
            .env_clear()
            .envs(&sub_env)
            .current_dir(&self.config.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Make the child a process-group leader so cancellation can signal
        // the whole group, including anything the command spawned itself.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning dbt process '{}'", dbt_cmd[0]))?;

        if let Ok(mut slot) = self.pid.lock() {
            *slot = child.id();
        }

        // stderr is pumped through the same classifier concurrently (a
        // purely sequential drain could deadlock if the child fills the
        // other pipe's buffer); dbt writes its JSON logs to stdout, stderr
        // carries stray output from the tool or anything it shells out to.
        let stderr_pump = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                relay_lines(stderr).await;
            })
        });

        // Foreground pump: drain stdout fully before waiting on the child.
        if let Some(stdout) = child.stdout.take() {
            relay_lines(stdout).await;
        }

        // Both streams must be exhausted before the exit status is
        // inspected; anything the process group wrote has been relayed once
        // this returns. The pump only ends at pipe EOF, i.e. when the last
        // group member holding the write end is gone.
        if let Some(pump) = stderr_pump {
            if let Err(e) = pump.await {
                warn!(error = %e, "stderr relay task failed");
            }
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for dbt process '{}'", dbt_cmd[0]))?;

        if let Ok(mut slot) = self.pid.lock() {
            *slot = None;
        }

        info!(
            exit_code = status.code().unwrap_or(-1),
            success = status.success(),
            "dbt command exited"
        );

        if !status.success() {
            return Err(DbtError::CommandFailed);
        }

        Ok(())
    }
}

impl CancelHandle {
    /// Send SIGTERM to the child's entire process group, best-effort.
    ///
    /// No-op when no command is running. Delivery is not confirmed; whether
    /// the child honours the signal is up to it, and the pump loop simply
    /// ends when the output pipe closes.
    pub fn terminate(&self) {
        let pid = match self.pid.lock() {
            Ok(slot) => *slot,
            Err(_) => None,
        };

        let Some(pid) = pid else {
            debug!("cancellation requested but no dbt process is running");
            return;
        };

        info!(pid, "sending SIGTERM to dbt process group");
        signal_group(pid);
    }
}

/// Read `stream` line by line and relay each line to the matching log sink.
async fn relay_lines<R: AsyncRead + Unpin>(stream: R) {
    let reader = BufReader::new(stream);
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        relay_line(&line);
    }
}

/// Relay one classified output line through `tracing`.
///
/// Non-JSON lines are unexpected and surface at error level verbatim.
/// Structured lines log their node context at debug, then the message at
/// the level dbt declared; unrecognized levels are dropped.
fn relay_line(line: &str) {
    match classify(line) {
        Classified::Unstructured(raw) => error!("{}", raw),
        Classified::Structured {
            level,
            message,
            conn_name,
            node_path,
            sql,
        } => {
            debug!(
                conn_name = %conn_name,
                node_path = %node_path,
                sql = %sql,
                "dbt log line context"
            );
            match level {
                Some(RelayLevel::Debug) => debug!("{}", message),
                Some(RelayLevel::Info) => info!("{}", message),
                Some(RelayLevel::Warn) => warn!("{}", message),
                Some(RelayLevel::Error) => error!("{}", message),
                None => {}
            }
        }
    }
}

#[cfg(unix)]
fn signal_group(pid: u32) {
    // The child was spawned as a group leader, so its pid doubles as the
    // process-group id.
    let ret = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGTERM) };
    if ret != 0 {
        warn!(pid, "failed to signal dbt process group");
    }
}

#[cfg(not(unix))]
fn signal_group(pid: u32) {
    // No process groups here; `kill_on_drop` remains the only backstop.
    warn!(pid, "process-group termination is not supported on this platform");
}
