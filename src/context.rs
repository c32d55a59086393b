// src/context.rs

//! Pipeline execution context and subprocess environment derivation.
//!
//! The host scheduler hands each task a [`TaskContext`] describing the run
//! (which pipeline, which task, which logical timestamp). The hook exposes
//! that context to dbt through environment variables so that project macros
//! can read e.g. `EXECUTION_DATE`.
//!
//! [`build_env`] is deliberately pure: the parent environment is an explicit
//! argument rather than being captured from the process inside. Only the
//! runner snapshots the real `std::env::vars()` at its outermost edge.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::EnvPolicy;

/// Execution metadata supplied by the host scheduler for one task run.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Identifier of the owning pipeline, if any.
    pub dag_id: Option<String>,

    /// Identifier of the task within the pipeline, if any.
    pub task_id: Option<String>,

    /// The logical (execution) timestamp of this run.
    pub execution_date: DateTime<Utc>,

    /// 1-based attempt counter, if the scheduler tracks retries.
    pub try_number: Option<u32>,

    /// Identifier of the concrete pipeline run, if any.
    pub run_id: Option<String>,
}

impl TaskContext {
    /// A minimal context carrying only the current wall-clock time as the
    /// execution timestamp. Used by the CLI, where no scheduler exists.
    pub fn now() -> Self {
        Self {
            dag_id: None,
            task_id: None,
            execution_date: Utc::now(),
            try_number: None,
            run_id: None,
        }
    }

    /// The execution timestamp in RFC 3339 format, as exported to dbt.
    pub fn execution_date_str(&self) -> String {
        self.execution_date
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Project the context into environment variables under conventional
    /// names, plus the derived `EXECUTION_DATE` consumed by dbt date macros.
    pub fn to_env_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();

        if let Some(dag_id) = &self.dag_id {
            vars.insert("DBTRUN_CTX_DAG_ID".to_string(), dag_id.clone());
        }
        if let Some(task_id) = &self.task_id {
            vars.insert("DBTRUN_CTX_TASK_ID".to_string(), task_id.clone());
        }
        if let Some(try_number) = self.try_number {
            vars.insert("DBTRUN_CTX_TRY_NUMBER".to_string(), try_number.to_string());
        }
        if let Some(run_id) = &self.run_id {
            vars.insert("DBTRUN_CTX_DAG_RUN_ID".to_string(), run_id.clone());
        }

        let date = self.execution_date_str();
        vars.insert("DBTRUN_CTX_EXECUTION_DATE".to_string(), date.clone());
        vars.insert("EXECUTION_DATE".to_string(), date);

        vars
    }
}

/// Build the environment for the dbt subprocess.
///
/// - With no overrides, the base (parent) environment passes through.
/// - With overrides and `policy.append`, overrides are merged on top of it.
/// - With overrides and `!policy.append`, overrides *replace* it entirely.
///
/// Context variables are layered on last in every case, so they cannot be
/// masked by overrides.
pub fn build_env(
    base: &BTreeMap<String, String>,
    policy: &EnvPolicy,
    context: Option<&TaskContext>,
) -> BTreeMap<String, String> {
    let mut env = if policy.vars.is_empty() {
        base.clone()
    } else if policy.append {
        let mut merged = base.clone();
        merged.extend(policy.vars.clone());
        merged
    } else {
        policy.vars.clone()
    };

    if let Some(ctx) = context {
        env.extend(ctx.to_env_vars());
    }

    env
}
