// src/ops/base.rs

//! The `Operator` trait and the shared base all dbt operators delegate to.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::config::{DbtConfig, EnvPolicy};
use crate::context::TaskContext;
use crate::errors::Result;
use crate::hook::{CancelHandle, DbtHook};

/// A pipeline task that can be executed by a host scheduler.
///
/// Implementations are thin: each dbt operator forwards a fixed subcommand
/// into the hook and nothing more. The boxed future keeps the trait
/// object-safe so schedulers can hold `Box<dyn Operator>`.
pub trait Operator: Send {
    /// Construct (or reuse) the hook for this run and hand back a handle
    /// that can cancel it. Safe to call before or during `execute`.
    fn prepare(&mut self, ctx: &TaskContext) -> CancelHandle;

    /// Run the task to completion.
    fn execute<'a>(
        &'a mut self,
        ctx: &'a TaskContext,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// State shared by every dbt operator: the config bundle, the environment
/// policy, and the lazily constructed hook.
///
/// All other dbt operators are built on top of this.
pub struct DbtBaseOperator {
    config: DbtConfig,
    env: EnvPolicy,
    hook: Option<DbtHook>,
}

impl DbtBaseOperator {
    pub fn new(config: DbtConfig, env: EnvPolicy) -> Self {
        Self {
            config,
            env,
            hook: None,
        }
    }

    /// The hook for this operator, constructed on first use.
    ///
    /// Construction is idempotent: a second call returns the already
    /// constructed instance and ignores the new context.
    pub fn hook(&mut self, ctx: &TaskContext) -> &DbtHook {
        let Self { config, env, hook } = self;
        hook.get_or_insert_with(|| {
            debug!("constructing dbt hook for first execution");
            DbtHook::new(config.clone(), env.clone(), Some(ctx.clone()))
        })
    }

    /// Whether the hook has been constructed yet.
    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }
}
