// src/ops/adapters.rs

//! One operator per dbt subcommand.
//!
//! Every adapter is the same fixed mapping: construct the hook lazily, run
//! one predetermined subcommand through it. The macro keeps the nine
//! definitions honest about containing no logic of their own.

use std::future::Future;
use std::pin::Pin;

use crate::config::{DbtConfig, EnvPolicy};
use crate::context::TaskContext;
use crate::errors::Result;
use crate::hook::CancelHandle;
use crate::ops::base::{DbtBaseOperator, Operator};

macro_rules! dbt_operator {
    ($(#[$meta:meta])* $name:ident, $subcommand:expr) => {
        $(#[$meta])*
        pub struct $name {
            base: DbtBaseOperator,
        }

        impl $name {
            pub fn new(config: DbtConfig, env: EnvPolicy) -> Self {
                Self {
                    base: DbtBaseOperator::new(config, env),
                }
            }

            /// The fixed subcommand this operator forwards to the hook.
            pub fn subcommand() -> &'static [&'static str] {
                &$subcommand
            }

            pub fn base(&self) -> &DbtBaseOperator {
                &self.base
            }
        }

        impl Operator for $name {
            fn prepare(&mut self, ctx: &TaskContext) -> CancelHandle {
                self.base.hook(ctx).cancel_handle()
            }

            fn execute<'a>(
                &'a mut self,
                ctx: &'a TaskContext,
            ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
                Box::pin(async move { self.base.hook(ctx).run_cli(&$subcommand).await })
            }
        }
    };
}

dbt_operator!(
    /// Runs `dbt run`.
    DbtRunOperator,
    ["run"]
);

dbt_operator!(
    /// Runs `dbt test`.
    DbtTestOperator,
    ["test"]
);

dbt_operator!(
    /// Runs `dbt seed`.
    DbtSeedOperator,
    ["seed"]
);

dbt_operator!(
    /// Runs `dbt snapshot`.
    DbtSnapshotOperator,
    ["snapshot"]
);

dbt_operator!(
    /// Runs `dbt compile`.
    DbtCompileOperator,
    ["compile"]
);

dbt_operator!(
    /// Runs `dbt deps`.
    DbtDepsOperator,
    ["deps"]
);

dbt_operator!(
    /// Runs `dbt clean`.
    DbtCleanOperator,
    ["clean"]
);

dbt_operator!(
    /// Runs `dbt docs generate`.
    DbtDocsGenerateOperator,
    ["docs", "generate"]
);

dbt_operator!(
    /// Runs `dbt source freshness`.
    DbtSourceFreshnessOperator,
    ["source", "freshness"]
);
