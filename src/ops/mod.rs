// src/ops/mod.rs

//! Operator adapters: pipeline tasks wrapping the dbt hook.
//!
//! - [`base`] defines the [`Operator`] trait and the shared
//!   [`DbtBaseOperator`] with its lazy hook construction.
//! - [`adapters`] defines the per-subcommand operators.

pub mod adapters;
pub mod base;

pub use adapters::{
    DbtCleanOperator, DbtCompileOperator, DbtDepsOperator, DbtDocsGenerateOperator,
    DbtRunOperator, DbtSeedOperator, DbtSnapshotOperator, DbtSourceFreshnessOperator,
    DbtTestOperator,
};
pub use base::{DbtBaseOperator, Operator};
