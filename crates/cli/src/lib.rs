//! `tenantpulse-cli`
//!
//! **Responsibility:** the `tenantpulse` binary's wiring: argument parsing,
//! the run orchestrator and its summary. All domain work lives in the
//! library crates.

pub mod args;
pub mod runner;
pub mod summary;

pub use args::Cli;
pub use runner::{Orchestrator, RunOptions};
pub use summary::{RegionSummary, RunSummary, SkippedTenant, WrittenReport};
