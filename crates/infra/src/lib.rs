//! `tenantpulse-infra`
//!
//! **Responsibility:** everything that touches the outside world on behalf of
//! the pipeline: layered configuration, region → database lookup, the
//! regional metric sources (Postgres and in-memory), and atomic artifact
//! writes.

pub mod artifacts;
pub mod config;
pub mod metric_source;
pub mod region_directory;

pub use artifacts::{ArtifactError, ArtifactWriter, file_stem};
pub use config::{ConfigError, OutputSettings, Settings, SourceSettings};
pub use metric_source::{
    InMemoryConnector, InMemorySession, PostgresConnector, PostgresSession, RegionConnector,
    RegionSession, SourceError,
};
pub use region_directory::RegionDirectory;
