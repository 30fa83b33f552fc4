//! Metric sources: region-scoped sessions that list tenants and fetch raw facts.
//!
//! A connector opens one session per region. The session is used for every
//! tenant of that region and closed once the region is done, whatever
//! happened to individual tenants.

pub mod in_memory;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use thiserror::Error;

use tenantpulse_core::{
    LookbackWindow, PipelineError, RawFacts, Region, SchemaName, TenantId, TenantIdentity,
};

pub use in_memory::{InMemoryConnector, InMemorySession};
pub use postgres::{PostgresConnector, PostgresSession};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection failed in {operation}: {message}")]
    Connection { operation: String, message: String },

    #[error("query failed in {operation}: {message}")]
    Query { operation: String, message: String },

    #[error("could not decode {column}: {message}")]
    Decode { column: String, message: String },
}

impl SourceError {
    pub fn connection(operation: &str, message: impl Into<String>) -> Self {
        Self::Connection {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn query(operation: &str, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Configuration(msg) => PipelineError::configuration(msg),
            other => PipelineError::data_access(other.to_string()),
        }
    }
}

/// Opens region-scoped sessions.
#[async_trait]
pub trait RegionConnector: Send + Sync {
    type Session: RegionSession;

    async fn open(&self, region: Region) -> Result<Self::Session, SourceError>;
}

/// A live connection to one regional store.
#[async_trait]
pub trait RegionSession: Send + Sync {
    fn region(&self) -> Region;

    /// Tenants flagged live, in store order.
    async fn list_live_tenants(&self) -> Result<Vec<TenantIdentity>, SourceError>;

    /// Joined-aggregate facts for one tenant over `window`.
    async fn fetch(
        &self,
        tenant_id: TenantId,
        schema: &SchemaName,
        window: LookbackWindow,
    ) -> Result<RawFacts, SourceError>;

    /// Release the session's resources.
    async fn close(self)
    where
        Self: Sized;
}
