//! Pipeline error taxonomy.

use thiserror::Error;

use crate::id::TenantId;

/// Result type used across the reporting pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline-level error.
///
/// Region-fatal variants (`Configuration`, `DataAccess`) end the region loop
/// when raised while opening a session or listing tenants. Everything else is
/// caught at the per-tenant boundary. Absent metrics are not errors at all:
/// the normalizer substitutes defaults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A region could not be resolved to a connection target.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A query or connection failed.
    #[error("data access error: {0}")]
    DataAccess(String),

    /// The tenant identity could not be resolved to a namespace.
    #[error("missing tenant data for tenant {tenant_id}: {reason}")]
    MissingTenantData { tenant_id: TenantId, reason: String },

    /// The narrative collaborator failed.
    #[error("narrative service error: {0}")]
    NarrativeService(String),

    /// Composition or rendering could not produce a valid document.
    #[error("render error: {0}")]
    Render(String),

    /// A per-run artifact (flat record or document file) could not be written.
    #[error("artifact error: {0}")]
    Artifact(String),
}

impl PipelineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn data_access(msg: impl Into<String>) -> Self {
        Self::DataAccess(msg.into())
    }

    pub fn missing_tenant_data(tenant_id: TenantId, reason: impl Into<String>) -> Self {
        Self::MissingTenantData {
            tenant_id,
            reason: reason.into(),
        }
    }

    pub fn narrative(msg: impl Into<String>) -> Self {
        Self::NarrativeService(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Whether this error ends the whole region when raised outside a tenant.
    pub fn is_region_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::DataAccess(_))
    }

    /// Short, stable name for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::DataAccess(_) => "data_access",
            Self::MissingTenantData { .. } => "missing_tenant_data",
            Self::NarrativeService(_) => "narrative_service",
            Self::Render(_) => "render",
            Self::Artifact(_) => "artifact",
        }
    }
}
