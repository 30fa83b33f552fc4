//! `tenantpulse-core`
//!
//! **Responsibility:** the canonical customer record and metric normalization.
//!
//! This crate contains **pure** transforms (no I/O): the fixed-shape record,
//! the semantic metric keys, the normalizer that builds records from raw
//! facts, and the error taxonomy shared by the pipeline.

pub mod error;
pub mod id;
pub mod identity;
pub mod metric;
pub mod normalize;
pub mod record;
pub mod region;

pub use error::{PipelineError, PipelineResult};
pub use id::{RunId, TenantId};
pub use identity::{PlanTier, SchemaName, TenantIdentity};
pub use metric::{MetricKey, RawFacts, RawValue};
pub use normalize::{normalize, percentage};
pub use record::{
    Activity, CanonicalRecord, Compliance, Contracts, DocumentIntelligence, EsignChannel, Esign,
    Events, FeatureAdoption, FieldValue, LookbackWindow, Switch, Toggle, Windowed,
};
pub use region::Region;
