use async_trait::async_trait;

use tenantpulse_core::CanonicalRecord;

use crate::result::{Narrative, NarrativeError};

/// Text-generation collaborator for one customer record.
///
/// Implementations receive the record by reference and must not retain it.
/// The record is the only input; no other tenant's data is ever visible.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Produce the prose analysis for `record`.
    async fn narrate(&self, record: &CanonicalRecord) -> Result<Narrative, NarrativeError>;
}

#[async_trait]
impl<N: Narrator + ?Sized> Narrator for &N {
    async fn narrate(&self, record: &CanonicalRecord) -> Result<Narrative, NarrativeError> {
        (**self).narrate(record).await
    }
}

#[async_trait]
impl<N: Narrator + ?Sized> Narrator for Box<N> {
    async fn narrate(&self, record: &CanonicalRecord) -> Result<Narrative, NarrativeError> {
        (**self).narrate(record).await
    }
}
