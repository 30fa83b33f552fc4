use serde::{Deserialize, Serialize};
use thiserror::Error;

use tenantpulse_core::PipelineError;

/// Prose analysis produced for one customer record.
///
/// The text is free-form. By convention it carries numbered sections `0.`
/// through `6.`, which the document composer uses to split the overview from
/// the detailed analysis, but nothing here depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,

    /// Total tokens billed for the call, when the service reports it.
    pub usage_tokens: Option<u64>,
}

impl Narrative {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage_tokens: None,
        }
    }

    pub fn with_usage(mut self, tokens: u64) -> Self {
        self.usage_tokens = Some(tokens);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("invalid narrator configuration: {0}")]
    InvalidConfig(String),

    #[error("record could not be encoded: {0}")]
    Encode(String),

    #[error("narrative request failed: {0}")]
    Transport(String),

    #[error("narrative service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("narrative response was malformed: {0}")]
    Malformed(String),
}

impl From<NarrativeError> for PipelineError {
    fn from(err: NarrativeError) -> Self {
        PipelineError::narrative(err.to_string())
    }
}
