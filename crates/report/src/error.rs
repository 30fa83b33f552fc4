use thiserror::Error;

use tenantpulse_core::PipelineError;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The record cannot yield a minimally valid document.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("chart rasterisation failed: {0}")]
    Chart(String),

    #[error("pdf encoding failed: {0}")]
    Pdf(String),

    #[error("document write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Chart(err.to_string())
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::render(err.to_string())
    }
}
