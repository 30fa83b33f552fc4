//! `tenantpulse-report`
//!
//! **Responsibility:** turn a canonical record and its narrative into a
//! customer document.
//!
//! Composition and rendering are separate steps:
//! - [`DocumentComposer`] builds an immutable [`Document`] section tree (pure, no I/O).
//! - [`PdfRenderer`] turns a section tree into PDF bytes.

pub mod chart;
pub mod compose;
pub mod document;
pub mod error;
pub mod narrative;
pub mod pdf;

pub use chart::{Bar, ChartSpec};
pub use compose::DocumentComposer;
pub use document::{Cover, Document, MetricTable, NarrativeBlock, Overview, Section, SectionKind};
pub use error::RenderError;
pub use pdf::PdfRenderer;
