//! `tenantpulse-ai`
//!
//! **Responsibility:** the narrative collaborator boundary.
//!
//! This crate only turns a finished canonical record into prose:
//! - It never sees raw facts or other tenants.
//! - It never mutates the record.
//! - Failures surface as [`NarrativeError`]; the caller decides whether to skip the tenant.

pub mod narrator;
pub mod openai;
pub mod prompt;
pub mod result;

pub use narrator::Narrator;
pub use openai::{NarratorConfig, OpenAiNarrator};
pub use result::{Narrative, NarrativeError};
