//! `tenantpulse-observability`
//!
//! **Responsibility:** process-wide tracing setup. Only the binary calls
//! [`init`]; libraries just emit `tracing` events and spans.

pub mod subscriber;

pub use subscriber::{LogFormat, LogOptions, ObservabilityError, init};
