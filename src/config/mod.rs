//! # Configuration Management
//!
//! Two kinds of configuration live here:
//! - [`RuntimeConfig`] and its parts: the per-call scope of one extension
//!   instance, built by the caller for every extend pass
//! - [`ObservabilityConfig`]: process-level logging settings loaded from the
//!   environment

mod runtime;
mod settings;

pub use runtime::{
    CompoundServiceName, Direction, EnvoyExtension, RuntimeConfig, ServiceKind, UpstreamData,
};
pub use settings::{ObservabilityConfig, LOG_JSON_ENV, LOG_LEVEL_ENV, SERVICE_NAME_ENV};
