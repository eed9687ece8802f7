//! # Error Handling
//!
//! Error types for the extender. Per-resource failures are collected into a
//! [`PatchErrors`] aggregate so one bad resource never aborts a pass.

mod aggregate;

pub use aggregate::PatchErrors;

use crate::xds::ResourceKind;

/// Custom result type for extender operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the extender
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// The extension failed to patch a cluster
    #[error("error patching cluster '{name}': {source:#}")]
    PatchCluster {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The extension failed to patch a route configuration
    #[error("error patching route '{name}': {source:#}")]
    PatchRoute {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The extension failed to patch a filter inside a listener
    #[error("error patching listener filter '{filter}' in listener '{listener}': {source:#}")]
    PatchFilter {
        listener: String,
        filter: String,
        #[source]
        source: anyhow::Error,
    },

    /// A resource payload of a type the extender does not patch
    #[error("unsupported type was skipped: '{name}' ({type_url})")]
    UnsupportedResource { name: String, type_url: String },

    /// A payload stored under the wrong resource kind
    #[error("resource '{name}' is indexed as {indexed} but holds a {actual} payload")]
    KindMismatch {
        name: String,
        indexed: ResourceKind,
        actual: ResourceKind,
    },

    /// A known resource type whose bytes failed to decode
    #[error("Failed to decode {type_url}: {source}")]
    Decode {
        type_url: String,
        #[source]
        source: prost::DecodeError,
    },

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error came out of an extension's patch call
    pub fn is_patch_failure(&self) -> bool {
        matches!(
            self,
            Self::PatchCluster { .. } | Self::PatchRoute { .. } | Self::PatchFilter { .. }
        )
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
