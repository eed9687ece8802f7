//! # xds-extender
//!
//! Applies third-party extensions to the Envoy resources a service-mesh
//! control plane generates for one sidecar or gateway.
//!
//! ## Architecture
//!
//! ```text
//! IndexedResources ─┐
//!                   ├─→ BasicEnvoyExtender ─→ scope predicates ─→ BasicExtension::patch_*
//! RuntimeConfig ────┘            │                                        │
//!                                └──────── write back in place ←──────────┘
//!                                          PatchErrors (aggregate)
//! ```
//!
//! ## Core Components
//!
//! - **Resource model** ([`xds`]): listeners, routes and clusters indexed by
//!   kind and name, plus read-only probes such as [`filter_cluster_names`]
//! - **Runtime scope** ([`config::RuntimeConfig`]): which proxy, which side of
//!   it, and which upstream an extension instance targets
//! - **Extension contract** ([`extension::BasicExtension`]): the patch
//!   functions an extension author writes
//! - **Extender** ([`extension::BasicEnvoyExtender`]): walks the resource set,
//!   applies the scope rules and aggregates failures
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use xds_extender::extension::{BasicEnvoyExtender, EnvoyExtender};
//!
//! let extender = BasicEnvoyExtender::new(my_extension);
//! extender.validate(&config)?;
//! extender.extend(&mut resources, &config)?;
//! ```

pub mod config;
pub mod errors;
pub mod extension;
pub mod observability;
pub mod xds;

// Re-export commonly used types and traits
pub use config::{ObservabilityConfig, RuntimeConfig};
pub use errors::{Error, PatchErrors, Result};
pub use extension::{BasicEnvoyExtender, BasicExtension, EnvoyExtender};
pub use observability::init_logging;
pub use xds::helpers::{filter_cluster_names, route_cluster_names};
pub use xds::IndexedResources;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
