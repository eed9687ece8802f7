//! Envoy xDS resource model
//!
//! Holds the generated resources an extender patches:
//! - LDS listeners (with their filter chains and network filters)
//! - RDS route configurations
//! - CDS clusters
//!
//! plus read-only helpers for probing filters and filter chains.

pub mod helpers;
mod resources;

pub use resources::{
    type_url_matches, BuiltResource, IndexedResources, Resource, ResourceKind, CLUSTER_TYPE_URL,
    HTTP_CONNECTION_MANAGER_TYPE_URL, LISTENER_TYPE_URL, LOCAL_APP_CLUSTER_NAME,
    OUTBOUND_LISTENER_NAME, PUBLIC_LISTENER_NAME, ROUTE_TYPE_URL, TCP_PROXY_TYPE_URL,
};
