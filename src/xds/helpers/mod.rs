//! Helper utilities for xDS resource inspection and modification.
//!
//! `references` holds the read-only probes the extender and access-control
//! callers share; `http_filter` holds the HCM editing helpers extension
//! authors use from `patch_filter`.

pub mod http_filter;
mod references;

pub use http_filter::{
    http_filter_names, insert_http_filter, make_filter, modify_http_connection_manager,
    HTTP_CONNECTION_MANAGER_FILTER_NAME, ROUTER_FILTER_NAME,
};
pub use references::{
    filter_chain_matches_vip, filter_chain_sni, filter_cluster_names, http_connection_manager,
    route_cluster_names, tcp_proxy,
};
