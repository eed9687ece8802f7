//! Read-only probes over listeners, filters and route tables.
//!
//! Nothing here mutates a resource or returns an error: a payload that is not
//! the expected type, or does not decode, is treated as absent.

use std::collections::HashSet;

use envoy_types::pb::envoy::config::listener::v3::{filter::ConfigType, Filter, FilterChain};
use envoy_types::pb::envoy::config::route::v3::{
    route::Action, route_action::ClusterSpecifier, RouteConfiguration,
};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager::RouteSpecifier, HttpConnectionManager,
};
use envoy_types::pb::envoy::extensions::filters::network::tcp_proxy::v3::{tcp_proxy, TcpProxy};
use envoy_types::pb::google::protobuf::Any;
use prost::Message;

use crate::xds::type_url_matches;

pub(crate) const HTTP_CONNECTION_MANAGER_MESSAGE: &str =
    "envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
pub(crate) const TCP_PROXY_MESSAGE: &str = "envoy.extensions.filters.network.tcp_proxy.v3.TcpProxy";

pub(crate) fn typed_config(filter: &Filter) -> Option<&Any> {
    match &filter.config_type {
        Some(ConfigType::TypedConfig(any)) => Some(any),
        _ => None,
    }
}

/// Decode the filter's HTTP connection manager, if it carries one.
pub fn http_connection_manager(filter: &Filter) -> Option<HttpConnectionManager> {
    let any = typed_config(filter)?;
    if !type_url_matches(&any.type_url, HTTP_CONNECTION_MANAGER_MESSAGE) {
        return None;
    }
    HttpConnectionManager::decode(&any.value[..]).ok()
}

/// Decode the filter's TCP proxy config, if it carries one.
pub fn tcp_proxy(filter: &Filter) -> Option<TcpProxy> {
    let any = typed_config(filter)?;
    if !type_url_matches(&any.type_url, TCP_PROXY_MESSAGE) {
        return None;
    }
    TcpProxy::decode(&any.value[..]).ok()
}

/// Cluster names a network filter routes to directly.
///
/// An HTTP connection manager that fetches its routes over RDS yields an
/// empty set: those names live in the route configuration it names and must
/// be gathered from there with [`route_cluster_names`].
pub fn filter_cluster_names(filter: &Filter) -> HashSet<String> {
    let mut cluster_names = HashSet::new();

    if let Some(hcm) = http_connection_manager(filter) {
        match hcm.route_specifier {
            Some(RouteSpecifier::Rds(_)) => return cluster_names,
            Some(RouteSpecifier::RouteConfig(route)) => {
                cluster_names = route_cluster_names(Some(&route)).unwrap_or_default();
            }
            Some(RouteSpecifier::ScopedRoutes(_)) | None => {}
        }
    }

    if let Some(tcp) = tcp_proxy(filter) {
        match tcp.cluster_specifier {
            Some(tcp_proxy::ClusterSpecifier::Cluster(name)) if !name.is_empty() => {
                cluster_names.insert(name);
            }
            Some(tcp_proxy::ClusterSpecifier::WeightedClusters(weighted)) => {
                cluster_names.extend(
                    weighted.clusters.into_iter().map(|c| c.name).filter(|name| !name.is_empty()),
                );
            }
            _ => {}
        }
    }

    cluster_names
}

/// Cluster names referenced by every route of every virtual host.
///
/// Returns `None` when there is no route table at all, and an empty set for
/// a table without routes.
pub fn route_cluster_names(route: Option<&RouteConfiguration>) -> Option<HashSet<String>> {
    let route = route?;
    let mut cluster_names = HashSet::new();

    for virtual_host in &route.virtual_hosts {
        for route in &virtual_host.routes {
            let Some(Action::Route(action)) = &route.action else {
                continue;
            };
            match &action.cluster_specifier {
                Some(ClusterSpecifier::Cluster(name)) if !name.is_empty() => {
                    cluster_names.insert(name.clone());
                }
                Some(ClusterSpecifier::WeightedClusters(weighted)) => {
                    for cluster in &weighted.clusters {
                        if !cluster.name.is_empty() {
                            cluster_names.insert(cluster.name.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Some(cluster_names)
}

/// The first TLS server name a filter chain matches on.
pub fn filter_chain_sni(chain: &FilterChain) -> Option<&str> {
    chain
        .filter_chain_match
        .as_ref()?
        .server_names
        .first()
        .map(String::as_str)
        .filter(|sni| !sni.is_empty())
}

/// Whether a transparent-proxy filter chain matches `vip`.
///
/// Outbound chains carry the full VIP as their address prefix, so this is an
/// exact string comparison with no CIDR arithmetic.
pub fn filter_chain_matches_vip(vip: &str, chain: &FilterChain) -> bool {
    chain
        .filter_chain_match
        .as_ref()
        .is_some_and(|m| m.prefix_ranges.iter().any(|range| range.address_prefix == vip))
}
