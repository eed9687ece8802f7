//! Scope predicates evaluated before any patch call.

use envoy_types::pb::envoy::config::listener::v3::FilterChain;

use crate::config::{Direction, RuntimeConfig, ServiceKind};
use crate::xds::helpers::{filter_chain_matches_vip, filter_chain_sni};
use crate::xds::{LOCAL_APP_CLUSTER_NAME, OUTBOUND_LISTENER_NAME, PUBLIC_LISTENER_NAME};

/// Whether the cluster indexed as `name` belongs to the config's scope.
///
/// Upstream instances only see clusters carrying one of their upstream's
/// SNIs. Downstream instances see everything except the local app cluster.
pub fn cluster_in_scope(config: &RuntimeConfig, name: &str) -> bool {
    if config.is_upstream() {
        config.matches_upstream_service_sni(name)
    } else {
        name != LOCAL_APP_CLUSTER_NAME
    }
}

/// Whether the route configuration indexed as `name` belongs to the config's
/// scope. Inbound sides have no routes to patch.
pub fn route_in_scope(config: &RuntimeConfig, name: &str) -> bool {
    config.is_upstream()
        && (config.matches_upstream_service_sni(name) || config.envoy_id() == Some(name))
}

/// Everything before the first `:` of a listener name, or `""` when the
/// name has no colon.
pub fn listener_discovery_prefix(name: &str) -> &str {
    name.split_once(':').map(|(prefix, _)| prefix).unwrap_or("")
}

/// Which filter chains of a listener an extension instance may patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope<'a> {
    /// No chain.
    OutOfScope,
    /// Chains whose first SNI belongs to the upstream (terminating gateways).
    UpstreamSni,
    /// Every chain (the upstream's own listener, or the public listener).
    AllChains,
    /// Chains whose address prefix is exactly this VIP (transparent proxy).
    Vip(&'a str),
}

impl ListenerScope<'_> {
    pub fn includes(&self, config: &RuntimeConfig, chain: &FilterChain) -> bool {
        match self {
            ListenerScope::OutOfScope => false,
            ListenerScope::AllChains => true,
            ListenerScope::UpstreamSni => {
                filter_chain_sni(chain).is_some_and(|sni| config.matches_upstream_service_sni(sni))
            }
            ListenerScope::Vip(vip) => filter_chain_matches_vip(vip, chain),
        }
    }
}

/// Decide how much of the listener named `listener_name` is in scope.
pub fn listener_scope<'a>(config: &'a RuntimeConfig, listener_name: &str) -> ListenerScope<'a> {
    match config.kind {
        // Terminating gateways cannot be targeted from the inbound side.
        ServiceKind::TerminatingGateway if config.is_upstream() => ListenerScope::UpstreamSni,
        ServiceKind::ConnectProxy => {
            let prefix = listener_discovery_prefix(listener_name);
            match config.direction {
                Direction::Upstream if prefix == OUTBOUND_LISTENER_NAME => {
                    config.vip().map_or(ListenerScope::OutOfScope, ListenerScope::Vip)
                }
                Direction::Upstream if config.envoy_id() == Some(prefix) => ListenerScope::AllChains,
                Direction::Downstream if prefix == PUBLIC_LISTENER_NAME => ListenerScope::AllChains,
                _ => ListenerScope::OutOfScope,
            }
        }
        _ => ListenerScope::OutOfScope,
    }
}
