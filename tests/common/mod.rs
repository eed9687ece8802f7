//! Common fixtures for the extender integration tests.
//!
//! Provides runtime configs for the supported proxy kinds, listener and
//! filter builders, and a small HTTP-filter-inserting extension.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::cell::RefCell;

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::core::v3::CidrRange;
use envoy_types::pb::envoy::config::listener::v3::{Filter, FilterChain, FilterChainMatch, Listener};
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager::RouteSpecifier, HttpConnectionManager, HttpFilter, Rds,
};
use envoy_types::pb::envoy::extensions::filters::network::tcp_proxy::v3::{tcp_proxy, TcpProxy};

use xds_extender::config::{
    CompoundServiceName, Direction, EnvoyExtension, RuntimeConfig, ServiceKind, UpstreamData,
};
use xds_extender::xds::helpers::{
    insert_http_filter, make_filter, HTTP_CONNECTION_MANAGER_FILTER_NAME, ROUTER_FILTER_NAME,
};
use xds_extender::xds::{HTTP_CONNECTION_MANAGER_TYPE_URL, TCP_PROXY_TYPE_URL};
use xds_extender::BasicExtension;

pub const DB_SNI: &str = "db.default.dc1.internal.11111111-2222-3333-4444-555555555555.consul";
pub const DB_V2_SNI: &str = "v2.db.default.dc1.internal.11111111-2222-3333-4444-555555555555.consul";
pub const WEB_SNI: &str = "web.default.dc1.internal.11111111-2222-3333-4444-555555555555.consul";
pub const DB_VIP: &str = "240.0.0.1";
pub const LUA_FILTER_NAME: &str = "envoy.filters.http.lua";
pub const TCP_PROXY_FILTER_NAME: &str = "envoy.filters.network.tcp_proxy";

/// Runtime config targeting `db`, which is an upstream of the proxy with
/// two SNIs, a discovery ID and a VIP.
pub fn db_config(kind: ServiceKind, direction: Direction) -> RuntimeConfig {
    RuntimeConfig::new(
        EnvoyExtension::new("builtin/lua"),
        CompoundServiceName::new("db"),
        kind,
        direction,
    )
    .with_upstream(
        CompoundServiceName::new("db"),
        UpstreamData::with_sni(DB_SNI)
            .with_additional_sni(DB_V2_SNI)
            .with_envoy_id("db")
            .with_vip(DB_VIP),
    )
    .with_upstream(
        CompoundServiceName::new("web"),
        UpstreamData::with_sni(WEB_SNI).with_envoy_id("web").with_vip("240.0.0.2"),
    )
    .with_protocol("http")
}

pub fn cluster(name: &str) -> Cluster {
    Cluster { name: name.to_string(), ..Default::default() }
}

pub fn route(name: &str) -> RouteConfiguration {
    RouteConfiguration { name: name.to_string(), ..Default::default() }
}

/// An HCM network filter that fetches `route_config_name` over RDS.
pub fn rds_filter(route_config_name: &str) -> Filter {
    let hcm = HttpConnectionManager {
        stat_prefix: "upstream".to_string(),
        route_specifier: Some(RouteSpecifier::Rds(Rds {
            route_config_name: route_config_name.to_string(),
            config_source: None,
        })),
        http_filters: vec![HttpFilter {
            name: ROUTER_FILTER_NAME.to_string(),
            config_type: None,
            is_optional: false,
            disabled: false,
        }],
        ..Default::default()
    };
    make_filter(HTTP_CONNECTION_MANAGER_FILTER_NAME, HTTP_CONNECTION_MANAGER_TYPE_URL, &hcm)
}

/// A TCP proxy network filter sending everything to `cluster_name`.
pub fn tcp_filter(cluster_name: &str) -> Filter {
    let tcp = TcpProxy {
        stat_prefix: "upstream".to_string(),
        cluster_specifier: Some(tcp_proxy::ClusterSpecifier::Cluster(cluster_name.to_string())),
        ..Default::default()
    };
    make_filter(TCP_PROXY_FILTER_NAME, TCP_PROXY_TYPE_URL, &tcp)
}

pub fn sni_chain(sni: &str, filters: Vec<Filter>) -> FilterChain {
    FilterChain {
        filter_chain_match: Some(FilterChainMatch {
            server_names: vec![sni.to_string()],
            ..Default::default()
        }),
        filters,
        ..Default::default()
    }
}

pub fn vip_chain(prefix: &str, filters: Vec<Filter>) -> FilterChain {
    FilterChain {
        filter_chain_match: Some(FilterChainMatch {
            prefix_ranges: vec![CidrRange { address_prefix: prefix.to_string(), prefix_len: None }],
            ..Default::default()
        }),
        filters,
        ..Default::default()
    }
}

pub fn plain_chain(filters: Vec<Filter>) -> FilterChain {
    FilterChain { filters, ..Default::default() }
}

pub fn listener(name: &str, filter_chains: Vec<FilterChain>) -> Listener {
    Listener { name: name.to_string(), filter_chains, ..Default::default() }
}

/// Inserts a Lua HTTP filter into every HCM it is handed.
///
/// Inserting is skipped when the filter is already present, so applying the
/// extension twice gives the same result as applying it once.
#[derive(Debug, Default)]
pub struct LuaExtension;

impl BasicExtension for LuaExtension {
    fn can_apply(&self, config: &RuntimeConfig) -> bool {
        config.protocol == "http"
    }

    fn patch_filter(&self, _config: &RuntimeConfig, filter: &Filter) -> anyhow::Result<Option<Filter>> {
        let lua = HttpFilter {
            name: LUA_FILTER_NAME.to_string(),
            config_type: None,
            is_optional: false,
            disabled: false,
        };
        Ok(insert_http_filter(filter, lua, true)?)
    }
}

/// Records every name it is asked to patch and changes nothing.
#[derive(Debug, Default)]
pub struct Recorder {
    pub clusters: RefCell<Vec<String>>,
    pub routes: RefCell<Vec<String>>,
    pub filters: RefCell<Vec<String>>,
}

impl BasicExtension for Recorder {
    fn can_apply(&self, _config: &RuntimeConfig) -> bool {
        true
    }

    fn patch_route(
        &self,
        _config: &RuntimeConfig,
        route: &RouteConfiguration,
    ) -> anyhow::Result<Option<RouteConfiguration>> {
        self.routes.borrow_mut().push(route.name.clone());
        Ok(None)
    }

    fn patch_cluster(&self, _config: &RuntimeConfig, cluster: &Cluster) -> anyhow::Result<Option<Cluster>> {
        self.clusters.borrow_mut().push(cluster.name.clone());
        Ok(None)
    }

    fn patch_filter(&self, _config: &RuntimeConfig, filter: &Filter) -> anyhow::Result<Option<Filter>> {
        self.filters.borrow_mut().push(filter.name.clone());
        Ok(None)
    }
}
