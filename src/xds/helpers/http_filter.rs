//! Helpers for extensions that rewrite the HTTP connection manager inside a
//! network filter.
//!
//! Encapsulates the decode → modify → re-encode cycle so a `patch_filter`
//! implementation only has to describe the change it wants.

use envoy_types::pb::envoy::config::listener::v3::{filter::ConfigType, Filter};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    HttpConnectionManager, HttpFilter,
};
use envoy_types::pb::google::protobuf::Any;
use prost::Message;

use super::references::{typed_config, HTTP_CONNECTION_MANAGER_MESSAGE};
use crate::xds::type_url_matches;
use crate::{Error, Result};

pub const HTTP_CONNECTION_MANAGER_FILTER_NAME: &str = "envoy.filters.network.http_connection_manager";
pub const ROUTER_FILTER_NAME: &str = "envoy.filters.http.router";

/// Build a network filter whose typed config is `config`.
pub fn make_filter<M: Message>(name: &str, type_url: &str, config: &M) -> Filter {
    Filter {
        name: name.to_string(),
        config_type: Some(ConfigType::TypedConfig(Any {
            type_url: type_url.to_string(),
            value: config.encode_to_vec(),
        })),
    }
}

/// Apply `f` to the HTTP connection manager carried by `filter`.
///
/// `f` returns `Ok(true)` when it changed the HCM. Returns `Ok(Some(filter))`
/// with the re-encoded HCM in that case, and `Ok(None)` when `filter` is not
/// an HCM or `f` left it alone. A filter that claims to be an HCM but does
/// not decode is an error.
pub fn modify_http_connection_manager<F>(filter: &Filter, f: F) -> Result<Option<Filter>>
where
    F: FnOnce(&mut HttpConnectionManager) -> Result<bool>,
{
    let Some(any) = typed_config(filter) else {
        return Ok(None);
    };
    if !type_url_matches(&any.type_url, HTTP_CONNECTION_MANAGER_MESSAGE) {
        return Ok(None);
    }

    let mut hcm = HttpConnectionManager::decode(&any.value[..])
        .map_err(|source| Error::Decode { type_url: any.type_url.clone(), source })?;

    if !f(&mut hcm)? {
        return Ok(None);
    }

    Ok(Some(Filter {
        name: filter.name.clone(),
        config_type: Some(ConfigType::TypedConfig(Any {
            type_url: any.type_url.clone(),
            value: hcm.encode_to_vec(),
        })),
    }))
}

/// Insert `http_filter` just before the router in the filter's HCM.
///
/// The router must stay last, so the new filter goes in front of it (or at
/// the end when no router is configured). With `skip_if_exists`, an HCM
/// that already has a filter of the same name is left unchanged.
pub fn insert_http_filter(
    filter: &Filter,
    http_filter: HttpFilter,
    skip_if_exists: bool,
) -> Result<Option<Filter>> {
    modify_http_connection_manager(filter, |hcm| {
        if skip_if_exists && hcm.http_filters.iter().any(|f| f.name == http_filter.name) {
            return Ok(false);
        }

        let router_pos = hcm
            .http_filters
            .iter()
            .position(|f| f.name == ROUTER_FILTER_NAME)
            .unwrap_or(hcm.http_filters.len());

        hcm.http_filters.insert(router_pos, http_filter);
        Ok(true)
    })
}

/// Names of the HTTP filters in the filter's HCM, in order.
pub fn http_filter_names(filter: &Filter) -> Vec<String> {
    super::http_connection_manager(filter)
        .map(|hcm| hcm.http_filters.into_iter().map(|f| f.name).collect())
        .unwrap_or_default()
}
