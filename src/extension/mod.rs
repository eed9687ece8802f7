//! Extension contract and the extender that applies it.
//!
//! Extension authors implement [`BasicExtension`]: stateless, resource-local
//! patch functions. [`BasicEnvoyExtender`] owns everything else: deciding
//! which resources an extension instance may see, walking listeners down to
//! their filters, writing results back and collecting failures.
//!
//! ```rust,ignore
//! use xds_extender::extension::{BasicEnvoyExtender, EnvoyExtender};
//!
//! let extender = BasicEnvoyExtender::new(MyExtension::default());
//! extender.validate(&config)?;
//! if let Err(errors) = extender.extend(&mut resources, &config) {
//!     tracing::warn!(%errors, "extension partially applied");
//! }
//! ```

mod basic;
mod listener;
pub mod matching;

pub use basic::BasicEnvoyExtender;

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::Filter;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;

use crate::config::RuntimeConfig;
use crate::errors::{PatchErrors, Result};
use crate::xds::IndexedResources;

/// Patch functions an extension provides.
///
/// Every patch call returns `Ok(Some(new))` to replace the resource,
/// `Ok(None)` to leave it as is, or an error, in which case the original is
/// kept and the error is reported. Patch calls must not have side effects
/// beyond their return value. They are only ever handed resources that
/// belong to the config's scope.
pub trait BasicExtension {
    /// Whether this extension can do anything for `config` at all.
    fn can_apply(&self, config: &RuntimeConfig) -> bool;

    fn patch_route(
        &self,
        _config: &RuntimeConfig,
        _route: &RouteConfiguration,
    ) -> anyhow::Result<Option<RouteConfiguration>> {
        Ok(None)
    }

    fn patch_cluster(
        &self,
        _config: &RuntimeConfig,
        _cluster: &Cluster,
    ) -> anyhow::Result<Option<Cluster>> {
        Ok(None)
    }

    /// Patch one network filter of an in-scope listener filter chain.
    fn patch_filter(&self, _config: &RuntimeConfig, _filter: &Filter) -> anyhow::Result<Option<Filter>> {
        Ok(None)
    }
}

impl<T: BasicExtension + ?Sized> BasicExtension for Box<T> {
    fn can_apply(&self, config: &RuntimeConfig) -> bool {
        (**self).can_apply(config)
    }

    fn patch_route(
        &self,
        config: &RuntimeConfig,
        route: &RouteConfiguration,
    ) -> anyhow::Result<Option<RouteConfiguration>> {
        (**self).patch_route(config, route)
    }

    fn patch_cluster(&self, config: &RuntimeConfig, cluster: &Cluster) -> anyhow::Result<Option<Cluster>> {
        (**self).patch_cluster(config, cluster)
    }

    fn patch_filter(&self, config: &RuntimeConfig, filter: &Filter) -> anyhow::Result<Option<Filter>> {
        (**self).patch_filter(config, filter)
    }
}

/// Something that can rewrite an indexed resource set for one extension
/// instance.
pub trait EnvoyExtender {
    /// Check that `config` is usable before any resources are touched.
    fn validate(&self, config: &RuntimeConfig) -> Result<()>;

    /// Patch `resources` in place.
    ///
    /// Returns every per-resource failure as one aggregate. Resources that
    /// patched successfully stay patched even when an error is returned;
    /// only the ones whose patch call failed keep their previous form.
    fn extend(
        &self,
        resources: &mut IndexedResources,
        config: &RuntimeConfig,
    ) -> std::result::Result<(), PatchErrors>;
}
