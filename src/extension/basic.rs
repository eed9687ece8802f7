use tracing::{debug, info, warn};

use super::matching::{cluster_in_scope, route_in_scope};
use super::{BasicExtension, EnvoyExtender};
use crate::config::RuntimeConfig;
use crate::errors::{Error, PatchErrors, Result};
use crate::extension_span;
use crate::xds::{IndexedResources, Resource, ResourceKind};

/// Applies a [`BasicExtension`] to every in-scope resource of a set.
///
/// Holds no state between calls; one extender can serve any number of
/// resource sets.
#[derive(Debug, Clone, Default)]
pub struct BasicEnvoyExtender<E> {
    extension: E,
}

impl<E: BasicExtension> BasicEnvoyExtender<E> {
    pub fn new(extension: E) -> Self {
        Self { extension }
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }

    pub fn into_inner(self) -> E {
        self.extension
    }

    fn patch_resource(
        &self,
        config: &RuntimeConfig,
        indexed_as: ResourceKind,
        name: &str,
        resource: &mut Resource,
        errors: &mut PatchErrors,
    ) {
        if let Some(actual) = resource.kind() {
            if actual != indexed_as {
                errors.push(Error::KindMismatch { name: name.to_string(), indexed: indexed_as, actual });
                return;
            }
        }

        match resource {
            Resource::Cluster(cluster) => {
                if !cluster_in_scope(config, name) {
                    debug!(cluster = %name, "Cluster out of scope, skipping");
                    return;
                }
                match self.extension.patch_cluster(config, cluster) {
                    Ok(Some(patched)) => {
                        *cluster = patched;
                        info!(cluster = %name, "Patched cluster");
                    }
                    Ok(None) => {}
                    Err(source) => {
                        warn!(cluster = %name, error = %source, "Failed to patch cluster");
                        errors.push(Error::PatchCluster { name: name.to_string(), source });
                    }
                }
            }

            Resource::Listener(listener) => {
                if self.patch_listener(config, listener, errors) {
                    info!(listener = %name, "Patched listener");
                }
            }

            Resource::Route(route) => {
                if !route_in_scope(config, name) {
                    debug!(route = %name, "Route out of scope, skipping");
                    return;
                }
                match self.extension.patch_route(config, route) {
                    Ok(Some(patched)) => {
                        *route = patched;
                        info!(route = %name, "Patched route");
                    }
                    Ok(None) => {}
                    Err(source) => {
                        warn!(route = %name, error = %source, "Failed to patch route");
                        errors.push(Error::PatchRoute { name: name.to_string(), source });
                    }
                }
            }

            Resource::Other(any) => {
                warn!(resource = %name, type_url = %any.type_url, "Unsupported resource type skipped");
                errors.push(Error::UnsupportedResource {
                    name: name.to_string(),
                    type_url: any.type_url.clone(),
                });
            }
        }
    }
}

impl<E: BasicExtension> EnvoyExtender for BasicEnvoyExtender<E> {
    fn validate(&self, config: &RuntimeConfig) -> Result<()> {
        config.validate()
    }

    fn extend(
        &self,
        resources: &mut IndexedResources,
        config: &RuntimeConfig,
    ) -> std::result::Result<(), PatchErrors> {
        let span = extension_span!(
            config.envoy_extension.name,
            config.service_name,
            config.kind,
            direction = ?config.direction
        );
        let _entered = span.enter();

        if !config.kind.is_extensible() {
            debug!("Service kind not supported by the extender, skipping");
            return Ok(());
        }

        if !self.extension.can_apply(config) {
            debug!("Extension does not apply, skipping");
            return Ok(());
        }

        let mut errors = PatchErrors::new();
        for kind in ResourceKind::PATCH_ORDER {
            let Some(entries) = resources.of_kind_mut(kind) else {
                continue;
            };
            for (name, resource) in entries.iter_mut() {
                self.patch_resource(config, kind, name, resource, &mut errors);
            }
        }

        if !errors.is_empty() {
            warn!(error_count = errors.len(), "Extension applied with errors");
        }

        errors.into_result()
    }
}
