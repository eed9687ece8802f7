//! Listener traversal: find the in-scope filter chains and run every filter
//! in them through the extension.

use envoy_types::pb::envoy::config::listener::v3::{FilterChain, Listener};
use tracing::{debug, warn};

use super::matching::{listener_scope, ListenerScope};
use super::{BasicEnvoyExtender, BasicExtension};
use crate::config::RuntimeConfig;
use crate::errors::{Error, PatchErrors};

impl<E: BasicExtension> BasicEnvoyExtender<E> {
    /// Patch the in-scope filter chains of `listener` in place.
    ///
    /// Returns whether any filter changed. Filters whose patch call fails
    /// keep their previous form and the failure is pushed onto `errors`;
    /// sibling filters are still patched.
    pub fn patch_listener(
        &self,
        config: &RuntimeConfig,
        listener: &mut Listener,
        errors: &mut PatchErrors,
    ) -> bool {
        let scope = listener_scope(config, &listener.name);
        if scope == ListenerScope::OutOfScope {
            debug!(listener = %listener.name, "Listener out of scope, skipping");
            return false;
        }

        let mut patched = false;
        for chain in listener.filter_chains.iter_mut() {
            if !scope.includes(config, chain) {
                continue;
            }
            patched |= self.patch_filter_chain(config, &listener.name, chain, errors);
        }
        patched
    }

    fn patch_filter_chain(
        &self,
        config: &RuntimeConfig,
        listener_name: &str,
        chain: &mut FilterChain,
        errors: &mut PatchErrors,
    ) -> bool {
        let mut patched = false;

        for filter in chain.filters.iter_mut() {
            match self.extension().patch_filter(config, filter) {
                Ok(Some(new_filter)) => {
                    *filter = new_filter;
                    patched = true;
                }
                Ok(None) => {}
                Err(source) => {
                    warn!(
                        listener = %listener_name,
                        filter = %filter.name,
                        error = %source,
                        "Failed to patch listener filter"
                    );
                    errors.push(Error::PatchFilter {
                        listener: listener_name.to_string(),
                        filter: filter.name.clone(),
                        source,
                    });
                }
            }
        }

        patched
    }
}
