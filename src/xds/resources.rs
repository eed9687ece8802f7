use std::{collections::HashMap, fmt};

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use envoy_types::pb::google::protobuf::Any;
use prost::Message;

use crate::{Error, Result};

pub const CLUSTER_TYPE_URL: &str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";
pub const ROUTE_TYPE_URL: &str = "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";
pub const LISTENER_TYPE_URL: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";
pub const HTTP_CONNECTION_MANAGER_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
pub const TCP_PROXY_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.tcp_proxy.v3.TcpProxy";

/// Name of the cluster that points at the proxy's own local application.
pub const LOCAL_APP_CLUSTER_NAME: &str = "local_app";
/// Name prefix of the transparent-proxy outbound listener.
pub const OUTBOUND_LISTENER_NAME: &str = "outbound_listener";
/// Name prefix of the inbound public listener.
pub const PUBLIC_LISTENER_NAME: &str = "public_listener";

/// Whether an `Any` type URL names the given fully-qualified message.
///
/// Only the part after the last `/` is compared, so any URL prefix is accepted.
pub fn type_url_matches(type_url: &str, full_name: &str) -> bool {
    type_url.rsplit('/').next() == Some(full_name)
}

/// The resource kinds an extender walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Listener,
    Route,
    Cluster,
}

impl ResourceKind {
    /// Order in which kinds are visited during a patch pass.
    pub const PATCH_ORDER: [ResourceKind; 3] =
        [ResourceKind::Listener, ResourceKind::Route, ResourceKind::Cluster];

    pub fn type_url(self) -> &'static str {
        match self {
            ResourceKind::Listener => LISTENER_TYPE_URL,
            ResourceKind::Route => ROUTE_TYPE_URL,
            ResourceKind::Cluster => CLUSTER_TYPE_URL,
        }
    }

    /// Fully-qualified protobuf message name of this kind's payload.
    pub fn message_name(self) -> &'static str {
        let type_url = self.type_url();
        type_url.rsplit('/').next().unwrap_or(type_url)
    }

    /// The kind whose message a type URL names, under any URL prefix.
    pub fn from_type_url(type_url: &str) -> Option<Self> {
        Self::PATCH_ORDER
            .into_iter()
            .find(|kind| type_url_matches(type_url, kind.message_name()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Listener => write!(f, "listener"),
            ResourceKind::Route => write!(f, "route"),
            ResourceKind::Cluster => write!(f, "cluster"),
        }
    }
}

/// A decoded xDS resource payload.
///
/// `Other` keeps payloads of any type the extender does not understand so
/// they can be reported instead of silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Listener(Listener),
    Route(RouteConfiguration),
    Cluster(Cluster),
    Other(Any),
}

impl Resource {
    /// The kind this payload actually is, or `None` for `Other`.
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Resource::Listener(_) => Some(ResourceKind::Listener),
            Resource::Route(_) => Some(ResourceKind::Route),
            Resource::Cluster(_) => Some(ResourceKind::Cluster),
            Resource::Other(_) => None,
        }
    }

    pub fn type_url(&self) -> &str {
        match self {
            Resource::Other(any) => &any.type_url,
            _ => self.kind().map(ResourceKind::type_url).unwrap_or_default(),
        }
    }

    /// Decode an `Any` by its type URL. Unknown types are kept as `Other`.
    pub fn from_any(any: Any) -> Result<Self> {
        let decoded = match ResourceKind::from_type_url(&any.type_url) {
            Some(ResourceKind::Listener) => Listener::decode(&any.value[..]).map(Resource::Listener),
            Some(ResourceKind::Route) => {
                RouteConfiguration::decode(&any.value[..]).map(Resource::Route)
            }
            Some(ResourceKind::Cluster) => Cluster::decode(&any.value[..]).map(Resource::Cluster),
            None => return Ok(Resource::Other(any)),
        };

        decoded.map_err(|source| Error::Decode { type_url: any.type_url.clone(), source })
    }

    pub fn to_any(&self) -> Any {
        let value = match self {
            Resource::Listener(listener) => listener.encode_to_vec(),
            Resource::Route(route) => route.encode_to_vec(),
            Resource::Cluster(cluster) => cluster.encode_to_vec(),
            Resource::Other(any) => return any.clone(),
        };
        Any { type_url: self.type_url().to_string(), value }
    }
}

impl From<Listener> for Resource {
    fn from(listener: Listener) -> Self {
        Resource::Listener(listener)
    }
}

impl From<RouteConfiguration> for Resource {
    fn from(route: RouteConfiguration) -> Self {
        Resource::Route(route)
    }
}

impl From<Cluster> for Resource {
    fn from(cluster: Cluster) -> Self {
        Resource::Cluster(cluster)
    }
}

/// Wrapper for an encoded Envoy resource along with its name.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltResource {
    pub name: String,
    pub resource: Any,
}

impl BuiltResource {
    pub fn into_any(self) -> Any {
        self.resource
    }

    pub fn type_url(&self) -> &str {
        &self.resource.type_url
    }
}

/// Generated resources indexed by kind, then by name (or SNI for clusters).
///
/// The extender mutates entries in place through `&mut`; callers must not
/// share one set between concurrent passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedResources {
    index: HashMap<ResourceKind, HashMap<String, Resource>>,
}

impl IndexedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource under `kind`/`name`, returning any previous entry.
    pub fn insert(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        resource: impl Into<Resource>,
    ) -> Option<Resource> {
        self.index.entry(kind).or_default().insert(name.into(), resource.into())
    }

    pub fn insert_listener(&mut self, listener: Listener) -> Option<Resource> {
        let name = listener.name.clone();
        self.insert(ResourceKind::Listener, name, listener)
    }

    pub fn insert_route(&mut self, route: RouteConfiguration) -> Option<Resource> {
        let name = route.name.clone();
        self.insert(ResourceKind::Route, name, route)
    }

    pub fn insert_cluster(&mut self, cluster: Cluster) -> Option<Resource> {
        let name = cluster.name.clone();
        self.insert(ResourceKind::Cluster, name, cluster)
    }

    /// Decode and store an `Any`-wrapped resource under `kind`/`name`.
    pub fn insert_any(&mut self, kind: ResourceKind, name: impl Into<String>, any: Any) -> Result<()> {
        let resource = Resource::from_any(any)?;
        self.insert(kind, name, resource);
        Ok(())
    }

    /// Index already-built resources, taking each one's kind from its type URL.
    pub fn from_built(built: impl IntoIterator<Item = BuiltResource>) -> Result<Self> {
        let mut resources = Self::new();
        for BuiltResource { name, resource } in built {
            let kind = ResourceKind::from_type_url(&resource.type_url).ok_or_else(|| {
                Error::UnsupportedResource { name: name.clone(), type_url: resource.type_url.clone() }
            })?;
            resources.insert_any(kind, name, resource)?;
        }
        Ok(resources)
    }

    /// Re-encode every entry of `kind`, sorted by name.
    pub fn built(&self, kind: ResourceKind) -> Vec<BuiltResource> {
        let mut built: Vec<BuiltResource> = self
            .of_kind(kind)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(name, resource)| BuiltResource {
                        name: name.clone(),
                        resource: resource.to_any(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        built.sort_by(|a, b| a.name.cmp(&b.name));
        built
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&Resource> {
        self.index.get(&kind)?.get(name)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> Option<&HashMap<String, Resource>> {
        self.index.get(&kind)
    }

    pub(crate) fn of_kind_mut(&mut self, kind: ResourceKind) -> Option<&mut HashMap<String, Resource>> {
        self.index.get_mut(&kind)
    }

    pub fn listener(&self, name: &str) -> Option<&Listener> {
        match self.get(ResourceKind::Listener, name)? {
            Resource::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    pub fn route(&self, name: &str) -> Option<&RouteConfiguration> {
        match self.get(ResourceKind::Route, name)? {
            Resource::Route(route) => Some(route),
            _ => None,
        }
    }

    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        match self.get(ResourceKind::Cluster, name)? {
            Resource::Cluster(cluster) => Some(cluster),
            _ => None,
        }
    }

    /// Every listener payload, with the name it is indexed under.
    pub fn listeners(&self) -> impl Iterator<Item = (&str, &Listener)> {
        self.entries(ResourceKind::Listener).filter_map(|(name, resource)| match resource {
            Resource::Listener(listener) => Some((name, listener)),
            _ => None,
        })
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &RouteConfiguration)> {
        self.entries(ResourceKind::Route).filter_map(|(name, resource)| match resource {
            Resource::Route(route) => Some((name, route)),
            _ => None,
        })
    }

    pub fn clusters(&self) -> impl Iterator<Item = (&str, &Cluster)> {
        self.entries(ResourceKind::Cluster).filter_map(|(name, resource)| match resource {
            Resource::Cluster(cluster) => Some((name, cluster)),
            _ => None,
        })
    }

    fn entries(&self, kind: ResourceKind) -> impl Iterator<Item = (&str, &Resource)> {
        self.index
            .get(&kind)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(name, resource)| (name.as_str(), resource)))
    }

    /// Total number of entries across all kinds.
    pub fn len(&self) -> usize {
        self.index.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
