//! Runtime scope of one extension instance.
//!
//! A [`RuntimeConfig`] says which proxy the extension is being applied to
//! (its service kind), whether it targets one of the proxy's upstreams or
//! the proxy's own inbound side, and the identifiers the extender matches
//! resources against.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::errors::{Error, Result};

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_PARTITION: &str = "default";

/// A service name qualified by namespace and admin partition.
///
/// Renders as `partition/namespace/name`, which is also its serialized form
/// so it can key a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompoundServiceName {
    pub name: String,
    pub namespace: String,
    pub partition: String,
}

impl CompoundServiceName {
    /// A name in the default namespace and partition.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            partition: DEFAULT_PARTITION.to_string(),
        }
    }

    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_partition<S: Into<String>>(mut self, partition: S) -> Self {
        self.partition = partition.into();
        self
    }
}

impl fmt::Display for CompoundServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.partition, self.namespace, self.name)
    }
}

impl FromStr for CompoundServiceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [name] if !name.is_empty() => Ok(Self::new(*name)),
            [partition, namespace, name] if !name.is_empty() => Ok(Self {
                name: name.to_string(),
                namespace: namespace.to_string(),
                partition: partition.to_string(),
            }),
            _ => Err(Error::config(format!(
                "Invalid service name '{}': expected 'name' or 'partition/namespace/name'",
                s
            ))),
        }
    }
}

impl Serialize for CompoundServiceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompoundServiceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of proxy a service runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    /// A plain service with no proxy role.
    #[default]
    #[serde(rename = "")]
    Typical,
    ConnectProxy,
    MeshGateway,
    TerminatingGateway,
    IngressGateway,
    ApiGateway,
}

impl ServiceKind {
    /// Proxy kinds whose resources the basic extender knows how to walk.
    pub fn is_extensible(self) -> bool {
        matches!(self, ServiceKind::ConnectProxy | ServiceKind::TerminatingGateway)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Typical => "",
            ServiceKind::ConnectProxy => "connect-proxy",
            ServiceKind::MeshGateway => "mesh-gateway",
            ServiceKind::TerminatingGateway => "terminating-gateway",
            ServiceKind::IngressGateway => "ingress-gateway",
            ServiceKind::ApiGateway => "api-gateway",
        };
        f.write_str(name)
    }
}

/// Which side of the proxy an extension instance targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Outbound resources for one of the proxy's upstream services.
    Upstream,
    /// Inbound resources for the proxy's own local service.
    #[default]
    Downstream,
}

/// What the proxy knows about one upstream service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamData {
    /// SNI of the upstream's default target.
    #[serde(default)]
    pub primary_sni: String,
    /// Every SNI the upstream's clusters and gateway chains may use.
    #[serde(default)]
    pub snis: HashSet<String>,
    /// Transparent-proxy virtual IP.
    #[serde(default)]
    pub vip: String,
    /// Discovery ID used to name the upstream's listener and route.
    #[serde(default)]
    pub envoy_id: String,
    /// Kind of proxy the outgoing traffic is sent through.
    #[serde(default)]
    pub outgoing_proxy_kind: ServiceKind,
}

impl UpstreamData {
    /// Upstream data with a single SNI that is also the primary one.
    pub fn with_sni<S: Into<String>>(sni: S) -> Self {
        let sni = sni.into();
        Self { primary_sni: sni.clone(), snis: HashSet::from([sni]), ..Default::default() }
    }

    pub fn with_envoy_id<S: Into<String>>(mut self, envoy_id: S) -> Self {
        self.envoy_id = envoy_id.into();
        self
    }

    pub fn with_vip<S: Into<String>>(mut self, vip: S) -> Self {
        self.vip = vip.into();
        self
    }

    pub fn with_additional_sni<S: Into<String>>(mut self, sni: S) -> Self {
        self.snis.insert(sni.into());
        self
    }
}

/// The user-facing declaration that produced an extension instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct EnvoyExtension {
    #[validate(length(min = 1, message = "Extension name cannot be empty"))]
    pub name: String,

    /// Whether a failure to apply should block proxy configuration.
    #[serde(default)]
    pub required: bool,

    /// Extension-specific arguments, interpreted only by the extension.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl EnvoyExtension {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_argument<K: Into<String>>(mut self, key: K, value: serde_json::Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }
}

/// Scope of one extension instance applied to one proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RuntimeConfig {
    #[validate(nested)]
    pub envoy_extension: EnvoyExtension,

    /// The service the extension targets: an upstream when `direction` is
    /// upstream, otherwise the proxy's own service.
    pub service_name: CompoundServiceName,

    /// Upstreams of the proxy, keyed by service name.
    #[serde(default)]
    pub upstreams: HashMap<CompoundServiceName, UpstreamData>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default)]
    pub kind: ServiceKind,

    /// Protocol of the targeted service (tcp, http, http2, grpc).
    #[serde(default)]
    pub protocol: String,
}

impl RuntimeConfig {
    pub fn new(
        envoy_extension: EnvoyExtension,
        service_name: CompoundServiceName,
        kind: ServiceKind,
        direction: Direction,
    ) -> Self {
        Self {
            envoy_extension,
            service_name,
            upstreams: HashMap::new(),
            direction,
            kind,
            protocol: String::new(),
        }
    }

    pub fn with_upstream(mut self, service: CompoundServiceName, data: UpstreamData) -> Self {
        self.upstreams.insert(service, data);
        self
    }

    pub fn with_protocol<S: Into<String>>(mut self, protocol: S) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn is_upstream(&self) -> bool {
        self.direction == Direction::Upstream
    }

    /// Upstream record of the targeted service.
    pub fn upstream(&self) -> Option<&UpstreamData> {
        self.upstreams.get(&self.service_name)
    }

    /// Whether `sni` belongs to the targeted upstream service.
    pub fn matches_upstream_service_sni(&self, sni: &str) -> bool {
        self.upstream().is_some_and(|u| u.snis.contains(sni))
    }

    /// Discovery ID of the targeted upstream, if it has one.
    pub fn envoy_id(&self) -> Option<&str> {
        self.upstream().map(|u| u.envoy_id.as_str()).filter(|id| !id.is_empty())
    }

    /// Transparent-proxy VIP of the targeted upstream, if it has one.
    pub fn vip(&self) -> Option<&str> {
        self.upstream().map(|u| u.vip.as_str()).filter(|vip| !vip.is_empty())
    }

    /// Structural checks on the config itself.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if self.is_upstream() && self.upstream().is_none() {
            return Err(Error::validation(format!(
                "Upstream extension '{}' targets '{}' which is not an upstream of this proxy",
                self.envoy_extension.name, self.service_name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upstream_config() -> RuntimeConfig {
        RuntimeConfig::new(
            EnvoyExtension::new("builtin/lua"),
            CompoundServiceName::new("db"),
            ServiceKind::ConnectProxy,
            Direction::Upstream,
        )
        .with_upstream(
            CompoundServiceName::new("db"),
            UpstreamData::with_sni("db.default.dc1.internal.example.consul")
                .with_envoy_id("db")
                .with_vip("240.0.0.1"),
        )
    }

    #[test]
    fn compound_name_parsing() {
        let full: CompoundServiceName = "ap1/ns1/db".parse().unwrap();
        assert_eq!(full, CompoundServiceName::new("db").with_namespace("ns1").with_partition("ap1"));
        assert_eq!(full.to_string(), "ap1/ns1/db");

        let bare: CompoundServiceName = "db".parse().unwrap();
        assert_eq!(bare.to_string(), "default/default/db");

        assert!("".parse::<CompoundServiceName>().is_err());
        assert!("ns/db".parse::<CompoundServiceName>().is_err());
        assert!("a/b/".parse::<CompoundServiceName>().is_err());
    }

    #[test]
    fn derived_queries() {
        let config = upstream_config();
        assert!(config.is_upstream());
        assert!(config.matches_upstream_service_sni("db.default.dc1.internal.example.consul"));
        assert!(!config.matches_upstream_service_sni("web.default.dc1.internal.example.consul"));
        assert_eq!(config.envoy_id(), Some("db"));
        assert_eq!(config.vip(), Some("240.0.0.1"));
    }

    #[test]
    fn missing_upstream_record_matches_nothing() {
        let config = RuntimeConfig::new(
            EnvoyExtension::new("builtin/lua"),
            CompoundServiceName::new("web"),
            ServiceKind::ConnectProxy,
            Direction::Downstream,
        );
        assert!(!config.is_upstream());
        assert!(!config.matches_upstream_service_sni(""));
        assert_eq!(config.envoy_id(), None);
        assert_eq!(config.vip(), None);
    }

    #[test]
    fn empty_identifiers_are_absent() {
        let config = RuntimeConfig::new(
            EnvoyExtension::new("builtin/lua"),
            CompoundServiceName::new("db"),
            ServiceKind::ConnectProxy,
            Direction::Upstream,
        )
        .with_upstream(CompoundServiceName::new("db"), UpstreamData::default());
        assert_eq!(config.envoy_id(), None);
        assert_eq!(config.vip(), None);
    }

    #[test]
    fn validation() {
        assert!(upstream_config().validate().is_ok());

        let mut unnamed = upstream_config();
        unnamed.envoy_extension.name.clear();
        assert!(matches!(unnamed.validate(), Err(Error::Validation(_))));

        let mut orphan = upstream_config();
        orphan.upstreams.clear();
        let err = orphan.validate().unwrap_err();
        assert!(err.to_string().contains("not an upstream"));
    }

    #[test]
    fn deserializes_from_json() {
        let config: RuntimeConfig = serde_json::from_value(json!({
            "envoy_extension": {
                "name": "builtin/lua",
                "arguments": { "Script": "function envoy_on_request(h) end" }
            },
            "service_name": "default/default/db",
            "upstreams": {
                "default/default/db": {
                    "snis": ["db.default.dc1.internal.example.consul"],
                    "envoy_id": "db",
                    "vip": "240.0.0.1"
                }
            },
            "direction": "upstream",
            "kind": "terminating-gateway"
        }))
        .unwrap();

        assert_eq!(config.kind, ServiceKind::TerminatingGateway);
        assert!(config.is_upstream());
        assert_eq!(config.envoy_id(), Some("db"));
        assert!(!config.envoy_extension.required);
        assert!(config.envoy_extension.arguments.contains_key("Script"));

        let round_trip: RuntimeConfig =
            serde_json::from_value(serde_json::to_value(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn service_kind_wire_names() {
        assert_eq!(serde_json::to_value(ServiceKind::ConnectProxy).unwrap(), json!("connect-proxy"));
        assert_eq!(serde_json::to_value(ServiceKind::Typical).unwrap(), json!(""));
        assert_eq!(
            serde_json::from_value::<ServiceKind>(json!("mesh-gateway")).unwrap(),
            ServiceKind::MeshGateway
        );
        assert!(ServiceKind::TerminatingGateway.is_extensible());
        assert!(!ServiceKind::IngressGateway.is_extensible());
    }

    #[test]
    fn service_kind_display_matches_wire_name() {
        for kind in [
            ServiceKind::Typical,
            ServiceKind::ConnectProxy,
            ServiceKind::MeshGateway,
            ServiceKind::TerminatingGateway,
            ServiceKind::IngressGateway,
            ServiceKind::ApiGateway,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.to_string()));
        }
    }
}
