//! Load-balancer resource schema.
//!
//! The service predates strict JSON typing: ids, ports and monitor
//! intervals arrive as strings or numbers depending on deployment
//! vintage. The deserializers here accept both and normalise, so the
//! rest of the client only ever sees typed values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::node_spec::NodeSpec;

// ---------------------------------------------------------------------------
// Lenient scalars
// ---------------------------------------------------------------------------

/// Accepts a JSON string or number and yields the string form.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Num(serde_json::Number),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// Accepts a JSON number or a numeric string.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<u64>,
    <T as FromStr>::Err: fmt::Display,
    <T as TryFrom<u64>>::Error: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => T::try_from(n).map(Some).map_err(serde::de::Error::custom),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Enumerated fields
// ---------------------------------------------------------------------------

/// Whether a node takes traffic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeCondition {
    /// The node receives traffic.
    Enabled,
    /// The node is administratively drained.
    Disabled,
}

/// How the health monitor probes backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorType {
    /// Plain TCP connect probe.
    Connect,
    /// HTTP GET probe against a configured path.
    Http,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A provisioned load balancer.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancer {
    /// Server-assigned id.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Front-end protocol, e.g. `HTTP`.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Front-end port.
    #[serde(default, deserialize_with = "lenient_number")]
    pub port: Option<u16>,
    /// Balancing algorithm, e.g. `ROUND_ROBIN`.
    #[serde(default)]
    pub algorithm: Option<String>,
    /// Provisioning status, e.g. `BUILD` then `ACTIVE`.
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable detail for error statuses.
    #[serde(rename = "statusDescription", default)]
    pub status_description: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    /// Number of attached nodes, as reported in list responses.
    #[serde(rename = "nodeCount", default, deserialize_with = "lenient_number")]
    pub node_count: Option<u64>,
    /// Virtual IPs serving this balancer.
    #[serde(rename = "virtualIps", default)]
    pub virtual_ips: Vec<VirtualIp>,
    /// Attached backend nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Session persistence configuration, shape varies by deployment.
    #[serde(rename = "sessionPersistence", default)]
    pub session_persistence: Option<Value>,
    /// Connection throttle configuration, shape varies by deployment.
    #[serde(rename = "connectionThrottle", default)]
    pub connection_throttle: Option<Value>,
}

/// A backend node attached to a load balancer.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    /// Server-assigned id.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Backend IP address.
    #[serde(default)]
    pub address: Option<String>,
    /// Backend port.
    #[serde(default, deserialize_with = "lenient_number")]
    pub port: Option<u16>,
    /// Administrative condition, e.g. `ENABLED`.
    #[serde(default)]
    pub condition: Option<String>,
    /// Operational status, e.g. `ONLINE`.
    #[serde(default)]
    pub status: Option<String>,
    /// Balancing weight.
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<u32>,
}

/// A virtual IP fronting one or more load balancers.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualIp {
    /// Server-assigned id.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// The IP address itself, v4 or v6.
    #[serde(default)]
    pub address: Option<String>,
    /// Exposure, e.g. `PUBLIC`.
    #[serde(rename = "type", default)]
    pub vip_type: Option<String>,
    /// `IPV4` or `IPV6`.
    #[serde(rename = "ipVersion", default)]
    pub ip_version: Option<String>,
}

/// Health monitor configuration for a load balancer.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthMonitor {
    /// Probe type.
    #[serde(rename = "type", default)]
    pub monitor_type: Option<String>,
    /// Seconds between probes.
    #[serde(default, deserialize_with = "lenient_number")]
    pub delay: Option<u64>,
    /// Seconds before a probe is considered failed.
    #[serde(default, deserialize_with = "lenient_number")]
    pub timeout: Option<u64>,
    /// Failed probes tolerated before a node is deactivated.
    #[serde(
        rename = "attemptsBeforeDeactivation",
        default,
        deserialize_with = "lenient_number"
    )]
    pub attempts_before_deactivation: Option<u64>,
    /// Probe path, for HTTP monitors.
    #[serde(default)]
    pub path: Option<String>,
}

/// A protocol the service can balance.
#[derive(Debug, Clone, Deserialize)]
pub struct Protocol {
    /// Protocol name, e.g. `HTTP`.
    pub name: String,
    /// Default front-end port for the protocol.
    #[serde(default, deserialize_with = "lenient_number")]
    pub port: Option<u16>,
}

/// A balancing algorithm the service supports.
#[derive(Debug, Clone, Deserialize)]
pub struct Algorithm {
    /// Algorithm name, e.g. `ROUND_ROBIN`.
    pub name: String,
}

/// One named group of account limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitBucket {
    /// Limit name to value, e.g. `maxTotalLoadBalancers`.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// `GET /loadbalancers` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancersResponse {
    /// The balancers visible to the tenant.
    #[serde(rename = "loadBalancers", default)]
    pub load_balancers: Vec<LoadBalancer>,
}

/// `GET /loadbalancers/{id}/nodes` response, also returned by node create.
#[derive(Debug, Clone, Deserialize)]
pub struct NodesResponse {
    /// The nodes attached to the balancer.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// `GET /loadbalancers/{id}/virtualips` response.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualIpsResponse {
    /// The virtual IPs serving the balancer.
    #[serde(rename = "virtualIps", default)]
    pub virtual_ips: Vec<VirtualIp>,
}

/// `GET /protocols` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolsResponse {
    /// The protocols the service can balance.
    #[serde(default)]
    pub protocols: Vec<Protocol>,
}

/// `GET /algorithms` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AlgorithmsResponse {
    /// The algorithms the service supports.
    #[serde(default)]
    pub algorithms: Vec<Algorithm>,
}

/// `GET /limits` response: named buckets of account limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsResponse {
    /// Bucket name (e.g. `absolute`) to its limits.
    #[serde(default)]
    pub limits: BTreeMap<String, LimitBucket>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// `POST /loadbalancers` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLoadBalancer {
    /// Display name.
    pub name: String,
    /// Backend nodes to attach.
    pub nodes: Vec<NodeSpec>,
    /// Front-end port; server default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Front-end protocol; server default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Balancing algorithm; server default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Attach to an existing virtual IP instead of allocating one.
    #[serde(rename = "virtualIps", skip_serializing_if = "Option::is_none")]
    pub virtual_ips: Option<Vec<VipRef>>,
}

/// A virtual IP referenced by id in create bodies.
#[derive(Debug, Clone, Serialize)]
pub struct VipRef {
    /// The virtual IP id.
    pub id: String,
}

/// `PUT /loadbalancers/{id}` body. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateLoadBalancer {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New balancing algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

/// `POST /loadbalancers/{id}/nodes` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateNodes {
    /// Nodes to attach.
    pub nodes: Vec<NodeSpec>,
}

/// `PUT /loadbalancers/{id}/nodes/{node}` body. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateNode {
    /// New administrative condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<NodeCondition>,
    /// New balancing weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// `PUT /loadbalancers/{id}/healthmonitor` body.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorUpdate {
    /// Probe type.
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    /// Seconds between probes.
    pub delay: u64,
    /// Seconds before a probe is considered failed.
    pub timeout: u64,
    /// Failed probes tolerated before a node is deactivated.
    #[serde(rename = "attemptsBeforeDeactivation")]
    pub attempts_before_deactivation: u64,
    /// Probe path; only meaningful for non-CONNECT monitors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `POST /loadbalancers/{id}/logs` body: ship a log snapshot to an
/// object store. Unset fields fall back to service-side defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogArchive {
    /// Object store flavour, e.g. `Swift`.
    #[serde(rename = "objectStoreType", skip_serializing_if = "Option::is_none")]
    pub object_store_type: Option<String>,
    /// Object store endpoint URL.
    #[serde(rename = "objectStoreEndpoint", skip_serializing_if = "Option::is_none")]
    pub object_store_endpoint: Option<String>,
    /// Base path inside the store.
    #[serde(rename = "objectStoreBasePath", skip_serializing_if = "Option::is_none")]
    pub object_store_base_path: Option<String>,
    /// Token the service uses to write to the store.
    #[serde(rename = "authToken", skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
