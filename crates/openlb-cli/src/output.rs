//! Table rendering for command output.
//!
//! Listings print one resource per row, detail views print
//! `Property`/`Value` pairs, and fields the service did not report show
//! as `None`. Empty listings print nothing at all.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use openlb_models::{
    Algorithm, HealthMonitor, LimitBucket, LoadBalancer, Node, Protocol, VirtualIp,
};
use serde_json::Value;
use tabled::settings::Style;
use tabled::{Table, Tabled};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct BalancerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Node Count")]
    node_count: String,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct VipRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    vip_type: String,
    #[tabled(rename = "IP Version")]
    ip_version: String,
    #[tabled(rename = "Address")]
    address: String,
}

#[derive(Tabled)]
struct ProtocolRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Port")]
    port: String,
}

#[derive(Tabled)]
struct AlgorithmRow {
    #[tabled(rename = "Algorithm Name")]
    name: String,
}

// The limit listing keeps the service's lowercase headers.
#[derive(Tabled)]
struct LimitRow {
    name: String,
    info: String,
}

#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Value")]
    value: String,
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn opt<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "None".to_string(), ToString::to_string)
}

fn timestamp(value: Option<&DateTime<Utc>>) -> String {
    value.map_or_else(
        || "None".to_string(),
        |at| at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    )
}

/// JSON scalars without quoting, so string limits print as plain text.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn property(name: &str, value: String) -> PropertyRow {
    PropertyRow {
        property: name.to_string(),
        value,
    }
}

fn render<R: Tabled>(rows: Vec<R>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::ascii());
    table.to_string()
}

fn balancer_row(balancer: &LoadBalancer) -> BalancerRow {
    BalancerRow {
        id: balancer.id.clone(),
        name: opt(balancer.name.as_ref()),
        protocol: opt(balancer.protocol.as_ref()),
        port: opt(balancer.port.as_ref()),
        status: opt(balancer.status.as_ref()),
        algorithm: opt(balancer.algorithm.as_ref()),
        created: timestamp(balancer.created.as_ref()),
        updated: timestamp(balancer.updated.as_ref()),
        node_count: opt(balancer.node_count.as_ref()),
    }
}

fn node_row(node: &Node) -> NodeRow {
    NodeRow {
        id: node.id.clone(),
        address: opt(node.address.as_ref()),
        port: opt(node.port.as_ref()),
        condition: opt(node.condition.as_ref()),
        status: opt(node.status.as_ref()),
    }
}

fn node_listing(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| {
            format!(
                "{}:{} {}",
                opt(node.address.as_ref()),
                opt(node.port.as_ref()),
                opt(node.condition.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn vip_listing(vips: &[VirtualIp]) -> String {
    vips.iter()
        .map(|vip| opt(vip.address.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn monitor_rows(monitor: &HealthMonitor) -> Vec<PropertyRow> {
    // Raw field names, as the service reports them.
    let mut rows = vec![
        property("type", opt(monitor.monitor_type.as_ref())),
        property("delay", opt(monitor.delay.as_ref())),
        property("timeout", opt(monitor.timeout.as_ref())),
        property(
            "attemptsBeforeDeactivation",
            opt(monitor.attempts_before_deactivation.as_ref()),
        ),
    ];
    if let Some(path) = &monitor.path {
        rows.push(property("path", path.clone()));
    }
    rows
}

fn limit_row(name: &str, bucket: &LimitBucket) -> LimitRow {
    let info = bucket
        .values
        .iter()
        .map(|(key, value)| format!("{key}: {}", scalar(value)))
        .collect::<Vec<_>>()
        .join("\n");
    LimitRow {
        name: name.to_string(),
        info,
    }
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

pub fn print_balancers(list: &[LoadBalancer]) {
    if list.is_empty() {
        return;
    }
    println!("{}", render(list.iter().map(balancer_row).collect()));
}

pub fn print_balancer_detail(balancer: &LoadBalancer) {
    let rows = vec![
        property("ID", balancer.id.clone()),
        property("Name", opt(balancer.name.as_ref())),
        property("Protocol", opt(balancer.protocol.as_ref())),
        property("Port", opt(balancer.port.as_ref())),
        property("Status", opt(balancer.status.as_ref())),
        property("Algorithm", opt(balancer.algorithm.as_ref())),
        property("Created", timestamp(balancer.created.as_ref())),
        property("Updated", timestamp(balancer.updated.as_ref())),
        property("Node Count", opt(balancer.node_count.as_ref())),
        property("Node listing", node_listing(&balancer.nodes)),
        property("Virtual IPs", vip_listing(&balancer.virtual_ips)),
    ];
    println!("{}", render(rows));
}

pub fn print_nodes(nodes: &[Node]) {
    if nodes.is_empty() {
        return;
    }
    println!("{}", render(nodes.iter().map(node_row).collect()));
}

pub fn print_node_detail(node: &Node) {
    let rows = vec![
        property("ID", node.id.clone()),
        property("Address", opt(node.address.as_ref())),
        property("Port", opt(node.port.as_ref())),
        property("Condition", opt(node.condition.as_ref())),
        property("Status", opt(node.status.as_ref())),
    ];
    println!("{}", render(rows));
}

pub fn print_virtual_ips(vips: &[VirtualIp]) {
    if vips.is_empty() {
        return;
    }
    let rows = vips
        .iter()
        .map(|vip| VipRow {
            id: vip.id.clone(),
            vip_type: opt(vip.vip_type.as_ref()),
            ip_version: opt(vip.ip_version.as_ref()),
            address: opt(vip.address.as_ref()),
        })
        .collect();
    println!("{}", render(rows));
}

pub fn print_monitor(monitor: &HealthMonitor) {
    println!("{}", render(monitor_rows(monitor)));
}

pub fn print_protocols(protocols: &[Protocol]) {
    if protocols.is_empty() {
        return;
    }
    let rows = protocols
        .iter()
        .map(|protocol| ProtocolRow {
            name: protocol.name.clone(),
            port: opt(protocol.port.as_ref()),
        })
        .collect();
    println!("{}", render(rows));
}

pub fn print_algorithms(algorithms: &[Algorithm]) {
    if algorithms.is_empty() {
        return;
    }
    let rows = algorithms
        .iter()
        .map(|algorithm| AlgorithmRow {
            name: algorithm.name.clone(),
        })
        .collect();
    println!("{}", render(rows));
}

// TODO: render limit values as typed columns instead of a flattened blob.
pub fn print_limits(limits: &BTreeMap<String, LimitBucket>) {
    if limits.is_empty() {
        return;
    }
    let rows = limits
        .iter()
        .map(|(name, bucket)| limit_row(name, bucket))
        .collect();
    println!("{}", render(rows));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_balancer() -> LoadBalancer {
        LoadBalancer {
            id: "85".to_string(),
            name: Some("lb-site1".to_string()),
            protocol: Some("HTTP".to_string()),
            port: Some(80),
            algorithm: None,
            status: Some("ACTIVE".to_string()),
            status_description: None,
            created: Some(Utc.with_ymd_and_hms(2010, 11, 30, 3, 23, 42).unwrap()),
            updated: None,
            node_count: Some(2),
            virtual_ips: vec![],
            nodes: vec![],
            session_persistence: None,
            connection_throttle: None,
        }
    }

    #[test]
    fn balancer_rows_format_timestamps_and_placeholders() {
        let row = balancer_row(&sample_balancer());
        assert_eq!(row.id, "85");
        assert_eq!(row.created, "2010-11-30T03:23:42Z");
        assert_eq!(row.updated, "None");
        assert_eq!(row.algorithm, "None");
        assert_eq!(row.node_count, "2");
    }

    #[test]
    fn node_listing_joins_address_port_and_condition() {
        let nodes: Vec<Node> = serde_json::from_value(json!([
            { "id": 1, "address": "10.0.0.1", "port": 80, "condition": "ENABLED" },
            { "id": 2, "address": "10.0.0.2", "port": 81, "condition": "DISABLED" }
        ]))
        .unwrap();
        assert_eq!(
            node_listing(&nodes),
            "10.0.0.1:80 ENABLED\n10.0.0.2:81 DISABLED"
        );
    }

    #[test]
    fn monitor_rows_include_the_path_only_when_reported() {
        let connect: HealthMonitor =
            serde_json::from_value(json!({ "type": "CONNECT", "delay": 30 })).unwrap();
        let rows = monitor_rows(&connect);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.property != "path"));

        let http: HealthMonitor = serde_json::from_value(json!({
            "type": "HTTP", "delay": 30, "timeout": 30,
            "attemptsBeforeDeactivation": 2, "path": "/healthcheck"
        }))
        .unwrap();
        let rows = monitor_rows(&http);
        assert_eq!(rows.last().map(|row| row.property.as_str()), Some("path"));
        assert_eq!(rows.last().map(|row| row.value.as_str()), Some("/healthcheck"));
    }

    #[test]
    fn limit_rows_flatten_values_without_json_quoting() {
        let bucket: LimitBucket = serde_json::from_value(json!({
            "values": { "maxTotalLoadBalancers": 20, "tier": "standard" }
        }))
        .unwrap();
        let row = limit_row("absolute", &bucket);
        assert_eq!(row.name, "absolute");
        assert_eq!(row.info, "maxTotalLoadBalancers: 20\ntier: standard");
    }
}
