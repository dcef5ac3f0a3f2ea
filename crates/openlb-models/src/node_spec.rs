//! Backend node definitions as given on the command line.
//!
//! A node argument has the form `ip:port` with optional trailing
//! `key=value` options, e.g. `10.0.0.4:80:weight=2:backup=TRUE`.

use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// NodeSpec
// ---------------------------------------------------------------------------

/// One backend node to attach to a load balancer.
///
/// Serialises to the shape the API expects in create bodies; the
/// `backup` flag goes over the wire as the string `"TRUE"` or
/// `"FALSE"`, not as a JSON boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSpec {
    /// IPv4 address of the backend.
    pub address: Ipv4Addr,
    /// TCP port the backend listens on.
    pub port: u16,
    /// Relative weight for weighted balancing algorithms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    /// Whether the node only receives traffic when primaries are down.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "backup_flag")]
    pub backup: Option<bool>,
}

fn backup_flag<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(true) => serializer.serialize_str("TRUE"),
        Some(false) => serializer.serialize_str("FALSE"),
        None => serializer.serialize_none(),
    }
}

/// Why a node argument failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeSpecError {
    /// No `:port` component was present.
    #[error("expected ip:port, got '{0}'")]
    MissingPort(String),
    /// The address component is not a valid IPv4 address.
    #[error("invalid IPv4 address '{0}'")]
    BadAddress(String),
    /// The port component is not a number in 0..=65535.
    #[error("port out of range: '{0}'")]
    BadPort(String),
    /// A trailing option is not of the form `key=value`.
    #[error("expected key=value, got '{0}'")]
    BadOption(String),
    /// The weight value is not a non-negative integer.
    #[error("invalid weight '{0}'")]
    BadWeight(String),
    /// The backup value is neither `TRUE` nor `FALSE`.
    #[error("invalid backup flag '{0}' (use TRUE or FALSE)")]
    BadBackup(String),
    /// An option key other than `weight` or `backup` was given.
    #[error("unknown node option '{0}'")]
    UnknownOption(String),
}

impl FromStr for NodeSpec {
    type Err = NodeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let address = parts.next().unwrap_or_default();
        let port = parts
            .next()
            .ok_or_else(|| NodeSpecError::MissingPort(s.to_string()))?;

        let address: Ipv4Addr = address
            .parse()
            .map_err(|_| NodeSpecError::BadAddress(address.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| NodeSpecError::BadPort(port.to_string()))?;

        let mut spec = NodeSpec {
            address,
            port,
            weight: None,
            backup: None,
        };
        for option in parts {
            let (key, value) = option
                .split_once('=')
                .ok_or_else(|| NodeSpecError::BadOption(option.to_string()))?;
            match key.to_ascii_lowercase().as_str() {
                "weight" => {
                    spec.weight = Some(
                        value
                            .parse()
                            .map_err(|_| NodeSpecError::BadWeight(value.to_string()))?,
                    );
                }
                "backup" => {
                    spec.backup = Some(match value.to_ascii_uppercase().as_str() {
                        "TRUE" => true,
                        "FALSE" => false,
                        _ => return Err(NodeSpecError::BadBackup(value.to_string())),
                    });
                }
                other => return Err(NodeSpecError::UnknownOption(other.to_string())),
            }
        }
        Ok(spec)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_address_and_port() {
        let spec: NodeSpec = "10.1.1.1:80".parse().unwrap();
        assert_eq!(spec.address, Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(spec.port, 80);
        assert_eq!(spec.weight, None);
        assert_eq!(spec.backup, None);
    }

    #[test]
    fn parses_weight_and_backup_options() {
        let spec: NodeSpec = "10.1.1.2:81:weight=2".parse().unwrap();
        assert_eq!(spec.weight, Some(2));

        let spec: NodeSpec = "10.1.1.3:82:backup=true".parse().unwrap();
        assert_eq!(spec.backup, Some(true));

        let spec: NodeSpec = "10.1.1.4:8080:WEIGHT=5:backup=FALSE".parse().unwrap();
        assert_eq!(spec.weight, Some(5));
        assert_eq!(spec.backup, Some(false));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            "10.1.1.1".parse::<NodeSpec>(),
            Err(NodeSpecError::MissingPort("10.1.1.1".to_string()))
        );
        assert_eq!(
            "300.1.1.1:80".parse::<NodeSpec>(),
            Err(NodeSpecError::BadAddress("300.1.1.1".to_string()))
        );
        assert_eq!(
            "10.1.1.1:99999".parse::<NodeSpec>(),
            Err(NodeSpecError::BadPort("99999".to_string()))
        );
        assert_eq!(
            "10.1.1.1:80:weight".parse::<NodeSpec>(),
            Err(NodeSpecError::BadOption("weight".to_string()))
        );
        assert_eq!(
            "10.1.1.1:80:weight=heavy".parse::<NodeSpec>(),
            Err(NodeSpecError::BadWeight("heavy".to_string()))
        );
        assert_eq!(
            "10.1.1.1:80:backup=maybe".parse::<NodeSpec>(),
            Err(NodeSpecError::BadBackup("maybe".to_string()))
        );
        assert_eq!(
            "10.1.1.1:80:color=red".parse::<NodeSpec>(),
            Err(NodeSpecError::UnknownOption("color".to_string()))
        );
    }

    #[test]
    fn serialises_to_api_shape() {
        let plain: NodeSpec = "10.1.1.1:80".parse().unwrap();
        assert_eq!(
            serde_json::to_value(&plain).unwrap(),
            json!({ "address": "10.1.1.1", "port": 80 })
        );

        let full: NodeSpec = "10.1.1.2:81:weight=2:backup=true".parse().unwrap();
        assert_eq!(
            serde_json::to_value(&full).unwrap(),
            json!({
                "address": "10.1.1.2",
                "port": 81,
                "weight": 2,
                "backup": "TRUE"
            })
        );
    }
}
