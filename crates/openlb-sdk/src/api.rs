//! Load balancer resource calls.
//!
//! [`LbClient`] binds an established [`Session`] to the service
//! endpoints. Every method is one HTTP round trip carrying the session
//! token; non-success answers arrive pre-classified from the
//! transport.

use std::collections::BTreeMap;

use openlb_models::{
    Algorithm, AlgorithmsResponse, CreateLoadBalancer, CreateNodes, HealthMonitor, LimitBucket,
    LimitsResponse, LoadBalancer, LoadBalancersResponse, LogArchive, MonitorType, MonitorUpdate,
    Node, NodeSpec, NodesResponse, Protocol, ProtocolsResponse, UpdateLoadBalancer, UpdateNode,
    VirtualIp, VirtualIpsResponse,
};

use crate::error::Error;
use crate::session::Session;
use crate::transport::{concat_url, HttpTransport};

/// Client for the load balancer API, bound to one session.
#[derive(Clone)]
pub struct LbClient {
    transport: HttpTransport,
    endpoint: String,
    token: String,
}

impl LbClient {
    /// Bind a transport to a session.
    pub fn new(transport: HttpTransport, session: &Session) -> Self {
        LbClient {
            transport,
            endpoint: session.endpoint.clone(),
            token: session.token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        concat_url(&self.endpoint, path)
    }

    // ----------------------------------------------------------------------
    // Load balancers
    // ----------------------------------------------------------------------

    /// List load balancers; with `deleted`, list recently deleted ones
    /// instead.
    pub async fn list(&self, deleted: bool) -> Result<Vec<LoadBalancer>, Error> {
        let path = if deleted {
            "loadbalancers?status=DELETED"
        } else {
            "loadbalancers"
        };
        let response = self.transport.get(&self.url(path), Some(&self.token)).await?;
        Ok(response.json::<LoadBalancersResponse>()?.load_balancers)
    }

    /// Fetch one load balancer.
    pub async fn get(&self, id: &str) -> Result<LoadBalancer, Error> {
        let url = self.url(&format!("loadbalancers/{id}"));
        let response = self.transport.get(&url, Some(&self.token)).await?;
        response.json()
    }

    /// Create a load balancer. The service answers with the new
    /// resource, typically still in `BUILD` status.
    pub async fn create(&self, create: &CreateLoadBalancer) -> Result<LoadBalancer, Error> {
        let url = self.url("loadbalancers");
        let response = self.transport.post(&url, Some(&self.token), create).await?;
        response.json()
    }

    /// Rename a load balancer or change its algorithm.
    pub async fn update(&self, id: &str, update: &UpdateLoadBalancer) -> Result<(), Error> {
        let url = self.url(&format!("loadbalancers/{id}"));
        self.transport.put(&url, Some(&self.token), update).await?;
        Ok(())
    }

    /// Delete a load balancer.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = self.url(&format!("loadbalancers/{id}"));
        self.transport.delete(&url, Some(&self.token)).await?;
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Nodes
    // ----------------------------------------------------------------------

    /// List the backend nodes of a load balancer.
    pub async fn list_nodes(&self, id: &str) -> Result<Vec<Node>, Error> {
        let url = self.url(&format!("loadbalancers/{id}/nodes"));
        let response = self.transport.get(&url, Some(&self.token)).await?;
        Ok(response.json::<NodesResponse>()?.nodes)
    }

    /// Fetch one node.
    pub async fn get_node(&self, id: &str, node_id: &str) -> Result<Node, Error> {
        let url = self.url(&format!("loadbalancers/{id}/nodes/{node_id}"));
        let response = self.transport.get(&url, Some(&self.token)).await?;
        response.json()
    }

    /// Attach nodes; the answer lists the nodes as created.
    pub async fn create_nodes(&self, id: &str, nodes: Vec<NodeSpec>) -> Result<Vec<Node>, Error> {
        let url = self.url(&format!("loadbalancers/{id}/nodes"));
        let body = CreateNodes { nodes };
        let response = self.transport.post(&url, Some(&self.token), &body).await?;
        Ok(response.json::<NodesResponse>()?.nodes)
    }

    /// Change a node's condition or weight.
    pub async fn update_node(
        &self,
        id: &str,
        node_id: &str,
        update: &UpdateNode,
    ) -> Result<(), Error> {
        let url = self.url(&format!("loadbalancers/{id}/nodes/{node_id}"));
        self.transport.put(&url, Some(&self.token), update).await?;
        Ok(())
    }

    /// Detach a node.
    pub async fn delete_node(&self, id: &str, node_id: &str) -> Result<(), Error> {
        let url = self.url(&format!("loadbalancers/{id}/nodes/{node_id}"));
        self.transport.delete(&url, Some(&self.token)).await?;
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Health monitor
    // ----------------------------------------------------------------------

    /// Fetch the health monitor of a load balancer.
    pub async fn get_monitor(&self, id: &str) -> Result<HealthMonitor, Error> {
        let url = self.url(&format!("loadbalancers/{id}/healthmonitor"));
        let response = self.transport.get(&url, Some(&self.token)).await?;
        response.json()
    }

    /// Reconfigure the health monitor.
    ///
    /// A timeout longer than the probe interval can never pass and is
    /// rejected before the request is sent. A path on a `CONNECT`
    /// monitor means nothing and is dropped.
    pub async fn update_monitor(
        &self,
        id: &str,
        mut update: MonitorUpdate,
    ) -> Result<HealthMonitor, Error> {
        if update.timeout > update.delay {
            return Err(Error::Command(
                "health monitor timeout can't be greater than delay".to_string(),
            ));
        }
        if update.monitor_type == MonitorType::Connect {
            update.path = None;
        }
        let url = self.url(&format!("loadbalancers/{id}/healthmonitor"));
        let response = self.transport.put(&url, Some(&self.token), &update).await?;
        response.json()
    }

    /// Reset the health monitor to the service default.
    pub async fn delete_monitor(&self, id: &str) -> Result<(), Error> {
        let url = self.url(&format!("loadbalancers/{id}/healthmonitor"));
        self.transport.delete(&url, Some(&self.token)).await?;
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Virtual IPs
    // ----------------------------------------------------------------------

    /// List the virtual IPs serving a load balancer.
    pub async fn list_virtual_ips(&self, id: &str) -> Result<Vec<VirtualIp>, Error> {
        let url = self.url(&format!("loadbalancers/{id}/virtualips"));
        let response = self.transport.get(&url, Some(&self.token)).await?;
        Ok(response.json::<VirtualIpsResponse>()?.virtual_ips)
    }

    // ----------------------------------------------------------------------
    // Service metadata
    // ----------------------------------------------------------------------

    /// Account limits, as named buckets of limit values.
    pub async fn limits(&self) -> Result<BTreeMap<String, LimitBucket>, Error> {
        let response = self
            .transport
            .get(&self.url("limits"), Some(&self.token))
            .await?;
        Ok(response.json::<LimitsResponse>()?.limits)
    }

    /// Protocols the service can balance.
    pub async fn protocols(&self) -> Result<Vec<Protocol>, Error> {
        let response = self
            .transport
            .get(&self.url("protocols"), Some(&self.token))
            .await?;
        Ok(response.json::<ProtocolsResponse>()?.protocols)
    }

    /// Balancing algorithms the service supports.
    pub async fn algorithms(&self) -> Result<Vec<Algorithm>, Error> {
        let response = self
            .transport
            .get(&self.url("algorithms"), Some(&self.token))
            .await?;
        Ok(response.json::<AlgorithmsResponse>()?.algorithms)
    }

    // ----------------------------------------------------------------------
    // Logs
    // ----------------------------------------------------------------------

    /// Ask the service to ship a log snapshot to an object store.
    pub async fn send_log_archive(&self, id: &str, archive: &LogArchive) -> Result<(), Error> {
        let url = self.url(&format!("loadbalancers/{id}/logs"));
        self.transport.post(&url, Some(&self.token), archive).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(endpoint: &str) -> LbClient {
        let session = Session {
            token: "sess-tok".to_string(),
            endpoint: endpoint.to_string(),
            tenant_id: Some("ten-1".to_string()),
        };
        LbClient::new(HttpTransport::new(&TransportConfig::default()).unwrap(), &session)
    }

    #[tokio::test]
    async fn list_unwraps_the_envelope_and_carries_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loadbalancers"))
            .and(header("x-auth-token", "sess-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loadBalancers": [
                    {"id": "2000", "name": "lb-a", "status": "ACTIVE", "port": "80"},
                    {"id": 2001, "name": "lb-b", "status": "BUILD", "port": 443}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let balancers = client(&server.uri()).list(false).await.unwrap();
        assert_eq!(balancers.len(), 2);
        assert_eq!(balancers[0].id, "2000");
        assert_eq!(balancers[1].port, Some(443));
    }

    #[tokio::test]
    async fn deleted_listing_filters_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loadbalancers"))
            .and(query_param("status", "DELETED"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"loadBalancers": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let balancers = client(&server.uri()).list(true).await.unwrap();
        assert!(balancers.is_empty());
    }

    #[tokio::test]
    async fn create_posts_the_documented_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/loadbalancers"))
            .and(body_json(json!({
                "name": "web",
                "nodes": [{"address": "10.0.0.1", "port": 80}],
                "port": 443,
                "protocol": "HTTPS"
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "id": "144",
                "name": "web",
                "status": "BUILD"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let create = CreateLoadBalancer {
            name: "web".to_string(),
            nodes: vec!["10.0.0.1:80".parse().unwrap()],
            port: Some(443),
            protocol: Some("HTTPS".to_string()),
            algorithm: None,
            virtual_ips: None,
        };
        let lb = client(&server.uri()).create(&create).await.unwrap();
        assert_eq!(lb.id, "144");
    }

    #[tokio::test]
    async fn node_update_hits_the_nested_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/loadbalancers/2000/nodes/5"))
            .and(body_json(json!({"condition": "DISABLED"})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let update = UpdateNode {
            condition: Some(openlb_models::NodeCondition::Disabled),
            weight: None,
        };
        client(&server.uri())
            .update_node("2000", "5", &update)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn monitor_timeout_longer_than_delay_never_reaches_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let update = MonitorUpdate {
            monitor_type: MonitorType::Connect,
            delay: 30,
            timeout: 60,
            attempts_before_deactivation: 2,
            path: None,
        };
        let err = client(&server.uri())
            .update_monitor("2000", update)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn connect_monitors_drop_the_probe_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/loadbalancers/2000/healthmonitor"))
            .and(body_json(json!({
                "type": "CONNECT",
                "delay": 30,
                "timeout": 30,
                "attemptsBeforeDeactivation": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "CONNECT",
                "delay": "30",
                "timeout": "30",
                "attemptsBeforeDeactivation": "2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = MonitorUpdate {
            monitor_type: MonitorType::Connect,
            delay: 30,
            timeout: 30,
            attempts_before_deactivation: 2,
            path: Some("/healthcheck".to_string()),
        };
        let monitor = client(&server.uri())
            .update_monitor("2000", update)
            .await
            .unwrap();
        assert_eq!(monitor.delay, Some(30));
    }

    #[tokio::test]
    async fn limits_returns_named_buckets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "limits": {
                    "absolute": {
                        "values": {"maxTotalLoadBalancers": 25, "maxNodesPerLoadBalancer": 50}
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let limits = client(&server.uri()).limits().await.unwrap();
        let absolute = limits.get("absolute").unwrap();
        assert_eq!(
            absolute.values.get("maxTotalLoadBalancers"),
            Some(&json!(25))
        );
    }

    #[tokio::test]
    async fn log_shipping_posts_an_empty_body_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/loadbalancers/2000/logs"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client(&server.uri())
            .send_log_archive("2000", &LogArchive::default())
            .await
            .unwrap();
    }
}
