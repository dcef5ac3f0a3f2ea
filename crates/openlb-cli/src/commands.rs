//! Argument definitions and command dispatch.
//!
//! Global flags mirror the classic `OS_*` environment contract, so an
//! environment set up for other OpenStack clients works here unchanged.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use openlb_models::{
    CreateLoadBalancer, EndpointInterface, LogArchive, MonitorType, MonitorUpdate, NodeCondition,
    NodeSpec, UpdateLoadBalancer, UpdateNode, VipRef,
};
use openlb_sdk::transport::DEFAULT_TIMEOUT_SECS;
use openlb_sdk::{
    AuthOptions, AuthSystem, CredentialCache, Error, FileSecretStore, HttpTransport, LbClient,
    ServiceSelection, SessionManager, TransportConfig, DEFAULT_ENDPOINT_TYPE,
    DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_TYPE,
};
use tracing::debug;

use crate::output;
use crate::prompt::TtyPrompt;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Command-line client for OpenStack-style load-balancer services.
#[derive(Debug, Parser)]
#[command(name = "openlb", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Identity service endpoint.
    #[arg(long, env = "OS_AUTH_URL", value_name = "URL")]
    pub os_auth_url: Option<String>,

    /// User name for password authentication.
    #[arg(long, env = "OS_USERNAME", value_name = "NAME")]
    pub os_username: Option<String>,

    /// Password; prompted for when required and not supplied.
    #[arg(long, env = "OS_PASSWORD", value_name = "PASSWORD")]
    pub os_password: Option<String>,

    /// Pre-issued token to authenticate with instead of a password.
    #[arg(long, env = "OS_TOKEN", value_name = "TOKEN")]
    pub os_token: Option<String>,

    /// User id; identity v3 accepts it in place of a user name.
    #[arg(long, env = "OS_USER_ID", value_name = "ID")]
    pub os_user_id: Option<String>,

    /// Tenant id to scope to (identity v2).
    #[arg(long, env = "OS_TENANT_ID", value_name = "ID")]
    pub os_tenant_id: Option<String>,

    /// Tenant name to scope to (identity v2).
    #[arg(long, env = "OS_TENANT_NAME", value_name = "NAME")]
    pub os_tenant_name: Option<String>,

    /// Project id to scope to (identity v3).
    #[arg(long, env = "OS_PROJECT_ID", value_name = "ID")]
    pub os_project_id: Option<String>,

    /// Project name to scope to (identity v3).
    #[arg(long, env = "OS_PROJECT_NAME", value_name = "NAME")]
    pub os_project_name: Option<String>,

    /// Domain id to scope to (identity v3).
    #[arg(long, env = "OS_DOMAIN_ID", value_name = "ID")]
    pub os_domain_id: Option<String>,

    /// Domain name to scope to (identity v3).
    #[arg(long, env = "OS_DOMAIN_NAME", value_name = "NAME")]
    pub os_domain_name: Option<String>,

    /// Domain the user belongs to, by id (identity v3).
    #[arg(long, env = "OS_USER_DOMAIN_ID", value_name = "ID")]
    pub os_user_domain_id: Option<String>,

    /// Domain the user belongs to, by name (identity v3).
    #[arg(long, env = "OS_USER_DOMAIN_NAME", value_name = "NAME")]
    pub os_user_domain_name: Option<String>,

    /// Domain the project belongs to, by id (identity v3).
    #[arg(long, env = "OS_PROJECT_DOMAIN_ID", value_name = "ID")]
    pub os_project_domain_id: Option<String>,

    /// Domain the project belongs to, by name (identity v3).
    #[arg(long, env = "OS_PROJECT_DOMAIN_NAME", value_name = "NAME")]
    pub os_project_domain_name: Option<String>,

    /// Region to select from the service catalog.
    #[arg(long, env = "OS_REGION_NAME", value_name = "REGION")]
    pub os_region_name: Option<String>,

    /// Identity protocol: keystone2 or keystone3.
    #[arg(
        long,
        env = "OS_AUTH_SYSTEM",
        default_value_t = AuthSystem::KeystoneV2,
        value_name = "SYSTEM"
    )]
    pub os_auth_system: AuthSystem,

    /// Cache credentials on disk and reuse them across invocations.
    #[arg(long, env = "OS_CACHE")]
    pub os_cache: bool,

    /// Extra CA bundle to trust for TLS.
    #[arg(long, env = "OS_CACERT", value_name = "PATH")]
    pub os_cacert: Option<PathBuf>,

    /// Skip TLS certificate verification.
    #[arg(long, env = "LB_INSECURE")]
    pub insecure: bool,

    /// Talk to this endpoint directly, skipping the catalog lookup.
    #[arg(long, env = "LB_BYPASS_URL", value_name = "URL")]
    pub bypass_url: Option<String>,

    /// Catalog endpoint interface.
    #[arg(
        long,
        env = "LB_ENDPOINT_TYPE",
        default_value = DEFAULT_ENDPOINT_TYPE,
        value_name = "INTERFACE"
    )]
    pub endpoint_type: EndpointInterface,

    /// Catalog service type.
    #[arg(
        long,
        env = "LB_SERVICE_TYPE",
        default_value = DEFAULT_SERVICE_TYPE,
        value_name = "TYPE"
    )]
    pub service_type: String,

    /// Catalog service name.
    #[arg(
        long,
        env = "LB_SERVICE_NAME",
        default_value = DEFAULT_SERVICE_NAME,
        value_name = "NAME"
    )]
    pub service_name: String,

    /// Seconds to wait for any single API call.
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = positive_seconds
    )]
    pub api_timeout: f64,

    /// Wire-level logging to stderr.
    #[arg(long)]
    pub debug: bool,
}

impl GlobalArgs {
    /// Collapse the flags into the option map the identity plugins read.
    fn auth_options(&self) -> AuthOptions {
        let mut options = AuthOptions::new();
        options
            .set_opt("auth_url", self.os_auth_url.clone())
            .set_opt("username", self.os_username.clone())
            .set_opt("password", self.os_password.clone())
            .set_opt("token", self.os_token.clone())
            .set_opt("user_id", self.os_user_id.clone())
            .set_opt("tenant_id", self.os_tenant_id.clone())
            .set_opt("tenant_name", self.os_tenant_name.clone())
            .set_opt("project_id", self.os_project_id.clone())
            .set_opt("project_name", self.os_project_name.clone())
            .set_opt("domain_id", self.os_domain_id.clone())
            .set_opt("domain_name", self.os_domain_name.clone())
            .set_opt("user_domain_id", self.os_user_domain_id.clone())
            .set_opt("user_domain_name", self.os_user_domain_name.clone())
            .set_opt("project_domain_id", self.os_project_domain_id.clone())
            .set_opt("project_domain_name", self.os_project_domain_name.clone())
            .set_opt("bypass_url", self.bypass_url.clone());
        options
    }

    fn selection(&self) -> ServiceSelection {
        ServiceSelection {
            region: self.os_region_name.clone(),
            interface: self.endpoint_type,
            service_type: self.service_type.clone(),
            service_name: self.service_name.clone(),
        }
    }

    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs_f64(self.api_timeout),
            insecure: self.insecure,
            cacert: self.os_cacert.clone(),
        }
    }
}

fn positive_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err("must be a positive number of seconds".to_string())
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Every operation the service exposes.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List load balancers.
    List {
        /// Display deleted load balancers instead of live ones.
        #[arg(long)]
        deleted: bool,
    },

    /// Create a load balancer.
    Create {
        /// Name of the new load balancer.
        #[arg(long)]
        name: String,

        /// Front-end port; the service defaults to 80.
        #[arg(long)]
        port: Option<u16>,

        /// Front-end protocol; the service defaults to HTTP.
        #[arg(long, value_name = "PROTOCOL")]
        protocol: Option<String>,

        /// Balancing algorithm; the service defaults to ROUND_ROBIN.
        #[arg(long, value_name = "ALGORITHM")]
        algorithm: Option<String>,

        /// Backend node as ip:port[:weight=N][:backup=BOOL]; repeatable.
        #[arg(long = "node", required = true, value_name = "NODE")]
        nodes: Vec<NodeSpec>,

        /// Attach to this existing virtual IP instead of allocating one.
        #[arg(long, value_name = "VIP_ID")]
        vip: Option<String>,
    },

    /// Show one load balancer.
    Show {
        /// Load balancer id.
        id: String,
    },

    /// Change a load balancer's name or algorithm.
    Update {
        /// Load balancer id.
        id: String,

        /// New name.
        #[arg(long)]
        name: Option<String>,

        /// New balancing algorithm.
        #[arg(long, value_name = "ALGORITHM")]
        algorithm: Option<String>,
    },

    /// Delete a load balancer.
    Delete {
        /// Load balancer id.
        id: String,
    },

    /// Attach nodes to a load balancer.
    NodeCreate {
        /// Load balancer id.
        id: String,

        /// Node as ip:port[:weight=N][:backup=BOOL]; repeatable.
        #[arg(long = "node", required = true, value_name = "NODE")]
        nodes: Vec<NodeSpec>,
    },

    /// List the nodes of a load balancer.
    NodeList {
        /// Load balancer id.
        id: String,
    },

    /// Show one node.
    NodeShow {
        /// Load balancer id.
        id: String,
        /// Node id.
        node_id: String,
    },

    /// Change a node's condition or weight.
    NodeUpdate {
        /// Load balancer id.
        id: String,
        /// Node id.
        node_id: String,

        /// New condition, ENABLED or DISABLED.
        #[arg(long, value_name = "CONDITION")]
        condition: Option<NodeCondition>,

        /// Weight relative to the other nodes.
        #[arg(long, value_name = "COUNT")]
        weight: Option<u32>,
    },

    /// Detach a node from a load balancer.
    NodeDelete {
        /// Load balancer id.
        id: String,
        /// Node id.
        node_id: String,
    },

    /// Show a load balancer's health monitor.
    MonitorShow {
        /// Load balancer id.
        id: String,
    },

    /// Reconfigure a load balancer's health monitor.
    MonitorUpdate {
        /// Load balancer id.
        id: String,

        /// Probe type, CONNECT or HTTP.
        #[arg(long = "type", default_value_t = MonitorType::Connect, value_name = "TYPE")]
        monitor_type: MonitorType,

        /// Seconds between probes.
        #[arg(long, default_value_t = 30, value_name = "SECONDS")]
        delay: u64,

        /// Seconds before a probe counts as failed.
        #[arg(long, default_value_t = 30, value_name = "SECONDS")]
        timeout: u64,

        /// Failed probes tolerated before a node is marked down.
        #[arg(long, default_value_t = 2, value_name = "COUNT")]
        attempts: u64,

        /// Probe path, for HTTP monitors.
        #[arg(long, value_name = "PATH")]
        path: Option<String>,
    },

    /// Remove a load balancer's health monitor.
    MonitorDelete {
        /// Load balancer id.
        id: String,
    },

    /// Show the virtual IPs of a load balancer.
    Virtualips {
        /// Load balancer id.
        id: String,
    },

    /// List the balancing algorithms the service supports.
    AlgorithmList,

    /// List account limits.
    LimitList,

    /// List the protocols the service can balance.
    ProtocolList,

    /// Ship a snapshot of a load balancer's logs to an object store.
    Logs {
        /// Load balancer id.
        id: String,

        /// Object store type, e.g. Swift.
        #[arg(long, value_name = "TYPE")]
        storage: Option<String>,

        /// Object store endpoint to use.
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,

        /// Base directory inside the store.
        #[arg(long, value_name = "PATH")]
        basepath: Option<String>,

        /// Token for writing to the store.
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Authenticate, run the subcommand and print its output.
pub async fn run(cli: Cli) -> Result<(), Error> {
    let Cli { global, command } = cli;

    let transport = HttpTransport::new(&global.transport_config())?;
    let cache = if global.os_cache {
        CredentialCache::new(Box::new(FileSecretStore::default_location()?), true)
    } else {
        CredentialCache::disabled()
    };
    let mut manager = SessionManager::new(
        transport.clone(),
        global.os_auth_system,
        global.auth_options(),
        global.selection(),
        cache,
        Box::new(TtyPrompt),
    );
    let session = manager.authenticate().await?;
    debug!(endpoint = %session.endpoint, "session established");
    let client = LbClient::new(transport, &session);

    match command {
        Command::List { deleted } => output::print_balancers(&client.list(deleted).await?),
        Command::Create {
            name,
            port,
            protocol,
            algorithm,
            nodes,
            vip,
        } => {
            let create = CreateLoadBalancer {
                name,
                nodes,
                port,
                protocol,
                algorithm,
                virtual_ips: vip.map(|id| vec![VipRef { id }]),
            };
            output::print_balancer_detail(&client.create(&create).await?);
        }
        Command::Show { id } => output::print_balancer_detail(&client.get(&id).await?),
        Command::Update {
            id,
            name,
            algorithm,
        } => {
            let update = UpdateLoadBalancer { name, algorithm };
            client.update(&id, &update).await?;
        }
        Command::Delete { id } => client.delete(&id).await?,
        Command::NodeCreate { id, nodes } => {
            output::print_nodes(&client.create_nodes(&id, nodes).await?);
        }
        Command::NodeList { id } => output::print_nodes(&client.list_nodes(&id).await?),
        Command::NodeShow { id, node_id } => {
            output::print_node_detail(&client.get_node(&id, &node_id).await?);
        }
        Command::NodeUpdate {
            id,
            node_id,
            condition,
            weight,
        } => {
            let update = UpdateNode { condition, weight };
            client.update_node(&id, &node_id, &update).await?;
        }
        Command::NodeDelete { id, node_id } => client.delete_node(&id, &node_id).await?,
        Command::MonitorShow { id } => output::print_monitor(&client.get_monitor(&id).await?),
        Command::MonitorUpdate {
            id,
            monitor_type,
            delay,
            timeout,
            attempts,
            path,
        } => {
            let update = MonitorUpdate {
                monitor_type,
                delay,
                timeout,
                attempts_before_deactivation: attempts,
                path,
            };
            output::print_monitor(&client.update_monitor(&id, update).await?);
        }
        Command::MonitorDelete { id } => client.delete_monitor(&id).await?,
        Command::Virtualips { id } => {
            output::print_virtual_ips(&client.list_virtual_ips(&id).await?);
        }
        Command::AlgorithmList => output::print_algorithms(&client.algorithms().await?),
        Command::LimitList => output::print_limits(&client.limits().await?),
        Command::ProtocolList => output::print_protocols(&client.protocols().await?),
        Command::Logs {
            id,
            storage,
            endpoint,
            basepath,
            token,
        } => {
            let archive = LogArchive {
                object_store_type: storage,
                object_store_endpoint: endpoint,
                object_store_base_path: basepath,
                auth_token: token,
            };
            client.send_log_archive(&id, &archive).await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("arguments should parse")
    }

    #[test]
    fn create_accepts_repeated_nodes() {
        let cli = parse(&[
            "openlb",
            "--os-auth-url",
            "http://keystone.example.com/v2.0",
            "create",
            "--name",
            "web",
            "--port",
            "443",
            "--node",
            "10.0.0.1:80",
            "--node",
            "10.0.0.2:80:weight=2",
        ]);
        match cli.command {
            Command::Create { nodes, port, .. } => {
                assert_eq!(nodes.len(), 2);
                assert_eq!(nodes[1].weight, Some(2));
                assert_eq!(port, Some(443));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn create_without_nodes_is_rejected() {
        assert!(Cli::try_parse_from(["openlb", "create", "--name", "web"]).is_err());
    }

    #[test]
    fn global_flags_flow_into_the_option_map() {
        let cli = parse(&[
            "openlb",
            "--os-auth-url",
            "http://keystone.example.com/v3",
            "--os-username",
            "alice",
            "--os-tenant-name",
            "ops",
            "--bypass-url",
            "http://lb.example.com/v1.1/t1",
            "list",
        ]);
        let options = cli.global.auth_options();
        assert_eq!(options.get("auth_url"), Some("http://keystone.example.com/v3"));
        assert_eq!(options.get("username"), Some("alice"));
        assert_eq!(options.tenant(), Some("ops"));
        assert_eq!(options.get("bypass_url"), Some("http://lb.example.com/v1.1/t1"));
    }

    #[test]
    fn monitor_update_defaults_match_the_service() {
        let cli = parse(&["openlb", "monitor-update", "77"]);
        match cli.command {
            Command::MonitorUpdate {
                monitor_type,
                delay,
                timeout,
                attempts,
                path,
                ..
            } => {
                assert_eq!(monitor_type, MonitorType::Connect);
                assert_eq!((delay, timeout, attempts), (30, 30, 2));
                assert_eq!(path, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn timeouts_must_be_positive() {
        assert!(Cli::try_parse_from(["openlb", "--api-timeout", "0", "list"]).is_err());
        assert!(Cli::try_parse_from(["openlb", "--api-timeout", "-3", "list"]).is_err());
    }

    #[test]
    fn endpoint_flags_shape_the_catalog_selection() {
        let cli = parse(&[
            "openlb",
            "--os-region-name",
            "region-b",
            "--endpoint-type",
            "internalURL",
            "list",
        ]);
        let selection = cli.global.selection();
        assert_eq!(selection.region.as_deref(), Some("region-b"));
        assert_eq!(selection.interface, EndpointInterface::Internal);
        assert_eq!(selection.service_type, DEFAULT_SERVICE_TYPE);
        assert_eq!(selection.service_name, DEFAULT_SERVICE_NAME);
    }
}
