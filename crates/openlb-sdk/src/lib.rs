//! # OpenLB SDK
//!
//! Thin SDK for the **OpenLB** load balancer service and the Keystone
//! identity services in front of it.
//!
//! The SDK provides:
//!
//! * [`HttpTransport`] — JSON-over-HTTP transport with error
//!   classification baked in.
//! * [`AuthPlugin`] — Keystone v2 / v3 authentication with a uniform
//!   token-and-endpoint surface.
//! * [`SessionManager`] — the full flow: preflight, credential cache,
//!   password prompt, identity round trip.
//! * [`LbClient`] — resource calls against an established [`Session`].
//! * [`Error`] — unified error type for all SDK operations.
//!
//! Wire types from [`openlb_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use openlb_sdk::{
//!     AuthOptions, AuthSystem, CredentialCache, HttpTransport, LbClient, NoPrompt,
//!     ServiceSelection, SessionManager, TransportConfig,
//! };
//!
//! # async fn run() -> Result<(), openlb_sdk::Error> {
//! let transport = HttpTransport::new(&TransportConfig::default())?;
//!
//! let mut options = AuthOptions::new();
//! options
//!     .set("auth_url", "http://identity.example.com/v2.0")
//!     .set("username", "alice")
//!     .set("password", "hunter2")
//!     .set("tenant_name", "acme");
//!
//! let mut manager = SessionManager::new(
//!     transport.clone(),
//!     AuthSystem::KeystoneV2,
//!     options,
//!     ServiceSelection::default(),
//!     CredentialCache::disabled(),
//!     Box::new(NoPrompt),
//! );
//! let session = manager.authenticate().await?;
//!
//! let client = LbClient::new(transport, &session);
//! for lb in client.list(false).await? {
//!     println!("{} {}", lb.id, lb.name.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod identity;
pub mod options;
pub mod session;
pub mod transport;

pub use api::LbClient;
pub use cache::{
    CachedCredential, CredentialCache, FileSecretStore, MemorySecretStore, NullSecretStore,
    SecretStore,
};
pub use error::{ApiError, Classifier, Error, ErrorKind};
pub use identity::{AuthPlugin, KeystoneV2, KeystoneV3};
pub use options::{
    AuthOptions, AuthSystem, ServiceSelection, DEFAULT_ENDPOINT_TYPE, DEFAULT_SERVICE_NAME,
    DEFAULT_SERVICE_TYPE,
};
pub use session::{NoPrompt, PasswordPrompt, Session, SessionManager};
pub use transport::{concat_url, HttpResponse, HttpTransport, TransportConfig};

// Re-export wire types from openlb-models for ergonomic usage.
pub use openlb_models::{
    Algorithm, CreateLoadBalancer, EndpointInterface, HealthMonitor, LimitBucket, LoadBalancer,
    LogArchive, MonitorType, MonitorUpdate, Node, NodeCondition, NodeSpec, Protocol,
    UpdateLoadBalancer, UpdateNode, VipRef, VirtualIp,
};
