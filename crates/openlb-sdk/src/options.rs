//! Authentication options and service selection.
//!
//! [`AuthOptions`] carries the raw option values the caller resolved
//! from flags and environment variables. Auth plugins read only the
//! option names they know about; anything else is ignored. Values that
//! are present but empty count as absent, matching how exported-but-
//! blank environment variables behave.

use std::collections::BTreeMap;

use openlb_models::EndpointInterface;
use strum::{Display, EnumString};

/// Endpoint type used when none is requested.
pub const DEFAULT_ENDPOINT_TYPE: &str = "publicURL";
/// Service type looked up in the catalog when none is requested.
pub const DEFAULT_SERVICE_TYPE: &str = "hpext:lbaas";
/// Service name recorded in the cache key when none is requested.
pub const DEFAULT_SERVICE_NAME: &str = "libra";

// ---------------------------------------------------------------------------
// AuthSystem
// ---------------------------------------------------------------------------

/// Which identity protocol to authenticate against.
///
/// Accepts the spellings users actually type: `keystone2`, `2`, `2.0`,
/// `keystone3`, `3`, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AuthSystem {
    /// Keystone identity v2.
    #[default]
    #[strum(to_string = "keystone2", serialize = "2", serialize = "2.0")]
    KeystoneV2,
    /// Keystone identity v3.
    #[strum(to_string = "keystone3", serialize = "3")]
    KeystoneV3,
}

// ---------------------------------------------------------------------------
// AuthOptions
// ---------------------------------------------------------------------------

/// Raw authentication option values, by option name.
///
/// The recognised names are the plugins' concern (`auth_url`,
/// `username`, `password`, `token`, `tenant_id`, ... ); supplying
/// unknown names is harmless.
#[derive(Debug, Clone, Default)]
pub struct AuthOptions(BTreeMap<String, String>);

impl AuthOptions {
    /// An empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Set an option value when one is present.
    pub fn set_opt(&mut self, name: &str, value: Option<String>) -> &mut Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    /// Look up an option; empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The first present option of `names`, in order.
    pub fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    /// The tenant identifier, by precedence: tenant id, tenant name,
    /// project id, project name.
    pub fn tenant(&self) -> Option<&str> {
        self.first_of(&["tenant_id", "tenant_name", "project_id", "project_name"])
    }
}

// ---------------------------------------------------------------------------
// ServiceSelection
// ---------------------------------------------------------------------------

/// Which catalog endpoint the client wants.
#[derive(Debug, Clone)]
pub struct ServiceSelection {
    /// Region filter; `None` accepts any region.
    pub region: Option<String>,
    /// Endpoint interface to select.
    pub interface: EndpointInterface,
    /// Catalog service type.
    pub service_type: String,
    /// Service name; only distinguishes cache entries, never filters
    /// the catalog.
    pub service_name: String,
}

impl Default for ServiceSelection {
    fn default() -> Self {
        ServiceSelection {
            region: None,
            interface: EndpointInterface::Public,
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
