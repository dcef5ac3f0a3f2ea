//! Service catalog lookup.
//!
//! A successful Keystone authentication returns a catalog of services,
//! each exposing one URL per (region, interface) pair. The v2 and v3
//! identity APIs encode this differently on the wire; both are folded
//! into the unified [`ServiceCatalog`] here so endpoint resolution is
//! version-independent.

use std::str::FromStr;

// ---------------------------------------------------------------------------
// EndpointInterface
// ---------------------------------------------------------------------------

/// Which variant of a service URL to select from the catalog.
///
/// The v2 catalog spells these `publicURL` / `internalURL` / `adminURL`,
/// v3 uses bare `public` / `internal` / `admin`. Parsing accepts both:
///
/// ```
/// use openlb_models::EndpointInterface;
///
/// let iface: EndpointInterface = "publicURL".parse().unwrap();
/// assert_eq!(iface, EndpointInterface::Public);
/// assert_eq!(iface.to_string(), "public");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum EndpointInterface {
    /// The publicly reachable URL (the default for client traffic).
    #[strum(to_string = "public", serialize = "publicURL")]
    Public,
    /// The internal-network URL.
    #[strum(to_string = "internal", serialize = "internalURL")]
    Internal,
    /// The administrative URL.
    #[strum(to_string = "admin", serialize = "adminURL")]
    Admin,
}

impl EndpointInterface {
    /// Parse a catalog interface string, returning `None` for unknown
    /// values instead of an error. Catalog entries with interfaces we
    /// do not recognise are skipped, not fatal.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }
}

// ---------------------------------------------------------------------------
// ServiceCatalog
// ---------------------------------------------------------------------------

/// One URL a service is reachable at, qualified by region and interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Interface variant this URL belongs to.
    pub interface: EndpointInterface,
    /// Region the endpoint serves, when the deployment is regionalised.
    pub region: Option<String>,
    /// The endpoint URL itself.
    pub url: String,
}

/// A service listed in the catalog, with all its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Service type identifier, e.g. `hpext:lbaas` or `compute`.
    pub service_type: String,
    /// Deployment-assigned service name, when the catalog carries one.
    pub name: Option<String>,
    /// Every (region, interface) URL the service exposes.
    pub endpoints: Vec<Endpoint>,
}

/// The unified, read-only service catalog.
///
/// Entries keep the order the identity service returned them in; lookup
/// returns the first endpoint satisfying every supplied filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

/// No catalog endpoint satisfied a lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no '{interface}' endpoint for service type '{service_type}' (region: {})", region.as_deref().unwrap_or("any"))]
pub struct EndpointLookupError {
    /// The service type that was requested.
    pub service_type: String,
    /// The interface that was requested.
    pub interface: EndpointInterface,
    /// The region filter, if one was applied.
    pub region: Option<String>,
}

impl ServiceCatalog {
    /// Build a catalog from already-unified entries.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Whether the catalog carries any entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The unified entries, in catalog order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Resolve a service URL.
    ///
    /// Filters, in order: the entry's service type must equal
    /// `service_type`; when `service_name` is given the entry's name must
    /// equal it; the endpoint's interface must equal `interface`; and when
    /// `region` is given the endpoint's region must equal it exactly. With
    /// no region filter the first interface match wins.
    pub fn url_for(
        &self,
        service_type: &str,
        interface: EndpointInterface,
        region: Option<&str>,
        service_name: Option<&str>,
    ) -> Result<&str, EndpointLookupError> {
        for entry in &self.entries {
            if entry.service_type != service_type {
                continue;
            }
            if let Some(name) = service_name {
                if entry.name.as_deref() != Some(name) {
                    continue;
                }
            }
            for endpoint in &entry.endpoints {
                if endpoint.interface != interface {
                    continue;
                }
                if let Some(region) = region {
                    if endpoint.region.as_deref() != Some(region) {
                        continue;
                    }
                }
                return Ok(&endpoint.url);
            }
        }
        Err(EndpointLookupError {
            service_type: service_type.to_string(),
            interface,
            region: region.map(str::to_string),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
