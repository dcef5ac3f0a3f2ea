//! Keystone authentication wire types.
//!
//! Request bodies for `POST {auth_url}/tokens` (identity v2) and
//! `POST {auth_url}/auth/tokens` (identity v3), the matching response
//! envelopes, and [`AccessInfo`] — the version-independent result the
//! rest of the client works with.
//!
//! The v3 protocol returns the token itself in the `X-Subject-Token`
//! response header, not in the body; [`AccessInfo::from_v3`] therefore
//! takes the header value alongside the parsed body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, Endpoint, EndpointInterface, ServiceCatalog};

// ---------------------------------------------------------------------------
// IdOrName
// ---------------------------------------------------------------------------

/// A reference to an identity object either by unique id or by name.
///
/// When both are supplied, id wins: ids are globally unique, names may
/// need a domain qualifier to disambiguate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrName {
    /// Identified by globally unique id.
    Id(String),
    /// Identified by human-assigned name.
    Name(String),
}

impl IdOrName {
    /// Pick an identifier from a pair of optional values, id first.
    pub fn from_options(id: Option<&str>, name: Option<&str>) -> Option<Self> {
        match (id, name) {
            (Some(id), _) => Some(IdOrName::Id(id.to_string())),
            (None, Some(name)) => Some(IdOrName::Name(name.to_string())),
            (None, None) => None,
        }
    }

    /// True when the object is identified by name rather than id.
    pub fn is_name(&self) -> bool {
        matches!(self, IdOrName::Name(_))
    }
}

// ---------------------------------------------------------------------------
// v2 request
// ---------------------------------------------------------------------------

/// Body of `POST {auth_url}/tokens` (identity v2).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V2AuthRequest {
    /// The `auth` envelope.
    pub auth: V2Auth,
}

/// The v2 `auth` envelope: exactly one credential block plus optional
/// tenant scoping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V2Auth {
    /// Token credentials, for re-authentication by token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<V2TokenRef>,
    /// Username/password credentials.
    #[serde(rename = "passwordCredentials", skip_serializing_if = "Option::is_none")]
    pub password_credentials: Option<V2PasswordCredentials>,
    /// Scope the token to a tenant by id.
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Scope the token to a tenant by name.
    #[serde(rename = "tenantName", skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
}

/// A token presented as a credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V2TokenRef {
    /// The token string.
    pub id: String,
}

/// Username/password credential block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V2PasswordCredentials {
    /// The user's name.
    pub username: String,
    /// The user's password.
    pub password: String,
}

// ---------------------------------------------------------------------------
// v3 request
// ---------------------------------------------------------------------------

/// Body of `POST {auth_url}/auth/tokens` (identity v3).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3AuthRequest {
    /// The `auth` envelope.
    pub auth: V3Auth,
}

/// The v3 `auth` envelope: an identity block plus optional scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3Auth {
    /// Who is authenticating, and how.
    pub identity: V3Identity,
    /// What the token should be scoped to, when scoping was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<V3Scope>,
}

/// The v3 `identity` block. `methods` names the credential kind in use
/// (`"token"` or `"password"`); the matching block must be present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3Identity {
    /// The authentication methods, in practice a single element.
    pub methods: Vec<String>,
    /// Token credential, present for `methods: ["token"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<V3TokenRef>,
    /// Password credential, present for `methods: ["password"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<V3PasswordMethod>,
}

/// A token presented as a v3 credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3TokenRef {
    /// The token string.
    pub id: String,
}

/// The v3 password method wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3PasswordMethod {
    /// The authenticating user.
    pub user: V3User,
}

/// A v3 user, identified by id or by name. A domain qualifier is only
/// meaningful (and only attached) when the user is identified by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3User {
    /// User id, when identifying by id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// User name, when identifying by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The user's password.
    pub password: String,
    /// Domain disambiguating the user name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<V3DomainRef>,
}

/// A domain reference by id or name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3DomainRef {
    /// Domain id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Domain name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&IdOrName> for V3DomainRef {
    fn from(value: &IdOrName) -> Self {
        match value {
            IdOrName::Id(id) => V3DomainRef {
                id: Some(id.clone()),
                name: None,
            },
            IdOrName::Name(name) => V3DomainRef {
                id: None,
                name: Some(name.clone()),
            },
        }
    }
}

/// The v3 `scope` block: a domain scope or a project scope, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3Scope {
    /// Domain scoping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<V3DomainRef>,
    /// Project scoping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<V3ProjectScope>,
}

/// A project scope by id or name, with an optional domain qualifier
/// that is only meaningful when the project is identified by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct V3ProjectScope {
    /// Project id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Project name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Domain disambiguating the project name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<V3DomainRef>,
}

impl From<&IdOrName> for V3ProjectScope {
    fn from(value: &IdOrName) -> Self {
        match value {
            IdOrName::Id(id) => V3ProjectScope {
                id: Some(id.clone()),
                name: None,
                domain: None,
            },
            IdOrName::Name(name) => V3ProjectScope {
                id: None,
                name: Some(name.clone()),
                domain: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// v2 response
// ---------------------------------------------------------------------------

/// Body of a successful v2 authentication: the `access` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct V2AuthResponse {
    /// The `access` envelope.
    pub access: V2Access,
}

/// The v2 `access` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct V2Access {
    /// The issued token and its scope.
    pub token: V2Token,
    /// The service catalog, absent for unscoped tokens.
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog: Vec<V2CatalogService>,
}

/// A v2 token with expiry and tenant scope.
#[derive(Debug, Clone, Deserialize)]
pub struct V2Token {
    /// The token string.
    pub id: String,
    /// Expiry timestamp.
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    /// The tenant the token is scoped to.
    #[serde(default)]
    pub tenant: Option<V2TenantRef>,
}

/// Tenant reference inside a v2 token.
#[derive(Debug, Clone, Deserialize)]
pub struct V2TenantRef {
    /// Tenant id.
    #[serde(default)]
    pub id: Option<String>,
    /// Tenant name.
    #[serde(default)]
    pub name: Option<String>,
}

/// One service in the v2 catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct V2CatalogService {
    /// Service type.
    #[serde(rename = "type", default)]
    pub service_type: Option<String>,
    /// Service name.
    #[serde(default)]
    pub name: Option<String>,
    /// Per-region endpoint groups.
    #[serde(default)]
    pub endpoints: Vec<V2Endpoint>,
}

/// One v2 endpoint group: up to three interface URLs for one region.
#[derive(Debug, Clone, Deserialize)]
pub struct V2Endpoint {
    /// Region the group serves.
    #[serde(default)]
    pub region: Option<String>,
    /// Public interface URL.
    #[serde(rename = "publicURL", default)]
    pub public_url: Option<String>,
    /// Internal interface URL.
    #[serde(rename = "internalURL", default)]
    pub internal_url: Option<String>,
    /// Admin interface URL.
    #[serde(rename = "adminURL", default)]
    pub admin_url: Option<String>,
}

// ---------------------------------------------------------------------------
// v3 response
// ---------------------------------------------------------------------------

/// Body of a successful v3 authentication: the `token` envelope.
/// The token string itself travels in the `X-Subject-Token` header.
#[derive(Debug, Clone, Deserialize)]
pub struct V3AuthResponse {
    /// The `token` envelope.
    pub token: V3TokenBody,
}

/// The v3 `token` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct V3TokenBody {
    /// Expiry timestamp.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// The project the token is scoped to, when project-scoped.
    #[serde(default)]
    pub project: Option<V3ScopeTarget>,
    /// The service catalog, absent for unscoped tokens.
    #[serde(default)]
    pub catalog: Vec<V3CatalogService>,
}

/// Scope target reference inside a v3 token.
#[derive(Debug, Clone, Deserialize)]
pub struct V3ScopeTarget {
    /// Target id.
    #[serde(default)]
    pub id: Option<String>,
    /// Target name.
    #[serde(default)]
    pub name: Option<String>,
}

/// One service in the v3 catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct V3CatalogService {
    /// Service type.
    #[serde(rename = "type", default)]
    pub service_type: Option<String>,
    /// Service name.
    #[serde(default)]
    pub name: Option<String>,
    /// Flat endpoint list, one per (region, interface).
    #[serde(default)]
    pub endpoints: Vec<V3Endpoint>,
}

/// One v3 endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct V3Endpoint {
    /// Interface name (`public`, `internal`, `admin`).
    #[serde(default)]
    pub interface: Option<String>,
    /// Region the endpoint serves.
    #[serde(default)]
    pub region: Option<String>,
    /// The endpoint URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// AccessInfo
// ---------------------------------------------------------------------------

/// The version-independent result of a successful authentication.
///
/// Owned by the auth plugin that produced it and valid for one
/// authenticated session; nothing here is refreshed in place.
#[derive(Debug, Clone)]
pub struct AccessInfo {
    /// The opaque token subsequent requests present as `X-Auth-Token`.
    pub token: String,
    /// Token expiry, when the identity service announced one.
    pub expires_at: Option<DateTime<Utc>>,
    /// The tenant (v2) or project (v3) id the token is scoped to.
    pub tenant_id: Option<String>,
    /// Catalog of services available to this token.
    pub catalog: ServiceCatalog,
}

impl AccessInfo {
    /// Fold a v2 `access` envelope into version-independent form.
    pub fn from_v2(response: V2AuthResponse) -> Self {
        let access = response.access;
        let entries = access
            .service_catalog
            .into_iter()
            .filter_map(|service| {
                let service_type = service.service_type?;
                let mut endpoints = Vec::new();
                for group in service.endpoints {
                    let urls = [
                        (EndpointInterface::Public, group.public_url),
                        (EndpointInterface::Internal, group.internal_url),
                        (EndpointInterface::Admin, group.admin_url),
                    ];
                    for (interface, url) in urls {
                        if let Some(url) = url {
                            endpoints.push(Endpoint {
                                interface,
                                region: group.region.clone(),
                                url,
                            });
                        }
                    }
                }
                Some(CatalogEntry {
                    service_type,
                    name: service.name,
                    endpoints,
                })
            })
            .collect();

        AccessInfo {
            token: access.token.id,
            expires_at: access.token.expires,
            tenant_id: access.token.tenant.and_then(|t| t.id),
            catalog: ServiceCatalog::new(entries),
        }
    }

    /// Fold a v3 `token` envelope plus the `X-Subject-Token` header value
    /// into version-independent form. Endpoints with an interface we do
    /// not recognise are skipped.
    pub fn from_v3(subject_token: impl Into<String>, response: V3AuthResponse) -> Self {
        let body = response.token;
        let entries = body
            .catalog
            .into_iter()
            .filter_map(|service| {
                let service_type = service.service_type?;
                let endpoints = service
                    .endpoints
                    .into_iter()
                    .filter_map(|ep| {
                        let interface = EndpointInterface::parse_lenient(ep.interface.as_deref()?)?;
                        Some(Endpoint {
                            interface,
                            region: ep.region,
                            url: ep.url,
                        })
                    })
                    .collect();
                Some(CatalogEntry {
                    service_type,
                    name: service.name,
                    endpoints,
                })
            })
            .collect();

        AccessInfo {
            token: subject_token.into(),
            expires_at: body.expires_at,
            tenant_id: body.project.and_then(|p| p.id),
            catalog: ServiceCatalog::new(entries),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
