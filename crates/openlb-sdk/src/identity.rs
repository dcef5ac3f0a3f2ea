//! Keystone authentication plugins.
//!
//! Two identity protocol variants behind one calling surface:
//! [`KeystoneV2`] posts to `{auth_url}/tokens`, [`KeystoneV3`] to
//! `{auth_url}/auth/tokens`. Both fold the response into a
//! version-independent [`AccessInfo`] that later requests draw the
//! token and the service endpoint from. Each plugin reads only the
//! options its protocol knows; anything else in the option set is
//! ignored.

use openlb_models::{
    AccessInfo, IdOrName, V2Auth, V2AuthRequest, V2AuthResponse, V2PasswordCredentials, V2TokenRef,
    V3Auth, V3AuthRequest, V3AuthResponse, V3DomainRef, V3Identity, V3PasswordMethod,
    V3ProjectScope, V3Scope, V3TokenRef, V3User,
};
use tracing::debug;

use crate::error::Error;
use crate::options::{AuthOptions, AuthSystem, ServiceSelection};
use crate::transport::{concat_url, HttpTransport};

// ---------------------------------------------------------------------------
// KeystoneV2
// ---------------------------------------------------------------------------

/// Identity v2 plugin.
///
/// Credentials are a token, or a username/password pair; the token is
/// presented both in the body and as `X-Auth-Token`. Scoping is by
/// tenant, id taking precedence over name.
#[derive(Debug, Clone)]
pub struct KeystoneV2 {
    auth_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    tenant_id: Option<String>,
    tenant_name: Option<String>,
    bypass_url: Option<String>,
    access: Option<AccessInfo>,
}

impl KeystoneV2 {
    /// Build the plugin from an option set, reading only v2 options.
    pub fn from_options(options: &AuthOptions) -> Self {
        let get = |name: &str| options.get(name).map(str::to_string);
        KeystoneV2 {
            auth_url: get("auth_url"),
            username: get("username"),
            password: get("password"),
            token: get("token"),
            tenant_id: get("tenant_id"),
            tenant_name: get("tenant_name"),
            bypass_url: get("bypass_url"),
            access: None,
        }
    }

    /// Check that an authentication attempt could succeed: an auth URL
    /// plus either a token or a username/password pair.
    pub fn sufficient_options(&self) -> Result<(), Error> {
        let credentials =
            self.token.is_some() || (self.username.is_some() && self.password.is_some());
        if self.auth_url.is_some() && credentials {
            Ok(())
        } else {
            Err(self.missing_options_error())
        }
    }

    /// Authenticate and store the resulting [`AccessInfo`].
    pub async fn authenticate(&mut self, transport: &HttpTransport) -> Result<(), Error> {
        let (url, token_header, body) = self.request()?;
        let response = transport.post(&url, token_header.as_deref(), &body).await?;
        let parsed: V2AuthResponse = response.json().map_err(|_| {
            Error::AuthorizationFailure("cannot parse the identity response".to_string())
        })?;
        let access = AccessInfo::from_v2(parsed);
        debug!(scoped = access.tenant_id.is_some(), "identity v2 authentication succeeded");
        self.access = Some(access);
        Ok(())
    }

    // ----------------------------------------------------------------------

    fn request(&self) -> Result<(String, Option<String>, V2AuthRequest), Error> {
        let Some(auth_url) = self.auth_url.as_deref() else {
            return Err(self.missing_options_error());
        };
        let (token, password_credentials) = if let Some(token) = &self.token {
            (Some(V2TokenRef { id: token.clone() }), None)
        } else if let (Some(username), Some(password)) =
            (self.username.as_deref(), self.password.as_deref())
        {
            (
                None,
                Some(V2PasswordCredentials {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
            )
        } else {
            return Err(self.missing_options_error());
        };
        // Tenant id wins when both scoping options are set.
        let (tenant_id, tenant_name) = if self.tenant_id.is_some() {
            (self.tenant_id.clone(), None)
        } else {
            (None, self.tenant_name.clone())
        };
        Ok((
            concat_url(auth_url, "tokens"),
            self.token.clone(),
            V2AuthRequest {
                auth: V2Auth {
                    token,
                    password_credentials,
                    tenant_id,
                    tenant_name,
                },
            },
        ))
    }

    fn missing_options_error(&self) -> Error {
        let candidates = [
            ("auth_url", self.auth_url.is_some()),
            ("username", self.username.is_some()),
            ("password", self.password.is_some()),
            ("token", self.token.is_some()),
        ];
        Error::MissingOptions {
            missing: candidates
                .into_iter()
                .filter(|(_, present)| !present)
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// KeystoneV3
// ---------------------------------------------------------------------------

/// Identity v3 plugin.
///
/// Credentials are a token, or a password plus a user identified by id
/// or name (id wins); a user named by name may carry a domain
/// qualifier. Scoping is to a domain or to a project, never both, and
/// a project named by name may carry its own domain qualifier. The v2
/// tenant options mean nothing here.
#[derive(Debug, Clone)]
pub struct KeystoneV3 {
    auth_url: Option<String>,
    username: Option<String>,
    user_id: Option<String>,
    password: Option<String>,
    token: Option<String>,
    user_domain_id: Option<String>,
    user_domain_name: Option<String>,
    domain_id: Option<String>,
    domain_name: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
    project_domain_id: Option<String>,
    project_domain_name: Option<String>,
    bypass_url: Option<String>,
    access: Option<AccessInfo>,
}

impl KeystoneV3 {
    /// Build the plugin from an option set, reading only v3 options.
    pub fn from_options(options: &AuthOptions) -> Self {
        let get = |name: &str| options.get(name).map(str::to_string);
        KeystoneV3 {
            auth_url: get("auth_url"),
            username: get("username"),
            user_id: get("user_id"),
            password: get("password"),
            token: get("token"),
            user_domain_id: get("user_domain_id"),
            user_domain_name: get("user_domain_name"),
            domain_id: get("domain_id"),
            domain_name: get("domain_name"),
            project_id: get("project_id"),
            project_name: get("project_name"),
            project_domain_id: get("project_domain_id"),
            project_domain_name: get("project_domain_name"),
            bypass_url: get("bypass_url"),
            access: None,
        }
    }

    /// Check that an authentication attempt could succeed: an auth URL
    /// plus either a token or a password with a user id or name.
    pub fn sufficient_options(&self) -> Result<(), Error> {
        let credentials = self.token.is_some()
            || ((self.username.is_some() || self.user_id.is_some()) && self.password.is_some());
        if self.auth_url.is_some() && credentials {
            Ok(())
        } else {
            Err(self.missing_options_error())
        }
    }

    /// Authenticate and store the resulting [`AccessInfo`].
    ///
    /// The token arrives in the `X-Subject-Token` response header, not
    /// the body; a response without it is an authorization failure.
    pub async fn authenticate(&mut self, transport: &HttpTransport) -> Result<(), Error> {
        let (url, token_header, body) = self.request()?;
        let response = transport.post(&url, token_header.as_deref(), &body).await?;
        let Some(subject_token) = response.header("x-subject-token") else {
            return Err(Error::AuthorizationFailure(
                "no X-Subject-Token header in the identity response".to_string(),
            ));
        };
        let parsed: V3AuthResponse = response.json().map_err(|_| {
            Error::AuthorizationFailure("cannot parse the identity response".to_string())
        })?;
        let access = AccessInfo::from_v3(subject_token, parsed);
        debug!(scoped = access.tenant_id.is_some(), "identity v3 authentication succeeded");
        self.access = Some(access);
        Ok(())
    }

    // ----------------------------------------------------------------------

    fn request(&self) -> Result<(String, Option<String>, V3AuthRequest), Error> {
        // Scope conflicts are caller mistakes; catch them before
        // looking at credentials or touching the network.
        let scope = self.scope()?;
        let Some(auth_url) = self.auth_url.as_deref() else {
            return Err(self.missing_options_error());
        };
        let identity = self.identity()?;
        Ok((
            concat_url(auth_url, "auth/tokens"),
            self.token.clone(),
            V3AuthRequest {
                auth: V3Auth { identity, scope },
            },
        ))
    }

    fn identity(&self) -> Result<V3Identity, Error> {
        if let Some(token) = &self.token {
            return Ok(V3Identity {
                methods: vec!["token".to_string()],
                token: Some(V3TokenRef { id: token.clone() }),
                password: None,
            });
        }
        let user = IdOrName::from_options(self.user_id.as_deref(), self.username.as_deref());
        let (Some(user), Some(password)) = (user, self.password.as_deref()) else {
            return Err(self.missing_options_error());
        };
        // A domain only disambiguates a user named by name.
        let domain = if user.is_name() {
            IdOrName::from_options(self.user_domain_id.as_deref(), self.user_domain_name.as_deref())
                .as_ref()
                .map(V3DomainRef::from)
        } else {
            None
        };
        let (id, name) = match user {
            IdOrName::Id(id) => (Some(id), None),
            IdOrName::Name(name) => (None, Some(name)),
        };
        Ok(V3Identity {
            methods: vec!["password".to_string()],
            token: None,
            password: Some(V3PasswordMethod {
                user: V3User {
                    id,
                    name,
                    password: password.to_string(),
                    domain,
                },
            }),
        })
    }

    fn scope(&self) -> Result<Option<V3Scope>, Error> {
        let domain = IdOrName::from_options(self.domain_id.as_deref(), self.domain_name.as_deref());
        let project =
            IdOrName::from_options(self.project_id.as_deref(), self.project_name.as_deref());
        if domain.is_some() && project.is_some() {
            return Err(Error::InvalidScope(
                "authentication cannot be scoped to both domain and project".to_string(),
            ));
        }
        if let Some(domain) = &domain {
            return Ok(Some(V3Scope {
                domain: Some(domain.into()),
                project: None,
            }));
        }
        let Some(project) = &project else {
            return Ok(None);
        };
        let mut target = V3ProjectScope::from(project);
        if project.is_name() {
            target.domain = IdOrName::from_options(
                self.project_domain_id.as_deref(),
                self.project_domain_name.as_deref(),
            )
            .as_ref()
            .map(V3DomainRef::from);
        }
        Ok(Some(V3Scope {
            domain: None,
            project: Some(target),
        }))
    }

    fn missing_options_error(&self) -> Error {
        let candidates = [
            ("auth_url", self.auth_url.is_some()),
            ("username", self.username.is_some()),
            ("user_id", self.user_id.is_some()),
            ("password", self.password.is_some()),
            ("token", self.token.is_some()),
        ];
        Error::MissingOptions {
            missing: candidates
                .into_iter()
                .filter(|(_, present)| !present)
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthPlugin
// ---------------------------------------------------------------------------

/// The configured identity plugin, one variant per protocol.
#[derive(Debug, Clone)]
pub enum AuthPlugin {
    /// Identity v2.
    V2(KeystoneV2),
    /// Identity v3.
    V3(KeystoneV3),
}

impl AuthPlugin {
    /// Build the plugin selected by `system` from an option set.
    pub fn from_options(system: AuthSystem, options: &AuthOptions) -> Self {
        match system {
            AuthSystem::KeystoneV2 => AuthPlugin::V2(KeystoneV2::from_options(options)),
            AuthSystem::KeystoneV3 => AuthPlugin::V3(KeystoneV3::from_options(options)),
        }
    }

    /// Check that an authentication attempt could succeed.
    pub fn sufficient_options(&self) -> Result<(), Error> {
        match self {
            AuthPlugin::V2(plugin) => plugin.sufficient_options(),
            AuthPlugin::V3(plugin) => plugin.sufficient_options(),
        }
    }

    /// Authenticate against the identity service.
    pub async fn authenticate(&mut self, transport: &HttpTransport) -> Result<(), Error> {
        match self {
            AuthPlugin::V2(plugin) => plugin.authenticate(transport).await,
            AuthPlugin::V3(plugin) => plugin.authenticate(transport).await,
        }
    }

    /// The token and service endpoint for subsequent API calls.
    ///
    /// A caller-supplied token together with a bypass URL answers
    /// without authenticating at all. Otherwise the endpoint comes from
    /// the catalog of the last successful authentication, still
    /// overridden by the bypass URL when one is set.
    pub fn token_and_endpoint(&self, selection: &ServiceSelection) -> Result<(String, String), Error> {
        if let (Some(token), Some(url)) = (self.token(), self.bypass_url()) {
            return Ok((token.to_string(), url.to_string()));
        }
        let access = self
            .access()
            .ok_or_else(|| Error::AuthorizationFailure("not authenticated".to_string()))?;
        let endpoint = match self.bypass_url() {
            Some(url) => url.to_string(),
            None => access
                .catalog
                .url_for(
                    &selection.service_type,
                    selection.interface,
                    selection.region.as_deref(),
                    None,
                )?
                .to_string(),
        };
        Ok((access.token.clone(), endpoint))
    }

    /// The token supplied as an option, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            AuthPlugin::V2(plugin) => plugin.token.as_deref(),
            AuthPlugin::V3(plugin) => plugin.token.as_deref(),
        }
    }

    /// The password supplied as an option, if any.
    pub fn password(&self) -> Option<&str> {
        match self {
            AuthPlugin::V2(plugin) => plugin.password.as_deref(),
            AuthPlugin::V3(plugin) => plugin.password.as_deref(),
        }
    }

    /// Supply a password after the fact, typically from a prompt.
    pub fn set_password(&mut self, password: impl Into<String>) {
        let password = Some(password.into());
        match self {
            AuthPlugin::V2(plugin) => plugin.password = password,
            AuthPlugin::V3(plugin) => plugin.password = password,
        }
    }

    /// Whether the options request a scoped token. v2 scopes by tenant;
    /// v3 scopes by domain or project and ignores the tenant options.
    pub fn has_scope(&self) -> bool {
        match self {
            AuthPlugin::V2(plugin) => {
                plugin.tenant_id.is_some() || plugin.tenant_name.is_some()
            }
            AuthPlugin::V3(plugin) => {
                plugin.domain_id.is_some()
                    || plugin.domain_name.is_some()
                    || plugin.project_id.is_some()
                    || plugin.project_name.is_some()
            }
        }
    }

    /// The tenant id the current token is scoped to, when known.
    pub fn tenant_id(&self) -> Option<&str> {
        self.access().and_then(|access| access.tenant_id.as_deref())
    }

    fn bypass_url(&self) -> Option<&str> {
        match self {
            AuthPlugin::V2(plugin) => plugin.bypass_url.as_deref(),
            AuthPlugin::V3(plugin) => plugin.bypass_url.as_deref(),
        }
    }

    fn access(&self) -> Option<&AccessInfo> {
        match self {
            AuthPlugin::V2(plugin) => plugin.access.as_ref(),
            AuthPlugin::V3(plugin) => plugin.access.as_ref(),
        }
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
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        HttpTransport::new(&TransportConfig::default()).unwrap()
    }

    fn v2_options(auth_url: &str) -> AuthOptions {
        let mut opts = AuthOptions::new();
        opts.set("auth_url", auth_url)
            .set("username", "alice")
            .set("password", "hunter2")
            .set("tenant_name", "acme");
        opts
    }

    fn v2_access_body() -> serde_json::Value {
        json!({
            "access": {
                "token": {
                    "id": "srv-tok",
                    "expires": "2026-02-01T00:00:00Z",
                    "tenant": {"id": "ten-1", "name": "acme"}
                },
                "serviceCatalog": [
                    {
                        "type": "hpext:lbaas",
                        "name": "libra",
                        "endpoints": [
                            {
                                "region": "region-a",
                                "publicURL": "http://lb-a.example.com/v1.1/ten-1"
                            },
                            {
                                "region": "region-b",
                                "publicURL": "http://lb-b.example.com/v1.1/ten-1"
                            }
                        ]
                    },
                    {
                        "type": "compute",
                        "name": "nova",
                        "endpoints": [
                            {"region": "region-a", "publicURL": "http://nova.example.com"}
                        ]
                    }
                ]
            }
        })
    }

    fn v3_token_body() -> serde_json::Value {
        json!({
            "token": {
                "expires_at": "2026-02-01T00:00:00Z",
                "project": {"id": "proj-1", "name": "acme"},
                "catalog": [
                    {
                        "type": "hpext:lbaas",
                        "name": "libra",
                        "endpoints": [
                            {
                                "interface": "public",
                                "region": "region-a",
                                "url": "http://lb.example.com/v1.1/proj-1"
                            },
                            {
                                "interface": "admin",
                                "region": "region-a",
                                "url": "http://lb-admin.example.com"
                            }
                        ]
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn v2_password_flow_resolves_token_and_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tokens"))
            .and(body_json(json!({
                "auth": {
                    "passwordCredentials": {"username": "alice", "password": "hunter2"},
                    "tenantName": "acme"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(v2_access_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV2, &v2_options(&server.uri()));
        plugin.authenticate(&transport()).await.unwrap();

        let selection = ServiceSelection {
            region: Some("region-b".to_string()),
            ..ServiceSelection::default()
        };
        let (token, endpoint) = plugin.token_and_endpoint(&selection).unwrap();
        assert_eq!(token, "srv-tok");
        assert_eq!(endpoint, "http://lb-b.example.com/v1.1/ten-1");
        assert_eq!(plugin.tenant_id(), Some("ten-1"));
    }

    #[tokio::test]
    async fn v2_token_flow_presents_the_token_in_header_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tokens"))
            .and(header("x-auth-token", "opaque"))
            .and(body_json(json!({
                "auth": {"token": {"id": "opaque"}, "tenantId": "ten-1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(v2_access_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut opts = AuthOptions::new();
        opts.set("auth_url", server.uri())
            .set("token", "opaque")
            .set("tenant_id", "ten-1")
            .set("tenant_name", "shadowed");
        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV2, &opts);
        plugin.authenticate(&transport()).await.unwrap();
    }

    #[tokio::test]
    async fn v3_password_flow_reads_the_subject_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/tokens"))
            .and(body_json(json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": "alice",
                                "password": "hunter2",
                                "domain": {"name": "dom"}
                            }
                        }
                    },
                    "scope": {"project": {"name": "acme", "domain": {"id": "d-1"}}}
                }
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .append_header("X-Subject-Token", "v3-tok")
                    .set_body_json(v3_token_body()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut opts = AuthOptions::new();
        opts.set("auth_url", server.uri())
            .set("username", "alice")
            .set("password", "hunter2")
            .set("user_domain_name", "dom")
            .set("project_name", "acme")
            .set("project_domain_id", "d-1");
        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV3, &opts);
        plugin.authenticate(&transport()).await.unwrap();

        let (token, endpoint) = plugin.token_and_endpoint(&ServiceSelection::default()).unwrap();
        assert_eq!(token, "v3-tok");
        assert_eq!(endpoint, "http://lb.example.com/v1.1/proj-1");
        assert_eq!(plugin.tenant_id(), Some("proj-1"));
    }

    #[tokio::test]
    async fn v3_scope_conflict_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut opts = AuthOptions::new();
        opts.set("auth_url", server.uri())
            .set("username", "alice")
            .set("password", "hunter2")
            .set("domain_name", "dom")
            .set("project_id", "p-1");
        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV3, &opts);
        let err = plugin.authenticate(&transport()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidScope(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn v3_response_without_subject_token_is_an_authorization_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/tokens"))
            .and(header("x-auth-token", "opaque"))
            .respond_with(ResponseTemplate::new(201).set_body_json(v3_token_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut opts = AuthOptions::new();
        opts.set("auth_url", server.uri()).set("token", "opaque");
        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV3, &opts);
        let err = plugin.authenticate(&transport()).await.unwrap_err();
        assert!(matches!(err, Error::AuthorizationFailure(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn v2_unparseable_response_is_an_authorization_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV2, &v2_options(&server.uri()));
        let err = plugin.authenticate(&transport()).await.unwrap_err();
        assert!(matches!(err, Error::AuthorizationFailure(_)), "got {err:?}");
    }

    #[test]
    fn missing_option_lists_name_every_absent_candidate() {
        let empty = AuthPlugin::from_options(AuthSystem::KeystoneV2, &AuthOptions::new());
        let Err(Error::MissingOptions { missing }) = empty.sufficient_options() else {
            panic!("expected missing options");
        };
        assert_eq!(missing, ["auth_url", "username", "password", "token"]);

        let mut opts = AuthOptions::new();
        opts.set("auth_url", "http://id").set("username", "alice");
        let partial = AuthPlugin::from_options(AuthSystem::KeystoneV2, &opts);
        let Err(Error::MissingOptions { missing }) = partial.sufficient_options() else {
            panic!("expected missing options");
        };
        assert_eq!(missing, ["password", "token"]);

        let v3 = AuthPlugin::from_options(AuthSystem::KeystoneV3, &AuthOptions::new());
        let Err(Error::MissingOptions { missing }) = v3.sufficient_options() else {
            panic!("expected missing options");
        };
        assert_eq!(missing, ["auth_url", "username", "user_id", "password", "token"]);
    }

    #[test]
    fn user_id_with_password_is_sufficient_for_v3() {
        let mut opts = AuthOptions::new();
        opts.set("auth_url", "http://id")
            .set("user_id", "u-1")
            .set("password", "hunter2");
        let plugin = AuthPlugin::from_options(AuthSystem::KeystoneV3, &opts);
        assert!(plugin.sufficient_options().is_ok());
    }

    #[test]
    fn token_with_bypass_url_answers_without_authenticating() {
        let mut opts = AuthOptions::new();
        opts.set("token", "opaque")
            .set("bypass_url", "http://lb.example.com/v1.1/ten");

        for system in [AuthSystem::KeystoneV2, AuthSystem::KeystoneV3] {
            let plugin = AuthPlugin::from_options(system, &opts);
            let (token, endpoint) = plugin.token_and_endpoint(&ServiceSelection::default()).unwrap();
            assert_eq!(token, "opaque");
            assert_eq!(endpoint, "http://lb.example.com/v1.1/ten");
        }
    }

    #[tokio::test]
    async fn bypass_url_overrides_the_catalog_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(v2_access_body()))
            .mount(&server)
            .await;

        let mut opts = v2_options(&server.uri());
        opts.set("bypass_url", "http://direct.example.com/v1.1");
        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV2, &opts);
        plugin.authenticate(&transport()).await.unwrap();

        let (token, endpoint) = plugin.token_and_endpoint(&ServiceSelection::default()).unwrap();
        assert_eq!(token, "srv-tok");
        assert_eq!(endpoint, "http://direct.example.com/v1.1");
    }

    #[test]
    fn token_and_endpoint_requires_authentication_first() {
        let plugin = AuthPlugin::from_options(AuthSystem::KeystoneV2, &v2_options("http://id"));
        let err = plugin.token_and_endpoint(&ServiceSelection::default()).unwrap_err();
        assert!(matches!(err, Error::AuthorizationFailure(_)), "got {err:?}");
    }

    #[test]
    fn scope_detection_per_identity_version() {
        let mut tenant_only = AuthOptions::new();
        tenant_only.set("tenant_name", "acme");
        assert!(AuthPlugin::from_options(AuthSystem::KeystoneV2, &tenant_only).has_scope());
        // v3 does not read the tenant options.
        assert!(!AuthPlugin::from_options(AuthSystem::KeystoneV3, &tenant_only).has_scope());

        let mut domain = AuthOptions::new();
        domain.set("domain_id", "d-1");
        assert!(AuthPlugin::from_options(AuthSystem::KeystoneV3, &domain).has_scope());
    }

    #[test]
    fn prompted_password_lands_in_the_plugin() {
        let mut plugin = AuthPlugin::from_options(AuthSystem::KeystoneV2, &AuthOptions::new());
        assert_eq!(plugin.password(), None);
        plugin.set_password("prompted");
        assert_eq!(plugin.password(), Some("prompted"));
    }
}
