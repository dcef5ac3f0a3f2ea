//! Session establishment.
//!
//! [`SessionManager`] drives one authentication to completion: option
//! preflight, a credential cache lookup validated against the service,
//! password resolution through an injected prompt, and finally the
//! identity round trip. The result is a [`Session`], the token and
//! endpoint every resource call runs on. Nothing re-authenticates
//! mid-session; a token that expires later surfaces as `Unauthorized`
//! to the caller.

use tracing::debug;

use crate::cache::{CachedCredential, CredentialCache};
use crate::error::{Error, ErrorKind};
use crate::identity::AuthPlugin;
use crate::options::{AuthOptions, AuthSystem, ServiceSelection};
use crate::transport::{concat_url, HttpTransport};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An established session: everything a resource call needs.
#[derive(Debug, Clone)]
pub struct Session {
    /// Token presented as `X-Auth-Token`.
    pub token: String,
    /// Base URL of the load balancer service.
    pub endpoint: String,
    /// Tenant the token is scoped to, when known.
    pub tenant_id: Option<String>,
}

// ---------------------------------------------------------------------------
// PasswordPrompt
// ---------------------------------------------------------------------------

/// Source of a password of last resort.
///
/// The CLI implements this over the terminal; `None` means no password
/// could be obtained, which the manager turns into a command error.
pub trait PasswordPrompt: Send {
    /// Obtain a password interactively, if possible.
    fn read_password(&self) -> Option<String>;
}

/// A prompt that never answers, for non-interactive use.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl PasswordPrompt for NoPrompt {
    fn read_password(&self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Orchestrates authentication against the identity service.
pub struct SessionManager {
    transport: HttpTransport,
    plugin: AuthPlugin,
    options: AuthOptions,
    selection: ServiceSelection,
    cache: CredentialCache,
    prompt: Box<dyn PasswordPrompt>,
}

impl SessionManager {
    /// Assemble a manager; `system` selects the identity protocol the
    /// options are interpreted under.
    pub fn new(
        transport: HttpTransport,
        system: AuthSystem,
        options: AuthOptions,
        selection: ServiceSelection,
        cache: CredentialCache,
        prompt: Box<dyn PasswordPrompt>,
    ) -> Self {
        let plugin = AuthPlugin::from_options(system, &options);
        SessionManager {
            transport,
            plugin,
            options,
            selection,
            cache,
            prompt,
        }
    }

    /// Establish a session.
    ///
    /// In order: option preflight; the token-plus-bypass-URL shortcut;
    /// a cached triple validated with one lightweight call, falling
    /// back to password authentication when the service rejects it;
    /// password resolution through the prompt; the identity round trip;
    /// a best-effort cache write.
    pub async fn authenticate(&mut self) -> Result<Session, Error> {
        self.preflight()?;

        // An explicit token with a bypass URL answers immediately,
        // with no identity call and nothing worth caching.
        if self.plugin.token().is_some() {
            if let Ok((token, endpoint)) = self.plugin.token_and_endpoint(&self.selection) {
                debug!("using the supplied token and bypass URL");
                return Ok(Session {
                    token,
                    endpoint,
                    tenant_id: None,
                });
            }
        }

        let key = CredentialCache::cache_key(&self.options, &self.selection);
        if let Some(credential) = self.cache.lookup(&key) {
            match self.validate(&credential).await {
                Ok(()) => {
                    debug!("cached credentials validated");
                    return Ok(Session {
                        token: credential.token,
                        endpoint: credential.endpoint,
                        tenant_id: Some(credential.tenant_id),
                    });
                }
                Err(err) if is_auth_rejection(&err) => {
                    debug!("cached token rejected, falling back to password authentication");
                }
                Err(other) => return Err(other),
            }
        }

        if self.plugin.token().is_none() && self.plugin.password().is_none() {
            match self.prompt.read_password().filter(|pw| !pw.is_empty()) {
                Some(password) => self.plugin.set_password(password),
                None => {
                    return Err(Error::Command(
                        "Expecting a password provided via either --os-password, \
                         env[OS_PASSWORD], or prompted response"
                            .to_string(),
                    ))
                }
            }
        }

        self.plugin.authenticate(&self.transport).await?;
        let (token, endpoint) = self.plugin.token_and_endpoint(&self.selection)?;
        self.cache.save(&key, &token, &endpoint, self.plugin.tenant_id());
        Ok(Session {
            token,
            endpoint,
            tenant_id: self.plugin.tenant_id().map(str::to_string),
        })
    }

    // ----------------------------------------------------------------------

    /// Checks that cost nothing and catch the common misconfigurations
    /// before any network traffic.
    fn preflight(&self) -> Result<(), Error> {
        if self.options.tenant().is_none() && !self.plugin.has_scope() {
            return Err(Error::Command(
                "You must provide a tenant name or tenant id via --os-tenant-name, \
                 --os-tenant-id, env[OS_TENANT_NAME] or env[OS_TENANT_ID]"
                    .to_string(),
            ));
        }
        if self.options.get("auth_url").is_none() {
            return Err(Error::Command(
                "You must provide an auth url via either --os-auth-url or env[OS_AUTH_URL]"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// One authenticated read against the cached endpoint; any answer
    /// that is not an authorization rejection settles the question.
    async fn validate(&self, credential: &CachedCredential) -> Result<(), Error> {
        let url = concat_url(&credential.endpoint, "limits");
        self.transport.get(&url, Some(&credential.token)).await?;
        Ok(())
    }
}

fn is_auth_rejection(err: &Error) -> bool {
    match err {
        Error::Api(api) => api.kind == ErrorKind::Unauthorized,
        Error::AuthorizationFailure(_) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
