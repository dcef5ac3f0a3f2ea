//! Credential caching.
//!
//! A successful authentication yields a `(token, endpoint, tenant_id)`
//! triple. [`CredentialCache`] persists it in a pluggable
//! [`SecretStore`] under a composite key derived from everything that
//! influences the answer, so a later invocation with the same inputs
//! can skip password authentication. Entries are never proactively
//! expired; a stale token is discovered by the validation call and
//! overwritten on the next successful authentication.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::Error;
use crate::options::{AuthOptions, ServiceSelection};

/// Namespace every cache entry lives under in the secret store.
pub const AUTH_NAMESPACE: &str = "openlb_auth";

// ---------------------------------------------------------------------------
// SecretStore
// ---------------------------------------------------------------------------

/// An opaque key-value secret store.
///
/// Persistence failures are the store's to report and the cache's to
/// tolerate; a cache write never fails the surrounding command.
pub trait SecretStore: Send {
    /// Read a value.
    fn get(&self, namespace: &str, key: &str) -> Option<String>;
    /// Write a value.
    fn set(&mut self, namespace: &str, key: &str, value: &str) -> io::Result<()>;
}

/// A store that remembers nothing. Backs disabled caching.
#[derive(Debug, Default)]
pub struct NullSecretStore;

impl SecretStore for NullSecretStore {
    fn get(&self, _namespace: &str, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _namespace: &str, _key: &str, _value: &str) -> io::Result<()> {
        Ok(())
    }
}

/// An in-memory store, primarily for tests.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemorySecretStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.entries.get(namespace)?.get(key).cloned()
    }

    fn set(&mut self, namespace: &str, key: &str, value: &str) -> io::Result<()> {
        self.entries
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A TOML file store under the user's config directory.
///
/// Layout: one table per namespace, one entry per cache key. The file
/// is rewritten whole on every set; entries are small and writes rare.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// A store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSecretStore { path: path.into() }
    }

    /// The conventional location: `<config dir>/openlb/secrets.toml`.
    pub fn default_location() -> Result<Self, Error> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("no user config directory".to_string()))?;
        Ok(Self::new(dir.join("openlb").join("secrets.toml")))
    }

    fn load(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        toml::from_str(&text).unwrap_or_default()
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.load().get(namespace)?.get(key).cloned()
    }

    fn set(&mut self, namespace: &str, key: &str, value: &str) -> io::Result<()> {
        let mut data = self.load();
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        let text = toml::to_string(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)
    }
}

// ---------------------------------------------------------------------------
// CachedCredential
// ---------------------------------------------------------------------------

/// The cached triple: token, management endpoint, tenant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    /// The auth token.
    pub token: String,
    /// The resolved service endpoint.
    pub endpoint: String,
    /// The tenant the token is scoped to.
    pub tenant_id: String,
}

impl CachedCredential {
    fn encode(&self) -> String {
        format!("{}|{}|{}", self.token, self.endpoint, self.tenant_id)
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, '|');
        let token = parts.next()?;
        let endpoint = parts.next()?;
        let tenant_id = parts.next()?;
        if token.is_empty() || endpoint.is_empty() || tenant_id.is_empty() {
            return None;
        }
        Some(CachedCredential {
            token: token.to_string(),
            endpoint: endpoint.to_string(),
            tenant_id: tenant_id.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// CredentialCache
// ---------------------------------------------------------------------------

/// Read-then-write credential cache over a [`SecretStore`].
pub struct CredentialCache {
    store: Box<dyn SecretStore>,
    enabled: bool,
}

impl CredentialCache {
    /// A cache over the given store.
    pub fn new(store: Box<dyn SecretStore>, enabled: bool) -> Self {
        CredentialCache { store, enabled }
    }

    /// A cache that never hits and never persists.
    pub fn disabled() -> Self {
        Self::new(Box::new(NullSecretStore), false)
    }

    /// Derive the composite cache key. Seven fixed components joined by
    /// `/`, with `?` standing in for anything absent; any change to a
    /// component is a cache miss.
    pub fn cache_key(options: &AuthOptions, selection: &ServiceSelection) -> String {
        let interface = selection.interface.to_string();
        let parts = [
            options.get("auth_url"),
            options.tenant(),
            options.get("username"),
            selection.region.as_deref(),
            Some(interface.as_str()),
            Some(selection.service_type.as_str()),
            Some(selection.service_name.as_str()),
        ];
        parts
            .into_iter()
            .map(|part| part.filter(|p| !p.is_empty()).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Read and decode the triple stored under `key`.
    pub fn lookup(&self, key: &str) -> Option<CachedCredential> {
        if !self.enabled {
            return None;
        }
        let raw = self.store.get(AUTH_NAMESPACE, key)?;
        CachedCredential::decode(&raw)
    }

    /// Persist a triple under `key`.
    ///
    /// Skipped entirely when caching is disabled or the triple is
    /// incomplete; a no-op when the stored value already matches.
    /// Store failures are logged, never propagated.
    pub fn save(&mut self, key: &str, token: &str, endpoint: &str, tenant_id: Option<&str>) {
        if !self.enabled {
            return;
        }
        let tenant_id = tenant_id.unwrap_or("");
        if token.is_empty() || endpoint.is_empty() || tenant_id.is_empty() {
            debug!("not caching an incomplete credential triple");
            return;
        }
        let value = CachedCredential {
            token: token.to_string(),
            endpoint: endpoint.to_string(),
            tenant_id: tenant_id.to_string(),
        }
        .encode();
        if self.store.get(AUTH_NAMESPACE, key).as_deref() == Some(value.as_str()) {
            return;
        }
        if let Err(err) = self.store.set(AUTH_NAMESPACE, key, &value) {
            warn!(error = %err, "failed to persist credentials");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use openlb_models::EndpointInterface;

    fn options(auth_url: &str, tenant: &str, username: &str) -> AuthOptions {
        let mut opts = AuthOptions::new();
        opts.set("auth_url", auth_url)
            .set("tenant_name", tenant)
            .set("username", username);
        opts
    }

    #[test]
    fn cache_key_is_deterministic_and_ordered() {
        let opts = options("http://id.example.com/v2.0", "acme", "alice");
        let selection = ServiceSelection {
            region: Some("region-a".to_string()),
            ..ServiceSelection::default()
        };
        let key = CredentialCache::cache_key(&opts, &selection);
        assert_eq!(
            key,
            "http://id.example.com/v2.0/acme/alice/region-a/public/hpext:lbaas/libra"
        );
        // Same inputs, same key.
        assert_eq!(key, CredentialCache::cache_key(&opts, &selection));
    }

    #[test]
    fn cache_key_substitutes_placeholders_for_missing_parts() {
        let mut opts = AuthOptions::new();
        opts.set("auth_url", "http://id.example.com/v2.0");
        let key = CredentialCache::cache_key(&opts, &ServiceSelection::default());
        assert_eq!(
            key,
            "http://id.example.com/v2.0/?/?/?/public/hpext:lbaas/libra"
        );
    }

    #[test]
    fn cache_key_tenant_precedence() {
        let mut opts = options("u", "by-name", "alice");
        opts.set("tenant_id", "by-id");
        let selection = ServiceSelection::default();
        let key = CredentialCache::cache_key(&opts, &selection);
        assert!(key.starts_with("u/by-id/alice/"));
    }

    #[test]
    fn cache_key_tracks_interface() {
        let opts = options("u", "t", "n");
        let selection = ServiceSelection {
            interface: EndpointInterface::Internal,
            ..ServiceSelection::default()
        };
        let key = CredentialCache::cache_key(&opts, &selection);
        assert!(key.contains("/internal/"));
    }

    #[test]
    fn save_then_lookup_round_trips() {
        let mut cache = CredentialCache::new(Box::new(MemorySecretStore::new()), true);
        cache.save("k", "tok-1", "http://lb.example.com/v1.1", Some("ten-1"));
        let cred = cache.lookup("k").unwrap();
        assert_eq!(cred.token, "tok-1");
        assert_eq!(cred.endpoint, "http://lb.example.com/v1.1");
        assert_eq!(cred.tenant_id, "ten-1");
    }

    #[test]
    fn disabled_cache_never_hits_or_persists() {
        let mut cache = CredentialCache::disabled();
        cache.save("k", "tok-1", "http://lb.example.com", Some("ten-1"));
        assert!(cache.lookup("k").is_none());
    }

    #[test]
    fn incomplete_triples_are_not_persisted() {
        let mut cache = CredentialCache::new(Box::new(MemorySecretStore::new()), true);
        cache.save("k", "tok-1", "http://lb.example.com", None);
        assert!(cache.lookup("k").is_none());
        cache.save("k", "", "http://lb.example.com", Some("ten-1"));
        assert!(cache.lookup("k").is_none());
    }

    #[test]
    fn identical_save_is_a_no_op() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct CountingStore {
            inner: MemorySecretStore,
            sets: Arc<AtomicUsize>,
        }
        impl SecretStore for CountingStore {
            fn get(&self, namespace: &str, key: &str) -> Option<String> {
                self.inner.get(namespace, key)
            }
            fn set(&mut self, namespace: &str, key: &str, value: &str) -> io::Result<()> {
                self.sets.fetch_add(1, Ordering::SeqCst);
                self.inner.set(namespace, key, value)
            }
        }

        let sets = Arc::new(AtomicUsize::new(0));
        let mut cache = CredentialCache::new(
            Box::new(CountingStore {
                inner: MemorySecretStore::new(),
                sets: Arc::clone(&sets),
            }),
            true,
        );
        cache.save("k", "tok-1", "http://lb", Some("ten-1"));
        cache.save("k", "tok-1", "http://lb", Some("ten-1"));
        cache.save("k", "tok-2", "http://lb", Some("ten-1"));
        // Two distinct values written; the repeat was skipped.
        assert_eq!(sets.load(Ordering::SeqCst), 2);
        let cred = cache.lookup("k").unwrap();
        assert_eq!(cred.token, "tok-2");
    }

    #[test]
    fn lookup_rejects_malformed_entries() {
        let mut store = MemorySecretStore::new();
        store.set(AUTH_NAMESPACE, "k", "only-one-field").unwrap();
        store.set(AUTH_NAMESPACE, "k2", "tok||missing-middle").unwrap();
        let cache = CredentialCache::new(Box::new(store), true);
        assert!(cache.lookup("k").is_none());
        assert!(cache.lookup("k2").is_none());
    }

    #[test]
    fn file_store_round_trips_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");

        let mut writer = FileSecretStore::new(&path);
        writer
            .set(AUTH_NAMESPACE, "http://id/?/alice", "tok|http://lb|ten")
            .unwrap();

        let reader = FileSecretStore::new(&path);
        assert_eq!(
            reader.get(AUTH_NAMESPACE, "http://id/?/alice").as_deref(),
            Some("tok|http://lb|ten")
        );
        assert_eq!(reader.get(AUTH_NAMESPACE, "other"), None);
        assert_eq!(reader.get("other_namespace", "http://id/?/alice"), None);
    }

    #[test]
    fn null_store_always_misses() {
        let mut store = NullSecretStore;
        store.set(AUTH_NAMESPACE, "k", "v").unwrap();
        assert_eq!(store.get(AUTH_NAMESPACE, "k"), None);
    }
}
