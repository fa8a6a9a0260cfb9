//! Cached endpoint orchestration.
//!
//! A [`CachedEndpoint`] answers reads from its storage slot while the entry
//! is fresh and falls through to the remote API otherwise. Freshness is
//! governed by two independent signals: the per-entry lifetime written at
//! store time, and an endpoint-wide dirty flag for externally known
//! invalidation ("I just wrote something that changes what this endpoint
//! will read").

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::entry::CacheEntry;
use crate::error::Result;
use crate::key::{cache_key, expand_template, Identifier};
use crate::storage::Storage;
use crate::store::CacheStore;
use crate::transport::{QueryArgs, Transport};

/// Default entry lifetime: 30 minutes.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Fixed per-endpoint configuration.
///
/// `authenticated` decides whether [`Client::endpoint`](crate::Client::endpoint)
/// wires the endpoint through the session-injecting transport or the bare
/// one; it defaults to `true`.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    slot: String,
    url_template: String,
    authenticated: bool,
    lifetime: Duration,
}

impl EndpointConfig {
    /// Configure an endpoint with its storage slot and URL template.
    ///
    /// The template may contain positional `{0}`, `{1}`, ... placeholders
    /// filled from the identifiers of each `get` call.
    pub fn new(slot: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            url_template: url_template.into(),
            authenticated: true,
            lifetime: DEFAULT_LIFETIME,
        }
    }

    /// Whether fetches go through the authenticated transport.
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Entry lifetime; sub-millisecond precision is truncated.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// The configured storage slot.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Whether the fetch path is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Join a relative (`/`-prefixed) template onto a base URL; absolute
    /// templates pass through unchanged.
    pub(crate) fn resolve_against(mut self, base_url: &str) -> Self {
        if self.url_template.starts_with('/') {
            self.url_template = format!("{base_url}{}", self.url_template);
        }
        self
    }
}

/// A remote resource cached in one storage slot, keyed by identifier
/// sequence.
///
/// The payload type `T` is decoded from the backend's JSON; use
/// [`serde_json::Value`] to keep payloads opaque.
pub struct CachedEndpoint<T> {
    slot: String,
    url_template: String,
    lifetime_ms: u64,
    store: CacheStore,
    transport: Arc<dyn Transport>,
    dirty: AtomicBool,
    _payload: PhantomData<fn() -> T>,
}

impl<T> CachedEndpoint<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create an endpoint over the given storage and transport.
    ///
    /// The transport is used as passed; apply session injection before
    /// handing it in (or construct through the client, which does this
    /// according to [`EndpointConfig::is_authenticated`]).
    pub fn new(
        config: EndpointConfig,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            slot: config.slot,
            url_template: config.url_template,
            lifetime_ms: config.lifetime.as_millis() as u64,
            store: CacheStore::new(storage),
            transport,
            dirty: AtomicBool::new(false),
            _payload: PhantomData,
        }
    }

    /// Resolve the value for an identifier sequence.
    ///
    /// Served from the cache when a stored entry is still valid and the
    /// endpoint is not marked dirty; no network access happens on that
    /// path. Otherwise the URL template is expanded with the identifiers,
    /// the remote API is queried, and the response is stored before being
    /// returned. A failed fetch propagates unchanged and leaves the cache
    /// as it was.
    pub async fn get(&self, identifiers: &[Identifier]) -> Result<T> {
        let key = cache_key(identifiers);

        if !self.dirty.load(Ordering::Relaxed) {
            if let Some(entry) = self.store.get(&self.slot, &key) {
                if entry.is_valid_now() {
                    match serde_json::from_value(entry.value) {
                        Ok(value) => {
                            debug!(slot = %self.slot, %key, "cache hit");
                            return Ok(value);
                        }
                        Err(err) => {
                            // Stored under an older payload shape; refetch.
                            warn!(slot = %self.slot, %key, error = %err, "undecodable cache entry, treating as miss");
                        }
                    }
                } else {
                    debug!(slot = %self.slot, %key, "cache entry expired");
                }
            }
        }

        let url = expand_template(&self.url_template, identifiers);
        let raw = self.transport.get(&url, &QueryArgs::new()).await?;
        let value: T = serde_json::from_value(raw.clone())?;
        self.store_raw(&key, raw);
        Ok(value)
    }

    /// Store a value for an identifier sequence directly.
    ///
    /// Used by callers that already hold a fresh value (a preceding write,
    /// a push notification). Clears the dirty flag like a fetched store
    /// does.
    pub fn insert(&self, value: &T, identifiers: &[Identifier]) -> Result<()> {
        let raw = serde_json::to_value(value)?;
        self.store_raw(&cache_key(identifiers), raw);
        Ok(())
    }

    fn store_raw(&self, key: &str, raw: serde_json::Value) {
        self.store
            .put(&self.slot, key, CacheEntry::new(self.lifetime_ms, raw));
        self.dirty.store(false, Ordering::Relaxed);
    }

    /// Force the next `get`, for any key, to refetch regardless of entry
    /// freshness. Transient and in-memory; persisted entries are untouched.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Whether the endpoint is currently marked dirty.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Remove the endpoint's entire storage slot. The dirty flag is not
    /// affected.
    pub fn clear(&self) {
        self.store.clear(&self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = EndpointConfig::new("accounts", "https://api.example.com/account/{0}");

        assert_eq!(config.slot(), "accounts");
        assert!(config.is_authenticated());
        assert_eq!(config.lifetime, DEFAULT_LIFETIME);
    }

    #[test]
    fn config_overrides() {
        let config = EndpointConfig::new("customers", "https://api.example.com/customer/{0}")
            .authenticated(false)
            .lifetime(Duration::from_secs(15));

        assert!(!config.is_authenticated());
        assert_eq!(config.lifetime, Duration::from_secs(15));
    }
}
