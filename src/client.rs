//! Client configuration root.

use std::sync::Arc;
use url::Url;

use crate::api::{AccountsApi, CustomersApi, ServicesApi};
use crate::endpoint::{CachedEndpoint, EndpointConfig};
use crate::error::Result;
use crate::session::{SessionStore, SessionsApi};
use crate::storage::{MemoryStorage, Storage};
use crate::transport::{AuthTransport, HttpTransport, Transport};

/// Default storage slot for the session record.
const DEFAULT_SESSION_SLOT: &str = "session";

/// API client: base URL, storage backend and transports, shared by every
/// endpoint and resource API created from it.
///
/// All configuration is explicit and instance-local; two clients with
/// separate storage never observe each other.
///
/// # Example
///
/// ```no_run
/// use cachepoint::Client;
///
/// # async fn example() -> cachepoint::Result<()> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .build()?;
///
/// let session = client.sessions().login("jdoe", "secret").await?;
/// println!("logged in as {}", session.token);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    auth: Arc<dyn Transport>,
    sessions: SessionStore,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The session record store.
    pub fn session_store(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// The bare (unauthenticated) transport.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.inner.transport.clone()
    }

    /// The session-injecting transport.
    pub fn auth_transport(&self) -> Arc<dyn Transport> {
        self.inner.auth.clone()
    }

    /// Access the session lifecycle API.
    pub fn sessions(&self) -> SessionsApi {
        SessionsApi::new(
            self.inner.base_url.clone(),
            self.inner.transport.clone(),
            self.inner.auth.clone(),
            self.inner.sessions.clone(),
        )
    }

    /// Access the accounts API.
    pub fn accounts(&self) -> AccountsApi {
        AccountsApi::new(self.inner.base_url.clone(), self.inner.auth.clone())
    }

    /// Access the customers API.
    pub fn customers(&self) -> CustomersApi {
        CustomersApi::new(self.inner.base_url.clone(), self.inner.transport.clone())
    }

    /// Access the services API.
    pub fn services(&self) -> ServicesApi {
        ServicesApi::new(self.inner.base_url.clone(), self.inner.auth.clone())
    }

    /// Create a cached endpoint from its configuration.
    ///
    /// A template starting with `/` is joined onto the client's base URL;
    /// an absolute template is used as-is. The endpoint fetches through the
    /// authenticated or bare transport per
    /// [`EndpointConfig::is_authenticated`].
    pub fn endpoint<T>(&self, config: EndpointConfig) -> CachedEndpoint<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let transport = if config.is_authenticated() {
            self.inner.auth.clone()
        } else {
            self.inner.transport.clone()
        };
        let config = config.resolve_against(&self.inner.base_url);
        CachedEndpoint::new(config, self.inner.storage.clone(), transport)
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    base_url: Option<String>,
    storage: Option<Arc<dyn Storage>>,
    session_slot: String,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a builder with defaults: in-memory storage, reqwest
    /// transport, session slot `"session"`.
    pub fn new() -> Self {
        Self {
            base_url: None,
            storage: None,
            session_slot: DEFAULT_SESSION_SLOT.to_string(),
            transport: None,
        }
    }

    /// Set the backend base URL (required).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use a specific storage backend instead of fresh in-memory storage.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use a different slot name for the session record.
    pub fn session_slot(mut self, slot: impl Into<String>) -> Self {
        self.session_slot = slot.into();
        self
    }

    /// Use a specific transport instead of the reqwest one. Tests inject
    /// their mock transports here.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<Client> {
        let raw = self.base_url.unwrap_or_default();
        let url = Url::parse(&raw)?;
        let base_url = url.as_str().trim_end_matches('/').to_string();

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };

        let sessions = SessionStore::new(storage.clone(), self.session_slot);
        let auth: Arc<dyn Transport> =
            Arc::new(AuthTransport::new(transport.clone(), sessions.clone()));

        Ok(Client {
            inner: Arc::new(ClientInner {
                base_url,
                storage,
                transport,
                auth,
                sessions,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::error::Error;

    #[test]
    fn build_requires_a_valid_base_url() {
        assert_matches!(Client::builder().build(), Err(Error::Url(_)));
        assert_matches!(
            Client::builder().base_url("not a url").build(),
            Err(Error::Url(_))
        );
    }

    #[test]
    fn base_url_is_normalized() {
        let client = Client::builder()
            .base_url("https://api.example.com/")
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn independent_clients_have_independent_sessions() {
        let a = Client::builder()
            .base_url("https://a.example.com")
            .build()
            .unwrap();
        let b = Client::builder()
            .base_url("https://b.example.com")
            .build()
            .unwrap();

        a.session_store()
            .set(&crate::session::SessionRecord::new("abc"));
        assert_matches!(b.session_store().get(), Err(Error::NotLoggedIn));
    }
}
