//! Session record persistence and lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::transport::{QueryArgs, Transport};

/// Token alias the backend resolves to "the session of this request".
const SELF_ALIAS: &str = "!";

/// A persisted session: the credential token plus whatever metadata the
/// backend attached (expiry, account info). The metadata is round-tripped
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque credential string identifying the caller.
    pub token: String,
    /// Server-provided metadata, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    /// Create a record carrying only a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            extra: Map::new(),
        }
    }
}

/// Persists the session record in one fixed storage slot, independent of
/// any cache bucket.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    slot: String,
}

impl SessionStore {
    /// Create a store writing to the given slot.
    pub fn new(storage: Arc<dyn Storage>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
        }
    }

    /// The slot name this store writes to.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Read the current session record.
    ///
    /// Fails with [`Error::NotLoggedIn`] when the slot is empty. A record
    /// that no longer parses counts as absent.
    pub fn get(&self) -> Result<SessionRecord> {
        let raw = self.storage.read(&self.slot).ok_or(Error::NotLoggedIn)?;
        serde_json::from_str(&raw).map_err(|err| {
            warn!(slot = %self.slot, error = %err, "discarding malformed session record");
            Error::NotLoggedIn
        })
    }

    /// Read the current session token.
    pub fn token(&self) -> Result<String> {
        Ok(self.get()?.token)
    }

    /// Overwrite the session record.
    pub fn set(&self, record: &SessionRecord) {
        match serde_json::to_string(record) {
            Ok(raw) => self.storage.write(&self.slot, &raw),
            Err(err) => warn!(slot = %self.slot, error = %err, "failed to serialize session record"),
        }
    }

    /// Delete the session record, returning what was present.
    pub fn remove(&self) -> Option<SessionRecord> {
        let raw = self.storage.remove(&self.slot)?;
        serde_json::from_str(&raw).ok()
    }
}

/// Session lifecycle calls against the backend's `/session` resource.
///
/// Obtained from [`Client::sessions`](crate::Client::sessions).
pub struct SessionsApi {
    base_url: String,
    transport: Arc<dyn Transport>,
    auth: Arc<dyn Transport>,
    store: SessionStore,
}

impl SessionsApi {
    pub(crate) fn new(
        base_url: String,
        transport: Arc<dyn Transport>,
        auth: Arc<dyn Transport>,
        store: SessionStore,
    ) -> Self {
        Self {
            base_url,
            transport,
            auth,
            store,
        }
    }

    fn url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("{}/session/{token}", self.base_url),
            None => format!("{}/session", self.base_url),
        }
    }

    /// Open a session with account credentials.
    ///
    /// On success the returned record is persisted and used for all
    /// subsequent authenticated requests.
    pub async fn login(&self, account: &str, passwd: &str) -> Result<SessionRecord> {
        let body = json!({ "account": account, "passwd": passwd });
        let response = self
            .transport
            .post(&self.url(None), &QueryArgs::new(), body)
            .await?;

        let record: SessionRecord = serde_json::from_value(response)?;
        self.store.set(&record);
        debug!("session opened");
        Ok(record)
    }

    /// List the account's active sessions.
    pub async fn list(&self) -> Result<Value> {
        self.auth.get(&self.url(None), &QueryArgs::new()).await
    }

    /// Fetch session data; `None` targets the current session.
    pub async fn get(&self, token: Option<&str>) -> Result<Value> {
        let token = token.unwrap_or(SELF_ALIAS);
        self.auth.get(&self.url(Some(token)), &QueryArgs::new()).await
    }

    /// Refresh a session; `None` targets the current session.
    ///
    /// On success the stored record is replaced with the refreshed one.
    pub async fn refresh(&self, token: Option<&str>) -> Result<SessionRecord> {
        let token = token.unwrap_or(SELF_ALIAS);
        let response = self
            .auth
            .put(&self.url(Some(token)), &QueryArgs::new(), None)
            .await?;

        let record: SessionRecord = serde_json::from_value(response)?;
        self.store.set(&record);
        debug!("session refreshed");
        Ok(record)
    }

    /// Close a session; `None` targets the current session.
    ///
    /// When the closed session is the current one, the stored record is
    /// removed and returned. A 404/410 from the server means the session is
    /// already gone, which ends in the same state as a successful close and
    /// is not an error. Any other failure propagates and leaves the local
    /// record in place.
    pub async fn close(&self, token: Option<&str>) -> Result<Option<SessionRecord>> {
        let target = token.unwrap_or(SELF_ALIAS);
        match self
            .auth
            .delete(&self.url(Some(target)), &QueryArgs::new())
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_gone() => {
                debug!("session already gone on server");
            }
            Err(err) => return Err(err),
        }

        let stored = self.store.get().ok();
        let closes_current = token.is_none() || stored.as_ref().map(|r| r.token.as_str()) == token;
        if closes_current {
            Ok(self.store.remove())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use assert_matches::assert_matches;

    fn store() -> (SessionStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SessionStore::new(storage.clone(), "session"), storage)
    }

    #[test]
    fn empty_slot_reads_as_not_logged_in() {
        let (sessions, _) = store();
        assert_matches!(sessions.get(), Err(Error::NotLoggedIn));
        assert_matches!(sessions.token(), Err(Error::NotLoggedIn));
    }

    #[test]
    fn set_then_token_round_trips() {
        let (sessions, _) = store();
        sessions.set(&SessionRecord::new("abc"));

        assert_eq!(sessions.token().unwrap(), "abc");
    }

    #[test]
    fn extra_fields_survive_round_trip() {
        let (sessions, _) = store();
        let mut record = SessionRecord::new("abc");
        record
            .extra
            .insert("end".to_string(), Value::String("2026-08-06T12:00:00".to_string()));
        sessions.set(&record);

        assert_eq!(sessions.get().unwrap(), record);
    }

    #[test]
    fn malformed_record_reads_as_not_logged_in() {
        let (sessions, storage) = store();
        storage.write("session", "{broken");

        assert_matches!(sessions.get(), Err(Error::NotLoggedIn));
    }

    #[test]
    fn remove_returns_the_previous_record() {
        let (sessions, _) = store();
        sessions.set(&SessionRecord::new("abc"));

        let removed = sessions.remove().unwrap();
        assert_eq!(removed.token, "abc");
        assert_matches!(sessions.get(), Err(Error::NotLoggedIn));
        assert_eq!(sessions.remove(), None);
    }
}
