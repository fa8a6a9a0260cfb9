//! Cache entry value object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A single cached response: the payload together with the instant it was
/// stored and the lifetime it was stored with.
///
/// The lifetime is copied into the entry at write time, so reconfiguring an
/// endpoint never retroactively invalidates entries already on disk.
/// Entries are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the value was stored, in milliseconds since the Unix epoch.
    pub cached_at: u64,
    /// Validity duration in milliseconds.
    pub lifetime: u64,
    /// The cached payload.
    pub value: Value,
}

impl CacheEntry {
    /// Create an entry stored now with the given lifetime.
    pub fn new(lifetime: u64, value: Value) -> Self {
        Self::with_time(now_ms(), lifetime, value)
    }

    /// Create an entry with an explicit storage instant.
    pub fn with_time(cached_at: u64, lifetime: u64, value: Value) -> Self {
        Self {
            cached_at,
            lifetime,
            value,
        }
    }

    /// The instant this entry expires, in milliseconds since the Unix epoch.
    pub fn expires_at(&self) -> u64 {
        self.cached_at + self.lifetime
    }

    /// Whether this entry is still valid at the given instant.
    ///
    /// An entry is valid up to and including its expiration instant.
    pub fn is_valid(&self, now: u64) -> bool {
        now <= self.expires_at()
    }

    /// Whether this entry is valid right now, against the wall clock.
    pub fn is_valid_now(&self) -> bool {
        self.is_valid(now_ms())
    }

    /// How long this entry has been stored at the given instant.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.cached_at)
    }
}
