#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # cachepoint
//!
//! Client library for a remote account/session/customer API with a
//! slot-based response cache and persistent session handling.
//!
//! Reads go through [`CachedEndpoint`]s: a stored response is served as
//! long as its lifetime holds and the endpoint has not been marked dirty;
//! anything else falls through to the backend, and the response is stored
//! before it is returned. Sessions live in their own storage slot and are
//! injected into authenticated requests as a `session` query parameter.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cachepoint::{Client, EndpointConfig, Identifier};
//! use serde_json::Value;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> cachepoint::Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")
//!         .build()?;
//!
//!     client.sessions().login("jdoe", "secret").await?;
//!
//!     let accounts = client.endpoint::<Value>(
//!         EndpointConfig::new("accounts", "/account/{0}")
//!             .lifetime(Duration::from_secs(15 * 60)),
//!     );
//!
//!     // First call fetches; later calls inside the lifetime are served
//!     // from storage without network access.
//!     let account = accounts.get(&[Identifier::from("!")]).await?;
//!     println!("account: {account}");
//!
//!     // After a write that affects this endpoint's reads:
//!     accounts.mark_dirty();
//!     Ok(())
//! }
//! ```
//!
//! ## Storage
//!
//! Storage is pluggable through the [`Storage`] trait. [`MemoryStorage`]
//! (the default) keeps slots in a shared map; [`FileStorage`] keeps one
//! file per slot. Corrupt slot contents are never an error: buckets read
//! as empty and a missing or unreadable session record reads as
//! [`Error::NotLoggedIn`].

pub mod api;
pub mod client;
pub mod endpoint;
pub mod entry;
pub mod error;
pub mod key;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;

pub use api::{AccountPatch, AccountsApi, CustomersApi, NewAccount, ServiceGrant, ServicesApi};
pub use client::{Client, ClientBuilder};
pub use endpoint::{CachedEndpoint, EndpointConfig, DEFAULT_LIFETIME};
pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use key::{cache_key, expand_template, Identifier};
pub use session::{SessionRecord, SessionStore, SessionsApi};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{Bucket, CacheStore};
pub use transport::{AuthTransport, HttpTransport, Method, QueryArgs, Transport};
