//! Resource APIs: thin wrappers that format a URL and delegate to the
//! transport. All state lives in the client; these values are cheap to
//! create per call.

mod account;
mod customer;
mod service;

pub use account::{AccountPatch, AccountsApi, NewAccount};
pub use customer::CustomersApi;
pub use service::{ServiceGrant, ServicesApi};

/// Resource alias the backend resolves to "the caller's own".
pub(crate) const SELF_ALIAS: &str = "!";
