//! Customer resource wrappers.

use serde_json::Value;
use std::sync::Arc;

use super::SELF_ALIAS;
use crate::error::Result;
use crate::transport::{QueryArgs, Transport};

/// Customer read calls.
///
/// Customer data and logos are served without session injection; the
/// backend scopes them by other means.
pub struct CustomersApi {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl CustomersApi {
    pub(crate) fn new(base_url: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    /// Fetch one customer; `None` targets the caller's own.
    pub async fn get(&self, customer: Option<&str>) -> Result<Value> {
        let customer = customer.unwrap_or(SELF_ALIAS);
        let url = format!("{}/customer/{customer}", self.base_url);
        self.transport.get(&url, &QueryArgs::new()).await
    }

    /// Fetch the current customer's logo.
    pub async fn logo(&self) -> Result<Value> {
        let url = format!("{}/customer-logo", self.base_url);
        self.transport.get(&url, &QueryArgs::new()).await
    }
}
