//! Service resource wrappers.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::transport::{QueryArgs, Transport};

/// A service grant: which service to enable, and for whom.
///
/// The grantee decides the sub-resource the grant is posted to.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServiceGrant {
    /// Grant a service to a whole customer.
    Customer {
        /// Customer id.
        customer: i64,
        /// Service name.
        service: String,
    },
    /// Grant a service to a single account.
    Account {
        /// Account name.
        account: String,
        /// Service name.
        service: String,
    },
}

impl ServiceGrant {
    fn grantee(&self) -> &'static str {
        match self {
            ServiceGrant::Customer { .. } => "customer",
            ServiceGrant::Account { .. } => "account",
        }
    }
}

/// Service listing and granting calls. All requests are authenticated.
pub struct ServicesApi {
    base_url: String,
    auth: Arc<dyn Transport>,
}

impl ServicesApi {
    pub(crate) fn new(base_url: String, auth: Arc<dyn Transport>) -> Self {
        Self { base_url, auth }
    }

    fn url(&self, endpoint: Option<&str>) -> String {
        match endpoint {
            Some(endpoint) => format!("{}/service/{endpoint}", self.base_url),
            None => format!("{}/service", self.base_url),
        }
    }

    /// List the available services.
    pub async fn list(&self) -> Result<Value> {
        self.auth.get(&self.url(None), &QueryArgs::new()).await
    }

    /// List the services enabled for the caller's customer.
    pub async fn list_customer_services(&self) -> Result<Value> {
        self.auth
            .get(&self.url(Some("customer")), &QueryArgs::new())
            .await
    }

    /// List the services enabled for the caller's account.
    pub async fn list_account_services(&self) -> Result<Value> {
        self.auth
            .get(&self.url(Some("account")), &QueryArgs::new())
            .await
    }

    /// Grant a service to a customer or account.
    pub async fn add(&self, grant: &ServiceGrant) -> Result<Value> {
        let url = self.url(Some(grant.grantee()));
        let body = serde_json::to_value(grant)?;
        self.auth.post(&url, &QueryArgs::new(), body).await
    }
}
