//! Account resource wrappers.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::SELF_ALIAS;
use crate::error::Result;
use crate::transport::{QueryArgs, Transport};

/// A new account to be created.
///
/// The required fields are required by construction; there is no partially
/// initialized state to validate at call time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// Owning customer id.
    pub customer: i64,
    /// Unique account name.
    pub name: String,
    /// Contact email address.
    pub email: String,
    /// Initial password; server-generated when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passwd: Option<String>,
    /// Backing user id, if pre-existing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
}

impl NewAccount {
    /// Create an account body with the required fields.
    pub fn new(customer: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            customer,
            name: name.into(),
            email: email.into(),
            passwd: None,
            user: None,
        }
    }

    /// Set the initial password.
    pub fn passwd(mut self, passwd: impl Into<String>) -> Self {
        self.passwd = Some(passwd.into());
        self
    }

    /// Set the backing user id.
    pub fn user(mut self, user: i64) -> Self {
        self.user = Some(user);
        self
    }
}

/// A partial account update; only the set fields are transmitted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    /// New contact email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passwd: Option<String>,
    /// New account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Grant or revoke administrative rights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    /// Move the account to another customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<i64>,
    /// Rebind the backing user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    /// Reset the failed-login counter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_logins: Option<u32>,
    /// Lock the account until the given instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<String>,
    /// Disable or re-enable the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

/// Account CRUD calls. All requests are authenticated.
pub struct AccountsApi {
    base_url: String,
    auth: Arc<dyn Transport>,
}

impl AccountsApi {
    pub(crate) fn new(base_url: String, auth: Arc<dyn Transport>) -> Self {
        Self { base_url, auth }
    }

    fn url(&self, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("{}/account/{name}", self.base_url),
            None => format!("{}/account", self.base_url),
        }
    }

    /// List the accounts visible to the caller.
    pub async fn list(&self) -> Result<Value> {
        self.auth.get(&self.url(None), &QueryArgs::new()).await
    }

    /// Fetch one account; `None` targets the caller's own.
    pub async fn get(&self, name: Option<&str>) -> Result<Value> {
        let name = name.unwrap_or(SELF_ALIAS);
        self.auth.get(&self.url(Some(name)), &QueryArgs::new()).await
    }

    /// Create an account.
    pub async fn add(&self, account: &NewAccount) -> Result<Value> {
        let body = serde_json::to_value(account)?;
        self.auth.post(&self.url(None), &QueryArgs::new(), body).await
    }

    /// Apply a partial update; `None` targets the caller's own account.
    pub async fn patch(&self, name: Option<&str>, patch: &AccountPatch) -> Result<Value> {
        let name = name.unwrap_or(SELF_ALIAS);
        let body = serde_json::to_value(patch)?;
        self.auth
            .patch(&self.url(Some(name)), &QueryArgs::new(), body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_account_omits_unset_optionals() {
        let account = NewAccount::new(1032, "jdoe", "jdoe@example.com");
        let body = serde_json::to_value(&account).unwrap();

        assert_eq!(
            body,
            json!({"customer": 1032, "name": "jdoe", "email": "jdoe@example.com"})
        );
    }

    #[test]
    fn new_account_with_optionals() {
        let account = NewAccount::new(1032, "jdoe", "jdoe@example.com")
            .passwd("secret")
            .user(17);
        let body = serde_json::to_value(&account).unwrap();

        assert_eq!(body["passwd"], "secret");
        assert_eq!(body["user"], 17);
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = AccountPatch {
            email: Some("new@example.com".to_string()),
            failed_logins: Some(0),
            ..AccountPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();

        assert_eq!(
            body,
            json!({"email": "new@example.com", "failedLogins": 0})
        );
    }
}
