//! Cloud account sync client
//!
//! Talks to the remote account service, which alone holds credentials.
//! Account metadata flows both ways; a credential flows only upward on a
//! push and is never read back.
//!
//! Callers that mutate local state go through the [`queue`] rather than
//! calling this client directly: cloud state is eventual, local state is
//! authoritative for the session, and a failed cloud write must never roll
//! back a local mutation.

pub mod queue;

use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::CoreConfig;
use crate::types::error::{MailError, Result};
use crate::types::{Account, SendOutcome};

/// HTTP client for the remote account service
#[derive(Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    user_email: &'a str,
    account: &'a Account,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_password: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncBody<'a> {
    user_email: &'a str,
    accounts: &'a [Account],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserBody<'a> {
    user_email: &'a str,
}

#[derive(serde::Deserialize, Default)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<Account>,
}

impl CloudClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        Self::new(config.api_base()?, config.request_timeout())
    }

    /// Endpoint under the configured base, preserving any base path prefix
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| MailError::Config("API base URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            for segment in path.split('/') {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    /// Upsert one account's metadata, forwarding a new credential when given
    ///
    /// The credential is write-only: the service stores it keyed by account
    /// id and no read path ever returns it.
    pub async fn push(
        &self,
        user_email: &str,
        account: &Account,
        app_password: Option<&str>,
    ) -> Result<()> {
        let body = PushBody {
            user_email,
            account,
            app_password,
        };
        let resp = self
            .http
            .post(self.endpoint("email-accounts")?)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MailError::Api(format!(
                "Account push failed: HTTP {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Delete the remote record for an account id
    pub async fn remove(&self, user_email: &str, account_id: &str) -> Result<()> {
        let mut url = self.endpoint("email-accounts")?;
        url.query_pairs_mut()
            .append_pair("user", user_email)
            .append_pair("id", account_id);

        let resp = self.http.delete(url).send().await?;
        if !resp.status().is_success() {
            return Err(MailError::Api(format!(
                "Account delete failed: HTTP {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Fetch remote account metadata (credentials never included)
    ///
    /// `None` means "absent": the service could not be reached or answered
    /// with an error, so there is nothing to hydrate from. A reachable
    /// service yields `Some`, even when the list is empty.
    pub async fn pull(&self, user_email: &str) -> Option<Vec<Account>> {
        match self.try_pull(user_email).await {
            Ok(accounts) => Some(accounts),
            Err(e) => {
                debug!("Cloud account pull unavailable: {}", e);
                None
            }
        }
    }

    async fn try_pull(&self, user_email: &str) -> Result<Vec<Account>> {
        let mut url = self.endpoint("email-accounts")?;
        url.query_pairs_mut().append_pair("user", user_email);

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(MailError::Api(format!(
                "Account list failed: HTTP {}",
                resp.status()
            )));
        }

        let body: AccountsResponse = resp.json().await?;
        Ok(body.accounts)
    }

    /// Bulk-replace remote metadata with the full local list
    ///
    /// Full replace, not a merge; stored credentials are untouched because
    /// none are sent.
    pub async fn sync_all(&self, user_email: &str, accounts: &[Account]) -> Result<()> {
        let body = SyncBody {
            user_email,
            accounts,
        };
        let resp = self
            .http
            .put(self.endpoint("email-accounts/sync")?)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MailError::Api(format!(
                "Account sync failed: HTTP {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Trigger a manual inbox sync for the user's Gmail accounts
    pub async fn sync_now(&self, user_email: &str) -> SendOutcome {
        let url = match self.endpoint("gmail/sync-now") {
            Ok(url) => url,
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        let resp = match self
            .http
            .post(url)
            .json(&UserBody { user_email })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(_) => {
                return SendOutcome::failure("Network error — could not reach sync service")
            }
        };

        let status = resp.status();
        let body: SendOutcome = resp.json().await.unwrap_or_default();
        if !status.is_success() || !body.success {
            return SendOutcome::failure(
                body.error
                    .unwrap_or_else(|| "Failed to sync Gmail inbox".to_string()),
            );
        }
        SendOutcome::ok()
    }

    /// Liveness probe against the account service
    pub async fn health(&self) -> bool {
        let url = match self.endpoint("health") {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.http.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account(id: &str, email: &str) -> Account {
        Account {
            id: id.to_string(),
            name: String::new(),
            email: email.to_string(),
            aliases: Vec::new(),
            is_default: true,
            has_password: false,
            mailbox_endpoint: None,
            account_type: AccountType::Gmail,
        }
    }

    async fn client_for(server: &MockServer) -> CloudClient {
        CloudClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_push_includes_credential_only_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email-accounts"))
            .and(body_partial_json(serde_json::json!({
                "userEmail": "me@x.com",
                "appPassword": "s3cret",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .push("me@x.com", &account("1", "a@x.com"), Some("s3cret"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_push_without_credential_omits_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email-accounts"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .push("me@x.com", &account("1", "a@x.com"), None)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("appPassword").is_none());
    }

    #[tokio::test]
    async fn test_pull_present_and_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/email-accounts"))
            .and(query_param("user", "me@x.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accounts": [account("1", "a@x.com")]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let pulled = client.pull("me@x.com").await.unwrap();
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].email, "a@x.com");

        // Server error reads as absent, not as an empty synced state
        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/email-accounts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&failing)
            .await;
        assert!(client_for(&failing).await.pull("me@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_pull_empty_list_is_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/email-accounts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accounts": [] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.pull("me@x.com").await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/email-accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accounts": [account("1", "a@x.com")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let client = CloudClient::new(base, Duration::from_secs(2)).unwrap();

        let pulled = client.pull("me@x.com").await.unwrap();
        assert_eq!(pulled.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_sends_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/email-accounts"))
            .and(query_param("user", "me@x.com"))
            .and(query_param("id", "acct-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.remove("me@x.com", "acct-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_all_puts_full_list() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/email-accounts/sync"))
            .and(body_partial_json(serde_json::json!({
                "userEmail": "me@x.com",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let accounts = vec![account("1", "a@x.com"), account("2", "b@x.com")];
        client.sync_all("me@x.com", &accounts).await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_now_maps_failure_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/sync-now"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "no gmail account",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client.sync_now("me@x.com").await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("no gmail account"));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true
            })))
            .mount(&server)
            .await;

        assert!(client_for(&server).await.health().await);
    }
}
