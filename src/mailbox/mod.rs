//! Mailbox client
//!
//! Paginated header listing, full-message retrieval, and flag/folder
//! mutation against a per-account mailbox store.
//!
//! Read paths collapse every failure to "no data": `list` returns an empty
//! vec and `fetch_full` returns `None` whether the folder was empty, the
//! message was missing, or the store was unreachable. Callers pair the
//! result with their own loading flag; there is no separate error signal.
//! Failures are still logged at `warn` for diagnosis.

pub mod guard;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::accounts::AccountManager;
use crate::config::CoreConfig;
use crate::types::error::{MailError, Result};
use crate::types::{Folder, FullMessage, MessagePatch, StoredMessage};

/// HTTP client for mailbox stores
pub struct MailboxClient {
    http: reqwest::Client,
    store_base: Url,
    accounts: Arc<AccountManager>,
}

#[derive(Deserialize, Default)]
struct ListResponse {
    #[serde(default)]
    emails: Vec<StoredMessage>,
}

#[derive(Deserialize)]
struct FetchResponse {
    email: StoredMessage,
    #[serde(default, rename = "bodyHtml")]
    body_html: Option<String>,
    #[serde(default, rename = "bodyText")]
    body_text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MutateBody<'a> {
    user_email: &'a str,
    #[serde(flatten)]
    patch: &'a MessagePatch,
}

impl MailboxClient {
    pub fn new(store_base: Url, timeout: Duration, accounts: Arc<AccountManager>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            store_base,
            accounts,
        })
    }

    pub fn from_config(config: &CoreConfig, accounts: Arc<AccountManager>) -> Result<Self> {
        Self::new(config.store_base()?, config.request_timeout(), accounts)
    }

    /// Three-tier store resolution, identical for every call
    ///
    /// Explicit override, else the account's configured endpoint, else the
    /// system default store. An unparseable URL at one tier falls through
    /// to the next.
    fn resolve_store(&self, account_email: &str, endpoint_override: Option<&str>) -> Url {
        if let Some(endpoint) = endpoint_override {
            match Url::parse(endpoint) {
                Ok(url) => return url,
                Err(e) => warn!("Ignoring invalid endpoint override {}: {}", endpoint, e),
            }
        }

        if let Some(account) = self.accounts.find_by_email(account_email) {
            if let Some(endpoint) = account.mailbox_endpoint {
                match Url::parse(&endpoint) {
                    Ok(url) => return url,
                    Err(e) => warn!(
                        "Ignoring invalid mailbox endpoint for {}: {}",
                        account_email, e
                    ),
                }
            }
        }

        self.store_base.clone()
    }

    fn emails_url(&self, base: &Url, message_id: Option<&str>) -> Result<Url> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| MailError::Config("Store URL cannot be a base".to_string()))?;
            segments.pop_if_empty().push("emails");
            if let Some(id) = message_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Header-only page of a folder, newest first per the store's ordering
    ///
    /// `Folder::Starred` is a server-side filter over the starred flag
    /// across all folders. Any failure yields an empty vec.
    pub async fn list(
        &self,
        account_email: &str,
        folder: Folder,
        limit: u32,
        offset: u32,
        endpoint_override: Option<&str>,
    ) -> Vec<StoredMessage> {
        let base = self.resolve_store(account_email, endpoint_override);
        let mut url = match self.emails_url(&base, None) {
            Ok(url) => url,
            Err(e) => {
                warn!("Bad store URL {}: {}", base, e);
                return Vec::new();
            }
        };
        url.query_pairs_mut()
            .append_pair("user", account_email)
            .append_pair("folder", folder.as_str())
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());

        let resp = match self.http.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Mailbox list failed for {}: {}", account_email, e);
                return Vec::new();
            }
        };
        if !resp.status().is_success() {
            warn!("Mailbox list failed for {}: HTTP {}", account_email, resp.status());
            return Vec::new();
        }

        match resp.json::<ListResponse>().await {
            Ok(body) => body.emails,
            Err(e) => {
                warn!("Mailbox list parse failed for {}: {}", account_email, e);
                Vec::new()
            }
        }
    }

    /// Full message with bodies; `None` on not-found or any failure
    pub async fn fetch_full(
        &self,
        account_email: &str,
        message_id: &str,
        endpoint_override: Option<&str>,
    ) -> Option<FullMessage> {
        let base = self.resolve_store(account_email, endpoint_override);
        let mut url = self.emails_url(&base, Some(message_id)).ok()?;
        url.query_pairs_mut().append_pair("user", account_email);

        let resp = match self.http.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Mailbox fetch failed for {}: {}", message_id, e);
                return None;
            }
        };
        if !resp.status().is_success() {
            return None;
        }

        let body: FetchResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Mailbox fetch parse failed for {}: {}", message_id, e);
                return None;
            }
        };

        Some(FullMessage {
            message: body.email,
            body_html: body.body_html,
            body_text: body.body_text,
        })
    }

    /// Apply a partial update to a message; the server is authoritative
    /// under concurrent mutation (last write wins)
    pub async fn mutate(
        &self,
        account_email: &str,
        message_id: &str,
        patch: MessagePatch,
        endpoint_override: Option<&str>,
    ) -> bool {
        let base = self.resolve_store(account_email, endpoint_override);
        let Ok(url) = self.emails_url(&base, Some(message_id)) else {
            return false;
        };

        let body = MutateBody {
            user_email: account_email,
            patch: &patch,
        };
        match self.http.put(url).json(&body).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("Mailbox update failed for {}: {}", message_id, e);
                false
            }
        }
    }

    /// Delete a message from the store
    pub async fn delete(
        &self,
        account_email: &str,
        message_id: &str,
        endpoint_override: Option<&str>,
    ) -> bool {
        let base = self.resolve_store(account_email, endpoint_override);
        let Ok(mut url) = self.emails_url(&base, Some(message_id)) else {
            return false;
        };
        url.query_pairs_mut().append_pair("user", account_email);

        match self.http.delete(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("Mailbox delete failed for {}: {}", message_id, e);
                false
            }
        }
    }
}
