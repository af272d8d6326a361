//! Send router
//!
//! Resolves the acting account, picks the outbound transport endpoint from
//! its type, and submits the send request. Credentials are resolved
//! entirely server-side, keyed by account id; nothing secret ever rides on
//! this call. The router reports failure through `SendOutcome` and never
//! returns an error.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::accounts::AccountManager;
use crate::config::CoreConfig;
use crate::types::error::{MailError, Result};
use crate::types::{SendOutcome, SendRequest};

const NO_ACCOUNT_ERROR: &str = "No email account configured. Go to Settings to add one.";
const NETWORK_ERROR: &str = "Network error — could not reach email service";

/// Routes outgoing mail to the transport matching the acting account
pub struct SendRouter {
    http: reqwest::Client,
    api_base: Url,
    accounts: Arc<AccountManager>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendBody<'a> {
    user_email: &'a str,
    account_id: &'a str,
    from_email: &'a str,
    to_email: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl SendRouter {
    pub fn new(api_base: Url, timeout: Duration, accounts: Arc<AccountManager>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base,
            accounts,
        })
    }

    pub fn from_config(config: &CoreConfig, accounts: Arc<AccountManager>) -> Result<Self> {
        Self::new(config.api_base()?, config.request_timeout(), accounts)
    }

    /// Send endpoint under the configured base, preserving any base path prefix
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| MailError::Config("API base URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            for segment in path.trim_start_matches('/').split('/') {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    /// Submit a send request as the resolved account
    ///
    /// No resolvable account means a configuration prompt for the user and
    /// zero network calls. `from_email` may name one of the account's
    /// aliases; it defaults to the account's primary address.
    pub async fn send(&self, request: SendRequest) -> SendOutcome {
        let Some(account) = self.accounts.resolve_active(request.account_id.as_deref()) else {
            return SendOutcome::failure(NO_ACCOUNT_ERROR);
        };

        let url = match self.endpoint(account.account_type.send_path()) {
            Ok(url) => url,
            Err(e) => return SendOutcome::failure(format!("Invalid send endpoint: {}", e)),
        };

        let from_email = request.from_email.as_deref().unwrap_or(&account.email);
        let body = SendBody {
            user_email: self.accounts.user_email(),
            account_id: &account.id,
            from_email,
            to_email: &request.to,
            subject: &request.subject,
            html: &request.html,
        };

        let resp = match self.http.post(url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Send failed for account {}: {}", account.id, e);
                return SendOutcome::failure(NETWORK_ERROR);
            }
        };

        let status = resp.status();
        let payload: SendOutcome = resp.json().await.unwrap_or_default();
        if !status.is_success() || !payload.success {
            return SendOutcome::failure(
                payload
                    .error
                    .unwrap_or_else(|| "Failed to send email".to_string()),
            );
        }
        SendOutcome::ok()
    }
}
