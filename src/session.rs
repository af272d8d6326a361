//! Session wiring
//!
//! Builds the sync core once per authenticated session: one account
//! manager with its injected cache and sync queue, one mailbox client, one
//! send router, all sharing the same configuration. Consumers hold the
//! session and pass the pieces by reference.
//!
//! Must be constructed on a tokio runtime; the cloud sync worker is
//! spawned at build time.

use std::sync::Arc;

use crate::accounts::{bootstrap_accounts, AccountManager};
use crate::cache::{AccountCache, FileAccountCache};
use crate::cloud::queue::{self, RetryPolicy};
use crate::cloud::CloudClient;
use crate::config::CoreConfig;
use crate::mailbox::MailboxClient;
use crate::send::SendRouter;
use crate::types::error::Result;
use crate::types::Account;

/// One authenticated user's sync core
pub struct Session {
    cache: Arc<dyn AccountCache>,
    cloud: CloudClient,
    accounts: Arc<AccountManager>,
    mailbox: MailboxClient,
    send: SendRouter,
}

impl Session {
    /// Build a session over the default file-backed cache
    pub fn new(config: &CoreConfig, user_email: impl Into<String>) -> Result<Self> {
        let cache: Arc<dyn AccountCache> = Arc::new(FileAccountCache::new(config.cache_path()));
        Self::with_cache(config, user_email, cache)
    }

    /// Build a session over an injected cache
    pub fn with_cache(
        config: &CoreConfig,
        user_email: impl Into<String>,
        cache: Arc<dyn AccountCache>,
    ) -> Result<Self> {
        let user_email = user_email.into();
        let cloud = CloudClient::from_config(config)?;
        let sync = queue::spawn(cloud.clone(), user_email.clone(), RetryPolicy::default());

        let accounts =
            Arc::new(AccountManager::new(cache.clone(), user_email).with_sync(sync));
        let mailbox = MailboxClient::from_config(config, accounts.clone())?;
        let send = SendRouter::from_config(config, accounts.clone())?;

        Ok(Self {
            cache,
            cloud,
            accounts,
            mailbox,
            send,
        })
    }

    /// Hydrate the account list, once, before any mailbox access
    pub async fn bootstrap(&self) -> Vec<Account> {
        bootstrap_accounts(
            self.cache.as_ref(),
            &self.cloud,
            self.accounts.user_email(),
        )
        .await
    }

    pub fn accounts(&self) -> &Arc<AccountManager> {
        &self.accounts
    }

    pub fn mailbox(&self) -> &MailboxClient {
        &self.mailbox
    }

    pub fn sender(&self) -> &SendRouter {
        &self.send
    }

    pub fn cloud(&self) -> &CloudClient {
        &self.cloud
    }
}
