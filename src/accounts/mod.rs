//! Account manager
//!
//! Cache-backed CRUD over account metadata. Every operation is synchronous
//! against the local cache and returns the resulting full list; cloud
//! replication rides along as a best-effort background job and never
//! blocks, fails, or rolls back a local mutation.
//!
//! Default-account invariant: at most one account is default, and exactly
//! one whenever the list is non-empty. The one deliberate escape hatch is
//! `set_default` with an unknown id, which demotes everything (see the
//! method docs).

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::AccountCache;
use crate::cloud::queue::{SyncHandle, SyncJob};
use crate::cloud::CloudClient;
use crate::types::{Account, AccountDraft, AccountPatch};

/// Session-scoped account manager with injected cache and sync queue
pub struct AccountManager {
    cache: Arc<dyn AccountCache>,
    sync: Option<SyncHandle>,
    user_email: String,
}

impl AccountManager {
    pub fn new(cache: Arc<dyn AccountCache>, user_email: impl Into<String>) -> Self {
        Self {
            cache,
            sync: None,
            user_email: user_email.into(),
        }
    }

    /// Attach the background sync queue; without one, mutations stay local
    pub fn with_sync(mut self, sync: SyncHandle) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Identity of the authenticated user owning these accounts
    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// Full account list from the cache
    pub fn list(&self) -> Vec<Account> {
        self.cache.read()
    }

    /// Account whose primary address matches `email` (case-sensitive)
    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        self.list().into_iter().find(|a| a.email == email)
    }

    /// Create an account with a fresh id
    ///
    /// A draft marked default demotes all siblings first; the first account
    /// ever added becomes default regardless of the draft. The draft's
    /// credential is forwarded to the cloud push and never cached.
    pub fn add(&self, draft: AccountDraft) -> Vec<Account> {
        let mut accounts = self.list();

        let mut account = Account {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            email: draft.email,
            aliases: dedup_preserving_order(draft.aliases),
            is_default: draft.is_default,
            has_password: draft.app_password.is_some(),
            mailbox_endpoint: draft.mailbox_endpoint,
            account_type: draft.account_type,
        };

        if account.is_default {
            for existing in accounts.iter_mut() {
                existing.is_default = false;
            }
        }
        if accounts.is_empty() {
            account.is_default = true;
        }

        accounts.push(account.clone());
        self.persist(&accounts);
        self.enqueue(SyncJob::Push {
            account,
            app_password: draft.app_password,
        });
        accounts
    }

    /// Merge a field patch onto an existing account
    ///
    /// An unknown id returns the list unchanged. A patch promoting the
    /// account to default demotes all others first; unspecified fields are
    /// preserved.
    pub fn update(&self, id: &str, patch: AccountPatch) -> Vec<Account> {
        let mut accounts = self.list();

        let Some(idx) = accounts.iter().position(|a| a.id == id) else {
            debug!("Update for unknown account id {}, ignoring", id);
            return accounts;
        };

        if patch.is_default == Some(true) {
            for existing in accounts.iter_mut() {
                existing.is_default = false;
            }
        }

        let account = &mut accounts[idx];
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(aliases) = patch.aliases {
            account.aliases = dedup_preserving_order(aliases);
        }
        if let Some(is_default) = patch.is_default {
            account.is_default = is_default;
        }
        if let Some(has_password) = patch.has_password {
            account.has_password = has_password;
        }
        if patch.app_password.is_some() {
            account.has_password = true;
        }
        if let Some(endpoint) = patch.mailbox_endpoint {
            account.mailbox_endpoint = Some(endpoint);
        }
        if let Some(account_type) = patch.account_type {
            account.account_type = account_type;
        }

        let updated = account.clone();
        self.persist(&accounts);
        self.enqueue(SyncJob::Push {
            account: updated,
            app_password: patch.app_password,
        });
        accounts
    }

    /// Delete an account
    ///
    /// Removing the default promotes the first surviving account, keeping
    /// exactly one default on any non-empty list.
    pub fn remove(&self, id: &str) -> Vec<Account> {
        let mut accounts = self.list();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);

        if accounts.len() == before {
            return accounts;
        }

        if !accounts.is_empty() && !accounts.iter().any(|a| a.is_default) {
            accounts[0].is_default = true;
        }

        self.persist(&accounts);
        self.enqueue(SyncJob::Remove {
            account_id: id.to_string(),
        });
        accounts
    }

    /// Make `id` the sole default
    ///
    /// Demotion of the others is unconditional: an unknown id leaves the
    /// list with no default at all. Enqueues a full sync since every record
    /// is touched.
    pub fn set_default(&self, id: &str) -> Vec<Account> {
        let mut accounts = self.list();
        for account in accounts.iter_mut() {
            account.is_default = account.id == id;
        }

        self.persist(&accounts);
        self.enqueue(SyncJob::SyncAll {
            accounts: accounts.clone(),
        });
        accounts
    }

    /// Add a send-as alias; adding one already present is a no-op
    pub fn add_alias(&self, id: &str, alias: &str) -> Vec<Account> {
        let mut accounts = self.list();

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return accounts;
        };
        if account.aliases.iter().any(|a| a == alias) {
            return accounts;
        }

        account.aliases.push(alias.to_string());
        let updated = account.clone();
        self.persist(&accounts);
        self.enqueue(SyncJob::Push {
            account: updated,
            app_password: None,
        });
        accounts
    }

    /// Remove a send-as alias; removing an absent one is a no-op
    pub fn remove_alias(&self, id: &str, alias: &str) -> Vec<Account> {
        let mut accounts = self.list();

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return accounts;
        };
        let before = account.aliases.len();
        account.aliases.retain(|a| a != alias);
        if account.aliases.len() == before {
            return accounts;
        }

        let updated = account.clone();
        self.persist(&accounts);
        self.enqueue(SyncJob::Push {
            account: updated,
            app_password: None,
        });
        accounts
    }

    /// Resolve the acting account
    ///
    /// Explicit id if present, else the default, else the first in list
    /// order. `None` means "no account configured" and callers surface a
    /// configuration prompt, not an error.
    pub fn resolve_active(&self, explicit_id: Option<&str>) -> Option<Account> {
        let accounts = self.list();

        if let Some(id) = explicit_id {
            if let Some(account) = accounts.iter().find(|a| a.id == id) {
                return Some(account.clone());
            }
        }

        accounts
            .iter()
            .find(|a| a.is_default)
            .or_else(|| accounts.first())
            .cloned()
    }

    fn persist(&self, accounts: &[Account]) {
        if let Err(e) = self.cache.write(accounts) {
            warn!("Failed to persist account cache: {}", e);
        }
    }

    fn enqueue(&self, job: SyncJob) {
        if let Some(sync) = &self.sync {
            sync.enqueue(job);
        }
    }
}

fn dedup_preserving_order(aliases: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(aliases.len());
    for alias in aliases {
        if !out.contains(&alias) {
            out.push(alias);
        }
    }
    out
}

/// Hydrate the session's account list, once, before any mailbox fetch
///
/// A non-empty local cache wins as-is and no pull is issued. An empty cache
/// falls back to the cloud: a non-empty pull hydrates the cache, anything
/// else leaves the user with zero accounts and the UI shows its
/// configuration prompt.
pub async fn bootstrap_accounts(
    cache: &dyn AccountCache,
    cloud: &CloudClient,
    user_email: &str,
) -> Vec<Account> {
    let local = cache.read();
    if !local.is_empty() {
        debug!("Bootstrap: {} account(s) from local cache", local.len());
        return local;
    }

    match cloud.pull(user_email).await {
        Some(remote) if !remote.is_empty() => {
            debug!("Bootstrap: hydrating cache with {} account(s) from cloud", remote.len());
            if let Err(e) = cache.write(&remote) {
                warn!("Failed to hydrate account cache: {}", e);
            }
            remote
        }
        _ => Vec::new(),
    }
}
