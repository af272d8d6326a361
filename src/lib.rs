//! mailbridge - account and mailbox synchronization core
//!
//! The reconciliation core of a browser-resident email client: account
//! metadata lives in a fast local cache (never holding secrets) and in a
//! remote account service (which alone holds credentials); mailbox
//! contents live in per-account remote stores.
//!
//! ## Module Organization
//!
//! - `types/`: Data structures and the serializable error type
//! - `config/`: TOML configuration management
//! - `cache/`: Local account cache (metadata only, atomic replace)
//! - `accounts/`: Account manager and session bootstrap
//! - `cloud/`: Account service client and the background sync queue
//! - `mailbox/`: Mailbox store client and the stale-response guard
//! - `send/`: Outbound transport routing
//! - `session`: Per-session wiring of the above

pub mod accounts;
pub mod cache;
pub mod cloud;
pub mod config;
pub mod mailbox;
pub mod send;
pub mod session;
pub mod types;

pub use accounts::{bootstrap_accounts, AccountManager};
pub use cache::{AccountCache, FileAccountCache, MemoryAccountCache};
pub use cloud::queue::{RetryPolicy, SyncHandle, SyncJob};
pub use cloud::CloudClient;
pub use config::{load_config, CoreConfig};
pub use mailbox::guard::{RequestGuard, RequestToken};
pub use mailbox::MailboxClient;
pub use send::SendRouter;
pub use session::Session;
pub use types::error::{MailError, Result};
pub use types::{
    Account, AccountDraft, AccountPatch, AccountType, Folder, FullMessage, MessagePatch,
    SendOutcome, SendRequest, StoredMessage,
};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for logging
///
/// Defaults to debug-level output for this crate in debug builds; override
/// with `RUST_LOG`. Safe to call when a subscriber is already installed.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("mailbridge=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
