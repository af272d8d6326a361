//! Background cloud sync queue
//!
//! Every mutating account operation enqueues a job here instead of awaiting
//! the account service. The worker drains jobs in order and applies a small
//! retry policy; a job that still fails after its last attempt is logged
//! and dropped. The next mutating action re-syncs the full state, so a
//! dropped job cannot leave the remote side permanently behind.
//!
//! Enqueueing never blocks and never fails the caller.

use std::time::Duration;
use tracing::{debug, warn};

use super::CloudClient;
use crate::types::Account;

/// One unit of cloud work
#[derive(Debug, Clone)]
pub enum SyncJob {
    /// Upsert one account, optionally carrying a new credential
    Push {
        account: Account,
        app_password: Option<String>,
    },
    /// Delete the remote record for an account id
    Remove { account_id: String },
    /// Bulk-replace remote metadata with the full local list
    SyncAll { accounts: Vec<Account> },
}

impl SyncJob {
    fn describe(&self) -> String {
        match self {
            SyncJob::Push { account, .. } => format!("push {}", account.id),
            SyncJob::Remove { account_id } => format!("remove {}", account_id),
            SyncJob::SyncAll { accounts } => format!("sync-all ({} accounts)", accounts.len()),
        }
    }
}

/// Retry behavior for a single job
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per job, including the first
    pub attempts: u32,
    /// Pause between attempts
    pub pause: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry (pure fire-and-forget)
    pub fn none() -> Self {
        Self {
            attempts: 1,
            pause: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            pause: Duration::from_secs(1),
        }
    }
}

/// Cloneable handle for submitting jobs to the worker
///
/// When every handle is dropped the worker drains what is queued and stops.
#[derive(Clone)]
pub struct SyncHandle {
    tx: flume::Sender<SyncJob>,
}

impl SyncHandle {
    pub fn enqueue(&self, job: SyncJob) {
        if let Err(e) = self.tx.send(job) {
            // Worker already gone; local state stays authoritative.
            warn!("Cloud sync queue closed, dropping job: {}", e.into_inner().describe());
        }
    }
}

/// Spawn the sync worker on the current tokio runtime
pub fn spawn(client: CloudClient, user_email: String, policy: RetryPolicy) -> SyncHandle {
    let (tx, rx) = flume::unbounded::<SyncJob>();

    tokio::spawn(async move {
        while let Ok(job) = rx.recv_async().await {
            run_job(&client, &user_email, &policy, &job).await;
        }
        debug!("Cloud sync queue stopped");
    });

    SyncHandle { tx }
}

async fn run_job(client: &CloudClient, user_email: &str, policy: &RetryPolicy, job: &SyncJob) {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        let result = match job {
            SyncJob::Push {
                account,
                app_password,
            } => {
                client
                    .push(user_email, account, app_password.as_deref())
                    .await
            }
            SyncJob::Remove { account_id } => client.remove(user_email, account_id).await,
            SyncJob::SyncAll { accounts } => client.sync_all(user_email, accounts).await,
        };

        match result {
            Ok(()) => {
                debug!("Cloud sync ok: {}", job.describe());
                return;
            }
            Err(e) if attempt < attempts => {
                debug!(
                    "Cloud sync attempt {}/{} failed for {}: {}",
                    attempt,
                    attempts,
                    job.describe(),
                    e
                );
                tokio::time::sleep(policy.pause).await;
            }
            Err(e) => {
                warn!("Cloud sync dropped after {} attempt(s): {}: {}", attempts, job.describe(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            name: String::new(),
            email: "a@x.com".to_string(),
            aliases: Vec::new(),
            is_default: true,
            has_password: false,
            mailbox_endpoint: None,
            account_type: AccountType::Gmail,
        }
    }

    async fn wait_for(server: &MockServer, n: usize) {
        for _ in 0..50 {
            if server.received_requests().await.unwrap().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_jobs_run_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email-accounts"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/email-accounts"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client =
            CloudClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap();
        let handle = spawn(client, "me@x.com".to_string(), RetryPolicy::none());

        handle.enqueue(SyncJob::Push {
            account: account("1"),
            app_password: None,
        });
        handle.enqueue(SyncJob::Remove {
            account_id: "1".to_string(),
        });

        wait_for(&server, 2).await;
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method.to_string(), "POST");
        assert_eq!(requests[1].method.to_string(), "DELETE");
    }

    #[tokio::test]
    async fn test_failed_job_is_retried_then_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/email-accounts/sync"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client =
            CloudClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap();
        let policy = RetryPolicy {
            attempts: 3,
            pause: Duration::from_millis(10),
        };
        let handle = spawn(client, "me@x.com".to_string(), policy);

        handle.enqueue(SyncJob::SyncAll {
            accounts: vec![account("1")],
        });

        wait_for(&server, 3).await;
        // 3 attempts, then dropped; the caller never saw a failure
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_enqueue_never_fails_caller() {
        let server = MockServer::start().await;
        let client =
            CloudClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap();
        let handle = spawn(client, "me@x.com".to_string(), RetryPolicy::none());

        // Even with an unreachable service the enqueue path is infallible.
        handle.enqueue(SyncJob::Remove {
            account_id: "missing".to_string(),
        });
    }
}
