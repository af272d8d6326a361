//! Stale-response guard
//!
//! List and fetch calls complete out of order; a folder switch issued
//! while an older request is in flight must not let the stale result
//! overwrite the newer one. Consumers take a token before issuing a
//! request and check it when the response lands; only the latest token is
//! current.

use std::sync::atomic::{AtomicU64, Ordering};

/// Token identifying one in-flight request generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Monotonic generation counter keyed to "current intent"
#[derive(Debug, Default)]
pub struct RequestGuard {
    current: AtomicU64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request generation, invalidating all earlier tokens
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether a completed response still matches current intent
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}
