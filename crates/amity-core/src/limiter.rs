use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use amity_db::{Database, fmt_ts};

use crate::error::{Error, Result};

/// Sliding-window limit on friend request creation, counted per sender over
/// the trailing window against the persisted rows.
///
/// This is a read-then-decide check: two submissions racing through it can
/// both pass the count and both insert, transiently exceeding the threshold.
/// That soft-limit behavior is accepted; the store's uniqueness constraint —
/// not this counter — is the arbiter of correctness.
#[derive(Clone)]
pub struct RateLimiter {
    db: Arc<Database>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(db: Arc<Database>, limit: u32, window: Duration) -> Self {
        Self { db, limit, window }
    }

    /// Fails with `RateLimited` when the sender has already created `limit`
    /// requests inside the window. Re-opened requests keep their original
    /// creation time and therefore do not consume budget.
    pub fn check(&self, sender: Uuid, now: DateTime<Utc>) -> Result<()> {
        let cutoff = fmt_ts(now - self.window);
        let count = self
            .db
            .count_requests_since(&sender.to_string(), &cutoff)?;
        if count >= u64::from(self.limit) {
            debug!(%sender, count, limit = self.limit, "request rate limit exceeded");
            return Err(Error::RateLimited { limit: self.limit });
        }
        Ok(())
    }
}
