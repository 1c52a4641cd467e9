use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use amity_db::{Database, fmt_ts};

use crate::error::{Error, Result};

/// Tracks directional block relationships and answers visibility queries.
///
/// By default blocking is asymmetric: the blocker disappears from the blocked
/// user's search results and cannot be contacted by them, while the blocker
/// keeps seeing the blocked profile. With `symmetric` set both directions are
/// hidden and gated.
#[derive(Clone)]
pub struct BlockRegistry {
    db: Arc<Database>,
    symmetric: bool,
}

impl BlockRegistry {
    pub fn new(db: Arc<Database>, symmetric: bool) -> Self {
        Self { db, symmetric }
    }

    pub fn symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn block(&self, blocker: Uuid, blocked: Uuid, now: DateTime<Utc>) -> Result<()> {
        if blocker == blocked {
            return Err(Error::Validation("You can't block yourself.".into()));
        }
        if self.db.user_by_id(&blocked.to_string())?.is_none() {
            return Err(Error::NotFound);
        }
        let created = self
            .db
            .insert_block(&blocker.to_string(), &blocked.to_string(), &fmt_ts(now))?;
        if !created {
            return Err(Error::AlreadyBlocked);
        }
        info!(%blocker, %blocked, "user blocked");
        Ok(())
    }

    pub fn unblock(&self, blocker: Uuid, blocked: Uuid) -> Result<()> {
        let deleted = self
            .db
            .delete_block(&blocker.to_string(), &blocked.to_string())?;
        if !deleted {
            return Err(Error::NotBlocked);
        }
        info!(%blocker, %blocked, "user unblocked");
        Ok(())
    }

    /// False iff the subject has blocked the viewer (either direction when
    /// symmetric). Search filtering and the submit gate both go through this.
    pub fn is_visible(&self, subject: Uuid, viewer: Uuid) -> Result<bool> {
        if self
            .db
            .block_exists(&subject.to_string(), &viewer.to_string())?
        {
            return Ok(false);
        }
        if self.symmetric
            && self
                .db
                .block_exists(&viewer.to_string(), &subject.to_string())?
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Gate for submit(): a sender may not contact a receiver who blocked them.
    pub fn ensure_can_contact(&self, sender: Uuid, receiver: Uuid) -> Result<()> {
        if self.is_visible(receiver, sender)? {
            Ok(())
        } else {
            Err(Error::Blocked)
        }
    }
}
