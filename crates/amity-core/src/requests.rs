use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use amity_db::{Database, fmt_ts};
use amity_types::api::{Paginated, PendingRequestView};
use amity_types::models::{FriendRequest, RequestStatus};

use crate::Page;
use crate::blocks::BlockRegistry;
use crate::cache::{ListCache, ListView};
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;

/// The two ways a receiver can settle a pending request.
#[derive(Debug, Clone, Copy)]
pub enum Settlement {
    Accept,
    Reject,
}

impl Settlement {
    fn target(self) -> RequestStatus {
        match self {
            Self::Accept => RequestStatus::Accepted,
            Self::Reject => RequestStatus::Rejected,
        }
    }
}

/// The friend-request state machine.
///
/// Lifecycle per (sender, receiver) row: Pending settles exactly once to
/// Accepted (terminal) or Rejected; a Rejected row is reset in place to
/// Pending by a re-request once its cooldown has expired. All guards are
/// enforced by conditional writes, so concurrent actors resolve
/// deterministically: one wins, the other gets a domain error.
pub struct FriendRequests {
    db: Arc<Database>,
    blocks: BlockRegistry,
    limiter: RateLimiter,
    cache: ListCache,
    cooldown: Duration,
}

impl FriendRequests {
    pub fn new(
        db: Arc<Database>,
        blocks: BlockRegistry,
        limiter: RateLimiter,
        cache: ListCache,
        cooldown: Duration,
    ) -> Self {
        Self {
            db,
            blocks,
            limiter,
            cache,
            cooldown,
        }
    }

    /// Create a Pending request from sender to receiver, or re-open the
    /// existing Rejected one if its cooldown has expired.
    pub fn submit(&self, sender: Uuid, receiver: Uuid, now: DateTime<Utc>) -> Result<FriendRequest> {
        if sender == receiver {
            return Err(Error::Validation(
                "You can't send a friend request to yourself.".into(),
            ));
        }
        if self.db.user_by_id(&receiver.to_string())?.is_none() {
            return Err(Error::NotFound);
        }
        self.blocks.ensure_can_contact(sender, receiver)?;
        self.limiter.check(sender, now)?;

        let existing = self
            .db
            .request_by_pair(&sender.to_string(), &receiver.to_string())?;
        let Some(row) = existing else {
            return self.create(sender, receiver, now);
        };

        let request = row.to_domain()?;
        match request.status {
            RequestStatus::Pending => Err(Error::DuplicateRequest),
            RequestStatus::Accepted => Err(Error::AlreadyFriends),
            RequestStatus::Rejected => self.reopen(request, now),
        }
    }

    fn create(&self, sender: Uuid, receiver: Uuid, now: DateTime<Utc>) -> Result<FriendRequest> {
        let id = Uuid::new_v4();
        let inserted = self.db.insert_friend_request(
            &id.to_string(),
            &sender.to_string(),
            &receiver.to_string(),
            &fmt_ts(now),
        )?;
        if !inserted {
            // Lost the insert race: a concurrent submit for the same pair got
            // there first, and its row is Pending.
            return Err(Error::DuplicateRequest);
        }
        info!(%sender, %receiver, request = %id, "friend request created");
        self.cache.invalidate(ListView::PendingRequests, receiver);
        Ok(FriendRequest {
            id,
            sender_id: sender,
            receiver_id: receiver,
            status: RequestStatus::Pending,
            created_at: now,
            cooldown_until: None,
        })
    }

    /// Reset a Rejected row back to Pending. The cooldown must be strictly in
    /// the past; the same instant still counts as cooling down. The guard is
    /// re-checked inside the UPDATE itself.
    fn reopen(&self, request: FriendRequest, now: DateTime<Utc>) -> Result<FriendRequest> {
        if request.cooldown_until.is_some_and(|until| until >= now) {
            return Err(Error::CooldownActive);
        }
        let reopened = self.db.reopen_request(&request.id.to_string(), &fmt_ts(now))?;
        if !reopened {
            // The row left Rejected under us — a concurrent submit already
            // re-opened it, so this call is the duplicate.
            return Err(Error::DuplicateRequest);
        }
        info!(request = %request.id, "friend request re-opened after cooldown");
        self.cache
            .invalidate(ListView::PendingRequests, request.receiver_id);
        Ok(FriendRequest {
            status: RequestStatus::Pending,
            cooldown_until: None,
            ..request
        })
    }

    pub fn accept(&self, request_id: Uuid, actor: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.settle(request_id, actor, Settlement::Accept, now)
    }

    pub fn reject(&self, request_id: Uuid, actor: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.settle(request_id, actor, Settlement::Reject, now)
    }

    /// Single transition path for both outcomes. Only the receiver may settle,
    /// and only a Pending row settles: the status check and the write are one
    /// compare-and-set, so of two racing settles exactly one succeeds and the
    /// other fails with `InvalidTransition`.
    fn settle(
        &self,
        request_id: Uuid,
        actor: Uuid,
        outcome: Settlement,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let row = self
            .db
            .request_by_id(&request_id.to_string())?
            .ok_or(Error::NotFound)?;
        let request = row.to_domain()?;
        if request.receiver_id != actor {
            return Err(Error::Forbidden);
        }

        let target = outcome.target();
        let cooldown_until = match outcome {
            Settlement::Accept => None,
            Settlement::Reject => Some(fmt_ts(now + self.cooldown)),
        };
        let edge = match outcome {
            Settlement::Accept => Some((row.sender_id.as_str(), row.receiver_id.as_str())),
            Settlement::Reject => None,
        };

        let settled = self.db.settle_request(
            &row.id,
            target.as_code(),
            cooldown_until.as_deref(),
            edge,
            &fmt_ts(now),
        )?;
        if !settled {
            return Err(Error::InvalidTransition(target.label()));
        }

        info!(request = %request.id, outcome = target.label(), "friend request settled");
        self.cache
            .invalidate(ListView::PendingRequests, request.receiver_id);
        if matches!(outcome, Settlement::Accept) {
            self.cache.invalidate(ListView::Friends, request.sender_id);
            self.cache.invalidate(ListView::Friends, request.receiver_id);
        }
        Ok(())
    }

    /// One page of requests the user has received and not yet settled.
    pub fn pending_for(&self, receiver: Uuid, page: Page) -> Result<Paginated<PendingRequestView>> {
        let (rows, total) =
            self.db
                .pending_requests_page(&receiver.to_string(), page.per_page, page.offset())?;
        let items = rows
            .into_iter()
            .map(|row| {
                Ok(PendingRequestView {
                    id: row.id.parse().map_err(anyhow::Error::from)?,
                    sender_id: row.sender_id.parse().map_err(anyhow::Error::from)?,
                    sender_name: row.sender_name,
                    created_at: amity_db::parse_ts(&row.created_at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Paginated {
            total,
            page: page.page,
            per_page: page.per_page,
            items,
        })
    }
}
