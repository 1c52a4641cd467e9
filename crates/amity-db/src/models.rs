/// Database row types — these map directly to SQLite rows.
/// Distinct from amity-types API models to keep the DB layer independent.
use anyhow::{Result, anyhow};

use amity_types::models::{FriendRequest, RequestStatus};

use crate::parse_ts;

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct FriendRequestRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: String,
    pub created_at: String,
    pub cooldown_until: Option<String>,
}

impl FriendRequestRow {
    pub fn to_domain(&self) -> Result<FriendRequest> {
        Ok(FriendRequest {
            id: self.id.parse()?,
            sender_id: self.sender_id.parse()?,
            receiver_id: self.receiver_id.parse()?,
            status: RequestStatus::from_code(&self.status)
                .ok_or_else(|| anyhow!("unknown request status '{}'", self.status))?,
            created_at: parse_ts(&self.created_at)?,
            cooldown_until: self
                .cooldown_until
                .as_deref()
                .map(parse_ts)
                .transpose()?,
        })
    }
}

/// A received pending request joined with the sender's display name.
pub struct PendingRequestRow {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub created_at: String,
}

/// Slim (id, name) projection used by search pages and friend lists.
pub struct ProfileRow {
    pub id: String,
    pub name: String,
}
