use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle states of a friend request. Stored as single-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Accepted => "A",
            Self::Rejected => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(Self::Pending),
            "A" => Some(Self::Accepted),
            "R" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Human-readable label used in transition error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// One friend request episode between an ordered (sender, receiver) pair.
/// At most one row exists per ordered pair; a rejected row is reset in place
/// on re-request rather than replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    /// Set on rejection; re-requests are refused until this instant has passed.
    pub cooldown_until: Option<DateTime<Utc>>,
}
