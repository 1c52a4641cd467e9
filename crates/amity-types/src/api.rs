use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RequestStatus;

// -- JWT Claims --

/// JWT claims shared between token minting and the auth middleware.
/// Canonical definition lives here in amity-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub token: String,
}

// -- Profiles --

/// Slim profile used in search pages and friend lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

/// Detailed profile returned by exact email search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// -- Friend requests --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestView {
    pub id: Uuid,
    pub status: RequestStatus,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::FriendRequest> for FriendRequestView {
    fn from(request: crate::models::FriendRequest) -> Self {
        Self {
            id: request.id,
            status: request.status,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            created_at: request.created_at,
        }
    }
}

/// A received pending request together with the sender's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequestView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
}

// -- Pagination --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub items: Vec<T>,
}
