pub mod auth;
pub mod error;
pub mod friends;
pub mod middleware;
pub mod requests;
pub mod users;

use std::sync::Arc;

use serde::Deserialize;

use amity_core::{BlockRegistry, FriendGraph, FriendRequests, ListCache, Page, ProfileSearch};
use amity_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub blocks: BlockRegistry,
    pub requests: FriendRequests,
    pub graph: FriendGraph,
    pub search: ProfileSearch,
    pub cache: ListCache,
    pub jwt_secret: String,
}

/// Common `?page=&per_page=` query parameters for paginated list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl PageParams {
    pub fn to_page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_per_page() -> u32 {
    Page::DEFAULT_PER_PAGE
}
