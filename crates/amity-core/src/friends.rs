use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use amity_db::{Database, fmt_ts};
use amity_types::api::{Paginated, UserSummary};

use crate::Page;
use crate::error::Result;

/// Confirmed friendships, stored as a single symmetric relation: one row per
/// unordered pair, written once when a request is accepted. Listing queries
/// either side of the pair, so there is no directional ambiguity to manage.
#[derive(Clone)]
pub struct FriendGraph {
    db: Arc<Database>,
}

impl FriendGraph {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Idempotent: adding an existing edge is a no-op.
    pub fn add_edge(&self, a: Uuid, b: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.db
            .insert_friendship(&a.to_string(), &b.to_string(), &fmt_ts(now))?;
        Ok(())
    }

    pub fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool> {
        Ok(self.db.are_friends(&a.to_string(), &b.to_string())?)
    }

    pub fn friends_of(&self, user: Uuid, page: Page) -> Result<Paginated<UserSummary>> {
        let (rows, total) =
            self.db
                .friends_page(&user.to_string(), page.per_page, page.offset())?;
        let items = rows
            .into_iter()
            .map(|row| {
                Ok(UserSummary {
                    id: row.id.parse().map_err(anyhow::Error::from)?,
                    name: row.name,
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
