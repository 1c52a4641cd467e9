use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use amity_db::Database;
use amity_types::api::{Paginated, UserDetail, UserSummary};

use crate::Page;
use crate::blocks::BlockRegistry;
use crate::error::{Error, Result};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("valid email regex"));

/// Syntactic email check — decides which search branch a query takes.
pub fn is_valid_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

/// Outcome of a profile search: an email query resolves to a single detailed
/// profile, anything else to a page of summaries.
#[derive(Debug)]
pub enum SearchResult {
    Profile(UserDetail),
    Page(Paginated<UserSummary>),
}

/// Profile lookup composing text matching with block visibility: substring
/// results never include the viewer or anyone who has blocked them. Exact
/// email lookup does not go through the visibility filter.
pub struct ProfileSearch {
    db: Arc<Database>,
    blocks: BlockRegistry,
}

impl ProfileSearch {
    pub fn new(db: Arc<Database>, blocks: BlockRegistry) -> Self {
        Self { db, blocks }
    }

    pub fn search(&self, viewer: Uuid, query: Option<&str>, page: Page) -> Result<SearchResult> {
        if let Some(q) = query
            && is_valid_email(q)
        {
            let user = self.db.user_by_email(q)?.ok_or(Error::NotFound)?;
            return Ok(SearchResult::Profile(UserDetail {
                id: user.id.parse().map_err(anyhow::Error::from)?,
                name: user.name,
                email: user.email,
            }));
        }

        let (rows, total) = self.db.search_profiles_page(
            &viewer.to_string(),
            query.unwrap_or(""),
            self.blocks.symmetric(),
            page.per_page,
            page.offset(),
        )?;
        let items = rows
            .into_iter()
            .map(|row| {
                Ok(UserSummary {
                    id: row.id.parse().map_err(anyhow::Error::from)?,
                    name: row.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SearchResult::Page(Paginated {
            total,
            page: page.page,
            per_page: page.per_page,
            items,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amity_db::fmt_ts;
    use chrono::{TimeZone, Utc};

    #[test]
    fn email_syntax_check() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user @example.com"));
    }

    fn seeded() -> (ProfileSearch, Uuid, Uuid) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let now = fmt_ts(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let viewer = Uuid::new_v4();
        let other = Uuid::new_v4();
        db.create_user(&viewer.to_string(), "User One", "user1@example.com", "hash", &now)
            .unwrap();
        db.create_user(&other.to_string(), "User Two", "user2@example.com", "hash", &now)
            .unwrap();
        let blocks = BlockRegistry::new(db.clone(), false);
        (ProfileSearch::new(db, blocks), viewer, other)
    }

    #[test]
    fn email_query_is_exact_and_case_insensitive() {
        let (search, viewer, other) = seeded();

        let hit = search
            .search(viewer, Some("User2@Example.com"), Page::default())
            .unwrap();
        match hit {
            SearchResult::Profile(detail) => {
                assert_eq!(detail.id, other);
                assert_eq!(detail.email, "user2@example.com");
            }
            SearchResult::Page(_) => panic!("expected a single profile"),
        }

        let miss = search.search(viewer, Some("nobody@example.com"), Page::default());
        assert!(matches!(miss, Err(Error::NotFound)));
    }

    #[test]
    fn name_query_excludes_the_viewer() {
        let (search, viewer, other) = seeded();

        let result = search.search(viewer, Some("user"), Page::default()).unwrap();
        match result {
            SearchResult::Page(page) => {
                assert_eq!(page.total, 1);
                assert_eq!(page.items[0].id, other);
            }
            SearchResult::Profile(_) => panic!("expected a page"),
        }
    }

    #[test]
    fn empty_query_lists_all_visible_profiles() {
        let (search, viewer, other) = seeded();

        let result = search.search(viewer, None, Page::default()).unwrap();
        match result {
            SearchResult::Page(page) => {
                assert_eq!(page.total, 1);
                assert_eq!(page.items[0].id, other);
            }
            SearchResult::Profile(_) => panic!("expected a page"),
        }
    }
}
