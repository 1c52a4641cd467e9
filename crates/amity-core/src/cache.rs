use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::Page;

/// The two list views that get memoized per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListView {
    Friends,
    PendingRequests,
}

type Key = (ListView, Uuid, u32, u32);

struct Entry {
    stored_at: Instant,
    payload: Value,
}

/// Memoizes serialized list pages per (view, user, page). Entries are dropped
/// explicitly when a mutation touches the underlying list, with a TTL backstop
/// bounding any staleness that slips through. A zero TTL disables caching.
#[derive(Clone)]
pub struct ListCache {
    inner: Arc<Mutex<HashMap<Key, Entry>>>,
    ttl: Duration,
}

impl ListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get(&self, view: ListView, user: Uuid, page: Page) -> Option<Value> {
        let key = (view, user, page.page, page.per_page);
        let mut map = self.lock();
        match map.get(&key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.payload.clone()),
            Some(_) => {
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, view: ListView, user: Uuid, page: Page, payload: Value) {
        if self.ttl.is_zero() {
            return;
        }
        let key = (view, user, page.page, page.per_page);
        self.lock().insert(
            key,
            Entry {
                stored_at: Instant::now(),
                payload,
            },
        );
    }

    /// Drop every cached page of one view for one user.
    pub fn invalidate(&self, view: ListView, user: Uuid) {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|(v, u, _, _), _| !(*v == view && *u == user));
        if map.len() != before {
            debug!(?view, %user, "list cache invalidated");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Key, Entry>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_returns_stored_page() {
        let cache = ListCache::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let page = Page::default();

        assert!(cache.get(ListView::Friends, user, page).is_none());
        cache.put(ListView::Friends, user, page, json!({"total": 1}));
        assert_eq!(
            cache.get(ListView::Friends, user, page),
            Some(json!({"total": 1}))
        );

        // a different page of the same view is a separate entry
        let page2 = Page::new(2, page.per_page);
        assert!(cache.get(ListView::Friends, user, page2).is_none());
    }

    #[test]
    fn invalidate_scopes_to_view_and_user() {
        let cache = ListCache::new(Duration::from_secs(60));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let page = Page::default();
        cache.put(ListView::Friends, alice, page, json!(1));
        cache.put(ListView::PendingRequests, alice, page, json!(2));
        cache.put(ListView::Friends, bob, page, json!(3));

        cache.invalidate(ListView::Friends, alice);

        assert!(cache.get(ListView::Friends, alice, page).is_none());
        assert_eq!(cache.get(ListView::PendingRequests, alice, page), Some(json!(2)));
        assert_eq!(cache.get(ListView::Friends, bob, page), Some(json!(3)));
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = ListCache::new(Duration::ZERO);
        let user = Uuid::new_v4();
        cache.put(ListView::Friends, user, Page::default(), json!(1));
        assert!(cache.get(ListView::Friends, user, Page::default()).is_none());
    }
}
