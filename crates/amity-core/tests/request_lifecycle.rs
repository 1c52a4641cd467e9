use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use amity_core::{
    BlockRegistry, Error, FriendGraph, FriendRequests, ListCache, Page, ProfileSearch, RateLimiter,
    SearchResult,
};
use amity_db::{Database, fmt_ts};
use amity_types::models::RequestStatus;

const LIMIT: u32 = 3;
const COOLDOWN_SECS: i64 = 60;

struct Fixture {
    db: Arc<Database>,
    requests: FriendRequests,
    graph: FriendGraph,
    blocks: BlockRegistry,
    search: ProfileSearch,
    cache: ListCache,
    t0: DateTime<Utc>,
}

impl Fixture {
    fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let blocks = BlockRegistry::new(db.clone(), false);
        let limiter = RateLimiter::new(db.clone(), LIMIT, Duration::seconds(60));
        let cache = ListCache::new(StdDuration::from_secs(30));
        let requests = FriendRequests::new(
            db.clone(),
            blocks.clone(),
            limiter,
            cache.clone(),
            Duration::seconds(COOLDOWN_SECS),
        );
        let graph = FriendGraph::new(db.clone());
        let search = ProfileSearch::new(db.clone(), blocks.clone());
        Self {
            db,
            requests,
            graph,
            blocks,
            search,
            cache,
            t0: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    fn user(&self, name: &str, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.db
            .create_user(&id.to_string(), name, email, "hash", &fmt_ts(self.t0))
            .unwrap();
        id
    }
}

#[test]
fn submit_is_idempotent_while_pending() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    let u2 = fx.user("User Two", "user2@example.com");

    let request = fx.requests.submit(u1, u2, fx.t0).unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    // repeated submits never create a second row
    for i in 1..4 {
        let again = fx.requests.submit(u1, u2, fx.t0 + Duration::seconds(i));
        assert!(matches!(again, Err(Error::DuplicateRequest)));
    }
    let row = fx
        .db
        .request_by_pair(&u1.to_string(), &u2.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(row.id, request.id.to_string());
}

#[test]
fn opposite_directions_are_independent_rows() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    let u2 = fx.user("User Two", "user2@example.com");

    let forward = fx.requests.submit(u1, u2, fx.t0).unwrap();
    let backward = fx.requests.submit(u2, u1, fx.t0).unwrap();
    assert_ne!(forward.id, backward.id);
}

#[test]
fn self_request_is_rejected() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    assert!(matches!(
        fx.requests.submit(u1, u1, fx.t0),
        Err(Error::Validation(_))
    ));
}

#[test]
fn submit_to_unknown_receiver_is_not_found() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    assert!(matches!(
        fx.requests.submit(u1, Uuid::new_v4(), fx.t0),
        Err(Error::NotFound)
    ));
}

#[test]
fn accept_is_terminal_and_writes_the_edge_once() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    let u2 = fx.user("User Two", "user2@example.com");

    let request = fx.requests.submit(u1, u2, fx.t0).unwrap();
    fx.requests
        .accept(request.id, u2, fx.t0 + Duration::seconds(1))
        .unwrap();
    assert!(fx.graph.are_friends(u1, u2).unwrap());

    // a retried accept and a late reject both fail, and the friend set is
    // unchanged
    let retry = fx.requests.accept(request.id, u2, fx.t0 + Duration::seconds(2));
    assert!(matches!(retry, Err(Error::InvalidTransition("accepted"))));
    let late_reject = fx.requests.reject(request.id, u2, fx.t0 + Duration::seconds(2));
    assert!(matches!(late_reject, Err(Error::InvalidTransition("rejected"))));

    let friends = fx.graph.friends_of(u1, Page::default()).unwrap();
    assert_eq!(friends.total, 1);

    // submitting again reports the accepted state
    let resubmit = fx.requests.submit(u1, u2, fx.t0 + Duration::seconds(3));
    assert!(matches!(resubmit, Err(Error::AlreadyFriends)));
}

#[test]
fn only_the_receiver_may_settle() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    let u2 = fx.user("User Two", "user2@example.com");
    let outsider = fx.user("Outsider", "outsider@example.com");

    let request = fx.requests.submit(u1, u2, fx.t0).unwrap();

    assert!(matches!(
        fx.requests.accept(request.id, u1, fx.t0),
        Err(Error::Forbidden)
    ));
    assert!(matches!(
        fx.requests.reject(request.id, outsider, fx.t0),
        Err(Error::Forbidden)
    ));
    assert!(matches!(
        fx.requests.accept(Uuid::new_v4(), u2, fx.t0),
        Err(Error::NotFound)
    ));

    // the receiver still can
    fx.requests.accept(request.id, u2, fx.t0).unwrap();
}

#[test]
fn rejection_starts_the_cooldown_clock() {
    let fx = Fixture::new();
    let u1 = fx.user("User One", "user1@example.com");
    let u2 = fx.user("User Two", "user2@example.com");

    let request = fx.requests.submit(u1, u2, fx.t0).unwrap();
    fx.requests.reject(request.id, u2, fx.t0).unwrap();
    assert!(!fx.graph.are_friends(u1, u2).unwrap());

    // before expiry, and exactly at expiry: still cooling down
    let early = fx
        .requests
        .submit(u1, u2, fx.t0 + Duration::seconds(30));
    assert!(matches!(early, Err(Error::CooldownActive)));
    let boundary = fx
        .requests
        .submit(u1, u2, fx.t0 + Duration::seconds(COOLDOWN_SECS));
    assert!(matches!(boundary, Err(Error::CooldownActive)));

    // strictly past expiry: the same row is reset to Pending
    let reopened = fx
        .requests
        .submit(u1, u2, fx.t0 + Duration::seconds(COOLDOWN_SECS + 1))
        .unwrap();
    assert_eq!(reopened.id, request.id);
    assert_eq!(reopened.status, RequestStatus::Pending);
    assert_eq!(reopened.cooldown_until, None);

    // and the new episode settles normally
    fx.requests
        .accept(reopened.id, u2, fx.t0 + Duration::seconds(COOLDOWN_SECS + 2))
        .unwrap();
    assert!(fx.graph.are_friends(u1, u2).unwrap());
}

#[test]
fn fourth_submit_in_the_window_is_rate_limited() {
    let fx = Fixture::new();
    let sender = fx.user("Sender", "sender@example.com");
    let receivers: Vec<Uuid> = (0..4)
        .map(|i| fx.user(&format!("R{i}"), &format!("r{i}@example.com")))
        .collect();

    // three submits within ten seconds all pass the limiter
    for (i, receiver) in receivers[..3].iter().enumerate() {
        fx.requests
            .submit(sender, *receiver, fx.t0 + Duration::seconds(i as i64 * 5))
            .unwrap();
    }

    // the fourth inside the same minute does not
    let denied = fx
        .requests
        .submit(sender, receivers[3], fx.t0 + Duration::seconds(20));
    assert!(matches!(denied, Err(Error::RateLimited { limit: LIMIT })));

    // once the window has slid past the first creation, it succeeds
    fx.requests
        .submit(sender, receivers[3], fx.t0 + Duration::seconds(61))
        .unwrap();
}

#[test]
fn blocked_sender_cannot_submit_and_blocker_is_hidden() {
    let fx = Fixture::new();
    let alice = fx.user("Alice", "alice@example.com");
    let bob = fx.user("Bob", "bob@example.com");

    fx.blocks.block(alice, bob, fx.t0).unwrap();

    // Bob can no longer request Alice
    let denied = fx.requests.submit(bob, alice, fx.t0);
    assert!(matches!(denied, Err(Error::Blocked)));

    // and Alice no longer appears in Bob's search results
    let result = fx.search.search(bob, Some("alice"), Page::default()).unwrap();
    match result {
        SearchResult::Page(page) => assert_eq!(page.total, 0),
        SearchResult::Profile(_) => panic!("expected a page"),
    }

    // Alice, who placed the block, is unaffected in the other direction
    fx.requests.submit(alice, bob, fx.t0).unwrap();

    // unblocking restores contact
    fx.blocks.unblock(alice, bob).unwrap();
    fx.requests
        .submit(bob, alice, fx.t0 + Duration::seconds(1))
        .unwrap();
}

#[test]
fn mutations_invalidate_the_affected_cached_views() {
    use amity_core::ListView;
    use serde_json::json;

    let fx = Fixture::new();
    let sender = fx.user("Sender", "sender@example.com");
    let receiver = fx.user("Receiver", "receiver@example.com");
    let page = Page::default();

    // a submit drops the receiver's cached pending view
    fx.cache
        .put(ListView::PendingRequests, receiver, page, json!("stale"));
    let request = fx.requests.submit(sender, receiver, fx.t0).unwrap();
    assert!(fx.cache.get(ListView::PendingRequests, receiver, page).is_none());

    // an accept drops the receiver's pending view and both friends views
    fx.cache
        .put(ListView::PendingRequests, receiver, page, json!("stale"));
    fx.cache.put(ListView::Friends, sender, page, json!("stale"));
    fx.cache.put(ListView::Friends, receiver, page, json!("stale"));
    fx.requests
        .accept(request.id, receiver, fx.t0 + Duration::seconds(1))
        .unwrap();
    assert!(fx.cache.get(ListView::PendingRequests, receiver, page).is_none());
    assert!(fx.cache.get(ListView::Friends, sender, page).is_none());
    assert!(fx.cache.get(ListView::Friends, receiver, page).is_none());
}

#[test]
fn pending_list_shows_received_requests_newest_first() {
    let fx = Fixture::new();
    let receiver = fx.user("Receiver", "receiver@example.com");
    let first = fx.user("First", "first@example.com");
    let second = fx.user("Second", "second@example.com");

    fx.requests.submit(first, receiver, fx.t0).unwrap();
    fx.requests
        .submit(second, receiver, fx.t0 + Duration::seconds(5))
        .unwrap();

    let page = fx.requests.pending_for(receiver, Page::default()).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].sender_id, second);
    assert_eq!(page.items[0].sender_name, "Second");
    assert_eq!(page.items[1].sender_id, first);

    // settling drains the list
    fx.requests
        .accept(page.items[0].id, receiver, fx.t0 + Duration::seconds(10))
        .unwrap();
    let page = fx.requests.pending_for(receiver, Page::default()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].sender_id, first);
}
