use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use crate::Database;
use crate::models::{FriendRequestRow, PendingRequestRow, ProfileRow, UserRow};

const SELECT_REQUEST: &str =
    "SELECT id, sender_id, receiver_id, status, created_at, cooldown_until FROM friend_requests";

impl Database {
    // -- Users --

    /// Returns false when the email is already registered (unique violation).
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, email, password_hash, created_at],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, email, password, created_at FROM users
                     WHERE email = ?1 COLLATE NOCASE",
                    [email],
                    read_user_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, email, password, created_at FROM users WHERE id = ?1",
                    [id],
                    read_user_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Friend requests --

    /// Insert a fresh Pending request. Returns false when the UNIQUE
    /// (sender_id, receiver_id) constraint fires — a concurrent submit won
    /// the race and the caller must report a duplicate, not a fault.
    pub fn insert_friend_request(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO friend_requests (id, sender_id, receiver_id, status, created_at)
                 VALUES (?1, ?2, ?3, 'P', ?4)",
                params![id, sender_id, receiver_id, created_at],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn request_by_pair(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Option<FriendRequestRow>> {
        self.with_conn(|conn| {
            let sql = format!("{SELECT_REQUEST} WHERE sender_id = ?1 AND receiver_id = ?2");
            let row = conn
                .query_row(&sql, params![sender_id, receiver_id], read_request_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn request_by_id(&self, id: &str) -> Result<Option<FriendRequestRow>> {
        self.with_conn(|conn| {
            let sql = format!("{SELECT_REQUEST} WHERE id = ?1");
            let row = conn.query_row(&sql, [id], read_request_row).optional()?;
            Ok(row)
        })
    }

    /// Settle a Pending request: compare-and-set the status and, for an
    /// acceptance, write the friendship edge in the same transaction. Returns
    /// false when the row was not Pending anymore — of two racing settles
    /// exactly one sees Pending and the other deterministically gets false.
    pub fn settle_request(
        &self,
        id: &str,
        to_status: &str,
        cooldown_until: Option<&str>,
        edge: Option<(&str, &str)>,
        now: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let updated = tx.execute(
                "UPDATE friend_requests SET status = ?2, cooldown_until = ?3
                 WHERE id = ?1 AND status = 'P'",
                params![id, to_status, cooldown_until],
            )?;
            if updated == 0 {
                return Ok(false);
            }
            if let Some((a, b)) = edge {
                let (user_a, user_b) = canonical_pair(a, b);
                tx.execute(
                    "INSERT OR IGNORE INTO friendships (user_a, user_b, created_at)
                     VALUES (?1, ?2, ?3)",
                    params![user_a, user_b, now],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
    }

    /// Re-open a Rejected request whose cooldown has expired. The guard lives
    /// in the UPDATE itself, so a concurrent settle or reopen cannot slip
    /// between check and write. `created_at` is left untouched — the row keeps
    /// its identity and its original rate-window slot.
    pub fn reopen_request(&self, id: &str, now: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE friend_requests SET status = 'P', cooldown_until = NULL
                 WHERE id = ?1 AND status = 'R'
                   AND (cooldown_until IS NULL OR cooldown_until < ?2)",
                params![id, now],
            )?;
            Ok(updated == 1)
        })
    }

    /// Sliding-window count: requests created by this sender at or after the
    /// cutoff. Re-opened rows keep their original created_at and do not count.
    pub fn count_requests_since(&self, sender_id: &str, cutoff: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: u64 = conn.query_row(
                "SELECT COUNT(*) FROM friend_requests
                 WHERE sender_id = ?1 AND created_at >= ?2",
                params![sender_id, cutoff],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// One page of received Pending requests, newest first, with the total.
    pub fn pending_requests_page(
        &self,
        receiver_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<PendingRequestRow>, u64)> {
        self.with_conn(|conn| {
            let total: u64 = conn.query_row(
                "SELECT COUNT(*) FROM friend_requests WHERE receiver_id = ?1 AND status = 'P'",
                [receiver_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(
                "SELECT r.id, r.sender_id, u.name, r.created_at
                 FROM friend_requests r
                 JOIN users u ON u.id = r.sender_id
                 WHERE r.receiver_id = ?1 AND r.status = 'P'
                 ORDER BY r.created_at DESC, r.id
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![receiver_id, limit, offset], |row| {
                    Ok(PendingRequestRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        sender_name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }

    // -- Friendships --

    /// Idempotent edge write; the pair is canonicalized so each friendship
    /// exists exactly once regardless of who accepted.
    pub fn insert_friendship(&self, a: &str, b: &str, created_at: &str) -> Result<()> {
        let (user_a, user_b) = canonical_pair(a, b);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO friendships (user_a, user_b, created_at)
                 VALUES (?1, ?2, ?3)",
                params![user_a, user_b, created_at],
            )?;
            Ok(())
        })
    }

    pub fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        let (user_a, user_b) = canonical_pair(a, b);
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM friendships WHERE user_a = ?1 AND user_b = ?2",
                    params![user_a, user_b],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// One page of a user's friends (either side of the pair) with the total.
    pub fn friends_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ProfileRow>, u64)> {
        self.with_conn(|conn| {
            let total: u64 = conn.query_row(
                "SELECT COUNT(*) FROM friendships WHERE user_a = ?1 OR user_b = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(
                "SELECT u.id, u.name
                 FROM friendships f
                 JOIN users u
                   ON u.id = CASE WHEN f.user_a = ?1 THEN f.user_b ELSE f.user_a END
                 WHERE f.user_a = ?1 OR f.user_b = ?1
                 ORDER BY u.name, u.id
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], read_profile_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }

    // -- Blocks --

    /// Returns false when the (blocker, blocked) pair already exists.
    pub fn insert_block(&self, blocker_id: &str, blocked_id: &str, created_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO blocks (blocker_id, blocked_id, created_at) VALUES (?1, ?2, ?3)",
                params![blocker_id, blocked_id, created_at],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Returns false when there was no such block to remove.
    pub fn delete_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM blocks WHERE blocker_id = ?1 AND blocked_id = ?2",
                params![blocker_id, blocked_id],
            )?;
            Ok(deleted == 1)
        })
    }

    pub fn block_exists(&self, blocker_id: &str, blocked_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blocks WHERE blocker_id = ?1 AND blocked_id = ?2",
                    params![blocker_id, blocked_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Search --

    /// One page of profiles visible to the viewer whose name or email contains
    /// the pattern, excluding the viewer and everyone who has blocked them.
    /// With `symmetric` set, profiles the viewer has blocked are hidden too.
    pub fn search_profiles_page(
        &self,
        viewer_id: &str,
        query: &str,
        symmetric: bool,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ProfileRow>, u64)> {
        let pattern = like_pattern(query);
        let mut filter = String::from(
            "FROM users u
             WHERE u.id != ?1
               AND NOT EXISTS (SELECT 1 FROM blocks b
                               WHERE b.blocker_id = u.id AND b.blocked_id = ?1)",
        );
        if symmetric {
            filter.push_str(
                " AND NOT EXISTS (SELECT 1 FROM blocks b
                                  WHERE b.blocker_id = ?1 AND b.blocked_id = u.id)",
            );
        }
        filter.push_str(" AND (u.name LIKE ?2 ESCAPE '\\' OR u.email LIKE ?2 ESCAPE '\\')");

        self.with_conn(|conn| {
            let total: u64 = conn.query_row(
                &format!("SELECT COUNT(*) {filter}"),
                params![viewer_id, pattern],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT u.id, u.name {filter} ORDER BY u.name, u.id LIMIT ?3 OFFSET ?4"
            ))?;
            let rows = stmt
                .query_map(params![viewer_id, pattern, limit, offset], read_profile_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn read_request_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendRequestRow> {
    Ok(FriendRequestRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        cooldown_until: row.get(5)?,
    })
}

fn read_profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// %/_/\ are LIKE metacharacters; escape them so user input matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{escaped}%")
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _)
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
}
