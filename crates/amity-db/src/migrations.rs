use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS friend_requests (
            id              TEXT PRIMARY KEY,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            receiver_id     TEXT NOT NULL REFERENCES users(id),
            status          TEXT NOT NULL DEFAULT 'P',
            created_at      TEXT NOT NULL,
            cooldown_until  TEXT,
            UNIQUE(sender_id, receiver_id)
        );

        CREATE INDEX IF NOT EXISTS idx_requests_sender_created
            ON friend_requests(sender_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_requests_receiver_status
            ON friend_requests(receiver_id, status);

        -- One row per unordered pair, canonicalized user_a < user_b.
        CREATE TABLE IF NOT EXISTS friendships (
            user_a      TEXT NOT NULL REFERENCES users(id),
            user_b      TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            PRIMARY KEY (user_a, user_b),
            CHECK (user_a < user_b)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_user_b
            ON friendships(user_b);

        CREATE TABLE IF NOT EXISTS blocks (
            blocker_id  TEXT NOT NULL REFERENCES users(id),
            blocked_id  TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            PRIMARY KEY (blocker_id, blocked_id)
        );

        CREATE INDEX IF NOT EXISTS idx_blocks_blocked
            ON blocks(blocked_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
