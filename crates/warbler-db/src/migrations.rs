use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Owned rows cascade: deleting a user removes their messages, both
/// directions of their follows, and their likes; deleting a message removes
/// its likes.
pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
            r.get(0)
        })?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        let tx = conn.transaction()?;
        tx.execute_batch(
            "

            CREATE TABLE users (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                username          TEXT NOT NULL UNIQUE,
                email             TEXT NOT NULL UNIQUE,
                image_url         TEXT NOT NULL DEFAULT '/static/images/default-pic.png',
                header_image_url  TEXT NOT NULL DEFAULT '/static/images/warbler-hero.jpg',
                bio               TEXT,
                location          TEXT,
                password          TEXT NOT NULL
            );

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                text        TEXT NOT NULL CHECK (length(text) <= 140),
                timestamp   TEXT NOT NULL,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_messages_user
                ON messages(user_id, timestamp);

            CREATE TABLE follows (
                user_being_followed_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                user_following_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (user_being_followed_id, user_following_id)
            );

            CREATE INDEX idx_follows_follower
                ON follows(user_following_id);

            CREATE TABLE likes (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, message_id)
            );

            CREATE INDEX idx_likes_message
                ON likes(message_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn failed_migration_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE likes (stale INTEGER);").unwrap();

        assert!(run(&mut conn).is_err());
        assert!(conn.is_autocommit());

        let users: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(users, 0);
        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 0);
    }
}
