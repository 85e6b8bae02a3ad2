use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::models::{USER_SELECT, UserRow};
use crate::users::user_exists;
use crate::{Database, DbError, Result};

impl Database {
    /// Record that `follower_id` follows `followee_id`. Returns `false` when
    /// the edge already existed; the composite key keeps it to one row.
    pub fn follow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        if follower_id == followee_id {
            return Err(DbError::invalid("users cannot follow themselves"));
        }

        let created = self.with_tx(|tx| {
            ensure_users(tx, follower_id, followee_id)?;
            insert_follow(tx, follower_id, followee_id)
        })?;

        if created {
            info!(follower_id, followee_id, "Follow created");
        }
        Ok(created)
    }

    /// Returns `false` when there was nothing to remove.
    pub fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let removed = self.with_tx(|tx| delete_follow(tx, follower_id, followee_id))?;

        if removed {
            info!(follower_id, followee_id, "Follow removed");
        }
        Ok(removed)
    }

    /// Flip the edge. Returns the new state: `true` means now following.
    pub fn toggle_follow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        if follower_id == followee_id {
            return Err(DbError::invalid("users cannot follow themselves"));
        }

        self.with_tx(|tx| {
            ensure_users(tx, follower_id, followee_id)?;
            if query_is_following(tx, follower_id, followee_id)? {
                delete_follow(tx, follower_id, followee_id)?;
                Ok(false)
            } else {
                insert_follow(tx, follower_id, followee_id)?;
                Ok(true)
            }
        })
    }

    pub fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        self.with_conn(|conn| query_is_following(conn, follower_id, followee_id))
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "{USER_SELECT}
                     JOIN follows f ON f.user_being_followed_id = u.id
                     WHERE f.user_following_id = ?1
                     ORDER BY u.username"
                ),
                user_id,
            )
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "{USER_SELECT}
                     JOIN follows f ON f.user_following_id = u.id
                     WHERE f.user_being_followed_id = ?1
                     ORDER BY u.username"
                ),
                user_id,
            )
        })
    }
}

fn ensure_users(conn: &Connection, a: i64, b: i64) -> Result<()> {
    if !user_exists(conn, a)? || !user_exists(conn, b)? {
        return Err(DbError::NotFound("user"));
    }
    Ok(())
}

fn insert_follow(conn: &Connection, follower_id: i64, followee_id: i64) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
        params![followee_id, follower_id],
    )?;
    Ok(n > 0)
}

fn delete_follow(conn: &Connection, follower_id: i64, followee_id: i64) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
        params![followee_id, follower_id],
    )?;
    Ok(n > 0)
}

fn query_is_following(conn: &Connection, follower_id: i64, followee_id: i64) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
            params![followee_id, follower_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

pub(crate) fn query_users(conn: &Connection, sql: &str, id: i64) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([id], UserRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
