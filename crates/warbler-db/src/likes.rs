use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::follows::query_users;
use crate::messages::query_messages;
use crate::models::{MESSAGE_SELECT, MessageRow, USER_SELECT, UserRow};
use crate::users::user_exists;
use crate::{Database, DbError, Result};

impl Database {
    /// Returns `false` when the like already existed.
    pub fn like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        let created = self.with_tx(|tx| {
            check_likeable(tx, user_id, message_id)?;
            insert_like(tx, user_id, message_id)
        })?;

        if created {
            info!(user_id, message_id, "Like added");
        }
        Ok(created)
    }

    pub fn unlike(&self, user_id: i64, message_id: i64) -> Result<bool> {
        let removed = self.with_tx(|tx| delete_like(tx, user_id, message_id))?;

        if removed {
            info!(user_id, message_id, "Like removed");
        }
        Ok(removed)
    }

    /// Flip the like. Returns the new state: `true` means liked.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            check_likeable(tx, user_id, message_id)?;
            if query_has_liked(tx, user_id, message_id)? {
                delete_like(tx, user_id, message_id)?;
                Ok(false)
            } else {
                insert_like(tx, user_id, message_id)?;
                Ok(true)
            }
        })
    }

    pub fn has_liked(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| query_has_liked(conn, user_id, message_id))
    }

    /// Messages `user_id` has liked, newest first.
    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "{MESSAGE_SELECT}
                     JOIN likes lk ON lk.message_id = m.id
                     WHERE lk.user_id = ?1
                     ORDER BY m.timestamp DESC, m.id DESC"
                ),
                [user_id],
            )
        })
    }

    pub fn likers(&self, message_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "{USER_SELECT}
                     JOIN likes lk ON lk.user_id = u.id
                     WHERE lk.message_id = ?1
                     ORDER BY u.username"
                ),
                message_id,
            )
        })
    }
}

/// The message must exist, the user must exist, and nobody likes their own
/// warble.
fn check_likeable(conn: &Connection, user_id: i64, message_id: i64) -> Result<()> {
    let author: Option<i64> = conn
        .query_row("SELECT user_id FROM messages WHERE id = ?1", [message_id], |r| r.get(0))
        .optional()?;
    match author {
        None => Err(DbError::NotFound("message")),
        Some(author) if author == user_id => {
            Err(DbError::invalid("users cannot like their own messages"))
        }
        Some(_) if !user_exists(conn, user_id)? => Err(DbError::NotFound("user")),
        Some(_) => Ok(()),
    }
}

fn insert_like(conn: &Connection, user_id: i64, message_id: i64) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?1, ?2)",
        params![user_id, message_id],
    )?;
    Ok(n > 0)
}

fn delete_like(conn: &Connection, user_id: i64, message_id: i64) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
        params![user_id, message_id],
    )?;
    Ok(n > 0)
}

fn query_has_liked(conn: &Connection, user_id: i64, message_id: i64) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2",
            params![user_id, message_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}
