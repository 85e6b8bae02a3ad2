use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::models::{MAX_MESSAGE_LEN, MESSAGE_SELECT, MessageRow, format_timestamp};
use crate::users::user_exists;
use crate::{Database, DbError, Result};

pub const DEFAULT_TIMELINE_LIMIT: u32 = 100;

impl Database {
    pub fn create_message(&self, user_id: i64, text: &str) -> Result<MessageRow> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DbError::invalid("message text is required"));
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(DbError::invalid(format!(
                "message text is limited to {MAX_MESSAGE_LEN} characters"
            )));
        }

        let message = self.with_tx(|tx| {
            if !user_exists(tx, user_id)? {
                return Err(DbError::NotFound("user"));
            }
            tx.execute(
                "INSERT INTO messages (text, timestamp, user_id) VALUES (?1, ?2, ?3)",
                params![text, format_timestamp(Utc::now()), user_id],
            )?;
            query_message(tx, tx.last_insert_rowid())?.ok_or(DbError::NotFound("message"))
        })?;

        info!(user_id, message_id = message.id, "Message created");
        Ok(message)
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Only the author may delete a message.
    pub fn delete_message(&self, id: i64, owner_id: i64) -> Result<()> {
        self.with_tx(|tx| {
            let author: Option<i64> = tx
                .query_row("SELECT user_id FROM messages WHERE id = ?1", [id], |r| r.get(0))
                .optional()?;
            match author {
                None => return Err(DbError::NotFound("message")),
                Some(author) if author != owner_id => {
                    return Err(DbError::Forbidden("message belongs to another user"));
                }
                Some(_) => {}
            }
            tx.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(())
        })?;

        info!(message_id = id, "Message deleted");
        Ok(())
    }

    /// A user's own messages, newest first.
    pub fn user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!("{MESSAGE_SELECT} WHERE m.user_id = ?1 ORDER BY m.timestamp DESC, m.id DESC LIMIT ?2"),
                params![user_id, limit],
            )
        })
    }

    /// Messages by the user and everyone they follow, newest first.
    pub fn home_timeline(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "{MESSAGE_SELECT}
                     WHERE m.user_id = ?1
                        OR m.user_id IN (
                            SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
                        )
                     ORDER BY m.timestamp DESC, m.id DESC
                     LIMIT ?2"
                ),
                params![user_id, limit],
            )
        })
    }
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!("{MESSAGE_SELECT} WHERE m.id = ?1"))?;
    Ok(stmt.query_row([id], MessageRow::from_row).optional()?)
}

pub(crate) fn query_messages(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, MessageRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{count, db, seed_user};

    #[test]
    fn create_and_fetch() {
        let db = db();
        let user = seed_user(&db, "test1");

        let msg = db.create_message(user.id, "  first warble  ").unwrap();
        assert_eq!(msg.text, "first warble");
        assert_eq!(msg.user_id, user.id);
        assert_eq!(msg.username, "test1");
        assert_eq!(msg.like_count, 0);

        let fetched = db.get_message(msg.id).unwrap().unwrap();
        assert_eq!(fetched.timestamp, msg.timestamp);
    }

    #[test]
    fn text_must_be_present_and_short() {
        let db = db();
        let user = seed_user(&db, "test1");

        assert!(matches!(db.create_message(user.id, "   ").unwrap_err(), DbError::Invalid(_)));
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(db.create_message(user.id, &long).unwrap_err(), DbError::Invalid(_)));
        db.create_message(user.id, &"é".repeat(MAX_MESSAGE_LEN)).unwrap();
        assert_eq!(count(&db, "messages"), 1);
    }

    #[test]
    fn message_needs_an_existing_owner() {
        let db = db();
        assert!(matches!(db.create_message(7, "orphan").unwrap_err(), DbError::NotFound("user")));
    }

    #[test]
    fn only_the_author_can_delete() {
        let db = db();
        let author = seed_user(&db, "test1");
        let other = seed_user(&db, "test2");
        let msg = db.create_message(author.id, "mine").unwrap();

        assert!(matches!(db.delete_message(msg.id, other.id).unwrap_err(), DbError::Forbidden(_)));
        db.delete_message(msg.id, author.id).unwrap();
        assert!(db.get_message(msg.id).unwrap().is_none());
        assert!(matches!(
            db.delete_message(msg.id, author.id).unwrap_err(),
            DbError::NotFound("message")
        ));
    }

    #[test]
    fn timeline_includes_self_and_followed_only() {
        let db = db();
        let a = seed_user(&db, "test1");
        let b = seed_user(&db, "test2");
        let c = seed_user(&db, "test3");

        db.create_message(a.id, "from a").unwrap();
        db.create_message(b.id, "from b").unwrap();
        db.create_message(c.id, "from c").unwrap();
        db.follow(a.id, b.id).unwrap();

        let texts: Vec<_> = db
            .home_timeline(a.id, DEFAULT_TIMELINE_LIMIT)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["from b", "from a"]);

        assert_eq!(db.home_timeline(a.id, 1).unwrap().len(), 1);
    }

    #[test]
    fn user_messages_newest_first() {
        let db = db();
        let a = seed_user(&db, "test1");
        let first = db.create_message(a.id, "one").unwrap();
        let second = db.create_message(a.id, "two").unwrap();

        let ids: Vec<_> = db.user_messages(a.id, 10).unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, [second.id, first.id]);
    }
}
