//! Database row types. These map directly to SQLite rows and stay distinct
//! from the warbler-types API models so the password hash cannot leak out.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use warbler_types::models::{Message, User, UserSummary};

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";
pub const MAX_MESSAGE_LEN: usize = 140;

pub(crate) const USER_SELECT: &str = "SELECT u.id, u.username, u.email, u.image_url, \
     u.header_image_url, u.bio, u.location, u.password FROM users u";

pub(crate) const MESSAGE_SELECT: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, \
     (SELECT COUNT(*) FROM likes l WHERE l.message_id = m.id) \
     FROM messages m JOIN users u ON u.id = m.user_id";

#[derive(Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Argon2 PHC string, never plaintext.
    pub password: String,
}

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            image_url: row.get(3)?,
            header_image_url: row.get(4)?,
            bio: row.get(5)?,
            location: row.get(6)?,
            password: row.get(7)?,
        })
    }
}

impl fmt::Display for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User #{}: {}, {}>", self.id, self.username, self.email)
    }
}

// Hand-written so the hash never ends up in a log line.
impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
        }
    }
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        UserSummary {
            id: row.id,
            username: row.username,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub username: String,
    pub like_count: usize,
}

impl MessageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let ts: String = row.get(2)?;
        let like_count: i64 = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            timestamp: parse_timestamp(2, &ts)?,
            user_id: row.get(3)?,
            username: row.get(4)?,
            like_count: like_count.max(0) as usize,
        })
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            text: row.text,
            timestamp: row.timestamp,
            user_id: row.user_id,
            username: row.username,
            like_count: row.like_count,
        }
    }
}

/// Input to `Database::signup`. `password` is plaintext and is hashed before
/// it gets anywhere near the store.
#[derive(Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub image_url: Option<&'a str>,
}

/// Editable profile fields. `None` leaves the stored value alone; a blank
/// image URL falls back to the default and a blank bio/location is stored as
/// NULL.
#[derive(Debug, Clone, Copy)]
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

/// Fixed-width RFC 3339 so lexical order in SQLite matches time order.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserRow {
        UserRow {
            id: 1,
            username: "test1".into(),
            email: "test1@test.com".into(),
            image_url: DEFAULT_IMAGE_URL.into(),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.into(),
            bio: None,
            location: None,
            password: "$argon2id$v=19$secret".into(),
        }
    }

    #[test]
    fn user_display() {
        assert_eq!(row().to_string(), "<User #1: test1, test1@test.com>");
    }

    #[test]
    fn debug_redacts_password() {
        let dbg = format!("{:?}", row());
        assert!(dbg.contains("test1"));
        assert!(!dbg.contains("secret"));
    }

    #[test]
    fn timestamps_round_trip_at_fixed_width() {
        let ts = Utc::now();
        let s = format_timestamp(ts);
        assert_eq!(s.len(), "2024-01-01T00:00:00.000000Z".len());
        let back = parse_timestamp(0, &s).unwrap();
        assert_eq!(back.timestamp_micros(), ts.timestamp_micros());
    }
}
