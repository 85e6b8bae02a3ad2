use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use warbler_types::models::UserStats;

use crate::models::{
    DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, NewUser, ProfileUpdate, USER_SELECT, UserRow,
    non_blank,
};
use crate::{Database, DbError, Result, password};

impl Database {
    /// Validate, hash the password, and insert the user in one transaction.
    ///
    /// A taken username or email surfaces as `DbError::UniqueViolation` with
    /// nothing written.
    pub fn signup(&self, new: &NewUser<'_>) -> Result<UserRow> {
        let (username, email) = check_identity(new.username, new.email)?;
        if new.password.is_empty() {
            return Err(DbError::invalid("password is required"));
        }

        let password_hash = password::hash(new.password)?;
        let image_url = non_blank(new.image_url).unwrap_or(DEFAULT_IMAGE_URL);

        let user = self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (username, email, image_url, password) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, image_url, password_hash],
            )?;
            query_user_by_id(tx, tx.last_insert_rowid())?.ok_or(DbError::NotFound("user"))
        })?;

        info!(user_id = user.id, "User {} signed up", user.username);
        Ok(user)
    }

    /// `Some(user)` when the password verifies, `None` otherwise. Unknown
    /// usernames still pay for a hash verification.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        match self.get_user_by_username(username.trim())? {
            Some(user) if password::verify(password, &user.password) => Ok(Some(user)),
            Some(_) => {
                debug!("Authentication failed");
                Ok(None)
            }
            None => {
                password::verify_dummy(password);
                debug!("Authentication failed");
                Ok(None)
            }
        }
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE u.username = ?1"))?;
            Ok(stmt.query_row([username], UserRow::from_row).optional()?)
        })
    }

    /// Users whose username contains `query`; everyone when it is blank.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserRow>> {
        let query = query.trim();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{USER_SELECT} WHERE ?1 = '' OR instr(lower(u.username), lower(?1)) > 0 \
                 ORDER BY u.username"
            ))?;
            let rows = stmt
                .query_map([query], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `None` fields keep their stored value. A blank image URL resets it to
    /// the default and a blank bio or location clears it.
    pub fn update_profile(&self, id: i64, update: &ProfileUpdate<'_>) -> Result<UserRow> {
        let (username, email) = check_identity(update.username, update.email)?;

        let user = self.with_tx(|tx| {
            let current = query_user_by_id(tx, id)?.ok_or(DbError::NotFound("user"))?;

            let image_url = match update.image_url {
                Some(url) => non_blank(Some(url)).unwrap_or(DEFAULT_IMAGE_URL),
                None => current.image_url.as_str(),
            };
            let header_image_url = match update.header_image_url {
                Some(url) => non_blank(Some(url)).unwrap_or(DEFAULT_HEADER_IMAGE_URL),
                None => current.header_image_url.as_str(),
            };
            let bio = match update.bio {
                Some(bio) => non_blank(Some(bio)),
                None => current.bio.as_deref(),
            };
            let location = match update.location {
                Some(location) => non_blank(Some(location)),
                None => current.location.as_deref(),
            };

            tx.execute(
                "UPDATE users
                 SET username = ?1, email = ?2, image_url = ?3, header_image_url = ?4,
                     bio = ?5, location = ?6
                 WHERE id = ?7",
                params![username, email, image_url, header_image_url, bio, location, id],
            )?;
            query_user_by_id(tx, id)?.ok_or(DbError::NotFound("user"))
        })?;

        info!(user_id = id, "Profile updated");
        Ok(user)
    }

    /// Delete a user. Messages, follows in both directions and likes go with it.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            if tx.execute("DELETE FROM users WHERE id = ?1", [id])? == 0 {
                return Err(DbError::NotFound("user"));
            }
            Ok(())
        })?;

        info!(user_id = id, "User deleted");
        Ok(())
    }

    pub fn user_stats(&self, id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            let (messages, followers, following, likes): (i64, i64, i64, i64) = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_following_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?;
            Ok(UserStats {
                messages: messages as usize,
                followers: followers as usize,
                following: following as usize,
                likes: likes as usize,
            })
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE u.id = ?1"))?;
    Ok(stmt.query_row([id], UserRow::from_row).optional()?)
}

pub(crate) fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Trimmed username and email, or the reason they are unusable.
fn check_identity<'a>(username: &'a str, email: &'a str) -> Result<(&'a str, &'a str)> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() {
        return Err(DbError::invalid("username is required"));
    }
    if !is_valid_email(email) {
        return Err(DbError::invalid("email is not valid"));
    }
    Ok((username, email))
}

/// RFC 5322 address syntax, bare address only (no display name), with a
/// dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    match email.parse::<EmailAddress>() {
        Ok(addr) => {
            addr.domain().contains('.')
                && format!("{}@{}", addr.local_part(), addr.domain()) == email
        }
        Err(_) => false,
    }
}
