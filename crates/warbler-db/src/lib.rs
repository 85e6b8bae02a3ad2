pub mod error;
pub mod follows;
pub mod likes;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod password;
pub mod users;

pub use error::{DbError, Result};
pub use users::is_valid_email;

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Storage handle. Owned by whoever builds the app state and passed down
/// explicitly; there is no process-wide connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private, throwaway database. Each call is isolated from every other.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&mut conn)?;
        password::prepare_dummy();
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside one transaction. Any error rolls the whole thing back,
    /// so a failed write never leaves a partial row behind.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::Database;
    use crate::models::{NewUser, UserRow};

    pub fn db() -> Database {
        Database::open_in_memory().expect("in-memory db")
    }

    pub fn seed_user(db: &Database, name: &str) -> UserRow {
        let email = format!("{name}@test.com");
        db.signup(&NewUser {
            username: name,
            email: &email,
            password: "password",
            image_url: None,
        })
        .expect("signup")
    }

    pub fn count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
        })
        .expect("count")
    }
}
