//! Credential hashing. Argon2id with a fresh random salt per hash, stored as
//! a PHC string; verification goes through the library's constant-time check.

use std::sync::OnceLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::warn;

use crate::{DbError, Result};

/// Hash compared against when the username is unknown, so a miss costs the
/// same as a wrong password. Built by `prepare_dummy` when a store opens.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DbError::PasswordHash(e.to_string()))
}

pub fn verify(plaintext: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

pub(crate) fn prepare_dummy() {
    DUMMY_HASH.get_or_init(|| hash("not-a-real-password").ok());
}

/// Burn one verification against the dummy hash. Always a no-match.
pub(crate) fn verify_dummy(plaintext: &str) {
    prepare_dummy();
    if let Some(Some(dummy)) = DUMMY_HASH.get() {
        let _ = verify(plaintext, dummy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let a = hash("password").unwrap();
        let b = hash("password").unwrap();

        assert_ne!(a, "password");
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify("password", &a));
        assert!(verify("password", &b));
    }

    #[test]
    fn wrong_password_fails() {
        let h = hash("password").unwrap();
        assert!(!verify("Password", &h));
        assert!(!verify("", &h));
    }

    #[test]
    fn opening_a_store_prepares_the_dummy_hash() {
        crate::Database::open_in_memory().unwrap();
        assert!(matches!(DUMMY_HASH.get(), Some(Some(h)) if h.starts_with("$argon2id$")));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify("password", "password"));
        assert!(!verify("password", ""));
    }
}
