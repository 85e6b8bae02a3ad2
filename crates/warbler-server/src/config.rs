use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("WARBLER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("WARBLER_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = get("WARBLER_DB_PATH").unwrap_or_else(|| "warbler.db".into());
        let host = get("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("WARBLER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;
        let ttl_days: i64 = get("WARBLER_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("WARBLER_TOKEN_TTL_DAYS must be a whole number of days")?;
        if ttl_days <= 0 {
            bail!("WARBLER_TOKEN_TTL_DAYS must be positive");
        }

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("WARBLER_HOST/WARBLER_PORT do not form a socket address")?;

        Ok(Self {
            db_path: db_path.into(),
            addr,
            jwt_secret,
            token_ttl: chrono::Duration::days(ttl_days),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("WARBLER_JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.db_path, PathBuf::from("warbler.db"));
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.token_ttl, chrono::Duration::days(30));
    }

    #[test]
    fn missing_or_placeholder_secret_is_fatal() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("WARBLER_JWT_SECRET", "dev-secret-change-me")])).is_err()
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let port = lookup(&[("WARBLER_JWT_SECRET", "s3cret"), ("WARBLER_PORT", "http")]);
        assert!(Config::from_lookup(port).is_err());

        let ttl = lookup(&[("WARBLER_JWT_SECRET", "s3cret"), ("WARBLER_TOKEN_TTL_DAYS", "0")]);
        assert!(Config::from_lookup(ttl).is_err());
    }
}
