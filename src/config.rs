//! Runtime settings from environment variables (a `.env` file is loaded first by the binary).

use crate::error::ConfigError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;

/// Which `Store` backend the server runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(ConfigError::Invalid {
                key: "APP_STORE",
                message: format!("{} (expected postgres or memory)", other),
            }),
        }
    }
}

/// A pre-provisioned session token and the subject it authenticates as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedToken {
    pub token: String,
    pub subject: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    pub session_cookie: String,
    pub session_tokens: Vec<SeedToken>,
    pub body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/client_registry".into());
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5)?;
        let bind_addr = parse_or(
            "BIND_ADDR",
            get("BIND_ADDR"),
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;
        let store = match get("APP_STORE") {
            Some(v) => v.parse()?,
            None => StoreKind::Postgres,
        };
        let session_cookie = get("SESSION_COOKIE").unwrap_or_else(|| "session".into());
        let session_tokens = get("SESSION_TOKENS")
            .map(|v| parse_tokens(&v))
            .transpose()?
            .unwrap_or_default();
        let body_limit_bytes = parse_or("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), 64 * 1024)?;

        Ok(Settings {
            database_url,
            db_max_connections,
            bind_addr,
            store,
            session_cookie,
            session_tokens,
            body_limit_bytes,
        })
    }

    /// Convenience for tests and embedding: settings from a fixed map.
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("{}: {}", v, e),
        }),
        None => Ok(default),
    }
}

/// `token[:subject],...`; subject defaults to the token itself.
fn parse_tokens(raw: &str) -> Result<Vec<SeedToken>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (token, subject) = match entry.split_once(':') {
                Some((t, s)) => (t.trim(), s.trim()),
                None => (entry, entry),
            };
            if token.is_empty() || subject.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "SESSION_TOKENS",
                    message: format!("malformed entry '{}'", entry),
                });
            }
            Ok(SeedToken {
                token: token.to_string(),
                subject: subject.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_map(&HashMap::new()).unwrap();
        assert_eq!(s.database_url, "postgres://localhost/client_registry");
        assert_eq!(s.db_max_connections, 5);
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.store, StoreKind::Postgres);
        assert_eq!(s.session_cookie, "session");
        assert!(s.session_tokens.is_empty());
        assert_eq!(s.body_limit_bytes, 65536);
    }

    #[test]
    fn parses_overrides() {
        let map = HashMap::from([
            ("APP_STORE", "memory"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("SESSION_TOKENS", "abc:alice, def"),
        ]);
        let s = Settings::from_map(&map).unwrap();
        assert_eq!(s.store, StoreKind::Memory);
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(s.db_max_connections, 12);
        assert_eq!(
            s.session_tokens,
            vec![
                SeedToken { token: "abc".into(), subject: "alice".into() },
                SeedToken { token: "def".into(), subject: "def".into() },
            ]
        );
    }

    #[test]
    fn rejects_unknown_store() {
        let map = HashMap::from([("APP_STORE", "sqlite")]);
        let err = Settings::from_map(&map).unwrap_err();
        assert!(err.to_string().contains("APP_STORE"));
    }

    #[test]
    fn rejects_bad_number() {
        let map = HashMap::from([("DB_MAX_CONNECTIONS", "many")]);
        assert!(Settings::from_map(&map).is_err());
    }

    #[test]
    fn rejects_token_without_subject() {
        assert!(parse_tokens("abc:").is_err());
    }
}
