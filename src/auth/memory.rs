use super::{Principal, SessionStore};
use crate::config::SeedToken;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Session {
    subject: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Session tokens held in process. Seeded tokens never expire.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: &[SeedToken]) -> Self {
        let sessions = tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Session {
                        subject: t.subject.clone(),
                        expires_at: None,
                    },
                )
            })
            .collect();
        MemorySessionStore {
            sessions: RwLock::new(sessions),
        }
    }

    /// Mint a random token for `subject`, optionally expiring after `ttl`.
    pub async fn issue(&self, subject: &str, ttl: Option<Duration>) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = Session {
            subject: subject.to_string(),
            expires_at: ttl.map(|d| Utc::now() + d),
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, AppError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(token)
            .filter(|s| s.expires_at.map_or(true, |at| at > Utc::now()))
            .map(|s| Principal {
                subject: s.subject.clone(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_token_resolves_to_subject() {
        let store = MemorySessionStore::with_tokens(&[SeedToken {
            token: "t1".into(),
            subject: "alice".into(),
        }]);
        let p = store.resolve("t1").await.unwrap().unwrap();
        assert_eq!(p.subject, "alice");
        assert!(store.resolve("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let store = MemorySessionStore::new();
        let token = store.issue("bob", Some(Duration::seconds(-1))).await;
        assert!(store.resolve(&token).await.unwrap().is_none());
    }
}
