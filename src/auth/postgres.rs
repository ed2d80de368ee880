use super::{Principal, SessionStore};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

/// Sessions persisted by the identity provider in the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        PgSessionStore { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT subject FROM sessions WHERE token = $1 AND expires_at > NOW()")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(subject,)| Principal { subject }))
    }
}
