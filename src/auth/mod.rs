//! Session authentication for the API routes.
//!
//! Sessions are issued by the identity provider; this layer only resolves a token
//! to a principal. Every `/api` request passes through [`require_session`] before
//! any extractor or handler runs, so unauthenticated requests fail with 401
//! whatever their payload.

mod memory;
mod postgres;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Authenticated caller attached to the request by [`require_session`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a token to its principal. Unknown or expired tokens yield `None`.
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, AppError>;
}

/// Bearer token first, then the named session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let mut parts = value.trim().splitn(2, ' ');
        if let (Some(scheme), Some(token)) = (parts.next(), parts.next()) {
            let token = token.trim();
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Middleware: reject the request unless it carries a valid session.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(req.headers(), &state.session_cookie)
        .ok_or_else(|| AppError::Unauthorized("missing session".into()))?;
    let principal = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid or expired session".into()))?;
    tracing::debug!(subject = %principal.subject, "session accepted");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("abc123"));
    }

    #[test]
    fn reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=tok; x=y"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("tok"));
    }

    #[test]
    fn ignores_other_schemes_and_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("other=tok"));
        assert_eq!(session_token(&headers, "session"), None);
    }

    #[test]
    fn empty_bearer_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=fromcookie"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("fromcookie"));
    }
}
