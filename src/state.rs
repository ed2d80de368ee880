//! Shared application state for all routes.

use crate::auth::SessionStore;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionStore>,
    /// Cookie consulted when no bearer token is sent.
    pub session_cookie: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, sessions: Arc<dyn SessionStore>, session_cookie: &str) -> Self {
        AppState {
            store,
            sessions,
            session_cookie: Arc::from(session_cookie),
        }
    }
}
