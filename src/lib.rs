//! Client registry: authenticated REST backend for clients and their addresses.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use auth::{MemorySessionStore, PgSessionStore, Principal, SessionStore};
pub use config::{Settings, StoreKind};
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, ensure_database_exists};
pub use model::{Client, ClientAddress};
pub use routes::{api_routes, app, common_routes};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};
