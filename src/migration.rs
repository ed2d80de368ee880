//! Schema DDL for clients, client addresses, and sessions. Idempotent; safe to run on every start.

use crate::error::{AppError, ConfigError};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Statements in dependency order: `client_addresses` references `clients`.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id BIGSERIAL PRIMARY KEY,
        first_name TEXT,
        last_name TEXT,
        email TEXT NOT NULL,
        phone TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_clients_first_name_last_name ON clients (first_name, last_name)",
    r#"
    CREATE TABLE IF NOT EXISTS client_addresses (
        id BIGSERIAL PRIMARY KEY,
        address1 TEXT,
        number VARCHAR(20),
        address2 TEXT,
        city TEXT,
        country VARCHAR(200),
        state VARCHAR(200),
        postcode VARCHAR(15),
        client_id BIGINT NOT NULL REFERENCES clients (id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_client_addresses_client_id ON client_addresses (client_id)",
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        subject TEXT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Create tables and indexes if missing.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(statements = SCHEMA.len(), "schema up to date");
    Ok(())
}

/// Connect to the server's `postgres` database and create the target database if it does not exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| invalid_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| invalid_url("no database path".into()))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres{}", base, query);
    Ok((admin_url, db_name.to_string()))
}

fn invalid_url(message: String) -> AppError {
    AppError::Config(ConfigError::Invalid {
        key: "DATABASE_URL",
        message,
    })
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
