//! Persistence interface injected into handlers, with PostgreSQL and in-memory backends.
//!
//! Each call is one unit of work: the backend checks out what it needs
//! (a pooled connection, a transaction, a lock) and releases it before returning.
//! Update and delete report the number of rows they matched.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::model::{AddressFields, Client, ClientAddress, ClientFields, NewClient, NewClientAddress};
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_clients(&self) -> Result<Vec<Client>, AppError>;
    async fn get_client(&self, id: i64) -> Result<Option<Client>, AppError>;
    /// Insert a client and its nested address, if any, atomically.
    async fn create_client(&self, new: NewClient) -> Result<Client, AppError>;
    async fn update_client(&self, id: i64, fields: ClientFields) -> Result<u64, AppError>;
    /// Removes the client and, through the foreign key, its addresses.
    async fn delete_client(&self, id: i64) -> Result<u64, AppError>;

    async fn list_addresses(&self) -> Result<Vec<ClientAddress>, AppError>;
    async fn get_address(&self, id: i64) -> Result<Option<ClientAddress>, AppError>;
    /// Lowest-id address owned by `client_id`.
    async fn get_address_by_client(&self, client_id: i64) -> Result<Option<ClientAddress>, AppError>;
    /// Fails with `Validation` when `client_id` does not reference a client.
    async fn create_address(&self, new: NewClientAddress) -> Result<ClientAddress, AppError>;
    async fn update_address(&self, id: i64, fields: AddressFields) -> Result<u64, AppError>;
    async fn delete_address(&self, id: i64) -> Result<u64, AppError>;
}

pub(crate) fn missing_client(client_id: i64) -> AppError {
    AppError::Validation(format!("clientId {} does not reference an existing client", client_id))
}
