//! In-process store. Mirrors the PostgreSQL schema's rules: store-assigned ids,
//! foreign key on `client_id`, cascade on client delete.

use super::{missing_client, Store};
use crate::error::AppError;
use crate::model::{AddressFields, Client, ClientAddress, ClientFields, NewClient, NewClientAddress};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    clients: BTreeMap<i64, Client>,
    addresses: BTreeMap<i64, ClientAddress>,
    next_client_id: i64,
    next_address_id: i64,
}

impl Tables {
    fn next_client_id(&mut self) -> i64 {
        self.next_client_id += 1;
        self.next_client_id
    }

    fn next_address_id(&mut self) -> i64 {
        self.next_address_id += 1;
        self.next_address_id
    }

    fn address_of(&self, client_id: i64) -> Option<&ClientAddress> {
        self.addresses.values().find(|a| a.client_id == client_id)
    }

    fn with_address(&self, client: &Client) -> Client {
        let mut out = client.clone();
        out.address = self.address_of(client.id).cloned();
        out
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let t = self.tables.read().await;
        Ok(t.clients.values().map(|c| t.with_address(c)).collect())
    }

    async fn get_client(&self, id: i64) -> Result<Option<Client>, AppError> {
        let t = self.tables.read().await;
        Ok(t.clients.get(&id).map(|c| t.with_address(c)))
    }

    async fn create_client(&self, new: NewClient) -> Result<Client, AppError> {
        let mut t = self.tables.write().await;
        let id = t.next_client_id();
        let address = new.address.map(|fields| {
            let address_id = t.next_address_id();
            let address = ClientAddress::from_fields(address_id, id, fields);
            t.addresses.insert(address_id, address.clone());
            address
        });
        let stored = Client::from_fields(id, new.fields, None);
        t.clients.insert(id, stored.clone());
        Ok(Client { address, ..stored })
    }

    async fn update_client(&self, id: i64, fields: ClientFields) -> Result<u64, AppError> {
        let mut t = self.tables.write().await;
        match t.clients.get_mut(&id) {
            Some(client) => {
                *client = Client::from_fields(id, fields, None);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_client(&self, id: i64) -> Result<u64, AppError> {
        let mut t = self.tables.write().await;
        if t.clients.remove(&id).is_none() {
            return Ok(0);
        }
        t.addresses.retain(|_, a| a.client_id != id);
        Ok(1)
    }

    async fn list_addresses(&self) -> Result<Vec<ClientAddress>, AppError> {
        let t = self.tables.read().await;
        Ok(t.addresses.values().cloned().collect())
    }

    async fn get_address(&self, id: i64) -> Result<Option<ClientAddress>, AppError> {
        let t = self.tables.read().await;
        Ok(t.addresses.get(&id).cloned())
    }

    async fn get_address_by_client(&self, client_id: i64) -> Result<Option<ClientAddress>, AppError> {
        let t = self.tables.read().await;
        Ok(t.address_of(client_id).cloned())
    }

    async fn create_address(&self, new: NewClientAddress) -> Result<ClientAddress, AppError> {
        let mut t = self.tables.write().await;
        if !t.clients.contains_key(&new.client_id) {
            return Err(missing_client(new.client_id));
        }
        let id = t.next_address_id();
        let address = ClientAddress::from_fields(id, new.client_id, new.fields);
        t.addresses.insert(id, address.clone());
        Ok(address)
    }

    async fn update_address(&self, id: i64, fields: AddressFields) -> Result<u64, AppError> {
        let mut t = self.tables.write().await;
        match t.addresses.get_mut(&id) {
            Some(address) => {
                address.overwrite(fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_address(&self, id: i64) -> Result<u64, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.addresses.remove(&id).map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(email: &str) -> NewClient {
        NewClient {
            fields: ClientFields {
                first_name: None,
                last_name: None,
                email: email.into(),
                phone: None,
            },
            address: None,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order() {
        let store = MemoryStore::new();
        let a = store.create_client(new_client("a@example.com")).await.unwrap();
        let b = store.create_client(new_client("b@example.com")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn deleting_client_cascades_to_addresses() {
        let store = MemoryStore::new();
        let client = store.create_client(new_client("a@example.com")).await.unwrap();
        let addr = store
            .create_address(NewClientAddress {
                client_id: client.id,
                fields: AddressFields::default(),
            })
            .await
            .unwrap();
        assert_eq!(store.delete_client(client.id).await.unwrap(), 1);
        assert!(store.get_address(addr.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn address_for_missing_client_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_address(NewClientAddress {
                client_id: 42,
                fields: AddressFields::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.list_addresses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nested_address_is_owned_by_new_client() {
        let store = MemoryStore::new();
        let mut new = new_client("a@example.com");
        new.address = Some(AddressFields {
            city: Some("Oslo".into()),
            ..AddressFields::default()
        });
        let client = store.create_client(new).await.unwrap();
        let addr = client.address.expect("nested address");
        assert_eq!(addr.client_id, client.id);
        let fetched = store.get_client(client.id).await.unwrap().unwrap();
        assert_eq!(fetched.address.as_ref().map(|a| a.id), Some(addr.id));
    }
}
