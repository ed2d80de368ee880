//! PostgreSQL store over a sqlx pool. One statement per call, except nested create which uses a transaction.

use super::{missing_client, Store};
use crate::error::AppError;
use crate::model::{AddressFields, Client, ClientAddress, ClientFields, NewClient, NewClientAddress};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

const ADDRESS_COLUMNS: &str =
    "id, address1, number, address2, city, country, state, postcode, client_id";

/// Client row joined with its lowest-id address. Address columns are prefixed `a_`.
const CLIENT_SELECT: &str = r#"
    SELECT c.id, c.first_name, c.last_name, c.email, c.phone,
           a.id AS a_id, a.address1 AS a_address1, a.number AS a_number,
           a.address2 AS a_address2, a.city AS a_city, a.country AS a_country,
           a.state AS a_state, a.postcode AS a_postcode
    FROM clients c
    LEFT JOIN LATERAL (
        SELECT * FROM client_addresses WHERE client_id = c.id ORDER BY id LIMIT 1
    ) a ON TRUE
"#;

/// Postgres error code for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(FromRow)]
struct ClientRow {
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    email: String,
    phone: Option<String>,
    a_id: Option<i64>,
    a_address1: Option<String>,
    a_number: Option<String>,
    a_address2: Option<String>,
    a_city: Option<String>,
    a_country: Option<String>,
    a_state: Option<String>,
    a_postcode: Option<String>,
}

impl From<ClientRow> for Client {
    fn from(r: ClientRow) -> Self {
        let address = r.a_id.map(|address_id| {
            ClientAddress::from_fields(
                address_id,
                r.id,
                AddressFields {
                    address1: r.a_address1,
                    number: r.a_number,
                    address2: r.a_address2,
                    city: r.a_city,
                    country: r.a_country,
                    state: r.a_state,
                    postcode: r.a_postcode,
                },
            )
        });
        Client {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            address,
        }
    }
}

#[derive(FromRow)]
struct AddressRow {
    id: i64,
    address1: Option<String>,
    number: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    country: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    client_id: i64,
}

impl From<AddressRow> for ClientAddress {
    fn from(r: AddressRow) -> Self {
        ClientAddress {
            id: r.id,
            address1: r.address1,
            number: r.number,
            address2: r.address2,
            city: r.city,
            country: r.country,
            state: r.state,
            postcode: r.postcode,
            client_id: r.client_id,
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn insert_address<'e, E>(
        executor: E,
        client_id: i64,
        fields: &AddressFields,
    ) -> Result<ClientAddress, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO client_addresses (address1, number, address2, city, country, state, postcode, client_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            ADDRESS_COLUMNS
        );
        tracing::debug!(sql = %sql, client_id, "query");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(&fields.address1)
            .bind(&fields.number)
            .bind(&fields.address2)
            .bind(&fields.city)
            .bind(&fields.country)
            .bind(&fields.state)
            .bind(&fields.postcode)
            .bind(client_id)
            .fetch_one(executor)
            .await
            .map_err(|e| foreign_key_to_validation(e, client_id))?;
        Ok(row.into())
    }
}

fn foreign_key_to_validation(err: sqlx::Error, client_id: i64) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            missing_client(client_id)
        }
        _ => AppError::Db(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let sql = format!("{} ORDER BY c.id", CLIENT_SELECT);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, ClientRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn get_client(&self, id: i64) -> Result<Option<Client>, AppError> {
        let sql = format!("{} WHERE c.id = $1", CLIENT_SELECT);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Client::from))
    }

    async fn create_client(&self, new: NewClient) -> Result<Client, AppError> {
        let sql = "INSERT INTO clients (first_name, last_name, email, phone) VALUES ($1, $2, $3, $4) RETURNING id";
        tracing::debug!(sql = %sql, "query (tx)");
        let mut tx = self.pool.begin().await?;
        let (id,): (i64,) = sqlx::query_as(sql)
            .bind(&new.fields.first_name)
            .bind(&new.fields.last_name)
            .bind(&new.fields.email)
            .bind(&new.fields.phone)
            .fetch_one(&mut *tx)
            .await?;
        let address = match &new.address {
            Some(fields) => Some(Self::insert_address(&mut *tx, id, fields).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(Client::from_fields(id, new.fields, address))
    }

    async fn update_client(&self, id: i64, fields: ClientFields) -> Result<u64, AppError> {
        let sql = "UPDATE clients SET first_name = $1, last_name = $2, email = $3, phone = $4 WHERE id = $5";
        tracing::debug!(sql = %sql, id, "query");
        let result = sqlx::query(sql)
            .bind(&fields.first_name)
            .bind(&fields.last_name)
            .bind(&fields.email)
            .bind(&fields.phone)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_client(&self, id: i64) -> Result<u64, AppError> {
        let sql = "DELETE FROM clients WHERE id = $1";
        tracing::debug!(sql = %sql, id, "query");
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn list_addresses(&self) -> Result<Vec<ClientAddress>, AppError> {
        let sql = format!("SELECT {} FROM client_addresses ORDER BY id", ADDRESS_COLUMNS);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, AddressRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ClientAddress::from).collect())
    }

    async fn get_address(&self, id: i64) -> Result<Option<ClientAddress>, AppError> {
        let sql = format!("SELECT {} FROM client_addresses WHERE id = $1", ADDRESS_COLUMNS);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ClientAddress::from))
    }

    async fn get_address_by_client(&self, client_id: i64) -> Result<Option<ClientAddress>, AppError> {
        let sql = format!(
            "SELECT {} FROM client_addresses WHERE client_id = $1 ORDER BY id LIMIT 1",
            ADDRESS_COLUMNS
        );
        tracing::debug!(sql = %sql, client_id, "query");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ClientAddress::from))
    }

    async fn create_address(&self, new: NewClientAddress) -> Result<ClientAddress, AppError> {
        Self::insert_address(&self.pool, new.client_id, &new.fields).await
    }

    async fn update_address(&self, id: i64, fields: AddressFields) -> Result<u64, AppError> {
        let sql = "UPDATE client_addresses SET address1 = $1, number = $2, address2 = $3, city = $4, \
                   country = $5, state = $6, postcode = $7 WHERE id = $8";
        tracing::debug!(sql = %sql, id, "query");
        let result = sqlx::query(sql)
            .bind(&fields.address1)
            .bind(&fields.number)
            .bind(&fields.address2)
            .bind(&fields.city)
            .bind(&fields.country)
            .bind(&fields.state)
            .bind(&fields.postcode)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_address(&self, id: i64) -> Result<u64, AppError> {
        let sql = "DELETE FROM client_addresses WHERE id = $1";
        tracing::debug!(sql = %sql, id, "query");
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Run against a live database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn live_store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        crate::migration::apply_migrations(&pool)
            .await
            .expect("apply migrations");
        Some(PgStore::new(pool))
    }

    fn new_client(email: &str, address: Option<AddressFields>) -> NewClient {
        NewClient {
            fields: ClientFields {
                first_name: Some("Ada".into()),
                last_name: Some("Lovelace".into()),
                email: email.into(),
                phone: Some("+44 20 7946 0958".into()),
            },
            address,
        }
    }

    fn oslo() -> AddressFields {
        AddressFields {
            address1: Some("Karl Johans gate".into()),
            number: Some("22".into()),
            city: Some("Oslo".into()),
            postcode: Some("0159".into()),
            ..AddressFields::default()
        }
    }

    #[tokio::test]
    #[ignore]
    async fn nested_create_then_get_returns_same_client() {
        let Some(store) = live_store().await else { return };
        let created = store
            .create_client(new_client("nested@example.com", Some(oslo())))
            .await
            .unwrap();
        let address = created.address.clone().expect("nested address");
        assert_eq!(address.client_id, created.id);
        assert_eq!(address.city.as_deref(), Some("Oslo"));

        let fetched = store.get_client(created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));
        let by_client = store.get_address_by_client(created.id).await.unwrap();
        assert_eq!(by_client, Some(address));
    }

    #[tokio::test]
    #[ignore]
    async fn address_for_missing_client_is_a_validation_error() {
        let Some(store) = live_store().await else { return };
        let err = store
            .create_address(NewClientAddress {
                client_id: -1,
                fields: oslo(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    }

    #[tokio::test]
    #[ignore]
    async fn deleting_client_cascades_to_addresses() {
        let Some(store) = live_store().await else { return };
        let created = store
            .create_client(new_client("cascade@example.com", Some(oslo())))
            .await
            .unwrap();
        let address_id = created.address.as_ref().map(|a| a.id).expect("nested address");

        assert_eq!(store.delete_client(created.id).await.unwrap(), 1);
        assert_eq!(store.get_client(created.id).await.unwrap(), None);
        assert_eq!(store.get_address(address_id).await.unwrap(), None);
        assert_eq!(store.delete_client(created.id).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore]
    async fn update_of_missing_rows_affects_nothing() {
        let Some(store) = live_store().await else { return };
        let fields = new_client("ghost@example.com", None).fields;
        assert_eq!(store.update_client(-1, fields).await.unwrap(), 0);
        assert_eq!(store.update_address(-1, oslo()).await.unwrap(), 0);
    }
}
