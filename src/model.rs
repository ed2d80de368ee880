//! Client and client address shapes: wire responses, request payloads, validated field sets.

use crate::error::AppError;
use crate::validation::{validate_field, FieldRule, Format};
use serde::{Deserialize, Serialize};

const EMAIL: FieldRule = FieldRule::optional().required().format(Format::Email);
const PHONE: FieldRule = FieldRule::optional().format(Format::Phone);
const NUMBER: FieldRule = FieldRule::optional().max_length(20);
const COUNTRY: FieldRule = FieldRule::optional().max_length(200);
const STATE: FieldRule = FieldRule::optional().max_length(200);
const POSTCODE: FieldRule = FieldRule::optional().max_length(15);

/// A persisted client. `address` is the client's address when one exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<ClientAddress>,
}

/// A persisted client address. Belongs to exactly one client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAddress {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    pub client_id: i64,
}

/// Request body for client create and update. A body `id` is an unknown key and is dropped.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default, alias = "LastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<ClientAddressPayload>,
}

/// Request body for address create and update. A body `id` is an unknown key and is dropped.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAddressPayload {
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub client_id: Option<i64>,
}

/// Validated, writable client columns. Update overwrites all of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

/// Validated, writable address columns. `client_id` is not among them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub address1: Option<String>,
    pub number: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClient {
    pub fields: ClientFields,
    pub address: Option<AddressFields>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClientAddress {
    pub client_id: i64,
    pub fields: AddressFields,
}

impl ClientPayload {
    /// Validate for create: client columns plus the optional nested address.
    pub fn into_new_client(mut self) -> Result<NewClient, AppError> {
        let address = match self.address.take() {
            Some(a) => Some(a.into_fields().map_err(|e| nested("address", e))?),
            None => None,
        };
        Ok(NewClient {
            fields: self.into_fields()?,
            address,
        })
    }

    /// Validate for update: client columns only; nested address is ignored.
    pub fn into_fields(self) -> Result<ClientFields, AppError> {
        validate_field("email", self.email.as_deref(), &EMAIL)?;
        validate_field("phone", self.phone.as_deref(), &PHONE)?;
        // Both formats tolerate surrounding whitespace; it is not stored.
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .ok_or_else(|| AppError::Validation("email is required".into()))?;
        Ok(ClientFields {
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            phone: self.phone.map(|p| p.trim().to_string()),
        })
    }
}

impl ClientAddressPayload {
    /// Validate for create: `clientId` is required.
    pub fn into_new_address(self) -> Result<NewClientAddress, AppError> {
        let client_id = self
            .client_id
            .ok_or_else(|| AppError::Validation("clientId is required".into()))?;
        Ok(NewClientAddress {
            client_id,
            fields: self.into_fields()?,
        })
    }

    pub fn into_fields(self) -> Result<AddressFields, AppError> {
        validate_field("number", self.number.as_deref(), &NUMBER)?;
        validate_field("country", self.country.as_deref(), &COUNTRY)?;
        validate_field("state", self.state.as_deref(), &STATE)?;
        validate_field("postcode", self.postcode.as_deref(), &POSTCODE)?;
        Ok(AddressFields {
            address1: self.address1,
            number: self.number,
            address2: self.address2,
            city: self.city,
            country: self.country,
            state: self.state,
            postcode: self.postcode,
        })
    }
}

fn nested(prefix: &str, err: AppError) -> AppError {
    match err {
        AppError::Validation(msg) => AppError::Validation(format!("{}.{}", prefix, msg)),
        other => other,
    }
}

impl Client {
    pub fn from_fields(id: i64, fields: ClientFields, address: Option<ClientAddress>) -> Self {
        Client {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            address,
        }
    }
}

impl ClientAddress {
    pub fn from_fields(id: i64, client_id: i64, fields: AddressFields) -> Self {
        ClientAddress {
            id,
            address1: fields.address1,
            number: fields.number,
            address2: fields.address2,
            city: fields.city,
            country: fields.country,
            state: fields.state,
            postcode: fields.postcode,
            client_id,
        }
    }

    pub fn overwrite(&mut self, fields: AddressFields) {
        self.address1 = fields.address1;
        self.number = fields.number;
        self.address2 = fields.address2;
        self.city = fields.city;
        self.country = fields.country;
        self.state = fields.state;
        self.postcode = fields.postcode;
    }
}
