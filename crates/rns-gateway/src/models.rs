//! Wire types for the gateway REST API and the values the client hands back.

use rns_schema::ResourceAddress;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded value as the gateway returns it: raw SBOR hex plus programmatic JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodedValue {
    #[serde(default)]
    pub raw_hex: String,
    pub programmatic_json: Value,
}

/// One key/value store entry.
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub key: Value,
    pub value: Value,
}

/// Data of one non-fungible unit.
#[derive(Debug, Clone, PartialEq)]
pub struct NonFungibleRecord {
    pub id: String,
    pub is_burned: bool,
    pub data: Option<Value>,
}

/// Amount of one fungible resource held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBalance {
    pub resource: ResourceAddress,
    pub amount: Decimal,
}

// --- request bodies ---

#[derive(Debug, Serialize)]
pub(crate) struct KvKeyRequest<'a> {
    pub key_json: &'a Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct KvDataRequest<'a> {
    pub key_value_store_address: &'a str,
    pub keys: Vec<KvKeyRequest<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct KvKeysRequest<'a> {
    pub key_value_store_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub limit_per_page: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct NonFungibleDataRequest<'a> {
    pub resource_address: &'a str,
    pub non_fungible_ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct EntityDetailsRequest<'a> {
    pub addresses: [&'a str; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct EntityPageRequest<'a> {
    pub address: &'a str,
    pub aggregation_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_ins: Option<Value>,
}

// --- response bodies ---

#[derive(Debug, Deserialize)]
pub(crate) struct KvDataResponse {
    #[serde(default)]
    pub entries: Vec<KvDataEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KvDataEntry {
    pub key: EncodedValue,
    pub value: EncodedValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KvKeysResponse {
    #[serde(default)]
    pub items: Vec<KvKeyItem>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KvKeyItem {
    pub key: EncodedValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NonFungibleDataResponse {
    #[serde(default)]
    pub non_fungible_ids: Vec<NonFungibleDataItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NonFungibleDataItem {
    pub non_fungible_id: String,
    #[serde(default)]
    pub is_burned: bool,
    #[serde(default)]
    pub data: Option<EncodedValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityDetailsResponse {
    #[serde(default)]
    pub items: Vec<EntityDetailsItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityDetailsItem {
    pub address: String,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FungiblePageResponse {
    #[serde(default)]
    pub items: Vec<FungibleItem>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FungibleItem {
    pub resource_address: String,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NonFungiblePageResponse {
    #[serde(default)]
    pub items: Vec<NonFungibleItem>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NonFungibleItem {
    pub resource_address: String,
    #[serde(default)]
    pub vaults: Option<VaultPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VaultPage {
    #[serde(default)]
    pub items: Vec<VaultItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VaultItem {
    #[serde(default)]
    pub items: Vec<String>,
}
