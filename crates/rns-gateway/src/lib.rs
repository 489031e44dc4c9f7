//! Read-only access to ledger state through the gateway (indexing) API.
//!
//! This crate provides the `Gateway` trait the resolution and pricing layers
//! read through, an HTTP implementation over the gateway REST API
//! (`HttpGateway`), an in-memory implementation for tests and offline use
//! (`MemoryGateway`), and helpers for the gateway's programmatic JSON values.

pub mod config;
pub mod http;
pub mod memory;
pub mod models;
pub mod value;

pub use config::GatewayConfig;
pub use http::HttpGateway;
pub use memory::MemoryGateway;
pub use models::{KvEntry, NonFungibleRecord, ResourceBalance};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

/// Trait for ledger indexing backends.
///
/// All calls are blocking and read-only. Callers decide which failures are
/// fatal; implementations never retry.
pub trait Gateway: Send + Sync {
    /// Look up entries of a key/value store. Keys are programmatic JSON values;
    /// absent keys are simply missing from the result.
    fn key_value_data(&self, store: &str, keys: &[Value]) -> Result<Vec<KvEntry>, GatewayError>;

    /// List every key of a key/value store.
    fn key_value_keys(&self, store: &str) -> Result<Vec<Value>, GatewayError>;

    /// Fetch the data of specific non-fungible units.
    fn non_fungible_data(
        &self,
        resource: &str,
        ids: &[String],
    ) -> Result<Vec<NonFungibleRecord>, GatewayError>;

    /// Programmatic JSON of a component's state.
    fn component_state(&self, component: &str) -> Result<Value, GatewayError>;

    /// Fungible balances held by an account.
    fn fungible_balances(&self, account: &str) -> Result<Vec<ResourceBalance>, GatewayError>;

    /// Local ids of one non-fungible resource held by an account.
    fn non_fungible_ids(&self, account: &str, resource: &str) -> Result<Vec<String>, GatewayError>;

    /// Single-key convenience over [`Gateway::key_value_data`].
    fn key_value_lookup(&self, store: &str, key: &Value) -> Result<Option<KvEntry>, GatewayError> {
        let entries = self.key_value_data(store, std::slice::from_ref(key))?;
        Ok(entries.into_iter().next())
    }
}
