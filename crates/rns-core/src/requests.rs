//! Caller-facing parameter sets of the write operations.
//!
//! Fields are plain strings as a caller would collect them; an empty or
//! whitespace-only field counts as absent and is reported as missing.

use rns_schema::{RecordDocket, RecordKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterDomain {
    pub account: String,
    pub domain: String,
    pub registrar_id: String,
    /// Pay with this resource; when absent the first accepted resource the
    /// account can afford is used.
    pub payment_resource: Option<String>,
}

/// Activate, unbond or replace-subregistry on a root the account holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainAction {
    pub account: String,
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebondDomain {
    pub account: String,
    pub domain: String,
    pub payment_resource: String,
}

/// Create or delete `label.root.xrd`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdomainAction {
    pub account: String,
    pub subdomain: String,
}

/// Create or amend one record on a root or subdomain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordAction {
    pub account: String,
    pub domain: String,
    pub docket: RecordDocket,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRemoval {
    pub account: String,
    pub domain: String,
    pub key: RecordKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    pub account: String,
    pub domain: String,
    pub dockets: Vec<RecordDocket>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatchRemoval {
    pub account: String,
    pub domain: String,
    pub keys: Vec<RecordKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubregistryMetadata {
    pub account: String,
    pub domain: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferDomain {
    pub account: String,
    pub domain: String,
    pub destination: String,
    /// Replace the subregistry first so records stay behind.
    pub clean: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimLocker {
    pub account: String,
    pub resource: String,
    /// Units to claim; empty claims a fungible amount instead.
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDomain {
    pub account: String,
    pub domain: String,
    pub payment_resource: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRegistrar {
    pub account: String,
    pub name: String,
    pub icon_url: String,
    pub website_url: String,
    pub fee_percentage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawRegistrarFees {
    pub account: String,
    pub registrar_id: String,
}
