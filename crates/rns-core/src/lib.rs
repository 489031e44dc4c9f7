//! Client engine for the Radix Name Service.
//!
//! This crate ties the schema layer and the gateway together into the
//! `Engine`: the central API for checking availability, reading domains and
//! records, pricing registrations, synthesizing transaction manifests for
//! every write operation and handing them to a signing wallet. Every call
//! runs its parameters through one validation pipeline before any ledger read.

pub mod dispatch;
pub mod engine;
pub mod manifest;
pub mod pricing;
pub mod requests;
pub mod resolution;
pub mod validation;

pub use dispatch::{
    classify_wallet_error, EventCallbacks, LedgerStatus, PreparedTransaction, SubmissionCategory,
    SubmissionError, TransactionFeedback, Wallet, WalletError,
};
pub use engine::{Engine, LedgerSnapshot};
pub use manifest::{ManifestBuilder, ManifestError, TransactionManifest};
pub use pricing::{AffordabilityReport, CostBreakdown, RegistrarInfo};
pub use resolution::{DomainDetails, DomainStatus, ResolutionError, StatusReport};
pub use validation::{Operation, ValidationIssue};

use rns_gateway::GatewayError;
use rns_schema::{ConfigError, IntentHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid parameters: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("insufficient funds: {0}")]
    Affordability(AffordabilityReport),
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),
    #[error("transaction {intent_hash} failed on ledger: {reason}")]
    Ledger {
        intent_hash: IntentHash,
        reason: String,
    },
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl SdkError {
    /// Issues behind a validation failure; empty for other errors.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation(issues) => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
