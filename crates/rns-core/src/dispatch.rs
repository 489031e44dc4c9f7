//! Hand-off of a synthesized manifest to a signing wallet.
//!
//! The wallet is an external capability behind the [`Wallet`] trait: it
//! signs and submits, then blocks until the intent reaches a final ledger
//! status. Raw wallet errors are classified through [`ERROR_PATTERNS`] into a
//! small set of user-facing categories.

use crate::manifest::TransactionManifest;
use crate::validation::Operation;
use crate::SdkError;
use rns_schema::IntentHash;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Longest excerpt of an unclassified wallet error kept for the user.
pub const MAX_ERROR_EXCERPT: usize = 200;

/// Raw failure reported by a wallet implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct WalletError(pub String);

/// Final status of a submitted intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LedgerStatus {
    CommittedSuccess,
    CommittedFailure { reason: String },
    Rejected { reason: String },
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommittedDetails {
    pub intent_hash: IntentHash,
    pub fee_paid: Option<Decimal>,
    /// Receipt as the wallet or gateway returned it.
    pub receipt: Value,
}

/// Signing and submission capability.
pub trait Wallet: Send + Sync {
    /// Sign and submit a manifest; returns the intent hash once the user approves.
    fn send_transaction(&self, manifest: &str, message: &str) -> Result<IntentHash, WalletError>;

    /// Block until the intent has a final status.
    fn transaction_status(&self, intent_hash: &IntentHash) -> Result<LedgerStatus, WalletError>;

    fn committed_details(&self, intent_hash: &IntentHash) -> Result<CommittedDetails, WalletError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionCategory {
    RejectedByUser,
    InsufficientFunds,
    MissingProof,
    InvalidManifest,
    NetworkUnavailable,
    Unknown,
}

impl SubmissionCategory {
    pub fn message(self) -> &'static str {
        match self {
            Self::RejectedByUser => "the transaction was rejected in the wallet",
            Self::InsufficientFunds => "the account cannot cover the transaction",
            Self::MissingProof => "the account does not hold the required badge or domain",
            Self::InvalidManifest => "the wallet could not accept the transaction manifest",
            Self::NetworkUnavailable => "the wallet could not reach the network",
            Self::Unknown => "the wallet reported an error",
        }
    }
}

/// Ordered substring table; the first row with a matching needle wins.
pub const ERROR_PATTERNS: &[(&[&str], SubmissionCategory)] = &[
    (
        &["rejectedbyuser", "rejected by user", "user rejected", "canceled", "cancelled"],
        SubmissionCategory::RejectedByUser,
    ),
    (
        &["insufficient balance", "insufficientbalance", "not enough", "insufficient funds"],
        SubmissionCategory::InsufficientFunds,
    ),
    (
        &["authzone", "auth zone", "proof", "unauthorized"],
        SubmissionCategory::MissingProof,
    ),
    (
        &["manifest", "failedtoprepare", "failed to prepare", "compile"],
        SubmissionCategory::InvalidManifest,
    ),
    (
        &["timeout", "timed out", "network", "connection"],
        SubmissionCategory::NetworkUnavailable,
    ),
];

/// A classified wallet failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}: {detail}", .category.message())]
pub struct SubmissionError {
    pub category: SubmissionCategory,
    pub detail: String,
}

/// Cut to at most [`MAX_ERROR_EXCERPT`] characters, marking the cut.
pub fn truncate_detail(raw: &str) -> String {
    if raw.chars().count() <= MAX_ERROR_EXCERPT {
        return raw.to_owned();
    }
    let mut cut: String = raw.chars().take(MAX_ERROR_EXCERPT).collect();
    cut.push_str("...");
    cut
}

pub fn classify_wallet_error(raw: &str) -> SubmissionError {
    let lowered = raw.to_lowercase();
    let category = ERROR_PATTERNS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map_or(SubmissionCategory::Unknown, |(_, c)| *c);
    SubmissionError {
        category,
        detail: truncate_detail(raw.trim()),
    }
}

/// A manifest ready for signing plus its wallet message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedTransaction {
    pub operation: Operation,
    pub manifest: TransactionManifest,
    pub message: String,
}

/// Outcome handed back after a committed success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionFeedback {
    pub operation: Operation,
    pub intent_hash: IntentHash,
    pub message: String,
    pub details: CommittedDetails,
}

impl fmt::Display for TransactionFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} committed as {}", self.message, self.intent_hash)
    }
}

type Hook<'a, T> = Option<Box<dyn Fn(&T) + 'a>>;

/// Optional lifecycle hooks, each fired at most once per submission.
#[derive(Default)]
pub struct EventCallbacks<'a> {
    pub on_init: Hook<'a, PreparedTransaction>,
    pub on_app_approved: Hook<'a, IntentHash>,
    pub on_intent_receipt: Hook<'a, LedgerStatus>,
    pub on_success: Hook<'a, TransactionFeedback>,
    pub on_fail: Hook<'a, SdkError>,
}

impl<'a> EventCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_init(mut self, f: impl Fn(&PreparedTransaction) + 'a) -> Self {
        self.on_init = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_app_approved(mut self, f: impl Fn(&IntentHash) + 'a) -> Self {
        self.on_app_approved = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_intent_receipt(mut self, f: impl Fn(&LedgerStatus) + 'a) -> Self {
        self.on_intent_receipt = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_success(mut self, f: impl Fn(&TransactionFeedback) + 'a) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_fail(mut self, f: impl Fn(&SdkError) + 'a) -> Self {
        self.on_fail = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for EventCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("on_init", &self.on_init.is_some())
            .field("on_app_approved", &self.on_app_approved.is_some())
            .field("on_intent_receipt", &self.on_intent_receipt.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .finish()
    }
}

fn fire<T>(hook: &Hook<'_, T>, arg: &T) {
    if let Some(f) = hook {
        f(arg);
    }
}

/// Sign, submit and await a prepared transaction, firing hooks on the way.
pub fn submit(
    wallet: &dyn Wallet,
    prepared: &PreparedTransaction,
    hooks: &EventCallbacks<'_>,
) -> Result<TransactionFeedback, SdkError> {
    fire(&hooks.on_init, prepared);
    let result = run(wallet, prepared, hooks);
    match &result {
        Ok(feedback) => {
            info!("{feedback}");
            fire(&hooks.on_success, feedback);
        }
        Err(e) => {
            warn!("{} failed: {e}", prepared.operation);
            fire(&hooks.on_fail, e);
        }
    }
    result
}

fn run(
    wallet: &dyn Wallet,
    prepared: &PreparedTransaction,
    hooks: &EventCallbacks<'_>,
) -> Result<TransactionFeedback, SdkError> {
    let text = prepared.manifest.to_text();
    debug!(
        "submitting {} ({} bytes of manifest)",
        prepared.operation,
        text.len()
    );
    let intent_hash = wallet
        .send_transaction(&text, &prepared.message)
        .map_err(|e| classify_wallet_error(&e.0))?;
    fire(&hooks.on_app_approved, &intent_hash);

    let status = wallet
        .transaction_status(&intent_hash)
        .map_err(|e| classify_wallet_error(&e.0))?;
    fire(&hooks.on_intent_receipt, &status);

    match status {
        LedgerStatus::CommittedSuccess => {}
        LedgerStatus::CommittedFailure { reason } | LedgerStatus::Rejected { reason } => {
            return Err(SdkError::Ledger {
                intent_hash,
                reason: truncate_detail(&reason),
            });
        }
        LedgerStatus::Pending => {
            return Err(SdkError::Ledger {
                intent_hash,
                reason: "intent did not reach a final status".to_owned(),
            });
        }
    }

    let details = wallet
        .committed_details(&intent_hash)
        .map_err(|e| classify_wallet_error(&e.0))?;
    Ok(TransactionFeedback {
        operation: prepared.operation,
        intent_hash,
        message: prepared.message.clone(),
        details,
    })
}
