//! Transaction manifest construction.
//!
//! [`ManifestBuilder`] produces instruction lists with enforced bucket and
//! proof accounting; [`ops`] holds one synthesis function per write operation.
//! Manifests render to the ledger's textual grammar, one multi-line block per
//! instruction terminated by `;`.

mod builder;
pub mod ops;
mod value;

pub use builder::{Bucket, ManifestBuilder, Proof};
pub use value::ManifestValue;

use rns_schema::NonFungibleId;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt::{self, Write as _};
use thiserror::Error;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("bucket '{0}' is never consumed")]
    UnspentBucket(String),
    #[error("proof '{0}' is never consumed")]
    UnspentProof(String),
    #[error("bucket '{0}' is not open")]
    UnknownBucket(String),
    #[error("proof '{0}' is not open")]
    UnknownProof(String),
    #[error("handle name '{0}' is used twice")]
    DuplicateName(String),
    #[error("no proof in the auth zone for '{0}'")]
    EmptyAuthZone(String),
    #[error("proofs created without a trailing DROP_ALL_PROOFS")]
    ProofsNotDropped,
    #[error("resources left on the worktop without a final deposit")]
    WorktopNotSwept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    CallMethod {
        address: String,
        method: String,
        args: Vec<ManifestValue>,
    },
    TakeFromWorktop {
        resource: String,
        amount: Decimal,
        bucket: String,
    },
    TakeAllFromWorktop { resource: String, bucket: String },
    TakeNonFungiblesFromWorktop {
        resource: String,
        ids: Vec<NonFungibleId>,
        bucket: String,
    },
    PopFromAuthZone { proof: String },
    CreateProofFromAuthZoneOfNonFungibles {
        resource: String,
        ids: Vec<NonFungibleId>,
        proof: String,
    },
    DropAllProofs,
}

impl Instruction {
    fn opcode(&self) -> &'static str {
        match self {
            Self::CallMethod { .. } => "CALL_METHOD",
            Self::TakeFromWorktop { .. } => "TAKE_FROM_WORKTOP",
            Self::TakeAllFromWorktop { .. } => "TAKE_ALL_FROM_WORKTOP",
            Self::TakeNonFungiblesFromWorktop { .. } => "TAKE_NON_FUNGIBLES_FROM_WORKTOP",
            Self::PopFromAuthZone { .. } => "POP_FROM_AUTH_ZONE",
            Self::CreateProofFromAuthZoneOfNonFungibles { .. } => {
                "CREATE_PROOF_FROM_AUTH_ZONE_OF_NON_FUNGIBLES"
            }
            Self::DropAllProofs => "DROP_ALL_PROOFS",
        }
    }

    fn operands(&self) -> Vec<ManifestValue> {
        match self {
            Self::CallMethod {
                address,
                method,
                args,
            } => {
                let mut ops = vec![
                    ManifestValue::address(address),
                    ManifestValue::string(method),
                ];
                ops.extend(args.iter().cloned());
                ops
            }
            Self::TakeFromWorktop {
                resource,
                amount,
                bucket,
            } => vec![
                ManifestValue::address(resource),
                ManifestValue::Decimal(*amount),
                ManifestValue::Bucket(bucket.clone()),
            ],
            Self::TakeAllFromWorktop { resource, bucket } => vec![
                ManifestValue::address(resource),
                ManifestValue::Bucket(bucket.clone()),
            ],
            Self::TakeNonFungiblesFromWorktop {
                resource,
                ids,
                bucket,
            } => vec![
                ManifestValue::address(resource),
                ManifestValue::id_array(ids),
                ManifestValue::Bucket(bucket.clone()),
            ],
            Self::PopFromAuthZone { proof } => vec![ManifestValue::Proof(proof.clone())],
            Self::CreateProofFromAuthZoneOfNonFungibles {
                resource,
                ids,
                proof,
            } => vec![
                ManifestValue::address(resource),
                ManifestValue::id_array(ids),
                ManifestValue::Proof(proof.clone()),
            ],
            Self::DropAllProofs => Vec::new(),
        }
    }

    /// Method name of a `CALL_METHOD`, if this is one.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::CallMethod { method, .. } => Some(method),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = self.operands();
        f.write_str(self.opcode())?;
        if operands.is_empty() {
            return f.write_char(';');
        }
        f.write_char('\n')?;
        for op in &operands {
            writeln!(f, "{INDENT}{op}")?;
        }
        f.write_char(';')
    }
}

/// A finished, accounting-checked manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionManifest {
    instructions: Vec<Instruction>,
}

impl TransactionManifest {
    fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Textual form handed to the wallet.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TransactionManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

impl Serialize for TransactionManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_multiline_blocks() {
        let mut b = ManifestBuilder::new();
        b.withdraw("account_tdx_2_1a", "resource_tdx_2_1x", Decimal::from(120));
        b.deposit_batch("account_tdx_2_1a");
        let text = b.build().unwrap().to_text();
        let expected = "\
CALL_METHOD
    Address(\"account_tdx_2_1a\")
    \"withdraw\"
    Address(\"resource_tdx_2_1x\")
    Decimal(\"120\")
;
CALL_METHOD
    Address(\"account_tdx_2_1a\")
    \"deposit_batch\"
    Expression(\"ENTIRE_WORKTOP\")
;
";
        assert_eq!(text, expected);
    }

    #[test]
    fn operand_free_instruction_is_one_line() {
        assert_eq!(Instruction::DropAllProofs.to_string(), "DROP_ALL_PROOFS;");
    }
}
