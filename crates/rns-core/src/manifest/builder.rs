use super::value::ManifestValue;
use super::{Instruction, ManifestError, TransactionManifest};
use rns_schema::NonFungibleId;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// Handle to a named bucket on the worktop. Not `Clone`: passing it into a
/// call consumes it, so a bucket can only be spent once.
#[derive(Debug, PartialEq, Eq)]
pub struct Bucket(String);

impl Bucket {
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Handle to a named proof popped from (or cloned out of) the auth zone.
#[derive(Debug, PartialEq, Eq)]
pub struct Proof(String);

impl Proof {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<Bucket> for ManifestValue {
    fn from(b: Bucket) -> Self {
        ManifestValue::Bucket(b.0)
    }
}

impl From<Proof> for ManifestValue {
    fn from(p: Proof) -> Self {
        ManifestValue::Proof(p.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handle {
    Open,
    Spent,
}

/// Incremental manifest builder that tracks every bucket and proof it hands out.
///
/// `build` refuses a manifest that leaves a bucket or named proof unspent,
/// creates proofs without a trailing `DROP_ALL_PROOFS`, or leaves resources on
/// the worktop without a final `deposit_batch` sweep.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    instructions: Vec<Instruction>,
    buckets: BTreeMap<String, Handle>,
    proofs: BTreeMap<String, Handle>,
    auth_zone_proofs: usize,
    proofs_pending_drop: bool,
    worktop_dirty: bool,
    violations: Vec<ManifestError>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generic method call. Buckets and proofs among `args` are marked spent.
    pub fn call_method(
        &mut self,
        address: &str,
        method: &str,
        args: Vec<ManifestValue>,
    ) -> &mut Self {
        for arg in &args {
            self.spend_handles(arg);
        }
        self.worktop_dirty = true;
        self.instructions.push(Instruction::CallMethod {
            address: address.to_owned(),
            method: method.to_owned(),
            args,
        });
        self
    }

    pub fn withdraw(&mut self, account: &str, resource: &str, amount: Decimal) -> &mut Self {
        self.call_method(
            account,
            "withdraw",
            vec![
                ManifestValue::Address(resource.to_owned()),
                ManifestValue::Decimal(amount),
            ],
        )
    }

    pub fn withdraw_non_fungibles(
        &mut self,
        account: &str,
        resource: &str,
        ids: &[NonFungibleId],
    ) -> &mut Self {
        self.call_method(
            account,
            "withdraw_non_fungibles",
            vec![
                ManifestValue::Address(resource.to_owned()),
                ManifestValue::id_array(ids),
            ],
        )
    }

    /// Put a proof of the given units into the auth zone.
    pub fn create_proof_of_non_fungibles(
        &mut self,
        account: &str,
        resource: &str,
        ids: &[NonFungibleId],
    ) -> &mut Self {
        self.instructions.push(Instruction::CallMethod {
            address: account.to_owned(),
            method: "create_proof_of_non_fungibles".to_owned(),
            args: vec![
                ManifestValue::Address(resource.to_owned()),
                ManifestValue::id_array(ids),
            ],
        });
        self.auth_zone_proofs += 1;
        self.proofs_pending_drop = true;
        self
    }

    /// Move the most recent auth-zone proof into a named proof.
    pub fn pop_from_auth_zone(&mut self, name: &str) -> Proof {
        if self.auth_zone_proofs == 0 {
            self.violations
                .push(ManifestError::EmptyAuthZone(name.to_owned()));
        } else {
            self.auth_zone_proofs -= 1;
        }
        self.open_proof(name);
        self.instructions.push(Instruction::PopFromAuthZone {
            proof: name.to_owned(),
        });
        Proof(name.to_owned())
    }

    /// Derive a named proof from the auth zone without removing the original.
    pub fn create_proof_from_auth_zone_of_non_fungibles(
        &mut self,
        resource: &str,
        ids: &[NonFungibleId],
        name: &str,
    ) -> Proof {
        if self.auth_zone_proofs == 0 {
            self.violations
                .push(ManifestError::EmptyAuthZone(name.to_owned()));
        }
        self.open_proof(name);
        self.proofs_pending_drop = true;
        self.instructions
            .push(Instruction::CreateProofFromAuthZoneOfNonFungibles {
                resource: resource.to_owned(),
                ids: ids.to_vec(),
                proof: name.to_owned(),
            });
        Proof(name.to_owned())
    }

    pub fn take_from_worktop(&mut self, resource: &str, amount: Decimal, name: &str) -> Bucket {
        self.open_bucket(name);
        self.instructions.push(Instruction::TakeFromWorktop {
            resource: resource.to_owned(),
            amount,
            bucket: name.to_owned(),
        });
        Bucket(name.to_owned())
    }

    pub fn take_all_from_worktop(&mut self, resource: &str, name: &str) -> Bucket {
        self.open_bucket(name);
        self.instructions.push(Instruction::TakeAllFromWorktop {
            resource: resource.to_owned(),
            bucket: name.to_owned(),
        });
        Bucket(name.to_owned())
    }

    pub fn take_non_fungibles_from_worktop(
        &mut self,
        resource: &str,
        ids: &[NonFungibleId],
        name: &str,
    ) -> Bucket {
        self.open_bucket(name);
        self.instructions
            .push(Instruction::TakeNonFungiblesFromWorktop {
                resource: resource.to_owned(),
                ids: ids.to_vec(),
                bucket: name.to_owned(),
            });
        Bucket(name.to_owned())
    }

    /// Deposit a bucket into another account; a refusal puts it back on the worktop.
    pub fn try_deposit_or_refund(&mut self, account: &str, bucket: Bucket) -> &mut Self {
        self.call_method(
            account,
            "try_deposit_or_refund",
            vec![bucket.into(), ManifestValue::none()],
        )
    }

    /// Sweep everything left on the worktop into `account`.
    pub fn deposit_batch(&mut self, account: &str) -> &mut Self {
        self.instructions.push(Instruction::CallMethod {
            address: account.to_owned(),
            method: "deposit_batch".to_owned(),
            args: vec![ManifestValue::Expression("ENTIRE_WORKTOP")],
        });
        self.worktop_dirty = false;
        self
    }

    pub fn drop_all_proofs(&mut self) -> &mut Self {
        self.instructions.push(Instruction::DropAllProofs);
        for state in self.proofs.values_mut() {
            *state = Handle::Spent;
        }
        self.auth_zone_proofs = 0;
        self.proofs_pending_drop = false;
        self
    }

    pub fn build(self) -> Result<TransactionManifest, ManifestError> {
        if let Some(first) = self.violations.into_iter().next() {
            return Err(first);
        }
        if let Some((name, _)) = self.buckets.iter().find(|(_, s)| **s == Handle::Open) {
            return Err(ManifestError::UnspentBucket(name.clone()));
        }
        if let Some((name, _)) = self.proofs.iter().find(|(_, s)| **s == Handle::Open) {
            return Err(ManifestError::UnspentProof(name.clone()));
        }
        if self.proofs_pending_drop {
            return Err(ManifestError::ProofsNotDropped);
        }
        if self.worktop_dirty {
            return Err(ManifestError::WorktopNotSwept);
        }
        debug!(
            "built manifest with {} instructions",
            self.instructions.len()
        );
        Ok(TransactionManifest::new(self.instructions))
    }

    fn open_bucket(&mut self, name: &str) {
        if self.buckets.insert(name.to_owned(), Handle::Open).is_some() {
            self.violations
                .push(ManifestError::DuplicateName(name.to_owned()));
        }
    }

    fn open_proof(&mut self, name: &str) {
        if self.proofs.insert(name.to_owned(), Handle::Open).is_some() {
            self.violations
                .push(ManifestError::DuplicateName(name.to_owned()));
        }
    }

    fn spend_handles(&mut self, value: &ManifestValue) {
        match value {
            ManifestValue::Bucket(name) => {
                if self.buckets.insert(name.clone(), Handle::Spent) != Some(Handle::Open) {
                    self.violations
                        .push(ManifestError::UnknownBucket(name.clone()));
                }
            }
            ManifestValue::Proof(name) => {
                if self.proofs.insert(name.clone(), Handle::Spent) != Some(Handle::Open) {
                    self.violations
                        .push(ManifestError::UnknownProof(name.clone()));
                }
            }
            ManifestValue::Array(_, items)
            | ManifestValue::Tuple(items)
            | ManifestValue::Enum(_, items) => {
                for item in items {
                    self.spend_handles(item);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "account_tdx_2_1abc";
    const XRD: &str = "resource_tdx_2_1xrd";
    const DOMAINS: &str = "resource_tdx_2_1dom";

    #[test]
    fn balanced_payment_builds() {
        let mut b = ManifestBuilder::new();
        b.withdraw(ACCOUNT, XRD, Decimal::from(10));
        let payment = b.take_from_worktop(XRD, Decimal::from(10), "payment_bucket");
        b.call_method("component_tdx_2_1rns", "pay", vec![payment.into()]);
        b.deposit_batch(ACCOUNT);
        let manifest = b.build().unwrap();
        assert_eq!(manifest.instructions().len(), 4);
    }

    #[test]
    fn unspent_bucket_is_rejected() {
        let mut b = ManifestBuilder::new();
        b.withdraw(ACCOUNT, XRD, Decimal::ONE);
        let _bucket = b.take_all_from_worktop(XRD, "leftover");
        b.deposit_batch(ACCOUNT);
        assert_eq!(
            b.build().unwrap_err(),
            ManifestError::UnspentBucket("leftover".into())
        );
    }

    #[test]
    fn proofs_must_be_dropped() {
        let id = NonFungibleId::parse("[6465bd958aa122fa49eee0aa7676c4c4]");
        let mut b = ManifestBuilder::new();
        b.create_proof_of_non_fungibles(ACCOUNT, DOMAINS, std::slice::from_ref(&id));
        let proof = b.pop_from_auth_zone("domain_proof");
        b.call_method("component_tdx_2_1sub", "act", vec![proof.into()]);
        b.deposit_batch(ACCOUNT);
        assert_eq!(b.build().unwrap_err(), ManifestError::ProofsNotDropped);
    }

    #[test]
    fn pop_from_empty_auth_zone_is_rejected() {
        let mut b = ManifestBuilder::new();
        let proof = b.pop_from_auth_zone("nothing");
        b.call_method("component_tdx_2_1sub", "act", vec![proof.into()]);
        b.deposit_batch(ACCOUNT);
        b.drop_all_proofs();
        assert_eq!(
            b.build().unwrap_err(),
            ManifestError::EmptyAuthZone("nothing".into())
        );
    }

    #[test]
    fn worktop_must_be_swept() {
        let mut b = ManifestBuilder::new();
        b.withdraw(ACCOUNT, XRD, Decimal::ONE);
        assert_eq!(b.build().unwrap_err(), ManifestError::WorktopNotSwept);
    }

    #[test]
    fn duplicate_bucket_names_are_rejected() {
        let mut b = ManifestBuilder::new();
        b.withdraw(ACCOUNT, XRD, Decimal::TWO);
        let one = b.take_from_worktop(XRD, Decimal::ONE, "payment");
        let two = b.take_from_worktop(XRD, Decimal::ONE, "payment");
        b.call_method("component_tdx_2_1x", "pay", vec![one.into(), two.into()]);
        b.deposit_batch(ACCOUNT);
        assert_eq!(
            b.build().unwrap_err(),
            ManifestError::DuplicateName("payment".into())
        );
    }
}
