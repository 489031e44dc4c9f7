//! One synthesis function per write operation.
//!
//! Inputs are already validated and resolved; these functions only arrange
//! instructions. Payment flows withdraw, consolidate into one bucket and hand
//! it to a single call. Capability-gated flows prove ownership of a unit,
//! pop the proof, call, sweep the worktop and drop all proofs.

use super::{Bucket, ManifestBuilder, ManifestError, ManifestValue, Proof, TransactionManifest};
use crate::pricing::CostBreakdown;
use crate::resolution::{DomainEntity, RootDomain};
use rns_schema::{
    domain_to_non_fungible_id, ComponentsSection, DomainName, NonFungibleId, RecordDocket,
    RecordKey,
};
use rust_decimal::Decimal;

const PAYMENT_BUCKET: &str = "payment_bucket";
const DOMAIN_BUCKET: &str = "domain_bucket";
const DOMAIN_PROOF: &str = "domain_proof";
const BADGE_PROOF: &str = "badge_proof";

/// Upper bound passed to a fungible locker claim.
pub const LOCKER_CLAIM_CEILING: u32 = 100;

fn take_payment(
    b: &mut ManifestBuilder,
    account: &str,
    resource: &str,
    amounts: &[Decimal],
    total: Decimal,
) -> Bucket {
    for amount in amounts.iter().filter(|a| !a.is_zero()) {
        b.withdraw(account, resource, *amount);
    }
    b.take_from_worktop(resource, total, PAYMENT_BUCKET)
}

fn prove(
    b: &mut ManifestBuilder,
    account: &str,
    resource: &str,
    id: &NonFungibleId,
    name: &str,
) -> Proof {
    b.create_proof_of_non_fungibles(account, resource, std::slice::from_ref(id));
    b.pop_from_auth_zone(name)
}

/// Prove, make one call, sweep, drop.
fn gated_call(
    account: &str,
    resource: &str,
    id: &NonFungibleId,
    target: &str,
    method: &str,
    args: impl FnOnce(&mut ManifestBuilder, Proof) -> Vec<ManifestValue>,
) -> Result<TransactionManifest, ManifestError> {
    let mut b = ManifestBuilder::new();
    let proof = prove(&mut b, account, resource, id, DOMAIN_PROOF);
    let args = args(&mut b, proof);
    b.call_method(target, method, args);
    b.deposit_batch(account);
    b.drop_all_proofs();
    b.build()
}

pub fn register_domain(
    components: &ComponentsSection,
    account: &str,
    cost: &CostBreakdown,
) -> Result<TransactionManifest, ManifestError> {
    let mut b = ManifestBuilder::new();
    let payment = take_payment(
        &mut b,
        account,
        &cost.payment_resource,
        &[cost.bond_amount, cost.registrar_fee],
        cost.total_amount,
    );
    b.call_method(
        &components.rns,
        "register_and_bond_domain",
        vec![
            ManifestValue::string(&cost.domain),
            payment.into(),
            ManifestValue::address(account),
            ManifestValue::NonFungibleLocalId(cost.registrar_id.clone()),
        ],
    );
    b.deposit_batch(account);
    b.build()
}

pub fn activate_domain(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
) -> Result<TransactionManifest, ManifestError> {
    gated_call(
        account,
        &components.domain_resource,
        &root.id,
        &components.rns,
        "activate_domain_ownership",
        |_, proof| vec![proof.into(), ManifestValue::address(account)],
    )
}

pub fn rebond_domain(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
    payment_resource: &str,
    bond: Decimal,
) -> Result<TransactionManifest, ManifestError> {
    gated_call(
        account,
        &components.domain_resource,
        &root.id,
        &components.rns,
        "rebond",
        |b, proof| {
            let payment = take_payment(b, account, payment_resource, &[bond], bond);
            vec![proof.into(), payment.into()]
        },
    )
}

/// Hand the domain unit back and receive the bond.
pub fn unbond_domain(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
) -> Result<TransactionManifest, ManifestError> {
    let ids = std::slice::from_ref(&root.id);
    let mut b = ManifestBuilder::new();
    b.withdraw_non_fungibles(account, &components.domain_resource, ids);
    let domain = b.take_non_fungibles_from_worktop(&components.domain_resource, ids, DOMAIN_BUCKET);
    b.call_method(&components.rns, "unbond", vec![domain.into()]);
    b.deposit_batch(account);
    b.build()
}

pub fn create_subdomain(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
    label: &str,
) -> Result<TransactionManifest, ManifestError> {
    gated_call(
        account,
        &components.domain_resource,
        &root.id,
        &root.subregistry,
        "create_subdomain",
        |_, proof| vec![proof.into(), ManifestValue::string(label)],
    )
}

pub fn delete_subdomain(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
    label: &str,
) -> Result<TransactionManifest, ManifestError> {
    gated_call(
        account,
        &components.domain_resource,
        &root.id,
        &root.subregistry,
        "delete_subdomain",
        |_, proof| vec![proof.into(), ManifestValue::string(label)],
    )
}

/// One record mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    Create(RecordDocket),
    Amend(RecordDocket),
    Delete(RecordKey),
}

impl RecordChange {
    fn method(&self) -> &'static str {
        match self {
            Self::Create(_) => "set_record",
            Self::Amend(_) => "amend_record",
            Self::Delete(_) => "delete_record",
        }
    }

    fn args(&self, proof: Proof, scope: ManifestValue) -> Vec<ManifestValue> {
        let mut args = vec![proof.into(), scope];
        match self {
            Self::Create(d) | Self::Amend(d) => args.extend([
                ManifestValue::string(&d.context),
                ManifestValue::string(&d.directive),
                ManifestValue::some(ManifestValue::string(&d.value)),
            ]),
            Self::Delete(k) => args.extend([
                ManifestValue::string(&k.context),
                ManifestValue::string(&k.directive),
            ]),
        }
        args
    }
}

/// Apply record changes to an entity under one ownership proof.
///
/// A single change pops the proof; a batch derives one proof per call from
/// the auth zone.
pub fn record_changes(
    components: &ComponentsSection,
    account: &str,
    entity: &DomainEntity<'_>,
    changes: &[RecordChange],
) -> Result<TransactionManifest, ManifestError> {
    let root = entity.root();
    let resource = components.domain_resource.as_str();
    let ids = std::slice::from_ref(&root.id);
    let scope = entity.scope();

    let mut b = ManifestBuilder::new();
    b.create_proof_of_non_fungibles(account, resource, ids);
    if let [only] = changes {
        let proof = b.pop_from_auth_zone(DOMAIN_PROOF);
        b.call_method(
            &root.subregistry,
            only.method(),
            only.args(proof, scope.to_manifest()),
        );
    } else {
        for (i, change) in changes.iter().enumerate() {
            let proof = b.create_proof_from_auth_zone_of_non_fungibles(
                resource,
                ids,
                &format!("record_proof_{i}"),
            );
            b.call_method(
                &root.subregistry,
                change.method(),
                change.args(proof, scope.to_manifest()),
            );
        }
    }
    b.deposit_batch(account);
    b.drop_all_proofs();
    b.build()
}

pub fn update_subregistry_metadata(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
    key: &str,
    value: &str,
) -> Result<TransactionManifest, ManifestError> {
    gated_call(
        account,
        &components.domain_resource,
        &root.id,
        &root.subregistry,
        "update_metadata",
        |_, proof| {
            vec![
                proof.into(),
                ManifestValue::string(key),
                ManifestValue::string(value),
            ]
        },
    )
}

/// Swap the domain's subregistry for a fresh, empty one.
pub fn replace_subregistry(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
) -> Result<TransactionManifest, ManifestError> {
    gated_call(
        account,
        &components.domain_resource,
        &root.id,
        &components.rns,
        "replace_subregistry",
        |_, proof| vec![proof.into()],
    )
}

/// Move the domain unit to `destination`. With `clean`, the subregistry is
/// replaced first so records and subdomains do not follow the unit.
pub fn transfer_domain(
    components: &ComponentsSection,
    account: &str,
    root: &RootDomain,
    destination: &str,
    clean: bool,
) -> Result<TransactionManifest, ManifestError> {
    let resource = components.domain_resource.as_str();
    let ids = std::slice::from_ref(&root.id);
    let mut b = ManifestBuilder::new();
    if clean {
        let proof = prove(&mut b, account, resource, &root.id, DOMAIN_PROOF);
        b.call_method(&components.rns, "replace_subregistry", vec![proof.into()]);
    }
    b.withdraw_non_fungibles(account, resource, ids);
    let domain = b.take_non_fungibles_from_worktop(resource, ids, DOMAIN_BUCKET);
    b.try_deposit_or_refund(destination, domain);
    b.deposit_batch(account);
    if clean {
        b.drop_all_proofs();
    }
    b.build()
}

/// Claim from the account locker: the listed units, or up to
/// [`LOCKER_CLAIM_CEILING`] of a fungible when no ids are given.
pub fn claim_locker(
    components: &ComponentsSection,
    account: &str,
    resource: &str,
    ids: &[NonFungibleId],
) -> Result<TransactionManifest, ManifestError> {
    let mut b = ManifestBuilder::new();
    let claimant = ManifestValue::address(account);
    let target = ManifestValue::address(resource);
    if ids.is_empty() {
        b.call_method(
            &components.locker,
            "claim",
            vec![
                claimant,
                target,
                ManifestValue::Decimal(Decimal::from(LOCKER_CLAIM_CEILING)),
            ],
        );
    } else {
        b.call_method(
            &components.locker,
            "claim_non_fungibles",
            vec![claimant, target, ManifestValue::id_array(ids)],
        );
    }
    b.deposit_batch(account);
    b.build()
}

/// Convert a held import-domain unit into a bonded domain.
pub fn import_domain(
    components: &ComponentsSection,
    account: &str,
    domain: &DomainName,
    payment_resource: &str,
    bond: Decimal,
) -> Result<TransactionManifest, ManifestError> {
    let id = domain_to_non_fungible_id(domain.as_str());
    gated_call(
        account,
        &components.import_domain_resource,
        &id,
        &components.rns,
        "import_accepted_domain",
        |b, proof| {
            let payment = take_payment(b, account, payment_resource, &[bond], bond);
            vec![
                proof.into(),
                ManifestValue::string(domain.as_str()),
                payment.into(),
                ManifestValue::address(account),
            ]
        },
    )
}

/// Terms of a new registrar badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrarTerms {
    pub name: String,
    pub icon_url: String,
    pub website_url: String,
    pub fee_percentage: Decimal,
}

pub fn request_registrar(
    components: &ComponentsSection,
    account: &str,
    terms: &RegistrarTerms,
) -> Result<TransactionManifest, ManifestError> {
    let mut b = ManifestBuilder::new();
    b.call_method(
        &components.rns,
        "request_registrar_badge",
        vec![
            ManifestValue::string(&terms.name),
            ManifestValue::string(&terms.icon_url),
            ManifestValue::string(&terms.website_url),
            ManifestValue::Decimal(terms.fee_percentage),
        ],
    );
    b.deposit_batch(account);
    b.build()
}

pub fn withdraw_registrar_fees(
    components: &ComponentsSection,
    account: &str,
    registrar_id: &NonFungibleId,
) -> Result<TransactionManifest, ManifestError> {
    let mut b = ManifestBuilder::new();
    let proof = prove(
        &mut b,
        account,
        &components.registrar_badge_resource,
        registrar_id,
        BADGE_PROOF,
    );
    b.call_method(
        &components.rns,
        "withdraw_registrar_fees",
        vec![proof.into()],
    );
    b.deposit_batch(account);
    b.drop_all_proofs();
    b.build()
}
