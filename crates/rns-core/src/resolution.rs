//! Availability checks and addressing for domains, subdomains and records.
//!
//! Ledger layout read here:
//!
//! - registry store: `String(name) -> ..` for every registered root domain
//! - reserved-claims store: `String(name) -> Reference(claimant)` (optional)
//! - domain resource: one unit per root, local id derived from the name, data
//!   carrying `name`, `subregistry_component_address`,
//!   `current_activated_owner` and `bond`
//! - subregistry component state: `records` and `subdomains` store handles
//! - records store: `Tuple(scope, context, directive) -> String(value)`, with
//!   scope `Enum<0u8>()` for the root and `Enum<1u8>(label)` for a subdomain

use crate::manifest::ManifestValue;
use crate::SdkError;
use rns_gateway::{value, Gateway};
use rns_schema::{
    domain_to_non_fungible_id, AccountAddress, ComponentAddress, DomainName, KeyValueStoreAddress,
    LedgerConfig, NameKind, NonFungibleId, RecordDocket, RecordKey, ResourceAddress,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("domain '{0}' is not registered")]
    DomainNotFound(String),
    #[error("subdomain '{0}' does not exist")]
    SubdomainNotFound(String),
    #[error("subdomain '{0}' already exists")]
    SubdomainExists(String),
    #[error("domain '{domain}' is {status}")]
    Unavailable {
        domain: String,
        status: DomainStatus,
    },
    #[error("account {account} does not hold {what}")]
    NotOwner { account: String, what: String },
    #[error("registrar {0} not found")]
    RegistrarNotFound(String),
    #[error("record {key} not found on {domain}")]
    RecordNotFound { domain: String, key: RecordKey },
    #[error("record {key} already set on {domain}")]
    RecordExists { domain: String, key: RecordKey },
    #[error("malformed ledger data for {what}: {reason}")]
    Malformed { what: String, reason: String },
}

fn malformed(what: impl Into<String>, reason: impl Into<String>) -> ResolutionError {
    ResolutionError::Malformed {
        what: what.into(),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DomainStatus {
    Available,
    Taken,
    Reserved { claimant: Option<AccountAddress> },
}

impl DomainStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Taken => f.write_str("taken"),
            Self::Reserved {
                claimant: Some(claimant),
            } => write!(f, "reserved for {claimant}"),
            Self::Reserved { claimant: None } => f.write_str("reserved"),
        }
    }
}

/// Secondary lookup that failed and was skipped while computing a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedCheck {
    ReservedClaims,
    ImportedDomain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub domain: String,
    #[serde(flatten)]
    pub status: DomainStatus,
    /// Non-empty when an `available` verdict rests on a failed secondary lookup.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedCheck>,
}

/// Availability of a root name: registry, then reserved claims, then imports.
///
/// A failure reading the registry store is fatal. The reserved-claims and
/// import lookups are best-effort: a failed lookup is logged, recorded in
/// [`StatusReport::skipped`] and treated as "no entry".
pub fn domain_status(
    gateway: &dyn Gateway,
    config: &LedgerConfig,
    domain: &DomainName,
) -> Result<StatusReport, SdkError> {
    let name = domain.as_str();
    let key = value::string(name);
    let mut skipped = Vec::new();
    let report = |status, skipped| StatusReport {
        domain: name.to_owned(),
        status,
        skipped,
    };

    if gateway
        .key_value_lookup(&config.components.registry_store, &key)?
        .is_some()
    {
        debug!("{name}: present in registry");
        return Ok(report(DomainStatus::Taken, skipped));
    }

    if let Some(store) = &config.components.reserved_claims_store {
        match gateway.key_value_lookup(store, &key) {
            Ok(Some(entry)) => {
                let claimant = find_account(&entry.value).map(AccountAddress::from);
                debug!("{name}: reserved");
                return Ok(report(DomainStatus::Reserved { claimant }, skipped));
            }
            Ok(None) => {}
            Err(e) => {
                warn!("reserved-claims lookup for {name} failed, treating as unreserved: {e}");
                skipped.push(SkippedCheck::ReservedClaims);
            }
        }
    }

    let id = domain_to_non_fungible_id(name);
    match gateway.non_fungible_data(
        &config.components.import_domain_resource,
        &[id.as_str().to_owned()],
    ) {
        Ok(records) if records.iter().any(|r| !r.is_burned) => {
            debug!("{name}: held as an import-domain unit");
            return Ok(report(DomainStatus::Taken, skipped));
        }
        Ok(_) => {}
        Err(e) => {
            warn!("import-domain lookup for {name} failed, treating as absent: {e}");
            skipped.push(SkippedCheck::ImportedDomain);
        }
    }

    Ok(report(DomainStatus::Available, skipped))
}

fn find_account(v: &Value) -> Option<&str> {
    if let Some(s) = value::scalar(v) {
        if s.starts_with("account_") {
            return Some(s);
        }
    }
    value::fields(v).iter().find_map(find_account)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bond {
    pub resource: ResourceAddress,
    pub amount: Decimal,
}

/// A registered root domain and the addresses hanging off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootDomain {
    pub name: DomainName,
    pub id: NonFungibleId,
    pub subregistry: ComponentAddress,
    pub records_store: KeyValueStoreAddress,
    pub subdomains_store: KeyValueStoreAddress,
    pub activated_owner: Option<AccountAddress>,
    pub bond: Option<Bond>,
}

/// A subdomain borrowing its parent's addressing.
#[derive(Debug, Clone, Copy)]
pub struct SubDomain<'r> {
    pub name: &'r DomainName,
    pub root: &'r RootDomain,
}

#[derive(Debug, Clone, Copy)]
pub enum DomainEntity<'r> {
    Root(&'r RootDomain),
    Sub(SubDomain<'r>),
}

impl<'r> DomainEntity<'r> {
    /// Resolve `name` (root or sub) against an already-resolved root.
    pub fn resolve(
        gateway: &dyn Gateway,
        root: &'r RootDomain,
        name: &'r DomainName,
    ) -> Result<Self, SdkError> {
        match name.kind() {
            NameKind::Root => Ok(Self::Root(root)),
            NameKind::Sub => {
                if !subdomain_exists(gateway, root, name.leaf_label())? {
                    return Err(ResolutionError::SubdomainNotFound(name.to_string()).into());
                }
                Ok(Self::Sub(SubDomain { name, root }))
            }
        }
    }

    pub fn name(&self) -> &DomainName {
        match self {
            Self::Root(root) => &root.name,
            Self::Sub(sub) => sub.name,
        }
    }

    pub fn root(&self) -> &'r RootDomain {
        match self {
            Self::Root(root) => root,
            Self::Sub(sub) => sub.root,
        }
    }

    pub fn scope(&self) -> RecordScope {
        match self {
            Self::Root(_) => RecordScope::Root,
            Self::Sub(sub) => RecordScope::Subdomain(sub.name.leaf_label().to_owned()),
        }
    }
}

/// Which part of a subregistry a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    Root,
    Subdomain(String),
}

impl RecordScope {
    pub fn to_manifest(&self) -> ManifestValue {
        match self {
            Self::Root => ManifestValue::none(),
            Self::Subdomain(label) => ManifestValue::some(ManifestValue::string(label)),
        }
    }

    fn to_key(&self) -> Value {
        match self {
            Self::Root => value::none(),
            Self::Subdomain(label) => value::some(value::string(label)),
        }
    }

    fn matches(&self, key_scope: &Value) -> bool {
        match (self, value::as_option(key_scope)) {
            (Self::Root, Some(None)) => true,
            (Self::Subdomain(label), Some(Some(inner))) => {
                value::scalar(inner) == Some(label.as_str())
            }
            _ => false,
        }
    }
}

fn record_key(scope: &RecordScope, key: &RecordKey) -> Value {
    value::tuple(vec![
        scope.to_key(),
        value::string(&key.context),
        value::string(&key.directive),
    ])
}

fn required_str<'a>(data: &'a Value, field: &str, what: &str) -> Result<&'a str, ResolutionError> {
    value::field(data, field)
        .and_then(value::scalar)
        .ok_or_else(|| malformed(what, format!("missing field '{field}'")))
}

/// Fetch a root domain's unit and its subregistry's store handles.
pub fn resolve_root(
    gateway: &dyn Gateway,
    config: &LedgerConfig,
    name: &DomainName,
) -> Result<RootDomain, SdkError> {
    let root = DomainName::parse_root(name.root_name())
        .map_err(|e| malformed(name.as_str(), e.to_string()))?;
    let id = domain_to_non_fungible_id(root.as_str());
    let records = gateway.non_fungible_data(
        &config.components.domain_resource,
        &[id.as_str().to_owned()],
    )?;
    let Some(data) = records
        .into_iter()
        .find(|r| !r.is_burned)
        .and_then(|r| r.data)
    else {
        return Err(ResolutionError::DomainNotFound(root.to_string()).into());
    };

    let subregistry = ComponentAddress::from(required_str(
        &data,
        "subregistry_component_address",
        root.as_str(),
    )?);
    let activated_owner = value::field(&data, "current_activated_owner")
        .and_then(value::as_option)
        .flatten()
        .and_then(value::scalar)
        .map(AccountAddress::from);
    let bond = value::field(&data, "bond")
        .and_then(value::as_option)
        .flatten()
        .and_then(|b| {
            Some(Bond {
                resource: ResourceAddress::from(
                    value::field(b, "resource_address").and_then(value::scalar)?,
                ),
                amount: value::field(b, "amount").and_then(value::as_decimal)?,
            })
        });

    let state = gateway.component_state(&subregistry)?;
    let records_store =
        KeyValueStoreAddress::from(required_str(&state, "records", subregistry.as_str())?);
    let subdomains_store =
        KeyValueStoreAddress::from(required_str(&state, "subdomains", subregistry.as_str())?);

    debug!("resolved {root} -> subregistry {subregistry}");
    Ok(RootDomain {
        name: root,
        id,
        subregistry,
        records_store,
        subdomains_store,
        activated_owner,
        bond,
    })
}

pub fn subdomain_exists(
    gateway: &dyn Gateway,
    root: &RootDomain,
    label: &str,
) -> Result<bool, SdkError> {
    Ok(gateway
        .key_value_lookup(&root.subdomains_store, &value::string(label))?
        .is_some())
}

/// Labels of every subdomain under a root.
pub fn subdomain_labels(gateway: &dyn Gateway, root: &RootDomain) -> Result<Vec<String>, SdkError> {
    Ok(gateway
        .key_value_keys(&root.subdomains_store)?
        .iter()
        .filter_map(|k| value::scalar(k).map(str::to_owned))
        .collect())
}

/// Fail unless `account` holds the unit `id` of `resource`.
pub fn ensure_holds(
    gateway: &dyn Gateway,
    account: &str,
    resource: &str,
    id: &NonFungibleId,
    what: &str,
) -> Result<(), SdkError> {
    let held = gateway.non_fungible_ids(account, resource)?;
    if held.iter().any(|h| NonFungibleId::parse(h) == *id) {
        Ok(())
    } else {
        Err(ResolutionError::NotOwner {
            account: account.to_owned(),
            what: what.to_owned(),
        }
        .into())
    }
}

/// Read-side view of a domain or subdomain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainDetails {
    pub name: String,
    pub kind: NameKind,
    pub id: NonFungibleId,
    pub root: String,
    pub subregistry: ComponentAddress,
    pub activated_owner: Option<AccountAddress>,
    pub bond: Option<Bond>,
    /// Subdomains directly under this name; always zero for a subdomain.
    pub subdomain_count: usize,
    /// Subdomain labels; only listed for roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomains: Option<Vec<String>>,
}

pub fn domain_details(
    gateway: &dyn Gateway,
    config: &LedgerConfig,
    name: &DomainName,
) -> Result<DomainDetails, SdkError> {
    let root = resolve_root(gateway, config, name)?;
    let entity = DomainEntity::resolve(gateway, &root, name)?;
    let subdomains = match entity {
        DomainEntity::Root(root) => Some(subdomain_labels(gateway, root)?),
        DomainEntity::Sub(_) => None,
    };
    let subdomain_count = subdomains.as_ref().map_or(0, Vec::len);
    Ok(DomainDetails {
        name: name.to_string(),
        kind: name.kind(),
        id: domain_to_non_fungible_id(name.as_str()),
        root: root.name.to_string(),
        subregistry: root.subregistry.clone(),
        activated_owner: root.activated_owner.clone(),
        bond: root.bond.clone(),
        subdomain_count,
        subdomains,
    })
}

/// Every record attached to an entity, in store order.
pub fn records(
    gateway: &dyn Gateway,
    entity: &DomainEntity<'_>,
) -> Result<Vec<RecordDocket>, SdkError> {
    let store = &entity.root().records_store;
    let scope = entity.scope();
    let keys: Vec<Value> = gateway
        .key_value_keys(store)?
        .into_iter()
        .filter(|k| value::fields(k).first().is_some_and(|s| scope.matches(s)))
        .collect();
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let entries = gateway.key_value_data(store, &keys)?;
    entries
        .iter()
        .map(|entry| {
            let parts = value::fields(&entry.key);
            let text = |i: usize| parts.get(i).and_then(value::scalar);
            match (text(1), text(2), value::scalar(&entry.value)) {
                (Some(context), Some(directive), Some(v)) => {
                    Ok(RecordDocket::new(context, directive, v))
                }
                _ => {
                    let reason = "record entry is not (scope, context, directive) -> string";
                    Err(malformed(store.as_str(), reason).into())
                }
            }
        })
        .collect()
}

/// Value of one record, or `None` when it is not set.
pub fn resolve_record(
    gateway: &dyn Gateway,
    entity: &DomainEntity<'_>,
    key: &RecordKey,
) -> Result<Option<String>, SdkError> {
    let entry = gateway.key_value_lookup(
        &entity.root().records_store,
        &record_key(&entity.scope(), key),
    )?;
    Ok(entry.and_then(|e| value::scalar(&e.value).map(str::to_owned)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDomain {
    pub id: NonFungibleId,
    pub name: String,
}

/// Root domains held by an account.
pub fn account_domains(
    gateway: &dyn Gateway,
    config: &LedgerConfig,
    account: &str,
) -> Result<Vec<AccountDomain>, SdkError> {
    let resource = &config.components.domain_resource;
    let ids = gateway.non_fungible_ids(account, resource)?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let units = gateway.non_fungible_data(resource, &ids)?;
    let mut domains = Vec::with_capacity(units.len());
    for unit in units.into_iter().filter(|u| !u.is_burned) {
        let name = unit.data.as_ref().and_then(|d| value::field(d, "name"));
        match name.and_then(value::scalar) {
            Some(name) => domains.push(AccountDomain {
                id: NonFungibleId::parse(&unit.id),
                name: name.to_owned(),
            }),
            None => warn!("domain unit {} has no name field, skipping", unit.id),
        }
    }
    Ok(domains)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rns_gateway::MemoryGateway;
    use rns_schema::parse_config_str;

    pub const ACCOUNT: &str =
        "account_tdx_2_1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    pub const OTHER_ACCOUNT: &str =
        "account_tdx_2_1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq";
    pub const RNS: &str =
        "component_tdx_2_1cccccccccccccccccccccccccccccccccccccccccccccccccccccc";
    pub const LOCKER: &str =
        "locker_tdx_2_1dddddddddddddddddddddddddddddddddddddddddddddddddddddd";
    pub const DOMAIN_RESOURCE: &str =
        "resource_tdx_2_1eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
    pub const BADGE_RESOURCE: &str =
        "resource_tdx_2_1ffffffffffffffffffffffffffffffffffffffffffffffffffffff";
    pub const IMPORT_RESOURCE: &str =
        "resource_tdx_2_1gggggggggggggggggggggggggggggggggggggggggggggggggggggg";
    pub const XRD: &str =
        "resource_tdx_2_1hhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhh";
    pub const USD: &str =
        "resource_tdx_2_1jjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjjj";
    pub const REGISTRY: &str =
        "internal_keyvaluestore_tdx_2_1kkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkk";
    pub const RESERVED: &str =
        "internal_keyvaluestore_tdx_2_1llllllllllllllllllllllllllllllllllllllllllllllllllllll";
    pub const SUBREGISTRY: &str =
        "component_tdx_2_1mmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmm";
    pub const RECORDS: &str =
        "internal_keyvaluestore_tdx_2_1nnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnn";
    pub const SUBDOMAINS: &str =
        "internal_keyvaluestore_tdx_2_1pppppppppppppppppppppppppppppppppppppppppppppppppppppp";

    pub fn config() -> LedgerConfig {
        parse_config_str(&format!(
            r#"
network = "stokenet"

[components]
rns = "{RNS}"
domain_resource = "{DOMAIN_RESOURCE}"
registrar_badge_resource = "{BADGE_RESOURCE}"
import_domain_resource = "{IMPORT_RESOURCE}"
registry_store = "{REGISTRY}"
reserved_claims_store = "{RESERVED}"
locker = "{LOCKER}"

[payment]
accepted_resources = ["{XRD}", "{USD}"]

[price_ladder]
"2" = "120"
"3" = "60"
"#
        ))
        .unwrap()
    }

    /// Ledger with `ab.xrd` registered to [`ACCOUNT`], one subdomain `blog`
    /// and two records.
    pub fn ledger() -> MemoryGateway {
        let mut gw = MemoryGateway::new();
        let id = domain_to_non_fungible_id("ab.xrd");
        gw.insert_kv(
            REGISTRY,
            value::string("ab.xrd"),
            value::string(id.as_str()),
        );
        gw.insert_non_fungible(
            DOMAIN_RESOURCE,
            id.as_str(),
            value::tuple(vec![
                value::named("name", value::string("ab.xrd")),
                value::named(
                    "subregistry_component_address",
                    value::reference(SUBREGISTRY),
                ),
                value::named(
                    "current_activated_owner",
                    value::some(value::reference(ACCOUNT)),
                ),
                value::named(
                    "bond",
                    value::some(value::tuple(vec![
                        value::named("resource_address", value::reference(XRD)),
                        value::named("amount", value::decimal(Decimal::from(120))),
                    ])),
                ),
            ]),
        );
        gw.set_component_state(
            SUBREGISTRY,
            value::tuple(vec![
                value::named("records", value::reference(RECORDS)),
                value::named("subdomains", value::reference(SUBDOMAINS)),
            ]),
        );
        gw.insert_kv(SUBDOMAINS, value::string("blog"), value::tuple(vec![]));
        gw.insert_kv(
            RECORDS,
            record_key(&RecordScope::Root, &RecordKey::new("receivers", "*")),
            value::string(ACCOUNT),
        );
        gw.insert_kv(
            RECORDS,
            record_key(
                &RecordScope::Subdomain("blog".into()),
                &RecordKey::new("social", "x"),
            ),
            value::string("@blog"),
        );
        gw.set_holdings(ACCOUNT, DOMAIN_RESOURCE, vec![id.as_str().to_owned()]);
        gw
    }
}
