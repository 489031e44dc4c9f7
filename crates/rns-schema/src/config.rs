use crate::ladder::PriceLadder;
use crate::network::{validate_address, AddressError, EntityKind, Network};
use crate::types::{ComponentAddress, KeyValueStoreAddress, ResourceAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read ledger config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ledger config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("invalid address for '{field}': {source}")]
    Address {
        field: &'static str,
        #[source]
        source: AddressError,
    },
    #[error("payment.accepted_resources must list at least one resource")]
    NoPaymentResources,
    #[error("invalid price ladder entry '{key}': {reason}")]
    InvalidLadder { key: String, reason: String },
    #[error("HOME not set")]
    NoHome,
}

/// Addresses of the on-ledger components the client talks to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ComponentsSection {
    pub rns: ComponentAddress,
    pub domain_resource: ResourceAddress,
    pub registrar_badge_resource: ResourceAddress,
    pub import_domain_resource: ResourceAddress,
    pub registry_store: KeyValueStoreAddress,
    #[serde(default)]
    pub reserved_claims_store: Option<KeyValueStoreAddress>,
    pub locker: ComponentAddress,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PaymentSection {
    pub accepted_resources: Vec<ResourceAddress>,
}

/// Ledger configuration: network, core component addresses, accepted payment
/// resources and, optionally, a pinned price ladder.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    pub network: Network,
    #[serde(default)]
    pub gateway_url: Option<String>,
    pub components: ComponentsSection,
    pub payment: PaymentSection,
    #[serde(default)]
    pub price_ladder: PriceLadder,
}

impl LedgerConfig {
    /// Gateway endpoint: the configured one, else the network preset's.
    pub fn gateway_url(&self) -> String {
        self.gateway_url
            .as_deref()
            .unwrap_or(self.network.preset().gateway_url)
            .trim_end_matches('/')
            .to_owned()
    }

    pub fn is_accepted_payment(&self, resource: &str) -> bool {
        self.payment
            .accepted_resources
            .iter()
            .any(|r| r.as_str() == resource)
    }

    /// Check every address against the configured network and sanity-check the ladder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.components;
        let checks: [(&'static str, &str, EntityKind); 6] = [
            ("components.rns", c.rns.as_str(), EntityKind::Component),
            (
                "components.domain_resource",
                c.domain_resource.as_str(),
                EntityKind::Resource,
            ),
            (
                "components.registrar_badge_resource",
                c.registrar_badge_resource.as_str(),
                EntityKind::Resource,
            ),
            (
                "components.import_domain_resource",
                c.import_domain_resource.as_str(),
                EntityKind::Resource,
            ),
            (
                "components.registry_store",
                c.registry_store.as_str(),
                EntityKind::KeyValueStore,
            ),
            ("components.locker", c.locker.as_str(), EntityKind::Locker),
        ];
        for (field, address, kind) in checks {
            validate_address(address, kind, self.network)
                .map_err(|source| ConfigError::Address { field, source })?;
        }
        if let Some(store) = &c.reserved_claims_store {
            validate_address(store, EntityKind::KeyValueStore, self.network).map_err(
                |source| ConfigError::Address {
                    field: "components.reserved_claims_store",
                    source,
                },
            )?;
        }

        if self.payment.accepted_resources.is_empty() {
            return Err(ConfigError::NoPaymentResources);
        }
        for resource in &self.payment.accepted_resources {
            validate_address(resource, EntityKind::Resource, self.network).map_err(|source| {
                ConfigError::Address {
                    field: "payment.accepted_resources",
                    source,
                }
            })?;
        }

        for (key, price) in self.price_ladder.iter() {
            if key.parse::<usize>().is_err() {
                return Err(ConfigError::InvalidLadder {
                    key: key.to_owned(),
                    reason: "key must be a label length".to_owned(),
                });
            }
            if *price <= Decimal::ZERO {
                return Err(ConfigError::InvalidLadder {
                    key: key.to_owned(),
                    reason: format!("price must be positive, got {price}"),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_config_str(input: &str) -> Result<LedgerConfig, ConfigError> {
    let config: LedgerConfig = toml::from_str(input)?;
    config.validate()?;
    Ok(config)
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<LedgerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// `~/.config/rns/ledger.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config/rns/ledger.toml"))
}
