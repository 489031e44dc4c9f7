//! Built-in ledger networks and network-tagged address checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Length of the bech32m data part (30-byte payload plus checksum).
const ADDRESS_DATA_LEN: usize = 54;

static DATA_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[02-9ac-hj-np-z]+$").expect("valid bech32 charset regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Stokenet,
}

/// Static facts about a built-in network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkPreset {
    pub network: Network,
    pub network_id: u8,
    pub hrp_suffix: &'static str,
    pub gateway_url: &'static str,
}

pub const BUILTIN_NETWORKS: &[NetworkPreset] = &[
    NetworkPreset {
        network: Network::Mainnet,
        network_id: 0x01,
        hrp_suffix: "rdx",
        gateway_url: "https://mainnet.radixdlt.com",
    },
    NetworkPreset {
        network: Network::Stokenet,
        network_id: 0x02,
        hrp_suffix: "tdx_2_",
        gateway_url: "https://stokenet.radixdlt.com",
    },
];

impl Network {
    pub fn preset(self) -> &'static NetworkPreset {
        BUILTIN_NETWORKS
            .iter()
            .find(|p| p.network == self)
            .unwrap_or(&BUILTIN_NETWORKS[0])
    }

    pub fn hrp_suffix(self) -> &'static str {
        self.preset().hrp_suffix
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mainnet" => Some(Network::Mainnet),
            "stokenet" => Some(Network::Stokenet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Stokenet => f.write_str("stokenet"),
        }
    }
}

/// Entity type encoded in an address prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Resource,
    Component,
    Locker,
    KeyValueStore,
}

impl EntityKind {
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Resource => "resource",
            EntityKind::Component => "component",
            EntityKind::Locker => "locker",
            EntityKind::KeyValueStore => "internal_keyvaluestore",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must not be empty")]
    Empty,
    #[error("'{address}' is not a {expected} address")]
    WrongEntity {
        address: String,
        expected: EntityKind,
    },
    #[error("'{address}' does not belong to {expected}")]
    WrongNetwork { address: String, expected: Network },
    #[error("'{0}' is not a well-formed address")]
    Malformed(String),
}

/// Check `<entity>_<hrp>1<data>` against the active network.
///
/// Only the prefix, the character set and the data length are verified; the
/// bech32m checksum is left to the ledger.
pub fn validate_address(
    address: &str,
    kind: EntityKind,
    network: Network,
) -> Result<(), AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    let Some(rest) = address
        .strip_prefix(kind.prefix())
        .and_then(|r| r.strip_prefix('_'))
    else {
        return Err(AddressError::WrongEntity {
            address: address.to_owned(),
            expected: kind,
        });
    };
    let hrp = network.hrp_suffix();
    let Some(data) = rest.strip_prefix(hrp).and_then(|r| r.strip_prefix('1')) else {
        return Err(AddressError::WrongNetwork {
            address: address.to_owned(),
            expected: network,
        });
    };
    if data.len() != ADDRESS_DATA_LEN || !DATA_RE.is_match(data) {
        return Err(AddressError::Malformed(address.to_owned()));
    }
    Ok(())
}
