//! Name grammar, identifiers, addresses and ledger configuration for RNS.
//!
//! This crate defines the schema layer: domain name validation and
//! classification (`DomainName`), the non-fungible local id codec and the
//! deterministic name-to-id derivation (`domain_to_non_fungible_id`),
//! network-tagged address checks, record dockets, the price ladder snapshot
//! and the TOML ledger configuration (`LedgerConfig`).

pub mod config;
pub mod docket;
pub mod identifier;
pub mod ladder;
pub mod name;
pub mod network;
pub mod types;

pub use config::{
    default_config_path, parse_config_file, parse_config_str, ComponentsSection, ConfigError,
    LedgerConfig, PaymentSection,
};
pub use docket::{RecordDocket, RecordKey};
pub use identifier::{
    classify_id, domain_to_non_fungible_id, format_id, strip_id, IdKind, NonFungibleId,
};
pub use ladder::PriceLadder;
pub use name::{
    normalize_name, root_of, segment_count, strip_extension, validate_entity_name,
    validate_root_name, validate_subdomain_name, DomainName, NameError, NameKind, EXTENSION,
};
pub use network::{
    validate_address, AddressError, EntityKind, Network, NetworkPreset, BUILTIN_NETWORKS,
};
pub use types::{
    AccountAddress, ComponentAddress, IntentHash, KeyValueStoreAddress, ResourceAddress,
};
