//! Bond pricing, registrar fees and affordability.

use crate::resolution::ResolutionError;
use crate::SdkError;
use rns_gateway::{value, Gateway, ResourceBalance};
use rns_schema::{strip_extension, LedgerConfig, NonFungibleId, PriceLadder, ResourceAddress};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Bond quantum for label lengths the ladder does not list.
pub const FALLBACK_BOND_QUANTUM: u32 = 4;

/// Decimal places of fees and totals.
pub const AMOUNT_SCALE: u32 = 6;

/// Bond quantum for a name, looked up by the length of its label.
pub fn price_for(name: &str, ladder: &PriceLadder) -> Decimal {
    let label_len = strip_extension(name).chars().count();
    ladder.get(label_len).unwrap_or_else(|| {
        debug!("no ladder entry for length {label_len}, using fallback quantum");
        Decimal::from(FALLBACK_BOND_QUANTUM)
    })
}

/// Round half away from zero to [`AMOUNT_SCALE`] places, keeping trailing zeros.
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AMOUNT_SCALE);
    rounded
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrarInfo {
    pub id: NonFungibleId,
    pub name: String,
    /// Fee as a percentage of the bond, e.g. `2.5`.
    pub fee_percentage: Decimal,
}

/// Read a registrar badge's name and fee.
pub fn fetch_registrar(
    gateway: &dyn Gateway,
    config: &LedgerConfig,
    id: &NonFungibleId,
) -> Result<RegistrarInfo, SdkError> {
    let units = gateway.non_fungible_data(
        &config.components.registrar_badge_resource,
        &[id.as_str().to_owned()],
    )?;
    let Some(data) = units
        .into_iter()
        .find(|u| !u.is_burned)
        .and_then(|u| u.data)
    else {
        return Err(ResolutionError::RegistrarNotFound(id.to_string()).into());
    };
    let name = value::field(&data, "name")
        .and_then(value::scalar)
        .unwrap_or_default()
        .to_owned();
    let malformed = |reason: String| ResolutionError::Malformed {
        what: format!("registrar {id}"),
        reason,
    };
    let fee_percentage = value::field(&data, "fee_percentage")
        .and_then(value::as_decimal)
        .ok_or_else(|| malformed("missing fee_percentage".to_owned()))?;
    if fee_percentage < Decimal::ZERO || fee_percentage > Decimal::ONE_HUNDRED {
        let reason = format!("fee_percentage {fee_percentage} is outside 0..=100");
        return Err(malformed(reason).into());
    }
    Ok(RegistrarInfo {
        id: id.clone(),
        name,
        fee_percentage,
    })
}

/// Read the bond ladder from the core component's `price_ladder` map.
pub fn fetch_price_ladder(
    gateway: &dyn Gateway,
    config: &LedgerConfig,
) -> Result<PriceLadder, SdkError> {
    let state = gateway.component_state(&config.components.rns)?;
    let Some(map) = value::field(&state, "price_ladder") else {
        return Err(ResolutionError::Malformed {
            what: config.components.rns.to_string(),
            reason: "no price_ladder field".to_owned(),
        }
        .into());
    };
    let ladder: PriceLadder = value::map_entries(map)
        .into_iter()
        .filter_map(|(k, v)| match (value::scalar(k), value::as_decimal(v)) {
            (Some(len), Some(price)) => Some((len.to_owned(), price)),
            _ => {
                warn!("skipping unreadable price ladder entry");
                None
            }
        })
        .collect();
    debug!("fetched price ladder with {} entries", ladder.len());
    Ok(ladder)
}

/// Itemized cost of registering a name through a registrar. All amounts
/// carry [`AMOUNT_SCALE`] places and `total_amount == bond_amount + registrar_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub domain: String,
    pub bond_amount: Decimal,
    pub registrar_fee: Decimal,
    pub registrar_fee_percentage: Decimal,
    pub total_amount: Decimal,
    pub payment_resource: ResourceAddress,
    pub registrar_id: NonFungibleId,
    pub registrar_name: String,
}

pub fn cost_breakdown(
    domain: &str,
    ladder: &PriceLadder,
    registrar: RegistrarInfo,
    payment_resource: ResourceAddress,
) -> Result<CostBreakdown, SdkError> {
    let overflow = || ResolutionError::Malformed {
        what: format!("cost of {domain}"),
        reason: "amount out of range".to_owned(),
    };
    let bond = price_for(domain, ladder);
    let fee = bond
        .checked_mul(registrar.fee_percentage)
        .and_then(|f| f.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    let bond_amount = round_amount(bond);
    let registrar_fee = round_amount(fee);
    let total_amount = bond_amount.checked_add(registrar_fee).ok_or_else(overflow)?;
    Ok(CostBreakdown {
        domain: domain.to_owned(),
        bond_amount,
        registrar_fee,
        registrar_fee_percentage: registrar.fee_percentage,
        total_amount,
        payment_resource,
        registrar_id: registrar.id,
        registrar_name: registrar.name,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub resource: ResourceAddress,
    pub balance: Decimal,
    pub shortfall: Decimal,
}

/// Accepted payment resources split by whether they cover `required`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffordabilityReport {
    pub required: Decimal,
    pub sufficient: Vec<ResourceBalance>,
    pub insufficient: Vec<Shortfall>,
}

impl AffordabilityReport {
    pub fn can_afford(&self) -> bool {
        !self.sufficient.is_empty()
    }

    pub fn covers(&self, resource: &str) -> bool {
        self.sufficient.iter().any(|b| b.resource == resource)
    }

    /// First accepted resource that covers the amount, in configuration order.
    pub fn first_sufficient(&self) -> Option<&ResourceAddress> {
        self.sufficient.first().map(|b| &b.resource)
    }
}

impl fmt::Display for AffordabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} required", self.required)?;
        for s in &self.insufficient {
            write!(
                f,
                "; {} holds {} (short {})",
                s.resource, s.balance, s.shortfall
            )?;
        }
        Ok(())
    }
}

/// Partition `accepted` resources by whether the account's balance covers `required`.
pub fn affordability(
    balances: &[ResourceBalance],
    accepted: &[ResourceAddress],
    required: Decimal,
) -> AffordabilityReport {
    let mut sufficient = Vec::new();
    let mut insufficient = Vec::new();
    for resource in accepted {
        let balance: Decimal = balances
            .iter()
            .filter(|b| b.resource == *resource)
            .map(|b| b.amount)
            .sum();
        if balance >= required {
            sufficient.push(ResourceBalance {
                resource: resource.clone(),
                amount: balance,
            });
        } else {
            insufficient.push(Shortfall {
                resource: resource.clone(),
                balance,
                shortfall: required - balance,
            });
        }
    }
    AffordabilityReport {
        required,
        sufficient,
        insufficient,
    }
}
