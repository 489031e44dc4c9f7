use super::{fail, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use rns_core::Engine;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn run(
    engine: &Engine,
    domain: &str,
    registrar: &str,
    payment_resource: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let cost = engine
        .cost_breakdown(domain, registrar, payment_resource)
        .map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&cost)?);
        return Ok(EXIT_SUCCESS);
    }
    println!("domain:     {}", cost.domain);
    println!("bond:       {}", cost.bond_amount);
    println!(
        "fee:        {} ({}% to {} {})",
        cost.registrar_fee, cost.registrar_fee_percentage, cost.registrar_name, cost.registrar_id
    );
    println!("total:      {}", cost.total_amount);
    println!("paid in:    {}", cost.payment_resource);
    Ok(EXIT_SUCCESS)
}

/// Report which accepted resources cover `amount`; exits non-zero when none do.
pub fn afford(engine: &Engine, account: &str, amount: &str, json: bool) -> Result<u8, String> {
    let required = Decimal::from_str(amount.trim())
        .map_err(|e| format!("invalid parameters: amount: {e}"))?;
    let report = engine
        .check_affordability(account, required)
        .map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for b in &report.sufficient {
            println!("✓ {} (balance {})", b.resource, b.amount);
        }
        for s in &report.insufficient {
            println!(
                "✗ {} (balance {}, short {})",
                s.resource, s.balance, s.shortfall
            );
        }
    }
    Ok(if report.can_afford() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
