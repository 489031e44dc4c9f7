use super::{json_pretty, EXIT_SUCCESS};
use rns_schema::{
    classify_id, domain_to_non_fungible_id, format_id, normalize_name, validate_entity_name,
};

/// Print the derived local id of a domain name. Needs no gateway.
pub fn run(name: &str, json: bool) -> Result<u8, String> {
    let name = normalize_name(name);
    let kind = validate_entity_name(&name).map_err(|e| format!("invalid parameters: {e}"))?;
    let id = domain_to_non_fungible_id(&name);
    if json {
        let payload = serde_json::json!({ "name": name, "kind": kind, "id": id });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{id}");
    }
    Ok(EXIT_SUCCESS)
}

/// Normalize a raw local id to its bracketed form.
pub fn format(raw: &str, json: bool) -> Result<u8, String> {
    let formatted = format_id(raw.trim());
    if json {
        let payload = serde_json::json!({
            "id": formatted,
            "kind": classify_id(&formatted),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{formatted}");
    }
    Ok(EXIT_SUCCESS)
}
