use super::{fail, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use rns_core::Engine;

pub fn run(engine: &Engine, domain: &str, json: bool) -> Result<u8, String> {
    let records = engine.records(domain).map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&records)?);
    } else if records.is_empty() {
        println!("no records on {domain}");
    } else {
        println!("{:<16} {:<16} VALUE", "CONTEXT", "DIRECTIVE");
        for r in &records {
            println!("{:<16} {:<16} {}", r.context, r.directive, r.value);
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Print one record value; exits non-zero when the record is not set.
pub fn resolve(
    engine: &Engine,
    domain: &str,
    context: &str,
    directive: &str,
    json: bool,
) -> Result<u8, String> {
    let value = engine
        .resolve_record(domain, context, directive)
        .map_err(|e| fail(&e))?;
    if json {
        let payload = serde_json::json!({
            "domain": domain,
            "context": context,
            "directive": directive,
            "value": value,
        });
        println!("{}", json_pretty(&payload)?);
    } else if let Some(v) = &value {
        println!("{v}");
    } else {
        eprintln!("{context}:{directive} is not set on {domain}");
    }
    Ok(if value.is_some() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
