use super::{colorize_status, fail, json_pretty, EXIT_SUCCESS};
use rns_core::Engine;

pub fn run(engine: &Engine, domain: &str, json: bool) -> Result<u8, String> {
    let report = engine.domain_status(domain).map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }
    println!("{}: {}", report.domain, colorize_status(&report.status));
    for check in &report.skipped {
        eprintln!("warning: {check:?} lookup failed and was skipped");
    }
    Ok(EXIT_SUCCESS)
}
