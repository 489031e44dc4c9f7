use super::{fail, json_pretty, EXIT_SUCCESS};
use rns_core::Engine;

pub fn run(engine: &Engine, account: &str, json: bool) -> Result<u8, String> {
    let domains = engine.account_domains(account).map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&domains)?);
    } else if domains.is_empty() {
        println!("no domains held by {account}");
    } else {
        println!("{:<36} ID", "NAME");
        for d in &domains {
            println!("{:<36} {}", d.name, d.id);
        }
    }
    Ok(EXIT_SUCCESS)
}
