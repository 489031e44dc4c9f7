use super::{fail, json_pretty, EXIT_SUCCESS};
use rns_core::Engine;

pub fn run(engine: &Engine, domain: &str, json: bool) -> Result<u8, String> {
    let details = engine.domain_details(domain).map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&details)?);
        return Ok(EXIT_SUCCESS);
    }
    println!("name:          {}", details.name);
    println!("kind:          {}", details.kind);
    println!("id:            {}", details.id);
    println!("root:          {}", details.root);
    println!("subregistry:   {}", details.subregistry);
    println!(
        "activated by:  {}",
        details
            .activated_owner
            .as_deref()
            .unwrap_or("(not activated)")
    );
    match &details.bond {
        Some(bond) => println!("bond:          {} {}", bond.amount, bond.resource),
        None => println!("bond:          (none)"),
    }
    println!("subdomains:    {}", details.subdomain_count);
    if let Some(subdomains) = &details.subdomains {
        for label in subdomains {
            println!("  {label}.{}", details.root);
        }
    }
    Ok(EXIT_SUCCESS)
}
