pub mod account_domains;
pub mod completions;
pub mod details;
pub mod id;
pub mod manifest;
pub mod price;
pub mod records;
pub mod status;

use indicatif::{ProgressBar, ProgressStyle};
use rns_core::resolution::DomainStatus;
use rns_core::{Engine, SdkError};
use rns_gateway::{GatewayConfig, HttpGateway};
use rns_schema::{default_config_path, parse_config_file};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_VALIDATION_ERROR: u8 = 2;
pub const EXIT_GATEWAY_ERROR: u8 = 3;

const APP_NAME: &str = "rns-cli";

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &DomainStatus) -> String {
    use console::Style;
    let text = status.to_string();
    match status {
        DomainStatus::Available => Style::new().green().bold().apply_to(text).to_string(),
        DomainStatus::Taken => Style::new().red().apply_to(text).to_string(),
        DomainStatus::Reserved { .. } => Style::new().yellow().apply_to(text).to_string(),
    }
}

/// Render an engine error; `main` maps the message prefix to an exit code.
pub fn fail(e: &SdkError) -> String {
    match e {
        SdkError::Validation(issues) if issues.len() > 1 => {
            let mut msg = format!("invalid parameters: {} issues", issues.len());
            for issue in issues {
                msg.push_str(&format!("\n  - {issue}"));
            }
            msg
        }
        other => other.to_string(),
    }
}

/// Load the ledger config and connect an engine over the HTTP gateway.
pub fn connect(config_path: Option<&Path>, json: bool) -> Result<Engine, String> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path().map_err(|e| format!("config error: {e}"))?,
    };
    debug!("loading ledger config from {}", path.display());
    let config = parse_config_file(&path).map_err(|e| format!("config error: {e}"))?;
    let gateway = HttpGateway::new(GatewayConfig::from_ledger(&config).with_app_name(APP_NAME));

    let pb = (!json).then(|| spinner(&format!("connecting to {}", config.gateway_url())));
    match Engine::connect(config, Box::new(gateway)) {
        Ok(engine) => {
            if let Some(pb) = pb {
                spin_ok(&pb, "connected");
            }
            Ok(engine)
        }
        Err(e) => {
            if let Some(pb) = pb {
                spin_fail(&pb, "connection failed");
            }
            Err(fail(&e))
        }
    }
}
