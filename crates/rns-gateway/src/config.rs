use rns_schema::LedgerConfig;
use serde::{Deserialize, Serialize};

/// Application name sent as `RDX-App-Name` when none is configured.
pub const DEFAULT_APP_NAME: &str = "rns-client";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
    #[serde(default)]
    pub app_name: Option<String>,
    /// Page size requested from paginated endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    100
}

impl GatewayConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            app_name: None,
            page_size: default_page_size(),
        }
    }

    /// Gateway endpoint of a ledger configuration (explicit URL or network preset).
    pub fn from_ledger(ledger: &LedgerConfig) -> Self {
        Self::new(&ledger.gateway_url())
    }

    #[must_use]
    pub fn with_app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_owned());
        self
    }

    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strips_trailing_slash() {
        let config = GatewayConfig::new("https://stokenet.radixdlt.com/");
        assert_eq!(config.url, "https://stokenet.radixdlt.com");
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn app_name_defaults() {
        let config = GatewayConfig::new("http://localhost");
        assert_eq!(config.app_name(), DEFAULT_APP_NAME);
        let named = config.with_app_name("wallet-tool");
        assert_eq!(named.app_name(), "wallet-tool");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: GatewayConfig = serde_json::from_str(r#"{"url":"http://x"}"#).unwrap();
        assert_eq!(config.page_size, 100);
        assert!(config.app_name.is_none());
    }
}
