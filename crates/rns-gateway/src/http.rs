use crate::models::{
    EntityDetailsRequest, EntityDetailsResponse, EntityPageRequest, FungiblePageResponse,
    KvDataRequest, KvDataResponse, KvKeyRequest, KvKeysRequest, KvKeysResponse,
    NonFungibleDataRequest, NonFungibleDataResponse, NonFungiblePageResponse,
};
use crate::{Gateway, GatewayConfig, GatewayError, KvEntry, NonFungibleRecord, ResourceBalance};
use rns_schema::ResourceAddress;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::str::FromStr;

/// Gateway backend over the public REST API.
///
/// Every endpoint is a JSON `POST`:
/// - `/state/key-value-store/data`: entries for specific keys
/// - `/state/key-value-store/keys`: paginated key listing
/// - `/state/non-fungible/data`: non-fungible data by id
/// - `/state/entity/details`: component state
/// - `/state/entity/page/fungibles/`: account fungible balances
/// - `/state/entity/page/non-fungibles/`: account non-fungible ids, per vault
pub struct HttpGateway {
    config: GatewayConfig,
    agent: ureq::Agent,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self { config, agent }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        let payload =
            serde_json::to_vec(body).map_err(|e| GatewayError::Serialization(e.to_string()))?;
        tracing::debug!("POST {url} ({} bytes)", payload.len());

        let req = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("RDX-App-Name", self.config.app_name());
        let resp = match req.send(payload.as_slice()) {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(GatewayError::NotFound(url));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(GatewayError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(GatewayError::Http(e.to_string()));
            }
        };

        let code = resp.status().as_u16();
        if code == 404 {
            return Err(GatewayError::NotFound(url));
        }
        if code >= 400 {
            return Err(GatewayError::Http(format!("HTTP {code} for {url}")));
        }

        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}

impl Gateway for HttpGateway {
    fn key_value_data(&self, store: &str, keys: &[Value]) -> Result<Vec<KvEntry>, GatewayError> {
        let request = KvDataRequest {
            key_value_store_address: store,
            keys: keys.iter().map(|k| KvKeyRequest { key_json: k }).collect(),
        };
        let resp: KvDataResponse = self.post("/state/key-value-store/data", &request)?;
        Ok(resp
            .entries
            .into_iter()
            .map(|e| KvEntry {
                key: e.key.programmatic_json,
                value: e.value.programmatic_json,
            })
            .collect())
    }

    fn key_value_keys(&self, store: &str) -> Result<Vec<Value>, GatewayError> {
        let mut keys = Vec::new();
        let mut cursor = None;
        loop {
            let request = KvKeysRequest {
                key_value_store_address: store,
                cursor: cursor.take(),
                limit_per_page: self.config.page_size,
            };
            let page: KvKeysResponse = self.post("/state/key-value-store/keys", &request)?;
            keys.extend(page.items.into_iter().map(|i| i.key.programmatic_json));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(keys)
    }

    fn non_fungible_data(
        &self,
        resource: &str,
        ids: &[String],
    ) -> Result<Vec<NonFungibleRecord>, GatewayError> {
        let request = NonFungibleDataRequest {
            resource_address: resource,
            non_fungible_ids: ids,
        };
        let resp: NonFungibleDataResponse = self.post("/state/non-fungible/data", &request)?;
        Ok(resp
            .non_fungible_ids
            .into_iter()
            .map(|item| NonFungibleRecord {
                id: item.non_fungible_id,
                is_burned: item.is_burned,
                data: item.data.map(|d| d.programmatic_json),
            })
            .collect())
    }

    fn component_state(&self, component: &str) -> Result<Value, GatewayError> {
        let request = EntityDetailsRequest {
            addresses: [component],
        };
        let resp: EntityDetailsResponse = self.post("/state/entity/details", &request)?;
        let item = resp
            .items
            .into_iter()
            .find(|i| i.address == component)
            .ok_or_else(|| GatewayError::NotFound(component.to_owned()))?;
        item.details
            .and_then(|mut d| d.get_mut("state").map(Value::take))
            .ok_or_else(|| GatewayError::UnexpectedShape(format!("{component} has no state")))
    }

    fn fungible_balances(&self, account: &str) -> Result<Vec<ResourceBalance>, GatewayError> {
        let mut balances = Vec::new();
        let mut cursor = None;
        loop {
            let request = EntityPageRequest {
                address: account,
                aggregation_level: "Global",
                cursor: cursor.take(),
                opt_ins: None,
            };
            let page: FungiblePageResponse =
                self.post("/state/entity/page/fungibles/", &request)?;
            for item in page.items {
                let raw = item.amount.as_deref().unwrap_or("0");
                let amount = Decimal::from_str(raw).map_err(|e| {
                    GatewayError::UnexpectedShape(format!("bad amount '{raw}': {e}"))
                })?;
                balances.push(ResourceBalance {
                    resource: ResourceAddress::new(item.resource_address),
                    amount,
                });
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(balances)
    }

    fn non_fungible_ids(&self, account: &str, resource: &str) -> Result<Vec<String>, GatewayError> {
        let mut ids = Vec::new();
        let mut cursor = None;
        loop {
            let request = EntityPageRequest {
                address: account,
                aggregation_level: "Vault",
                cursor: cursor.take(),
                opt_ins: Some(serde_json::json!({ "non_fungible_include_nfids": true })),
            };
            let page: NonFungiblePageResponse =
                self.post("/state/entity/page/non-fungibles/", &request)?;
            for item in page.items {
                if item.resource_address != resource {
                    continue;
                }
                for vault in item.vaults.map(|v| v.items).unwrap_or_default() {
                    ids.extend(vault.items);
                }
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    /// A captured HTTP request for header and body inspection.
    #[derive(Debug, Clone)]
    struct CapturedRequest {
        path: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    }

    /// Serves canned JSON bodies by path; each path may have a queue of pages.
    struct MockServer {
        addr: String,
        _handle: std::thread::JoinHandle<()>,
        requests: Arc<Mutex<Vec<CapturedRequest>>>,
    }

    impl MockServer {
        fn start(routes: Vec<(&str, Vec<(u16, String)>)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = format!("http://{}", listener.local_addr().unwrap());
            let routes: HashMap<String, Vec<(u16, String)>> = routes
                .into_iter()
                .map(|(p, mut pages)| {
                    pages.reverse();
                    (p.to_owned(), pages)
                })
                .collect();
            let routes = Arc::new(Mutex::new(routes));
            let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));

            let routes_clone = Arc::clone(&routes);
            let requests_clone = Arc::clone(&requests);
            let handle = std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).is_err() {
                        continue;
                    }
                    let parts: Vec<&str> = request_line.trim().splitn(3, ' ').collect();
                    if parts.len() < 2 {
                        continue;
                    }
                    let path = parts[1].to_owned();

                    let mut content_length: usize = 0;
                    let mut headers = HashMap::new();
                    loop {
                        let mut line = String::new();
                        if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                            break;
                        }
                        if let Some((k, v)) = line.trim().split_once(": ") {
                            headers.insert(k.to_lowercase(), v.to_owned());
                        }
                        let lower = line.to_lowercase();
                        if let Some(val) = lower.strip_prefix("content-length: ") {
                            content_length = val.trim().parse().unwrap_or(0);
                        }
                    }
                    let mut body = vec![0u8; content_length];
                    if content_length > 0 {
                        let _ = reader.read_exact(&mut body);
                    }
                    requests_clone.lock().unwrap().push(CapturedRequest {
                        path: path.clone(),
                        headers,
                        body,
                    });

                    let (code, payload) = {
                        let mut routes = routes_clone.lock().unwrap();
                        match routes.get_mut(&path) {
                            Some(pages) if pages.len() > 1 => pages.pop().unwrap(),
                            Some(pages) if pages.len() == 1 => pages[0].clone(),
                            _ => (404, String::new()),
                        }
                    };
                    let reason = if code == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {code} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                        payload.len()
                    );
                    let _ = stream.write_all(response.as_bytes());
                    let _ = stream.flush();
                }
            });

            MockServer {
                addr,
                _handle: handle,
                requests,
            }
        }

        fn captured_requests(&self) -> Vec<CapturedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn ok(body: &Value) -> (u16, String) {
        (200, body.to_string())
    }

    fn test_gateway(url: &str) -> HttpGateway {
        HttpGateway::new(GatewayConfig::new(url))
    }

    #[test]
    fn http_key_value_data_decodes_entries() {
        let body = serde_json::json!({
            "key_value_store_address": "internal_keyvaluestore_x",
            "entries": [{
                "key": {"raw_hex": "0c", "programmatic_json": {"kind": "String", "value": "ab.xrd"}},
                "value": {"raw_hex": "80", "programmatic_json": {"kind": "Reference", "value": "account_x"}},
                "last_updated_at_state_version": 10,
                "is_locked": false
            }]
        });
        let server = MockServer::start(vec![("/state/key-value-store/data", vec![ok(&body)])]);
        let gw = test_gateway(&server.addr);

        let entries = gw
            .key_value_data("internal_keyvaluestore_x", &[value::string("ab.xrd")])
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(value::scalar(&entries[0].value), Some("account_x"));

        let reqs = server.captured_requests();
        let sent: Value = serde_json::from_slice(&reqs[0].body).unwrap();
        assert_eq!(sent["key_value_store_address"], "internal_keyvaluestore_x");
        assert_eq!(sent["keys"][0]["key_json"]["value"], "ab.xrd");
    }

    #[test]
    fn http_key_value_lookup_absent_key_is_none() {
        let body = serde_json::json!({"entries": []});
        let server = MockServer::start(vec![("/state/key-value-store/data", vec![ok(&body)])]);
        let gw = test_gateway(&server.addr);
        let found = gw
            .key_value_lookup("internal_keyvaluestore_x", &value::string("nope.xrd"))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn http_key_value_keys_follows_cursor() {
        let page1 = serde_json::json!({
            "items": [{"key": {"programmatic_json": {"kind": "String", "value": "a"}}}],
            "next_cursor": "c1"
        });
        let page2 = serde_json::json!({
            "items": [{"key": {"programmatic_json": {"kind": "String", "value": "b"}}}]
        });
        let server = MockServer::start(vec![(
            "/state/key-value-store/keys",
            vec![ok(&page1), ok(&page2)],
        )]);
        let gw = test_gateway(&server.addr);
        let keys = gw.key_value_keys("internal_keyvaluestore_x").unwrap();
        let names: Vec<_> = keys.iter().filter_map(value::scalar).collect();
        assert_eq!(names, vec!["a", "b"]);

        let reqs = server.captured_requests();
        let second: Value = serde_json::from_slice(&reqs[1].body).unwrap();
        assert_eq!(second["cursor"], "c1");
    }

    #[test]
    fn http_non_fungible_data_maps_items() {
        let body = serde_json::json!({
            "non_fungible_ids": [{
                "non_fungible_id": "[6465bd958aa122fa49eee0aa7676c4c4]",
                "is_burned": false,
                "data": {"raw_hex": "", "programmatic_json": {"kind": "Tuple", "fields": []}}
            }]
        });
        let server = MockServer::start(vec![("/state/non-fungible/data", vec![ok(&body)])]);
        let gw = test_gateway(&server.addr);
        let records = gw
            .non_fungible_data(
                "resource_x",
                &["[6465bd958aa122fa49eee0aa7676c4c4]".to_owned()],
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_burned);
        assert!(records[0].data.is_some());
    }

    #[test]
    fn http_component_state_extracts_state() {
        let body = serde_json::json!({
            "items": [{
                "address": "component_x",
                "details": {"type": "Component", "state": {"kind": "Tuple", "fields": []}}
            }]
        });
        let server = MockServer::start(vec![("/state/entity/details", vec![ok(&body)])]);
        let gw = test_gateway(&server.addr);
        let state = gw.component_state("component_x").unwrap();
        assert_eq!(value::kind(&state), Some("Tuple"));
        assert!(matches!(
            gw.component_state("component_other"),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[test]
    fn http_fungible_balances_parse_amounts() {
        let body = serde_json::json!({
            "items": [
                {"aggregation_level": "Global", "resource_address": "resource_a", "amount": "50"},
                {"aggregation_level": "Global", "resource_address": "resource_b", "amount": "200.5"}
            ]
        });
        let server = MockServer::start(vec![("/state/entity/page/fungibles/", vec![ok(&body)])]);
        let gw = test_gateway(&server.addr);
        let balances = gw.fungible_balances("account_x").unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[1].amount.to_string(), "200.5");
    }

    #[test]
    fn http_non_fungible_ids_filters_resource() {
        let body = serde_json::json!({
            "items": [
                {"resource_address": "resource_domain", "vaults": {"items": [{"items": ["[aa]", "[bb]"]}]}},
                {"resource_address": "resource_other", "vaults": {"items": [{"items": ["#1#"]}]}}
            ]
        });
        let server =
            MockServer::start(vec![("/state/entity/page/non-fungibles/", vec![ok(&body)])]);
        let gw = test_gateway(&server.addr);
        let ids = gw.non_fungible_ids("account_x", "resource_domain").unwrap();
        assert_eq!(ids, vec!["[aa]", "[bb]"]);
    }

    #[test]
    fn http_error_status_maps_to_error() {
        let server = MockServer::start(vec![(
            "/state/non-fungible/data",
            vec![(500, "{}".to_owned())],
        )]);
        let gw = test_gateway(&server.addr);
        let result = gw.non_fungible_data("resource_x", &[]);
        assert!(matches!(result, Err(GatewayError::Http(_))));
        let missing = gw.component_state("component_x");
        assert!(matches!(missing, Err(GatewayError::NotFound(_))));
    }

    #[test]
    fn http_connection_refused_returns_error() {
        let gw = test_gateway("http://127.0.0.1:1");
        assert!(gw.fungible_balances("account_x").is_err());
    }

    #[test]
    fn http_requests_include_app_name_header() {
        let body = serde_json::json!({"entries": []});
        let server = MockServer::start(vec![("/state/key-value-store/data", vec![ok(&body)])]);
        let gw = HttpGateway::new(GatewayConfig::new(&server.addr).with_app_name("rns-tests"));
        gw.key_value_data("internal_keyvaluestore_x", &[]).unwrap();

        let reqs = server.captured_requests();
        assert_eq!(reqs[0].path, "/state/key-value-store/data");
        assert_eq!(
            reqs[0].headers.get("rdx-app-name"),
            Some(&"rns-tests".to_owned())
        );
    }
}
