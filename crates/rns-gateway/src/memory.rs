use crate::{Gateway, GatewayError, KvEntry, NonFungibleRecord, ResourceBalance};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory gateway holding a hand-built ledger state.
///
/// Used by tests and for offline manifest previews. Any address registered
/// with [`MemoryGateway::fail_on`] makes every call touching it fail, which is
/// how transient lookup failures are simulated.
#[derive(Default)]
pub struct MemoryGateway {
    // store -> (canonical key json -> entry)
    kv: HashMap<String, BTreeMap<String, KvEntry>>,
    non_fungibles: HashMap<(String, String), Value>,
    states: HashMap<String, Value>,
    balances: HashMap<String, Vec<ResourceBalance>>,
    holdings: HashMap<(String, String), Vec<String>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_kv(&mut self, store: &str, key: Value, value: Value) {
        self.kv
            .entry(store.to_owned())
            .or_default()
            .insert(key.to_string(), KvEntry { key, value });
    }

    pub fn insert_non_fungible(&mut self, resource: &str, id: &str, data: Value) {
        self.non_fungibles
            .insert((resource.to_owned(), id.to_owned()), data);
    }

    pub fn set_component_state(&mut self, component: &str, state: Value) {
        self.states.insert(component.to_owned(), state);
    }

    pub fn set_balances(&mut self, account: &str, balances: Vec<ResourceBalance>) {
        self.balances.insert(account.to_owned(), balances);
    }

    pub fn set_holdings(&mut self, account: &str, resource: &str, ids: Vec<String>) {
        self.holdings
            .insert((account.to_owned(), resource.to_owned()), ids);
    }

    /// Make every call that touches `address` fail with an HTTP error.
    pub fn fail_on(&mut self, address: &str) {
        self.failing.insert(address.to_owned());
    }

    /// Number of gateway calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, address: &str) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(address) {
            return Err(GatewayError::Http(format!(
                "simulated failure for {address}"
            )));
        }
        Ok(())
    }
}

impl Gateway for MemoryGateway {
    fn key_value_data(&self, store: &str, keys: &[Value]) -> Result<Vec<KvEntry>, GatewayError> {
        self.enter(store)?;
        let Some(entries) = self.kv.get(store) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(&k.to_string()).cloned())
            .collect())
    }

    fn key_value_keys(&self, store: &str) -> Result<Vec<Value>, GatewayError> {
        self.enter(store)?;
        Ok(self
            .kv
            .get(store)
            .map(|entries| entries.values().map(|e| e.key.clone()).collect())
            .unwrap_or_default())
    }

    fn non_fungible_data(
        &self,
        resource: &str,
        ids: &[String],
    ) -> Result<Vec<NonFungibleRecord>, GatewayError> {
        self.enter(resource)?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.non_fungibles
                    .get(&(resource.to_owned(), id.clone()))
                    .map(|data| NonFungibleRecord {
                        id: id.clone(),
                        is_burned: false,
                        data: Some(data.clone()),
                    })
            })
            .collect())
    }

    fn component_state(&self, component: &str) -> Result<Value, GatewayError> {
        self.enter(component)?;
        self.states
            .get(component)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(component.to_owned()))
    }

    fn fungible_balances(&self, account: &str) -> Result<Vec<ResourceBalance>, GatewayError> {
        self.enter(account)?;
        Ok(self.balances.get(account).cloned().unwrap_or_default())
    }

    fn non_fungible_ids(&self, account: &str, resource: &str) -> Result<Vec<String>, GatewayError> {
        self.enter(account)?;
        Ok(self
            .holdings
            .get(&(account.to_owned(), resource.to_owned()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use rust_decimal::Decimal;

    #[test]
    fn kv_lookup_hits_and_misses() {
        let mut gw = MemoryGateway::new();
        gw.insert_kv(
            "store",
            value::string("ab.xrd"),
            value::reference("account_a"),
        );
        let hit = gw
            .key_value_lookup("store", &value::string("ab.xrd"))
            .unwrap();
        assert!(hit.is_some());
        let miss = gw
            .key_value_lookup("store", &value::string("cd.xrd"))
            .unwrap();
        assert!(miss.is_none());
        assert_eq!(gw.key_value_keys("store").unwrap().len(), 1);
        assert_eq!(gw.call_count(), 3);
    }

    #[test]
    fn failing_address_errors() {
        let mut gw = MemoryGateway::new();
        gw.fail_on("store");
        assert!(gw.key_value_keys("store").is_err());
        assert!(gw.key_value_keys("other").is_ok());
    }

    #[test]
    fn non_fungibles_and_balances() {
        let mut gw = MemoryGateway::new();
        gw.insert_non_fungible("res", "#1#", value::tuple(vec![]));
        let found = gw
            .non_fungible_data("res", &["#1#".to_owned(), "#2#".to_owned()])
            .unwrap();
        assert_eq!(found.len(), 1);

        gw.set_balances(
            "acct",
            vec![ResourceBalance {
                resource: "res".into(),
                amount: Decimal::from(5),
            }],
        );
        assert_eq!(gw.fungible_balances("acct").unwrap().len(), 1);
        assert!(gw.fungible_balances("nobody").unwrap().is_empty());
        assert!(gw.component_state("missing").is_err());
    }
}
