use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length-indexed table of bond quanta, keyed by the label length as a string.
///
/// A snapshot read once from the ledger (or the configuration file) and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceLadder(BTreeMap<String, Decimal>);

impl PriceLadder {
    pub fn new(entries: BTreeMap<String, Decimal>) -> Self {
        Self(entries)
    }

    pub fn get(&self, label_len: usize) -> Option<Decimal> {
        self.0.get(&label_len.to_string()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Decimal)> for PriceLadder {
    fn from_iter<T: IntoIterator<Item = (String, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn looks_up_by_string_key() {
        let ladder: PriceLadder = [
            ("2".to_owned(), Decimal::from(120)),
            ("3".to_owned(), Decimal::from_str("60.5").unwrap()),
        ]
        .into_iter()
        .collect();
        assert_eq!(ladder.get(2), Some(Decimal::from(120)));
        assert_eq!(ladder.get(3).unwrap().to_string(), "60.5");
        assert_eq!(ladder.get(9), None);
        assert_eq!(ladder.len(), 2);
    }
}
