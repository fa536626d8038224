use std::fmt::Display;

/// How a [`Params`] set is laid out when rendered to its canonical query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamOrder {
    /// Keep the order in which parameters were inserted.
    #[default]
    AsSupplied,
    /// Sort lexicographically by key.
    Sorted,
}

/// Ordered request parameter set with unique keys.
///
/// Values are stored already rendered; anything `Display` (strings, integers, booleans,
/// wire enums) can be inserted. Optional fields go through the `push_*` helpers, each of
/// which documents the value it treats as "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a parameter; an existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: &str, value: impl Display) {
        let value = value.to_string();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    /// Insert only when the key is not present yet.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Display) {
        if !self.contains(key) {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    /// `None` is omitted.
    pub fn push_opt<V: Display>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Empty strings are omitted.
    pub fn push_nonempty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    /// Zero and negative values are omitted.
    pub fn push_positive(&mut self, key: &str, value: i64) {
        if value > 0 {
            self.insert(key, value);
        }
    }

    /// `false` is omitted.
    pub fn push_true(&mut self, key: &str, value: bool) {
        if value {
            self.insert(key, true);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render `k1=v1&k2=v2`, percent-encoding keys and values.
    ///
    /// An empty set renders to an empty string.
    pub fn encode(&self, order: ParamOrder) -> String {
        let mut pairs: Vec<&(String, String)> = self.entries.iter().collect();
        if order == ParamOrder::Sorted {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
        }

        pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: AsRef<str>, V: Display> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k.as_ref(), v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_encodes_to_empty_string() {
        assert_eq!(Params::new().encode(ParamOrder::AsSupplied), "");
        assert_eq!(Params::new().encode(ParamOrder::Sorted), "");
    }

    #[test]
    fn preserves_insertion_order() {
        let params = Params::new()
            .with("symbol", "BTCUSDT")
            .with("side", "BUY")
            .with("quantity", 1);
        assert_eq!(
            params.encode(ParamOrder::AsSupplied),
            "symbol=BTCUSDT&side=BUY&quantity=1"
        );
    }

    #[test]
    fn sorted_mode_ignores_insertion_order() {
        let a = Params::new().with("b", 2).with("a", 1).with("c", 3);
        let b = Params::new().with("c", 3).with("a", 1).with("b", 2);
        assert_eq!(a.encode(ParamOrder::Sorted), "a=1&b=2&c=3");
        assert_eq!(a.encode(ParamOrder::Sorted), b.encode(ParamOrder::Sorted));
    }

    #[test]
    fn encoding_is_deterministic() {
        let params = Params::new().with("x", "1").with("y", "two words");
        assert_eq!(
            params.encode(ParamOrder::AsSupplied),
            params.encode(ParamOrder::AsSupplied)
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let params = Params::new()
            .with("batchOrders", r#"[{"symbol":"BTCUSDT"}]"#)
            .with("note", "a b&c=d");
        assert_eq!(
            params.encode(ParamOrder::AsSupplied),
            "batchOrders=%5B%7B%22symbol%22%3A%22BTCUSDT%22%7D%5D&note=a%20b%26c%3Dd"
        );
    }

    #[test]
    fn duplicate_key_replaces_in_place() {
        let mut params = Params::new().with("a", 1).with("b", 2);
        params.insert("a", 9);
        assert_eq!(params.len(), 2);
        assert_eq!(params.encode(ParamOrder::AsSupplied), "a=9&b=2");
    }

    #[test]
    fn insert_if_absent_keeps_caller_value() {
        let mut params = Params::new().with("recvWindow", 10_000);
        params.insert_if_absent("recvWindow", 5_000);
        assert_eq!(params.get("recvWindow"), Some("10000"));
    }

    #[test]
    fn omission_rules() {
        let mut params = Params::new();
        params.push_opt::<u32>("limit", None);
        params.push_nonempty("symbol", "");
        params.push_positive("startTime", 0);
        params.push_positive("endTime", -5);
        params.push_true("reduceOnly", false);
        assert!(params.is_empty());

        params.push_opt("limit", Some(100));
        params.push_nonempty("symbol", "ETHUSDT");
        params.push_positive("startTime", 1_700_000_000_000);
        params.push_true("reduceOnly", true);
        assert_eq!(
            params.encode(ParamOrder::AsSupplied),
            "limit=100&symbol=ETHUSDT&startTime=1700000000000&reduceOnly=true"
        );
    }

    #[test]
    fn collects_from_pairs() {
        let params: Params = [("symbol", "BTCUSDT"), ("limit", "5")].into_iter().collect();
        assert_eq!(params.get("limit"), Some("5"));
    }
}
