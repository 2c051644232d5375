//! The key/value record carried by a session.
//!
//! A [`Record`] is an insertion-ordered map of string keys to JSON values.
//! Its stored form is a single JSON object, e.g. `{"user":"alice","n":3}`,
//! which is the only thing written to the storage backend per session.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Result;

/// Ordered key/value data for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Map<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get the value under `key` decoded as `T`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Encode `value` and store it under `key`.
    pub fn set_serialized<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    /// Remove `key`. Absent keys are ignored.
    pub fn delete(&mut self, key: &str) {
        // shift_remove keeps the remaining keys in insertion order
        self.entries.shift_remove(key);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove every entry. Keeps the allocation for reuse.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Encode the record into its stored form.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    /// Replace the record's content with a decoded stored form.
    ///
    /// On failure the record is left untouched.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        let entries: Map<String, Value> = serde_json::from_slice(bytes)?;
        self.entries = entries;
        Ok(())
    }

    /// Decode a stored form into a new record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut record = Self::new();
        record.deserialize(bytes)?;
        Ok(record)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_set_then_get() {
        let mut record = Record::new();
        record.set("user", "alice");

        assert_eq!(record.get("user"), Some(&json!("alice")));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut record = Record::new();
        record.set("count", 1);
        record.set("other", true);
        record.set("count", 2);

        assert_eq!(record.get("count"), Some(&json!(2)));
        assert_eq!(record.len(), 2);
        // Overwrite keeps the original position
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["count", "other"]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut record = Record::new();
        record.set("a", 1);
        record.delete("missing");
        record.delete("a");
        record.delete("a");

        assert!(record.is_empty());
        assert_eq!(record.get("a"), None);
    }

    #[test]
    fn test_delete_preserves_order() {
        let mut record = Record::new();
        record.set("a", 1);
        record.set("b", 2);
        record.set("c", 3);
        record.delete("b");

        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_reset_is_repeatable() {
        let mut record = Record::new();
        record.set("a", 1);
        record.reset();
        record.reset();

        assert_eq!(record.len(), 0);
        assert!(!record.contains_key("a"));
    }

    #[test]
    fn test_round_trip_mixed_values() {
        let mut record = Record::new();
        record.set("user", "alice");
        record.set("visits", 42);
        record.set("admin", false);
        record.set("tags", json!(["a", "b"]));
        record.set("nested", json!({"theme": "dark", "size": 1.5}));
        record.set("nothing", Value::Null);

        let bytes = record.serialize().unwrap();
        let decoded = Record::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, record);
    }

    #[test]
    fn test_stored_form_is_json_object() {
        let mut record = Record::new();
        record.set("user", "alice");
        record.set("n", 3);

        let bytes = record.serialize().unwrap();
        assert_eq!(bytes, br#"{"user":"alice","n":3}"#);
    }

    #[test]
    fn test_deserialize_replaces_content() {
        let mut record = Record::new();
        record.set("stale", 1);
        record.deserialize(br#"{"fresh":2}"#).unwrap();

        assert!(!record.contains_key("stale"));
        assert_eq!(record.get("fresh"), Some(&json!(2)));
    }

    #[test]
    fn test_deserialize_rejects_non_object() {
        let mut record = Record::new();
        record.set("kept", 1);

        let result = record.deserialize(b"[1,2,3]");
        assert!(matches!(result, Err(crate::Error::Serialization(_))));
        assert_eq!(record.get("kept"), Some(&json!(1)));

        assert!(Record::from_bytes(b"not json").is_err());
    }

    #[test]
    fn test_typed_access() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Cart {
            items: Vec<String>,
            total_cents: u64,
        }

        let cart = Cart {
            items: vec!["book".into(), "pen".into()],
            total_cents: 1299,
        };

        let mut record = Record::new();
        record.set_serialized("cart", &cart).unwrap();

        let loaded: Option<Cart> = record.get_as("cart").unwrap();
        assert_eq!(loaded, Some(cart));

        let missing: Option<Cart> = record.get_as("missing").unwrap();
        assert_eq!(missing, None);

        let wrong: Result<Option<u64>> = record.get_as("cart");
        assert!(wrong.is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    enum Op {
        Set(String, Value),
        Delete(String),
        Reset,
    }

    /// Small key space so operations collide on the same keys.
    fn key_strategy() -> impl Strategy<Value = String> {
        "[a-e]"
    }

    /// JSON values without floats, which do not compare reliably.
    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            ".{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (key_strategy(), value_strategy()).prop_map(|(k, v)| Op::Set(k, v)),
            2 => key_strategy().prop_map(Op::Delete),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        /// Property: a value read back is the one last set, until that key
        /// is deleted or the record is reset.
        #[test]
        fn record_matches_map_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut record = Record::new();
            let mut model: HashMap<String, Value> = HashMap::new();

            for op in ops {
                match op {
                    Op::Set(k, v) => {
                        record.set(k.clone(), v.clone());
                        model.insert(k, v);
                    }
                    Op::Delete(k) => {
                        record.delete(&k);
                        model.remove(&k);
                    }
                    Op::Reset => {
                        record.reset();
                        model.clear();
                    }
                }

                prop_assert_eq!(record.len(), model.len());
                for key in ["a", "b", "c", "d", "e"] {
                    prop_assert_eq!(record.get(key), model.get(key));
                }
            }
        }

        /// Property: decoding the stored form of a non-empty record yields
        /// identical key/value pairs.
        #[test]
        fn stored_form_round_trips(
            entries in prop::collection::btree_map(".{1,16}", value_strategy(), 1..12)
        ) {
            let mut record = Record::new();
            for (k, v) in &entries {
                record.set(k.clone(), v.clone());
            }

            let bytes = record.serialize().unwrap();
            let decoded = Record::from_bytes(&bytes).unwrap();

            prop_assert_eq!(decoded.len(), entries.len());
            for (k, v) in &entries {
                prop_assert_eq!(decoded.get(k), Some(v));
            }
        }
    }
}
