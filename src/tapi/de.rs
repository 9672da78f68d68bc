//! Deserialization helpers for the exchange's loosely typed JSON.

use std::collections::HashMap;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// `0`/`1` (or a real bool) as `bool`.
pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(d)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// A number that may arrive quoted.
pub fn num_or_str<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        Float(f64),
        Text(String),
    }
    match Num::deserialize(d)? {
        Num::Float(f) => Ok(f),
        Num::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Records that arrive as values of an object keyed by their numeric id.
pub trait Keyed {
    fn set_id(&mut self, id: u64);
    fn id(&self) -> u64;
}

/// Decode `{"<id>": {...}, ...}` into records with their id filled in.
/// An empty JSON array stands for an empty object.
pub fn keyed<T: DeserializeOwned + Keyed>(value: Value) -> Result<Vec<T>, serde_json::Error> {
    if matches!(&value, Value::Array(a) if a.is_empty()) || value.is_null() {
        return Ok(Vec::new());
    }
    let raw: HashMap<String, T> = serde_json::from_value(value)?;
    raw.into_iter()
        .map(|(k, mut rec)| {
            let id = k.parse::<u64>().map_err(|_| {
                <serde_json::Error as de::Error>::custom(format!("non-numeric record id {:?}", k))
            })?;
            rec.set_id(id);
            Ok(rec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, Debug)]
    struct Sample {
        #[serde(skip_deserializing)]
        id: u64,
        #[serde(deserialize_with = "flag")]
        on: bool,
        #[serde(deserialize_with = "num_or_str")]
        amount: f64,
    }

    impl Keyed for Sample {
        fn set_id(&mut self, id: u64) {
            self.id = id;
        }
        fn id(&self) -> u64 {
            self.id
        }
    }

    #[test]
    fn test_flag_and_quoted_number() {
        let p: Sample = serde_json::from_value(json!({"on": 1, "amount": "1.5"})).unwrap();
        assert!(p.on);
        assert_eq!(p.amount, 1.5);
        let p: Sample = serde_json::from_value(json!({"on": false, "amount": 2})).unwrap();
        assert!(!p.on);
        assert_eq!(p.amount, 2.0);
    }

    #[test]
    fn test_keyed_fills_ids() {
        let mut v: Vec<Sample> = keyed(json!({
            "7": {"on": 0, "amount": 1},
            "3": {"on": 1, "amount": 2}
        }))
        .unwrap();
        v.sort_by_key(|p| p.id());
        assert_eq!(v.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn test_keyed_empty_array() {
        let v: Vec<Sample> = keyed(json!([])).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn test_keyed_rejects_bad_id() {
        let r: Result<Vec<Sample>, _> = keyed(json!({"abc": {"on": 0, "amount": 1}}));
        assert!(r.is_err());
    }
}
