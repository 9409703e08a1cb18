//! Stable cache keys
//!
//! Keys look like `"{namespace}:{sha256 hex}"`. The digest is taken over a
//! canonical JSON rendering of the parameters with object keys sorted at
//! every level, so parameter sets that differ only in insertion order map
//! to the same key. The namespace stays in clear text so that
//! `invalidate("geocode:")` drops a whole family of entries.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::CacheError;

/// Build a cache key from a namespace and any serializable parameter set
pub fn cache_key<P: Serialize + ?Sized>(namespace: &str, params: &P) -> Result<String, CacheError> {
    let value = serde_json::to_value(params)?;
    Ok(cache_key_for_value(namespace, &value))
}

/// Build a cache key from an already materialized JSON value
pub fn cache_key_for_value(namespace: &str, params: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(params, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{}:{:x}", namespace, hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        // Null, Bool and Number render identically regardless of map ordering
        other => out.push_str(&other.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_key_ignores_insertion_order() {
        let a = cache_key_for_value("geocode", &json!({"a": 1, "b": 2}));
        let b = cache_key_for_value("geocode", &json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_nested_order() {
        let a = cache_key_for_value(
            "places",
            &json!({"query": "museum", "location": {"lat": 48.8, "lng": 2.3}}),
        );
        let b = cache_key_for_value(
            "places",
            &json!({"location": {"lng": 2.3, "lat": 48.8}, "query": "museum"}),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_values_and_namespaces() {
        let base = cache_key_for_value("geocode", &json!({"address": "Paris"}));
        assert_ne!(base, cache_key_for_value("geocode", &json!({"address": "Lyon"})));
        assert_ne!(base, cache_key_for_value("places", &json!({"address": "Paris"})));
        // Array order is meaningful
        assert_ne!(
            cache_key_for_value("x", &json!([1, 2])),
            cache_key_for_value("x", &json!([2, 1]))
        );
    }

    #[test]
    fn test_key_keeps_namespace_readable() {
        let key = cache_key_for_value("locations:paris", &json!({"day": 1}));
        assert!(key.starts_with("locations:paris:"));
        assert_eq!(key.len(), "locations:paris:".len() + 64);
    }

    #[test]
    fn test_serializable_params() {
        #[derive(Serialize)]
        struct Params<'a> {
            address: &'a str,
            region: &'a str,
        }

        let mut map = BTreeMap::new();
        map.insert("region", "fr");
        map.insert("address", "Paris, France");

        let from_struct = cache_key(
            "geocode",
            &Params {
                address: "Paris, France",
                region: "fr",
            },
        )
        .unwrap();
        let from_map = cache_key("geocode", &map).unwrap();
        assert_eq!(from_struct, from_map);
    }
}
