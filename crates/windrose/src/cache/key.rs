//! Deterministic cache fingerprints.
//!
//! Two semantically-equal parameter sets must always produce the same
//! fingerprint regardless of map insertion order, and identical parameters
//! under different analysis namespaces must never collide. Parameters are
//! canonicalized (object keys sorted lexicographically, recursively), the
//! canonical JSON text is hashed with SHA-256 together with the namespace,
//! and the namespace is kept as a readable prefix on the hex digest.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::AnalysisError;

/// Build the cache fingerprint for a parameter set.
///
/// The only failure mode is parameters that cannot be represented as JSON
/// (e.g. a map with non-string keys), surfaced as
/// [`AnalysisError::InvalidParameters`].
pub fn cache_key<P: Serialize>(namespace: &str, params: &P) -> Result<String, AnalysisError> {
    let value = serde_json::to_value(params)
        .map_err(|e| AnalysisError::InvalidParameters(e.to_string()))?;
    Ok(fingerprint(namespace, &value))
}

/// Fingerprint an already-JSON parameter value. Infallible.
pub fn fingerprint(namespace: &str, params: &Value) -> String {
    let canonical = canonicalize(params).to_string();
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical.as_bytes());
    format!("{namespace}:{}", hex::encode(hasher.finalize()))
}

/// Rebuild a value with all object keys in sorted order, recursively.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn key_is_deterministic() {
        let params = json!({"reg_model": "lin", "num_sim": 60});
        let k1 = cache_key("aep", &params).unwrap();
        let k2 = cache_key("aep", &params).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn key_ignores_insertion_order() {
        let mut a = Map::new();
        a.insert("zeta".into(), json!(1));
        a.insert("alpha".into(), json!({"nested_b": 2, "nested_a": 3}));

        let mut b = Map::new();
        b.insert("alpha".into(), json!({"nested_a": 3, "nested_b": 2}));
        b.insert("zeta".into(), json!(1));

        let k1 = cache_key("aep", &Value::Object(a)).unwrap();
        let k2 = cache_key("aep", &Value::Object(b)).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn namespaces_never_collide() {
        let params = json!({"uncertainty": true});
        let k1 = cache_key("electrical_losses", &params).unwrap();
        let k2 = cache_key("wake_losses", &params).unwrap();
        assert_ne!(k1, k2);
        assert!(k1.starts_with("electrical_losses:"));
        assert!(k2.starts_with("wake_losses:"));
    }

    #[test]
    fn different_params_differ() {
        let k1 = cache_key("aep", &json!({"num_sim": 60})).unwrap();
        let k2 = cache_key("aep", &json!({"num_sim": 100})).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn arrays_are_order_sensitive() {
        // Array order is meaningful (e.g. reanalysis product priority).
        let k1 = cache_key("aep", &json!({"products": ["era5", "merra2"]})).unwrap();
        let k2 = cache_key("aep", &json!({"products": ["merra2", "era5"]})).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn non_json_params_are_invalid() {
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], "value");
        let err = cache_key("aep", &bad).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameters(_)));
    }
}
