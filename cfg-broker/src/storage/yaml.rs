use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use super::{Storage, strip_prefix};
use crate::error::{CfgError, Result};
use crate::value::Value;

/// Backend loaded from a YAML document.
///
/// Nested mappings flatten to dotted keys, so
///
/// ```yaml
/// top:
///   producer:
///     rate: 10
/// ```
///
/// is served as `top.producer.rate`. Hex scalars (`0x1f`) convert to
/// decimal integers. The store is writable after load; `reset` restores
/// the loaded document.
#[derive(Debug)]
pub struct YamlStorage {
    entries: BTreeMap<String, String>,
    pristine: BTreeMap<String, String>,
}

impl YamlStorage {
    pub fn from_file(path: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| CfgError::Parse {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_str(&raw, prefix).map_err(|e| match e {
            CfgError::Parse { reason, .. } => CfgError::Parse {
                name: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a YAML document. Only keys under `prefix` are kept, with the
    /// prefix stripped; an empty prefix keeps everything.
    pub fn from_str(raw: &str, prefix: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| CfgError::Parse {
            name: "<yaml>".to_string(),
            reason: e.to_string(),
        })?;

        let mut flat = BTreeMap::new();
        flatten("", &doc, &mut flat);

        let entries: BTreeMap<String, String> = flat
            .into_iter()
            .filter_map(|(key, value)| {
                strip_prefix(prefix, &key).map(|logical| (logical.to_string(), value))
            })
            .collect();
        debug!("[STORAGE] Loaded {} preset entries from YAML", entries.len());

        Ok(Self {
            pristine: entries.clone(),
            entries,
        })
    }
}

fn flatten(scope: &str, node: &serde_yaml::Value, out: &mut BTreeMap<String, String>) {
    match node {
        serde_yaml::Value::Mapping(map) => {
            for (key, child) in map {
                let Some(key) = key.as_str() else { continue };
                let path = if scope.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", scope, key)
                };
                flatten(&path, child, out);
            }
        }
        leaf => {
            if !scope.is_empty() {
                out.insert(scope.to_string(), convert(leaf).to_json());
            }
        }
    }
}

/// Convert a YAML leaf to a structured value, folding hex scalars.
fn convert(node: &serde_yaml::Value) -> Value {
    match node {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Real(n.as_f64().unwrap_or_default())
            }
        }
        serde_yaml::Value::String(s) => match parse_hex(s) {
            Some(i) => Value::Int(i),
            None => Value::Str(s.clone()),
        },
        serde_yaml::Value::Sequence(items) => Value::List(items.iter().map(convert).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut out = IndexMap::new();
            for (key, child) in map {
                if let Some(key) = key.as_str() {
                    out.insert(key.to_string(), convert(child));
                }
            }
            Value::Map(out)
        }
        serde_yaml::Value::Tagged(tagged) => convert(&tagged.value),
    }
}

fn parse_hex(s: &str) -> Option<i64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    i64::from_str_radix(digits, 16).ok()
}

impl Storage for YamlStorage {
    fn set_value(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn get_values(&self, prefix: &str) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn delete_value(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn reset(&mut self) -> bool {
        self.entries = self.pristine.clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
top:
  producer:
    rate: 10
    burst: 0x1f
    label: steady
  enabled: true
  gain: 2.5
other:
  flag: false
"#;

    #[test]
    fn test_flattens_nested_mappings() {
        let store = YamlStorage::from_str(DOC, "").unwrap();
        assert_eq!(store.get_value("top.producer.rate"), Some("10".to_string()));
        assert_eq!(store.get_value("top.enabled"), Some("true".to_string()));
        assert_eq!(store.get_value("top.gain"), Some("2.5".to_string()));
        assert_eq!(
            store.get_value("top.producer.label"),
            Some("\"steady\"".to_string())
        );
    }

    #[test]
    fn test_hex_scalars_become_integers() {
        let store = YamlStorage::from_str(DOC, "").unwrap();
        assert_eq!(store.get_value("top.producer.burst"), Some("31".to_string()));
    }

    #[test]
    fn test_prefix_filter() {
        let store = YamlStorage::from_str(DOC, "top").unwrap();
        assert_eq!(store.get_value("producer.rate"), Some("10".to_string()));
        assert!(!store.has_value("other.flag"));
        assert!(!store.has_value("top.producer.rate"));
    }

    #[test]
    fn test_reset_restores_loaded_document() {
        let mut store = YamlStorage::from_str(DOC, "").unwrap();
        store.set_value("top.producer.rate", "99");
        store.delete_value("top.enabled");
        assert!(store.reset());
        assert_eq!(store.get_value("top.producer.rate"), Some("10".to_string()));
        assert!(store.has_value("top.enabled"));
    }

    #[test]
    fn test_malformed_document_is_a_parse_error() {
        let err = YamlStorage::from_str("top: [unclosed", "").unwrap_err();
        assert!(matches!(err, CfgError::Parse { .. }));
    }
}
