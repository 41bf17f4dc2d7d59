// Typed access to the loosely typed argument map of a tool call

use crate::error::{ToolError, ToolResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct Args {
    map: Map<String, Value>,
}

impl Args {
    /// `null` counts as no arguments; anything but an object is rejected.
    pub fn from_value(value: Value) -> ToolResult<Self> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            Value::Null => Ok(Self::default()),
            other => Err(ToolError::invalid(format!(
                "arguments must be an object, got {}",
                other
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.map.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Trimmed, non-empty string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn required_str(&self, key: &str) -> ToolResult<&str> {
        self.str(key).ok_or_else(|| ToolError::missing(key))
    }

    /// Raw string, possibly empty. Distinguishes "given as empty" from "absent".
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Accepts JSON booleans and the strings "true"/"false".
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        self.bool(key).unwrap_or(false)
    }

    /// Accepts numbers and numeric strings.
    pub fn usize(&self, key: &str) -> ToolResult<Option<usize>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| ToolError::invalid(format!("'{}' must be a non-negative integer", key)))
    }

    pub fn parse<T>(&self, key: &str) -> ToolResult<Option<T>>
    where
        T: FromStr<Err = String>,
    {
        self.str(key)
            .map(|s| s.parse::<T>().map_err(ToolError::InvalidArgument))
            .transpose()
    }

    /// Array of strings, or a comma separated string.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => gorev_core::service::split_tags(s),
            _ => Vec::new(),
        }
    }

    /// Object of scalars flattened to strings, e.g. template field values.
    pub fn string_map(&self, key: &str) -> ToolResult<BTreeMap<String, String>> {
        match self.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => Ok(map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        Value::Array(items) => items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                            .collect::<Vec<_>>()
                            .join(","),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect()),
            Some(_) => Err(ToolError::invalid(format!("'{}' must be an object", key))),
        }
    }

    /// Deserialize one nested argument.
    pub fn object<T: DeserializeOwned>(&self, key: &str) -> ToolResult<Option<T>> {
        self.get(key)
            .cloned()
            .map(|v| {
                serde_json::from_value(v)
                    .map_err(|e| ToolError::invalid(format!("invalid '{}': {}", key, e)))
            })
            .transpose()
    }

    /// Deserialize the whole argument map.
    pub fn deserialize<T: DeserializeOwned>(&self) -> ToolResult<T> {
        serde_json::from_value(self.to_value())
            .map_err(|e| ToolError::invalid(format!("invalid arguments: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorev_core::TaskStatus;
    use serde_json::json;

    fn args(value: Value) -> Args {
        Args::from_value(value).unwrap()
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(Args::from_value(json!([1, 2])).is_err());
        assert!(Args::from_value(Value::Null).unwrap().get("x").is_none());
    }

    #[test]
    fn test_strings_and_required() {
        let a = args(json!({"id": "  abc ", "empty": "", "n": 3}));
        assert_eq!(a.str("id"), Some("abc"));
        assert_eq!(a.str("empty"), None);
        assert_eq!(a.raw_str("empty"), Some(""));
        assert!(matches!(a.required_str("missing"), Err(ToolError::InvalidArgument(_))));
    }

    #[test]
    fn test_numbers_and_bools() {
        let a = args(json!({"limit": "10", "offset": 5, "bad": -1, "onay": "true", "dry": false}));
        assert_eq!(a.usize("limit").unwrap(), Some(10));
        assert_eq!(a.usize("offset").unwrap(), Some(5));
        assert!(a.usize("bad").is_err());
        assert!(a.flag("onay"));
        assert_eq!(a.bool("dry"), Some(false));
        assert!(!a.flag("absent"));
    }

    #[test]
    fn test_lists_maps_and_parse() {
        let a = args(json!({
            "ids": ["a", " b ", ""],
            "tags": "x, y",
            "degerler": {"title": "T", "count": 2, "skip": null},
            "durum": "tamamlandi"
        }));
        assert_eq!(a.string_list("ids"), vec!["a", "b"]);
        assert_eq!(a.string_list("tags"), vec!["x", "y"]);

        let values = a.string_map("degerler").unwrap();
        assert_eq!(values["title"], "T");
        assert_eq!(values["count"], "2");
        assert!(!values.contains_key("skip"));

        assert_eq!(a.parse::<TaskStatus>("durum").unwrap(), Some(TaskStatus::Completed));
        assert!(args(json!({"durum": "done"})).parse::<TaskStatus>("durum").is_err());
    }
}
