//! Operations carried inside a change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single edit against the flat key/value document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Write `value` at `key`, replacing any previous value.
    Set { key: String, value: Value },
    /// Remove `key` from the document.
    Delete { key: String },
}

impl Operation {
    #[inline]
    #[must_use]
    pub fn set(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Operation::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn delete(key: impl Into<String>) -> Self {
        Operation::Delete { key: key.into() }
    }

    /// The document key this operation touches.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Operation::Set { key, .. } | Operation::Delete { key } => key,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_op() {
        let op = Operation::set("title", json!("hello"));
        assert_eq!(op.key(), "title");
        assert!(!op.is_delete());
    }

    #[test]
    fn test_delete_op() {
        let op = Operation::delete("title");
        assert_eq!(op.key(), "title");
        assert!(op.is_delete());
    }

    #[test]
    fn test_serde_tagged() {
        let op = Operation::set("n", json!(1));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json, json!({"action": "set", "key": "n", "value": 1}));

        let op = Operation::delete("n");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json, json!({"action": "delete", "key": "n"}));
    }

    #[test]
    fn test_serde_round_trip() {
        let ops = vec![
            Operation::set("a", json!({"nested": [1, 2]})),
            Operation::delete("b"),
        ];
        let encoded = serde_json::to_string(&ops).unwrap();
        let back: Vec<Operation> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, ops);
    }
}
