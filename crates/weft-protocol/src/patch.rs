//! Patches describing the net effect of applied changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One key-level delta in a patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
#[serde(rename_all = "camelCase")]
pub enum PatchOp {
    /// `key` now holds `value`.
    Assign { key: String, value: Value },
    /// `key` is no longer present.
    Remove { key: String },
}

impl PatchOp {
    #[inline]
    #[must_use]
    pub fn assign(key: impl Into<String>, value: impl Into<Value>) -> Self {
        PatchOp::Assign {
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn remove(key: impl Into<String>) -> Self {
        PatchOp::Remove { key: key.into() }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            PatchOp::Assign { key, .. } | PatchOp::Remove { key } => key,
        }
    }
}

/// Net effect of newly applied changes on the materialized document.
///
/// Patches are produced by applying changes (or in full by a state query)
/// and consumed by incremental observers; they are never stored. Deltas are
/// ordered by key, one per touched key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

impl Patch {
    #[inline]
    #[must_use]
    pub fn new(ops: Vec<PatchOp>) -> Self {
        Patch { ops }
    }

    /// A patch with no observable effect.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Patch { ops: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatchOp> {
        self.ops.iter()
    }
}
