//! Immutable, content-addressed change records.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::actor::ActorId;
use crate::hash::ChangeHash;
use crate::operation::Operation;

/// One committed edit in a document's history.
///
/// Changes are immutable once created and identified by the SHA-256 hash of
/// their content. `deps` point at the changes that formed the document
/// frontier when this change was made; together these edges form the history
/// DAG. `seq` is 1-based and contiguous per actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Author of the change.
    pub actor: ActorId,
    /// Position in the author's own history, starting at 1.
    pub seq: u64,
    /// Hashes of the causal predecessors, sorted.
    pub deps: Vec<ChangeHash>,
    /// Wall-clock creation time, unix seconds.
    pub time: i64,
    /// Optional human-readable description.
    pub message: Option<String>,
    /// The edits this change carries, in order.
    pub ops: Vec<Operation>,
    /// Content hash over all fields above.
    pub hash: ChangeHash,
}

impl Change {
    /// Build a change, canonicalizing `deps` (sorted, deduplicated) and
    /// computing the content hash.
    #[must_use]
    pub fn new(
        actor: ActorId,
        seq: u64,
        mut deps: Vec<ChangeHash>,
        time: i64,
        message: Option<String>,
        ops: Vec<Operation>,
    ) -> Self {
        deps.sort_unstable();
        deps.dedup();
        let hash = content_hash(&actor, seq, &deps, time, message.as_deref(), &ops);
        Change {
            actor,
            seq,
            deps,
            time,
            message,
            ops,
            hash,
        }
    }

    /// Recompute the content hash and compare it with the stored one.
    ///
    /// Changes that arrive over the wire carry their hash as plain data; a
    /// mismatch means the record was corrupted or tampered with.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.hash
            == content_hash(
                &self.actor,
                self.seq,
                &self.deps,
                self.time,
                self.message.as_deref(),
                &self.ops,
            )
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} {}", self.actor, self.seq, self.hash)
    }
}

/// Hash of the canonical JSON encoding of everything but the hash itself.
/// JSON object keys serialize sorted, so the encoding is stable.
fn content_hash(
    actor: &ActorId,
    seq: u64,
    deps: &[ChangeHash],
    time: i64,
    message: Option<&str>,
    ops: &[Operation],
) -> ChangeHash {
    let canonical = json!({
        "actor": actor,
        "seq": seq,
        "deps": deps,
        "time": time,
        "message": message,
        "ops": ops,
    });
    ChangeHash::digest(canonical.to_string().as_bytes())
}
