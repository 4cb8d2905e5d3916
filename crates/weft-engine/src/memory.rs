//! In-memory reference engine over a flat key/value document.
//!
//! `MemoryEngine` keeps the full change DAG, a buffer for changes whose
//! dependencies have not arrived, and one last-writer-wins register per
//! document key. Concurrent writes are resolved by comparing
//! `(depth, change hash, op index)`, where depth is the change's Lamport
//! depth in the DAG; the comparison is identical on every replica, so
//! replicas that have seen the same changes materialize the same value
//! regardless of delivery order.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use weft_protocol::{ActorId, Change, ChangeHash, ChangeRequest, Clock, Operation, Patch, PatchOp};

use crate::error::{EngineError, Result};
use crate::traits::DocumentEngine;

/// Version tag for the snapshot encoding.
const SNAPSHOT_FORMAT: u32 = 1;

/// Serialized engine state: applied history in causal order, plus whatever
/// was still waiting on missing dependencies at save time.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    changes: Vec<Change>,
    pending: Vec<Change>,
}

/// Last-writer-wins register for one document key.
///
/// `value` is `None` once a delete has won the register; the stamp is kept
/// so a concurrent-but-losing write cannot resurrect the key.
#[derive(Clone, Debug)]
struct Register {
    value: Option<Value>,
    depth: u64,
    source: ChangeHash,
    op_index: usize,
}

/// The in-memory document engine.
#[derive(Clone, Debug)]
pub struct MemoryEngine {
    /// Applied changes by hash.
    changes: HashMap<ChangeHash, Change>,
    /// Lamport depth of each applied change: 1 + max depth of its deps.
    depths: HashMap<ChangeHash, u64>,
    /// Highest applied sequence number per actor. Contiguous by
    /// construction: a change only applies when it is the actor's next.
    clock: Clock,
    /// Current frontier of the DAG.
    heads: BTreeSet<ChangeHash>,
    /// Changes waiting on missing dependencies, keyed by hash.
    pending: BTreeMap<ChangeHash, Change>,
    /// Winning write per key.
    registers: BTreeMap<String, Register>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Number of applied changes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes buffered on missing dependencies.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The currently visible document value.
    #[must_use]
    pub fn value(&self) -> BTreeMap<String, Value> {
        self.registers
            .iter()
            .filter_map(|(key, reg)| reg.value.clone().map(|v| (key.clone(), v)))
            .collect()
    }

    /// Applied changes sorted by (depth, hash): a deterministic
    /// topological order of the DAG, since every edge strictly increases
    /// depth.
    fn history(&self) -> Vec<&Change> {
        let mut ordered: Vec<&Change> = self.changes.values().collect();
        ordered.sort_by_key(|c| (self.depths.get(&c.hash).copied().unwrap_or(0), c.hash));
        ordered
    }

    /// A change is ready once all its dependencies are applied and it is
    /// the next in its actor's sequence.
    fn is_ready(&self, change: &Change) -> bool {
        change.seq == self.clock.get(&change.actor) + 1
            && change.deps.iter().all(|dep| self.changes.contains_key(dep))
    }

    /// Apply one ready change: extend the DAG, advance the frontier and
    /// clock, and run its ops through the registers.
    fn integrate(&mut self, change: Change) {
        let depth = 1 + change
            .deps
            .iter()
            .map(|dep| self.depths.get(dep).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);
        for dep in &change.deps {
            self.heads.remove(dep);
        }
        self.heads.insert(change.hash);
        self.clock.observe(&change.actor, change.seq);
        self.depths.insert(change.hash, depth);
        for (op_index, op) in change.ops.iter().enumerate() {
            self.write_register(op, depth, change.hash, op_index);
        }
        self.changes.insert(change.hash, change);
    }

    fn write_register(&mut self, op: &Operation, depth: u64, source: ChangeHash, op_index: usize) {
        let (key, value) = match op {
            Operation::Set { key, value } => (key.clone(), Some(value.clone())),
            Operation::Delete { key } => (key.clone(), None),
        };
        let incoming = Register {
            value,
            depth,
            source,
            op_index,
        };
        match self.registers.entry(key) {
            Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                if (incoming.depth, incoming.source, incoming.op_index)
                    > (current.depth, current.source, current.op_index)
                {
                    *current = incoming;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
    }

    /// Validate a batch before touching any state. Duplicates of applied
    /// changes are fine (they are skipped later); a fresh hash claiming an
    /// already-taken actor/sequence slot is a forked history.
    fn validate(&self, incoming: &[Change]) -> Result<()> {
        for change in incoming {
            if !change.verify() {
                return Err(EngineError::InvalidChange(format!(
                    "content hash mismatch for {}",
                    change
                )));
            }
            if change.seq == 0 {
                return Err(EngineError::InvalidChange(format!(
                    "sequence numbers start at 1, got {}",
                    change
                )));
            }
            if change.seq <= self.clock.get(&change.actor)
                && !self.changes.contains_key(&change.hash)
            {
                return Err(EngineError::InvalidChange(format!(
                    "{} reuses an already-applied sequence number",
                    change
                )));
            }
        }
        Ok(())
    }

    /// Queue a batch together with everything previously buffered and
    /// integrate to fixpoint, so delivery order within and across batches
    /// cannot matter. Returns the number of changes newly applied.
    fn ingest(&mut self, incoming: Vec<Change>) -> Result<usize> {
        self.validate(&incoming)?;

        let mut queue: Vec<Change> = std::mem::take(&mut self.pending).into_values().collect();
        queue.extend(incoming);
        let mut applied = 0usize;
        loop {
            let mut deferred = Vec::new();
            let mut progressed = false;
            for change in queue {
                if self.changes.contains_key(&change.hash) {
                    continue;
                }
                if self.is_ready(&change) {
                    self.integrate(change);
                    applied += 1;
                    progressed = true;
                } else {
                    deferred.push(change);
                }
            }
            queue = deferred;
            if queue.is_empty() || !progressed {
                break;
            }
        }

        let mut fork: Option<EngineError> = None;
        for change in queue {
            if change.seq <= self.clock.get(&change.actor) {
                // Lost the race for its sequence slot to a change applied
                // this same batch; it can never apply, so drop it.
                fork = Some(EngineError::InvalidChange(format!(
                    "{} conflicts with an already-applied sequence number",
                    change
                )));
            } else {
                self.pending.insert(change.hash, change);
            }
        }
        if let Some(err) = fork {
            return Err(err);
        }

        if !self.pending.is_empty() {
            warn!(
                "{} changes buffered on missing dependencies",
                self.pending.len()
            );
        }
        Ok(applied)
    }

    /// Key-level diff of the visible value against an earlier one.
    fn diff_from(&self, before: &BTreeMap<String, Value>) -> Patch {
        let after = self.value();
        let mut ops = Vec::new();
        for (key, value) in &after {
            if before.get(key) != Some(value) {
                ops.push(PatchOp::assign(key.clone(), value.clone()));
            }
        }
        for key in before.keys() {
            if !after.contains_key(key) {
                ops.push(PatchOp::remove(key.clone()));
            }
        }
        ops.sort_by(|a, b| a.key().cmp(b.key()));
        Patch::new(ops)
    }
}

impl DocumentEngine for MemoryEngine {
    fn new() -> Self {
        MemoryEngine {
            changes: HashMap::new(),
            depths: HashMap::new(),
            clock: Clock::new(),
            heads: BTreeSet::new(),
            pending: BTreeMap::new(),
            registers: BTreeMap::new(),
        }
    }

    fn load(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)
            .map_err(|err| EngineError::CorruptSnapshot(format!("undecodable snapshot: {err}")))?;
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(EngineError::CorruptSnapshot(format!(
                "unsupported snapshot format {}",
                snapshot.format
            )));
        }
        let mut engine = MemoryEngine::new();
        engine
            .ingest(snapshot.changes)
            .map_err(|err| EngineError::CorruptSnapshot(format!("snapshot replay failed: {err}")))?;
        if !engine.pending.is_empty() {
            return Err(EngineError::CorruptSnapshot(
                "snapshot history is not causally closed".into(),
            ));
        }
        engine
            .ingest(snapshot.pending)
            .map_err(|err| EngineError::CorruptSnapshot(format!("snapshot replay failed: {err}")))?;
        debug!(
            "loaded snapshot: {} applied, {} buffered",
            engine.len(),
            engine.pending_len()
        );
        Ok(engine)
    }

    fn apply_changes(&mut self, changes: Vec<Change>) -> Result<(Patch, Vec<ChangeHash>)> {
        let before = self.value();
        let applied = self.ingest(changes)?;
        debug!("applied {} changes, frontier {}", applied, self.heads.len());
        Ok((self.diff_from(&before), self.get_heads()))
    }

    fn apply_local_change(
        &mut self,
        request: ChangeRequest,
    ) -> Result<(Patch, Change, Vec<ChangeHash>)> {
        // Resolve every op against the value as earlier ops in the same
        // request leave it.
        let mut visible: BTreeSet<&str> = self
            .registers
            .iter()
            .filter(|(_, reg)| reg.value.is_some())
            .map(|(key, _)| key.as_str())
            .collect();
        for op in &request.ops {
            match op {
                Operation::Set { key, .. } => {
                    visible.insert(key);
                }
                Operation::Delete { key } => {
                    if !visible.remove(key.as_str()) {
                        return Err(EngineError::InvalidRequest(format!(
                            "cannot delete absent key {:?}",
                            key
                        )));
                    }
                }
            }
        }

        let seq = self.clock.get(&request.actor) + 1;
        let deps: Vec<ChangeHash> = self.heads.iter().copied().collect();
        let change = Change::new(
            request.actor,
            seq,
            deps,
            request.time,
            request.message,
            request.ops,
        );

        let before = self.value();
        self.integrate(change.clone());
        debug!("committed local change {}", change);
        Ok((self.diff_from(&before), change, self.get_heads()))
    }

    fn load_changes(&mut self, changes: Vec<Change>) -> Result<Vec<ChangeHash>> {
        let applied = self.ingest(changes)?;
        debug!("loaded {} changes, frontier {}", applied, self.heads.len());
        Ok(self.get_heads())
    }

    fn get_heads(&self) -> Vec<ChangeHash> {
        self.heads.iter().copied().collect()
    }

    fn get_clock(&self) -> Clock {
        self.clock.clone()
    }

    fn get_patch(&self) -> Patch {
        let ops = self
            .value()
            .into_iter()
            .map(|(key, value)| PatchOp::assign(key, value))
            .collect();
        Patch::new(ops)
    }

    fn get_changes(&self, since: &Clock) -> Vec<Change> {
        self.history()
            .into_iter()
            .filter(|change| !since.covers(&change.actor, change.seq))
            .cloned()
            .collect()
    }

    fn get_changes_for_actor(&self, actor: &ActorId) -> Vec<Change> {
        let mut changes: Vec<Change> = self
            .changes
            .values()
            .filter(|change| &change.actor == actor)
            .cloned()
            .collect();
        changes.sort_by_key(|change| change.seq);
        changes
    }

    fn get_missing_deps(&self) -> Vec<ChangeHash> {
        let mut missing = BTreeSet::new();
        for change in self.pending.values() {
            for dep in &change.deps {
                if !self.changes.contains_key(dep) && !self.pending.contains_key(dep) {
                    missing.insert(*dep);
                }
            }
        }
        missing.into_iter().collect()
    }

    fn save(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            format: SNAPSHOT_FORMAT,
            changes: self.history().into_iter().cloned().collect(),
            pending: self.pending.values().cloned().collect(),
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    fn fork(&self) -> Self {
        self.clone()
    }

    fn fork_at(&self, clock: &Clock) -> Result<Self> {
        let covered: Vec<Change> = self
            .history()
            .into_iter()
            .filter(|change| clock.covers(&change.actor, change.seq))
            .cloned()
            .collect();
        let mut engine = MemoryEngine::new();
        engine.ingest(covered)?;
        if !engine.pending.is_empty() {
            return Err(EngineError::InvalidRequest(
                "fork clock does not cover the dependencies of every covered change".into(),
            ));
        }
        Ok(engine)
    }
}
