//! DocumentEngine trait - pluggable history engine interface for the
//! Weft backend.
//!
//! The backend layer never looks inside an engine: it moves whole engine
//! values between handles and calls through this trait. Any type that owns
//! a change DAG, a missing-dependency buffer, and a materialized value can
//! sit behind a handle; [`MemoryEngine`](crate::MemoryEngine) is the
//! reference implementation, and tests substitute instrumented engines to
//! observe what the backend lets through.

use std::fmt::Debug;

use weft_protocol::{ActorId, Change, ChangeHash, ChangeRequest, Clock, Patch};

use crate::error::Result;

/// A document history engine.
///
/// Mutating operations return the new frontier alongside their other
/// outputs so the caller can stamp a successor handle without a second
/// query. All operations are synchronous.
pub trait DocumentEngine: Debug + Sized {
    /// Create an empty engine: no changes, no value, empty frontier.
    fn new() -> Self;

    /// Restore an engine from bytes produced by [`save`](Self::save).
    ///
    /// Fails with [`EngineError::CorruptSnapshot`](crate::EngineError) when
    /// the bytes do not decode or do not replay.
    fn load(bytes: &[u8]) -> Result<Self>;

    /// Integrate remote changes.
    ///
    /// Changes whose dependencies are not yet known are buffered, not
    /// rejected; re-delivered changes are skipped. Returns the net effect
    /// on the document value and the new frontier.
    fn apply_changes(&mut self, changes: Vec<Change>) -> Result<(Patch, Vec<ChangeHash>)>;

    /// Commit a local edit request as a new change.
    ///
    /// The engine assigns the next sequence number for the request's actor
    /// and takes the current frontier as the dependency set. Returns the
    /// patch, the committed change (for broadcast), and the new frontier.
    fn apply_local_change(&mut self, request: ChangeRequest)
        -> Result<(Patch, Change, Vec<ChangeHash>)>;

    /// Integrate remote changes without computing a patch (bulk ingestion).
    fn load_changes(&mut self, changes: Vec<Change>) -> Result<Vec<ChangeHash>>;

    /// The current frontier: hashes of the changes nothing else depends on.
    fn get_heads(&self) -> Vec<ChangeHash>;

    /// Vector clock over applied changes.
    fn get_clock(&self) -> Clock;

    /// Patch materializing the entire current value from scratch.
    fn get_patch(&self) -> Patch;

    /// Applied changes not covered by `since`, in causal order.
    fn get_changes(&self, since: &Clock) -> Vec<Change>;

    /// One actor's applied changes, in sequence order.
    fn get_changes_for_actor(&self, actor: &ActorId) -> Vec<Change>;

    /// Hashes referenced as dependencies by buffered changes but absent
    /// from the applied history.
    fn get_missing_deps(&self) -> Vec<ChangeHash>;

    /// Encode the full engine state (applied and buffered changes) as an
    /// opaque byte buffer.
    fn save(&self) -> Result<Vec<u8>>;

    /// Deep copy: an independent engine with identical state.
    fn fork(&self) -> Self;

    /// An independent engine containing only the history covered by
    /// `clock`.
    ///
    /// Fails with [`EngineError::InvalidRequest`](crate::EngineError) when
    /// the clock is not causally closed over the applied history.
    fn fork_at(&self, clock: &Clock) -> Result<Self>;

    /// Release any resources the engine holds. The in-memory engine has
    /// nothing beyond its allocations, so the default just drops.
    fn free(self) {}
}
