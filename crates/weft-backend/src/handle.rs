//! Document handles with a copy-on-write ownership discipline.
//!
//! A [`Backend`] is a handle over exactly one [`DocumentEngine`] instance.
//! Mutating operations do not edit the handle in place: they move the
//! engine into a fresh handle, return that successor, and leave the input
//! handle *frozen*. Any later use of a frozen (or freed) handle fails with
//! [`BackendError::StaleHandle`], so a document can never be mutated out
//! from under code that still holds an old handle. [`Backend::try_clone`]
//! is the escape hatch: a deep engine copy that leaves both handles live
//! and independent.
//!
//! The engine value lives inside the `Live` state, so a frozen or freed
//! handle has no engine to reach: the "never dereference a dead handle"
//! rule is structural, not just checked.

use tracing::debug;

use weft_engine::DocumentEngine;
use weft_protocol::{ActorId, Change, ChangeHash, ChangeRequest, Clock, Patch};

use crate::error::{BackendError, Result};

/// Lifecycle state of a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleStatus {
    /// Usable: this handle owns its engine.
    Live,
    /// Superseded: the engine moved into the successor of a mutating call.
    Frozen,
    /// Explicitly released via [`Backend::free`].
    Freed,
}

#[derive(Debug)]
enum HandleState<E> {
    Live(E),
    Frozen,
    Freed,
}

/// A single-owner handle over a document engine.
///
/// Handles come from [`init`](Backend::init), [`load`](Backend::load), the
/// copy operations, or as the successor returned by a mutating call. The
/// frontier is cached at construction and never recomputed, so
/// [`get_heads`](Backend::get_heads) is O(1).
#[derive(Debug)]
pub struct Backend<E> {
    state: HandleState<E>,
    heads: Vec<ChangeHash>,
}

impl<E: DocumentEngine> Backend<E> {
    /// Create a handle over a fresh, empty engine.
    #[must_use]
    pub fn init() -> Self {
        Self::wrap(E::new())
    }

    /// Restore a handle from snapshot bytes produced by
    /// [`save`](Backend::save).
    ///
    /// Fails with the engine's corrupt-snapshot error when the bytes do
    /// not decode.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        Ok(Self::wrap(E::load(bytes)?))
    }

    /// Wrap a live engine, reading the frontier off it.
    fn wrap(engine: E) -> Self {
        let heads = engine.get_heads();
        Backend {
            state: HandleState::Live(engine),
            heads,
        }
    }

    /// Wrap a live engine with a frontier the engine already reported.
    fn with_heads(engine: E, heads: Vec<ChangeHash>) -> Self {
        Backend {
            state: HandleState::Live(engine),
            heads,
        }
    }

    /// Current lifecycle state. Works on dead handles; everything else
    /// goes through the liveness guard.
    #[inline]
    #[must_use]
    pub fn status(&self) -> HandleStatus {
        match self.state {
            HandleState::Live(_) => HandleStatus::Live,
            HandleState::Frozen => HandleStatus::Frozen,
            HandleState::Freed => HandleStatus::Freed,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self.state, HandleState::Live(_))
    }

    /// Liveness guard for read-only access.
    fn engine(&self) -> Result<&E> {
        match &self.state {
            HandleState::Live(engine) => Ok(engine),
            HandleState::Frozen | HandleState::Freed => Err(BackendError::StaleHandle),
        }
    }

    /// Take the engine out for a mutating call, leaving this handle
    /// frozen. A failed engine call must hand the engine back through
    /// [`restore`](Backend::restore): only successful mutations freeze.
    fn checkout(&mut self) -> Result<E> {
        match std::mem::replace(&mut self.state, HandleState::Frozen) {
            HandleState::Live(engine) => Ok(engine),
            HandleState::Frozen => Err(BackendError::StaleHandle),
            HandleState::Freed => {
                self.state = HandleState::Freed;
                Err(BackendError::StaleHandle)
            }
        }
    }

    fn restore(&mut self, engine: E) {
        self.state = HandleState::Live(engine);
    }

    /// Integrate remote changes.
    ///
    /// Returns the successor handle and the patch describing the net value
    /// delta of whatever newly integrated; changes with missing
    /// dependencies buffer inside the engine. On success this handle is
    /// frozen, even when the batch was empty or contained nothing new. On
    /// an engine error this handle stays live.
    pub fn apply_changes(&mut self, changes: Vec<Change>) -> Result<(Self, Patch)> {
        let mut engine = self.checkout()?;
        match engine.apply_changes(changes) {
            Ok((patch, heads)) => {
                debug!("handle superseded, frontier has {} heads", heads.len());
                Ok((Self::with_heads(engine, heads), patch))
            }
            Err(err) => {
                self.restore(engine);
                Err(err.into())
            }
        }
    }

    /// Commit a local edit.
    ///
    /// The engine assigns the actor's next sequence number and takes the
    /// current frontier as dependencies. Returns the successor handle, the
    /// patch, and the committed [`Change`] for broadcast. Freezes this
    /// handle on success; an unresolvable request leaves it live.
    pub fn apply_local_change(&mut self, request: ChangeRequest) -> Result<(Self, Patch, Change)> {
        let mut engine = self.checkout()?;
        match engine.apply_local_change(request) {
            Ok((patch, change, heads)) => {
                debug!("committed {}, frontier has {} heads", change, heads.len());
                Ok((Self::with_heads(engine, heads), patch, change))
            }
            Err(err) => {
                self.restore(engine);
                Err(err.into())
            }
        }
    }

    /// Integrate remote changes without computing a patch (bulk
    /// ingestion). Freezes this handle on success.
    pub fn load_changes(&mut self, changes: Vec<Change>) -> Result<Self> {
        let mut engine = self.checkout()?;
        match engine.load_changes(changes) {
            Ok(heads) => Ok(Self::with_heads(engine, heads)),
            Err(err) => {
                self.restore(engine);
                Err(err.into())
            }
        }
    }

    /// Deep-copy into an independent live handle. This handle stays live;
    /// the two lineages reconcile only by exchanging changes.
    pub fn try_clone(&self) -> Result<Self> {
        let engine = self.engine()?;
        Ok(Self::with_heads(engine.fork(), self.heads.clone()))
    }

    /// An independent live handle over the history covered by `clock`.
    /// This handle stays live.
    pub fn fork_at(&self, clock: &Clock) -> Result<Self> {
        Ok(Self::wrap(self.engine()?.fork_at(clock)?))
    }

    /// Release the engine. The handle sticks around as [`Freed`] and
    /// every further operation on it fails with
    /// [`BackendError::StaleHandle`]. Dropping a handle releases the
    /// engine too; `free` is the explicit, observable release point.
    ///
    /// [`Freed`]: HandleStatus::Freed
    pub fn free(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, HandleState::Freed) {
            HandleState::Live(engine) => {
                engine.free();
                debug!("handle freed");
                Ok(())
            }
            HandleState::Frozen => {
                self.state = HandleState::Frozen;
                Err(BackendError::StaleHandle)
            }
            HandleState::Freed => Err(BackendError::StaleHandle),
        }
    }

    /// The frontier cached when this handle was constructed. O(1), no
    /// engine call.
    pub fn get_heads(&self) -> Result<&[ChangeHash]> {
        match self.state {
            HandleState::Live(_) => Ok(&self.heads),
            HandleState::Frozen | HandleState::Freed => Err(BackendError::StaleHandle),
        }
    }

    /// Patch materializing the entire current value.
    pub fn get_patch(&self) -> Result<Patch> {
        Ok(self.engine()?.get_patch())
    }

    /// Applied changes not covered by `since`, in causal order.
    pub fn get_changes(&self, since: &Clock) -> Result<Vec<Change>> {
        Ok(self.engine()?.get_changes(since))
    }

    /// One actor's applied changes, in sequence order.
    pub fn get_changes_for_actor(&self, actor: &ActorId) -> Result<Vec<Change>> {
        Ok(self.engine()?.get_changes_for_actor(actor))
    }

    /// Dependency hashes the engine is still waiting on.
    pub fn get_missing_deps(&self) -> Result<Vec<ChangeHash>> {
        Ok(self.engine()?.get_missing_deps())
    }

    /// Vector clock over the applied history.
    pub fn get_clock(&self) -> Result<Clock> {
        Ok(self.engine()?.get_clock())
    }

    /// Encode the full engine state as an opaque byte buffer.
    /// [`load`](Backend::load) of the result reproduces this document
    /// exactly: heads, value, and buffered changes.
    pub fn save(&self) -> Result<Vec<u8>> {
        Ok(self.engine()?.save()?)
    }
}

impl<E: DocumentEngine> Default for Backend<E> {
    fn default() -> Self {
        Self::init()
    }
}
