//! Local edit requests, before they become committed changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actor::ActorId;
use crate::operation::Operation;

/// A local edit an application wants to commit.
///
/// The engine turns a request into a [`Change`](crate::Change): it assigns
/// the actor's next sequence number and takes the current document frontier
/// as the dependency set. Requests carry no hash and no deps of their own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Actor committing the edit.
    pub actor: ActorId,
    /// Wall-clock time of the edit, unix seconds.
    pub time: i64,
    /// Optional human-readable description.
    pub message: Option<String>,
    /// The edits to commit, in order.
    pub ops: Vec<Operation>,
}

impl ChangeRequest {
    #[must_use]
    pub fn new(actor: impl Into<ActorId>) -> Self {
        ChangeRequest {
            actor: actor.into(),
            time: 0,
            message: None,
            ops: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Append a `Set` operation.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(Operation::set(key, value));
        self
    }

    /// Append a `Delete` operation.
    #[must_use]
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(Operation::delete(key));
        self
    }
}
