//! Protocol types for the Weft document backend.
//!
//! A document's history is a DAG of content-addressed [`Change`] records;
//! the types here describe changes, their hashes and authorship, the vector
//! clocks used to compare histories, and the patches engines emit when
//! changes are applied.

pub mod actor;
pub mod change;
pub mod clock;
pub mod hash;
pub mod operation;
pub mod patch;
pub mod request;

pub use actor::ActorId;
pub use change::Change;
pub use clock::Clock;
pub use hash::{ChangeHash, HashParseError};
pub use operation::Operation;
pub use patch::{Patch, PatchOp};
pub use request::ChangeRequest;
