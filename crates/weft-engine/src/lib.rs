//! Document engines for the Weft backend.
//!
//! An engine owns a document's causal history: the DAG of applied changes,
//! the buffer of changes waiting on missing dependencies, and the value
//! materialized from them. The [`DocumentEngine`] trait is the boundary the
//! backend layer consumes; [`MemoryEngine`] is the in-memory reference
//! implementation over a flat key/value document.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{EngineError, Result};
pub use memory::MemoryEngine;
pub use traits::DocumentEngine;
