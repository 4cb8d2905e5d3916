//! Copy-on-write document backend for Weft.
//!
//! The backend owns a document's authoritative causal history through a
//! pluggable engine and enforces a linear-ownership discipline over it:
//! every mutating call returns a fresh [`Backend`] handle and freezes the
//! one it was given, so no caller ever observes a document changing
//! underneath a handle it holds.
//!
//! ```
//! use weft_backend::Backend;
//! use weft_engine::MemoryEngine;
//! use weft_protocol::ChangeRequest;
//!
//! let mut doc = Backend::<MemoryEngine>::init();
//! let (doc, _patch, change) = doc
//!     .apply_local_change(ChangeRequest::new("alice").set("title", "hello"))
//!     .unwrap();
//! assert_eq!(doc.get_heads().unwrap(), &[change.hash]);
//! ```

pub mod error;
pub mod handle;

pub use error::{BackendError, Result};
pub use handle::{Backend, HandleStatus};
