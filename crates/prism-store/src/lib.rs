//! Record storage for Prism.
//!
//! The assistant remembers things for the user by writing [`Record`]s into a
//! flat, append-only store persisted as a single JSON array. The storage
//! medium is abstracted behind [`StorageBackend`] so callers never touch the
//! file layout directly; the store's own contract is just
//! insert / find / all / clear.

pub mod backend;
pub mod error;
pub mod record;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use error::{Result, StoreError};
pub use record::{Record, RecordId};
pub use store::RecordStore;
