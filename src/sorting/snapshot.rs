//! Snapshot persistence
//!
//! The accumulator hands every updated [`SessionStats`](crate::sorting::SessionStats)
//! to a [`SnapshotStore`]; reporting surfaces read the same store.

mod json_store;
mod memory_store;
mod store;

pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use store::SnapshotStore;
