//! Session statistics
//!
//! The accumulator is the only shared mutable state in the engine. It is an
//! explicit handle (wrap it in an `Arc` to share it) guarded by one lock; each
//! update writes a snapshot while the lock is still held.

mod accumulator;
pub mod types;

pub use accumulator::{StatsAccumulator, StatsUpdate};
pub use types::SessionStats;
