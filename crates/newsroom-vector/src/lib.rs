#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! In-memory vector index with binary snapshots.

mod index;
mod snapshot;
pub mod store;

pub use index::{cosine_distance, VectorIndex};
pub use snapshot::{FORMAT_VERSION, SNAPSHOT_MAGIC};
pub use store::{FileSnapshotStore, MemorySnapshotStore};
