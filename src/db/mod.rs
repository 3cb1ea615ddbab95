//! Database layer: the document store seam and its implementations.

pub mod firestore;
pub mod memory;
pub mod store;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use store::{Direction, DocumentStore, Query, SnapshotResult, Subscription};

/// Default collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EQUIPMENT: &str = "equipment";
    pub const LOANS: &str = "loans";
    pub const TASKS: &str = "tasks";
}
