pub mod storage;
pub mod variables;

pub use storage::{ContractStorage, MemoryStorage, StateError, StorageOverlay};
pub use variables::*;
