//! Store adapters implementing `repos::GameStore`.

pub mod memory;
pub mod sea;

pub use memory::MemoryStore;
pub use sea::SeaStore;
