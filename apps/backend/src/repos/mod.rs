//! Store port and the helpers built on it.

pub mod heads;
pub mod store;

pub use heads::{load_head, require_head, require_session};
pub use store::{GameStore, HeadPatch, HeadPredicate, TokenExpect};
