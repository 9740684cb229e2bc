//! Test helpers for generating unique test data
//!
//! ULID suffixes keep tests that share a store (or a SQLite file) isolated.

use ulid::Ulid;

/// Generate a unique string in the format `{prefix}-{ulid}`.
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let id1 = unique_str("game");
/// let id2 = unique_str("game");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("game-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// A fresh session id string, `session-{ulid}`.
pub fn unique_session_id() -> String {
    unique_str("session")
}

/// A fresh device name for external-actuator seats.
pub fn unique_device() -> String {
    unique_str("arm")
}
