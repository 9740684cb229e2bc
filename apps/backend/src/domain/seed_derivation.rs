//! RNG seed derivation for replayable random seats.
//!
//! A seeded random seat must pick the same move for the same position in the
//! same session, regardless of which run (or which retry) computed it.

use xxhash_rust::xxh3::xxh3_64;

use super::board::Side;
use super::session::SessionId;

/// Stable 64-bit hash of a session id. Mixed into a batch seed it gives each
/// session of a seeded batch its own replayable seed.
pub fn session_seed(session_id: &SessionId) -> u64 {
    xxh3_64(session_id.as_str().as_bytes())
}

/// Derive the seed for one ply.
///
/// Same base + move count + side = same seed; neighbouring plies differ.
pub fn derive_move_seed(base: u64, move_count: u32, side: Side) -> u64 {
    let side_offset = match side {
        Side::White => 1,
        Side::Black => 2,
    };
    base.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((move_count as u64).wrapping_mul(1_000_003))
        .wrapping_add(side_offset)
}
