//! State-space exploration: deriving a scenario's
//! max-plus matrix symbolically, the strong-bounding rewrite, and numeric
//! (timestamped-token) exploration for single-scenario throughput.

pub mod bounding;
pub mod numeric;
pub mod symbolic;

pub use bounding::ensure_strongly_bounded;
pub use numeric::{explore_backward, explore_forward, StateSpaceResult};
pub use symbolic::explore_symbolic;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::maxplus::MPTime;

/// A canonical, bit-exact digest of an ordered sequence of timestamps, used
/// both as a hash-set key for recurrence detection and as the
/// `state_digest` reported alongside `Error::Deadlock`.
pub(crate) fn digest_timestamps<'a>(values: impl Iterator<Item = &'a MPTime>) -> u64 {
    let mut hasher = DefaultHasher::new();
    for v in values {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}
