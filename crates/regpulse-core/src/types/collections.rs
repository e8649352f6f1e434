//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;
pub use std::collections::BTreeMap;

/// SmallVec sized for category counts (at most three per family today).
pub type CountVec = SmallVec<[Option<u64>; 4]>;

/// SmallVec sized for grouping keys (region x date is the widest in use).
pub type KeyVec<T> = SmallVec<[T; 3]>;
