//! Hash map constructors backed by ahash
//!
//! The markup tag tables and the entity table are built once per profile and
//! looked up for every tag or entity in every cue, so they use ahash.

use ahash::RandomState;
use std::collections::HashMap;

/// Create a new `HashMap` with the ahash hasher
///
/// # Example
///
/// ```rust
/// use sub_core::utils::hashers::create_hash_map;
///
/// let mut map = create_hash_map::<&str, u32>();
/// map.insert("b", 1);
/// ```
#[must_use]
pub fn create_hash_map<K, V>() -> HashMap<K, V, RandomState> {
    HashMap::with_hasher(RandomState::new())
}

/// Create a new `HashMap` with specific capacity and the ahash hasher
#[must_use]
pub fn create_hash_map_with_capacity<K, V>(capacity: usize) -> HashMap<K, V, RandomState> {
    HashMap::with_capacity_and_hasher(capacity, RandomState::new())
}
