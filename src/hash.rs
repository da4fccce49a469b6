//! Hasher selection for the sparse maps used by tick bitmaps and tick tables.
//!
//! `rustc-hash` or `ahash` swaps in a faster hasher when enabled on its own.
//! Any other combination, `std-hash` included, keeps std's `RandomState`.
//! Build maps with `FastMap::default()`; `new()` only exists for std.

use std::collections::HashMap;

#[cfg(all(
    feature = "rustc-hash",
    not(any(feature = "ahash", feature = "std-hash"))
))]
pub type TickHasher = rustc_hash::FxBuildHasher;

#[cfg(all(
    feature = "ahash",
    not(any(feature = "rustc-hash", feature = "std-hash"))
))]
pub type TickHasher = ahash::RandomState;

#[cfg(not(any(
    all(
        feature = "rustc-hash",
        not(any(feature = "ahash", feature = "std-hash"))
    ),
    all(
        feature = "ahash",
        not(any(feature = "rustc-hash", feature = "std-hash"))
    ),
)))]
pub type TickHasher = std::collections::hash_map::RandomState;

pub type FastMap<K, V> = HashMap<K, V, TickHasher>;
