pub mod cache;
pub mod random;
pub mod seed_expan;

// Reexports
pub use self::{
    cache::MemoCache,
    random::{RandomField, RandomPerm},
};

use fxhash::FxHasher64;
use std::hash::BuildHasherDefault;
use vek::*;

/// We use this hasher (FxHasher64) because
/// (1) we don't care about DDOS attacks (ruling out SipHash);
/// (2) we care about determinism across computers (ruling out AAHash);
/// (3) we have 8-byte keys (for which FxHash is fastest).
pub type DHashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<FxHasher64>>;

pub const CARDINALS: [Vec2<i32>; 4] = [
    Vec2::new(0, 1),
    Vec2::new(1, 0),
    Vec2::new(0, -1),
    Vec2::new(-1, 0),
];

pub const NEIGHBORS: [Vec2<i32>; 8] = [
    Vec2::new(0, 1),
    Vec2::new(1, 1),
    Vec2::new(1, 0),
    Vec2::new(1, -1),
    Vec2::new(0, -1),
    Vec2::new(-1, -1),
    Vec2::new(-1, 0),
    Vec2::new(-1, 1),
];
