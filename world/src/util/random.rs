use super::seed_expan;
use std::ops::Range;
use vek::*;

/// A deterministic hash over positions on the settlement grid (or any other
/// pair of integer coordinates). Everything the settlement generator decides
/// is derived from one of these, so the quality bar is avalanche-grade mixing:
/// neighbouring inputs must produce uncorrelated outputs, and the same input
/// must produce the same output on every call, process and platform.
#[derive(Clone, Copy)]
pub struct RandomField {
    seed: u64,
}

impl RandomField {
    pub const fn new(seed: u64) -> Self { Self { seed } }

    /// Derive an independent field. The xor alone is a weak perturbation, but
    /// the mixing rounds in `sample` avalanche it across the full output.
    pub const fn salted(&self, salt: u64) -> Self {
        Self {
            seed: self.seed ^ salt,
        }
    }

    /// Raw 64-bit sample for a position: combine the coordinates into the
    /// seed, then run splitmix64-style finalization rounds.
    pub fn sample(&self, pos: Vec2<i32>) -> u64 {
        let mut h = self.seed
            ^ (pos.x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (pos.y as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        h ^= h >> 33;
        h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h ^= h >> 27;
        h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
        h
    }

    /// A reproducible pseudo-random integer in `[0, modulus)`.
    pub fn get(&self, pos: Vec2<i32>, modulus: u64) -> u64 {
        (self.sample(pos) as i64).unsigned_abs() % modulus
    }

    pub fn chance(&self, pos: Vec2<i32>, chance: f32) -> bool {
        (self.get(pos, 1 << 16) as f32) < chance * (1 << 16) as f32
    }

    /// A uniform integer in `[range.start, range.end)`.
    pub fn range(&self, pos: Vec2<i32>, range: Range<i32>) -> i32 {
        range.start + self.get(pos, (range.end - range.start) as u64) as i32
    }
}

/// A cheap deterministic permutation hash over small indices, for decisions
/// that are keyed by an ordinal rather than a position (wobble nodes, lamp
/// rolls along a segment).
#[derive(Clone, Copy)]
pub struct RandomPerm {
    seed: u32,
}

impl RandomPerm {
    pub const fn new(seed: u32) -> Self { Self { seed } }

    pub fn get(&self, perm: u32) -> u32 { seed_expan::diffuse_mult(&[self.seed, perm]) }

    pub fn chance(&self, perm: u32, chance: f32) -> bool {
        (self.get(perm) % (1 << 16)) as f32 / ((1 << 16) as f32) < chance
    }
}
