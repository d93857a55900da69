use crate::vol::{BaseVol, ReadVol, VolSize, Vox, WriteVol};
use core::marker::PhantomData;
use serde::{Deserialize, Serialize};
use vek::*;

#[derive(Debug)]
pub enum ChunkError {
    OutOfBounds,
}

/// A dense, compile-time sized voxel volume with its lower bound at the
/// origin. Voxels are stored flat in x-major order; a chunk column at the
/// default terrain size is small enough that no compression is warranted
/// before it crosses a serialization boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk<V: Vox, S: VolSize, M> {
    vox: Vec<V>,
    meta: M,
    phantom: PhantomData<S>,
}

impl<V: Vox, S: VolSize, M> Chunk<V, S, M> {
    pub const VOLUME: u32 = S::SIZE.x * S::SIZE.y * S::SIZE.z;

    /// Creates a new `Chunk` with all voxels set to duplicates of the
    /// provided voxel.
    pub fn filled(default: V, meta: M) -> Self {
        Self {
            vox: vec![default; Self::VOLUME as usize],
            meta,
            phantom: PhantomData,
        }
    }

    pub fn meta(&self) -> &M { &self.meta }

    pub fn meta_mut(&mut self) -> &mut M { &mut self.meta }

    fn idx(pos: Vec3<i32>) -> Option<usize> {
        if pos.map2(S::SIZE, |e, sz| e >= 0 && (e as u32) < sz).reduce_and() {
            Some(
                (pos.x as u32 * S::SIZE.y * S::SIZE.z + pos.y as u32 * S::SIZE.z + pos.z as u32)
                    as usize,
            )
        } else {
            None
        }
    }
}

impl<V: Vox, S: VolSize, M: PartialEq> PartialEq for Chunk<V, S, M> {
    fn eq(&self, other: &Self) -> bool { self.vox == other.vox && self.meta == other.meta }
}

impl<V: Vox, S: VolSize, M> BaseVol for Chunk<V, S, M> {
    type Error = ChunkError;
    type Vox = V;
}

impl<V: Vox, S: VolSize, M> ReadVol for Chunk<V, S, M> {
    #[inline(always)]
    fn get(&self, pos: Vec3<i32>) -> Result<&V, ChunkError> {
        Self::idx(pos)
            .map(|idx| &self.vox[idx])
            .ok_or(ChunkError::OutOfBounds)
    }
}

impl<V: Vox, S: VolSize, M> WriteVol for Chunk<V, S, M> {
    #[inline(always)]
    fn set(&mut self, pos: Vec3<i32>, vox: V) -> Result<(), ChunkError> {
        Self::idx(pos)
            .map(|idx| self.vox[idx] = vox)
            .ok_or(ChunkError::OutOfBounds)
    }
}
