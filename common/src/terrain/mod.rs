pub mod biome;
pub mod block;

// Reexports
pub use self::{
    biome::BiomeKind,
    block::{Block, BlockKind},
};

use crate::{
    vol::{RectVolSize, VolSize},
    volumes::chunk::{Chunk, ChunkError},
};
use serde::{Deserialize, Serialize};
use vek::*;

// TerrainChunkSize

#[derive(Clone, Serialize, Deserialize)]
pub struct TerrainChunkSize;

impl VolSize for TerrainChunkSize {
    const SIZE: Vec3<u32> = Vec3 {
        x: 16,
        y: 16,
        z: 256,
    };
}

impl RectVolSize for TerrainChunkSize {
    const RECT_SIZE: Vec2<u32> = Vec2 { x: 16, y: 16 };
}

// TerrainChunkMeta

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainChunkMeta {
    biome: BiomeKind,
}

impl TerrainChunkMeta {
    pub fn new(biome: BiomeKind) -> Self { Self { biome } }

    pub fn void() -> Self {
        Self {
            biome: BiomeKind::Void,
        }
    }

    pub fn biome(&self) -> BiomeKind { self.biome }
}

// Terrain type aliases

pub type TerrainChunk = Chunk<Block, TerrainChunkSize, TerrainChunkMeta>;
pub type TerrainChunkError = ChunkError;
