pub mod canvas;
pub mod config;
pub mod land;
pub mod sim;
pub mod site;
pub mod util;

// Reexports
pub use crate::{
    canvas::Canvas,
    config::CONFIG,
    land::Land,
    site::{settlement::SettlementGen, Colors, SpawnRules},
};

use common::{
    terrain::{BiomeKind, Block, BlockKind, TerrainChunk, TerrainChunkMeta, TerrainChunkSize},
    vol::{RectVolSize, VolSize, Vox, WriteVol},
};
use tracing::info;
use vek::*;

#[derive(Debug)]
pub enum Error {
    Other(String),
}

pub struct World {
    sim: sim::WorldSim,
    settlements: SettlementGen,
    colors: &'static Colors,
}

impl World {
    pub fn generate(seed: u64) -> Self {
        info!(?seed, "generating world");
        Self {
            sim: sim::WorldSim::generate(seed),
            settlements: SettlementGen::new(seed),
            colors: Colors::load(),
        }
    }

    pub fn sim(&self) -> &sim::WorldSim { &self.sim }

    pub fn settlements(&self) -> &SettlementGen { &self.settlements }

    /// Generate one chunk column: the base terrain fill from the height
    /// model, then every settlement whose geometry reaches into the column.
    pub fn generate_chunk(&self, chunk_pos: Vec2<i32>) -> TerrainChunk {
        let stone = Block::new(BlockKind::Rock, Rgb::new(130, 130, 140));
        let earth = Block::new(BlockKind::Earth, Rgb::new(120, 85, 50));

        let rect = TerrainChunkSize::RECT_SIZE.map(|e| e as i32);
        let chunk_wpos = chunk_pos * rect;
        let meta = TerrainChunkMeta::new(self.sim.get_biome(chunk_wpos + rect / 2));
        let mut chunk = TerrainChunk::filled(Block::empty(), meta);
        let max_z = TerrainChunkSize::SIZE.z as i32;

        for x in 0..rect.x {
            for y in 0..rect.y {
                let wpos2d = chunk_wpos + Vec2::new(x, y);
                let alt = self.sim.get_surface_alt(wpos2d).clamp(1, max_z - 1);
                let surface = match self.sim.get_biome(wpos2d) {
                    BiomeKind::Desert => Block::new(BlockKind::Sand, Rgb::new(207, 189, 130)),
                    BiomeKind::Snowlands => Block::new(BlockKind::Snow, Rgb::new(225, 230, 245)),
                    BiomeKind::Ocean | BiomeKind::Swamp => {
                        Block::new(BlockKind::Earth, Rgb::new(100, 80, 55))
                    },
                    _ => Block::new(BlockKind::Grass, Rgb::new(85, 140, 45)),
                };
                for z in 0..(alt - 3).max(0) {
                    let _ = chunk.set(Vec3::new(x, y, z), stone);
                }
                for z in (alt - 3).max(0)..alt {
                    let _ = chunk.set(Vec3::new(x, y, z), earth);
                }
                let _ = chunk.set(Vec3::new(x, y, alt), surface);
                for z in alt + 1..=(CONFIG.sea_level as i32).min(max_z - 1) {
                    let _ = chunk.set(Vec3::new(x, y, z), Block::water());
                }
            }
        }

        let mut canvas = Canvas::new(chunk_pos, &mut chunk);
        self.settlements.apply_to(&mut canvas, &self.sim, self.colors);
        chunk
    }
}
