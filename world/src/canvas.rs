use common::{
    terrain::{Block, TerrainChunk, TerrainChunkSize},
    vol::{ReadVol, RectVolSize, Vox, WriteVol},
};
use vek::*;

/// A single chunk column being generated, addressed in world space. Writes
/// outside the column are silently dropped, which is what lets one settlement
/// plan be rendered into many overlapping chunk requests: every caller draws
/// the whole structure and keeps only its own slice.
pub struct Canvas<'a> {
    wpos: Vec2<i32>,
    chunk: &'a mut TerrainChunk,
}

impl<'a> Canvas<'a> {
    pub fn new(chunk_pos: Vec2<i32>, chunk: &'a mut TerrainChunk) -> Self {
        Self {
            wpos: chunk_pos * TerrainChunkSize::RECT_SIZE.map(|e| e as i32),
            chunk,
        }
    }

    pub fn wpos(&self) -> Vec2<i32> { self.wpos }

    /// World-space bounds of this column, min inclusive, max exclusive.
    pub fn area(&self) -> Aabr<i32> {
        Aabr {
            min: self.wpos,
            max: self.wpos + TerrainChunkSize::RECT_SIZE.map(|e| e as i32),
        }
    }

    pub fn contains(&self, wpos2d: Vec2<i32>) -> bool {
        let area = self.area();
        wpos2d.x >= area.min.x
            && wpos2d.y >= area.min.y
            && wpos2d.x < area.max.x
            && wpos2d.y < area.max.y
    }

    pub fn get(&self, pos: Vec3<i32>) -> Block {
        self.chunk
            .get(Vec3::new(pos.x - self.wpos.x, pos.y - self.wpos.y, pos.z))
            .ok()
            .copied()
            .unwrap_or_else(Block::empty)
    }

    pub fn set(&mut self, pos: Vec3<i32>, block: Block) {
        let _ = self
            .chunk
            .set(Vec3::new(pos.x - self.wpos.x, pos.y - self.wpos.y, pos.z), block);
    }

    pub fn map(&mut self, pos: Vec3<i32>, f: impl FnOnce(Block) -> Block) {
        let _ = self
            .chunk
            .map(Vec3::new(pos.x - self.wpos.x, pos.y - self.wpos.y, pos.z), f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::terrain::{BlockKind, TerrainChunkMeta};

    #[test]
    fn writes_outside_the_column_are_dropped() {
        let mut chunk = TerrainChunk::filled(Block::empty(), TerrainChunkMeta::void());
        let mut canvas = Canvas::new(Vec2::new(2, -1), &mut chunk);
        let inside = Vec3::new(33, -5, 10);
        let outside = Vec3::new(48, -5, 10);
        let rock = Block::new(BlockKind::Rock, Rgb::new(100, 100, 100));
        canvas.set(inside, rock);
        canvas.set(outside, rock);
        assert_eq!(canvas.get(inside), rock);
        assert_eq!(canvas.get(outside), Block::empty());
        assert!(canvas.contains(Vec2::new(33, -5)));
        assert!(!canvas.contains(Vec2::new(48, -5)));
    }
}
