use common::terrain::BiomeKind;
use vek::*;

/// The terrain the settlement generator builds on, reduced to the two
/// questions it ever asks. The real world simulation implements this; tests
/// substitute flat or under-water stand-ins.
///
/// Implementations must be deterministic: the generator caches values derived
/// from these answers and re-derives geometry from them chunk by chunk, so an
/// implementation that answers differently for the same position would tear
/// settlements apart along chunk boundaries.
pub trait Land {
    /// Approximate surface altitude (z of the highest solid block) at a
    /// column.
    fn get_alt_approx(&self, wpos: Vec2<i32>) -> f32;

    /// Floor-level biome classification at a column.
    fn get_biome(&self, wpos: Vec2<i32>) -> BiomeKind;

    fn get_surface_alt(&self, wpos: Vec2<i32>) -> i32 { self.get_alt_approx(wpos).floor() as i32 }
}

impl<'a, T: Land> Land for &'a T {
    fn get_alt_approx(&self, wpos: Vec2<i32>) -> f32 { (*self).get_alt_approx(wpos) }

    fn get_biome(&self, wpos: Vec2<i32>) -> BiomeKind { (*self).get_biome(wpos) }
}
