pub mod plan;
mod render;
pub mod road;

// Reexports
pub use self::{
    plan::{Building, BuildingKind, BuildingSite, CropKind, Farm, Settlement},
    road::{Ori, RoadSegment},
};

use crate::{
    canvas::Canvas,
    config::CONFIG,
    land::Land,
    site::SpawnRules,
    util::{MemoCache, RandomField, CARDINALS, NEIGHBORS},
};
use common::{terrain::TerrainChunkSize, vol::RectVolSize};
use serde::Deserialize;
use std::sync::Arc;
use vek::*;

/// Edge length of one settlement grid cell, in world blocks. Each cell
/// independently rolls whether it hosts a settlement.
pub const CELL_SIZE: i32 = 96;
/// Minimum Manhattan distance allowed between two settlement centres.
const MIN_SPACING: i32 = 80;
/// Centres keep this far from their cell's border.
const CELL_MARGIN: i32 = 10;
/// Furthest any settlement geometry can reach from its centre. Chunk
/// requests only have to consider the handful of cells within this reach.
pub const MAX_RADIUS: i32 = 112;
/// Distance of the columns probed around a candidate centre when checking
/// that it stands on dry land.
const DRY_PROBE_RADIUS: i32 = 6;

const SALT_EXISTS: u64 = 0x3ea6_1b52_9d04_c7f8;
const SALT_OFFSET_X: u64 = 0x517c_c1b7_2722_0a95;
const SALT_OFFSET_Y: u64 = 0xb492_b66f_be98_f273;
const SALT_PRIORITY: u64 = 0x0ddb_1a5f_c028_746e;

/// Palette manifest for settlement rendering; deserialized from the world
/// style manifest.
#[derive(Clone, Debug, Deserialize)]
pub struct Colors {
    pub plank: (u8, u8, u8),
    pub log: (u8, u8, u8),
    pub stone: (u8, u8, u8),
    pub thatch: (u8, u8, u8),
    pub sandstone: (u8, u8, u8),
    pub floor: (u8, u8, u8),
    pub path_dirt: (u8, u8, u8),
    pub path_sand: (u8, u8, u8),
    pub farmland: (u8, u8, u8),
    pub lamp: (u8, u8, u8),
    pub flower: (u8, u8, u8),
    pub wheat: (u8, u8, u8),
    pub carrot: (u8, u8, u8),
    pub potato: (u8, u8, u8),
    pub pumpkin: (u8, u8, u8),
    pub melon: (u8, u8, u8),
    pub stem: (u8, u8, u8),
}

// Small Aabr helpers, inclusive on both corners (block coordinates).

pub(crate) fn overlaps(a: Aabr<i32>, b: Aabr<i32>) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

pub(crate) fn expand(a: Aabr<i32>, n: i32) -> Aabr<i32> {
    Aabr {
        min: a.min - n,
        max: a.max + n,
    }
}

pub(crate) fn union(a: Aabr<i32>, b: Aabr<i32>) -> Aabr<i32> {
    Aabr {
        min: a.min.map2(b.min, |a, b| a.min(b)),
        max: a.max.map2(b.max, |a, b| a.max(b)),
    }
}

pub(crate) fn contains_point(a: Aabr<i32>, p: Vec2<i32>) -> bool {
    p.x >= a.min.x && p.x <= a.max.x && p.y >= a.min.y && p.y <= a.max.y
}

/// The settlement service: decides which grid cells host settlements, lays
/// each one out exactly once, and renders the cached plans clipped into
/// whichever chunk columns ask for them.
///
/// One instance is created at world-generation startup and shared by every
/// chunk-serving worker; all state besides the immutable seed lives in the
/// two write-once caches.
pub struct SettlementGen {
    nz: RandomField,
    centers: MemoCache<Vec2<i32>, Option<Vec2<i32>>>,
    plans: MemoCache<Vec2<i32>, Arc<Settlement>>,
}

impl SettlementGen {
    pub fn new(seed: u64) -> Self {
        Self {
            nz: RandomField::new(seed),
            centers: MemoCache::default(),
            plans: MemoCache::default(),
        }
    }

    /// Grid cell owning a world position. Floored division keeps the mapping
    /// symmetric across the origin; truncation would silently fold cells -1
    /// and 0 together.
    pub fn cell_at(wpos: Vec2<i32>) -> Vec2<i32> { wpos.map(|e| e.div_euclid(CELL_SIZE)) }

    /// Existence roll and in-cell offset, before suppression and terrain
    /// validation. Pure; the suppression check evaluates it for neighbours
    /// without recursing into their own neighbourhoods.
    fn candidate(&self, cell: Vec2<i32>) -> Option<Vec2<i32>> {
        if self.nz.salted(SALT_EXISTS).get(cell, 4) != 0 {
            return None;
        }
        let off = Vec2::new(
            self.nz
                .salted(SALT_OFFSET_X)
                .range(cell, CELL_MARGIN..CELL_SIZE - CELL_MARGIN),
            self.nz
                .salted(SALT_OFFSET_Y)
                .range(cell, CELL_MARGIN..CELL_SIZE - CELL_MARGIN),
        );
        Some(cell * CELL_SIZE + off)
    }

    fn priority(&self, cell: Vec2<i32>) -> u64 { self.nz.salted(SALT_PRIORITY).get(cell, 1 << 32) }

    /// Whether cell `a`'s claim wins over cell `b`'s when their candidate
    /// centres crowd each other. Lexicographic on (priority, coordinates) so
    /// equal priorities still give both sides the same answer.
    fn beats(&self, a: Vec2<i32>, b: Vec2<i32>) -> bool {
        (self.priority(a), a.x, a.y) < (self.priority(b), b.x, b.y)
    }

    /// World-space centre of the settlement hosted by `cell`, if any.
    /// Cached; safe to call from many threads at once.
    pub fn center(&self, cell: Vec2<i32>, land: &impl Land) -> Option<Vec2<i32>> {
        self.centers
            .get_or_compute(cell, |cell| self.compute_center(cell, land))
    }

    fn compute_center(&self, cell: Vec2<i32>, land: &impl Land) -> Option<Vec2<i32>> {
        let wpos = self.candidate(cell)?;
        // Neighbour suppression: when two candidate centres crowd each
        // other, both cells independently agree on the survivor.
        for rpos in NEIGHBORS {
            let other = cell + rpos;
            if let Some(other_wpos) = self.candidate(other) {
                let dist = (wpos - other_wpos).map(|e| e.abs()).sum();
                if dist < MIN_SPACING && self.beats(other, cell) {
                    return None;
                }
            }
        }
        // No settlements floating over lakes or the sea.
        let dry = |rpos: Vec2<i32>| land.get_alt_approx(wpos + rpos) > CONFIG.sea_level;
        if !dry(Vec2::zero()) || CARDINALS.iter().any(|dir| !dry(*dir * DRY_PROBE_RADIUS)) {
            return None;
        }
        Some(wpos)
    }

    /// The full cached plan for a cell's settlement, laid out on first
    /// request.
    pub fn plan(&self, cell: Vec2<i32>, land: &impl Land) -> Option<Arc<Settlement>> {
        let wpos = self.center(cell, land)?;
        Some(
            self.plans
                .get_or_compute(cell, |_| Arc::new(Settlement::generate(wpos, &self.nz, land))),
        )
    }

    /// Cells whose settlement could reach into `area` (inclusive bounds).
    fn cells_in(area: Aabr<i32>) -> impl Iterator<Item = Vec2<i32>> {
        let min = Self::cell_at(area.min - MAX_RADIUS);
        let max = Self::cell_at(area.max + MAX_RADIUS);
        (min.x..=max.x).flat_map(move |x| (min.y..=max.y).map(move |y| Vec2::new(x, y)))
    }

    /// Write every settlement that intersects the canvas's chunk column into
    /// it. The canvas clips; the same plans serve every neighbouring chunk.
    pub fn apply_to(
        &self,
        canvas: &mut Canvas,
        land: &impl Land,
        colors: &crate::site::Colors,
    ) {
        let area = Aabr {
            min: canvas.area().min,
            max: canvas.area().max - 1,
        };
        for cell in Self::cells_in(area) {
            if let Some(plan) = self.plan(cell, land) {
                if plan.intersects(area) {
                    render::render(&plan, canvas, land, &colors.settlement);
                }
            }
        }
    }

    /// Whether a column is claimed by settlement geometry (actual structure,
    /// road and well boxes, with a small margin). Other generation layers
    /// use this to keep vegetation and the like out of villages.
    pub fn is_in_settlement(&self, wpos: Vec2<i32>, land: &impl Land) -> bool {
        let point = Aabr {
            min: wpos,
            max: wpos,
        };
        Self::cells_in(point)
            .filter_map(|cell| self.plan(cell, land))
            .any(|plan| plan.contains(wpos))
    }

    /// Whether any settlement geometry reaches into the given chunk column.
    pub fn chunk_intersects_settlement(&self, chunk_pos: Vec2<i32>, land: &impl Land) -> bool {
        let wpos = chunk_pos * TerrainChunkSize::RECT_SIZE.map(|e| e as i32);
        let area = Aabr {
            min: wpos,
            max: wpos + TerrainChunkSize::RECT_SIZE.map(|e| e as i32) - 1,
        };
        Self::cells_in(area)
            .filter_map(|cell| self.plan(cell, land))
            .any(|plan| plan.intersects(area))
    }

    pub fn spawn_rules(&self, wpos: Vec2<i32>, land: &impl Land) -> SpawnRules {
        SpawnRules {
            trees: !self.is_in_settlement(wpos, land),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::terrain::BiomeKind;

    struct FlatLand;

    impl Land for FlatLand {
        fn get_alt_approx(&self, _: Vec2<i32>) -> f32 { 60.0 }

        fn get_biome(&self, _: Vec2<i32>) -> BiomeKind { BiomeKind::Grassland }
    }

    /// Everything below the water line.
    struct DrownedLand;

    impl Land for DrownedLand {
        fn get_alt_approx(&self, _: Vec2<i32>) -> f32 { 10.0 }

        fn get_biome(&self, _: Vec2<i32>) -> BiomeKind { BiomeKind::Ocean }
    }

    const SEED: u64 = 1337;

    #[test]
    fn cell_indexing_floors_negative_coordinates() {
        assert_eq!(SettlementGen::cell_at(Vec2::new(-17, -17)), Vec2::new(-1, -1));
        assert_eq!(SettlementGen::cell_at(Vec2::new(-96, 95)), Vec2::new(-1, 0));
        assert_eq!(SettlementGen::cell_at(Vec2::new(-97, 96)), Vec2::new(-2, 1));
        assert_eq!(SettlementGen::cell_at(Vec2::new(0, 0)), Vec2::zero());
    }

    #[test]
    fn centers_are_deterministic_across_fresh_instances() {
        let a = SettlementGen::new(SEED);
        let b = SettlementGen::new(SEED);
        for x in -12..12 {
            for y in -12..12 {
                let cell = Vec2::new(x, y);
                let first = a.center(cell, &FlatLand);
                // Repeated and cross-instance calls agree bit for bit.
                assert_eq!(first, a.center(cell, &FlatLand));
                assert_eq!(first, b.center(cell, &FlatLand));
            }
        }
    }

    #[test]
    fn suppression_is_symmetric() {
        let gen = SettlementGen::new(SEED);
        for x in -20..20 {
            for y in -20..20 {
                let cell = Vec2::new(x, y);
                for rpos in NEIGHBORS {
                    let other = cell + rpos;
                    assert_ne!(gen.beats(cell, other), gen.beats(other, cell));
                }
            }
        }
    }

    #[test]
    fn crowded_candidates_never_both_survive() {
        let gen = SettlementGen::new(SEED);
        let mut found_close_pair = false;
        for x in -30..30 {
            for y in -30..30 {
                let cell = Vec2::new(x, y);
                let (Some(a), Some(b)) = (
                    gen.candidate(cell),
                    gen.candidate(cell + Vec2::unit_x()),
                ) else {
                    continue;
                };
                if (a - b).map(|e| e.abs()).sum() < MIN_SPACING {
                    found_close_pair = true;
                    let left = gen.center(cell, &FlatLand);
                    let right = gen.center(cell + Vec2::unit_x(), &FlatLand);
                    assert!(
                        left.is_none() || right.is_none(),
                        "both of {:?} and neighbour survived while crowding",
                        cell
                    );
                }
            }
        }
        assert!(found_close_pair, "scan range produced no crowded pair");
    }

    #[test]
    fn surviving_neighbours_keep_their_distance() {
        let gen = SettlementGen::new(SEED);
        for x in -20..20 {
            for y in -20..20 {
                let cell = Vec2::new(x, y);
                let Some(here) = gen.center(cell, &FlatLand) else {
                    continue;
                };
                for rpos in NEIGHBORS {
                    if let Some(there) = gen.center(cell + rpos, &FlatLand) {
                        assert!((here - there).map(|e| e.abs()).sum() >= MIN_SPACING);
                    }
                }
            }
        }
    }

    #[test]
    fn underwater_terrain_suppresses_settlements() {
        let dry = SettlementGen::new(SEED);
        let wet = SettlementGen::new(SEED);
        let cell = (0..400)
            .map(|i| Vec2::new(i % 20, i / 20))
            .find(|&cell| dry.center(cell, &FlatLand).is_some())
            .expect("no settlement in scan range");
        // Same cell, same rolls, but the land is below the water line.
        assert_eq!(wet.center(cell, &DrownedLand), None);
    }

    #[test]
    fn plans_are_cached_and_write_once() {
        let gen = SettlementGen::new(SEED);
        let cell = (0..400)
            .map(|i| Vec2::new(i % 20, i / 20))
            .find(|&cell| gen.center(cell, &FlatLand).is_some())
            .expect("no settlement in scan range");
        let first = gen.plan(cell, &FlatLand).unwrap();
        let second = gen.plan(cell, &FlatLand).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn plan_invariants_hold() {
        let gen = SettlementGen::new(SEED);
        let mut seen = 0;
        for x in -8..8 {
            for y in -8..8 {
                let cell = Vec2::new(x, y);
                let Some(plan) = gen.plan(cell, &FlatLand) else {
                    continue;
                };
                seen += 1;

                assert!((2..=4).contains(&plan.roads.len()));
                assert!(plan.farms.len() <= 4);

                // No two building boxes may intersect, and no building may
                // intersect a road's buffered box.
                for (i, a) in plan.buildings.iter().enumerate() {
                    for b in &plan.buildings[i + 1..] {
                        assert!(!overlaps(a.bounds, b.bounds));
                    }
                    let mut on_road = false;
                    plan.for_each_segment(&mut |seg| {
                        on_road |= overlaps(a.bounds, seg.buffered_aabr());
                    });
                    assert!(!on_road, "building intersects a road at {:?}", cell);
                }
                for unique in [
                    BuildingKind::Hall,
                    BuildingKind::Church,
                    BuildingKind::Marketplace,
                ] {
                    assert!(plan.buildings.iter().filter(|b| b.kind == unique).count() <= 1);
                }

                // Everything the settlement draws stays within its
                // advertised reach.
                let bounds = plan.bounds();
                assert!(bounds.min.x >= plan.origin.x - MAX_RADIUS);
                assert!(bounds.min.y >= plan.origin.y - MAX_RADIUS);
                assert!(bounds.max.x <= plan.origin.x + MAX_RADIUS);
                assert!(bounds.max.y <= plan.origin.y + MAX_RADIUS);
            }
        }
        assert!(seen > 10, "only {} settlements in scan range", seen);
    }

    #[test]
    fn queries_track_actual_geometry() {
        let gen = SettlementGen::new(SEED);
        let cell = (0..400)
            .map(|i| Vec2::new(i % 20, i / 20))
            .find(|&cell| gen.center(cell, &FlatLand).is_some())
            .expect("no settlement in scan range");
        let plan = gen.plan(cell, &FlatLand).unwrap();

        // The well always claims the centre.
        assert!(gen.is_in_settlement(plan.origin, &FlatLand));
        assert!(!gen.spawn_rules(plan.origin, &FlatLand).trees);
        let centre_chunk = plan.origin.map(|e| e.div_euclid(16));
        assert!(gen.chunk_intersects_settlement(centre_chunk, &FlatLand));

        // Every building interior is claimed too.
        for building in &plan.buildings {
            let inside = (building.bounds.min + building.bounds.max) / 2;
            assert!(gen.is_in_settlement(inside, &FlatLand));
        }
    }
}
