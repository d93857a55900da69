use super::{
    contains_point, expand, overlaps,
    road::{self, RoadSegment, MIN_SEG_LEN},
    union,
};
use crate::{
    land::Land,
    util::{seed_expan, DHashMap, RandomField},
};
use common::terrain::BiomeKind;
use rand::prelude::*;
use rand_chacha::ChaChaRng;
use tracing::debug;
use vek::*;

/// Segments at least this long get a second, small-only site near their
/// midpoint.
const MIDPOINT_SITE_LEN: i32 = 22;
/// Lateral distance from a road centreline to a building door.
const DOOR_OFFSET: i32 = road::ROAD_HALF_WIDTH + road::WOBBLE_AMP + 2;
/// Chance for a proposed site to be deferred to the fallback pool.
const SITE_SKIP_CHANCE: f32 = 0.2;
/// The fallback pass keeps forcing houses until this many buildings stand.
const GUARANTEED_BUILDINGS: usize = 5;
/// Half-extent of the well footprint at the settlement centre.
const WELL_RADIUS: i32 = 2;
const FARM_HALF: Vec2<i32> = Vec2 { x: 4, y: 3 };

/// Candidate farm plots around the centre; a deterministic shuffle decides
/// which of them are tried first.
const FARM_SPOTS: [Vec2<i32>; 12] = [
    Vec2 { x: 22, y: 14 },
    Vec2 { x: -20, y: 18 },
    Vec2 { x: 16, y: -24 },
    Vec2 { x: -18, y: -20 },
    Vec2 { x: 30, y: 2 },
    Vec2 { x: -28, y: -4 },
    Vec2 { x: 4, y: 28 },
    Vec2 { x: -2, y: -30 },
    Vec2 { x: 24, y: -10 },
    Vec2 { x: -26, y: 12 },
    Vec2 { x: 10, y: 22 },
    Vec2 { x: -12, y: -26 },
];

const SALT_SIDE_END: u64 = 0x9b71_6d2c_e8f0_43a5;
const SALT_SIDE_MID: u64 = 0x24c8_a1b9_507e_6df3;
const SALT_SKIP: u64 = 0x6e05_f9d4_2b83_c711;
const SALT_KIND: u64 = 0xd13f_82a7_49c6_05eb;
const SALT_FARM_COUNT: u64 = 0x40b2_c75e_91da_3867;
const SALT_FARM_SHUFFLE: u64 = 0xfa86_130b_57c4_2e9d;
const SALT_CROP: u64 = 0x8750_e6a3_1cf2_b049;
const SALT_NOISE: u64 = 0x2ed9_4b07_63a8_f5c1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuildingKind {
    House,
    Hall,
    Church,
    Marketplace,
}

impl BuildingKind {
    /// Footprint as (width along the road, depth away from it). Widths are
    /// odd so the door stays centred on the front wall.
    pub fn footprint(self) -> Vec2<i32> {
        match self {
            BuildingKind::House => Vec2::new(7, 7),
            BuildingKind::Hall => Vec2::new(11, 8),
            BuildingKind::Church => Vec2::new(9, 12),
            BuildingKind::Marketplace => Vec2::new(13, 11),
        }
    }

}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuildingSite {
    /// Door position on the building's front wall, adjacent to the road.
    pub door: Vec2<i32>,
    /// Unit vector from the door towards the road it serves.
    pub facing: Vec2<i32>,
    /// Set for sites on deeper or shorter branches that cannot take the
    /// large unique structures.
    pub small_only: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    pub kind: BuildingKind,
    pub site: BuildingSite,
    pub bounds: Aabr<i32>,
    pub alt: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CropKind {
    Wheat,
    Carrot,
    Potato,
    Pumpkin,
    Melon,
}

impl CropKind {
    /// Fruit crops grow a stem block with the fruit set beside it; cereal
    /// crops are a single stalk block.
    pub fn is_fruit(self) -> bool { matches!(self, CropKind::Pumpkin | CropKind::Melon) }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Farm {
    pub center: Vec2<i32>,
    pub bounds: Aabr<i32>,
    pub alt: i32,
    pub crop: CropKind,
}

/// The full plan of one settlement: everything is derived once from the
/// centre position and the world's hash field, then reused (clipped) by
/// every chunk request that touches it.
#[derive(Clone)]
pub struct Settlement {
    pub origin: Vec2<i32>,
    pub alt: i32,
    pub biome: BiomeKind,
    pub roads: Vec<RoadSegment>,
    pub buildings: Vec<Building>,
    pub farms: Vec<Farm>,
    pub(crate) noise: RandomField,
    pub(crate) bounds: Aabr<i32>,
}

pub fn well_bounds(origin: Vec2<i32>) -> Aabr<i32> {
    Aabr {
        min: origin - WELL_RADIUS,
        max: origin + WELL_RADIUS,
    }
}

impl Settlement {
    pub fn generate(origin: Vec2<i32>, nz: &RandomField, land: &impl Land) -> Self {
        let alt = land.get_surface_alt(origin);
        let biome = land.get_biome(origin);
        let mut roads = road::generate_network(origin, nz);
        let mut road_boxes = Vec::new();
        for arm in &roads {
            arm.for_each(&mut |seg| road_boxes.push(seg.buffered_aabr()));
        }
        let well = well_bounds(origin);
        let (buildings, served) =
            place_buildings(&roads, &road_boxes, well, nz, land, SITE_SKIP_CHANCE);
        let farms = place_farms(origin, &buildings, &road_boxes, well, nz, land);
        let farm_boxes = farms.iter().map(|f| f.bounds).collect::<Vec<_>>();
        road::prune_network(&mut roads, &served, &farm_boxes);

        let mut bounds = expand(well, 2);
        for arm in &roads {
            arm.for_each(&mut |seg| bounds = union(bounds, seg.buffered_aabr()));
        }
        for building in &buildings {
            // The roof overhangs the walls by one block.
            bounds = union(bounds, expand(building.bounds, 1));
        }
        for farm in &farms {
            bounds = union(bounds, farm.bounds);
        }
        debug!(
            ?origin,
            roads = roads.len(),
            buildings = buildings.len(),
            farms = farms.len(),
            "settlement planned"
        );

        Self {
            origin,
            alt,
            biome,
            roads,
            buildings,
            farms,
            noise: nz.salted(SALT_NOISE).salted(origin.x as u64 ^ (origin.y as u64) << 32),
            bounds,
        }
    }

    /// Tight bounds of everything this settlement will ever draw.
    pub fn bounds(&self) -> Aabr<i32> { self.bounds }

    pub fn well_bounds(&self) -> Aabr<i32> { well_bounds(self.origin) }

    pub fn for_each_segment(&self, f: &mut impl FnMut(&RoadSegment)) {
        for arm in &self.roads {
            arm.for_each(f);
        }
    }

    /// Whether settlement geometry claims this column. Uses the actual
    /// computed boxes (plus a small margin), not a circular approximation:
    /// undershooting lets vegetation spawn inside buildings, overshooting
    /// starves placement around the settlement.
    pub fn contains(&self, wpos: Vec2<i32>) -> bool {
        const MARGIN: i32 = 2;
        if !contains_point(expand(self.bounds, MARGIN), wpos) {
            return false;
        }
        if contains_point(expand(self.well_bounds(), MARGIN), wpos)
            || self
                .buildings
                .iter()
                .any(|b| contains_point(expand(b.bounds, MARGIN), wpos))
            || self
                .farms
                .iter()
                .any(|f| contains_point(expand(f.bounds, MARGIN), wpos))
        {
            return true;
        }
        let mut on_road = false;
        self.for_each_segment(&mut |seg| {
            on_road |= contains_point(expand(seg.buffered_aabr(), MARGIN), wpos);
        });
        on_road
    }

    pub fn intersects(&self, area: Aabr<i32>) -> bool { overlaps(self.bounds, area) }
}

struct SiteSpot {
    seg_id: u32,
    dist_along: i32,
    site: BuildingSite,
}

fn collect_sites(roads: &[RoadSegment], nz: &RandomField) -> Vec<SiteSpot> {
    fn walk(seg: &RoadSegment, is_arm: bool, nz: &RandomField, out: &mut Vec<SiteSpot>) {
        if seg.len() >= MIN_SEG_LEN {
            let side = hash_side(nz.salted(SALT_SIDE_END), seg.end);
            out.push(spot(seg, seg.len(), side, !is_arm));
        }
        if seg.len() >= MIDPOINT_SITE_LEN {
            let side = hash_side(nz.salted(SALT_SIDE_MID), seg.end);
            out.push(spot(seg, seg.len() / 2, side, true));
        }
        for child in &seg.children {
            walk(child, false, nz, out);
        }
    }
    let mut spots = Vec::new();
    for arm in roads {
        walk(arm, true, nz, &mut spots);
    }
    spots
}

fn hash_side(nz: RandomField, pos: Vec2<i32>) -> i32 {
    if nz.get(pos, 2) == 0 { 1 } else { -1 }
}

fn spot(seg: &RoadSegment, t: i32, side: i32, small_only: bool) -> SiteSpot {
    let lateral = seg.perp() * side;
    SiteSpot {
        seg_id: seg.id,
        dist_along: t,
        site: BuildingSite {
            door: seg.point_at(t) + lateral * DOOR_OFFSET,
            facing: -lateral,
            small_only,
        },
    }
}

/// Bounding box of a structure whose centred front door is at `door`, facing
/// the road along `facing`.
pub fn building_bounds(kind: BuildingKind, door: Vec2<i32>, facing: Vec2<i32>) -> Aabr<i32> {
    let out = -facing;
    let along = Vec2::new(-facing.y, facing.x);
    let fp = kind.footprint();
    let a = door - along * (fp.x / 2);
    let b = door + along * (fp.x / 2) + out * (fp.y - 1);
    Aabr {
        min: a.map2(b, |a, b| a.min(b)),
        max: a.map2(b, |a, b| a.max(b)),
    }
}

fn try_place(
    kind: BuildingKind,
    spot: &SiteSpot,
    buildings: &mut Vec<Building>,
    served: &mut DHashMap<u32, i32>,
    road_boxes: &[Aabr<i32>],
    well: Aabr<i32>,
    land: &impl Land,
) -> bool {
    let bounds = building_bounds(kind, spot.site.door, spot.site.facing);
    let blocked = buildings.iter().any(|b| overlaps(bounds, b.bounds))
        || road_boxes.iter().any(|r| overlaps(bounds, *r))
        || overlaps(bounds, expand(well, 1));
    if blocked {
        return false;
    }
    let entry = served.entry(spot.seg_id).or_insert(0);
    *entry = (*entry).max(spot.dist_along);
    buildings.push(Building {
        kind,
        site: spot.site,
        bounds,
        alt: land.get_surface_alt(spot.site.door),
    });
    true
}

/// Walk the road tree proposing building sites, assign structure kinds under
/// uniqueness quotas, and resolve collisions. Sites that are skipped or
/// blocked drop into a fallback pool which is drained (houses only) until
/// the pool is empty or enough buildings stand, so an unlucky run of rolls
/// cannot leave the settlement visually empty.
pub(crate) fn place_buildings(
    roads: &[RoadSegment],
    road_boxes: &[Aabr<i32>],
    well: Aabr<i32>,
    nz: &RandomField,
    land: &impl Land,
    skip_chance: f32,
) -> (Vec<Building>, DHashMap<u32, i32>) {
    let spots = collect_sites(roads, nz);
    let mut buildings = Vec::new();
    let mut served = DHashMap::default();
    let mut fallback = Vec::new();
    let (mut hall, mut church, mut market) = (false, false, false);
    for spot in &spots {
        if nz.salted(SALT_SKIP).chance(spot.site.door, skip_chance) {
            fallback.push(spot);
            continue;
        }
        let kind = if spot.site.small_only {
            BuildingKind::House
        } else {
            let roll = nz.salted(SALT_KIND).get(spot.site.door, 100);
            if roll < 7 && !market {
                BuildingKind::Marketplace
            } else if roll < 16 && !church {
                BuildingKind::Church
            } else if roll < 30 && !hall {
                BuildingKind::Hall
            } else {
                BuildingKind::House
            }
        };
        if try_place(kind, spot, &mut buildings, &mut served, road_boxes, well, land) {
            match kind {
                BuildingKind::Hall => hall = true,
                BuildingKind::Church => church = true,
                BuildingKind::Marketplace => market = true,
                BuildingKind::House => {},
            }
        } else {
            fallback.push(spot);
        }
    }
    for spot in fallback {
        if buildings.len() >= GUARANTEED_BUILDINGS {
            break;
        }
        try_place(
            BuildingKind::House,
            spot,
            &mut buildings,
            &mut served,
            road_boxes,
            well,
            land,
        );
    }
    (buildings, served)
}

fn place_farms(
    origin: Vec2<i32>,
    buildings: &[Building],
    road_boxes: &[Aabr<i32>],
    well: Aabr<i32>,
    nz: &RandomField,
    land: &impl Land,
) -> Vec<Farm> {
    let count = 1 + nz.salted(SALT_FARM_COUNT).get(origin, 4) as usize;
    let mut spots = FARM_SPOTS;
    let shuffle_seed = nz.salted(SALT_FARM_SHUFFLE).get(origin, 1 << 32) as u32;
    spots.shuffle(&mut ChaChaRng::from_seed(seed_expan::rng_state(shuffle_seed)));

    let mut farms: Vec<Farm> = Vec::new();
    for rpos in spots {
        if farms.len() >= count {
            break;
        }
        let center = origin + rpos;
        let bounds = Aabr {
            min: center - FARM_HALF,
            max: center + FARM_HALF,
        };
        let blocked = buildings
            .iter()
            .any(|b| overlaps(expand(bounds, 1), b.bounds))
            || road_boxes.iter().any(|r| overlaps(bounds, *r))
            || overlaps(bounds, expand(well, 2))
            || farms.iter().any(|f| overlaps(expand(bounds, 1), f.bounds));
        if blocked {
            continue;
        }
        let crop = match nz.salted(SALT_CROP).get(center, 5) {
            0 => CropKind::Wheat,
            1 => CropKind::Carrot,
            2 => CropKind::Potato,
            3 => CropKind::Pumpkin,
            _ => CropKind::Melon,
        };
        farms.push(Farm {
            center,
            bounds,
            alt: land.get_surface_alt(center),
            crop,
        });
    }
    farms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::settlement::road::Ori;

    struct FlatLand;

    impl Land for FlatLand {
        fn get_alt_approx(&self, _: Vec2<i32>) -> f32 { 60.0 }

        fn get_biome(&self, _: Vec2<i32>) -> BiomeKind { BiomeKind::Grassland }
    }

    fn arm(id: u32, dir: Vec2<i32>, len: i32) -> RoadSegment {
        RoadSegment {
            id,
            start: Vec2::zero(),
            end: dir * len,
            ori: Ori::of(dir),
            wobble_seed: 0,
            children: Vec::new(),
        }
    }

    fn boxes(roads: &[RoadSegment]) -> Vec<Aabr<i32>> {
        let mut out = Vec::new();
        for r in roads {
            r.for_each(&mut |seg| out.push(seg.buffered_aabr()));
        }
        out
    }

    #[test]
    fn door_sits_on_the_front_wall() {
        let door = Vec2::new(10, 5);
        let facing = Vec2::new(0, -1); // road below, building extends north
        let bounds = building_bounds(BuildingKind::House, door, facing);
        assert!(contains_point(bounds, door));
        assert!(!contains_point(bounds, door + facing));
        assert_eq!(bounds.min, Vec2::new(7, 5));
        assert_eq!(bounds.max, Vec2::new(13, 11));
    }

    #[test]
    fn all_sites_skipped_still_yields_houses() {
        // Every site hash-rolls into the fallback pool; the drain pass must
        // still fill the settlement with plain houses.
        let roads = vec![arm(0, Vec2::unit_x(), 40), arm(1, -Vec2::unit_x(), 40)];
        let road_boxes = boxes(&roads);
        let well = well_bounds(Vec2::zero());
        let nz = RandomField::new(1);
        let (buildings, served) =
            place_buildings(&roads, &road_boxes, well, &nz, &FlatLand, 1.0);
        // Two endpoint sites and two midpoint sites, all far apart.
        assert_eq!(buildings.len(), 4);
        assert!(buildings.iter().all(|b| b.kind == BuildingKind::House));
        assert!(served.values().all(|&d| d > 0));
    }

    #[test]
    fn fallback_stops_at_the_guaranteed_count() {
        let roads = vec![
            arm(0, Vec2::unit_x(), 44),
            arm(1, -Vec2::unit_x(), 44),
            arm(2, Vec2::unit_y(), 44),
        ];
        let road_boxes = boxes(&roads);
        let (buildings, _) = place_buildings(
            &roads,
            &road_boxes,
            well_bounds(Vec2::zero()),
            &RandomField::new(7),
            &FlatLand,
            1.0,
        );
        // Six candidate sites, but the drain stops at the guarantee.
        assert_eq!(buildings.len(), GUARANTEED_BUILDINGS);
    }

    #[test]
    fn unique_kinds_are_capped_and_never_small() {
        let nz = RandomField::new(0xA11CE);
        for seed in 0..24u64 {
            let roads = vec![
                arm(0, Vec2::unit_x(), 45),
                arm(1, -Vec2::unit_x(), 45),
                arm(2, Vec2::unit_y(), 45),
                arm(3, -Vec2::unit_y(), 45),
            ];
            let road_boxes = boxes(&roads);
            let (buildings, _) = place_buildings(
                &roads,
                &road_boxes,
                well_bounds(Vec2::zero()),
                &nz.salted(seed),
                &FlatLand,
                0.2,
            );
            for unique in [
                BuildingKind::Hall,
                BuildingKind::Church,
                BuildingKind::Marketplace,
            ] {
                assert!(buildings.iter().filter(|b| b.kind == unique).count() <= 1);
            }
            assert!(buildings
                .iter()
                .filter(|b| b.site.small_only)
                .all(|b| b.kind == BuildingKind::House));
            // No two buildings may ever overlap.
            for (i, a) in buildings.iter().enumerate() {
                for b in &buildings[i + 1..] {
                    assert!(!overlaps(a.bounds, b.bounds));
                }
            }
        }
    }
}
