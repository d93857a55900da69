use super::{expand, overlaps};
use crate::util::{DHashMap, RandomField, RandomPerm, CARDINALS};
use std::ops::Range;
use vek::*;

/// Shortest segment worth keeping; recursion abandons anything below this.
pub const MIN_SEG_LEN: i32 = 10;
/// Road branching starts at this depth at the settlement centre and
/// decrements per fork level.
pub const ROOT_DEPTH: i32 = 2;
/// Minimum gap kept between two road segments that are not parent and child.
pub const CLEARANCE: i32 = 12;
/// Half-width of the rendered road surface, either side of the centreline.
pub const ROAD_HALF_WIDTH: i32 = 1;
/// Maximum lateral drift of the rendered path. Collision logic ignores it.
pub const WOBBLE_AMP: i32 = 2;

const ARM_LEN: Range<i32> = 24..46;
const BRANCH_LEN: Range<i32> = 14..29;
const ARM_CHANCE: f32 = 0.75;
const CHILD_CHANCE: f32 = 0.55;
const FORK_AT: Range<i32> = 40..81;
const ARM_STUB_LEN: i32 = 6;
const PRUNE_MARGIN: i32 = 2;
const WOBBLE_NODE_SPACING: i32 = 6;

const SALT_ARM_ROLL: u64 = 0x62cb_06f5_8f8c_3f11;
const SALT_ARM_AXIS: u64 = 0xe4b1_5e04_9012_77d3;
const SALT_ARM_LEN: u64 = 0x1a0d_9c2b_6a4f_0be5;
const SALT_CHILD_ROLL: u64 = 0x8f3a_41c6_d7e2_5099;
const SALT_FORK: u64 = 0x3356_dd1f_42a8_b6c7;
const SALT_SIDE: u64 = 0xa90c_27e6_31f4_88bd;
const SALT_BRANCH_LEN: u64 = 0x7d45_b3a1_ce80_2629;
const SALT_WOBBLE: u64 = 0xc2f1_9e58_0b67_d41b;

/// Cardinal orientation of an axis-aligned road segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ori {
    East,
    North,
}

impl Ori {
    pub fn of(dir: Vec2<i32>) -> Self {
        if dir.x != 0 { Ori::East } else { Ori::North }
    }

    pub fn flip(self) -> Self {
        match self {
            Ori::East => Ori::North,
            Ori::North => Ori::East,
        }
    }

    pub fn dir(self) -> Vec2<i32> {
        match self {
            Ori::East => Vec2::unit_x(),
            Ori::North => Vec2::unit_y(),
        }
    }
}

/// One axis-aligned stretch of road. Segments form a strict owned tree rooted
/// at the settlement centre; children fork off perpendicular to their parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoadSegment {
    pub id: u32,
    pub start: Vec2<i32>,
    pub end: Vec2<i32>,
    pub ori: Ori,
    pub wobble_seed: u32,
    pub children: Vec<RoadSegment>,
}

impl RoadSegment {
    pub fn len(&self) -> i32 { (self.end - self.start).sum().abs() }

    /// Unit direction along the segment, derived from the stored orientation
    /// and the sign of the endpoint delta.
    pub fn dir(&self) -> Vec2<i32> { self.ori.dir() * (self.end - self.start).sum().signum() }

    pub fn perp(&self) -> Vec2<i32> {
        let d = self.dir();
        Vec2::new(-d.y, d.x)
    }

    pub fn point_at(&self, t: i32) -> Vec2<i32> { self.start + self.dir() * t }

    /// Signed distance of an on-axis point along the segment from its start.
    pub fn dist_along(&self, p: Vec2<i32>) -> i32 { ((p - self.start) * self.dir()).sum() }

    /// Tight bounding box of the centreline, inclusive on both corners.
    pub fn aabr(&self) -> Aabr<i32> {
        Aabr {
            min: self.start.map2(self.end, |a, b| a.min(b)),
            max: self.start.map2(self.end, |a, b| a.max(b)),
        }
    }

    /// Bounding box of everything the rendered road can touch, wobble
    /// included. Buildings and farms must stay clear of this.
    pub fn buffered_aabr(&self) -> Aabr<i32> {
        expand(self.aabr(), ROAD_HALF_WIDTH + WOBBLE_AMP)
    }

    /// Lateral offset of the rendered path `t` blocks along the segment.
    /// Piecewise-linear drift between hash nodes, tapered to zero at both
    /// ends so junctions stay aligned. Purely visual; never part of any
    /// collision test.
    pub fn wobble_at(&self, t: i32) -> i32 {
        let perm = RandomPerm::new(self.wobble_seed);
        let node = |k: i32| (perm.get(k as u32) % (2 * WOBBLE_AMP as u32 + 1)) as i32 - WOBBLE_AMP;
        let k = t.div_euclid(WOBBLE_NODE_SPACING);
        let f = t.rem_euclid(WOBBLE_NODE_SPACING);
        let w = (node(k) * (WOBBLE_NODE_SPACING - f) + node(k + 1) * f
            + WOBBLE_NODE_SPACING / 2)
            / WOBBLE_NODE_SPACING;
        let edge = t.min(self.len() - t).max(0);
        if edge < 3 { w * edge / 3 } else { w }
    }

    pub fn for_each(&self, f: &mut impl FnMut(&RoadSegment)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }
}

/// Grow the road network for a settlement centred at `origin`: 2-4 cardinal
/// arms, each recursively forking perpendicular branches. Determinism comes
/// entirely from `nz`; no call-order or shared state is involved.
pub fn generate_network(origin: Vec2<i32>, nz: &RandomField) -> Vec<RoadSegment> {
    let mut dirs = CARDINALS
        .iter()
        .enumerate()
        .filter(|&(i, _)| nz.salted(SALT_ARM_ROLL).salted(i as u64).chance(origin, ARM_CHANCE))
        .map(|(_, dir)| *dir)
        .collect::<Vec<_>>();
    if dirs.len() < 2 {
        // Always at least a crossing through the well.
        let dir = if nz.salted(SALT_ARM_AXIS).get(origin, 2) == 0 {
            Vec2::unit_x()
        } else {
            Vec2::unit_y()
        };
        dirs = vec![dir, -dir];
    }

    let mut committed = Vec::new();
    let mut next_id = 0;
    let mut arms = Vec::new();
    for (i, dir) in dirs.into_iter().enumerate() {
        let len = nz.salted(SALT_ARM_LEN).salted(i as u64).range(origin, ARM_LEN);
        if let Some(arm) = grow(origin, dir, len, ROOT_DEPTH, &mut committed, None, &mut next_id, nz)
        {
            arms.push(arm);
        }
    }
    arms
}

#[allow(clippy::too_many_arguments)]
fn grow(
    start: Vec2<i32>,
    dir: Vec2<i32>,
    len: i32,
    depth: i32,
    committed: &mut Vec<Aabr<i32>>,
    parent: Option<usize>,
    next_id: &mut u32,
    nz: &RandomField,
) -> Option<RoadSegment> {
    if depth <= 0 || len < MIN_SEG_LEN {
        return None;
    }
    let end = start + dir * len;
    let aabr = Aabr {
        min: start.map2(end, |a, b| a.min(b)),
        max: start.map2(end, |a, b| a.max(b)),
    };
    // Sub-branches keep clear of every other committed segment; overlapping
    // the segment they fork from is expected and allowed. The initial arms
    // radiating from the well are exempt from checking each other.
    if depth < ROOT_DEPTH
        && committed
            .iter()
            .enumerate()
            .any(|(i, other)| Some(i) != parent && overlaps(aabr, expand(*other, CLEARANCE)))
    {
        return None;
    }
    let idx = committed.len();
    committed.push(aabr);

    let id = *next_id;
    *next_id += 1;
    let mut seg = RoadSegment {
        id,
        start,
        end,
        ori: Ori::of(dir),
        wobble_seed: nz.salted(SALT_WOBBLE).get(end, 1 << 32) as u32,
        children: Vec::new(),
    };
    for i in 0..2u64 {
        if !nz.salted(SALT_CHILD_ROLL).salted(i).chance(end, CHILD_CHANCE) {
            continue;
        }
        let fork_at = len * nz.salted(SALT_FORK).salted(i).range(end, FORK_AT) / 100;
        let fork = start + dir * fork_at;
        let side = if nz.salted(SALT_SIDE).salted(i).get(fork, 2) == 0 { 1 } else { -1 };
        let child_dir = Vec2::new(-dir.y, dir.x) * side;
        let child_len = nz.salted(SALT_BRANCH_LEN).salted(i).range(fork, BRANCH_LEN);
        if let Some(child) = grow(
            fork,
            child_dir,
            child_len,
            depth - 1,
            committed,
            Some(idx),
            next_id,
            nz,
        ) {
            seg.children.push(child);
        }
    }
    Some(seg)
}

/// Shrink every branch to the minimum length that still reaches everything
/// it serves (child forks, building doors, adjacent farms) plus a small
/// margin, and drop branches that serve nothing. Arms that serve nothing are
/// kept as short stubs so the crossing at the well survives.
pub fn prune_network(
    arms: &mut Vec<RoadSegment>,
    served: &DHashMap<u32, i32>,
    farms: &[Aabr<i32>],
) {
    arms.retain_mut(|arm| prune(arm, true, served, farms));
}

fn prune(
    seg: &mut RoadSegment,
    is_arm: bool,
    served: &DHashMap<u32, i32>,
    farms: &[Aabr<i32>],
) -> bool {
    seg.children.retain_mut(|child| prune(child, false, served, farms));
    let mut needed = seg
        .children
        .iter()
        .map(|child| seg.dist_along(child.start))
        .max()
        .unwrap_or(0);
    if let Some(&d) = served.get(&seg.id) {
        needed = needed.max(d);
    }
    for farm in farms {
        if let Some(d) = reach_into(seg, *farm) {
            needed = needed.max(d);
        }
    }
    if needed == 0 {
        if is_arm {
            seg.end = seg.start + seg.dir() * ARM_STUB_LEN.min(seg.len());
        }
        return is_arm;
    }
    let new_len = (needed + PRUNE_MARGIN).min(seg.len());
    seg.end = seg.start + seg.dir() * new_len;
    true
}

/// Distance along the segment needed to stay adjacent to `bounds`, if the
/// segment passes next to it at all.
fn reach_into(seg: &RoadSegment, bounds: Aabr<i32>) -> Option<i32> {
    let b = expand(bounds, PRUNE_MARGIN);
    if !overlaps(seg.buffered_aabr(), b) {
        return None;
    }
    let d = seg.dir();
    let reach = if d.x > 0 {
        b.max.x - seg.start.x
    } else if d.x < 0 {
        seg.start.x - b.min.x
    } else if d.y > 0 {
        b.max.y - seg.start.y
    } else {
        seg.start.y - b.min.y
    };
    Some(reach.clamp(0, seg.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> RandomField { RandomField::new(0x5EED) }

    fn flatten(arms: &[RoadSegment]) -> Vec<RoadSegment> {
        let mut all = Vec::new();
        for arm in arms {
            arm.for_each(&mut |seg| all.push(seg.clone()));
        }
        all
    }

    #[test]
    fn deterministic_networks() {
        let nz = field();
        for i in 0..32 {
            let origin = Vec2::new(i * 977 - 7000, -i * 1361 + 3000);
            assert_eq!(generate_network(origin, &nz), generate_network(origin, &nz));
        }
    }

    #[test]
    fn always_two_to_four_arms() {
        let nz = field();
        for i in 0..256 {
            let origin = Vec2::new(i * 733, i * -519 + 11);
            let arms = generate_network(origin, &nz);
            assert!((2..=4).contains(&arms.len()), "{} arms at {:?}", arms.len(), origin);
            for arm in &arms {
                assert_eq!(arm.start, origin);
                assert!((ARM_LEN.start..ARM_LEN.end).contains(&arm.len()));
            }
        }
    }

    #[test]
    fn branches_respect_clearance() {
        let nz = field();
        for i in 0..64 {
            let origin = Vec2::new(-i * 891, i * 1223);
            let arms = generate_network(origin, &nz);
            let all = flatten(&arms);
            // Build the parent relation from the trees.
            let mut parent_of = std::collections::HashMap::new();
            for arm in &arms {
                arm.for_each(&mut |seg| {
                    for child in &seg.children {
                        parent_of.insert(child.id, seg.id);
                    }
                });
            }
            let arm_ids: Vec<_> = arms.iter().map(|a| a.id).collect();
            for a in &all {
                for b in &all {
                    if a.id >= b.id {
                        continue;
                    }
                    let related = parent_of.get(&a.id) == Some(&b.id)
                        || parent_of.get(&b.id) == Some(&a.id);
                    let both_arms = arm_ids.contains(&a.id) && arm_ids.contains(&b.id);
                    if related || both_arms {
                        continue;
                    }
                    assert!(
                        !overlaps(a.aabr(), expand(b.aabr(), CLEARANCE)),
                        "segments {} and {} too close at {:?}",
                        a.id,
                        b.id,
                        origin
                    );
                }
            }
        }
    }

    #[test]
    fn wobble_is_bounded_and_tapered() {
        let nz = field();
        let arms = generate_network(Vec2::zero(), &nz);
        for seg in flatten(&arms) {
            assert_eq!(seg.wobble_at(0), 0);
            assert_eq!(seg.wobble_at(seg.len()), 0);
            for t in 0..=seg.len() {
                assert!(seg.wobble_at(t).abs() <= WOBBLE_AMP);
                // Repeatable: the drift is a pure function of the seed.
                assert_eq!(seg.wobble_at(t), seg.wobble_at(t));
            }
        }
    }

    #[test]
    fn pruning_shrinks_to_what_is_served() {
        let mk = |id, start: Vec2<i32>, dir: Vec2<i32>, len: i32, children| RoadSegment {
            id,
            start,
            end: start + dir * len,
            ori: Ori::of(dir),
            wobble_seed: 0,
            children,
        };
        let child = mk(1, Vec2::new(20, 0), Vec2::unit_y(), 20, vec![]);
        let mut arms = vec![
            mk(0, Vec2::zero(), Vec2::unit_x(), 40, vec![child]),
            mk(2, Vec2::zero(), -Vec2::unit_x(), 40, vec![]),
        ];
        let mut served = DHashMap::default();
        // A building door 10 blocks along the child.
        served.insert(1, 10);
        prune_network(&mut arms, &served, &[]);

        assert_eq!(arms.len(), 2);
        // Arm keeps reaching the fork (20) plus margin.
        assert_eq!(arms[0].len(), 22);
        // Child shrinks to its served door plus margin.
        assert_eq!(arms[0].children[0].len(), 12);
        // The unused opposite arm survives only as a stub.
        assert_eq!(arms[1].len(), 6);
    }

    #[test]
    fn pruning_drops_unserved_branches() {
        let mk = |id, start: Vec2<i32>, dir: Vec2<i32>, len: i32, children| RoadSegment {
            id,
            start,
            end: start + dir * len,
            ori: Ori::of(dir),
            wobble_seed: 0,
            children,
        };
        let child = mk(1, Vec2::new(15, 0), Vec2::unit_y(), 18, vec![]);
        let mut arms = vec![mk(0, Vec2::zero(), Vec2::unit_x(), 30, vec![child])];
        let mut served = DHashMap::default();
        served.insert(0, 28);
        prune_network(&mut arms, &served, &[]);

        assert!(arms[0].children.is_empty());
        assert_eq!(arms[0].len(), 30); // 28 + 2, capped at the original length
    }

    #[test]
    fn farms_keep_roads_alive() {
        let mk = |id, start: Vec2<i32>, dir: Vec2<i32>, len: i32| RoadSegment {
            id,
            start,
            end: start + dir * len,
            ori: Ori::of(dir),
            wobble_seed: 0,
            children: vec![],
        };
        let mut arms = vec![mk(0, Vec2::zero(), Vec2::unit_x(), 40)];
        let farm = Aabr {
            min: Vec2::new(24, 4),
            max: Vec2::new(32, 10),
        };
        prune_network(&mut arms, &DHashMap::default(), &[farm]);
        // Reaches the far edge of the farm (32) plus margins, capped at 40.
        assert_eq!(arms.len(), 1);
        assert!(arms[0].len() >= 32 && arms[0].len() <= 40);
    }
}
