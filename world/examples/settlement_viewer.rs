//! Prints an ASCII plan of the settlement nearest the origin.
//!
//! Usage: `cargo run --example settlement_viewer [seed]`

use skarn_world::{site::settlement::Settlement, World};
use vek::*;

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1337);
    let world = World::generate(seed);
    let settlements = world.settlements();

    let mut nearest: Option<Arc2> = None;
    for x in -16..16 {
        for y in -16..16 {
            if let Some(plan) = settlements.plan(Vec2::new(x, y), world.sim()) {
                let dist = plan.origin.map(|e| e.abs()).sum();
                if nearest.as_ref().map_or(true, |(_, d)| dist < *d) {
                    nearest = Some((plan, dist));
                }
            }
        }
    }
    let Some((plan, _)) = nearest else {
        println!("no settlements within 16 cells of the origin (seed {})", seed);
        return;
    };

    println!(
        "seed {}: settlement at {:?} ({:?}), {} road arms, {} buildings, {} farms",
        seed,
        plan.origin,
        plan.biome,
        plan.roads.len(),
        plan.buildings.len(),
        plan.farms.len(),
    );
    let bounds = plan.bounds();
    for y in (bounds.min.y..=bounds.max.y).rev() {
        let row: String = (bounds.min.x..=bounds.max.x)
            .map(|x| glyph(&plan, Vec2::new(x, y)))
            .collect();
        println!("{}", row);
    }
    println!("W well  H house  L hall  C church  M marketplace  ~ farm  + road");
}

type Arc2 = (std::sync::Arc<Settlement>, i32);

fn inside(aabr: Aabr<i32>, p: Vec2<i32>) -> bool {
    p.x >= aabr.min.x && p.x <= aabr.max.x && p.y >= aabr.min.y && p.y <= aabr.max.y
}

fn glyph(plan: &Settlement, pos: Vec2<i32>) -> char {
    use skarn_world::site::settlement::BuildingKind;
    if inside(plan.well_bounds(), pos) {
        return 'W';
    }
    for building in &plan.buildings {
        if inside(building.bounds, pos) {
            return match building.kind {
                BuildingKind::House => 'H',
                BuildingKind::Hall => 'L',
                BuildingKind::Church => 'C',
                BuildingKind::Marketplace => 'M',
            };
        }
    }
    for farm in &plan.farms {
        if inside(farm.bounds, pos) {
            return '~';
        }
    }
    let mut road = false;
    plan.for_each_segment(&mut |seg| {
        let aabr = seg.aabr();
        road |= inside(
            Aabr {
                min: aabr.min - 1,
                max: aabr.max + 1,
            },
            pos,
        );
    });
    if road { '+' } else { '.' }
}
