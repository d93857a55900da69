use super::{
    expand, overlaps,
    plan::{Building, BuildingKind, CropKind, Farm, Settlement},
    road::{RoadSegment, ROAD_HALF_WIDTH},
    Colors,
};
use crate::{canvas::Canvas, land::Land, util::RandomPerm};
use common::{
    terrain::{Block, BlockKind},
    vol::Vox,
};
use vek::*;

/// Manhattan reach of scattered flower decorations around the well.
const FLOWER_RADIUS: i32 = 30;
const LAMP_CHANCE: f32 = 0.5;

fn rgb(c: (u8, u8, u8)) -> Rgb<u8> { Rgb::new(c.0, c.1, c.2) }

/// Block choices for one settlement, derived from its biome: a desert
/// village is sandstone and sand, a forest village planks and thatch.
pub(crate) struct Palette {
    pub wall: Block,
    pub support: Block,
    pub roof: Block,
    pub floor: Block,
    pub foundation: Block,
    pub path: Block,
    pub farmland: Block,
    pub lamp: Block,
    pub flower: Block,
    stem: Block,
    crops: [Block; 5],
}

impl Palette {
    pub fn for_biome(biome: common::terrain::BiomeKind, colors: &Colors) -> Self {
        use common::terrain::BiomeKind;
        let mut pal = Self {
            wall: Block::new(BlockKind::Wood, rgb(colors.plank)),
            support: Block::new(BlockKind::Wood, rgb(colors.log)),
            roof: Block::new(BlockKind::Wood, rgb(colors.thatch)),
            floor: Block::new(BlockKind::Wood, rgb(colors.floor)),
            foundation: Block::new(BlockKind::Rock, rgb(colors.stone)),
            path: Block::new(BlockKind::Path, rgb(colors.path_dirt)),
            farmland: Block::new(BlockKind::Farmland, rgb(colors.farmland)),
            lamp: Block::new(BlockKind::Misc, rgb(colors.lamp)),
            flower: Block::new(BlockKind::Plant, rgb(colors.flower)),
            stem: Block::new(BlockKind::Plant, rgb(colors.stem)),
            crops: [
                Block::new(BlockKind::Plant, rgb(colors.wheat)),
                Block::new(BlockKind::Plant, rgb(colors.carrot)),
                Block::new(BlockKind::Plant, rgb(colors.potato)),
                Block::new(BlockKind::Fruit, rgb(colors.pumpkin)),
                Block::new(BlockKind::Fruit, rgb(colors.melon)),
            ],
        };
        match biome {
            BiomeKind::Desert => {
                pal.wall = Block::new(BlockKind::Rock, rgb(colors.sandstone));
                pal.roof = Block::new(BlockKind::Rock, rgb(colors.sandstone));
                pal.path = Block::new(BlockKind::Sand, rgb(colors.path_sand));
            },
            BiomeKind::Snowlands => {
                pal.roof = Block::new(BlockKind::Rock, rgb(colors.stone));
                pal.path = Block::new(BlockKind::Gravel, rgb(colors.path_dirt));
            },
            BiomeKind::Mountain => {
                pal.wall = Block::new(BlockKind::Rock, rgb(colors.stone));
            },
            _ => {},
        }
        pal
    }

    fn crop(&self, crop: CropKind) -> Block {
        self.crops[match crop {
            CropKind::Wheat => 0,
            CropKind::Carrot => 1,
            CropKind::Potato => 2,
            CropKind::Pumpkin => 3,
            CropKind::Melon => 4,
        }]
    }
}

/// Placement predicates over one chunk column. Structure drawing goes
/// through these three rules so that settlements clip cleanly to the column
/// and never stomp terrain features they should flow around.
pub(crate) struct Painter<'a, 'b> {
    pub canvas: &'a mut Canvas<'b>,
}

impl<'a, 'b> Painter<'a, 'b> {
    fn in_column(&self, wpos2d: Vec2<i32>) -> bool { self.canvas.contains(wpos2d) }

    /// Unconditional write.
    fn place_block(&mut self, wpos: Vec3<i32>, block: Block) {
        if self.in_column(wpos.xy()) {
            self.canvas.set(wpos, block);
        }
    }

    /// Write a floor-level block, then back-fill straight down with
    /// foundation blocks until something solid is hit, so structures never
    /// float over dips, caves or water.
    fn place_floor(&mut self, wpos: Vec3<i32>, block: Block, foundation: Block) {
        if !self.in_column(wpos.xy()) {
            return;
        }
        self.canvas.set(wpos, block);
        let mut z = wpos.z - 1;
        while z >= 0 && self.canvas.get(Vec3::new(wpos.x, wpos.y, z)).is_fluid() {
            self.canvas.set(Vec3::new(wpos.x, wpos.y, z), foundation);
            z -= 1;
        }
    }

    /// Write only over ground that a trodden path can claim; existing
    /// structures and water are left alone.
    fn place_path(&mut self, wpos: Vec3<i32>, block: Block) {
        if !self.in_column(wpos.xy()) {
            return;
        }
        if matches!(
            self.canvas.get(wpos).kind(),
            BlockKind::Air
                | BlockKind::Grass
                | BlockKind::Earth
                | BlockKind::Gravel
                | BlockKind::Sand
                | BlockKind::Snow
        ) {
            self.canvas.set(wpos, block);
        }
    }

    /// Write only into open or loose-surface cells; keeps lamps and flowers
    /// from intruding into buildings.
    fn place_decoration(&mut self, wpos: Vec3<i32>, block: Block) {
        if !self.in_column(wpos.xy()) {
            return;
        }
        if matches!(
            self.canvas.get(wpos).kind(),
            BlockKind::Air
                | BlockKind::Sand
                | BlockKind::Snow
                | BlockKind::Gravel
                | BlockKind::Path
        ) {
            self.canvas.set(wpos, block);
        }
    }
}

/// Draw the subset of a settlement plan that intersects the canvas's chunk
/// column. Elements whose padded bounding boxes miss the column are skipped
/// outright; this is what makes one cached plan cheap to reuse across the
/// many chunk requests that touch it.
pub(crate) fn render(plan: &Settlement, canvas: &mut Canvas, land: &impl Land, colors: &Colors) {
    let pal = Palette::for_biome(plan.biome, colors);
    let area = Aabr {
        min: canvas.area().min,
        max: canvas.area().max - 1,
    };
    let mut painter = Painter { canvas };

    if overlaps(expand(plan.well_bounds(), 2), area) {
        draw_well(&mut painter, plan.origin, plan.alt, &pal);
    }
    plan.for_each_segment(&mut |seg| {
        if overlaps(expand(seg.buffered_aabr(), 2), area) {
            draw_road(&mut painter, seg, land, &pal);
        }
    });
    for building in &plan.buildings {
        if overlaps(expand(building.bounds, 1), area) {
            draw_building(&mut painter, building, &pal);
        }
    }
    for farm in &plan.farms {
        if overlaps(farm.bounds, area) {
            draw_farm(&mut painter, farm, &pal);
        }
    }
    draw_decorations(&mut painter, plan, land, &pal, area);
}

fn draw_well(painter: &mut Painter, origin: Vec2<i32>, alt: i32, pal: &Palette) {
    for x in -2..=2 {
        for y in -2..=2 {
            let pos = origin + Vec2::new(x, y);
            let rim = x.abs() == 2 || y.abs() == 2;
            if rim {
                painter.place_floor(Vec3::new(pos.x, pos.y, alt), pal.foundation, pal.foundation);
                if x.abs() == 2 && y.abs() == 2 {
                    for z in alt + 1..=alt + 3 {
                        painter.place_block(Vec3::new(pos.x, pos.y, z), pal.support);
                    }
                } else {
                    painter.place_block(Vec3::new(pos.x, pos.y, alt + 1), pal.foundation);
                }
            } else {
                painter.place_floor(Vec3::new(pos.x, pos.y, alt - 2), pal.foundation, pal.foundation);
                painter.place_block(Vec3::new(pos.x, pos.y, alt - 1), Block::water());
                painter.place_block(Vec3::new(pos.x, pos.y, alt), Block::water());
            }
        }
    }
    for x in -2..=2 {
        for y in -2..=2 {
            painter.place_block(Vec3::new(origin.x + x, origin.y + y, alt + 4), pal.roof);
        }
    }
}

fn draw_road(painter: &mut Painter, seg: &RoadSegment, land: &impl Land, pal: &Palette) {
    for t in 0..=seg.len() {
        let centre = seg.point_at(t) + seg.perp() * seg.wobble_at(t);
        for off in -ROAD_HALF_WIDTH..=ROAD_HALF_WIDTH {
            let col = centre + seg.perp() * off;
            if !painter.in_column(col) {
                continue;
            }
            let alt = land.get_surface_alt(col);
            painter.place_path(Vec3::new(col.x, col.y, alt), pal.path);
        }
    }
    // The odd lamp post at a road's end.
    if RandomPerm::new(seg.wobble_seed).chance(1337, LAMP_CHANCE) {
        let pos = seg.point_at(seg.len()) + seg.perp() * (ROAD_HALF_WIDTH + 1);
        if painter.in_column(pos) {
            let alt = land.get_surface_alt(pos);
            painter.place_decoration(Vec3::new(pos.x, pos.y, alt + 1), pal.support);
            painter.place_decoration(Vec3::new(pos.x, pos.y, alt + 2), pal.lamp);
        }
    }
}

fn draw_building(painter: &mut Painter, building: &Building, pal: &Palette) {
    let Aabr { min, max } = building.bounds;
    let alt = building.alt;
    let (wall_height, walled) = match building.kind {
        BuildingKind::House => (4, true),
        BuildingKind::Hall => (5, true),
        BuildingKind::Church => (5, true),
        BuildingKind::Marketplace => (3, false),
    };

    for x in min.x..=max.x {
        for y in min.y..=max.y {
            painter.place_floor(Vec3::new(x, y, alt), pal.floor, pal.foundation);
        }
    }

    for x in min.x..=max.x {
        for y in min.y..=max.y {
            let edge = x == min.x || x == max.x || y == min.y || y == max.y;
            let corner = (x == min.x || x == max.x) && (y == min.y || y == max.y);
            if !edge {
                continue;
            }
            if corner || walled {
                let block = if corner { pal.support } else { pal.wall };
                for z in alt + 1..=alt + wall_height {
                    painter.place_block(Vec3::new(x, y, z), block);
                }
            }
        }
    }

    // Door opening, two blocks high on the road-facing wall.
    let door = building.site.door;
    for z in alt + 1..=alt + 2 {
        painter.place_block(Vec3::new(door.x, door.y, z), Block::empty());
    }

    // A window at the midpoint of every wall that doesn't hold the door.
    if walled {
        let centre = (min + max) / 2;
        for window in [
            Vec2::new(centre.x, min.y),
            Vec2::new(centre.x, max.y),
            Vec2::new(min.x, centre.y),
            Vec2::new(max.x, centre.y),
        ] {
            if window != door {
                painter.place_block(Vec3::new(window.x, window.y, alt + 2), Block::empty());
            }
        }
    }

    // Stepped roof with a one block overhang.
    let mut level = expand(building.bounds, 1);
    let mut z = alt + wall_height + 1;
    while level.min.x <= level.max.x && level.min.y <= level.max.y {
        for x in level.min.x..=level.max.x {
            for y in level.min.y..=level.max.y {
                painter.place_block(Vec3::new(x, y, z), pal.roof);
            }
        }
        level = Aabr {
            min: level.min + 1,
            max: level.max - 1,
        };
        z += 1;
    }

    match building.kind {
        BuildingKind::Hall => {
            // Interior support pillars under the long roof span.
            let centre = (min + max) / 2;
            let along = Vec2::new(-building.site.facing.y, building.site.facing.x);
            for pillar in [centre - along * 3, centre + along * 3] {
                for z in alt + 1..=alt + wall_height {
                    painter.place_block(Vec3::new(pillar.x, pillar.y, z), pal.support);
                }
            }
        },
        BuildingKind::Church => {
            // Bell tower over the rear of the nave.
            let out = -building.site.facing;
            let tower_centre = door + out * (building.kind.footprint().y - 4);
            let tower = Aabr {
                min: tower_centre - 2,
                max: tower_centre + 2,
            };
            for x in tower.min.x..=tower.max.x {
                for y in tower.min.y..=tower.max.y {
                    let edge = x == tower.min.x || x == tower.max.x || y == tower.min.y || y == tower.max.y;
                    let corner = (x == tower.min.x || x == tower.max.x)
                        && (y == tower.min.y || y == tower.max.y);
                    if edge {
                        for z in alt + wall_height + 1..=alt + wall_height + 6 {
                            painter.place_block(
                                Vec3::new(x, y, z),
                                if corner { pal.support } else { pal.wall },
                            );
                        }
                    }
                    painter.place_block(Vec3::new(x, y, alt + wall_height + 7), pal.roof);
                }
            }
        },
        BuildingKind::Marketplace => {
            // Open stalls: tables ringing the inside of the post line.
            let inner = expand(building.bounds, -2);
            for x in inner.min.x..=inner.max.x {
                for y in inner.min.y..=inner.max.y {
                    let edge = x == inner.min.x || x == inner.max.x || y == inner.min.y || y == inner.max.y;
                    if edge && (x + y).rem_euclid(2) == 0 {
                        painter.place_block(Vec3::new(x, y, alt + 1), pal.wall);
                    }
                }
            }
        },
        BuildingKind::House => {},
    }
}

fn draw_farm(painter: &mut Painter, farm: &Farm, pal: &Palette) {
    let Aabr { min, max } = farm.bounds;
    let alt = farm.alt;
    for x in min.x..=max.x {
        for y in min.y..=max.y {
            let edge = x == min.x || x == max.x || y == min.y || y == max.y;
            let corner = (x == min.x || x == max.x) && (y == min.y || y == max.y);
            if edge {
                painter.place_floor(Vec3::new(x, y, alt), pal.path, pal.foundation);
                if corner {
                    painter.place_block(Vec3::new(x, y, alt + 1), pal.support);
                }
                continue;
            }
            if y == farm.center.y {
                // Irrigation channel down the middle.
                painter.place_floor(Vec3::new(x, y, alt - 1), pal.foundation, pal.foundation);
                painter.place_block(Vec3::new(x, y, alt), Block::water());
                continue;
            }
            painter.place_floor(Vec3::new(x, y, alt), pal.farmland, pal.foundation);
            if farm.crop.is_fruit() {
                let block = if (x + y).rem_euclid(2) == 0 {
                    pal.stem
                } else {
                    pal.crop(farm.crop)
                };
                painter.place_block(Vec3::new(x, y, alt + 1), block);
            } else {
                painter.place_block(Vec3::new(x, y, alt + 1), pal.crop(farm.crop));
            }
        }
    }
}

fn draw_decorations(
    painter: &mut Painter,
    plan: &Settlement,
    land: &impl Land,
    pal: &Palette,
    area: Aabr<i32>,
) {
    for x in area.min.x..=area.max.x {
        for y in area.min.y..=area.max.y {
            let pos = Vec2::new(x, y);
            let dist = (pos - plan.origin).map(|e| e.abs()).sum();
            if !(4..=FLOWER_RADIUS).contains(&dist) {
                continue;
            }
            if plan.noise.chance(pos, 0.02) {
                let alt = land.get_surface_alt(pos);
                painter.place_decoration(Vec3::new(x, y, alt + 1), pal.flower);
            }
        }
    }
}
