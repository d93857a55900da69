use crate::{config::CONFIG, land::Land};
use common::terrain::BiomeKind;
use noise::{BasicMulti, MultiFractal, NoiseFn, Perlin, Seedable};
use vek::*;

/// Minimal height and climate model. The settlement generator only ever sees
/// this through the `Land` trait; everything here can be swapped for the full
/// terrain pipeline without touching settlement code.
pub struct WorldSim {
    pub seed: u64,
    alt_nz: BasicMulti,
    temp_nz: Perlin,
    humid_nz: Perlin,
}

impl WorldSim {
    #[allow(clippy::identity_op)]
    pub fn generate(seed: u64) -> Self {
        let nseed = seed as u32;
        Self {
            seed,
            alt_nz: BasicMulti::new().set_octaves(3).set_seed(nseed + 0),
            temp_nz: Perlin::new().set_seed(nseed + 1),
            humid_nz: Perlin::new().set_seed(nseed + 2),
        }
    }

    fn temp(&self, wpos: Vec2<i32>) -> f64 {
        let wposf = wpos.map(|e| e as f64);
        self.temp_nz.get((wposf / 1024.0).into_array())
    }

    fn humidity(&self, wpos: Vec2<i32>) -> f64 {
        let wposf = wpos.map(|e| e as f64);
        self.humid_nz.get((wposf / 768.0).into_array())
    }
}

impl Land for WorldSim {
    fn get_alt_approx(&self, wpos: Vec2<i32>) -> f32 {
        let wposf = wpos.map(|e| e as f64);
        (52.0 + self.alt_nz.get((wposf / 420.0).into_array()) * 26.0) as f32
    }

    fn get_biome(&self, wpos: Vec2<i32>) -> BiomeKind {
        let alt = self.get_alt_approx(wpos);
        let temp = self.temp(wpos);
        if alt <= CONFIG.sea_level {
            BiomeKind::Ocean
        } else if alt >= CONFIG.sea_level + 30.0 {
            BiomeKind::Mountain
        } else if temp > CONFIG.desert_temp {
            BiomeKind::Desert
        } else if temp < CONFIG.snow_temp {
            BiomeKind::Snowlands
        } else if self.humidity(wpos) > 0.3 {
            if alt < CONFIG.sea_level + 4.0 {
                BiomeKind::Swamp
            } else {
                BiomeKind::Forest
            }
        } else {
            BiomeKind::Grassland
        }
    }
}
