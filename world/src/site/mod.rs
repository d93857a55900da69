pub mod settlement;

// Reexports
pub use self::settlement::{Settlement, SettlementGen};

use lazy_static::lazy_static;
use serde::Deserialize;

/// What other generation layers may spawn at a column. Settlements claim
/// their geometry so trees and scatter don't grow through buildings.
pub struct SpawnRules {
    pub trees: bool,
}

impl Default for SpawnRules {
    fn default() -> Self { Self { trees: true } }
}

const WORLD_COLORS_MANIFEST: &str = include_str!("../../assets/style/colors.ron");

#[derive(Clone, Debug, Deserialize)]
pub struct Colors {
    pub settlement: settlement::Colors,
}

lazy_static! {
    static ref COLORS: Colors =
        ron::de::from_str(WORLD_COLORS_MANIFEST).expect("invalid world colour manifest");
}

impl Colors {
    /// NOTE: Panics if the embedded colour manifest cannot be parsed.
    pub fn load() -> &'static Colors { &COLORS }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_colour_manifest_parses() {
        let colors = Colors::load();
        assert_ne!(colors.settlement.plank, colors.settlement.stone);
    }
}
