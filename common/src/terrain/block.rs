use crate::vol::Vox;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};
use vek::*;

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockKind {
    Air = 0x00, // Air counts as a fluid
    Water = 0x01,
    // 0x02 <= x < 0x10 are reserved for other fluids. These are 2^n aligned
    // to allow bitwise checking of common conditions; `is_fluid` is just
    // `block_kind & 0xF0 == 0`.
    Rock = 0x10,
    Grass = 0x20,
    Snow = 0x21,
    Earth = 0x30,
    Sand = 0x31,
    Gravel = 0x32,
    Path = 0x33,
    Farmland = 0x34,
    Wood = 0x40,
    Leaves = 0x41,
    Plant = 0x50,
    Fruit = 0x51,
    // Covers all other cases; useful when experimenting with new kinds of
    // block without allocating them a dedicated block kind.
    Misc = 0xFE,
}

impl BlockKind {
    #[inline]
    pub const fn is_air(&self) -> bool { matches!(self, BlockKind::Air) }

    /// Determine whether the block kind is a gas or a liquid.
    #[inline]
    pub const fn is_fluid(&self) -> bool { *self as u8 & 0xF0 == 0x00 }

    #[inline]
    pub const fn is_liquid(&self) -> bool { self.is_fluid() && !self.is_air() }

    /// Determine whether the block is filled (i.e: fully solid). Right now,
    /// this is the opposite of being a fluid.
    #[inline]
    pub const fn is_filled(&self) -> bool { !self.is_fluid() }

    /// Determine whether the block has an RGB color stored in the attribute
    /// fields.
    #[inline]
    pub const fn has_color(&self) -> bool { self.is_filled() }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{:?}", self) }
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    kind: BlockKind,
    attr: [u8; 3],
}

impl Deref for Block {
    type Target = BlockKind;

    fn deref(&self) -> &Self::Target { &self.kind }
}

impl Block {
    #[inline]
    pub const fn new(kind: BlockKind, color: Rgb<u8>) -> Self {
        Self {
            kind,
            // Colours are only valid for non-fluids
            attr: if kind.is_filled() {
                [color.r, color.g, color.b]
            } else {
                [0; 3]
            },
        }
    }

    #[inline]
    pub const fn air() -> Self {
        Self {
            kind: BlockKind::Air,
            attr: [0; 3],
        }
    }

    #[inline]
    pub const fn water() -> Self {
        Self {
            kind: BlockKind::Water,
            attr: [0; 3],
        }
    }

    #[inline]
    pub const fn kind(&self) -> BlockKind { self.kind }

    #[inline]
    pub fn get_color(&self) -> Option<Rgb<u8>> {
        self.has_color().then(|| self.attr.into())
    }
}

impl Vox for Block {
    fn empty() -> Self { Block::air() }

    fn is_empty(&self) -> bool { self.kind.is_air() }
}
