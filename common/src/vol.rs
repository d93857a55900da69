use std::fmt::Debug;
use vek::*;

/// Used to specify a volume's compile-time size. This exists as a substitute
/// until const generics can express it directly.
pub trait VolSize: Clone {
    const SIZE: Vec3<u32>;
}

/// A volume whose cross-section with the XY-plane is a compile-time sized
/// rectangle.
pub trait RectVolSize: Clone {
    const RECT_SIZE: Vec2<u32>;
}

/// A voxel.
pub trait Vox: Sized + Clone + PartialEq {
    fn empty() -> Self;
    fn is_empty(&self) -> bool;

    fn or(self, other: Self) -> Self {
        if self.is_empty() { other } else { self }
    }
}

/// A volume that contains voxel data.
pub trait BaseVol {
    type Vox: Vox;
    type Error: Debug;
}

/// A volume that provides read access to its voxel data.
pub trait ReadVol: BaseVol {
    fn get(&self, pos: Vec3<i32>) -> Result<&Self::Vox, Self::Error>;
}

/// A volume that provides write access to its voxel data.
pub trait WriteVol: BaseVol {
    fn set(&mut self, pos: Vec3<i32>, vox: Self::Vox) -> Result<(), Self::Error>;

    fn map(&mut self, pos: Vec3<i32>, f: impl FnOnce(Self::Vox) -> Self::Vox) -> Result<(), Self::Error>
    where
        Self: ReadVol,
        Self::Vox: Copy,
    {
        let old = *self.get(pos)?;
        self.set(pos, f(old))
    }
}
