use core::fmt::Debug;

use crate::Coord;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Point { x, y }
    }

    /// Compute the midpoint of the current `Point` and some `other` `Point`.
    pub fn mid(&self, other: &Self) -> Self {
        Point {
            x: self.x + (other.x - self.x) / 2,
            y: self.y + (other.y - self.y) / 2,
        }
    }
}

impl Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
