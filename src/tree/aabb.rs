use core::fmt::Debug;

use crate::Coord;
use crate::tree::key::Quadrant;
use crate::tree::point::Point;

/// Half-open axis-aligned box: covers `min.x..max.x` by `min.y..max.y`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    pub const fn new(x_min: Coord, y_min: Coord, x_max: Coord, y_max: Coord) -> Self {
        Aabb {
            min: Point::new(x_min, y_min),
            max: Point::new(x_max, y_max),
        }
    }

    /// The `side x side` square anchored at the origin.
    pub const fn square(side: Coord) -> Self {
        Self::new(0, 0, side, side)
    }

    /// A single cell.
    pub const fn cell(x: Coord, y: Coord) -> Self {
        Self::new(x, y, x.saturating_add(1), y.saturating_add(1))
    }

    pub fn width(&self) -> Coord {
        self.max.x.saturating_sub(self.min.x)
    }

    pub fn height(&self) -> Coord {
        self.max.y.saturating_sub(self.min.y)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn center(&self) -> Point {
        self.min.mid(&self.max)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Area shared by `self` and `other`, zero when they are disjoint.
    pub fn overlap_area(&self, other: &Aabb) -> u64 {
        let w = self.max.x.min(other.max.x).saturating_sub(self.min.x.max(other.min.x));
        let h = self.max.y.min(other.max.y).saturating_sub(self.min.y.max(other.min.y));

        w as u64 * h as u64
    }

    /// The part of the box covered by quadrant `q` after a midpoint split.
    pub fn quadrant(&self, q: Quadrant) -> Aabb {
        let c = self.center();

        match q {
            Quadrant::TopLeft => Aabb {
                min: self.min,
                max: c,
            },
            Quadrant::TopRight => Aabb::new(c.x, self.min.y, self.max.x, c.y),
            Quadrant::BottomRight => Aabb {
                min: c,
                max: self.max,
            },
            Quadrant::BottomLeft => Aabb::new(self.min.x, c.y, c.x, self.max.y),
        }
    }

    /// Splits the bounding box into four equal quadrants, in [`Quadrant`] order
    pub fn split(&self) -> [Aabb; 4] {
        Quadrant::ALL.map(|q| self.quadrant(q))
    }
}

impl Debug for Aabb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.min, self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Aabb;
    use crate::tree::key::Quadrant;
    use crate::tree::point::Point;

    #[test]
    fn split_goes_clockwise_from_top_left() {
        let [tl, tr, br, bl] = Aabb::square(8).split();

        assert_eq!(tl, Aabb::new(0, 0, 4, 4));
        assert_eq!(tr, Aabb::new(4, 0, 8, 4));
        assert_eq!(br, Aabb::new(4, 4, 8, 8));
        assert_eq!(bl, Aabb::new(0, 4, 4, 8));
        assert_eq!(Aabb::square(8).quadrant(Quadrant::BottomLeft), bl);
    }

    #[test]
    fn overlap_of_disjoint_and_nested_boxes() {
        let a = Aabb::new(2, 2, 6, 6);

        assert_eq!(a.overlap_area(&Aabb::new(0, 0, 2, 2)), 0);
        assert_eq!(a.overlap_area(&Aabb::new(6, 0, 8, 8)), 0);
        assert_eq!(a.overlap_area(&Aabb::new(0, 0, 4, 4)), 4);
        assert_eq!(a.overlap_area(&Aabb::square(8)), 16);
        assert_eq!(Aabb::square(8).overlap_area(&a), 16);
    }

    #[test]
    fn contains_is_half_open() {
        let a = Aabb::new(2, 2, 4, 4);

        assert!(a.contains(Point::new(2, 2)));
        assert!(a.contains(Point::new(3, 3)));
        assert!(!a.contains(Point::new(4, 3)));
        assert!(!a.contains(Point::new(3, 4)));
        assert!(!a.contains(Point::new(1, 2)));
    }
}
