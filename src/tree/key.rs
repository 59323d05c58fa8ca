//! Arithmetic on implicit node keys.
//!
//! Nodes are numbered level by level: the root is `0` and the children of `k` are `4k + 1`
//! through `4k + 4`, in [`Quadrant`] order. Nothing about a node is stored besides its key, so
//! everything structural (parent, siblings, position in the parent) is computed here.

use crate::Key;

pub const ROOT: Key = 0;

/// Position of a node inside its parent, listed clockwise from the top-left.
///
/// This order is shared by child keys, [`Aabb::split`](crate::tree::Aabb::split) and the
/// [`Direction`](crate::tree::Direction) tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomRight,
        Quadrant::BottomLeft,
    ];

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Only the two low bits of `i` are used.
    #[inline]
    pub const fn from_index(i: u8) -> Self {
        Self::ALL[(i & 3) as usize]
    }
}

/// Key of the top-left child of `key`.
#[inline]
pub const fn first_child(key: Key) -> Key {
    key * 4 + 1
}

#[inline]
pub const fn child(key: Key, q: Quadrant) -> Key {
    first_child(key) + q as Key
}

#[inline]
pub const fn children(key: Key) -> [Key; 4] {
    let first = first_child(key);

    [first, first + 1, first + 2, first + 3]
}

#[inline]
pub const fn parent(key: Key) -> Option<Key> {
    if key == ROOT {
        None
    } else {
        Some((key - 1) / 4)
    }
}

/// Where `key` sits inside its parent. `None` for the root.
#[inline]
pub const fn quadrant(key: Key) -> Option<Quadrant> {
    if key == ROOT {
        None
    } else {
        Some(Quadrant::from_index(((key - 1) % 4) as u8))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn children_and_parent_agree() {
        for key in 0..500 {
            for (i, c) in children(key).into_iter().enumerate() {
                assert_eq!(parent(c), Some(key));
                assert_eq!(quadrant(c), Some(Quadrant::from_index(i as u8)));
                assert_eq!(child(key, Quadrant::from_index(i as u8)), c);
            }
        }

        assert_eq!(parent(ROOT), None);
        assert_eq!(quadrant(ROOT), None);
    }
}
