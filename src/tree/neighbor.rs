use crate::Key;
use crate::tree::LinearQuadTree;
use crate::tree::key;
use crate::tree::key::Quadrant;

/// The four sides of a node, clockwise from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Quadrants seen from this direction.
    ///
    /// Both quadrants and directions go clockwise, so rotating the quadrant order by the direction
    /// gives `[a, b, c, d]` where `a` and `b` lie on the side facing the direction, and `d`, `c` are
    /// their respective siblings on the opposite side. For `North` that is
    /// `[TopLeft, TopRight, BottomRight, BottomLeft]`: `BottomLeft` sits south of `TopLeft`.
    pub fn table(self) -> [Quadrant; 4] {
        let d = self as u8;

        [0, 1, 2, 3].map(|i| Quadrant::from_index(i + d))
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self as usize + 2) % 4]
    }
}

impl<V> LinearQuadTree<V>
where
    V: Clone + PartialEq,
{
    /// Every leaf sharing a border with the node at `key` on its `direction` side.
    pub fn neighboring_leaf_keys(&self, key: Key, direction: Direction) -> Vec<Key> {
        let mut keys = Vec::new();

        if let Some(neighbor) = self.neighbor_or_ancestor(key, direction) {
            self.border_leaf_keys(neighbor, direction, &mut keys);
        }

        keys
    }

    /// The node adjacent to `key` in `direction` that is at the same depth as `key`, or the leaf
    /// covering that spot if the tree is coarser there. `None` at the edge of the domain, or if
    /// `key` is not a node of the tree.
    pub fn neighbor_or_ancestor(&self, key: Key, direction: Direction) -> Option<Key> {
        if !self.is_node(key) {
            return None;
        }

        self.adjacent_node(key, direction)
    }

    fn adjacent_node(&self, key: Key, direction: Direction) -> Option<Key> {
        let q = key::quadrant(key)?;
        let [facing_a, facing_b, back_b, back_a] = direction.table();
        let first = key - q.index() as Key;

        // still inside the parent
        if q == back_a {
            return Some(first + facing_a.index() as Key);
        }
        if q == back_b {
            return Some(first + facing_b.index() as Key);
        }

        let parent = key::parent(key)?;
        let neighbor = self.adjacent_node(parent, direction)?;

        if self.is_leaf(neighbor) {
            return Some(neighbor);
        }

        // across the parent's border, mirrored
        let mirrored = if q == facing_a { back_a } else { back_b };

        Some(key::child(neighbor, mirrored))
    }

    /// Collect the leaves under `key` that touch its side opposite to `direction`, i.e. the side a
    /// node looking in `direction` sees.
    pub fn border_leaf_keys(&self, key: Key, direction: Direction, keys: &mut Vec<Key>) {
        // anything under a node ends in leaves, anything else would never stop descending
        if !self.is_node(key) {
            return;
        }

        let [_, _, back_b, back_a] = direction.table();
        let mut pending = vec![key];

        while let Some(key) = pending.pop() {
            if self.is_leaf(key) {
                keys.push(key);
            } else {
                pending.push(key::child(key, back_a));
                pending.push(key::child(key, back_b));
            }
        }
    }
}
