use std::collections::VecDeque;

use proptest::prelude::*;

use quadpaint::Coord;
use quadpaint::Key;
use quadpaint::flood;
use quadpaint::tree::Aabb;
use quadpaint::tree::Direction;
use quadpaint::tree::LinearQuadTree;
use quadpaint::tree::Point;

const DEPTH: u8 = 4;
const SIDE: Coord = 1 << DEPTH;

/// Value no generated fill ever uses.
const FLOOD: u8 = 9;

/// A cell-by-cell copy of the picture, to check the tree against.
#[derive(Debug, Clone, PartialEq)]
struct Grid(Vec<u8>);

impl Grid {
    fn new() -> Self {
        Grid(vec![0; (SIDE * SIDE) as usize])
    }

    fn at(&self, x: Coord, y: Coord) -> u8 {
        self.0[(y * SIDE + x) as usize]
    }

    fn set(&mut self, x: Coord, y: Coord, v: u8) {
        self.0[(y * SIDE + x) as usize] = v;
    }

    fn apply(&mut self, op: &Op) -> bool {
        let mut changed = false;

        for y in 0..SIDE {
            for x in 0..SIDE {
                if op.rect.contains(Point::new(x, y)) == op.inside && self.at(x, y) != op.value {
                    self.set(x, y, op.value);
                    changed = true;
                }
            }
        }

        changed
    }

    /// 4-connected flood fill, one cell at a time.
    fn flood(&mut self, x: Coord, y: Coord, fill: u8) {
        let target = self.at(x, y);
        let mut pending = VecDeque::from([(x, y)]);

        while let Some((x, y)) = pending.pop_front() {
            if self.at(x, y) != target {
                continue;
            }
            self.set(x, y, fill);

            if x > 0 {
                pending.push_back((x - 1, y));
            }
            if y > 0 {
                pending.push_back((x, y - 1));
            }
            if x + 1 < SIDE {
                pending.push_back((x + 1, y));
            }
            if y + 1 < SIDE {
                pending.push_back((x, y + 1));
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Op {
    rect: Aabb,
    value: u8,
    inside: bool,
}

impl Op {
    fn run(&self, tree: &mut LinearQuadTree<u8>) -> bool {
        let value = self.value;

        if self.inside {
            tree.set_inside(self.rect, |_| value)
        } else {
            tree.set_outside(self.rect, |_| value)
        }
    }
}

fn op() -> impl Strategy<Value = Op> {
    (0..=SIDE, 0..=SIDE, 0..=SIDE, 0..=SIDE, 0u8..3, prop::bool::weighted(0.8)).prop_map(
        |(x0, y0, x1, y1, value, inside)| Op {
            rect: Aabb::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)),
            value,
            inside,
        },
    )
}

fn build(ops: &[Op]) -> (LinearQuadTree<u8>, Grid) {
    let mut tree = LinearQuadTree::new(DEPTH, 0).unwrap();
    let mut grid = Grid::new();

    for op in ops {
        let changed = op.run(&mut tree);
        assert_eq!(changed, grid.apply(op), "{op:?}");
    }

    (tree, grid)
}

fn snapshot(tree: &LinearQuadTree<u8>) -> Vec<(Key, Aabb, u8)> {
    let mut leaves: Vec<_> = tree
        .leaves()
        .into_iter()
        .map(|l| (l.key, l.aabb, *l.value))
        .collect();
    leaves.sort_by_key(|l| l.0);

    leaves
}

fn assert_matches(tree: &LinearQuadTree<u8>, grid: &Grid) -> Result<(), TestCaseError> {
    for y in 0..SIDE {
        for x in 0..SIDE {
            let leaf = tree.leaf_containing(x, y);
            prop_assert!(leaf.is_some(), "no leaf at ({x}, {y})");
            prop_assert_eq!(*leaf.unwrap().value, grid.at(x, y), "at ({}, {})", x, y);
        }
    }

    Ok(())
}

/// Do the two leaves share a border on `a`'s `direction` side?
fn adjacent(a: &Aabb, b: &Aabb, direction: Direction) -> bool {
    let overlap = |a0: Coord, a1: Coord, b0: Coord, b1: Coord| a0 < b1 && b0 < a1;

    match direction {
        Direction::North => b.max.y == a.min.y && overlap(a.min.x, a.max.x, b.min.x, b.max.x),
        Direction::South => b.min.y == a.max.y && overlap(a.min.x, a.max.x, b.min.x, b.max.x),
        Direction::East => b.min.x == a.max.x && overlap(a.min.y, a.max.y, b.min.y, b.max.y),
        Direction::West => b.max.x == a.min.x && overlap(a.min.y, a.max.y, b.min.y, b.max.y),
    }
}

proptest! {
    #[test]
    fn fills_match_grid(ops in prop::collection::vec(op(), 0..12)) {
        let (tree, grid) = build(&ops);

        prop_assert!(tree.is_canonical());
        assert_matches(&tree, &grid)?;

        let area: u64 = tree.leaves().iter().map(|l| l.aabb.area()).sum();
        prop_assert_eq!(area, (SIDE * SIDE) as u64);
        prop_assert!(tree.leaf_containing(SIDE, 0).is_none());
    }

    #[test]
    fn fills_are_idempotent(ops in prop::collection::vec(op(), 1..12)) {
        let (mut tree, _) = build(&ops);
        let before = snapshot(&tree);

        let last = ops.last().unwrap();
        prop_assert!(!last.run(&mut tree));
        prop_assert_eq!(snapshot(&tree), before);
    }

    #[test]
    fn grow_then_shrink_round_trips(ops in prop::collection::vec(op(), 0..12)) {
        let (mut tree, grid) = build(&ops);
        let before = snapshot(&tree);

        tree.set_max_depth(DEPTH + 1).unwrap();
        prop_assert!(tree.is_canonical());
        prop_assert_eq!(*tree.leaf_containing(SIDE, SIDE).unwrap().value, 0);

        tree.set_max_depth(DEPTH).unwrap();
        prop_assert_eq!(snapshot(&tree), before);
        assert_matches(&tree, &grid)?;
    }

    #[test]
    fn neighbors_are_adjacent_and_symmetric(ops in prop::collection::vec(op(), 0..12)) {
        let (tree, _) = build(&ops);
        let leaves = tree.leaves();
        let aabb_of = |key: Key| leaves.iter().find(|l| l.key == key).map(|l| l.aabb);

        for leaf in &leaves {
            for direction in Direction::ALL {
                for key in tree.neighboring_leaf_keys(leaf.key, direction) {
                    let aabb = aabb_of(key);
                    prop_assert!(aabb.is_some(), "neighbor {} of {} is not a leaf", key, leaf.key);
                    prop_assert!(adjacent(&leaf.aabb, &aabb.unwrap(), direction));

                    let back = tree.neighboring_leaf_keys(key, direction.opposite());
                    prop_assert!(back.contains(&leaf.key));
                }

                // every touching leaf is found
                let found = tree.neighboring_leaf_keys(leaf.key, direction).len();
                let touching = leaves.iter().filter(|l| adjacent(&leaf.aabb, &l.aabb, direction)).count();
                prop_assert_eq!(found, touching);
            }
        }
    }

    #[test]
    fn flood_fill_matches_grid(
        ops in prop::collection::vec(op(), 0..12),
        x in 0..SIDE,
        y in 0..SIDE,
    ) {
        let (mut tree, mut grid) = build(&ops);

        let filled = flood::flood_fill(&mut tree, x, y, FLOOD);
        grid.flood(x, y, FLOOD);

        prop_assert!(filled > 0);
        prop_assert!(tree.is_canonical());
        assert_matches(&tree, &grid)?;

        // the region is gone, so a second fill finds nothing to replace
        prop_assert_eq!(flood::flood_fill(&mut tree, x, y, FLOOD), 0);
    }
}
