//! Flood fill over quadtree leaves.
//!
//! The fill walks from leaf to neighboring leaf instead of from cell to cell, so a large uniform
//! region costs one step per leaf no matter how many cells it spans.

use std::collections::HashSet;

use tracing::debug;

use crate::Coord;
use crate::Key;
use crate::tree::Direction;
use crate::tree::LinearQuadTree;

/// Replace the 4-connected region of equal value around `(x, y)` with `fill`.
///
/// Returns the number of leaves overwritten, which is `0` when the point lies outside the tree
/// or the region already holds `fill`.
pub fn flood_fill<V>(tree: &mut LinearQuadTree<V>, x: Coord, y: Coord, fill: V) -> usize
where
    V: Clone + PartialEq,
{
    let Some(origin) = tree.leaf_containing(x, y) else {
        return 0;
    };

    let key = origin.key;
    let target = origin.value.clone();

    fill_region(tree, key, &target, fill)
}

/// Replace every leaf reachable from the leaf at `origin` through leaves holding `target`.
///
/// Nothing is written until the whole region has been found: neighbor lookup relies on the
/// leaves it walks staying where they are, and writing merges them.
pub fn fill_region<V>(tree: &mut LinearQuadTree<V>, origin: Key, target: &V, fill: V) -> usize
where
    V: Clone + PartialEq,
{
    if *target == fill {
        return 0;
    }

    let mut visited = HashSet::from([origin]);
    let mut pending = vec![origin];
    let mut region = Vec::new();

    while let Some(key) = pending.pop() {
        if tree.leaf_value(key) != Some(target) {
            continue;
        }

        region.push(key);

        for direction in Direction::ALL {
            for neighbor in tree.neighboring_leaf_keys(key, direction) {
                if visited.insert(neighbor) {
                    pending.push(neighbor);
                }
            }
        }
    }

    debug!(origin, leaves = region.len(), visited = visited.len(), "Flood fill");

    // Leaves still holding `target` are never merged away by these writes, since a merge needs
    // four equal siblings and `target != fill`.
    for &key in &region {
        tree.set_leaf_value(key, fill.clone());
    }

    region.len()
}
