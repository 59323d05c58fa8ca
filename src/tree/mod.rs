use std::collections::HashMap;
use std::mem;

use thiserror::Error;
use tracing::debug;
use tracing::trace;
use tracing::warn;

pub use crate::tree::aabb::Aabb;
pub use crate::tree::key::Quadrant;
pub use crate::tree::neighbor::Direction;
pub use crate::tree::point::Point;

use crate::Coord;
use crate::Depth;
use crate::Key;
use crate::tree::key::ROOT;

mod aabb;
pub mod key;
mod neighbor;
mod point;

/// Deepest tree supported: every key below it fits a `u64`, and so does the root's area.
pub const MAX_DEPTH: Depth = 31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Depth {depth} exceeds the supported maximum of {max}")]
    DepthTooLarge { depth: Depth, max: Depth },

    #[error("Shrinking to depth {depth} would discard painted cells outside {size}x{size}")]
    WouldDiscard { depth: Depth, size: Coord },
}

/// An internal node reached during a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub aabb: Aabb,
    pub key: Key,
    pub depth: Depth,
}

/// A leaf reached during a traversal, along with the value it stores.
#[derive(Debug, PartialEq, Eq)]
pub struct Leaf<'a, V> {
    pub aabb: Aabb,
    pub key: Key,
    pub depth: Depth,
    pub value: &'a V,
}

/// A linear quadtree over the square `[0, 2^max_depth)²`.
///
/// Only leaves are stored: a key present in `data` is a leaf, a reachable key missing from it is
/// an internal node. Four sibling leaves never hold equal values at rest, they are merged into
/// their parent instead, so the map grows with the number of value boundaries and not with the
/// number of cells.
#[derive(Debug, Clone)]
pub struct LinearQuadTree<V> {
    data: HashMap<Key, V>,

    max_depth: Depth,

    /// `sizes[d]` is the side length of a node at depth `d`
    sizes: Vec<Coord>,

    /// `areas[d]` is the area of a node at depth `d`
    areas: Vec<u64>,

    /// Initial value of every cell, and the value of area exposed by growing the tree
    empty: V,
}

impl<V> LinearQuadTree<V>
where
    V: Clone + PartialEq,
{
    /// Create a tree with sidelength `2^max_depth`, holding `empty` everywhere.
    pub fn new(max_depth: Depth, empty: V) -> Result<Self, TreeError> {
        check_depth(max_depth)?;

        let mut tree = Self {
            data: HashMap::from([(ROOT, empty.clone())]),
            max_depth,
            sizes: Vec::new(),
            areas: Vec::new(),
            empty,
        };
        tree.rebuild_tables();

        Ok(tree)
    }

    /// Side length of the whole domain.
    #[inline]
    pub fn size(&self) -> Coord {
        self.sizes[0]
    }

    #[inline]
    pub fn max_depth(&self) -> Depth {
        self.max_depth
    }

    #[inline]
    pub fn size_at(&self, depth: Depth) -> Coord {
        self.sizes[depth as usize]
    }

    #[inline]
    pub fn area_at(&self, depth: Depth) -> u64 {
        self.areas[depth as usize]
    }

    #[inline]
    pub fn empty(&self) -> &V {
        &self.empty
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::square(self.size())
    }

    /// Number of stored leaves.
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_leaf(&self, key: Key) -> bool {
        self.data.contains_key(&key)
    }

    /// Whether `key` is currently a leaf or an internal node.
    ///
    /// Keys handed out earlier go stale when a merge folds them into an ancestor leaf, and keys
    /// below `max_depth` never exist.
    pub fn is_node(&self, key: Key) -> bool {
        let mut depth = 0;
        let mut k = key;

        while let Some(parent) = key::parent(k) {
            if self.is_leaf(parent) {
                return false;
            }

            depth += 1;
            k = parent;
        }

        depth <= self.max_depth as u32
    }

    fn rebuild_tables(&mut self) {
        let max_depth = self.max_depth as u32;

        self.sizes = (0..=max_depth).map(|d| 1 << (max_depth - d)).collect();
        self.areas = (0..=max_depth).map(|d| 1 << (2 * (max_depth - d))).collect();
    }

    /// Depth-first walk over the tree, children visited in [`Quadrant`] order.
    ///
    /// Internal nodes admitted by `node_filter` are handed to `on_node` and then descended into,
    /// leaves admitted by `leaf_filter` are handed to `on_leaf`.
    pub fn traverse<'a, N, L, NC, LC>(
        &'a self,
        mut node_filter: N,
        mut leaf_filter: L,
        mut on_node: NC,
        mut on_leaf: LC,
    ) where
        N: FnMut(&Node) -> bool,
        L: FnMut(&Leaf<'a, V>) -> bool,
        NC: FnMut(&Node),
        LC: FnMut(Leaf<'a, V>),
    {
        let root = Node {
            aabb: self.bounds(),
            key: ROOT,
            depth: 0,
        };

        self.traverse_from(
            root,
            &mut node_filter,
            &mut leaf_filter,
            &mut on_node,
            &mut on_leaf,
        );
    }

    fn traverse_from<'a, N, L, NC, LC>(
        &'a self,
        node: Node,
        node_filter: &mut N,
        leaf_filter: &mut L,
        on_node: &mut NC,
        on_leaf: &mut LC,
    ) where
        N: FnMut(&Node) -> bool,
        L: FnMut(&Leaf<'a, V>) -> bool,
        NC: FnMut(&Node),
        LC: FnMut(Leaf<'a, V>),
    {
        if let Some(value) = self.data.get(&node.key) {
            let leaf = Leaf {
                aabb: node.aabb,
                key: node.key,
                depth: node.depth,
                value,
            };

            if leaf_filter(&leaf) {
                on_leaf(leaf);
            }

            return;
        }

        if node.depth >= self.max_depth || !node_filter(&node) {
            return;
        }

        on_node(&node);

        let first = key::first_child(node.key);
        for (q, aabb) in Quadrant::ALL.into_iter().zip(node.aabb.split()) {
            let child = Node {
                aabb,
                key: first + q.index() as Key,
                depth: node.depth + 1,
            };

            self.traverse_from(child, node_filter, leaf_filter, on_node, on_leaf);
        }
    }

    /// Visit every internal node.
    pub fn for_each_node<F>(&self, f: F)
    where
        F: FnMut(&Node),
    {
        self.traverse(|_| true, |_| false, f, |_| {});
    }

    /// Visit every leaf.
    pub fn for_each_leaf<'a, F>(&'a self, f: F)
    where
        F: FnMut(Leaf<'a, V>),
    {
        self.traverse(|_| true, |_| true, |_| {}, f);
    }

    /// All leaves, in traversal order.
    pub fn leaves(&self) -> Vec<Leaf<'_, V>> {
        let mut leaves = Vec::with_capacity(self.data.len());
        self.for_each_leaf(|leaf| leaves.push(leaf));

        leaves
    }

    /// The leaf whose cell contains `(x, y)`, or `None` if the point lies outside the domain.
    pub fn leaf_containing(&self, x: Coord, y: Coord) -> Option<Leaf<'_, V>> {
        let p = Point::new(x, y);
        let mut found = None;

        self.traverse(
            |node| node.aabb.contains(p),
            |leaf| leaf.aabb.contains(p),
            |_| {},
            |leaf| found = Some(leaf),
        );

        found
    }

    /// Value of the leaf at `key`, `None` if `key` is not currently a leaf.
    #[inline]
    pub fn leaf_value(&self, key: Key) -> Option<&V> {
        self.data.get(&key)
    }

    /// Overwrite the leaf at `key` and merge upward as far as siblings allow.
    ///
    /// Returns `false` without touching the tree when `key` is not a leaf (for instance because it
    /// was merged into an ancestor since it was looked up) or already holds `value`.
    pub fn set_leaf_value(&mut self, key: Key, value: V) -> bool {
        match self.data.get_mut(&key) {
            Some(slot) if *slot != value => *slot = value,
            _ => return false,
        }

        self.balance_leaf(key);

        true
    }

    fn balance_leaf(&mut self, mut key: Key) {
        while let Some(parent) = key::parent(key) {
            if !self.merge_children(parent) {
                break;
            }

            key = parent;
        }
    }

    /// Collapse the children of `key` into `key` if they are four leaves holding the same value.
    fn merge_children(&mut self, key: Key) -> bool {
        let [a, b, c, d] = key::children(key);

        let uniform = match (
            self.data.get(&a),
            self.data.get(&b),
            self.data.get(&c),
            self.data.get(&d),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => a == b && a == c && a == d,
            _ => false,
        };

        if !uniform {
            return false;
        }

        for k in [b, c, d] {
            self.data.remove(&k);
        }

        if let Some(value) = self.data.remove(&a) {
            self.data.insert(key, value);
        }

        true
    }

    /// Replace `key`'s value with four children holding copies of it.
    fn split_leaf(&mut self, key: Key) {
        if let Some(value) = self.data.remove(&key) {
            for child in key::children(key) {
                self.data.insert(child, value.clone());
            }
        }
    }

    /// Apply `transform` to every cell inside `rect`. Returns whether anything changed.
    pub fn set_inside<T>(&mut self, rect: Aabb, mut transform: T) -> bool
    where
        T: FnMut(&V) -> V,
    {
        trace!(?rect, "set_inside");

        self.set_region(
            self.bounds(),
            ROOT,
            0,
            &|aabb: &Aabb, _area: u64| rect.overlap_area(aabb) > 0,
            &|aabb: &Aabb, area: u64| rect.overlap_area(aabb) == area,
            &mut transform,
        )
    }

    /// Apply `transform` to every cell outside `rect`. Returns whether anything changed.
    pub fn set_outside<T>(&mut self, rect: Aabb, mut transform: T) -> bool
    where
        T: FnMut(&V) -> V,
    {
        trace!(?rect, "set_outside");

        self.set_region(
            self.bounds(),
            ROOT,
            0,
            &|aabb: &Aabb, area: u64| rect.overlap_area(aabb) != area,
            &|aabb: &Aabb, _area: u64| rect.overlap_area(aabb) == 0,
            &mut transform,
        )
    }

    /// Both filters get the node's box and area. A leaf admitted by `leaf_filter` is rewritten
    /// whole; a node admitted by `node_filter` is split if needed and descended into.
    fn set_region<N, L, T>(
        &mut self,
        aabb: Aabb,
        key: Key,
        depth: Depth,
        node_filter: &N,
        leaf_filter: &L,
        transform: &mut T,
    ) -> bool
    where
        N: Fn(&Aabb, u64) -> bool,
        L: Fn(&Aabb, u64) -> bool,
        T: FnMut(&V) -> V,
    {
        let area = self.area_at(depth);

        if let Some(value) = self.data.get(&key) {
            if leaf_filter(&aabb, area) {
                let next = transform(value);
                if next == *value {
                    return false;
                }

                self.data.insert(key, next);
                return true;
            }
        }

        if depth == self.max_depth || !node_filter(&aabb, area) {
            return false;
        }

        if let Some(value) = self.data.get(&key) {
            // the transform maps values, so a leaf it keeps cannot change anywhere below either
            if transform(value) == *value {
                return false;
            }

            self.split_leaf(key);
        }

        let first = key::first_child(key);
        let mut updated = false;

        for (q, quad) in Quadrant::ALL.into_iter().zip(aabb.split()) {
            let child = first + q.index() as Key;

            if self.set_region(quad, child, depth + 1, node_filter, leaf_filter, transform) {
                updated = true;
            }
        }

        self.merge_children(key);

        updated
    }

    /// Change the depth of the tree, refusing to throw away anything but empty cells.
    ///
    /// Growing keeps the current content in the top-left corner and fills the new area with the
    /// empty value. Shrinking crops to the top-left corner, and fails with
    /// [`TreeError::WouldDiscard`] (leaving the tree untouched) if a cropped cell is not empty.
    pub fn set_max_depth(&mut self, depth: Depth) -> Result<(), TreeError> {
        check_depth(depth)?;

        if depth < self.max_depth {
            let kept = Aabb::square(1 << depth);

            if !self.is_empty_outside(kept) {
                warn!(from = self.max_depth, to = depth, "Refusing lossy shrink");

                return Err(TreeError::WouldDiscard {
                    depth,
                    size: kept.width(),
                });
            }
        }

        self.resize(depth);

        Ok(())
    }

    /// Change the depth of the tree, cropping whatever falls outside the new domain.
    pub fn truncate_max_depth(&mut self, depth: Depth) -> Result<(), TreeError> {
        check_depth(depth)?;
        self.resize(depth);

        Ok(())
    }

    fn is_empty_outside(&self, rect: Aabb) -> bool {
        let mut empty = true;
        // partially covered nodes still have cells outside
        let outside = |aabb: &Aabb| rect.overlap_area(aabb) != aabb.area();

        self.traverse(
            |node| outside(&node.aabb),
            |leaf| outside(&leaf.aabb),
            |_| {},
            |leaf| {
                if *leaf.value != self.empty {
                    empty = false;
                }
            },
        );

        empty
    }

    fn resize(&mut self, depth: Depth) {
        debug!(from = self.max_depth, to = depth, "Resizing tree");

        while self.max_depth < depth {
            self.grow_one();
        }

        while self.max_depth > depth {
            self.shrink_one();
        }

        self.rebuild_tables();
    }

    /// The whole tree moves one level down, into the top-left child of a new root.
    fn grow_one(&mut self) {
        let empty_root = self.data.get(&ROOT) == Some(&self.empty);

        if !empty_root {
            let mut old = mem::take(&mut self.data);
            let mut data = HashMap::with_capacity(old.len() + 3);

            for q in [Quadrant::TopRight, Quadrant::BottomRight, Quadrant::BottomLeft] {
                data.insert(key::child(ROOT, q), self.empty.clone());
            }

            // A node at depth d moves to the same place one level down: k + 4^d
            rekey(&mut old, &mut data, ROOT, 0, self.max_depth, &|k, d| {
                k + (1 << (2 * d as u32))
            });

            self.data = data;
        }

        self.max_depth += 1;
    }

    /// The top-left child becomes the new root, the other three are dropped.
    fn shrink_one(&mut self) {
        if !self.data.contains_key(&ROOT) {
            let mut old = mem::take(&mut self.data);
            let mut data = HashMap::with_capacity(old.len());
            let top_left = key::child(ROOT, Quadrant::TopLeft);

            rekey(&mut old, &mut data, top_left, 1, self.max_depth, &|k, d| {
                k - (1 << (2 * (d as u32 - 1)))
            });

            self.data = data;
        }

        self.max_depth -= 1;
    }

    /// Whether no four sibling leaves share a value, i.e. the tree is fully merged.
    pub fn is_canonical(&self) -> bool {
        self.data.keys().all(|&k| {
            if key::quadrant(k) != Some(Quadrant::TopLeft) {
                return true;
            }

            let value = &self.data[&k];
            !(1..4).all(|i| self.data.get(&(k + i)) == Some(value))
        })
    }
}

fn check_depth(depth: Depth) -> Result<(), TreeError> {
    if depth > MAX_DEPTH {
        return Err(TreeError::DepthTooLarge {
            depth,
            max: MAX_DEPTH,
        });
    }

    Ok(())
}

/// Move the leaves of the subtree at `key` from `old` to `new`, renaming each with `shift`.
fn rekey<V, F>(
    old: &mut HashMap<Key, V>,
    new: &mut HashMap<Key, V>,
    key: Key,
    depth: Depth,
    max_depth: Depth,
    shift: &F,
) where
    F: Fn(Key, Depth) -> Key,
{
    if let Some(value) = old.remove(&key) {
        new.insert(shift(key, depth), value);
    } else if depth < max_depth {
        for child in key::children(key) {
            rekey(old, new, child, depth + 1, max_depth, shift);
        }
    }
}
