pub mod canvas;
pub mod color;
pub mod config;
pub mod events;
pub mod flood;
pub mod io;
pub mod painter;
pub mod stroke;
pub mod tree;

/// Identifies a node of a linear quadtree
pub type Key = u64;
/// Distance from the root; the root is at depth 0
pub type Depth = u8;
/// Cell coordinate inside the tree's square
pub type Coord = u32;

pub type ScreenSize = u16;
