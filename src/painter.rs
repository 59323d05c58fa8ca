use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::Coord;
use crate::Depth;
use crate::color::Color;
use crate::config::Config;
use crate::flood;
use crate::stroke::Stroke;
use crate::tree::Aabb;
use crate::tree::LinearQuadTree;
use crate::tree::MAX_DEPTH;
use crate::tree::TreeError;

/// Cells outside the canvas (but inside the tree's square) hold `None`.
pub type Picture = LinearQuadTree<Option<Color>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PainterError {
    #[error("Canvas must not be empty, got {width}x{height}")]
    EmptyCanvas { width: Coord, height: Coord },

    #[error("Canvas of {width}x{height} is too large")]
    TooLarge { width: Coord, height: Coord },

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Paints with the primary color
    Primary,
    /// Paints with the secondary color
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Draw,
    Fill,
}

/// The active tool, along with whatever it is in the middle of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    /// Freehand pencil; holds the stroke while a button is down
    Draw(Option<Stroke<Color>>),
    /// Bucket fill
    Fill,
}

impl Tool {
    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::Draw(_) => ToolKind::Draw,
            Tool::Fill => ToolKind::Fill,
        }
    }
}

/// A `width x height` picture stored in a quadtree, plus the tools that edit it.
#[derive(Debug, Clone)]
pub struct Painter {
    tree: Picture,
    width: Coord,
    height: Coord,
    primary: Color,
    secondary: Color,
    tool: Tool,
}

/// Smallest depth whose square holds a `width x height` canvas.
fn depth_for(width: Coord, height: Coord) -> Result<Depth, PainterError> {
    if width == 0 || height == 0 {
        return Err(PainterError::EmptyCanvas { width, height });
    }

    let side = width.max(height);
    if side > 1 << MAX_DEPTH {
        return Err(PainterError::TooLarge { width, height });
    }

    Ok(side.next_power_of_two().trailing_zeros() as Depth)
}

impl Painter {
    /// A blank canvas painted with `secondary`.
    pub fn new(
        width: Coord,
        height: Coord,
        primary: Color,
        secondary: Color,
    ) -> Result<Self, PainterError> {
        let depth = depth_for(width, height)?;

        let mut tree = LinearQuadTree::new(depth, None)?;
        tree.set_inside(Aabb::new(0, 0, width, height), |_| Some(secondary));

        Ok(Self {
            tree,
            width,
            height,
            primary,
            secondary,
            tool: Tool::Draw(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, PainterError> {
        Self::new(
            config.canvas.width,
            config.canvas.height,
            config.palette.primary,
            config.palette.secondary,
        )
    }

    pub fn tree(&self) -> &Picture {
        &self.tree
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    pub fn canvas(&self) -> Aabb {
        Aabb::new(0, 0, self.width, self.height)
    }

    pub fn primary(&self) -> Color {
        self.primary
    }

    pub fn secondary(&self) -> Color {
        self.secondary
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// The stroke being drawn, not yet committed to the tree.
    pub fn pending_stroke(&self) -> Option<&Stroke<Color>> {
        match &self.tool {
            Tool::Draw(stroke) => stroke.as_ref(),
            Tool::Fill => None,
        }
    }

    pub fn set_primary(&mut self, color: Color) {
        self.primary = color;
    }

    pub fn set_secondary(&mut self, color: Color) {
        self.secondary = color;
    }

    pub fn swap_colors(&mut self) {
        std::mem::swap(&mut self.primary, &mut self.secondary);
    }

    /// Switch tools, finishing any stroke in progress first.
    pub fn select_tool(&mut self, kind: ToolKind) {
        if self.tool.kind() == kind {
            return;
        }

        self.release();

        self.tool = match kind {
            ToolKind::Draw => Tool::Draw(None),
            ToolKind::Fill => Tool::Fill,
        };
    }

    fn color_of(&self, button: Button) -> Color {
        match button {
            Button::Primary => self.primary,
            Button::Secondary => self.secondary,
        }
    }

    /// The canvas cell at `(x, y)`, if there is one.
    fn cell(&self, x: i32, y: i32) -> Option<(Coord, Coord)> {
        let (x, y) = (Coord::try_from(x).ok()?, Coord::try_from(y).ok()?);

        (x < self.width && y < self.height).then_some((x, y))
    }

    /// A button went down over `(x, y)`. Returns whether the view needs redrawing.
    pub fn press(&mut self, button: Button, x: i32, y: i32) -> bool {
        let color = self.color_of(button);

        match &mut self.tool {
            // a second button while drawing is ignored
            Tool::Draw(Some(_)) => false,
            Tool::Draw(stroke) => {
                *stroke = Some(Stroke::start(color, x, y));
                true
            }
            Tool::Fill => {
                let Some((x, y)) = self.cell(x, y) else {
                    return false;
                };

                let filled = flood::flood_fill(&mut self.tree, x, y, Some(color));
                debug!(x, y, filled, "Bucket fill");

                filled > 0
            }
        }
    }

    /// The pointer moved to `(x, y)` with a button held.
    pub fn drag(&mut self, x: i32, y: i32) -> bool {
        match &mut self.tool {
            Tool::Draw(Some(stroke)) => {
                let before = stroke.len();
                stroke.extend_to(x, y);

                stroke.len() != before
            }
            _ => false,
        }
    }

    /// The button was released. Commits a pending stroke.
    pub fn release(&mut self) -> bool {
        let Tool::Draw(stroke) = &mut self.tool else {
            return false;
        };

        let Some(stroke) = stroke.take() else {
            return false;
        };

        let color = Some(*stroke.color());
        let mut changed = false;

        for (x, y) in stroke.points() {
            if let Some((x, y)) = self.cell(x, y) {
                changed |= self.tree.set_inside(Aabb::cell(x, y), |_| color);
            }
        }

        debug!(
            points = stroke.len(),
            changed,
            leaves = self.tree.leaf_count(),
            "Stroke committed"
        );

        // the preview disappears even if nothing changed
        true
    }

    /// Resize the canvas. Cells beyond the new edges are lost; new cells get the secondary color.
    pub fn set_size(&mut self, width: Coord, height: Coord) -> Result<(), PainterError> {
        let depth = depth_for(width, height)?;

        if depth < self.tree.max_depth() {
            self.tree.truncate_max_depth(depth)?;
        } else {
            self.tree.set_max_depth(depth)?;
        }

        let canvas = Aabb::new(0, 0, width, height);
        let background = self.secondary;

        self.tree.set_outside(canvas, |_| None);
        self.tree.set_inside(canvas, |v| v.or(Some(background)));

        self.width = width;
        self.height = height;

        info!(width, height, depth, "Canvas resized");

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::BLACK;
    use crate::color::WHITE;

    const RED: Color = Color::rgb(255, 0, 0);

    fn painter(width: Coord, height: Coord) -> Painter {
        Painter::new(width, height, BLACK, WHITE).unwrap()
    }

    fn at(p: &Painter, x: Coord, y: Coord) -> Option<Color> {
        *p.tree().leaf_containing(x, y).unwrap().value
    }

    #[test]
    fn depth_covers_canvas() {
        assert_eq!(depth_for(1, 1), Ok(0));
        assert_eq!(depth_for(5, 3), Ok(3));
        assert_eq!(depth_for(8, 8), Ok(3));
        assert_eq!(depth_for(9, 2), Ok(4));
        assert_eq!(
            depth_for(0, 2),
            Err(PainterError::EmptyCanvas {
                width: 0,
                height: 2
            })
        );
    }

    #[test]
    fn new_canvas_is_background_inside_only() {
        let p = painter(5, 3);

        assert_eq!(p.tree().size(), 8);
        assert_eq!(at(&p, 0, 0), Some(WHITE));
        assert_eq!(at(&p, 4, 2), Some(WHITE));
        assert_eq!(at(&p, 5, 0), None);
        assert_eq!(at(&p, 0, 3), None);
    }

    #[test]
    fn stroke_is_committed_on_release() {
        let mut p = painter(8, 8);

        assert!(p.press(Button::Primary, 0, 0));
        assert!(p.drag(3, 0));
        assert_eq!(at(&p, 1, 0), Some(WHITE));
        assert_eq!(p.pending_stroke().map(|s| s.len()), Some(4));

        assert!(p.release());
        assert!(p.pending_stroke().is_none());

        for x in 0..4 {
            assert_eq!(at(&p, x, 0), Some(BLACK));
        }
        assert_eq!(at(&p, 4, 0), Some(WHITE));
        assert!(p.tree().is_canonical());
    }

    #[test]
    fn stroke_is_clipped_to_canvas() {
        let mut p = painter(5, 3);

        p.press(Button::Secondary, -2, 1);
        p.set_primary(RED);
        p.drag(7, 1);
        p.release();

        // drawn with the secondary color chosen at press time
        assert_eq!(at(&p, 0, 1), Some(WHITE));
        assert_eq!(at(&p, 5, 1), None);
        assert_eq!(at(&p, 7, 1), None);
    }

    #[test]
    fn bucket_fills_enclosed_area() {
        let mut p = painter(8, 8);
        p.set_primary(RED);

        // a box outline around [2, 6)²
        for (from, to) in [((1, 1), (6, 1)), ((6, 1), (6, 6)), ((6, 6), (1, 6)), ((1, 6), (1, 1))] {
            p.press(Button::Primary, from.0, from.1);
            p.drag(to.0, to.1);
            p.release();
        }

        p.select_tool(ToolKind::Fill);
        p.set_primary(BLACK);
        assert!(p.press(Button::Primary, 3, 3));

        assert_eq!(at(&p, 3, 3), Some(BLACK));
        assert_eq!(at(&p, 5, 5), Some(BLACK));
        assert_eq!(at(&p, 1, 1), Some(RED));
        assert_eq!(at(&p, 0, 0), Some(WHITE));
        assert_eq!(at(&p, 7, 7), Some(WHITE));
        assert!(!p.release());
    }

    #[test]
    fn bucket_outside_canvas_is_ignored() {
        let mut p = painter(5, 3);
        p.select_tool(ToolKind::Fill);

        assert!(!p.press(Button::Primary, 6, 6));
        assert!(!p.press(Button::Primary, -1, 0));
        assert_eq!(at(&p, 6, 6), None);
    }

    #[test]
    fn switching_tools_commits_stroke() {
        let mut p = painter(4, 4);

        p.press(Button::Primary, 0, 0);
        p.select_tool(ToolKind::Fill);

        assert_eq!(p.tool(), &Tool::Fill);
        assert_eq!(at(&p, 0, 0), Some(BLACK));
    }

    #[test]
    fn resize_grows_and_crops() {
        let mut p = painter(4, 4);
        p.press(Button::Primary, 3, 3);
        p.release();

        p.set_size(12, 6).unwrap();
        assert_eq!(p.tree().size(), 16);
        assert_eq!(at(&p, 3, 3), Some(BLACK));
        assert_eq!(at(&p, 11, 5), Some(WHITE));
        assert_eq!(at(&p, 12, 0), None);
        assert_eq!(at(&p, 0, 6), None);

        p.set_size(3, 3).unwrap();
        assert_eq!(p.tree().size(), 4);
        assert_eq!(at(&p, 2, 2), Some(WHITE));
        assert_eq!(at(&p, 3, 3), None);
        assert!(p.tree().is_canonical());
    }

    #[test]
    fn swap_colors() {
        let mut p = painter(2, 2);
        p.swap_colors();

        assert_eq!(p.primary(), WHITE);
        assert_eq!(p.secondary(), BLACK);
    }
}
