use std::io;
use std::io::Write;

use crossterm::cursor;
use crossterm::queue;
use crossterm::style;
use crossterm::terminal;

use crate::ScreenSize;
use crate::color;
use crate::color::Color;
use crate::config::GridMode;
use crate::config::MAX_SCALE;
use crate::painter::Painter;
use crate::tree::Aabb;

/// Split lines are drawn for nodes shallower than `max_depth + log2(scale) - LINE_DEPTH`.
const LINE_DEPTH: i32 = 3;

/// Leaf keys are printed under nodes shallower than `max_depth + log2(scale) - LABEL_DEPTH`.
const LABEL_DEPTH: i32 = 6;

const VERTICAL_LINE: char = '▏';
const HORIZONTAL_LINE: char = '▔';

/// One terminal cell of the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermCell {
    /// `None` shows the terminal's own background
    pub bg: Option<Color>,
    pub fg: Option<Color>,
    pub glyph: char,
}

impl TermCell {
    const BLANK: TermCell = TermCell {
        bg: None,
        fg: None,
        glyph: ' ',
    };
}

/// Renders a [`Painter`] into terminal cells.
///
/// A canvas cell `(x, y)` covers `scale` rows starting at `y * scale` and `2 * scale` columns
/// starting at `2 * x * scale`, which keeps cells roughly square. The last terminal row is left
/// for the status line.
pub struct Canvas {
    /// The cell buffer
    cb: Vec<TermCell>,

    /// Width of the framebuffer, in columns
    w: usize,

    /// Height of the framebuffer, in rows
    h: usize,

    scale: u16,

    grid: GridMode,
}

impl Canvas {
    pub fn new(cols: ScreenSize, rows: ScreenSize, scale: u16, grid: GridMode) -> Self {
        let (w, h) = (cols as usize, rows.saturating_sub(1) as usize);

        Self {
            cb: vec![TermCell::BLANK; w * h],
            w,
            h,
            scale: scale.clamp(1, MAX_SCALE),
            grid,
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn scale(&self) -> u16 {
        self.scale
    }

    pub fn grid(&self) -> GridMode {
        self.grid
    }

    pub fn resize(&mut self, cols: ScreenSize, rows: ScreenSize) {
        self.w = cols as usize;
        self.h = rows.saturating_sub(1) as usize;
        self.cb = vec![TermCell::BLANK; self.w * self.h];
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * 2).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / 2).max(1);
    }

    pub fn cycle_grid(&mut self) {
        self.grid = self.grid.next();
    }

    /// The canvas cell under a terminal position. May lie outside the canvas.
    pub fn pixel_at(&self, column: ScreenSize, row: ScreenSize) -> (i32, i32) {
        let s = self.scale as i32;

        (column as i32 / (2 * s), row as i32 / s)
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<&TermCell> {
        (column < self.w && row < self.h).then(|| &self.cb[self.xy_from(column, row)])
    }

    fn xy_from(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    /// Terminal columns and rows covered by `aabb`, clipped to the framebuffer.
    fn screen_span(&self, aabb: &Aabb) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let s = self.scale as usize;
        let cols = (aabb.min.x as usize * 2 * s).min(self.w)..(aabb.max.x as usize * 2 * s).min(self.w);
        let rows = (aabb.min.y as usize * s).min(self.h)..(aabb.max.y as usize * s).min(self.h);

        (cols, rows)
    }

    fn fill_rect(&mut self, aabb: &Aabb, color: Option<Color>) {
        let (cols, rows) = self.screen_span(aabb);

        for y in rows {
            for x in cols.clone() {
                let i = self.xy_from(x, y);
                self.cb[i] = TermCell {
                    bg: color,
                    ..TermCell::BLANK
                };
            }
        }
    }

    fn put_glyph(&mut self, x: usize, y: usize, glyph: char) {
        let i = self.xy_from(x, y);
        let cell = &mut self.cb[i];

        cell.glyph = glyph;
        cell.fg = Some(cell.bg.map_or(color::WHITE, |bg| bg.contrast()));
    }

    /// Draw the midlines of `aabb`, restricted to `canvas`.
    fn draw_split(&mut self, aabb: &Aabb, canvas: &Aabb) {
        let c = aabb.center();
        let s = self.scale as usize;

        if c.x < canvas.max.x {
            let x = c.x as usize * 2 * s;
            let (_, rows) = self.screen_span(&Aabb::new(c.x, aabb.min.y, c.x, aabb.max.y.min(canvas.max.y)));

            if x < self.w {
                for y in rows {
                    self.put_glyph(x, y, VERTICAL_LINE);
                }
            }
        }

        if c.y < canvas.max.y {
            let y = c.y as usize * s;
            let (cols, _) = self.screen_span(&Aabb::new(aabb.min.x, c.y, aabb.max.x.min(canvas.max.x), c.y));

            if y < self.h {
                for x in cols {
                    let i = self.xy_from(x, y);
                    if self.cb[i].glyph != VERTICAL_LINE {
                        self.put_glyph(x, y, HORIZONTAL_LINE);
                    }
                }
            }
        }
    }

    /// Print `label` centered on `aabb` if it fits on one row of it.
    fn draw_label(&mut self, aabb: &Aabb, label: &str) {
        let (cols, rows) = self.screen_span(aabb);
        let len = label.chars().count();

        if rows.is_empty() || len > cols.len() {
            return;
        }

        let y = (rows.start + rows.end) / 2;
        let x0 = cols.start + (cols.len() - len) / 2;

        for (x, glyph) in (x0..).zip(label.chars()) {
            self.put_glyph(x, y, glyph);
        }
    }

    /// Redraw the whole framebuffer from `painter`.
    pub fn draw(&mut self, painter: &Painter) {
        self.cb.fill(TermCell::BLANK);

        let tree = painter.tree();
        tree.for_each_leaf(|leaf| self.fill_rect(&leaf.aabb, *leaf.value));

        if let Some(stroke) = painter.pending_stroke() {
            let canvas = painter.canvas();
            let color = Some(*stroke.color());

            for (x, y) in stroke.points() {
                let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                    continue;
                };

                if x < canvas.max.x && y < canvas.max.y {
                    self.fill_rect(&Aabb::cell(x, y), color);
                }
            }
        }

        if self.grid == GridMode::Off {
            return;
        }

        let canvas = painter.canvas();
        let depth = tree.max_depth() as i32 + self.scale.trailing_zeros() as i32;

        let line_limit = depth - LINE_DEPTH;
        tree.traverse(
            |node| (node.depth as i32) < line_limit,
            |_| false,
            |node| self.draw_split(&node.aabb, &canvas),
            |_| {},
        );

        if self.grid == GridMode::Labels {
            let label_limit = depth - LABEL_DEPTH;
            tree.traverse(
                |node| (node.depth as i32) < label_limit,
                |leaf| leaf.value.is_some(),
                |_| {},
                |leaf| self.draw_label(&leaf.aabb, &leaf.key.to_string()),
            );
        }
    }

    /// Write the framebuffer and `status` to the terminal.
    pub fn render<W: Write>(&self, out: &mut W, status: &str) -> io::Result<()> {
        let to_term = |c: Option<Color>| c.map_or(style::Color::Reset, style::Color::from);

        for (row, line) in self.cb.chunks(self.w.max(1)).enumerate() {
            queue!(out, cursor::MoveTo(0, row as u16))?;

            let mut current = None;
            for cell in line {
                let colors = (cell.bg, cell.fg);

                if current != Some(colors) {
                    queue!(
                        out,
                        style::SetBackgroundColor(to_term(cell.bg)),
                        style::SetForegroundColor(to_term(cell.fg)),
                    )?;
                    current = Some(colors);
                }

                queue!(out, style::Print(cell.glyph))?;
            }
        }

        queue!(
            out,
            style::ResetColor,
            cursor::MoveTo(0, self.h as u16),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(status),
        )?;

        out.flush()
    }
}
