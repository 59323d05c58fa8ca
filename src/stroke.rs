use std::collections::BTreeSet;

/// Cells visited by a straight line from `from` to `to`, excluding `from` and including `to`.
///
/// Takes one step per cell along the longer axis and rounds the other axis, so consecutive
/// points are always 8-connected.
pub fn line(from: (i32, i32), to: (i32, i32)) -> impl Iterator<Item = (i32, i32)> {
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let steps = dx.abs().max(dy.abs()) as u32;

    let (x_inc, y_inc) = if steps == 0 {
        (0.0, 0.0)
    } else {
        (dx / steps as f64, dy / steps as f64)
    };

    // halves round up, toward positive infinity
    let round = |v: f64| (v + 0.5).floor() as i32;

    (1..=steps).map(move |i| {
        let i = i as f64;

        (
            round(from.0 as f64 + x_inc * i),
            round(from.1 as f64 + y_inc * i),
        )
    })
}

/// An in-progress freehand stroke.
///
/// Points are only collected here; the caller commits them to the tree once the stroke ends.
/// Duplicates collapse, and since every point is written with the same value, order does not
/// matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stroke<C> {
    color: C,
    last: (i32, i32),
    points: BTreeSet<(i32, i32)>,
}

impl<C> Stroke<C> {
    pub fn start(color: C, x: i32, y: i32) -> Self {
        Self {
            color,
            last: (x, y),
            points: BTreeSet::from([(x, y)]),
        }
    }

    /// Extend the stroke to `(x, y)`, filling the gap from the previous point.
    pub fn extend_to(&mut self, x: i32, y: i32) {
        if (x, y) == self.last {
            return;
        }

        self.points.extend(line(self.last, (x, y)));
        self.last = (x, y);
    }

    pub fn color(&self) -> &C {
        &self.color
    }

    pub fn points(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.points.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
