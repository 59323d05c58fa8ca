use crate::ScreenSize;
use crate::painter::Button;
use crate::painter::ToolKind;

pub enum Event {
    PaintEvent(PaintEvent),
    AppEvent(AppEvent),
}

/// Pointer input, in terminal coordinates
pub enum PaintEvent {
    Press {
        button: Button,
        column: ScreenSize,
        row: ScreenSize,
    },
    Drag {
        column: ScreenSize,
        row: ScreenSize,
    },
    Release,
}

pub enum AppEvent {
    ViewEvent(ViewEvent),

    SelectTool(ToolKind),

    /// Pick the n-th palette color as primary
    PickColor(usize),

    SwapColors,

    /// Grow (or shrink, if negative) the canvas by this many cells on each axis
    ResizeCanvas(i32),

    /// Exit the application
    Exit,
}

pub enum ViewEvent {
    ZoomIn,
    ZoomOut,
    CycleGrid,
    Resize { cols: ScreenSize, rows: ScreenSize },
}
