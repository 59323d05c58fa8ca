use crossterm::event::Event as CrossTermEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;

use crate::events::AppEvent;
use crate::events::Event;
use crate::events::PaintEvent;
use crate::events::ViewEvent;
use crate::painter::Button;
use crate::painter::ToolKind;

/// Cells added or removed on each axis by one canvas resize step
pub const RESIZE_STEP: i32 = 8;

/// Converts a crossterm event into a painter event
pub fn convert_event(event: CrossTermEvent) -> Option<Event> {
    match event {
        CrossTermEvent::Key(key_event) => convert_key(key_event).map(Event::AppEvent),
        CrossTermEvent::Mouse(mouse_event) => convert_mouse(mouse_event).map(Event::PaintEvent),
        CrossTermEvent::Resize(cols, rows) => Some(Event::AppEvent(AppEvent::ViewEvent(
            ViewEvent::Resize { cols, rows },
        ))),
        _ => None,
    }
}

fn convert_key(key_event: KeyEvent) -> Option<AppEvent> {
    // some terminals also report releases
    if key_event.kind == KeyEventKind::Release {
        return None;
    }

    match key_event {
        KeyEvent {
            code: KeyCode::Char('q'),
            ..
        }
        | KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => Some(AppEvent::Exit),
        KeyEvent {
            code: KeyCode::Char('d'),
            ..
        } => Some(AppEvent::SelectTool(ToolKind::Draw)),
        KeyEvent {
            code: KeyCode::Char('f'),
            ..
        } => Some(AppEvent::SelectTool(ToolKind::Fill)),
        KeyEvent {
            code: KeyCode::Char('x'),
            ..
        } => Some(AppEvent::SwapColors),
        KeyEvent {
            code: KeyCode::Char('g'),
            ..
        } => Some(AppEvent::ViewEvent(ViewEvent::CycleGrid)),
        KeyEvent {
            code: KeyCode::Char('+' | '='),
            ..
        } => Some(AppEvent::ViewEvent(ViewEvent::ZoomIn)),
        KeyEvent {
            code: KeyCode::Char('-'),
            ..
        } => Some(AppEvent::ViewEvent(ViewEvent::ZoomOut)),
        KeyEvent {
            code: KeyCode::Char(']'),
            ..
        } => Some(AppEvent::ResizeCanvas(RESIZE_STEP)),
        KeyEvent {
            code: KeyCode::Char('['),
            ..
        } => Some(AppEvent::ResizeCanvas(-RESIZE_STEP)),
        KeyEvent {
            code: KeyCode::Char(c @ '1'..='9'),
            ..
        } => c
            .to_digit(10)
            .map(|n| AppEvent::PickColor(n as usize - 1)),
        _ => None,
    }
}

fn convert_mouse(mouse_event: MouseEvent) -> Option<PaintEvent> {
    let MouseEvent {
        kind, column, row, ..
    } = mouse_event;

    let button = |b: MouseButton| match b {
        MouseButton::Left => Some(Button::Primary),
        MouseButton::Right => Some(Button::Secondary),
        MouseButton::Middle => None,
    };

    match kind {
        MouseEventKind::Down(b) => button(b).map(|button| PaintEvent::Press {
            button,
            column,
            row,
        }),
        MouseEventKind::Drag(b) => button(b).map(|_| PaintEvent::Drag { column, row }),
        MouseEventKind::Up(b) => button(b).map(|_| PaintEvent::Release),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(c: char) -> Option<Event> {
        convert_event(CrossTermEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::NONE,
        )))
    }

    fn mouse(kind: MouseEventKind) -> Option<Event> {
        convert_event(CrossTermEvent::Mouse(MouseEvent {
            kind,
            column: 7,
            row: 3,
            modifiers: KeyModifiers::NONE,
        }))
    }

    #[test]
    fn keys() {
        assert!(matches!(key('q'), Some(Event::AppEvent(AppEvent::Exit))));
        assert!(matches!(
            key('f'),
            Some(Event::AppEvent(AppEvent::SelectTool(ToolKind::Fill)))
        ));
        assert!(matches!(
            key('1'),
            Some(Event::AppEvent(AppEvent::PickColor(0)))
        ));
        assert!(matches!(
            key('9'),
            Some(Event::AppEvent(AppEvent::PickColor(8)))
        ));
        assert!(matches!(
            key('['),
            Some(Event::AppEvent(AppEvent::ResizeCanvas(-8)))
        ));
        assert!(key('0').is_none());
        assert!(key('z').is_none());
    }

    #[test]
    fn ctrl_c_exits() {
        let event = convert_event(CrossTermEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));

        assert!(matches!(event, Some(Event::AppEvent(AppEvent::Exit))));
    }

    #[test]
    fn mouse_buttons() {
        assert!(matches!(
            mouse(MouseEventKind::Down(MouseButton::Right)),
            Some(Event::PaintEvent(PaintEvent::Press {
                button: Button::Secondary,
                column: 7,
                row: 3
            }))
        ));
        assert!(matches!(
            mouse(MouseEventKind::Drag(MouseButton::Left)),
            Some(Event::PaintEvent(PaintEvent::Drag { column: 7, row: 3 }))
        ));
        assert!(matches!(
            mouse(MouseEventKind::Up(MouseButton::Left)),
            Some(Event::PaintEvent(PaintEvent::Release))
        ));
        assert!(mouse(MouseEventKind::Down(MouseButton::Middle)).is_none());
        assert!(mouse(MouseEventKind::Moved).is_none());
    }
}
