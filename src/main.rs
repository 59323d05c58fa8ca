use std::fs::File;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time;

use anyhow::Context;
use crossterm::event;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::execute;
use crossterm::terminal;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use quadpaint::canvas::Canvas;
use quadpaint::config::Config;
use quadpaint::config::LogConfig;
use quadpaint::events::AppEvent;
use quadpaint::events::Event;
use quadpaint::events::PaintEvent;
use quadpaint::events::ViewEvent;
use quadpaint::io::convert_event;
use quadpaint::painter::Painter;
use quadpaint::painter::ToolKind;

const FRAMERATE: u32 = 120;
const FRAMETIME: time::Duration =
    time::Duration::from_millis(((1f64 / FRAMERATE as f64) * 1_000f64) as u64);

const DEFAULT_CONFIG: &str = "quadpaint.toml";

fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    let file = File::create(&log.file)
        .with_context(|| format!("Failed to create log file {:?}", log.file))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn status(painter: &Painter, canvas: &Canvas) -> String {
    let tool = match painter.tool().kind() {
        ToolKind::Draw => "draw",
        ToolKind::Fill => "fill",
    };
    let tree = painter.tree();

    format!(
        "[{tool}] {} / {} | {}x{} depth {} | {} leaves | x{} {:?}",
        painter.primary(),
        painter.secondary(),
        painter.width(),
        painter.height(),
        tree.max_depth(),
        tree.leaf_count(),
        canvas.scale(),
        canvas.grid(),
    )
}

/// Applies `event`. Returns `None` if the app should exit, otherwise whether to redraw.
fn handle_event(
    event: Event,
    painter: &mut Painter,
    canvas: &mut Canvas,
    config: &Config,
) -> Option<bool> {
    let redraw = match event {
        Event::PaintEvent(PaintEvent::Press {
            button,
            column,
            row,
        }) => {
            let (x, y) = canvas.pixel_at(column, row);
            painter.press(button, x, y)
        }
        Event::PaintEvent(PaintEvent::Drag { column, row }) => {
            let (x, y) = canvas.pixel_at(column, row);
            painter.drag(x, y)
        }
        Event::PaintEvent(PaintEvent::Release) => painter.release(),

        Event::AppEvent(AppEvent::Exit) => return None,
        Event::AppEvent(AppEvent::SelectTool(kind)) => {
            painter.select_tool(kind);
            true
        }
        Event::AppEvent(AppEvent::PickColor(n)) => match config.palette.colors.get(n) {
            Some(color) => {
                painter.set_primary(*color);
                true
            }
            None => false,
        },
        Event::AppEvent(AppEvent::SwapColors) => {
            painter.swap_colors();
            true
        }
        Event::AppEvent(AppEvent::ResizeCanvas(step)) => {
            let resize = |v: u32| v.saturating_add_signed(step).max(1);
            let (w, h) = (resize(painter.width()), resize(painter.height()));

            if let Err(e) = painter.set_size(w, h) {
                warn!(%e, w, h, "Failed to resize canvas");
            }
            true
        }
        Event::AppEvent(AppEvent::ViewEvent(view_event)) => {
            match view_event {
                ViewEvent::ZoomIn => canvas.zoom_in(),
                ViewEvent::ZoomOut => canvas.zoom_out(),
                ViewEvent::CycleGrid => canvas.cycle_grid(),
                ViewEvent::Resize { cols, rows } => canvas.resize(cols, rows),
            }
            true
        }
    };

    Some(redraw)
}

fn run<W: Write>(out: &mut W, config: &Config) -> anyhow::Result<()> {
    let mut painter = Painter::from_config(config).context("Failed to create the canvas")?;

    let (cols, rows) = terminal::size()?;
    let mut canvas = Canvas::new(cols, rows, config.view.scale, config.view.grid);

    let mut redraw = true;

    loop {
        let t = time::Instant::now();

        if redraw {
            canvas.draw(&painter);
            canvas.render(out, &status(&painter, &canvas))?;
            redraw = false;
        }

        // Poll event for as long as FRAMETIME
        if event::poll(FRAMETIME)? {
            if let Some(event) = convert_event(event::read()?) {
                match handle_event(event, &mut painter, &mut canvas, config) {
                    None => break,
                    Some(r) => redraw |= r,
                }
            }
        }

        thread::sleep(FRAMETIME.saturating_sub(t.elapsed()));
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = Config::load(&path).with_context(|| format!("Failed to load {path:?}"))?;
    init_logging(&config.log)?;
    info!(?path, "Starting");

    let mut stdout = io::stdout();

    terminal::enable_raw_mode()?;
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)?;

    let result = run(&mut stdout, &config);

    // restore the terminal even if the painter failed, raw mode first
    let raw = terminal::disable_raw_mode();
    let screen = execute!(stdout, DisableMouseCapture, terminal::LeaveAlternateScreen);

    if let Err(e) = &result {
        warn!(%e, "Exiting with an error");
    }

    first_error(result, raw, screen)
}

/// The painter's own error wins over failures to restore the terminal.
fn first_error(
    result: anyhow::Result<()>,
    raw: io::Result<()>,
    screen: io::Result<()>,
) -> anyhow::Result<()> {
    result?;
    raw.context("Failed to leave raw mode")?;
    screen.context("Failed to restore the screen")?;

    Ok(())
}
