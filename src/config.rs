//! Painter configuration, read from a TOML file.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::Coord;
use crate::color;
use crate::color::Color;

/// Largest zoom factor: one canvas cell is at most `MAX_SCALE` rows tall.
pub const MAX_SCALE: u16 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from `path`, or use defaults if there is no such file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(?path, "No config file found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&contents)?;
        info!(?path, "Loaded configuration");

        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let CanvasConfig { width, height } = self.canvas;

        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must not be empty, got {width}x{height}"
            )));
        }

        if !(1..=MAX_SCALE).contains(&self.view.scale) || !self.view.scale.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "scale must be a power of two in 1..={MAX_SCALE}, got {}",
                self.view.scale
            )));
        }

        if self.palette.colors.is_empty() {
            return Err(ConfigError::Invalid("palette must not be empty".into()));
        }

        Ok(())
    }
}

/// Initial size of the painted area, in cells.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: Coord,
    #[serde(default = "default_height")]
    pub height: Coord,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> Coord {
    48
}
fn default_height() -> Coord {
    24
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaletteConfig {
    /// Colors selectable with the number keys, in order.
    #[serde(default = "default_colors")]
    pub colors: Vec<Color>,
    /// Painted with the left mouse button.
    #[serde(default = "default_primary")]
    pub primary: Color,
    /// Painted with the right mouse button, and used as the canvas background.
    #[serde(default = "default_secondary")]
    pub secondary: Color,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            primary: default_primary(),
            secondary: default_secondary(),
        }
    }
}

fn default_colors() -> Vec<Color> {
    vec![
        color::BLACK,
        color::WHITE,
        Color::rgb(0xe0, 0x3c, 0x31),
        Color::rgb(0xf2, 0x9e, 0x1f),
        Color::rgb(0xf5, 0xd7, 0x2a),
        Color::rgb(0x3d, 0xae, 0x4f),
        Color::rgb(0x2f, 0x6f, 0xd6),
        Color::rgb(0x8e, 0x4e, 0xc6),
        Color::rgb(0x7a, 0x7a, 0x7a),
    ]
}
fn default_primary() -> Color {
    color::BLACK
}
fn default_secondary() -> Color {
    color::WHITE
}

/// How the quadtree structure is shown on top of the picture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    Off,
    /// Split lines of the coarser internal nodes
    Lines,
    /// Split lines plus leaf keys
    #[default]
    Labels,
}

impl GridMode {
    pub fn next(self) -> Self {
        match self {
            GridMode::Off => GridMode::Lines,
            GridMode::Lines => GridMode::Labels,
            GridMode::Labels => GridMode::Off,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewConfig {
    /// Terminal rows per canvas cell. Each cell is twice as many columns wide.
    #[serde(default = "default_scale")]
    pub scale: u16,
    #[serde(default)]
    pub grid: GridMode,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            grid: GridMode::default(),
        }
    }
}

fn default_scale() -> u16 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Logs go to a file, the terminal belongs to the painter.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// `tracing_subscriber::EnvFilter` directives, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("quadpaint.log")
}
fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections() {
        let config = Config::parse(
            r##"
            [canvas]
            width = 100

            [palette]
            primary = "#ff0000"

            [view]
            grid = "off"
            "##,
        )
        .unwrap();

        assert_eq!(config.canvas.width, 100);
        assert_eq!(config.canvas.height, default_height());
        assert_eq!(config.palette.primary, Color::rgb(255, 0, 0));
        assert_eq!(config.palette.secondary, color::WHITE);
        assert_eq!(config.view.grid, GridMode::Off);
        assert_eq!(config.view.scale, 1);
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        let err = Config::parse("[palette]\nprimary = \"red\"").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for contents in [
            "[canvas]\nwidth = 0",
            "[view]\nscale = 3",
            "[view]\nscale = 16",
            "[palette]\ncolors = []",
        ] {
            let err = Config::parse(contents).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{contents}: {err}");
        }
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::load(Path::new("this/file/does/not/exist.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn grid_mode_cycles() {
        assert_eq!(GridMode::Off.next(), GridMode::Lines);
        assert_eq!(GridMode::Lines.next(), GridMode::Labels);
        assert_eq!(GridMode::Labels.next(), GridMode::Off);
    }
}
