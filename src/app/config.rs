//! Configuration for the console and the demo

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Coord;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Console subsystem limits and initial geometry
    pub console: ConsoleConfig,
    /// Demo animation settings
    pub demo: DemoConfig,
}

/// Geometry and resource limits of a virtual console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Initial window width in columns
    pub window_columns: u16,
    /// Initial window height in rows
    pub window_rows: u16,
    /// Largest window the display can show
    pub largest_window_columns: u16,
    pub largest_window_rows: u16,
    /// Smallest buffer the console accepts
    pub min_buffer_columns: u16,
    pub min_buffer_rows: u16,
    /// Largest buffer the console accepts, per dimension
    pub max_buffer_columns: u16,
    pub max_buffer_rows: u16,
    /// Largest buffer the console accepts, in cells
    pub max_buffer_cells: usize,
    /// Screen buffers that may be live at once, not counting standard output
    pub max_screen_buffers: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            window_columns: 120,
            window_rows: 30,
            largest_window_columns: 240,
            largest_window_rows: 80,
            min_buffer_columns: 1,
            min_buffer_rows: 1,
            max_buffer_columns: 32767,
            max_buffer_rows: 32767,
            max_buffer_cells: 1 << 24,
            max_screen_buffers: 64,
        }
    }
}

impl ConsoleConfig {
    pub fn window_size(&self) -> Coord {
        Coord::new(self.window_columns, self.window_rows)
    }

    pub fn largest_window(&self) -> Coord {
        Coord::new(self.largest_window_columns, self.largest_window_rows)
    }

    pub fn min_buffer_size(&self) -> Coord {
        Coord::new(self.min_buffer_columns, self.min_buffer_rows)
    }

    pub fn max_buffer_size(&self) -> Coord {
        Coord::new(self.max_buffer_columns, self.max_buffer_rows)
    }

    /// Whether a buffer of `size` is within the configured bounds
    pub fn accepts_buffer(&self, size: Coord) -> bool {
        let (min, max) = (self.min_buffer_size(), self.max_buffer_size());
        (min.x..=max.x).contains(&size.x)
            && (min.y..=max.y).contains(&size.y)
            && size.area() <= self.max_buffer_cells
    }

    /// Same limits, with the initial window taken from a real terminal. The
    /// largest window grows if the terminal is bigger.
    pub fn with_window(mut self, size: Coord) -> Self {
        self.window_columns = size.x;
        self.window_rows = size.y;
        self.largest_window_columns = self.largest_window_columns.max(size.x);
        self.largest_window_rows = self.largest_window_rows.max(size.y);
        self
    }
}

/// Demo animation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Frames drawn before exiting
    pub frames: u32,
    /// Pause between frames in milliseconds
    pub frame_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            frame_delay_ms: 50,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from the default location or return the default
    pub fn load_or_default() -> Self {
        // ~/.config/mochi/surface.json
        if let Some(config_path) = default_path() {
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }
}

/// Path of the default configuration file
pub fn default_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("mochi")
            .join("surface.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
