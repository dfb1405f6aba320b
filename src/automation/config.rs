//! Configuration types for the detection loop.
//!
//! Loads settings from config.json at startup. Provides the reference layout
//! (grid origins, cell size, keypad buttons), target colors, tolerance and
//! timing parameters.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use crate::calibration::coords::RatioPoint;
use crate::detection::grid::GRID_SIZE;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// A point measured in pixels on the reference frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub x: f64,
    pub y: f64,
}

impl ReferencePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Keypad button positions on the reference frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadLayout {
    /// Digit buttons, indexed by the digit they enter.
    pub digits: [ReferencePoint; 10],
    /// The button that clears the current input.
    pub clear: ReferencePoint,
}

impl Default for KeypadLayout {
    fn default() -> Self {
        Self {
            digits: [
                ReferencePoint::new(330.0, 1823.0),
                ReferencePoint::new(164.0, 2035.0),
                ReferencePoint::new(452.0, 2035.0),
                ReferencePoint::new(736.0, 2035.0),
                ReferencePoint::new(1017.0, 2035.0),
                ReferencePoint::new(1299.0, 2035.0),
                ReferencePoint::new(326.0, 2236.0),
                ReferencePoint::new(607.0, 2236.0),
                ReferencePoint::new(884.0, 2236.0),
                ReferencePoint::new(1166.0, 2236.0),
            ],
            clear: ReferencePoint::new(1155.0, 1832.0),
        }
    }
}

/// Screen layout measured on a reference frame.
///
/// Every position is stored in reference pixels so it can be read straight off
/// a reference screenshot. Detection only ever uses the derived ratios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLayout {
    /// Width of the frame the positions were measured on
    pub width: u32,
    /// Height of the frame the positions were measured on
    pub height: u32,
    /// Edge length of one grid cell, scaled by frame width
    pub cell_size: f64,
    /// Top-left corner of the upper 5x5 grid
    pub top_grid: ReferencePoint,
    /// Top-left corner of the lower 5x5 grid
    pub bottom_grid: ReferencePoint,
    pub keypad: KeypadLayout,
}

impl Default for ReferenceLayout {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 2560,
            cell_size: 95.0,
            top_grid: ReferencePoint::new(290.0, 355.0),
            bottom_grid: ReferencePoint::new(272.0, 943.0),
            keypad: KeypadLayout::default(),
        }
    }
}

/// Resolution-independent form of [`ReferenceLayout`].
#[derive(Clone, Debug, PartialEq)]
pub struct RatioLayout {
    pub cell_size: f64,
    pub top_grid: RatioPoint,
    pub bottom_grid: RatioPoint,
    pub digits: [RatioPoint; 10],
    pub clear: RatioPoint,
}

impl ReferenceLayout {
    fn ratio(&self, point: ReferencePoint) -> RatioPoint {
        RatioPoint::new(point.x / self.width as f64, point.y / self.height as f64)
    }

    /// Converts every reference position into a ratio of the reference frame.
    pub fn ratios(&self) -> RatioLayout {
        RatioLayout {
            cell_size: self.cell_size / self.width as f64,
            top_grid: self.ratio(self.top_grid),
            bottom_grid: self.ratio(self.bottom_grid),
            digits: self.keypad.digits.map(|p| self.ratio(p)),
            clear: self.ratio(self.keypad.clear),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the adb executable
    pub adb_path: String,
    /// Device passed to `adb -s`; `None` uses the only attached device
    pub device_serial: Option<String>,
    /// Maximum time to wait for one screencap (milliseconds)
    pub capture_timeout_ms: u64,
    /// Maximum time to wait for one tap command (milliseconds)
    pub tap_timeout_ms: u64,
    pub layout: ReferenceLayout,
    /// Target color of the upper grid, RGB order
    pub top_color: [u8; 3],
    /// Target color of the lower grid, RGB order
    pub bottom_color: [u8; 3],
    /// Maximum per-channel difference for a cell to count as colored
    pub tolerance: u8,
    /// Pause between detection cycles (milliseconds)
    pub cycle_delay_ms: u64,
    /// Pause after every keypad tap (milliseconds)
    pub tap_delay_ms: u64,
    /// Show the viewer window; headless when false
    pub show_window: bool,
    /// Mark the calibrated keypad buttons on the viewer frame
    pub draw_keypad: bool,
    /// Save the annotated frame whenever the count changes
    pub save_snapshots: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_serial: Some("127.0.0.1:16384".to_string()),
            capture_timeout_ms: 5000,
            tap_timeout_ms: 2000,
            layout: ReferenceLayout::default(),
            // #C72B69
            top_color: [199, 43, 105],
            // #6C4FCD
            bottom_color: [108, 79, 205],
            tolerance: 50,
            cycle_delay_ms: 1000,
            tap_delay_ms: 200,
            show_window: true,
            draw_keypad: false,
            save_snapshots: false,
        }
    }
}

impl AppConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn tap_timeout(&self) -> Duration {
        Duration::from_millis(self.tap_timeout_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn tap_delay(&self) -> Duration {
        Duration::from_millis(self.tap_delay_ms)
    }

    /// Checks that the layout can be turned into valid ratios.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.width == 0 || layout.height == 0 {
            return Err(anyhow!(
                "Reference resolution {}x{} has a zero dimension",
                layout.width,
                layout.height
            ));
        }
        if !(layout.cell_size > 0.0) {
            return Err(anyhow!("Cell size must be positive, got {}", layout.cell_size));
        }
        let span = layout.cell_size * GRID_SIZE as f64;
        for (name, origin) in [("Top", layout.top_grid), ("Bottom", layout.bottom_grid)] {
            if origin.x + span > layout.width as f64 || origin.y + span > layout.height as f64 {
                return Err(anyhow!(
                    "{} grid at ({}, {}) with cell size {} does not fit in {}x{}",
                    name,
                    origin.x,
                    origin.y,
                    layout.cell_size,
                    layout.width,
                    layout.height
                ));
            }
        }

        let ratios = layout.ratios();
        let points = [ratios.top_grid, ratios.bottom_grid, ratios.clear]
            .into_iter()
            .chain(ratios.digits);
        for point in points {
            if !point.is_normalized() {
                return Err(anyhow!(
                    "Position ({:.4}, {:.4}) lies outside the reference frame",
                    point.x,
                    point.y
                ));
            }
        }
        Ok(())
    }
}

/// Reads and validates a config file.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from config.json or returns defaults.
/// Looks next to the executable first, then in the working directory.
fn load_config() -> AppConfig {
    let Some(config_path) = crate::paths::config_candidates()
        .into_iter()
        .find(|p| p.exists())
    else {
        crate::log("config.json not found. Using default config.");
        return AppConfig::default();
    };

    crate::log(&format!("Loading config from: {}", config_path.display()));

    match load_config_from(&config_path) {
        Ok(config) => {
            crate::log("Config loaded from config.json");
            config
        }
        Err(e) => {
            crate::log(&format!("{:#}. Using defaults.", e));
            AppConfig::default()
        }
    }
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}
