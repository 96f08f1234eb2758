//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the clock-config.toml file.
//! It provides a centralized way to configure the schedule defaults, panel geometry,
//! anti-aliasing gain, backlight levels and time zone.

use crate::schedule::{BrightnessLevels, ScheduleConfig};
use crate::status::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default location of the configuration file
pub const CONFIG_FILE: &str = "clock-config.toml";

/// Application configuration loaded from clock-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Schedule used until the schedule store provides one
    pub schedule: ScheduleConfig,
    /// Persisted schedule location
    pub store: StoreConfig,
    /// Panel and clock face geometry
    pub display: DisplayConfig,
    /// Backlight calibration
    pub brightness: BrightnessLevels,
    /// Time zone and polling
    pub time: TimeConfig,
}

/// Where the binary schedule file lives and how often it is re-read
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path of the 6-byte schedule file
    pub schedule_path: PathBuf,
    /// Seconds between reloads of the schedule file
    pub reload_interval_secs: u64,
}

/// Panel geometry and rendering calibration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    /// Clock face radius; the face sprite is `2 * radius + 1` pixels square
    pub clock_radius: u32,
    /// Distance of the numerals from the rim
    pub dial_inset: u32,
    /// Needle half-width in pixels
    pub needle_half_width: f32,
    /// Coverage gain compensating the panel gamma, 1.0 is neutral
    pub alpha_gain: f32,
    /// Side of the square status box in the top-right corner
    pub status_box_size: u32,
    /// Status label language
    pub language: Language,
}

/// Time zone and loop timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeConfig {
    /// Offset from UTC in minutes (e.g. 60 for CET)
    pub utc_offset_minutes: i32,
    /// Control loop sleep between polls
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schedule: ScheduleConfig::default(),
            store: StoreConfig {
                schedule_path: PathBuf::from("clock-schedule.bin"),
                reload_interval_secs: 5,
            },
            display: DisplayConfig {
                width: 160,  // 1.8" ST7735 panel in landscape
                height: 128, // 1.8" ST7735 panel in landscape
                clock_radius: 46,
                dial_inset: 7,
                needle_half_width: 2.0,
                alpha_gain: 1.3,
                status_box_size: 64,
                language: Language::Dutch,
            },
            brightness: BrightnessLevels::default(),
            time: TimeConfig {
                utc_offset_minutes: 60,
                poll_interval_ms: 200,
            },
        }
    }
}

impl Config {
    /// Load configuration from clock-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    if !config.schedule.is_well_ordered() {
                        warn!("configured wake-up time is not before bedtime");
                    }
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to clock-config.toml
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the specified path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
