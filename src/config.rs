//! # Configuration Management
//!
//! Loads runtime configuration from `kayak-config.toml`: which NOAA station
//! to pull tides for, which weather.gov gridpoint to ask for the forecast,
//! the paddling windows the classifier scores against, and the chart size.
//! Nothing location-specific is hard-coded in the pipeline; pointing the job
//! at another coastline is a config edit.
//!
//! SMTP settings deliberately live in the environment, not here; see
//! [`crate::email::EmailConfig`].

use crate::analysis::ConditionWindows;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Time-of-day format used in the `[windows]` section.
const WINDOW_TIME_FORMAT: &str = "%H:%M";

/// Configuration errors surfaced when resolving parsed values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A `[windows]` time was not a valid "HH:MM" string
    #[error("invalid window time {0:?} (expected HH:MM)")]
    InvalidTime(String),
}

/// Application configuration loaded from kayak-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// NOAA tide station
    pub station: StationConfig,
    /// weather.gov forecast gridpoint
    pub forecast: ForecastConfig,
    /// Daily paddling windows for condition scoring
    pub windows: WindowsConfig,
    /// Tide chart dimensions
    pub chart: ChartConfig,
}

/// NOAA tide station configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct StationConfig {
    /// CO-OPS station ID (e.g. "9447130" for Seattle, WA)
    pub id: String,
    /// Human-readable station name, shown in the report heading
    pub name: String,
}

/// weather.gov gridpoint configuration.
///
/// Office and grid coordinates come from the `/points/{lat},{lon}` lookup;
/// they are stable for a location so they are configured rather than looked
/// up on every run.
#[derive(Debug, Deserialize, Serialize)]
pub struct ForecastConfig {
    /// Forecast office code (e.g. "SEW")
    pub office: String,
    /// Grid X coordinate
    pub grid_x: u32,
    /// Grid Y coordinate
    pub grid_y: u32,
}

/// Daily paddling windows, as "HH:MM" strings.
#[derive(Debug, Deserialize, Serialize)]
pub struct WindowsConfig {
    pub morning_start: String,
    pub morning_end: String,
    pub evening_start: String,
    pub evening_end: String,
    /// Good-but-not-great extension on both sides of each window, in minutes
    pub margin_minutes: i64,
}

/// Tide chart dimensions in pixels
#[derive(Debug, Deserialize, Serialize)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                id: "9447130".to_string(),
                name: "Seattle, WA".to_string(),
            },
            forecast: ForecastConfig {
                office: "SEW".to_string(),
                grid_x: 124,
                grid_y: 67,
            },
            windows: WindowsConfig {
                morning_start: "07:00".to_string(),
                morning_end: "11:00".to_string(),
                evening_start: "16:00".to_string(),
                evening_end: "19:00".to_string(),
                margin_minutes: 60,
            },
            chart: ChartConfig {
                width: 900,
                height: 450,
            },
        }
    }
}

impl Config {
    /// Load configuration from kayak-config.toml in the working directory.
    /// Falls back to the default configuration if the file is missing or
    /// invalid.
    pub fn load() -> Self {
        Self::load_from_path("kayak-config.toml")
    }

    /// Load configuration from the specified path, with default fallback.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    eprintln!("Loaded configuration for station: {}", config.station.name);
                    config
                }
                Err(e) => {
                    eprintln!("Warning: Invalid config file format: {}", e);
                    eprintln!("Using default configuration (Seattle, WA)");
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Info: No config file found, using default configuration (Seattle, WA)");
                Self::default()
            }
        }
    }
}

impl WindowsConfig {
    /// Resolve the "HH:MM" strings into classifier windows.
    pub fn resolve(&self) -> Result<ConditionWindows, ConfigError> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s, WINDOW_TIME_FORMAT)
                .map_err(|_| ConfigError::InvalidTime(s.to_string()))
        };
        Ok(ConditionWindows {
            morning_start: parse(&self.morning_start)?,
            morning_end: parse(&self.morning_end)?,
            evening_start: parse(&self.evening_start)?,
            evening_end: parse(&self.evening_end)?,
            margin: Duration::minutes(self.margin_minutes),
        })
    }
}
