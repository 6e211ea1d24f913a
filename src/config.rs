//! Application configuration
//!
//! Resolved once at startup: built-in defaults, then an optional JSON file, then
//! environment overrides. A missing or broken file is logged and ignored.

use anyhow::Context;
use bevy::prelude::*;
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coastline::points::MIN_FILL_GRID_DEG;

pub const CONFIG_PATH_ENV: &str = "FLOATGLOBE_CONFIG";
pub const API_URL_ENV: &str = "FLOATGLOBE_API_URL";
pub const BOUNDARY_ENV: &str = "FLOATGLOBE_BOUNDARY";

const DEFAULT_BOUNDARY_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_50m_coastline.geojson";

#[derive(Resource, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the float data API, without trailing slash.
    pub api_base_url: String,
    /// URL or local path of the GeoJSON boundary dataset.
    pub boundary_source: String,
    /// Row limit for the single-year snapshot query.
    pub snapshot_limit: u32,
    /// Years offered in Year mode.
    pub years: Vec<i32>,
    pub initial_year: i32,
    /// Earliest selectable range start.
    pub min_date: NaiveDate,
    /// Latest selectable range end.
    pub max_date: NaiveDate,
    pub frame_period_ms: u64,
    /// Fill polygon interiors with grid points instead of outlines only.
    pub fill_interiors: bool,
    /// Dot size on the globe, world units.
    pub dot_size_globe: f32,
    /// Base dot size on the flat map, pixels at zoom 120.
    pub dot_size_flat_px: f32,
    pub coast_line_steps: u32,
    pub coast_multiline_steps: u32,
    pub fill_grid_deg: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            boundary_source: DEFAULT_BOUNDARY_URL.to_string(),
            snapshot_limit: 5000,
            years: vec![2022, 2023, 2024],
            initial_year: 2023,
            min_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            max_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            frame_period_ms: 500,
            fill_interiors: false,
            dot_size_globe: 0.08,
            dot_size_flat_px: 15.0,
            coast_line_steps: 10,
            coast_multiline_steps: 5,
            fill_grid_deg: 0.5,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations, never failing.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    info!("[CONFIG] loaded {}", path.display());
                    config
                }
                Err(err) => {
                    warn!("[CONFIG] ignoring {}: {:#}", path.display(), err);
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.sanitize();
        config
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        serde_json::from_str(contents).context("parsing config JSON")
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(source) = lookup(BOUNDARY_ENV).filter(|v| !v.trim().is_empty()) {
            self.boundary_source = source;
        }
    }

    /// Repair values that would break the controllers.
    fn sanitize(&mut self) {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        if self.years.is_empty() {
            self.years = vec![self.initial_year];
        }
        self.years.sort_unstable();
        self.years.dedup();
        if !self.years.contains(&self.initial_year) {
            self.initial_year = *self.years.last().unwrap_or(&self.initial_year);
        }
        if self.min_date > self.max_date {
            std::mem::swap(&mut self.min_date, &mut self.max_date);
        }
        self.frame_period_ms = self.frame_period_ms.max(1);
        self.coast_line_steps = self.coast_line_steps.max(1);
        self.coast_multiline_steps = self.coast_multiline_steps.max(1);
        if self.fill_grid_deg <= 0.0 || !self.fill_grid_deg.is_finite() {
            self.fill_grid_deg = 0.5;
        }
        self.fill_grid_deg = self.fill_grid_deg.max(MIN_FILL_GRID_DEG);
    }
}

/// `config.json` under the platform config directory:
/// - Linux: ~/.config/floatglobe/
/// - macOS: ~/Library/Application Support/floatglobe/
/// - Windows: %APPDATA%\floatglobe\config\
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "floatglobe").map(|dirs| dirs.config_dir().join("config.json"))
}
