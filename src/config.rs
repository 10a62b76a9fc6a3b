//! Configuration loader - YAML view settings + .env environment

use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::Result;

use crate::model::{Color, Vec3};

/// Main configuration loaded from starplot.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridSettings,
    pub drawable: DrawableBounds,
    pub routes: RouteSettings,
    pub transits: TransitSettings,
    pub labels: LabelSettings,
    pub stars: StarSettings,
}

/// Grid scaling: how many gridlines fit and which round divisions are allowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub gridline_budget: f64,
    /// Ascending round magnitudes in light-years
    pub divisions: Vec<f64>,
    /// Half width of the plot cube in plot-space units
    pub plot_half_extent: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            gridline_budget: 10.0,
            divisions: vec![
                1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0,
                10000.0,
            ],
            plot_half_extent: 100.0,
        }
    }
}

/// Real-world box (light-years) outside of which stars are not drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawableBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for DrawableBounds {
    fn default() -> Self {
        Self {
            min: [-10_000.0; 3],
            max: [10_000.0; 3],
        }
    }
}

impl DrawableBounds {
    /// Inclusive on both ends
    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    pub color: Color,
    pub line_width: f64,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            color: [0.96, 0.87, 0.70],
            line_width: 0.5,
        }
    }
}

/// One distance band for transit discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitBand {
    pub lower: f64,
    pub upper: f64,
    pub color: Color,
    pub line_weight: f64,
}

impl TransitBand {
    /// Band [0, max_distance] with default styling
    pub fn up_to(max_distance: f64) -> Self {
        Self {
            lower: 0.0,
            upper: max_distance,
            ..Self::default()
        }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.lower && distance <= self.upper
    }
}

impl Default for TransitBand {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 9.0,
            color: [0.0, 1.0, 1.0],
            line_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitSettings {
    pub bands: Vec<TransitBand>,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            bands: vec![TransitBand::default()],
        }
    }
}

/// Label sizing used for viewport clipping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    pub margin: f64,
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            margin: 5.0,
            char_width: 6.0,
            line_height: 12.0,
        }
    }
}

impl LabelSettings {
    /// Estimated (width, height) of a single-line label
    pub fn label_size(&self, text: &str) -> (f64, f64) {
        (text.chars().count() as f64 * self.char_width, self.line_height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarSettings {
    /// Stars are drawn this many times bigger than their catalog radius
    pub radius_scale: f64,
    pub default_radius: f64,
    pub default_color: Color,
}

impl Default for StarSettings {
    fn default() -> Self {
        Self {
            radius_scale: 3.0,
            default_radius: 1.0,
            default_color: [0.78, 0.08, 0.52],
        }
    }
}

/// Environment loaded from .env
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub data_dir: String,
    pub log_dir: String,
    pub dataset: Option<String>,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Bands sorted by lower bound, falling back to the default band
    pub fn transit_bands(&self) -> Vec<TransitBand> {
        if self.transits.bands.is_empty() {
            return vec![TransitBand::default()];
        }
        let mut bands = self.transits.bands.clone();
        bands.sort_by(|a, b| a.lower.total_cmp(&b.lower));
        bands
    }
}

impl Environment {
    /// Load environment from .env file
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Environment {
            data_dir: std::env::var("STARPLOT_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            log_dir: std::env::var("STARPLOT_LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            dataset: std::env::var("STARPLOT_DATASET").ok(),
        }
    }
}
