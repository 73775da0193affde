//! Engine settings.
//!
//! Every field has a default, so a settings document only needs to name
//! the values it overrides.

use crate::error::TilegramError;
use crate::geometry::shape::HexOrientation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Drawing surface width in plane units
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,

    /// Drawing surface height in plane units
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,

    #[serde(default)]
    pub orientation: HexOrientation,

    #[serde(default = "default_tile_edge")]
    pub tile_edge: f64,

    #[serde(default = "default_tile_edge_min")]
    pub tile_edge_min: f64,

    #[serde(default = "default_tile_edge_max")]
    pub tile_edge_max: f64,

    /// Fraction of the tile footprint drawn, leaving a gap between tiles
    #[serde(default = "default_tile_scale")]
    pub tile_scale: f64,

    /// Target minimum and maximum tile counts for the metric-per-tile domain
    #[serde(default = "default_tile_count_domain")]
    pub tile_count_domain: (f64, f64),

    /// Margin, in tiles, left around imported tilegrams (kept even)
    #[serde(default = "default_import_tile_margins")]
    pub import_tile_margins: i32,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Relative cartogram area change under which iteration stops early
    #[serde(default = "default_convergence_epsilon")]
    pub convergence_epsilon: f64,

    /// Boundary polygons smaller than this are ignored during population
    #[serde(default = "default_min_path_area")]
    pub min_path_area: f64,
}

fn default_canvas_width() -> f64 { 960.0 * 2.0 }
fn default_canvas_height() -> f64 { 720.0 * 2.0 }
fn default_tile_edge() -> f64 { 20.0 }
fn default_tile_edge_min() -> f64 { 10.0 }
fn default_tile_edge_max() -> f64 { 40.0 }
fn default_tile_scale() -> f64 { 0.95 }
fn default_tile_count_domain() -> (f64, f64) { (80.0, 8000.0) }
fn default_import_tile_margins() -> i32 { 6 }
fn default_max_iterations() -> u32 { 15 }
fn default_convergence_epsilon() -> f64 { 1e-4 }
fn default_min_path_area() -> f64 { 0.5 }

impl Default for Settings {
    fn default() -> Self {
        Settings {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            orientation: HexOrientation::default(),
            tile_edge: default_tile_edge(),
            tile_edge_min: default_tile_edge_min(),
            tile_edge_max: default_tile_edge_max(),
            tile_scale: default_tile_scale(),
            tile_count_domain: default_tile_count_domain(),
            import_tile_margins: default_import_tile_margins(),
            max_iterations: default_max_iterations(),
            convergence_epsilon: default_convergence_epsilon(),
            min_path_area: default_min_path_area(),
        }
    }
}

impl Settings {
    pub fn from_json_str(s: &str) -> Result<Self, TilegramError> {
        let settings: Settings = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), TilegramError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(TilegramError::config(format!("{} must be a positive number", name)))
            }
        };
        positive("canvas_width", self.canvas_width)?;
        positive("canvas_height", self.canvas_height)?;
        positive("tile_edge", self.tile_edge)?;
        positive("tile_edge_min", self.tile_edge_min)?;
        positive("tile_edge_max", self.tile_edge_max)?;
        if self.tile_edge_min > self.tile_edge_max {
            return Err(TilegramError::config("tile_edge_min exceeds tile_edge_max"));
        }
        if !(self.tile_scale > 0.0 && self.tile_scale <= 1.0) {
            return Err(TilegramError::config("tile_scale must be in (0, 1]"));
        }
        let (lo, hi) = self.tile_count_domain;
        if !(lo > 0.0 && hi > lo) {
            return Err(TilegramError::config("tile_count_domain must be increasing and positive"));
        }
        if self.import_tile_margins < 0 || self.import_tile_margins % 2 != 0 {
            return Err(TilegramError::config("import_tile_margins must be even and non-negative"));
        }
        if self.max_iterations == 0 {
            return Err(TilegramError::config("max_iterations must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let json = r#"{"tile_edge": 12.5, "orientation": "flat-top"}"#;
        let s = Settings::from_json_str(json).unwrap();
        assert_eq!(s.tile_edge, 12.5);
        assert_eq!(s.orientation, HexOrientation::FlatTop);
        assert_eq!(s.max_iterations, 15);
        assert_eq!(s.canvas_width, 1920.0);
    }

    #[test]
    fn odd_margins_rejected() {
        let err = Settings::from_json_str(r#"{"import_tile_margins": 5}"#).unwrap_err();
        assert_eq!(err.code(), "config");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Settings::from_json_str("{").is_err());
    }
}
