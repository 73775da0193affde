//! Hexagon orientation strategies.
//!
//! Both orientations share the [`HexShape`] contract; [`HexOrientation`]
//! is the tagged variant a grid is built with. Reference for the layout
//! math: offset coordinates as described at redblobgames.com/grids/hexagons.

use crate::geometry::tolerance::is_odd;
use crate::model::{TileSize, Vec2};
use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axis whose lines are shifted by half a tile on odd indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaggerAxis {
    /// Odd rows are shifted along x (pointy-top).
    Rows,
    /// Odd columns are shifted along y (flat-top).
    Columns,
}

pub trait HexShape {
    /// Point-to-point bounding box of one tile.
    fn tile_size(&self, tile_edge: f64) -> TileSize;

    /// Largest edge whose grid step fits the given footprint on both axes.
    fn tile_edge_from_grid_unit(&self, unit: TileSize) -> f64;

    /// Edge recovered from a tile bounding box.
    fn tile_edge_from_size(&self, size: TileSize) -> f64;

    /// Step between adjacent centers in units of the tile size.
    fn grid_unit(&self) -> TileSize;

    fn grid_offset_x(&self, y: i32) -> f64;
    fn grid_offset_y(&self, x: i32) -> f64;

    fn stagger_axis(&self) -> StaggerAxis;

    /// Six vertices, clockwise on screen, for a tile of `size` centred on `center`.
    fn points_around(&self, center: Vec2, size: TileSize) -> [Vec2; 6];

    /// Inverse of the regular hexagon area formula.
    fn tile_edge_from_area(&self, area: f64) -> f64 {
        if !(area > 0.0) || !area.is_finite() { return 0.0; }
        ((area * 2.0) / (SQRT_3 * 3.0)).sqrt()
    }
}

#[inline]
pub fn hexagon_area(tile_edge: f64) -> f64 { (3.0 * SQRT_3 / 2.0) * tile_edge * tile_edge }

#[derive(Clone, Copy, Debug, Default)]
pub struct PointyTopShape;

impl HexShape for PointyTopShape {
    fn tile_size(&self, tile_edge: f64) -> TileSize {
        TileSize { width: SQRT_3 * tile_edge, height: 2.0 * tile_edge }
    }

    fn tile_edge_from_grid_unit(&self, unit: TileSize) -> f64 {
        (unit.width / SQRT_3).min((unit.height / 3.0) * 2.0)
    }

    fn tile_edge_from_size(&self, size: TileSize) -> f64 { size.height * 0.5 }

    fn grid_unit(&self) -> TileSize { TileSize { width: 1.0, height: 0.75 } }

    fn grid_offset_x(&self, y: i32) -> f64 { if is_odd(y) { 0.5 } else { 0.0 } }
    fn grid_offset_y(&self, _x: i32) -> f64 { 0.0 }

    fn stagger_axis(&self) -> StaggerAxis { StaggerAxis::Rows }

    fn points_around(&self, c: Vec2, s: TileSize) -> [Vec2; 6] {
        [
            Vec2 { x: c.x - s.width * 0.5, y: c.y - s.height * 0.25 }, // upper left
            Vec2 { x: c.x, y: c.y - s.height * 0.5 },                  // top
            Vec2 { x: c.x + s.width * 0.5, y: c.y - s.height * 0.25 }, // upper right
            Vec2 { x: c.x + s.width * 0.5, y: c.y + s.height * 0.25 }, // lower right
            Vec2 { x: c.x, y: c.y + s.height * 0.5 },                  // bottom
            Vec2 { x: c.x - s.width * 0.5, y: c.y + s.height * 0.25 }, // lower left
        ]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTopShape;

impl HexShape for FlatTopShape {
    fn tile_size(&self, tile_edge: f64) -> TileSize {
        TileSize { width: 2.0 * tile_edge, height: SQRT_3 * tile_edge }
    }

    fn tile_edge_from_grid_unit(&self, unit: TileSize) -> f64 {
        ((unit.width / 3.0) * 2.0).min(unit.height / SQRT_3)
    }

    fn tile_edge_from_size(&self, size: TileSize) -> f64 { size.width * 0.5 }

    fn grid_unit(&self) -> TileSize { TileSize { width: 0.75, height: 1.0 } }

    fn grid_offset_x(&self, _y: i32) -> f64 { 0.0 }
    fn grid_offset_y(&self, x: i32) -> f64 { if is_odd(x) { 0.5 } else { 0.0 } }

    fn stagger_axis(&self) -> StaggerAxis { StaggerAxis::Columns }

    fn points_around(&self, c: Vec2, s: TileSize) -> [Vec2; 6] {
        [
            Vec2 { x: c.x - s.width * 0.25, y: c.y - s.height * 0.5 }, // upper left
            Vec2 { x: c.x + s.width * 0.25, y: c.y - s.height * 0.5 }, // upper right
            Vec2 { x: c.x + s.width * 0.5, y: c.y },                   // right
            Vec2 { x: c.x + s.width * 0.25, y: c.y + s.height * 0.5 }, // lower right
            Vec2 { x: c.x - s.width * 0.25, y: c.y + s.height * 0.5 }, // lower left
            Vec2 { x: c.x - s.width * 0.5, y: c.y },                   // left
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HexOrientation {
    #[default]
    PointyTop,
    FlatTop,
}

impl HexOrientation {
    fn shape(&self) -> &'static dyn HexShape {
        match self {
            HexOrientation::PointyTop => &PointyTopShape,
            HexOrientation::FlatTop => &FlatTopShape,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HexOrientation::PointyTop => "pointy-top",
            HexOrientation::FlatTop => "flat-top",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pointy-top" | "pointy" => Some(HexOrientation::PointyTop),
            "flat-top" | "flat" => Some(HexOrientation::FlatTop),
            _ => None,
        }
    }

    /// Guess the orientation from one hexagon's bounding box: flat-top
    /// hexagons are wider than tall.
    pub fn from_hexagon_extent(width: f64, height: f64) -> Self {
        if width > height { HexOrientation::FlatTop } else { HexOrientation::PointyTop }
    }
}

impl HexShape for HexOrientation {
    fn tile_size(&self, tile_edge: f64) -> TileSize { self.shape().tile_size(tile_edge) }
    fn tile_edge_from_grid_unit(&self, unit: TileSize) -> f64 {
        self.shape().tile_edge_from_grid_unit(unit)
    }
    fn tile_edge_from_size(&self, size: TileSize) -> f64 { self.shape().tile_edge_from_size(size) }
    fn grid_unit(&self) -> TileSize { self.shape().grid_unit() }
    fn grid_offset_x(&self, y: i32) -> f64 { self.shape().grid_offset_x(y) }
    fn grid_offset_y(&self, x: i32) -> f64 { self.shape().grid_offset_y(x) }
    fn stagger_axis(&self) -> StaggerAxis { self.shape().stagger_axis() }
    fn points_around(&self, center: Vec2, size: TileSize) -> [Vec2; 6] {
        self.shape().points_around(center, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::math::{distance, polygon_area};

    #[test]
    fn pointy_top_size_for_edge_20() {
        let s = PointyTopShape.tile_size(20.0);
        assert!((s.width - 34.641_016).abs() < 1e-5);
        assert_eq!(s.height, 40.0);
    }

    #[test]
    fn area_round_trip() {
        for shape in [HexOrientation::PointyTop, HexOrientation::FlatTop] {
            for edge in [0.5, 1.0, 7.25, 20.0, 133.0] {
                let back = shape.tile_edge_from_area(hexagon_area(edge));
                assert!((back - edge).abs() < 1e-9, "{:?} {}", shape, edge);
            }
            assert_eq!(shape.tile_edge_from_area(0.0), 0.0);
            assert_eq!(shape.tile_edge_from_area(-3.0), 0.0);
        }
    }

    #[test]
    fn vertices_form_regular_hexagon() {
        for shape in [HexOrientation::PointyTop, HexOrientation::FlatTop] {
            let edge = 12.0;
            let c = Vec2::new(100.0, 50.0);
            let pts = shape.points_around(c, shape.tile_size(edge));
            for i in 0..6 {
                assert!((distance(pts[i], c) - edge).abs() < 1e-9);
                assert!((distance(pts[i], pts[(i + 1) % 6]) - edge).abs() < 1e-9);
            }
            assert!((polygon_area(&pts) - hexagon_area(edge)).abs() < 1e-6);
        }
    }

    #[test]
    fn grid_unit_fit_picks_limiting_axis() {
        let edge = PointyTopShape.tile_edge_from_grid_unit(TileSize { width: 100.0, height: 30.0 });
        assert!((edge - 20.0).abs() < 1e-9);
        let edge = FlatTopShape.tile_edge_from_grid_unit(TileSize { width: 30.0, height: 100.0 });
        assert!((edge - 20.0).abs() < 1e-9);
    }

    #[test]
    fn parity_offsets_handle_negative_indices() {
        assert_eq!(PointyTopShape.grid_offset_x(-1), 0.5);
        assert_eq!(PointyTopShape.grid_offset_x(-2), 0.0);
        assert_eq!(FlatTopShape.grid_offset_y(3), 0.5);
        assert_eq!(FlatTopShape.grid_offset_x(3), 0.0);
    }

    #[test]
    fn orientation_guess_from_extent() {
        let s = FlatTopShape.tile_size(5.0);
        assert_eq!(HexOrientation::from_hexagon_extent(s.width, s.height), HexOrientation::FlatTop);
        let s = PointyTopShape.tile_size(5.0);
        let o = HexOrientation::from_hexagon_extent(s.width, s.height);
        assert_eq!(o, HexOrientation::PointyTop);
    }
}
