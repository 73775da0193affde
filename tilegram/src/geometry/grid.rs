//! GridGeometry: convert between tile positions and plane coordinates.

use crate::config::Settings;
use crate::geometry::limits::MAX_TILE_COUNT_PER_AXIS;
use crate::geometry::shape::{HexOrientation, HexShape, StaggerAxis};
use crate::geometry::tolerance::EPS_EDGE;
use crate::model::{Position, TileCounts, TileSize, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;

/// Margin, in tiles, between the canvas origin and position 0.
pub const TILE_OFFSET: i32 = 1;

#[derive(Clone, Debug)]
pub struct GridGeometry {
    orientation: HexOrientation,
    tile_edge: f64,
    canvas: TileSize,
    tile_size: TileSize,
    tile_counts: TileCounts,
    // position -> center; cleared on every resize
    center_cache: RefCell<HashMap<Position, Vec2>>,
}

impl GridGeometry {
    pub fn new(
        orientation: HexOrientation,
        tile_edge: f64,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Self {
        let mut g = GridGeometry {
            orientation,
            tile_edge,
            canvas: TileSize { width: canvas_width, height: canvas_height },
            tile_size: TileSize::default(),
            tile_counts: TileCounts::default(),
            center_cache: RefCell::new(HashMap::new()),
        };
        g.resize();
        g
    }

    pub fn from_settings(settings: &Settings) -> Self {
        GridGeometry::new(
            settings.orientation,
            settings.tile_edge,
            settings.canvas_width,
            settings.canvas_height,
        )
    }

    pub fn orientation(&self) -> HexOrientation { self.orientation }
    pub fn tile_edge(&self) -> f64 { self.tile_edge }
    pub fn tile_size(&self) -> TileSize { self.tile_size }
    pub fn tile_counts(&self) -> TileCounts { self.tile_counts }
    pub fn canvas(&self) -> TileSize { self.canvas }

    /// True when the current edge leaves room for at least one tile.
    pub fn has_tiles(&self) -> bool { self.tile_counts.width > 0 && self.tile_counts.height > 0 }

    /// Distance between adjacent column and row centers.
    pub fn step(&self) -> TileSize {
        let unit = self.orientation.grid_unit();
        TileSize {
            width: self.tile_size.width * unit.width,
            height: self.tile_size.height * unit.height,
        }
    }

    pub fn set_tile_edge(&mut self, tile_edge: f64) {
        self.tile_edge = tile_edge;
        self.resize();
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas = TileSize { width, height };
        self.resize();
    }

    pub fn set_tile_edge_from_area(&mut self, area: f64) {
        let edge = self.orientation.tile_edge_from_area(area);
        self.set_tile_edge(edge);
    }

    /// Fit a grid spanning `max_x` by `max_y` positions, plus margins, into
    /// the canvas. Position (max_x, max_y) is always in bounds afterwards.
    pub fn set_tile_edge_from_max(&mut self, max_x: i32, max_y: i32, margins: i32) {
        let lines = |max: i32| {
            f64::from(max.max(0).saturating_add(margins.max(0)).saturating_add(2 * TILE_OFFSET + 2))
        };
        let footprint = TileSize {
            width: self.canvas.width / lines(max_x),
            height: self.canvas.height / lines(max_y),
        };
        let edge = self.orientation.tile_edge_from_grid_unit(footprint);
        self.set_tile_edge(edge);
    }

    pub fn resize(&mut self) {
        self.center_cache.borrow_mut().clear();
        if !(self.tile_edge > EPS_EDGE) || !self.tile_edge.is_finite() {
            self.tile_size = TileSize::default();
            self.tile_counts = TileCounts::default();
            return;
        }
        self.tile_size = self.orientation.tile_size(self.tile_edge);
        let step = self.step();
        let count = |extent: f64, step: f64| -> i32 {
            let n = (extent / step).floor() - f64::from(TILE_OFFSET * 2);
            if n.is_finite() { (n as i32).clamp(0, MAX_TILE_COUNT_PER_AXIS) } else { 0 }
        };
        self.tile_counts = TileCounts {
            width: count(self.canvas.width, step.width),
            height: count(self.canvas.height, step.height),
        };
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.tile_counts.width && p.y < self.tile_counts.height
    }

    pub fn for_each_tile_position<F: FnMut(Position)>(&self, mut f: F) {
        for x in 0..self.tile_counts.width {
            for y in 0..self.tile_counts.height {
                f(Position { x, y });
            }
        }
    }

    /// Center point of the tile at `position`.
    pub fn tile_center_point(&self, position: Position) -> Vec2 {
        if let Some(c) = self.center_cache.borrow().get(&position) {
            return *c;
        }
        let unit = self.orientation.grid_unit();
        let column = f64::from(position.x) + f64::from(TILE_OFFSET);
        let row = f64::from(position.y) + f64::from(TILE_OFFSET);
        let center = Vec2 {
            x: self.tile_size.width
                * (column * unit.width + self.orientation.grid_offset_x(position.y)),
            y: self.tile_size.height
                * (row * unit.height + self.orientation.grid_offset_y(position.x)),
        };
        self.center_cache.borrow_mut().insert(position, center);
        center
    }

    /// Hexagon vertices around `center`; `scale` < 1 leaves a gap between tiles.
    pub fn points_around(&self, center: Vec2, scale: f64) -> [Vec2; 6] {
        let size = TileSize {
            width: self.tile_size.width * scale,
            height: self.tile_size.height * scale,
        };
        self.orientation.points_around(center, size)
    }

    pub fn tile_points(&self, position: Position, scale: f64) -> [Vec2; 6] {
        self.points_around(self.tile_center_point(position), scale)
    }

    /// Nearest tile position to a plane point. The staggered axis is
    /// resolved second because its offset depends on the other axis.
    pub fn position_from_screen(&self, x: f64, y: f64) -> Option<Position> {
        let degenerate = self.tile_size.width <= 0.0 || self.tile_size.height <= 0.0;
        if degenerate || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let unit = self.orientation.grid_unit();
        let ux = x / self.tile_size.width;
        let uy = y / self.tile_size.height;
        let snap = |v: f64| -> i32 { (v.round() as i32).saturating_sub(TILE_OFFSET) };
        let p = match self.orientation.stagger_axis() {
            StaggerAxis::Rows => {
                let py = snap(uy / unit.height);
                let px = snap((ux - self.orientation.grid_offset_x(py)) / unit.width);
                Position { x: px, y: py }
            }
            StaggerAxis::Columns => {
                let px = snap(ux / unit.width);
                let py = snap((uy - self.orientation.grid_offset_y(px)) / unit.height);
                Position { x: px, y: py }
            }
        };
        Some(p)
    }

    #[cfg(test)]
    pub(crate) fn cached_centers(&self) -> usize { self.center_cache.borrow().len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointy() -> GridGeometry {
        GridGeometry::new(HexOrientation::PointyTop, 20.0, 1920.0, 1440.0)
    }

    #[test]
    fn origin_center_for_edge_20() {
        let g = pointy();
        let c = g.tile_center_point(Position::new(0, 0));
        assert!((c.x - 34.641_016).abs() < 1e-5);
        assert!((c.y - 30.0).abs() < 1e-9);
    }

    #[test]
    fn odd_rows_are_shifted_half_a_tile() {
        let g = pointy();
        let even = g.tile_center_point(Position::new(2, 2));
        let odd = g.tile_center_point(Position::new(2, 3));
        assert!((odd.x - even.x - g.tile_size().width * 0.5).abs() < 1e-9);
    }

    #[test]
    fn inverse_of_center_for_both_orientations() {
        for o in [HexOrientation::PointyTop, HexOrientation::FlatTop] {
            let g = GridGeometry::new(o, 13.0, 800.0, 600.0);
            g.for_each_tile_position(|p| {
                let c = g.tile_center_point(p);
                assert_eq!(g.position_from_screen(c.x, c.y), Some(p), "{:?}", o);
            });
        }
    }

    #[test]
    fn nearby_points_snap_to_tile() {
        let g = pointy();
        let p = Position::new(5, 7);
        let c = g.tile_center_point(p);
        let q = g.position_from_screen(c.x + 4.0, c.y - 3.0);
        assert_eq!(q, Some(p));
    }

    #[test]
    fn tile_counts_follow_canvas_and_edge() {
        let g = pointy();
        let step = g.step();
        assert_eq!(g.tile_counts().width, (1920.0 / step.width).floor() as i32 - 2);
        assert_eq!(g.tile_counts().height, (1440.0 / step.height).floor() as i32 - 2);
    }

    #[test]
    fn zero_edge_means_no_tiles() {
        let mut g = pointy();
        g.set_tile_edge_from_area(0.0);
        assert_eq!(g.tile_edge(), 0.0);
        assert!(!g.has_tiles());
        assert_eq!(g.position_from_screen(10.0, 10.0), None);
        let mut visited = 0;
        g.for_each_tile_position(|_| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn resize_is_idempotent_and_clears_cache() {
        let mut g = pointy();
        let p = Position::new(3, 4);
        let before = g.tile_center_point(p);
        let counts = g.tile_counts();
        assert_eq!(g.cached_centers(), 1);
        g.resize();
        assert_eq!(g.cached_centers(), 0);
        g.resize();
        assert_eq!(g.tile_counts(), counts);
        assert_eq!(g.tile_center_point(p), before);
    }

    #[test]
    fn fit_to_extent_keeps_every_tile_inside() {
        let mut g = pointy();
        g.set_tile_edge_from_max(120, 90, 6);
        assert!(g.contains(Position::new(120 + 2, 90 + 2)));
        assert!(g.tile_edge() > 0.0);
    }
}
