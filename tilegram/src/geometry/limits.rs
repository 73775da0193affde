// Caps applied before a topology document is decoded

// Document size caps
pub const MAX_GEOMETRIES: usize = 200_000;
pub const MAX_ARCS: usize = 500_000;

// Arcs
pub const MAX_POINTS_PER_ARC: usize = 100_000;
pub const MAX_POINTS_TOTAL: usize = 5_000_000;

// Grid caps
pub const MAX_TILE_COUNT_PER_AXIS: i32 = 4_096;

// Numeric bounds
pub const COORD_MIN: f64 = -1.0e9;
pub const COORD_MAX: f64 = 1.0e9;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }
