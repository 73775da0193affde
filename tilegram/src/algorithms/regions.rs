//! Region lookup over a (distorted) boundary map.
//!
//! Bounds are precomputed once per boundary so that most lattice samples
//! are rejected without a polygon test. Polygons under the configured
//! minimum area are dropped from lookups: they are slivers left by the
//! distortion and would otherwise claim stray tiles.

use crate::algorithms::ring::point_in_ring;
use crate::geometry::math::{polygon_area, Bounds};
use crate::model::{Region, Vec2};

/// Answers which region, if any, covers a plane point.
pub trait FeatureLookup {
    fn feature_at_point(&self, point: Vec2) -> Option<&str>;
}

#[derive(Clone, Debug)]
struct ProjectedRegion {
    bounds: Bounds,
    paths: Vec<usize>, // indices into the region's polygons that passed the area filter
}

#[derive(Clone, Debug)]
pub struct RegionMap {
    regions: Vec<Region>,
    projected: Vec<ProjectedRegion>,
    general_bounds: Bounds,
}

impl RegionMap {
    pub fn new(regions: Vec<Region>, min_path_area: f64) -> Self {
        let mut general_bounds = Bounds::empty();
        let mut filtered = 0usize;
        let projected = regions
            .iter()
            .map(|region| {
                let mut bounds = Bounds::empty();
                let mut paths = Vec::with_capacity(region.polygons.len());
                for (i, ring) in region.polygons.iter().enumerate() {
                    bounds.include(&Bounds::of_points(ring));
                    if polygon_area(ring) > min_path_area {
                        paths.push(i);
                    } else {
                        filtered += 1;
                    }
                }
                general_bounds.include(&bounds);
                ProjectedRegion { bounds, paths }
            })
            .collect();
        if filtered > 0 {
            log::trace!("ignoring {} boundary polygons under area {}", filtered, min_path_area);
        }
        RegionMap { regions, projected, general_bounds }
    }

    pub fn regions(&self) -> &[Region] { &self.regions }

    pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    /// Sum of every region's polygon areas.
    pub fn total_area(&self) -> f64 {
        total_area(&self.regions)
    }
}

impl FeatureLookup for RegionMap {
    fn feature_at_point(&self, point: Vec2) -> Option<&str> {
        if !self.general_bounds.contains(point) {
            return None;
        }
        for (region, projected) in self.regions.iter().zip(self.projected.iter()) {
            if !projected.bounds.contains(point) {
                continue;
            }
            if projected.paths.iter().any(|&i| point_in_ring(point, &region.polygons[i])) {
                return Some(region.id.as_str());
            }
        }
        None
    }
}

pub fn total_area(regions: &[Region]) -> f64 {
    regions.iter().flat_map(|r| r.polygons.iter()).map(|ring| polygon_area(ring)).sum()
}
