use crate::codec::encode::TILES_OBJECT;
use crate::codec::infer::infer_tile_edge;
use crate::config::Settings;
use crate::error::DecodeError;
use crate::geometry::grid::GridGeometry;
use crate::geometry::limits::MAX_TILE_COUNT_PER_AXIS;
use crate::geometry::math::{distance, mean_point, Bounds};
use crate::geometry::shape::{HexOrientation, HexShape, StaggerAxis};
use crate::geometry::tolerance::EPS_EDGE;
use crate::model::{Position, Tile, TileSize, Vec2};
use crate::topology::Topology;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedTilegram {
    pub tiles: Vec<Tile>,
    pub metric_per_tile: Option<f64>,
    pub cartogram_area: Option<f64>,
    pub orientation: HexOrientation,
    pub tile_edge: f64,
    pub tile_size: TileSize,
}

impl DecodedTilegram {
    /// Largest x and y among the decoded positions.
    pub fn max_position(&self) -> Position {
        self.tiles.iter().fold(Position::default(), |m, t| {
            Position::new(m.x.max(t.position.x), m.y.max(t.position.y))
        })
    }
}

struct TilePoint {
    id: String,
    center: Vec2,
}

pub fn decode_str(json: &str, settings: &Settings) -> Result<DecodedTilegram, DecodeError> {
    let doc = Topology::from_json_str(json)?;
    decode(&doc, settings)
}

/// Rebuild tiles from a tilegram document. Nothing is returned unless
/// every geometry decodes.
pub fn decode(doc: &Topology, settings: &Settings) -> Result<DecodedTilegram, DecodeError> {
    doc.check_limits()?;
    let collection = doc.object(TILES_OBJECT)?;
    if collection.geometries.is_empty() {
        return Err(DecodeError::EmptyGeometries(TILES_OBJECT.to_string()));
    }
    let arcs = doc.absolute_arcs()?;

    let mut points: Vec<TilePoint> = Vec::with_capacity(collection.geometries.len());
    let mut region_values: HashMap<String, f64> = HashMap::new();
    let mut region_counts: HashMap<String, usize> = HashMap::new();
    let mut first_extent: Option<Bounds> = None;
    for g in &collection.geometries {
        if g.kind.is_none() {
            continue;
        }
        let id = match g.id_string() {
            Some(id) => id,
            None => {
                log::warn!("skipping tile geometry without an id");
                continue;
            }
        };
        for refs in g.outer_rings()? {
            let path = Topology::resolve_ring(&arcs, refs, &id)?;
            if path.len() < 6 {
                return Err(DecodeError::MalformedHexagon { geometry: id, points: path.len() });
            }
            let center = mean_point(&path, 6)
                .ok_or(DecodeError::MalformedHexagon { geometry: id.clone(), points: 0 })?;
            if first_extent.is_none() {
                first_extent = Some(Bounds::of_points(&path[..6]));
            }
            // documents are y-up; the plane is y-down
            points.push(TilePoint { id: id.clone(), center: Vec2 { x: center.x, y: -center.y } });
            *region_counts.entry(id.clone()).or_insert(0) += 1;
        }
        if let Some(v) = g.property_f64("tilegramValue") {
            region_values.entry(id).or_insert(v);
        }
    }
    if points.is_empty() {
        return Err(DecodeError::EmptyGeometries(TILES_OBJECT.to_string()));
    }

    let props = doc.properties.clone().unwrap_or_default();
    let orientation = props
        .orientation
        .as_deref()
        .and_then(HexOrientation::parse)
        .or_else(|| {
            first_extent.map(|b| HexOrientation::from_hexagon_extent(b.width(), b.height()))
        })
        .unwrap_or_default();

    let centers: Vec<Vec2> = points.iter().map(|p| p.center).collect();
    let tile_edge = match props.tile_size {
        Some(size) if orientation.tile_edge_from_size(size) > EPS_EDGE => {
            orientation.tile_edge_from_size(size)
        }
        _ => infer_tile_edge(&centers, orientation)?,
    };
    let geometry =
        GridGeometry::new(orientation, tile_edge, settings.canvas_width, settings.canvas_height);
    let positions = snap_positions(&centers, &geometry)?;
    let positions = normalize(&positions, orientation, settings.import_tile_margins)?;

    let mut seen = HashSet::with_capacity(positions.len());
    let mut tiles = Vec::with_capacity(positions.len());
    let mut duplicates = 0usize;
    for (p, position) in points.into_iter().zip(positions) {
        if !seen.insert(position) {
            duplicates += 1;
            continue;
        }
        let value = match (region_values.get(&p.id), region_counts.get(&p.id)) {
            (Some(v), Some(&n)) if n > 0 => Some(v / n as f64),
            _ => None,
        };
        tiles.push(Tile { id: p.id, position, value });
    }
    if duplicates > 0 {
        log::warn!("{} tiles landed on occupied positions and were dropped", duplicates);
    }
    log::debug!("decoded {} tiles ({:?}, edge {:.3})", tiles.len(), orientation, tile_edge);

    Ok(DecodedTilegram {
        tiles,
        metric_per_tile: props.metric_per_tile(),
        cartogram_area: props.cartogram_area(),
        orientation,
        tile_edge,
        tile_size: orientation.tile_size(tile_edge),
    })
}

/// Map centers onto lattice positions relative to the first center.
/// The origin may sit on either parity of the staggered axis; the
/// anchor whose lattice fits every center wins.
fn snap_positions(centers: &[Vec2], geometry: &GridGeometry) -> Result<Vec<Position>, DecodeError> {
    let origin = centers[0];
    let base = geometry
        .position_from_screen(origin.x, origin.y)
        .ok_or_else(|| DecodeError::InferenceAmbiguity("tile spacing is zero".into()))?;
    let alternate = match geometry.orientation().stagger_axis() {
        StaggerAxis::Rows => Position::new(base.x, base.y + 1),
        StaggerAxis::Columns => Position::new(base.x + 1, base.y),
    };
    let tolerance = geometry.tile_edge() * 0.05;
    let mut best: Option<(f64, Vec<Position>)> = None;
    for anchor in [base, alternate] {
        let a = geometry.tile_center_point(anchor);
        let (ox, oy) = (origin.x - a.x, origin.y - a.y);
        let mut worst = 0.0f64;
        let mut positions = Vec::with_capacity(centers.len());
        for c in centers {
            let q = Vec2 { x: c.x - ox, y: c.y - oy };
            let p = geometry
                .position_from_screen(q.x, q.y)
                .ok_or_else(|| DecodeError::InferenceAmbiguity("tile spacing is zero".into()))?;
            worst = worst.max(distance(geometry.tile_center_point(p), q));
            positions.push(p);
        }
        if worst <= tolerance {
            return Ok(positions);
        }
        if best.as_ref().map_or(true, |(w, _)| worst < *w) {
            best = Some((worst, positions));
        }
    }
    let (worst, positions) =
        best.ok_or_else(|| DecodeError::InferenceAmbiguity("no lattice fits".into()))?;
    log::warn!("tile centers are up to {:.3} off the lattice", worst);
    Ok(positions)
}

/// Shift positions so the minimum on each axis is `margin`. The shift
/// along the staggered axis stays even to keep neighbours adjacent.
fn normalize(
    positions: &[Position],
    orientation: HexOrientation,
    margin: i32,
) -> Result<Vec<Position>, DecodeError> {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (i64::MAX, i64::MAX, i64::MIN, i64::MIN);
    for p in positions {
        min_x = min_x.min(p.x as i64);
        min_y = min_y.min(p.y as i64);
        max_x = max_x.max(p.x as i64);
        max_y = max_y.max(p.y as i64);
    }
    let limit = MAX_TILE_COUNT_PER_AXIS as i64;
    if max_x - min_x >= limit || max_y - min_y >= limit {
        return Err(DecodeError::LimitExceeded("tile extent"));
    }
    let mut shift_x = margin as i64 - min_x;
    let mut shift_y = margin as i64 - min_y;
    match orientation.stagger_axis() {
        StaggerAxis::Rows if shift_y.rem_euclid(2) == 1 => shift_y += 1,
        StaggerAxis::Columns if shift_x.rem_euclid(2) == 1 => shift_x += 1,
        _ => {}
    }
    Ok(positions
        .iter()
        .map(|p| Position::new((p.x as i64 + shift_x) as i32, (p.y as i64 + shift_y) as i32))
        .collect())
}
