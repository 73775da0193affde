//! Topology document model.
//!
//! Arcs are always delta-encoded: the first point of an arc is absolute
//! (before `transform`), every following point is an offset from the one
//! before it. Geometries reference arcs by index; `-(k+1)` is arc `k`
//! reversed.

use crate::error::DecodeError;
use crate::geometry::limits;
use crate::model::{Region, TileSize, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Default for Transform {
    fn default() -> Self { Transform { scale: [1.0, 1.0], translate: [0.0, 0.0] } }
}

/// Arc references, nested to the depth the geometry type needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArcRefs {
    Line(Vec<i64>),
    Rings(Vec<Vec<i64>>),
    Polygons(Vec<Vec<Vec<i64>>>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// `None` for null geometries, which carry no shape.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arcs: Option<ArcRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl Geometry {
    pub fn polygon(id: &str, arc: i64) -> Self {
        Geometry {
            kind: Some("Polygon".into()),
            id: Some(Value::String(id.to_string())),
            arcs: Some(ArcRefs::Rings(vec![vec![arc]])),
            properties: None,
        }
    }

    pub fn multi_polygon(id: &str, arcs: impl IntoIterator<Item = i64>) -> Self {
        Geometry {
            kind: Some("MultiPolygon".into()),
            id: Some(Value::String(id.to_string())),
            arcs: Some(ArcRefs::Polygons(arcs.into_iter().map(|a| vec![vec![a]]).collect())),
            properties: None,
        }
    }

    /// Region ids may be strings or numbers in the wild.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.as_ref()?.get(key)?.as_f64()
    }

    /// Outer arc list of every polygon; holes are ignored.
    pub fn outer_rings(&self) -> Result<Vec<&[i64]>, DecodeError> {
        let kind = match self.kind.as_deref() {
            None => return Ok(Vec::new()),
            Some(k) => k,
        };
        let rings = match (kind, self.arcs.as_ref()) {
            ("Polygon", Some(ArcRefs::Rings(rings))) => {
                rings.first().map(|r| r.as_slice()).into_iter().collect()
            }
            ("MultiPolygon", Some(ArcRefs::Polygons(polys))) => {
                polys.iter().filter_map(|p| p.first()).map(|r| r.as_slice()).collect()
            }
            ("Polygon", Some(ArcRefs::Line(l))) | ("MultiPolygon", Some(ArcRefs::Line(l)))
                if l.is_empty() =>
            {
                Vec::new()
            }
            ("Polygon", None) | ("MultiPolygon", None) => Vec::new(),
            _ => return Err(DecodeError::UnsupportedGeometry(kind.to_string())),
        };
        Ok(rings)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub geometries: Vec<Geometry>,
}

impl GeometryCollection {
    pub fn new(geometries: Vec<Geometry>) -> Self {
        GeometryCollection { kind: "GeometryCollection".into(), geometries }
    }
}

/// Document-level tilegram metadata. Unknown keys are carried through.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_per_tile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilegram_metric_per_tile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<TileSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cartogram_area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilegram_cartogram_area: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TopologyProperties {
    pub fn metric_per_tile(&self) -> Option<f64> {
        self.metric_per_tile.or(self.tilegram_metric_per_tile).filter(|m| m.is_finite())
    }

    pub fn cartogram_area(&self) -> Option<f64> {
        self.cartogram_area.or(self.tilegram_cartogram_area).filter(|a| a.is_finite())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub objects: BTreeMap<String, GeometryCollection>,
    #[serde(default)]
    pub arcs: Vec<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<TopologyProperties>,
}

impl Topology {
    pub fn new() -> Self {
        Topology {
            kind: "Topology".into(),
            transform: None,
            objects: BTreeMap::new(),
            arcs: Vec::new(),
            properties: None,
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, DecodeError> {
        let doc: Topology = serde_json::from_str(s)?;
        doc.check_limits()?;
        Ok(doc)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reject documents beyond the ingestion caps before any arc is walked.
    pub fn check_limits(&self) -> Result<(), DecodeError> {
        if self.arcs.len() > limits::MAX_ARCS {
            return Err(DecodeError::LimitExceeded("arcs"));
        }
        let geometries: usize = self.objects.values().map(|o| o.geometries.len()).sum();
        if geometries > limits::MAX_GEOMETRIES {
            return Err(DecodeError::LimitExceeded("geometries"));
        }
        let mut total = 0usize;
        for arc in &self.arcs {
            if arc.len() > limits::MAX_POINTS_PER_ARC {
                return Err(DecodeError::LimitExceeded("points per arc"));
            }
            total += arc.len();
            if total > limits::MAX_POINTS_TOTAL {
                return Err(DecodeError::LimitExceeded("total points"));
            }
        }
        Ok(())
    }

    pub fn object(&self, name: &str) -> Result<&GeometryCollection, DecodeError> {
        self.objects.get(name).ok_or_else(|| DecodeError::MissingObject(name.to_string()))
    }

    /// Every arc as absolute plane points, transform applied.
    pub fn absolute_arcs(&self) -> Result<Vec<Vec<Vec2>>, DecodeError> {
        let t = self.transform.clone().unwrap_or_default();
        let mut out = Vec::with_capacity(self.arcs.len());
        for (i, arc) in self.arcs.iter().enumerate() {
            let (mut qx, mut qy) = (0.0f64, 0.0f64);
            let mut pts = Vec::with_capacity(arc.len());
            for d in arc {
                qx += d[0];
                qy += d[1];
                let p = Vec2 {
                    x: qx * t.scale[0] + t.translate[0],
                    y: qy * t.scale[1] + t.translate[1],
                };
                if !limits::in_coord_bounds(p.x) || !limits::in_coord_bounds(p.y) {
                    return Err(DecodeError::NonFiniteCoordinate(i));
                }
                pts.push(p);
            }
            out.push(pts);
        }
        Ok(out)
    }

    /// Concatenate the referenced arcs into one path.
    pub fn resolve_ring(
        arcs: &[Vec<Vec2>],
        refs: &[i64],
        geometry: &str,
    ) -> Result<Vec<Vec2>, DecodeError> {
        let mut path: Vec<Vec2> = Vec::new();
        for &r in refs {
            let (index, reverse) = if r < 0 { (-(r + 1), true) } else { (r, false) };
            let arc = usize::try_from(index)
                .ok()
                .and_then(|i| arcs.get(i))
                .ok_or_else(|| DecodeError::InvalidArc {
                    geometry: geometry.to_string(),
                    index: r,
                    arcs: arcs.len(),
                })?;
            let mut pts = arc.clone();
            if reverse {
                pts.reverse();
            }
            if let (Some(last), Some(first)) = (path.last(), pts.first()) {
                if last == first {
                    pts.remove(0);
                }
            }
            path.extend(pts);
        }
        Ok(path)
    }

    /// Read an object as region outlines, one ring per polygon.
    /// Null geometries and geometries without an id are skipped.
    pub fn to_regions(&self, object: &str) -> Result<Vec<Region>, DecodeError> {
        let collection = self.object(object)?;
        let arcs = self.absolute_arcs()?;
        let mut regions = Vec::with_capacity(collection.geometries.len());
        for g in &collection.geometries {
            let id = match g.id_string() {
                Some(id) => id,
                None => continue,
            };
            let mut polygons = Vec::new();
            for refs in g.outer_rings()? {
                let ring = Topology::resolve_ring(&arcs, refs, &id)?;
                if ring.len() >= 3 {
                    polygons.push(ring);
                }
            }
            if !polygons.is_empty() {
                regions.push(Region { id, polygons });
            }
        }
        Ok(regions)
    }

    /// Build a document holding `regions` under `object`, one delta arc per ring.
    pub fn from_regions(regions: &[Region], object: &str) -> Self {
        let mut topo = Topology::new();
        topo.transform = Some(Transform::default());
        let mut geometries = Vec::with_capacity(regions.len());
        for r in regions {
            let first = topo.arcs.len() as i64;
            for ring in &r.polygons {
                topo.arcs.push(delta_encode(ring));
            }
            let count = r.polygons.len() as i64;
            let g = if count == 1 {
                Geometry::polygon(&r.id, first)
            } else {
                Geometry::multi_polygon(&r.id, first..first + count)
            };
            geometries.push(g);
        }
        topo.objects.insert(object.to_string(), GeometryCollection::new(geometries));
        topo
    }
}

impl Default for Topology {
    fn default() -> Self { Topology::new() }
}

pub fn delta_encode(points: &[Vec2]) -> Vec<[f64; 2]> {
    let mut out = Vec::with_capacity(points.len());
    let mut prev: Option<Vec2> = None;
    for p in points {
        match prev {
            None => out.push([p.x, p.y]),
            Some(q) => out.push([p.x - q.x, p.y - q.y]),
        }
        prev = Some(*p);
    }
    out
}
