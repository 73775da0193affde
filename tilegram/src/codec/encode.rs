use crate::geometry::grid::GridGeometry;
use crate::geometry::shape::HexShape;
use crate::model::{Tile, Vec2};
use crate::topology::{
    delta_encode, Geometry, GeometryCollection, Topology, TopologyProperties, Transform,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Name of the object holding the tiles.
pub const TILES_OBJECT: &str = "tiles";
pub const CODEC_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodeOptions {
    pub metric_per_tile: Option<f64>,
    pub cartogram_area: Option<f64>,
}

/// Encode tiles as a topology document: one geometry per region, one
/// closed hexagon ring per tile, y reflected so the document is y-up.
pub fn encode(tiles: &[Tile], geometry: &GridGeometry, options: &EncodeOptions) -> Topology {
    let mut sorted: Vec<&Tile> = tiles.iter().collect();
    sorted.sort_by(|a, b| {
        (a.position.y, a.position.x)
            .cmp(&(b.position.y, b.position.x))
            .then_with(|| a.id.cmp(&b.id))
    });

    // group by id, first appearance wins the order
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Tile>)> = Vec::new();
    for t in sorted {
        let slot = *order.entry(t.id.as_str()).or_insert_with(|| {
            groups.push((t.id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(t);
    }

    let reflect = reflection_height(tiles, geometry);
    let mut arcs = Vec::with_capacity(tiles.len());
    let mut geometries = Vec::with_capacity(groups.len());
    for (id, members) in &groups {
        let first = arcs.len() as i64;
        for t in members {
            let hex = geometry.tile_points(t.position, 1.0);
            let mut ring: Vec<Vec2> =
                hex.iter().map(|p| Vec2 { x: p.x, y: reflect - p.y }).collect();
            ring.push(ring[0]);
            arcs.push(delta_encode(&ring));
        }
        let mut g = if members.len() == 1 {
            Geometry::polygon(id, first)
        } else {
            Geometry::multi_polygon(id, first..first + members.len() as i64)
        };
        let values: Vec<f64> = members.iter().filter_map(|t| t.value).collect();
        if !values.is_empty() {
            let mut props = Map::new();
            props.insert("tilegramValue".into(), Value::from(values.iter().sum::<f64>()));
            g.properties = Some(props);
        }
        geometries.push(g);
    }

    let properties = TopologyProperties {
        metric_per_tile: options.metric_per_tile,
        version: Some(CODEC_VERSION.to_string()),
        tile_size: Some(geometry.tile_size()),
        orientation: Some(geometry.orientation().as_str().to_string()),
        cartogram_area: options.cartogram_area,
        ..TopologyProperties::default()
    };

    let mut topo = Topology::new();
    topo.transform = Some(Transform::default());
    topo.arcs = arcs;
    topo.objects.insert(TILES_OBJECT.to_string(), GeometryCollection::new(geometries));
    topo.properties = Some(properties);
    log::debug!("encoded {} tiles in {} regions", tiles.len(), groups.len());
    topo
}

/// Smallest even multiple of the row step that keeps every reflected
/// vertex at y >= 0. Even, so reflected rows keep their parity.
fn reflection_height(tiles: &[Tile], geometry: &GridGeometry) -> f64 {
    let row = geometry.orientation().grid_unit().height * geometry.tile_size().height;
    if !(row > 0.0) {
        return 0.0;
    }
    let max_y = tiles
        .iter()
        .map(|t| geometry.tile_center_point(t.position).y + geometry.tile_size().height)
        .fold(0.0f64, f64::max);
    let pairs = (max_y / (2.0 * row)).ceil().max(1.0);
    pairs * 2.0 * row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shape::HexOrientation;
    use crate::topology::ArcRefs;

    fn geometry() -> GridGeometry {
        GridGeometry::new(HexOrientation::PointyTop, 20.0, 1920.0, 1440.0)
    }

    #[test]
    fn groups_regions_in_first_appearance_order() {
        let tiles = vec![Tile::new("B", 0, 1), Tile::new("A", 1, 0), Tile::new("A", 0, 0)];
        let topo = encode(&tiles, &geometry(), &EncodeOptions::default());
        let gs = &topo.objects[TILES_OBJECT].geometries;
        assert_eq!(gs.len(), 2);
        assert_eq!(gs[0].id_string().as_deref(), Some("A"));
        assert_eq!(gs[0].kind.as_deref(), Some("MultiPolygon"));
        assert_eq!(gs[0].arcs, Some(ArcRefs::Polygons(vec![vec![vec![0]], vec![vec![1]]])));
        assert_eq!(gs[1].kind.as_deref(), Some("Polygon"));
        assert_eq!(gs[1].arcs, Some(ArcRefs::Rings(vec![vec![2]])));
        assert_eq!(topo.arcs.len(), 3);
        assert!(topo.arcs.iter().all(|a| a.len() == 7));
    }

    #[test]
    fn rings_close_and_stay_above_zero() {
        let tiles = vec![Tile::new("A", 3, 4)];
        let topo = encode(&tiles, &geometry(), &EncodeOptions::default());
        let ring = &topo.absolute_arcs().unwrap()[0];
        assert_eq!(ring.first(), ring.last());
        assert!(ring.iter().all(|p| p.y >= 0.0));
    }

    #[test]
    fn deterministic_for_any_input_order() {
        let a = vec![Tile::new("A", 0, 0), Tile::new("B", 1, 0), Tile::new("A", 2, 2)];
        let mut b = a.clone();
        b.reverse();
        let g = geometry();
        let options = EncodeOptions::default();
        assert_eq!(encode(&a, &g, &options), encode(&b, &g, &options));
    }

    #[test]
    fn values_and_metadata() {
        let mut tiles = vec![Tile::new("A", 0, 0), Tile::new("A", 1, 0)];
        tiles[0].value = Some(10.0);
        tiles[1].value = Some(5.0);
        let opts = EncodeOptions { metric_per_tile: Some(2500.0), cartogram_area: Some(1.0e6) };
        let topo = encode(&tiles, &geometry(), &opts);
        let g = &topo.objects[TILES_OBJECT].geometries[0];
        assert_eq!(g.property_f64("tilegramValue"), Some(15.0));
        let props = topo.properties.unwrap();
        assert_eq!(props.metric_per_tile, Some(2500.0));
        assert_eq!(props.orientation.as_deref(), Some("pointy-top"));
        assert_eq!(props.version.as_deref(), Some(CODEC_VERSION));
        assert_eq!(props.cartogram_area, Some(1.0e6));
    }
}
