use proptest::prelude::*;
use std::collections::HashSet;
use tilegram::geometry::tolerance::is_odd;
use tilegram::{
    decode, decode_str, encode, populate_tiles, EncodeOptions, GridGeometry, HexOrientation,
    Region, RegionMap, Settings, Tile, Vec2, TILES_OBJECT,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Tiles as (id, x, y) relative to the minimum corner, sorted.
fn normalized(tiles: &[Tile]) -> Vec<(String, i32, i32)> {
    let min_x = tiles.iter().map(|t| t.position.x).min().unwrap_or(0);
    let min_y = tiles.iter().map(|t| t.position.y).min().unwrap_or(0);
    let mut v: Vec<_> = tiles
        .iter()
        .map(|t| (t.id.clone(), t.position.x - min_x, t.position.y - min_y))
        .collect();
    v.sort();
    v
}

/// Minimal topology JSON with one geometry collection.
fn document(object: &str, geometries: &str, arcs: &str) -> String {
    format!(
        concat!(
            r#"{{"type":"Topology","objects":{{"{}":"#,
            r#"{{"type":"GeometryCollection","geometries":[{}]}}}},"arcs":[{}]}}"#
        ),
        object, geometries, arcs
    )
}

fn staggered_min(tiles: &[Tile], orientation: HexOrientation) -> i32 {
    match orientation {
        HexOrientation::PointyTop => tiles.iter().map(|t| t.position.y).min().unwrap_or(0),
        HexOrientation::FlatTop => tiles.iter().map(|t| t.position.x).min().unwrap_or(0),
    }
}

fn orientation_strategy() -> impl Strategy<Value = HexOrientation> {
    prop_oneof![Just(HexOrientation::PointyTop), Just(HexOrientation::FlatTop)]
}

fn tiles_strategy() -> impl Strategy<Value = Vec<Tile>> {
    prop::collection::vec((0i32..40, 0i32..30, 0u8..4), 1..120).prop_map(|raw| {
        let mut seen = HashSet::new();
        raw.into_iter()
            .filter(|(x, y, _)| seen.insert((*x, *y)))
            .map(|(x, y, r)| Tile::new(format!("R{}", r), x, y))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn decode_of_encode_is_a_translation(
        tiles in tiles_strategy(),
        orientation in orientation_strategy(),
        edge in 4.0f64..30.0,
    ) {
        let geometry = GridGeometry::new(orientation, edge, 4000.0, 4000.0);
        let options = EncodeOptions { metric_per_tile: Some(1234.5), cartogram_area: None };
        let doc = encode(&tiles, &geometry, &options);
        let json = doc.to_json_string().unwrap();
        let decoded = decode_str(&json, &Settings::default()).unwrap();

        prop_assert_eq!(decoded.tiles.len(), tiles.len());
        prop_assert_eq!(normalized(&decoded.tiles), normalized(&tiles));
        prop_assert_eq!(decoded.orientation, orientation);
        prop_assert!((decoded.tile_edge - edge).abs() < 1e-9);
        prop_assert_eq!(decoded.metric_per_tile, Some(1234.5));
        // hex adjacency survives only if the staggered axis moved by an even amount
        prop_assert_eq!(
            is_odd(staggered_min(&decoded.tiles, orientation)),
            is_odd(staggered_min(&tiles, orientation))
        );
    }
}

#[test]
fn three_tile_example() {
    init_logging();
    let geometry = GridGeometry::from_settings(&Settings::default());
    let tiles = vec![Tile::new("A", 0, 0), Tile::new("A", 1, 0), Tile::new("B", 0, 1)];
    let options = EncodeOptions { metric_per_tile: Some(0.1 + 0.2), cartogram_area: None };
    let doc = encode(&tiles, &geometry, &options);
    let decoded = decode(&doc, &Settings::default()).unwrap();
    assert_eq!(decoded.tiles.len(), 3);
    let ids: HashSet<&str> = decoded.tiles.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(decoded.metric_per_tile, Some(0.1 + 0.2));
    assert_eq!(normalized(&decoded.tiles), normalized(&tiles));
}

#[test]
fn decoded_positions_start_at_the_import_margin() {
    let geometry = GridGeometry::from_settings(&Settings::default());
    let tiles = vec![Tile::new("A", 10, 10), Tile::new("A", 11, 10), Tile::new("B", 12, 11)];
    let settings = Settings::default();
    let decoded = decode(&encode(&tiles, &geometry, &EncodeOptions::default()), &settings).unwrap();
    let min_x = decoded.tiles.iter().map(|t| t.position.x).min().unwrap();
    let min_y = decoded.tiles.iter().map(|t| t.position.y).min().unwrap();
    assert_eq!(min_x, settings.import_tile_margins);
    assert_eq!(min_y, settings.import_tile_margins);
}

#[test]
fn populated_region_survives_round_trip() {
    init_logging();
    for orientation in [HexOrientation::PointyTop, HexOrientation::FlatTop] {
        let geometry = GridGeometry::new(orientation, 12.0, 1920.0, 1440.0);
        let regions = vec![
            Region {
                id: "06".into(),
                polygons: vec![vec![
                    Vec2::new(100.0, 100.0),
                    Vec2::new(500.0, 120.0),
                    Vec2::new(300.0, 600.0),
                ]],
            },
            Region {
                id: "41".into(),
                polygons: vec![
                    vec![
                        Vec2::new(700.0, 100.0),
                        Vec2::new(900.0, 100.0),
                        Vec2::new(900.0, 300.0),
                        Vec2::new(700.0, 300.0),
                    ],
                    vec![
                        Vec2::new(1000.0, 400.0),
                        Vec2::new(1100.0, 400.0),
                        Vec2::new(1100.0, 480.0),
                    ],
                ],
            },
        ];
        let map = RegionMap::new(regions, 0.5);
        let mut tiles = populate_tiles(&geometry, &map);
        for t in tiles.iter_mut() {
            t.value = Some(1.0);
        }
        let doc = encode(&tiles, &geometry, &EncodeOptions::default());
        assert_eq!(doc.objects[TILES_OBJECT].geometries.len(), 2);
        let decoded = decode(&doc, &Settings::default()).unwrap();
        assert_eq!(normalized(&decoded.tiles), normalized(&tiles));
        // region totals come back as even per-tile shares
        assert!(decoded.tiles.iter().all(|t| (t.value.unwrap() - 1.0).abs() < 1e-9));
    }
}

#[test]
fn error_codes_for_malformed_documents() {
    let settings = Settings::default();
    assert_eq!(decode_str("{not json", &settings).unwrap_err().code(), "invalid_json");
    let code = |object: &str, geometries: &str, arcs: &str| {
        let json = document(object, geometries, arcs);
        decode_str(&json, &settings).unwrap_err().code()
    };
    assert_eq!(code("states", "", ""), "missing_object");
    assert_eq!(code("tiles", "", ""), "empty_geometries");
    let lone = r#"{"type":"Polygon","id":"A","arcs":[[4]]}"#;
    assert_eq!(code("tiles", lone, ""), "invalid_arc");
    let triangle = r#"{"type":"Polygon","id":"A","arcs":[[0]]}"#;
    assert_eq!(code("tiles", triangle, "[[0,0],[1,0],[0,1]]"), "malformed_hexagon");
}

#[test]
fn null_geometries_are_skipped() {
    let geometry = GridGeometry::from_settings(&Settings::default());
    let tiles = vec![Tile::new("A", 0, 0), Tile::new("A", 1, 0)];
    let mut doc = encode(&tiles, &geometry, &EncodeOptions::default());
    let collection = doc.objects.get_mut(TILES_OBJECT).unwrap();
    collection.geometries.push(serde_json::from_str(r#"{"type":null,"id":"ghost"}"#).unwrap());
    let decoded = decode(&doc, &Settings::default()).unwrap();
    assert_eq!(decoded.tiles.len(), 2);
    assert!(decoded.tiles.iter().all(|t| t.id == "A"));
}
