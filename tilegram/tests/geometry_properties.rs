use proptest::prelude::*;
use tilegram::geometry::math::{distance, polygon_area};
use tilegram::geometry::shape::hexagon_area;
use tilegram::{GridGeometry, HexOrientation, HexShape, Position};

fn orientation_strategy() -> impl Strategy<Value = HexOrientation> {
    prop_oneof![Just(HexOrientation::PointyTop), Just(HexOrientation::FlatTop)]
}

proptest! {
    #[test]
    fn screen_position_inverts_tile_center(
        orientation in orientation_strategy(),
        edge in 2.0f64..60.0,
        x in 0i32..200,
        y in 0i32..200,
    ) {
        let g = GridGeometry::new(orientation, edge, 100_000.0, 100_000.0);
        let p = Position::new(x, y);
        let c = g.tile_center_point(p);
        prop_assert_eq!(g.position_from_screen(c.x, c.y), Some(p));
        // a point well inside the hexagon still resolves to it
        let nudge = edge * 0.3;
        prop_assert_eq!(g.position_from_screen(c.x + nudge, c.y - nudge), Some(p));
    }

    #[test]
    fn edge_from_area_inverts_hexagon_area(
        orientation in orientation_strategy(),
        edge in 0.01f64..500.0,
    ) {
        let back = orientation.tile_edge_from_area(hexagon_area(edge));
        prop_assert!((back - edge).abs() <= edge * 1e-12);
    }

    #[test]
    fn tile_points_are_a_regular_hexagon(
        orientation in orientation_strategy(),
        edge in 1.0f64..80.0,
        x in 0i32..50,
        y in 0i32..50,
    ) {
        let g = GridGeometry::new(orientation, edge, 20_000.0, 20_000.0);
        let pts = g.tile_points(Position::new(x, y), 1.0);
        for i in 0..6 {
            let side = distance(pts[i], pts[(i + 1) % 6]);
            prop_assert!((side - edge).abs() < 1e-9 * edge.max(1.0) * 10.0);
        }
        prop_assert!((polygon_area(&pts) - hexagon_area(edge)).abs() < 1e-6 * hexagon_area(edge));
    }

    #[test]
    fn neighbours_share_an_edge_length_of_spacing(
        orientation in orientation_strategy(),
        edge in 1.0f64..80.0,
        x in 0i32..50,
        y in 0i32..50,
    ) {
        let g = GridGeometry::new(orientation, edge, 20_000.0, 20_000.0);
        let c = g.tile_center_point(Position::new(x, y));
        let along = match orientation {
            HexOrientation::PointyTop => g.tile_center_point(Position::new(x + 1, y)),
            HexOrientation::FlatTop => g.tile_center_point(Position::new(x, y + 1)),
        };
        prop_assert!((distance(c, along) - 3f64.sqrt() * edge).abs() < 1e-9 * edge * 10.0);
    }

    #[test]
    fn resize_is_idempotent(
        orientation in orientation_strategy(),
        edge in 0.0f64..100.0,
        w in 0.0f64..4000.0,
        h in 0.0f64..4000.0,
    ) {
        let mut g = GridGeometry::new(orientation, edge, w, h);
        let counts = g.tile_counts();
        let size = g.tile_size();
        let center = g.tile_center_point(Position::new(3, 5));
        g.resize();
        g.resize();
        prop_assert_eq!(g.tile_counts(), counts);
        prop_assert_eq!(g.tile_size(), size);
        prop_assert_eq!(g.tile_center_point(Position::new(3, 5)), center);
        prop_assert!(counts.width >= 0 && counts.height >= 0);
    }

    #[test]
    fn fitted_edge_keeps_the_far_corner_in_bounds(
        orientation in orientation_strategy(),
        max_x in 0i32..300,
        max_y in 0i32..300,
        margins in (0i32..5).prop_map(|m| m * 2),
    ) {
        let mut g = GridGeometry::new(orientation, 20.0, 1920.0, 1440.0);
        g.set_tile_edge_from_max(max_x, max_y, margins);
        prop_assert!(g.contains(Position::new(max_x, max_y)));
    }
}

#[test]
fn degenerate_edges_give_an_empty_grid() {
    for edge in [0.0, -4.0, f64::NAN, f64::INFINITY] {
        let g = GridGeometry::new(HexOrientation::PointyTop, edge, 1920.0, 1440.0);
        assert!(!g.has_tiles(), "{}", edge);
        assert_eq!(g.position_from_screen(10.0, 10.0), None);
    }
}
