use crate::geometry::grid::GridGeometry;
use crate::model::Tile;
use std::collections::BTreeMap;

/// Deterministic fill for a region id. Numeric ids map through their
/// value; other ids through their last two characters.
pub fn region_color(id: &str) -> String {
    const SCALE_TO: u32 = 56;
    let number = match id.parse::<u64>() {
        Ok(n) => (n % SCALE_TO as u64) as u32,
        Err(_) => {
            let mut chars = id.chars().rev();
            let last = chars.next().map(|c| c as u32).unwrap_or(0);
            let prev = chars.next().map(|c| c as u32).unwrap_or(0);
            (last + prev * 10) % SCALE_TO
        }
    };
    let scalar = f64::from(number) / f64::from(SCALE_TO);
    format!("hsl({}, 87%, 70%)", 360.0 - (scalar * 180.0 + 180.0))
}

/// Hexagon subpaths for every tile of each region, keyed by region id.
pub fn region_paths(
    tiles: &[Tile],
    geometry: &GridGeometry,
    scale: f64,
) -> BTreeMap<String, String> {
    let mut paths: BTreeMap<String, String> = BTreeMap::new();
    for t in tiles {
        let pts = geometry.tile_points(t.position, scale);
        let d = paths.entry(t.id.clone()).or_default();
        if !d.is_empty() {
            d.push(' ');
        }
        d.push_str(&format!("M {:.2} {:.2}", pts[0].x, pts[0].y));
        for p in &pts[1..] {
            d.push_str(&format!(" L {:.2} {:.2}", p.x, p.y));
        }
        d.push_str(" Z");
    }
    paths
}

/// Whole-canvas SVG document of the tile grid, one path per region.
pub fn to_svg_document(tiles: &[Tile], geometry: &GridGeometry, scale: f64) -> String {
    let canvas = geometry.canvas();
    let mut out = format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" ",
            "width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
        ),
        w = canvas.width,
        h = canvas.height
    );
    for (id, d) in region_paths(tiles, geometry, scale) {
        out.push_str(&format!(
            "<path id=\"{}\" fill=\"{}\" d=\"{}\"/>",
            escape_attr(&id),
            region_color(&id),
            d
        ));
    }
    out.push_str("</svg>");
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}
