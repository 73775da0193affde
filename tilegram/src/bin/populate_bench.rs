#[cfg(feature = "bench_populate")]
use std::time::Instant;
#[cfg(feature = "bench_populate")]
use tilegram::{
    decode, encode, populate_tiles, EncodeOptions, GridGeometry, HexOrientation, Region,
    RegionMap, Settings, Vec2,
};

#[cfg(not(feature = "bench_populate"))]
fn main() {
    panic!("populate_bench requires --features bench_populate");
}

#[cfg(feature = "bench_populate")]
fn checkerboard(n: usize, size: f64) -> Vec<Region> {
    let mut regions = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let (x, y) = (40.0 + i as f64 * size, 40.0 + j as f64 * size);
            regions.push(Region {
                id: format!("{:02}{:02}", i, j),
                polygons: vec![vec![
                    Vec2::new(x, y),
                    Vec2::new(x + size, y),
                    Vec2::new(x + size, y + size),
                    Vec2::new(x, y + size),
                ]],
            });
        }
    }
    regions
}

#[cfg(feature = "bench_populate")]
fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let mut n = 12usize;
    let mut edge = 8.0f64;
    let mut repeats = 10usize;
    for a in &args[1..] {
        if let Some(val) = a.strip_prefix("--regions=") {
            if let Ok(v) = val.parse() {
                n = v;
            }
        } else if let Some(val) = a.strip_prefix("--edge=") {
            if let Ok(v) = val.parse() {
                edge = v;
            }
        } else if let Some(val) = a.strip_prefix("--repeats=") {
            if let Ok(v) = val.parse() {
                repeats = v;
            }
        }
    }

    let settings = Settings::default();
    let size = (settings.canvas_height - 80.0) / n as f64;
    let map = RegionMap::new(checkerboard(n, size), settings.min_path_area);
    let geometry = GridGeometry::new(
        HexOrientation::PointyTop,
        edge,
        settings.canvas_width,
        settings.canvas_height,
    );

    let mut populate_ms = Vec::with_capacity(repeats);
    let mut tiles = Vec::new();
    for _ in 0..repeats.max(1) {
        let t0 = Instant::now();
        tiles = populate_tiles(&geometry, &map);
        populate_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
    }
    let avg_populate = populate_ms.iter().sum::<f64>() / populate_ms.len() as f64;

    let t0 = Instant::now();
    let doc = encode(&tiles, &geometry, &EncodeOptions::default());
    let encode_ms = t0.elapsed().as_secs_f64() * 1000.0;
    let t0 = Instant::now();
    let decoded = match decode(&doc, &settings) {
        Ok(d) => d,
        Err(e) => panic!("decode failed: {}", e),
    };
    let decode_ms = t0.elapsed().as_secs_f64() * 1000.0;

    println!(
        "regions={} tiles={} avg_populate_ms={:.3} encode_ms={:.3} decode_ms={:.3} decoded={}",
        n * n,
        tiles.len(),
        avg_populate,
        encode_ms,
        decode_ms,
        decoded.tiles.len()
    );
}
