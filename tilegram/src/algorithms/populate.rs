use crate::algorithms::regions::FeatureLookup;
use crate::geometry::grid::GridGeometry;
use crate::model::Tile;

/// Sample every lattice position against the boundary map and build a
/// fresh tile set. Callers swap the result in whole.
pub fn populate_tiles<L: FeatureLookup + ?Sized>(geometry: &GridGeometry, lookup: &L) -> Vec<Tile> {
    let mut tiles = Vec::new();
    geometry.for_each_tile_position(|position| {
        let center = geometry.tile_center_point(position);
        if let Some(id) = lookup.feature_at_point(center) {
            tiles.push(Tile { id: id.to_string(), position, value: None });
        }
    });
    log::debug!(
        "populated {} tiles on a {}x{} lattice",
        tiles.len(),
        geometry.tile_counts().width,
        geometry.tile_counts().height
    );
    tiles
}
