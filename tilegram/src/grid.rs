use crate::codec::decode::DecodedTilegram;
use crate::config::Settings;
use crate::error::GridError;
use crate::geometry::grid::GridGeometry;
use crate::model::{Position, Tile, Vec2};
use std::collections::{BTreeMap, HashMap, HashSet};

/// The placed tiles plus the geometry they live on.
///
/// Positions are unique and always inside the geometry's bounds. Every
/// successful edit bumps `version`, which callers compare against the
/// version they last saved.
#[derive(Clone, Debug)]
pub struct Grid {
    geometry: GridGeometry,
    tiles: Vec<Tile>,
    index: HashMap<Position, usize>,
    version: u64,
    saved_version: u64,
}

impl Grid {
    pub fn new(geometry: GridGeometry) -> Self {
        Grid { geometry, tiles: Vec::new(), index: HashMap::new(), version: 1, saved_version: 1 }
    }

    pub fn with_tiles(geometry: GridGeometry, tiles: Vec<Tile>) -> Self {
        let mut g = Grid::new(geometry);
        g.replace_tiles(tiles);
        g.saved_version = g.version;
        g
    }

    /// Grid for an imported tilegram, with the edge refitted so every
    /// decoded tile and the import margins fit the canvas.
    pub fn from_decoded(decoded: &DecodedTilegram, settings: &Settings) -> Self {
        let mut geometry = GridGeometry::new(
            decoded.orientation,
            decoded.tile_edge,
            settings.canvas_width,
            settings.canvas_height,
        );
        let max = decoded.max_position();
        geometry.set_tile_edge_from_max(max.x, max.y, settings.import_tile_margins);
        Grid::with_tiles(geometry, decoded.tiles.clone())
    }

    pub fn geometry(&self) -> &GridGeometry { &self.geometry }
    pub fn tiles(&self) -> &[Tile] { &self.tiles }
    pub fn len(&self) -> usize { self.tiles.len() }
    pub fn is_empty(&self) -> bool { self.tiles.is_empty() }
    pub fn version(&self) -> u64 { self.version }

    pub fn has_unsaved_changes(&self) -> bool { self.version != self.saved_version }
    pub fn mark_saved(&mut self) { self.saved_version = self.version; }

    fn bump(&mut self) { self.version = self.version.wrapping_add(1); }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, t) in self.tiles.iter().enumerate() {
            self.index.insert(t.position, i);
        }
    }

    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.index.get(&position).map(|&i| &self.tiles[i])
    }

    /// Swap in a whole new tile set. Out-of-bounds and duplicate positions
    /// are dropped; returns how many were dropped.
    pub fn replace_tiles(&mut self, tiles: Vec<Tile>) -> usize {
        let total = tiles.len();
        let mut seen = HashSet::with_capacity(total);
        let kept: Vec<Tile> = tiles
            .into_iter()
            .filter(|t| self.geometry.contains(t.position) && seen.insert(t.position))
            .collect();
        let dropped = total - kept.len();
        if dropped > 0 {
            log::warn!("dropped {} tiles outside the grid or on occupied positions", dropped);
        }
        self.tiles = kept;
        self.reindex();
        self.bump();
        dropped
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.index.clear();
        self.bump();
    }

    /// Change the tile edge. Tiles that no longer fit are removed.
    pub fn set_tile_edge(&mut self, tile_edge: f64) {
        self.geometry.set_tile_edge(tile_edge);
        let tiles = std::mem::take(&mut self.tiles);
        self.replace_tiles(tiles);
    }

    /// Replace the geometry (e.g. after an import picked a new edge).
    pub fn set_geometry(&mut self, geometry: GridGeometry) {
        self.geometry = geometry;
        let tiles = std::mem::take(&mut self.tiles);
        self.replace_tiles(tiles);
    }

    fn check_target(&self, position: Position) -> Result<(), GridError> {
        if !self.geometry.contains(position) {
            return Err(GridError::OutOfBounds(position));
        }
        if self.index.contains_key(&position) {
            return Err(GridError::Occupied(position));
        }
        Ok(())
    }

    pub fn add_tile(&mut self, id: impl Into<String>, position: Position) -> Result<(), GridError> {
        self.check_target(position)?;
        self.index.insert(position, self.tiles.len());
        self.tiles.push(Tile { id: id.into(), position, value: None });
        self.bump();
        Ok(())
    }

    pub fn move_tile(&mut self, from: Position, to: Position) -> Result<(), GridError> {
        let i = *self.index.get(&from).ok_or(GridError::NoTile(from))?;
        if from == to {
            return Ok(());
        }
        self.check_target(to)?;
        self.index.remove(&from);
        self.index.insert(to, i);
        self.tiles[i].position = to;
        self.bump();
        Ok(())
    }

    /// Move a selection by a plane offset, all or nothing. Each tile lands
    /// on the lattice position nearest its shifted center; a target held
    /// by a tile outside the selection rejects the whole move.
    pub fn move_tiles(&mut self, selection: &[Position], offset: Vec2) -> Result<(), GridError> {
        let selected: HashSet<Position> = selection.iter().copied().collect();
        let mut moves = Vec::with_capacity(selected.len());
        let mut targets = HashSet::with_capacity(selected.len());
        for &from in &selected {
            let i = *self.index.get(&from).ok_or(GridError::NoTile(from))?;
            let c = self.geometry.tile_center_point(from);
            let to = self
                .geometry
                .position_from_screen(c.x + offset.x, c.y + offset.y)
                .ok_or(GridError::OutOfBounds(from))?;
            if !self.geometry.contains(to) {
                return Err(GridError::OutOfBounds(to));
            }
            if self.index.contains_key(&to) && !selected.contains(&to) {
                return Err(GridError::Occupied(to));
            }
            if !targets.insert(to) {
                return Err(GridError::Occupied(to));
            }
            moves.push((i, to));
        }
        if moves.is_empty() {
            return Ok(());
        }
        for (i, to) in moves {
            self.tiles[i].position = to;
        }
        self.reindex();
        self.bump();
        Ok(())
    }

    pub fn delete_tile(&mut self, position: Position) -> Result<Tile, GridError> {
        let i = self.index.remove(&position).ok_or(GridError::NoTile(position))?;
        let tile = self.tiles.swap_remove(i);
        if i < self.tiles.len() {
            self.index.insert(self.tiles[i].position, i);
        }
        self.bump();
        Ok(tile)
    }

    /// Tile count per region id, sorted by id.
    pub fn counts_by_region(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for t in &self.tiles {
            *counts.entry(t.id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shape::HexOrientation;

    fn grid() -> Grid {
        Grid::new(GridGeometry::new(HexOrientation::PointyTop, 20.0, 1920.0, 1440.0))
    }

    #[test]
    fn add_rejects_occupied_and_out_of_bounds() {
        let mut g = grid();
        g.add_tile("A", Position::new(1, 1)).unwrap();
        let taken = Position::new(1, 1);
        assert_eq!(g.add_tile("B", taken), Err(GridError::Occupied(taken)));
        let outside = Position::new(-1, 0);
        assert_eq!(g.add_tile("B", outside), Err(GridError::OutOfBounds(outside)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn move_and_delete_keep_index_consistent() {
        let mut g = grid();
        for x in 0..4 {
            g.add_tile("A", Position::new(x, 0)).unwrap();
        }
        assert_eq!(
            g.move_tile(Position::new(0, 0), Position::new(1, 0)),
            Err(GridError::Occupied(Position::new(1, 0)))
        );
        g.move_tile(Position::new(0, 0), Position::new(0, 5)).unwrap();
        let removed = g.delete_tile(Position::new(1, 0)).unwrap();
        assert_eq!(removed.position, Position::new(1, 0));
        assert!(g.tile_at(Position::new(3, 0)).is_some());
        assert!(g.tile_at(Position::new(0, 5)).is_some());
        assert!(g.tile_at(Position::new(1, 0)).is_none());
        assert_eq!(g.delete_tile(Position::new(9, 9)), Err(GridError::NoTile(Position::new(9, 9))));
    }

    #[test]
    fn group_move_is_all_or_nothing() {
        let mut g = grid();
        g.add_tile("A", Position::new(2, 2)).unwrap();
        g.add_tile("A", Position::new(3, 2)).unwrap();
        g.add_tile("B", Position::new(5, 2)).unwrap();
        let step = g.geometry().step().width;
        let selection = [Position::new(2, 2), Position::new(3, 2)];
        // one column right: 3,2 moves onto a selected tile's cell, which is fine
        g.move_tiles(&selection, Vec2::new(step, 0.0)).unwrap();
        assert!(g.tile_at(Position::new(4, 2)).is_some());
        // another column right would put a tile onto B
        let ver = g.version();
        let selection = [Position::new(3, 2), Position::new(4, 2)];
        assert_eq!(
            g.move_tiles(&selection, Vec2::new(step, 0.0)),
            Err(GridError::Occupied(Position::new(5, 2)))
        );
        assert_eq!(g.version(), ver);
        assert!(g.tile_at(Position::new(3, 2)).is_some());
    }

    #[test]
    fn replace_drops_duplicates_and_tracks_changes() {
        let mut g = grid();
        let tiles = vec![Tile::new("A", 0, 0), Tile::new("B", 0, 0), Tile::new("C", -3, 0)];
        let dropped = g.replace_tiles(tiles);
        assert_eq!(dropped, 2);
        assert_eq!(g.tile_at(Position::new(0, 0)).map(|t| t.id.as_str()), Some("A"));
        assert!(g.has_unsaved_changes());
        g.mark_saved();
        assert!(!g.has_unsaved_changes());
        assert_eq!(g.counts_by_region().get("A"), Some(&1));
    }
}
