//! Iterative cartogram controller.
//!
//! The controller owns the base map, the grid and the active dataset. A
//! dataset selection distorts the base map once and populates the grid;
//! the host then calls [`CartogramController::tick`] on a fixed cadence
//! until the area settles or the iteration cap is hit. Every restart
//! cancels the previous [`IterationTask`], so late ticks are no-ops.

use crate::algorithms::populate::populate_tiles;
use crate::algorithms::regions::{total_area, RegionMap};
use crate::codec::encode::{encode, EncodeOptions};
use crate::config::Settings;
use crate::dataset::Dataset;
use crate::error::CartogramError;
use crate::geometry::grid::GridGeometry;
use crate::geometry::shape::{hexagon_area, HexShape};
use crate::grid::Grid;
use crate::model::{Region, Tile};
use crate::topology::Topology;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External region distortion algorithm.
pub trait Distorter {
    /// Reshape `regions` so each region's area tracks its weight.
    fn distort(
        &mut self,
        regions: &[Region],
        weights: &HashMap<String, f64>,
    ) -> Result<Vec<Region>, CartogramError>;

    fn compute_area(&self, regions: &[Region]) -> f64 { total_area(regions) }
}

impl<D: Distorter + ?Sized> Distorter for Box<D> {
    fn distort(
        &mut self,
        regions: &[Region],
        weights: &HashMap<String, f64>,
    ) -> Result<Vec<Region>, CartogramError> {
        (**self).distort(regions, weights)
    }

    fn compute_area(&self, regions: &[Region]) -> f64 { (**self).compute_area(regions) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartogramState {
    Idle,
    Computing,
    Iterating,
    Converged,
    IterationLimitReached,
}

impl CartogramState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CartogramState::Converged | CartogramState::IterationLimitReached)
    }
}

/// Handle for one run of the iteration loop.
#[derive(Clone, Debug)]
pub struct IterationTask {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl IterationTask {
    fn new(id: u64) -> Self { IterationTask { id, cancelled: Arc::new(AtomicBool::new(false)) } }

    pub fn id(&self) -> u64 { self.id }
    pub fn cancel(&self) { self.cancelled.store(true, Ordering::SeqCst); }
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::SeqCst) }
}

pub struct CartogramController<D: Distorter> {
    settings: Settings,
    distorter: D,
    base_map: Vec<Region>,
    grid: Grid,
    dataset: Option<Dataset>,
    regions: Vec<Region>,
    cartogram_area: Option<f64>,
    metric_per_tile: Option<f64>,
    state: CartogramState,
    iteration: u32,
    task: Option<IterationTask>,
    next_task_id: u64,
}

impl<D: Distorter> CartogramController<D> {
    pub fn new(settings: Settings, base_map: Vec<Region>, distorter: D) -> Self {
        let grid = Grid::new(GridGeometry::from_settings(&settings));
        CartogramController {
            settings,
            distorter,
            base_map,
            grid,
            dataset: None,
            regions: Vec::new(),
            cartogram_area: None,
            metric_per_tile: None,
            state: CartogramState::Idle,
            iteration: 0,
            task: None,
            next_task_id: 1,
        }
    }

    pub fn state(&self) -> CartogramState { self.state }
    pub fn iteration(&self) -> u32 { self.iteration }
    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn dataset(&self) -> Option<&Dataset> { self.dataset.as_ref() }
    pub fn base_map(&self) -> &[Region] { &self.base_map }
    /// Current distorted boundaries.
    pub fn regions(&self) -> &[Region] { &self.regions }
    pub fn cartogram_area(&self) -> Option<f64> { self.cartogram_area }

    pub fn known_region_ids(&self) -> HashSet<String> {
        self.base_map.iter().map(|r| r.id.clone()).collect()
    }

    /// Metric carried by one tile: the explicit value when set, otherwise
    /// what the current edge implies for the current dataset.
    pub fn metric_per_tile(&self) -> Option<f64> {
        if self.metric_per_tile.is_some() {
            return self.metric_per_tile;
        }
        let area = self.cartogram_area.filter(|a| *a > 0.0)?;
        let sum = self.dataset.as_ref()?.sum();
        let edge = self.grid.geometry().tile_edge();
        if edge > 0.0 { Some(sum * hexagon_area(edge) / area) } else { None }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            log::debug!("cancelled iteration task {}", task.id());
        }
        if !self.state.is_terminal() {
            self.state = CartogramState::Idle;
        }
    }

    fn start_task(&mut self) -> IterationTask {
        let task = IterationTask::new(self.next_task_id);
        self.next_task_id += 1;
        self.task = Some(task.clone());
        task
    }

    fn is_active(&self, task: &IterationTask) -> bool {
        !task.is_cancelled() && self.task.as_ref().map_or(false, |t| t.id == task.id)
    }

    /// Start a computation for `dataset`, cancelling whatever ran before.
    pub fn select_dataset(&mut self, dataset: Dataset) -> Result<IterationTask, CartogramError> {
        self.cancel();
        self.state = CartogramState::Computing;
        self.iteration = 0;

        let ids = dataset.ids();
        let filtered: Vec<Region> =
            self.base_map.iter().filter(|r| ids.contains(&r.id)).cloned().collect();
        if filtered.is_empty() {
            self.state = CartogramState::Idle;
            return Err(CartogramError::EmptyBaseMap);
        }
        let weights = weights(&dataset);
        let distorted = match self.distorter.distort(&filtered, &weights) {
            Ok(d) => d,
            Err(e) => {
                self.state = CartogramState::Idle;
                return Err(e);
            }
        };
        let area = self.distorter.compute_area(&distorted);
        log::info!("cartogram computed for {} regions, area {:.1}", distorted.len(), area);
        self.dataset = Some(dataset);
        self.regions = distorted;
        self.cartogram_area = Some(area);
        self.apply_metric_per_tile();
        self.populate();
        self.state = CartogramState::Iterating;
        Ok(self.start_task())
    }

    /// One refinement step. Ticks for stale or cancelled tasks, or after
    /// the run finished, leave everything untouched.
    pub fn tick(&mut self, task: &IterationTask) -> Result<CartogramState, CartogramError> {
        if !self.is_active(task) {
            log::trace!("ignoring tick for stale task {}", task.id());
            return Ok(self.state);
        }
        if self.state != CartogramState::Iterating {
            return Ok(self.state);
        }
        let weights = match self.dataset.as_ref() {
            Some(ds) => weights(ds),
            None => return Err(CartogramError::NoDataset),
        };
        let distorted = match self.distorter.distort(&self.regions, &weights) {
            Ok(d) => d,
            Err(e) => {
                self.cancel();
                return Err(e);
            }
        };
        let previous_area = self.cartogram_area.unwrap_or(0.0);
        let previous_tiles = self.grid.len();
        let area = self.distorter.compute_area(&distorted);
        self.regions = distorted;
        self.cartogram_area = Some(area);
        self.apply_metric_per_tile();
        self.populate();
        self.iteration += 1;

        let change = if previous_area > 0.0 {
            (area - previous_area).abs() / previous_area
        } else {
            f64::INFINITY
        };
        if change < self.settings.convergence_epsilon && self.grid.len() == previous_tiles {
            self.state = CartogramState::Converged;
        } else if self.iteration >= self.settings.max_iterations {
            self.state = CartogramState::IterationLimitReached;
        }
        log::debug!(
            "iteration {}: area change {:.2e}, {} tiles, {:?}",
            self.iteration,
            change,
            self.grid.len(),
            self.state
        );
        Ok(self.state)
    }

    /// Resize tiles and re-populate them from the current distorted
    /// boundaries. The refinement loop resumes with a new task; the
    /// boundaries and the iteration count carry over. A zero edge empties
    /// the grid.
    pub fn set_tile_edge(
        &mut self,
        tile_edge: f64,
    ) -> Result<Option<IterationTask>, CartogramError> {
        self.cancel();
        self.metric_per_tile = None;
        self.grid.set_tile_edge(tile_edge);
        Ok(self.resume())
    }

    /// Size tiles so each carries `metric_per_tile` of the dataset, then
    /// re-populate as [`set_tile_edge`](Self::set_tile_edge) does.
    pub fn set_metric_per_tile(
        &mut self,
        metric_per_tile: f64,
    ) -> Result<Option<IterationTask>, CartogramError> {
        if self.dataset.is_none() {
            return Err(CartogramError::NoDataset);
        }
        self.cancel();
        self.metric_per_tile = Some(metric_per_tile);
        Ok(self.resume())
    }

    fn resume(&mut self) -> Option<IterationTask> {
        if self.dataset.is_none() || self.regions.is_empty() {
            self.grid.clear();
            return None;
        }
        self.state = CartogramState::Computing;
        self.apply_metric_per_tile();
        self.populate();
        self.state = CartogramState::Iterating;
        log::info!(
            "re-populated {} tiles at edge {:.2} after {} iterations",
            self.grid.len(),
            self.grid.geometry().tile_edge(),
            self.iteration
        );
        Some(self.start_task())
    }

    /// Edge from `tile_area = cartogram_area * metric_per_tile / dataset_sum`.
    fn apply_metric_per_tile(&mut self) {
        let current = (self.metric_per_tile, self.cartogram_area, self.dataset.as_ref());
        let (m, area, sum) = match current {
            (Some(m), Some(area), Some(ds)) => (m, area, ds.sum()),
            _ => return,
        };
        let tile_area = if sum > 0.0 { area * m / sum } else { 0.0 };
        let edge = self.grid.geometry().orientation().tile_edge_from_area(tile_area);
        if edge != self.grid.geometry().tile_edge() {
            self.grid.set_tile_edge(edge);
        }
    }

    /// Rebuild the tile set from the current boundaries and swap it in.
    fn populate(&mut self) {
        let map = RegionMap::new(self.regions.clone(), self.settings.min_path_area);
        let mut tiles = populate_tiles(self.grid.geometry(), &map);
        if let Some(ds) = self.dataset.as_ref() {
            assign_values(&mut tiles, ds);
        }
        self.grid.replace_tiles(tiles);
    }

    /// Topology document for the current grid.
    pub fn to_topology(&self) -> Topology {
        let options = EncodeOptions {
            metric_per_tile: self.metric_per_tile(),
            cartogram_area: self.cartogram_area,
        };
        encode(self.grid.tiles(), self.grid.geometry(), &options)
    }
}

fn weights(dataset: &Dataset) -> HashMap<String, f64> {
    dataset.rows().iter().map(|r| (r.id.clone(), r.metric)).collect()
}

/// Split each region's metric evenly across its tiles.
fn assign_values(tiles: &mut [Tile], dataset: &Dataset) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for t in tiles.iter() {
        *counts.entry(t.id.clone()).or_insert(0) += 1;
    }
    for t in tiles.iter_mut() {
        let n = counts.get(&t.id).copied().unwrap_or(0);
        t.value = match dataset.get(&t.id) {
            Some(m) if n > 0 => Some(m / n as f64),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetRow;
    use crate::model::Vec2;

    struct Identity;

    impl Distorter for Identity {
        fn distort(
            &mut self,
            regions: &[Region],
            _: &HashMap<String, f64>,
        ) -> Result<Vec<Region>, CartogramError> {
            Ok(regions.to_vec())
        }
    }

    fn square(id: &str, x: f64, size: f64) -> Region {
        Region {
            id: id.into(),
            polygons: vec![vec![
                Vec2::new(x, 100.0),
                Vec2::new(x + size, 100.0),
                Vec2::new(x + size, 100.0 + size),
                Vec2::new(x, 100.0 + size),
            ]],
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            DatasetRow { id: "A".into(), metric: 1000.0 },
            DatasetRow { id: "B".into(), metric: 3000.0 },
        ])
    }

    #[test]
    fn stable_map_converges_after_one_tick() {
        let map = vec![square("A", 100.0, 300.0), square("B", 500.0, 300.0)];
        let mut c = CartogramController::new(Settings::default(), map, Identity);
        let task = c.select_dataset(dataset()).unwrap();
        assert_eq!(c.state(), CartogramState::Iterating);
        assert!(!c.grid().is_empty());
        assert_eq!(c.tick(&task).unwrap(), CartogramState::Converged);
        assert_eq!(c.iteration(), 1);
        // further ticks change nothing
        assert_eq!(c.tick(&task).unwrap(), CartogramState::Converged);
        assert_eq!(c.iteration(), 1);
    }

    #[test]
    fn base_map_is_restricted_to_regions_with_data() {
        let map = vec![square("A", 100.0, 300.0), square("Z", 500.0, 300.0)];
        let mut c = CartogramController::new(Settings::default(), map, Identity);
        c.select_dataset(dataset()).unwrap();
        assert!(c.grid().tiles().iter().all(|t| t.id == "A"));
        let sum: f64 = c.grid().tiles().iter().filter_map(|t| t.value).sum();
        assert!((sum - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn no_matching_regions_is_an_error() {
        let map = vec![square("Q", 100.0, 300.0)];
        let mut c = CartogramController::new(Settings::default(), map, Identity);
        assert_eq!(c.select_dataset(dataset()).unwrap_err().code(), "empty_base_map");
        assert_eq!(c.state(), CartogramState::Idle);
    }

    #[test]
    fn metric_per_tile_sets_tile_area() {
        let map = vec![square("A", 100.0, 300.0), square("B", 500.0, 300.0)];
        let mut c = CartogramController::new(Settings::default(), map, Identity);
        assert_eq!(c.set_metric_per_tile(10.0).unwrap_err().code(), "no_dataset");
        c.select_dataset(dataset()).unwrap();
        c.set_metric_per_tile(10.0).unwrap();
        let area = c.cartogram_area().unwrap();
        let edge = c.grid().geometry().tile_edge();
        assert!((hexagon_area(edge) - area * 10.0 / 4000.0).abs() < 1e-6);
        assert_eq!(c.metric_per_tile(), Some(10.0));
    }

    #[test]
    fn zero_edge_empties_the_grid() {
        let map = vec![square("A", 100.0, 300.0)];
        let mut c = CartogramController::new(Settings::default(), map, Identity);
        c.select_dataset(dataset()).unwrap();
        assert!(!c.grid().is_empty());
        c.set_tile_edge(0.0).unwrap();
        assert!(c.grid().is_empty());
    }

    #[test]
    fn edge_change_without_dataset_only_clears() {
        let map = vec![square("A", 100.0, 300.0)];
        let mut c = CartogramController::new(Settings::default(), map, Identity);
        assert!(c.set_tile_edge(12.0).unwrap().is_none());
        assert!(c.grid().is_empty());
        assert_eq!(c.state(), CartogramState::Idle);
    }
}
