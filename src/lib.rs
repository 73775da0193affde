use tilegram::{CartogramController, Dataset, Grid, GridGeometry, Settings};
use wasm_bindgen::prelude::*;

mod api;
mod distorter;
mod error;
mod interop;
mod logging;

pub use distorter::JsDistorter;
pub use logging::init_logging;

/// Interactive tile editor: a grid store plus the metadata an imported
/// tilegram carried.
#[wasm_bindgen]
pub struct TilegramEditor {
    pub(crate) grid: Grid,
    pub(crate) settings: Settings,
    pub(crate) dataset: Option<Dataset>,
    pub(crate) metric_per_tile: Option<f64>,
    pub(crate) cartogram_area: Option<f64>,
}

impl TilegramEditor {
    pub fn rs_new(settings: Settings) -> TilegramEditor {
        TilegramEditor {
            grid: Grid::new(GridGeometry::from_settings(&settings)),
            settings,
            dataset: None,
            metric_per_tile: None,
            cartogram_area: None,
        }
    }
    pub fn rs_version(&self) -> u64 { self.grid.version() }
    pub fn rs_grid(&self) -> &Grid { &self.grid }
}

/// Cartogram computation driven by a JS distorter callback.
#[wasm_bindgen]
pub struct CartogramSession {
    pub(crate) inner: CartogramController<JsDistorter>,
    pub(crate) task: Option<tilegram::IterationTask>,
}

impl CartogramSession {
    pub fn rs_controller(&self) -> &CartogramController<JsDistorter> { &self.inner }
}
