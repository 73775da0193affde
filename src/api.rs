use crate::distorter::JsDistorter;
use crate::interop::{self, new_obj, set_kv, to_js};
use crate::{error, CartogramSession, TilegramEditor};
use js_sys::{Array, Function, Int32Array};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use tilegram::metrics::region_metrics;
use tilegram::svg::to_svg_document;
use tilegram::{
    decode, encode, CartogramController, CartogramError, CartogramState, Dataset, EncodeOptions,
    Grid, HexShape, Position, Settings, Topology, Vec2,
};
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Settings from `undefined`/`null` (defaults), a JSON string or a plain object.
fn settings_from(v: JsValue) -> Result<Settings, JsValue> {
    if v.is_undefined() || v.is_null() {
        return Ok(Settings::default());
    }
    if let Some(s) = v.as_string() {
        return Settings::from_json_str(&s).map_err(|e| error::tilegram(&e));
    }
    let value = serde_wasm_bindgen::from_value::<serde_json::Value>(v).map_err(error::json_parse)?;
    let settings: Settings = serde_json::from_value(value).map_err(error::json_parse)?;
    settings.validate().map_err(|e| error::tilegram(&e))?;
    Ok(settings)
}

/// Topology from a JSON string or a plain object.
fn topology_from(v: JsValue) -> Result<Topology, JsValue> {
    if let Some(s) = v.as_string() {
        return Topology::from_json_str(&s).map_err(|e| error::decode(&e));
    }
    serde_wasm_bindgen::from_value::<Topology>(v)
        .map_err(|e| error::err("invalid_json", e.to_string(), None))
}

fn state_name(s: CartogramState) -> &'static str {
    match s {
        CartogramState::Idle => "idle",
        CartogramState::Computing => "computing",
        CartogramState::Iterating => "iterating",
        CartogramState::Converged => "converged",
        CartogramState::IterationLimitReached => "iteration_limit_reached",
    }
}

fn check_point(x: f64, y: f64) -> Result<(), JsValue> {
    if !x.is_finite() {
        return Err(error::non_finite("x"));
    }
    if !y.is_finite() {
        return Err(error::non_finite("y"));
    }
    Ok(())
}

fn check_edge(edge: f64) -> Result<(), JsValue> {
    if !edge.is_finite() {
        return Err(error::non_finite("edge"));
    }
    if edge < 0.0 {
        return Err(error::out_of_range("edge", 0.0, f64::INFINITY, edge));
    }
    Ok(())
}

fn svg_scale(scale: f64, settings: &Settings) -> f64 {
    if scale.is_finite() && scale > 0.0 { scale.min(1.0) } else { settings.tile_scale }
}

fn export_doc(grid: &Grid, metric_per_tile: Option<f64>, cartogram_area: Option<f64>) -> Topology {
    encode(grid.tiles(), grid.geometry(), &EncodeOptions { metric_per_tile, cartogram_area })
}

fn export_json(doc: &Topology) -> JsValue {
    match doc.to_json_string() {
        Ok(s) => error::ok(JsValue::from_str(&s)),
        Err(e) => error::err("serialization", e.to_string(), None),
    }
}

fn metrics_value(grid: &Grid, dataset: Option<&Dataset>, metric_per_tile: Option<f64>) -> JsValue {
    match to_js(&region_metrics(grid.tiles(), dataset, metric_per_tile)) {
        Ok(v) => error::ok(v),
        Err(e) => error::err("serialization", e.to_string(), None),
    }
}

#[wasm_bindgen]
impl TilegramEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> TilegramEditor {
        TilegramEditor::rs_new(Settings::default())
    }
    /// Editor with non-default settings. Fails with an error envelope.
    pub fn with_settings(settings: JsValue) -> Result<TilegramEditor, JsValue> {
        settings_from(settings).map(TilegramEditor::rs_new)
    }
    pub fn version(&self) -> u64 {
        self.rs_version()
    }
    pub fn tile_count(&self) -> u32 {
        self.grid.len() as u32
    }
    pub fn has_unsaved_changes(&self) -> bool {
        self.grid.has_unsaved_changes()
    }
    pub fn mark_saved(&mut self) {
        self.grid.mark_saved();
    }
    pub fn clear(&mut self) {
        self.grid.clear();
        self.dataset = None;
        self.metric_per_tile = None;
        self.cartogram_area = None;
    }

    // Geometry
    pub fn tile_edge(&self) -> f64 {
        self.grid.geometry().tile_edge()
    }
    pub fn orientation(&self) -> String {
        self.grid.geometry().orientation().as_str().to_string()
    }
    pub fn tile_counts(&self) -> Int32Array {
        let c = self.grid.geometry().tile_counts();
        interop::arr_i32(&[c.width, c.height])
    }
    pub fn set_tile_edge(&mut self, edge: f64) -> bool {
        if check_edge(edge).is_err() {
            return false;
        }
        self.grid.set_tile_edge(edge);
        true
    }
    pub fn set_tile_edge_res(&mut self, edge: f64) -> JsValue {
        if let Err(e) = check_edge(edge) {
            return e;
        }
        let before = self.grid.len();
        self.grid.set_tile_edge(edge);
        error::ok(JsValue::from_f64((before - self.grid.len()) as f64))
    }
    /// Resize the drawing surface; tiles outside the new bounds are dropped.
    pub fn set_canvas_size_res(&mut self, width: f64, height: f64) -> JsValue {
        if !width.is_finite() {
            return error::non_finite("width");
        }
        if !height.is_finite() {
            return error::non_finite("height");
        }
        if width <= 0.0 || height <= 0.0 {
            return error::out_of_range("canvas", 0.0, f64::INFINITY, width.min(height));
        }
        let mut geometry = self.grid.geometry().clone();
        geometry.set_canvas_size(width, height);
        let before = self.grid.len();
        self.grid.set_geometry(geometry);
        error::ok(JsValue::from_f64((before - self.grid.len()) as f64))
    }
    pub fn tile_center(&self, x: i32, y: i32) -> JsValue {
        let c = self.grid.geometry().tile_center_point(Position::new(x, y));
        interop::arr_f64(&[c.x, c.y]).into()
    }
    /// Six vertices as `[x0, y0, ..., x5, y5]`.
    pub fn tile_points(&self, x: i32, y: i32, scale: f64) -> JsValue {
        let scale = svg_scale(scale, &self.settings);
        let pts = self.grid.geometry().tile_points(Position::new(x, y), scale);
        let flat: Vec<f64> = pts.iter().flat_map(|p| [p.x, p.y]).collect();
        interop::arr_f64(&flat).into()
    }
    pub fn position_from_screen(&self, x: f64, y: f64) -> JsValue {
        match self.grid.geometry().position_from_screen(x, y) {
            Some(p) => interop::arr_i32(&[p.x, p.y]).into(),
            None => JsValue::NULL,
        }
    }
    pub fn position_from_screen_res(&self, x: f64, y: f64) -> JsValue {
        if let Err(e) = check_point(x, y) {
            return e;
        }
        error::ok(self.position_from_screen(x, y))
    }

    // Tiles
    pub fn tile_at(&self, x: i32, y: i32) -> JsValue {
        match self.grid.tile_at(Position::new(x, y)) {
            Some(t) => JsValue::from_str(&t.id),
            None => JsValue::NULL,
        }
    }
    pub fn get_tile_data(&self) -> JsValue {
        interop::tile_data(self.grid.tiles())
    }
    pub fn add_tile(&mut self, id: &str, x: i32, y: i32) -> bool {
        self.grid.add_tile(id, Position::new(x, y)).is_ok()
    }
    pub fn add_tile_res(&mut self, id: &str, x: i32, y: i32) -> JsValue {
        if id.is_empty() {
            return error::err("invalid_id", "tile id must not be empty", None);
        }
        match self.grid.add_tile(id, Position::new(x, y)) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::grid(&e),
        }
    }
    pub fn move_tile(&mut self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> bool {
        self.grid.move_tile(Position::new(from_x, from_y), Position::new(to_x, to_y)).is_ok()
    }
    pub fn move_tile_res(&mut self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> JsValue {
        match self.grid.move_tile(Position::new(from_x, from_y), Position::new(to_x, to_y)) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::grid(&e),
        }
    }
    /// Shift the tiles at `positions` (x,y pairs) by a plane offset.
    pub fn move_tiles_res(&mut self, positions: &Int32Array, dx: f64, dy: f64) -> JsValue {
        if let Err(e) = check_point(dx, dy) {
            return e;
        }
        let selection = match interop::positions_from(positions) {
            Some(s) => s,
            None => return error::invalid_array("positions"),
        };
        match self.grid.move_tiles(&selection, Vec2::new(dx, dy)) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::grid(&e),
        }
    }
    pub fn delete_tile(&mut self, x: i32, y: i32) -> bool {
        self.grid.delete_tile(Position::new(x, y)).is_ok()
    }
    pub fn delete_tile_res(&mut self, x: i32, y: i32) -> JsValue {
        match self.grid.delete_tile(Position::new(x, y)) {
            Ok(t) => error::ok(JsValue::from_str(&t.id)),
            Err(e) => error::grid(&e),
        }
    }

    // Import / export
    /// Load a tilegram document (JSON string or object). The grid is
    /// left untouched when decoding fails.
    pub fn import_res(&mut self, doc: JsValue) -> JsValue {
        let topology = match topology_from(doc) {
            Ok(t) => t,
            Err(e) => return e,
        };
        let decoded = match decode(&topology, &self.settings) {
            Ok(d) => d,
            Err(e) => return error::decode(&e),
        };
        let grid = Grid::from_decoded(&decoded, &self.settings);
        let dataset = Dataset::from_tiles(grid.tiles());
        self.dataset = if dataset.is_empty() { None } else { Some(dataset) };
        self.metric_per_tile = decoded.metric_per_tile;
        self.cartogram_area = decoded.cartogram_area;
        self.grid = grid;
        log::info!(
            "imported {} tiles, edge {:.3}",
            self.grid.len(),
            self.grid.geometry().tile_edge()
        );

        let summary = new_obj();
        set_kv(&summary, "tiles", &JsValue::from_f64(self.grid.len() as f64));
        set_kv(&summary, "tileEdge", &JsValue::from_f64(self.grid.geometry().tile_edge()));
        set_kv(&summary, "orientation", &JsValue::from_str(decoded.orientation.as_str()));
        if let Some(m) = decoded.metric_per_tile {
            set_kv(&summary, "metricPerTile", &JsValue::from_f64(m));
        }
        error::ok(summary.into())
    }
    /// Take over the grid and dataset of a cartogram session.
    pub fn load_session(&mut self, session: &CartogramSession) {
        let controller = session.rs_controller();
        self.grid = controller.grid().clone();
        self.dataset = controller.dataset().cloned();
        self.metric_per_tile = controller.metric_per_tile();
        self.cartogram_area = controller.cartogram_area();
    }
    pub fn export(&self) -> JsValue {
        let doc = export_doc(&self.grid, self.metric_per_tile, self.cartogram_area);
        to_js(&doc).unwrap_or(JsValue::NULL)
    }
    pub fn export_json_res(&self) -> JsValue {
        export_json(&export_doc(&self.grid, self.metric_per_tile, self.cartogram_area))
    }
    pub fn to_svg(&self, scale: f64) -> String {
        to_svg_document(self.grid.tiles(), self.grid.geometry(), svg_scale(scale, &self.settings))
    }
    pub fn metrics_res(&self) -> JsValue {
        metrics_value(&self.grid, self.dataset.as_ref(), self.metric_per_tile)
    }
}

impl Default for TilegramEditor {
    fn default() -> Self { TilegramEditor::new() }
}

/// One dataset row as it arrives from a parsed CSV: ids may be numbers,
/// metrics may be strings or missing.
#[derive(Deserialize)]
struct RowJs {
    id: serde_json::Value,
    #[serde(default)]
    metric: serde_json::Value,
}

fn row_id(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        _ => String::new(),
    }
}

fn row_metric(v: &serde_json::Value) -> f64 {
    match v {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[wasm_bindgen]
impl CartogramSession {
    /// Session over the boundaries stored under `object` in `base`
    /// (JSON string or object). `distorter` is called as
    /// `distorter(topology, weights)` and must return a topology with the
    /// distorted boundaries under `"regions"`. Fails with an error envelope.
    #[wasm_bindgen(constructor)]
    pub fn new(
        base: JsValue,
        object: &str,
        distorter: Function,
        settings: JsValue,
    ) -> Result<CartogramSession, JsValue> {
        let settings = settings_from(settings)?;
        let topology = topology_from(base)?;
        let regions = topology.to_regions(object).map_err(|e| error::decode(&e))?;
        if regions.is_empty() {
            return Err(error::cartogram(&CartogramError::EmptyBaseMap));
        }
        let inner = CartogramController::new(settings, regions, JsDistorter::new(distorter));
        Ok(CartogramSession { inner, task: None })
    }
    pub fn state(&self) -> String {
        state_name(self.inner.state()).to_string()
    }
    pub fn is_done(&self) -> bool {
        self.inner.state().is_terminal()
    }
    pub fn iteration(&self) -> u32 {
        self.inner.iteration()
    }
    pub fn region_ids(&self) -> Array {
        let ids: BTreeSet<String> = self.inner.base_map().iter().map(|r| r.id.clone()).collect();
        interop::arr_str(ids.iter().map(String::as_str))
    }

    /// Validate `rows` (`[{id, metric}]`) against the base map and start a
    /// computation. Rejected rows are reported under `warning`.
    pub fn select_dataset_res(&mut self, rows: JsValue) -> JsValue {
        let rows: Vec<RowJs> = match serde_wasm_bindgen::from_value(rows) {
            Ok(r) => r,
            Err(e) => return error::json_parse(e),
        };
        let known: HashSet<String> = self.inner.known_region_ids();
        let (dataset, warning) =
            Dataset::validate(rows.iter().map(|r| (row_id(&r.id), row_metric(&r.metric))), &known);
        if dataset.is_empty() {
            let data = warning.as_ref().and_then(|w| to_js(w).ok());
            return error::err("empty_dataset", "no usable rows in dataset", data);
        }
        match self.inner.select_dataset(dataset) {
            Ok(task) => {
                let out = new_obj();
                set_kv(&out, "task", &JsValue::from_f64(task.id() as f64));
                set_kv(&out, "state", &JsValue::from_str(state_name(self.inner.state())));
                if let Some(w) = warning {
                    set_kv(&out, "message", &JsValue::from_str(&w.to_string()));
                    set_kv(&out, "warning", &to_js(&w).unwrap_or(JsValue::NULL));
                }
                self.task = Some(task);
                error::ok(out.into())
            }
            Err(e) => {
                self.task = None;
                error::cartogram(&e)
            }
        }
    }
    /// One refinement step; the host calls this on its timer until
    /// `is_done()`. Without a running computation nothing changes.
    pub fn tick_res(&mut self) -> JsValue {
        let task = match self.task.clone() {
            Some(t) => t,
            None => return error::ok(JsValue::from_str(state_name(self.inner.state()))),
        };
        match self.inner.tick(&task) {
            Ok(state) => error::ok(JsValue::from_str(state_name(state))),
            Err(e) => {
                self.task = None;
                error::cartogram(&e)
            }
        }
    }
    pub fn cancel(&mut self) {
        self.inner.cancel();
        self.task = None;
    }
    pub fn set_tile_edge_res(&mut self, edge: f64) -> JsValue {
        if let Err(e) = check_edge(edge) {
            return e;
        }
        match self.inner.set_tile_edge(edge) {
            Ok(task) => {
                self.task = task;
                error::ok(JsValue::from_str(state_name(self.inner.state())))
            }
            Err(e) => {
                self.task = None;
                error::cartogram(&e)
            }
        }
    }
    pub fn set_metric_per_tile_res(&mut self, metric_per_tile: f64) -> JsValue {
        if !metric_per_tile.is_finite() {
            return error::non_finite("metric_per_tile");
        }
        if metric_per_tile <= 0.0 {
            return error::out_of_range("metric_per_tile", 0.0, f64::INFINITY, metric_per_tile);
        }
        match self.inner.set_metric_per_tile(metric_per_tile) {
            Ok(task) => {
                self.task = task;
                error::ok(JsValue::from_str(state_name(self.inner.state())))
            }
            Err(e) => error::cartogram(&e),
        }
    }
    pub fn metric_per_tile(&self) -> Option<f64> {
        self.inner.metric_per_tile()
    }
    /// `[low, high]` metric per tile for the configured tile-count range,
    /// or null without a dataset.
    pub fn metric_domain(&self) -> JsValue {
        match self.inner.dataset() {
            Some(ds) => {
                let (lo, hi) = ds.metric_domain(self.inner.settings().tile_count_domain);
                interop::arr_f64(&[lo, hi]).into()
            }
            None => JsValue::NULL,
        }
    }
    pub fn tile_edge(&self) -> f64 {
        self.inner.grid().geometry().tile_edge()
    }
    pub fn tile_edge_from_area(&self, area: f64) -> f64 {
        self.inner.grid().geometry().orientation().tile_edge_from_area(area)
    }
    pub fn get_tile_data(&self) -> JsValue {
        interop::tile_data(self.inner.grid().tiles())
    }
    pub fn export(&self) -> JsValue {
        to_js(&self.inner.to_topology()).unwrap_or(JsValue::NULL)
    }
    pub fn export_json_res(&self) -> JsValue {
        export_json(&self.inner.to_topology())
    }
    pub fn to_svg(&self, scale: f64) -> String {
        let grid = self.inner.grid();
        to_svg_document(grid.tiles(), grid.geometry(), svg_scale(scale, self.inner.settings()))
    }
    pub fn metrics_res(&self) -> JsValue {
        metrics_value(self.inner.grid(), self.inner.dataset(), self.inner.metric_per_tile())
    }
}
