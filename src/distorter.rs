use crate::interop::to_js;
use js_sys::Function;
use std::collections::HashMap;
use tilegram::{CartogramError, Distorter, Region, Topology};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Object name the boundaries travel under in both directions.
pub const REGIONS_OBJECT: &str = "regions";

/// Distorter backed by a JS function `(topology, weights) => topology`.
/// The topology holds the boundaries under `"regions"`; weights map
/// region id to metric.
pub struct JsDistorter {
    callback: Function,
}

impl JsDistorter {
    pub fn new(callback: Function) -> Self { JsDistorter { callback } }
}

fn failure(context: &str, detail: impl std::fmt::Display) -> CartogramError {
    CartogramError::Distorter(format!("{}: {}", context, detail))
}

fn js_message(v: &JsValue) -> String {
    v.as_string()
        .or_else(|| v.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", v))
}

impl Distorter for JsDistorter {
    fn distort(
        &mut self,
        regions: &[Region],
        weights: &HashMap<String, f64>,
    ) -> Result<Vec<Region>, CartogramError> {
        let doc = Topology::from_regions(regions, REGIONS_OBJECT);
        let doc = to_js(&doc).map_err(|e| failure("encoding boundaries", e))?;
        let weights = to_js(weights).map_err(|e| failure("encoding weights", e))?;
        let out = self
            .callback
            .call2(&JsValue::NULL, &doc, &weights)
            .map_err(|e| failure("callback threw", js_message(&e)))?;
        let out: Topology =
            serde_wasm_bindgen::from_value(out).map_err(|e| failure("reading result", e))?;
        out.check_limits().map_err(|e| failure("reading result", e))?;
        let distorted = out.to_regions(REGIONS_OBJECT).map_err(|e| failure("reading result", e))?;
        log::trace!("distorter returned {} regions", distorted.len());
        Ok(distorted)
    }
}
