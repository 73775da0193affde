use crate::interop::{new_obj, set_kv};
use tilegram::{CartogramError, DecodeError, GridError, Position, TilegramError};
use wasm_bindgen::prelude::*;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn out_of_range(param: &str, min: f64, max: f64, got: f64) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    set_kv(&d, "min", &JsValue::from_f64(min));
    set_kv(&d, "max", &JsValue::from_f64(max));
    set_kv(&d, "got", &JsValue::from_f64(got));
    err("out_of_range", format!("parameter '{}' out of range", param), Some(d.into()))
}

#[inline]
pub fn invalid_array(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("invalid_array", format!("'{}' must hold x,y pairs", param), Some(d.into()))
}

#[inline]
pub fn json_parse(e: impl std::fmt::Display) -> JsValue { err("json_parse", e.to_string(), None) }

pub fn grid(e: &GridError) -> JsValue {
    let p = match e {
        GridError::Occupied(p) | GridError::OutOfBounds(p) | GridError::NoTile(p) => *p,
    };
    err(e.code(), e.to_string(), Some(position(p)))
}

pub fn decode(e: &DecodeError) -> JsValue { err(e.code(), e.to_string(), None) }

pub fn cartogram(e: &CartogramError) -> JsValue { err(e.code(), e.to_string(), None) }

pub fn tilegram(e: &TilegramError) -> JsValue {
    match e {
        TilegramError::Grid(g) => grid(g),
        other => err(other.code(), other.to_string(), None),
    }
}

fn position(p: Position) -> JsValue {
    let d = new_obj();
    set_kv(&d, "x", &JsValue::from_f64(p.x as f64));
    set_kv(&d, "y", &JsValue::from_f64(p.y as f64));
    d.into()
}
