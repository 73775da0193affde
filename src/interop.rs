use js_sys::{Array, Float64Array, Int32Array, Object, Reflect};
use tilegram::{Position, Tile};
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object { Object::new() }
pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}
pub fn arr_i32(slice: &[i32]) -> Int32Array {
    let arr = Int32Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice); arr
}
pub fn arr_f64(slice: &[f64]) -> Float64Array {
    let arr = Float64Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice); arr
}
pub fn arr_str<'a>(items: impl IntoIterator<Item = &'a str>) -> Array {
    items.into_iter().map(JsValue::from_str).collect()
}

/// Flat `[x0, y0, x1, y1, ...]` pairs; `None` on an odd length.
pub fn positions_from(arr: &Int32Array) -> Option<Vec<Position>> {
    let buf = arr.to_vec();
    if buf.len() % 2 != 0 {
        return None;
    }
    Some(buf.chunks_exact(2).map(|c| Position::new(c[0], c[1])).collect())
}

/// `{ids: string[], positions: Int32Array, values: Float64Array}`, values NaN when unset.
pub fn tile_data(tiles: &[Tile]) -> JsValue {
    let mut pos = Vec::with_capacity(tiles.len() * 2);
    let mut values = Vec::with_capacity(tiles.len());
    for t in tiles {
        pos.push(t.position.x);
        pos.push(t.position.y);
        values.push(t.value.unwrap_or(f64::NAN));
    }
    let obj = new_obj();
    set_kv(&obj, "ids", &arr_str(tiles.iter().map(|t| t.id.as_str())).into());
    set_kv(&obj, "positions", &arr_i32(&pos).into());
    set_kv(&obj, "values", &arr_f64(&values).into());
    obj.into()
}

/// Plain JS objects rather than `Map`s for serde maps.
pub fn to_js<T: serde::Serialize + ?Sized>(v: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    v.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}
