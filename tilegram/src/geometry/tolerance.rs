// Numeric thresholds shared by the lattice, codec and inference code

pub const EPS_POS: f64 = 1e-6;            // deltas at or below this are the same coordinate
pub const EPS_EDGE: f64 = 1e-9;           // smallest usable tile edge
pub const EPS_RATIO: f64 = 1e-2;          // relative agreement between inferred steps

// Quantization grid for delta tallies (0.001 plane units)
pub const QUANT_SCALE: f64 = 1000.0;

#[inline]
pub fn rel_eq(a: f64, b: f64, eps: f64) -> bool {
    let scale = a.abs().max(b.abs());
    if scale <= EPS_EDGE { return true; }
    (a - b).abs() / scale <= eps
}

#[inline]
pub fn quantize(x: f64) -> i64 { (x * QUANT_SCALE).round() as i64 }

#[inline]
pub fn is_odd(v: i32) -> bool { v.rem_euclid(2) == 1 }
