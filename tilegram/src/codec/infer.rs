//! Tile spacing inference for documents without `tileSize`.
//!
//! Consecutive hexagon centers are tallied per axis. Along the axis that
//! is not staggered, adjacent lines sit exactly 1.5 edges apart; along
//! the staggered axis, neighbours sit a full or a half tile apart. The
//! modal spacing on each axis must tell the same story.

use crate::error::DecodeError;
use crate::geometry::shape::{HexOrientation, HexShape, StaggerAxis};
use crate::geometry::tolerance::{quantize, rel_eq, EPS_POS, EPS_RATIO};
use crate::model::Vec2;
use std::collections::HashMap;

pub const SAMPLE_COUNT: usize = 100;

#[derive(Default)]
struct Tally {
    // quantized delta -> (count, raw sum)
    buckets: HashMap<i64, (usize, f64)>,
}

impl Tally {
    fn add(&mut self, delta: f64) {
        if delta > EPS_POS {
            let b = self.buckets.entry(quantize(delta)).or_insert((0, 0.0));
            b.0 += 1;
            b.1 += delta;
        }
    }

    /// Mean raw delta of every bucket sharing the highest count.
    fn modes(&self) -> Vec<f64> {
        let top = self.buckets.values().map(|b| b.0).max().unwrap_or(0);
        let mut out: Vec<(i64, f64)> = self
            .buckets
            .iter()
            .filter(|(_, b)| b.0 == top)
            .map(|(k, b)| (*k, b.1 / b.0 as f64))
            .collect();
        out.sort_by_key(|(k, _)| *k);
        out.into_iter().map(|(_, v)| v).collect()
    }
}

/// Infer the tile edge from hexagon centers given in layout order.
pub fn infer_tile_edge(centers: &[Vec2], orientation: HexOrientation) -> Result<f64, DecodeError> {
    let mut xs = Tally::default();
    let mut ys = Tally::default();
    for w in centers.windows(2).take(SAMPLE_COUNT) {
        xs.add((w[1].x - w[0].x).abs());
        ys.add((w[1].y - w[0].y).abs());
    }
    let (primary, secondary) = match orientation.stagger_axis() {
        StaggerAxis::Rows => (ys, xs),
        StaggerAxis::Columns => (xs, ys),
    };
    // line step along the primary axis is 1.5 edges; full stagger step is sqrt(3) edges
    let full_per_edge = orientation.tile_size(1.0).width.min(orientation.tile_size(1.0).height);
    let primary_modes = primary.modes();
    let secondary_modes = secondary.modes();

    let edge = match primary_modes.as_slice() {
        [step] => step / 1.5,
        [] => match secondary_modes.as_slice() {
            [step] => {
                log::warn!("no line spacing observed; reading {:.3} as a full tile step", step);
                step / full_per_edge
            }
            [] => {
                return Err(DecodeError::InferenceAmbiguity(
                    "no neighbouring tiles in the sample".into(),
                ))
            }
            _ => return Err(DecodeError::InferenceAmbiguity("tied tile spacings".into())),
        },
        _ => return Err(DecodeError::InferenceAmbiguity("tied line spacings".into())),
    };

    if secondary_modes.is_empty() {
        log::warn!("only one axis observed; tile edge {:.3} is unchecked", edge);
    }
    let full = edge * full_per_edge;
    for s in &secondary_modes {
        if !(rel_eq(*s, full, EPS_RATIO) || rel_eq(*s, full * 0.5, EPS_RATIO)) {
            return Err(DecodeError::InferenceAmbiguity(format!(
                "line spacing suggests edge {:.3} but tile spacing {:.3} does not fit it",
                edge, s
            )));
        }
    }
    let sampled = centers.len().min(SAMPLE_COUNT + 1);
    log::debug!("inferred tile edge {:.4} from {} centers", edge, sampled);
    Ok(edge)
}
