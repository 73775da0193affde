//! Metric datasets keyed by region id.

use crate::model::Tile;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub id: String,
    pub metric: f64,
}

/// Rows dropped during validation. Non-fatal: the dataset is usable
/// without them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataValidationWarning {
    pub unknown_ids: Vec<String>,
    pub bad_value_ids: Vec<String>,
    /// Ids seen more than once; the first row won.
    pub duplicate_ids: Vec<String>,
}

impl DataValidationWarning {
    pub fn is_empty(&self) -> bool {
        self.unknown_ids.is_empty()
            && self.bad_value_ids.is_empty()
            && self.duplicate_ids.is_empty()
    }
}

impl fmt::Display for DataValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.unknown_ids.is_empty() {
            parts.push(format!(
                "No map data is associated with id(s): {}.",
                self.unknown_ids.join(", ")
            ));
        }
        if !self.bad_value_ids.is_empty() {
            parts.push(format!(
                "Id(s) {} have zero, negative or non-numeric values.",
                self.bad_value_ids.join(", ")
            ));
        }
        if !self.duplicate_ids.is_empty() {
            parts.push(format!(
                "Id(s) {} appear more than once; only the first row was kept.",
                self.duplicate_ids.join(", ")
            ));
        }
        parts.push("This data has been pruned.".to_string());
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Trusted rows, used as given. The first row for an id wins lookups.
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (i, r) in rows.iter().enumerate() {
            index.entry(r.id.clone()).or_insert(i);
        }
        Dataset { rows, index }
    }

    /// Keep rows whose id exists in `known_ids` and whose metric is a
    /// positive number. An id missing its leading zero ("6" for "06") is
    /// repaired when the padded id is known. Later duplicates are dropped
    /// and reported.
    pub fn validate<I>(
        rows: I,
        known_ids: &HashSet<String>,
    ) -> (Dataset, Option<DataValidationWarning>)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut warning = DataValidationWarning::default();
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for (raw_id, metric) in rows {
            if raw_id.is_empty() {
                continue;
            }
            let id = if known_ids.contains(&raw_id) {
                Some(raw_id.clone())
            } else {
                let padded = format!("0{}", raw_id);
                if known_ids.contains(&padded) { Some(padded) } else { None }
            };
            let id = match id {
                Some(id) => id,
                None => {
                    warning.unknown_ids.push(raw_id);
                    continue;
                }
            };
            if !(metric > 0.0) || !metric.is_finite() {
                warning.bad_value_ids.push(raw_id);
                continue;
            }
            if !seen.insert(id.clone()) {
                if !warning.duplicate_ids.contains(&id) {
                    warning.duplicate_ids.push(id);
                }
                continue;
            }
            kept.push(DatasetRow { id, metric });
        }
        let warning = if warning.is_empty() {
            None
        } else {
            log::warn!("{}", warning);
            Some(warning)
        };
        (Dataset::new(kept), warning)
    }

    /// Rebuild a dataset from decoded tiles: each region's metric is the
    /// sum of its tile values. Regions without values are left out.
    pub fn from_tiles(tiles: &[Tile]) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut sums: HashMap<String, f64> = HashMap::new();
        for t in tiles {
            if let Some(v) = t.value {
                if !sums.contains_key(&t.id) {
                    order.push(t.id.clone());
                }
                *sums.entry(t.id.clone()).or_insert(0.0) += v;
            }
        }
        let rows = order
            .into_iter()
            .map(|id| {
                let metric = sums.get(&id).copied().unwrap_or(0.0);
                DatasetRow { id, metric }
            })
            .collect();
        Dataset::new(rows)
    }

    pub fn rows(&self) -> &[DatasetRow] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|&i| self.rows[i].metric)
    }

    pub fn ids(&self) -> HashSet<String> { self.index.keys().cloned().collect() }

    pub fn sum(&self) -> f64 { self.rows.iter().map(|r| r.metric).sum() }

    /// Metric-per-tile range `(low, high)` that yields between
    /// `tile_counts.1` and `tile_counts.0` tiles.
    pub fn metric_domain(&self, tile_counts: (f64, f64)) -> (f64, f64) {
        let sum = self.sum();
        (round_to_pretty(sum / tile_counts.1), round_to_pretty(sum / tile_counts.0))
    }
}

/// Round to two significant digits, the second a multiple of 5.
pub fn round_to_pretty(n: f64) -> f64 {
    if !(n > 0.0) || !n.is_finite() {
        return 0.0;
    }
    let units = 10f64.powi(n.log10().floor() as i32 - 1);
    let significant = n / units;
    5.0 * (significant / 5.0).round() * units
}
