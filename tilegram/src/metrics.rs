use crate::dataset::Dataset;
use crate::model::Tile;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-region comparison of placed tiles against the dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetrics {
    pub id: String,
    pub tiles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    /// Metric carried by each placed tile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    /// Tiles the region should have minus tiles it has
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<i64>,
}

/// One row per region appearing in the tiles or the dataset, sorted by id.
/// Without an explicit `metric_per_tile`, the ideal ratio is the dataset
/// sum over the total tile count.
pub fn region_metrics(
    tiles: &[Tile],
    dataset: Option<&Dataset>,
    metric_per_tile: Option<f64>,
) -> Vec<RegionMetrics> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in tiles {
        *counts.entry(t.id.as_str()).or_insert(0) += 1;
    }
    if let Some(ds) = dataset {
        for r in ds.rows() {
            counts.entry(r.id.as_str()).or_insert(0);
        }
    }
    let ideal = metric_per_tile.filter(|m| *m > 0.0).or_else(|| {
        let ds = dataset?;
        if tiles.is_empty() { None } else { Some(ds.sum() / tiles.len() as f64) }
    });
    counts
        .into_iter()
        .map(|(id, n)| {
            let metric = dataset.and_then(|ds| ds.get(id));
            let ratio = metric.filter(|_| n > 0).map(|m| m / n as f64);
            let deviation = match (metric, ideal) {
                (Some(m), Some(ideal)) if ideal > 0.0 => {
                    Some((m / ideal).round() as i64 - n as i64)
                }
                _ => None,
            };
            RegionMetrics { id: id.to_string(), tiles: n, metric, ratio, deviation }
        })
        .collect()
}
