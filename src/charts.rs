//! Chart-ready tables: box-plot summaries per category.
//!
//! The heatmap grid lives in [`crate::binning::grouped_mean`].

use serde::Serialize;

use crate::models::{DeliveryRecord, Facet, NumericField};

/// Five-number summary of one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSeries {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// One series per `facet` value, in first-seen order. Categories with no
/// present `field` values are omitted.
pub fn box_plot(records: &[&DeliveryRecord], facet: Facet, field: NumericField) -> Vec<BoxPlotSeries> {
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

    for record in records {
        let Some(value) = record.numeric(field) else {
            continue;
        };
        let category = record.facet(facet);
        match groups.iter().position(|(name, _)| *name == category) {
            Some(i) => groups[i].1.push(value),
            None => groups.push((category, vec![value])),
        }
    }

    groups
        .into_iter()
        .map(|(category, mut values)| {
            values.sort_by(f64::total_cmp);
            BoxPlotSeries {
                category: category.to_string(),
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}

/// Linear interpolation between order statistics over sorted, non-empty input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
