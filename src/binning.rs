//! Ordinal interval binning and the grouped-mean grid behind the heatmap.

use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{DeliveryRecord, NumericField};

/// Ordered boundaries partitioning the line into `[b[i], b[i+1])` intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    boundaries: Vec<f64>,
}

impl Bins {
    pub fn new(boundaries: Vec<f64>) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(DashboardError::InvalidBins(format!(
                "need at least 2 boundaries, got {}",
                boundaries.len()
            )));
        }
        if boundaries.iter().any(|b| !b.is_finite()) {
            return Err(DashboardError::InvalidBins("boundaries must be finite".into()));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DashboardError::InvalidBins(
                "boundaries must be strictly increasing".into(),
            ));
        }
        Ok(Self { boundaries })
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interval index holding `value`, or `None` when unbinned.
    pub fn locate(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        // First boundary strictly greater than value
        let upper = self.boundaries.partition_point(|b| *b <= value);
        if upper == 0 || upper == self.boundaries.len() {
            None
        } else {
            Some(upper - 1)
        }
    }

    /// `"[lo, hi)"` for interval `index`, `None` past the last interval.
    pub fn label(&self, index: usize) -> Option<String> {
        match self.boundaries.get(index..)? {
            [lo, hi, ..] => Some(interval_label(*lo, *hi)),
            _ => None,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.boundaries
            .windows(2)
            .map(|w| interval_label(w[0], w[1]))
            .collect()
    }
}

fn interval_label(lo: f64, hi: f64) -> String {
    format!("[{}, {})", format_bound(lo), format_bound(hi))
}

// Integral bounds print without a decimal point at any magnitude.
fn format_bound(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Records grouped by interval, plus the ones that fell outside every bin
#[derive(Debug, Clone)]
pub struct Binned<'a> {
    labels: Vec<String>,
    groups: Vec<Vec<&'a DeliveryRecord>>,
    pub unbinned: Vec<&'a DeliveryRecord>,
}

impl<'a> Binned<'a> {
    /// `(label, records)` pairs in interval order, including empty bins.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a DeliveryRecord])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.groups.iter().map(Vec::as_slice))
    }

    pub fn get(&self, label: &str) -> Option<&[&'a DeliveryRecord]> {
        self.iter().find(|(l, _)| *l == label).map(|(_, group)| group)
    }
}

/// Assign each record to the interval containing its `field` value.
///
/// Records missing the field are unbinned.
pub fn bin<'a>(records: &[&'a DeliveryRecord], field: NumericField, bins: &Bins) -> Binned<'a> {
    let mut groups: Vec<Vec<&'a DeliveryRecord>> = vec![Vec::new(); bins.len()];
    let mut unbinned = Vec::new();

    for record in records {
        match record.numeric(field).and_then(|v| bins.locate(v)) {
            Some(i) => groups[i].push(*record),
            None => unbinned.push(*record),
        }
    }

    Binned {
        labels: bins.labels(),
        groups,
        unbinned,
    }
}

/// 2-D grid of means keyed by (row bin, column bin)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTable {
    pub row_field: NumericField,
    pub col_field: NumericField,
    pub value_field: NumericField,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `cells[row][col]`; `None` where no record landed
    pub cells: Vec<Vec<Option<f64>>>,
}

impl GroupedTable {
    pub fn cell(&self, row_label: &str, col_label: &str) -> Option<f64> {
        let row = self.row_labels.iter().position(|l| l == row_label)?;
        let col = self.col_labels.iter().position(|l| l == col_label)?;
        self.cells[row][col]
    }
}

pub fn grouped_mean(
    records: &[&DeliveryRecord],
    row_field: NumericField,
    row_bins: &Bins,
    col_field: NumericField,
    col_bins: &Bins,
    value_field: NumericField,
) -> GroupedTable {
    let mut sums = vec![vec![(0.0_f64, 0_usize); col_bins.len()]; row_bins.len()];

    for record in records {
        let row = record.numeric(row_field).and_then(|v| row_bins.locate(v));
        let col = record.numeric(col_field).and_then(|v| col_bins.locate(v));
        if let (Some(row), Some(col), Some(value)) = (row, col, record.numeric(value_field)) {
            let cell = &mut sums[row][col];
            cell.0 += value;
            cell.1 += 1;
        }
    }

    let cells = sums
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(sum, n)| if n > 0 { Some(sum / n as f64) } else { None })
                .collect()
        })
        .collect();

    GroupedTable {
        row_field,
        col_field,
        value_field,
        row_labels: row_bins.labels(),
        col_labels: col_bins.labels(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    fn age_bins() -> Bins {
        Bins::new(vec![20.0, 24.0, 28.0]).unwrap()
    }

    #[test]
    fn test_locate_half_open() {
        let bins = age_bins();
        assert_eq!(bins.locate(22.0), Some(0));
        assert_eq!(bins.locate(20.0), Some(0));
        assert_eq!(bins.locate(24.0), Some(1));
        assert_eq!(bins.locate(27.9), Some(1));
        assert_eq!(bins.locate(28.0), None);
        assert_eq!(bins.locate(30.0), None);
        assert_eq!(bins.locate(19.9), None);
        assert_eq!(bins.locate(f64::NAN), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(age_bins().labels(), vec!["[20, 24)", "[24, 28)"]);
        let rating = Bins::new(vec![4.0, 4.5, 5.0]).unwrap();
        assert_eq!(rating.label(0), Some("[4, 4.5)".to_string()));
        assert_eq!(rating.label(1), Some("[4.5, 5)".to_string()));
    }

    #[test]
    fn test_label_out_of_range() {
        let rating = Bins::new(vec![4.0, 4.5, 5.0]).unwrap();
        assert_eq!(rating.label(2), None);
        assert_eq!(rating.label(usize::MAX), None);
    }

    #[test]
    fn test_labels_for_large_bounds() {
        let bins = Bins::new(vec![-0.0, 1e19, 1e20]).unwrap();
        assert_eq!(
            bins.labels(),
            vec![
                "[0, 10000000000000000000)",
                "[10000000000000000000, 100000000000000000000)",
            ]
        );
        assert_eq!(bins.label(1), Some(bins.labels()[1].clone()));
    }

    #[test]
    fn test_invalid_boundaries() {
        assert!(Bins::new(vec![1.0]).is_err());
        assert!(Bins::new(vec![1.0, 1.0]).is_err());
        assert!(Bins::new(vec![3.0, 2.0]).is_err());
        assert!(Bins::new(vec![0.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_bin_assigns_records() {
        let mut a = record("a", "Urban", "Low");
        a.agent_age = Some(22);
        let mut b = record("b", "Urban", "Low");
        b.agent_age = Some(30);
        let mut c = record("c", "Urban", "Low");
        c.agent_age = Some(24);
        let mut d = record("d", "Urban", "Low");
        d.agent_age = None;
        let records = vec![a, b, c, d];
        let rows: Vec<&DeliveryRecord> = records.iter().collect();

        let binned = bin(&rows, NumericField::AgentAge, &age_bins());
        let first: Vec<&str> = binned.get("[20, 24)").unwrap().iter().map(|r| r.order_id.as_str()).collect();
        let second: Vec<&str> = binned.get("[24, 28)").unwrap().iter().map(|r| r.order_id.as_str()).collect();
        let unbinned: Vec<&str> = binned.unbinned.iter().map(|r| r.order_id.as_str()).collect();
        assert_eq!(first, vec!["a"]);
        assert_eq!(second, vec!["c"]);
        assert_eq!(unbinned, vec!["b", "d"]);
        assert_eq!(binned.iter().count(), 2);
    }

    #[test]
    fn test_grouped_mean_leaves_empty_cells_null() {
        let make = |id: &str, age: u32, rating: f64, mins: f64| {
            let mut r = record(id, "Urban", "Low");
            r.agent_age = Some(age);
            r.agent_rating = Some(rating);
            r.pickup_to_delivery_mins = Some(mins);
            r
        };
        let records = vec![
            make("a", 21, 4.6, 100.0),
            make("b", 23, 4.7, 140.0),
            make("c", 26, 4.1, 90.0),
            // outside the age bins, must not leak into any cell
            make("d", 40, 4.6, 1000.0),
        ];
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let ratings = Bins::new(vec![4.0, 4.5, 5.0]).unwrap();

        let table = grouped_mean(
            &rows,
            NumericField::AgentAge,
            &age_bins(),
            NumericField::AgentRating,
            &ratings,
            NumericField::PickupToDeliveryMins,
        );

        assert_eq!(table.cell("[20, 24)", "[4.5, 5)"), Some(120.0));
        assert_eq!(table.cell("[24, 28)", "[4, 4.5)"), Some(90.0));
        assert_eq!(table.cell("[20, 24)", "[4, 4.5)"), None);
        assert_eq!(table.cell("[24, 28)", "[4.5, 5)"), None);
        assert_eq!(table.cells.len(), 2);
        assert_eq!(table.cells[0].len(), 2);
    }

    #[test]
    fn test_grouped_mean_of_empty_input() {
        let table = grouped_mean(
            &[],
            NumericField::AgentAge,
            &age_bins(),
            NumericField::AgentAge,
            &age_bins(),
            NumericField::PickupToDeliveryMins,
        );
        assert!(table.cells.iter().flatten().all(Option::is_none));
    }
}
