//! Scalar summaries over a filtered delivery set.

use serde::Serialize;

use crate::models::{DeliveryRecord, NumericField};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub count: usize,
    /// `None` when no record carries the field.
    pub mean_duration: Option<f64>,
    pub percent_under_threshold: f64,
}

/// Thresholds behind the KPI cards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricThresholds {
    pub fast_mins: f64,
    pub same_day_mins: f64,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            fast_mins: 90.0,
            same_day_mins: 1440.0,
        }
    }
}

/// The headline metric cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_deliveries: usize,
    pub avg_delivery_mins: Option<f64>,
    pub percent_fast: f64,
    pub fast_threshold_mins: f64,
    pub same_day_deliveries: usize,
}

/// Count, mean and percent-at-or-under-threshold for `field`.
///
/// Records missing the field still count toward `count` and the percentage
/// denominator. With no records the percentage is exactly 0.
pub fn aggregate(records: &[&DeliveryRecord], field: NumericField, threshold: f64) -> AggregateResult {
    let count = records.len();
    let present: Vec<f64> = records.iter().filter_map(|r| r.numeric(field)).collect();

    let mean_duration = if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    };

    // NOTE: zero rows reports 0% rather than "undefined"
    let percent_under_threshold = if count > 0 {
        let under = present.iter().filter(|v| **v <= threshold).count();
        round1(under as f64 / count as f64 * 100.0)
    } else {
        0.0
    };

    AggregateResult {
        count,
        mean_duration,
        percent_under_threshold,
    }
}

/// Number of records whose `field` is present and at or under `threshold`.
pub fn count_within(records: &[&DeliveryRecord], field: NumericField, threshold: f64) -> usize {
    records
        .iter()
        .filter_map(|r| r.numeric(field))
        .filter(|v| *v <= threshold)
        .count()
}

pub fn dashboard_metrics(records: &[&DeliveryRecord], thresholds: &MetricThresholds) -> DashboardMetrics {
    let field = NumericField::PickupToDeliveryMins;
    let fast = aggregate(records, field, thresholds.fast_mins);

    DashboardMetrics {
        total_deliveries: fast.count,
        avg_delivery_mins: fast.mean_duration.map(round1),
        percent_fast: fast.percent_under_threshold,
        fast_threshold_mins: thresholds.fast_mins,
        same_day_deliveries: count_within(records, field, thresholds.same_day_mins),
    }
}

/// Round to one decimal place, ties to even, deciding ties on the exact
/// value held by `value` (so 6.25 -> 6.2 but 0.15, stored just below, -> 0.1).
pub(crate) fn round1(value: f64) -> f64 {
    let scaled = value * 10.0;
    let lower = scaled.floor();
    if scaled - lower != 0.5 {
        return scaled.round() / 10.0;
    }

    // `scaled` sits on .5 but the multiply may have rounded onto it; compare
    // value against the decimal midpoint (2k+1)/20 with a single rounding.
    let twice_mid = 2.0 * lower + 1.0;
    let diff = value.mul_add(20.0, -twice_mid);
    let rounded = if diff < 0.0 {
        lower
    } else if diff > 0.0 {
        lower + 1.0
    } else if lower.rem_euclid(2.0) == 0.0 {
        lower
    } else {
        lower + 1.0
    };
    rounded / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{record, with_duration};

    fn durations(values: &[Option<f64>]) -> Vec<DeliveryRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| with_duration(record(&format!("o{}", i), "Urban", "Low"), *v))
            .collect()
    }

    #[test]
    fn test_aggregate_empty() {
        let result = aggregate(&[], NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(result.count, 0);
        assert_eq!(result.mean_duration, None);
        assert_eq!(result.percent_under_threshold, 0.0);
    }

    #[test]
    fn test_aggregate_three_durations() {
        let records = durations(&[Some(50.0), Some(100.0), Some(150.0)]);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let result = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(result.count, 3);
        assert_eq!(result.mean_duration, Some(100.0));
        assert_eq!(result.percent_under_threshold, 33.3);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let records = durations(&[Some(90.0), Some(91.0)]);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let result = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(result.percent_under_threshold, 50.0);
    }

    #[test]
    fn test_missing_values_count_in_denominator_only() {
        let records = durations(&[Some(60.0), None, None, Some(200.0)]);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let result = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(result.count, 4);
        assert_eq!(result.mean_duration, Some(130.0));
        assert_eq!(result.percent_under_threshold, 25.0);
    }

    #[test]
    fn test_all_missing_gives_null_mean_and_zero_percent() {
        let records = durations(&[None, None]);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let result = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(result.count, 2);
        assert_eq!(result.mean_duration, None);
        assert_eq!(result.percent_under_threshold, 0.0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = durations(&[Some(12.5), Some(99.0), None, Some(1500.0)]);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let first = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        let second = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_dashboard_metrics() {
        let records = durations(&[Some(45.0), Some(100.0), Some(1440.0), Some(2000.0)]);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();
        let metrics = dashboard_metrics(&rows, &MetricThresholds::default());
        assert_eq!(metrics.total_deliveries, 4);
        assert_eq!(metrics.avg_delivery_mins, Some(896.2));
        assert_eq!(metrics.percent_fast, 25.0);
        assert_eq!(metrics.same_day_deliveries, 3);
    }

    #[test]
    fn test_round1_ties_to_even() {
        assert_eq!(round1(6.25), 6.2);
        assert_eq!(round1(31.25), 31.2);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(-6.25), -6.2);
        assert_eq!(round1(6.35), 6.3);
        // stored just below the half
        assert_eq!(round1(0.15), 0.1);
        assert_eq!(round1(100.0 / 3.0), 33.3);
        assert_eq!(round1(896.26), 896.3);
    }

    #[test]
    fn test_percent_one_in_sixteen() {
        let mut values = vec![Some(60.0)];
        values.extend(std::iter::repeat(Some(200.0)).take(15));
        let records = durations(&values);
        let rows: Vec<&DeliveryRecord> = records.iter().collect();

        let result = aggregate(&rows, NumericField::PickupToDeliveryMins, 90.0);
        assert_eq!(result.count, 16);
        assert_eq!(result.percent_under_threshold, 6.2);

        let metrics = dashboard_metrics(&rows, &MetricThresholds::default());
        assert_eq!(metrics.percent_fast, 6.2);
        // 3060 / 16 = 191.25
        assert_eq!(metrics.avg_delivery_mins, Some(191.2));
    }

    #[test]
    fn test_dashboard_metrics_empty() {
        let metrics = dashboard_metrics(&[], &MetricThresholds::default());
        assert_eq!(metrics.total_deliveries, 0);
        assert_eq!(metrics.avg_delivery_mins, None);
        assert_eq!(metrics.percent_fast, 0.0);
        assert_eq!(metrics.same_day_deliveries, 0);
    }
}
