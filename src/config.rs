//! Dashboard configuration, shared by every binary.

use clap::Args;
use std::path::PathBuf;

use crate::binning::Bins;
use crate::error::{DashboardError, Result};
use crate::metrics::MetricThresholds;

pub const DEFAULT_DATA_PATH: &str = "data/amazon_delivery_cleaned.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub fast_threshold_mins: f64,
    pub same_day_threshold_mins: f64,
    pub age_boundaries: Vec<f64>,
    pub rating_boundaries: Vec<f64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            fast_threshold_mins: 90.0,
            same_day_threshold_mins: 1440.0,
            age_boundaries: vec![15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0],
            rating_boundaries: vec![0.0, 2.5, 3.5, 4.0, 4.5, 5.0, 5.5],
        }
    }
}

/// Validated form of [`DashboardConfig`]
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub thresholds: MetricThresholds,
    pub age_bins: Bins,
    pub rating_bins: Bins,
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<Settings> {
        check_threshold("fast threshold", self.fast_threshold_mins)?;
        check_threshold("same-day threshold", self.same_day_threshold_mins)?;
        Ok(Settings {
            data_path: self.data_path.clone(),
            thresholds: MetricThresholds {
                fast_mins: self.fast_threshold_mins,
                same_day_mins: self.same_day_threshold_mins,
            },
            age_bins: Bins::new(self.age_boundaries.clone())?,
            rating_bins: Bins::new(self.rating_boundaries.clone())?,
        })
    }
}

fn check_threshold(name: &str, mins: f64) -> Result<()> {
    if !mins.is_finite() || mins < 0.0 {
        return Err(DashboardError::InvalidParameter(format!(
            "{} must be a non-negative number of minutes, got {}",
            name, mins
        )));
    }
    Ok(())
}

/// Command-line / environment overrides for [`DashboardConfig`]
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the cleaned delivery CSV
    #[arg(long, env = "DASHBOARD_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Deliveries at or under this many minutes count as fast
    #[arg(long, env = "DASHBOARD_FAST_MINS", default_value_t = 90.0)]
    pub fast_mins: f64,

    /// Deliveries at or under this many minutes count as same-day
    #[arg(long, env = "DASHBOARD_SAME_DAY_MINS", default_value_t = 1440.0)]
    pub same_day_mins: f64,

    /// Agent age bin boundaries, comma separated
    #[arg(long, env = "DASHBOARD_AGE_BINS", value_delimiter = ',')]
    pub age_bins: Option<Vec<f64>>,

    /// Agent rating bin boundaries, comma separated
    #[arg(long, env = "DASHBOARD_RATING_BINS", value_delimiter = ',')]
    pub rating_bins: Option<Vec<f64>>,
}

impl From<ConfigArgs> for DashboardConfig {
    fn from(args: ConfigArgs) -> Self {
        let defaults = DashboardConfig::default();
        Self {
            data_path: args.data_path,
            fast_threshold_mins: args.fast_mins,
            same_day_threshold_mins: args.same_day_mins,
            age_boundaries: args.age_bins.unwrap_or(defaults.age_boundaries),
            rating_boundaries: args.rating_bins.unwrap_or(defaults.rating_boundaries),
        }
    }
}
