use std::path::PathBuf;

/// Failures of the load step. Any of these aborts the render.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV header: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Errors raised by the dashboard pipeline.
///
/// An empty filter result is not represented here: panels degrade to
/// zero-valued metrics instead.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("failed to load deliveries: {0}")]
    Load(#[from] LoadError),
    #[error("index {index} out of range for {len} records")]
    Index { index: isize, len: usize },
    #[error("order {order_id} has no valid store/drop coordinates")]
    MissingCoordinates { order_id: String },
    #[error("invalid bin boundaries: {0}")]
    InvalidBins(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
