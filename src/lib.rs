//! Last-mile delivery dashboard core.
//!
//! Loads a cleaned delivery dataset once, then answers every dashboard panel
//! by running the same filter-and-aggregate pipeline over the immutable table.

pub mod api;
pub mod binning;
pub mod charts;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod route;

pub use error::DashboardError;
pub use models::{DeliveryRecord, DeliveryTable};
