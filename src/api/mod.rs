//! API module for the delivery dashboard
//!
//! Serves the panel data as JSON for an external renderer.

pub mod handlers;
pub mod service;

pub use handlers::router;
pub use service::DashboardService;
