//! REST API server for the delivery dashboard
//!
//! Usage:
//!   ./target/release/api_server [--port PORT] [--data-path PATH] ...
//!
//! REST endpoints:
//!   GET  /api/v1/health              - Health check
//!   GET  /api/v1/facets              - Options for the selection widgets
//!   GET  /api/v1/metrics             - KPI cards for a selection
//!   GET  /api/v1/orders              - Filtered orders (?limit=N)
//!   GET  /api/v1/charts/box-plot     - Box plot (?facet=&field=)
//!   GET  /api/v1/charts/heatmap      - Mean duration by age x rating
//!   GET  /api/v1/routes              - Route map for one order (?index=N)
//!   POST /api/v1/refresh             - Reload the data file
//!
//! Every GET accepts ?areas=a,b&traffic=x,y&month=YYYY-MM.

use anyhow::{Context, Result};
use clap::Parser;
use last_mile_dashboard::api::{router, DashboardService};
use last_mile_dashboard::config::{ConfigArgs, DashboardConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "api_server")]
#[command(about = "Serve last-mile delivery dashboard panels as JSON")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "DASHBOARD_PORT", default_value_t = 8080)]
    port: u16,

    #[command(flatten)]
    config: ConfigArgs,
}

fn print_banner(port: u16, records: usize) {
    println!("============================================================");
    println!("         LAST-MILE DELIVERY DASHBOARD API");
    println!("============================================================");
    println!();
    println!("  Port:     {}", port);
    println!("  REST:     http://localhost:{}/api/v1/", port);
    println!("  Records:  {}", records);
    println!();
    println!("REST Endpoints:");
    println!("  GET  /api/v1/health              Health check");
    println!("  GET  /api/v1/facets              Filter options");
    println!("  GET  /api/v1/metrics             KPI cards");
    println!("  GET  /api/v1/orders              Filtered orders");
    println!("  GET  /api/v1/charts/box-plot     Box plot");
    println!("  GET  /api/v1/charts/heatmap      Heatmap");
    println!("  GET  /api/v1/routes              Route map");
    println!("  POST /api/v1/refresh             Reload data");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();
    let settings = DashboardConfig::from(args.config)
        .validate()
        .context("invalid dashboard configuration")?;

    let service = DashboardService::load(settings).context("failed to load delivery data")?;
    let records = service.table().await.len();
    print_banner(args.port, records);

    let app = router(Arc::new(service));
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
