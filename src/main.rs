//! Terminal report for the delivery dashboard
//!
//! Run: ./target/release/last_mile_dashboard [OPTIONS] <COMMAND>
//! Commands: summary, heatmap, box-plot, route, facets

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use last_mile_dashboard::api::DashboardService;
use last_mile_dashboard::config::{ConfigArgs, DashboardConfig};
use last_mile_dashboard::filter::FilterSelection;
use last_mile_dashboard::models::{DeliveryTable, Facet, NumericField};

#[derive(Parser)]
#[command(name = "last_mile_dashboard")]
#[command(about = "Last-mile delivery dashboard in the terminal", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Areas to include, comma separated (default: all)
    #[arg(long, global = true)]
    areas: Option<String>,

    /// Traffic levels to include, comma separated (default: all)
    #[arg(long, global = true)]
    traffic: Option<String>,

    /// Only orders placed in this month (YYYY-MM)
    #[arg(long, global = true)]
    month: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// KPI cards for the current selection
    Summary,
    /// Mean delivery minutes by agent age and rating
    Heatmap,
    /// Five-number summary of a numeric field per category
    BoxPlot {
        #[arg(long, default_value = "traffic")]
        facet: String,
        #[arg(long, default_value = "pickup_to_delivery_mins")]
        field: String,
    },
    /// Store and drop coordinates for one filtered order
    Route {
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        index: isize,
    },
    /// Available filter values
    Facets,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = DashboardConfig::from(cli.config)
        .validate()
        .context("invalid dashboard configuration")?;
    let service = DashboardService::load(settings).context("failed to load delivery data")?;

    let table = service.table().await;
    let selection = FilterSelection::from_params(
        &table,
        cli.filter.areas.as_deref(),
        cli.filter.traffic.as_deref(),
        cli.filter.month.as_deref(),
    )?;

    match cli.command {
        Commands::Summary => run_summary(&service, &table, &selection),
        Commands::Heatmap => run_heatmap(&service, &table, &selection),
        Commands::BoxPlot { facet, field } => {
            run_box_plot(&service, &table, &selection, facet.parse()?, field.parse()?)
        }
        Commands::Route { index } => run_route(&service, &table, &selection, index)?,
        Commands::Facets => run_facets(&service).await,
    }

    Ok(())
}

fn run_summary(service: &DashboardService, table: &DeliveryTable, selection: &FilterSelection) {
    print_section_header("LAST MILE DELIVERY ANALYSIS");
    let overview = service.overview(table, selection);
    let m = &overview.metrics;

    println!("  Total Deliveries:        {:>12}", m.total_deliveries);
    println!(
        "  Avg. Delivery Duration:  {:>12} mins",
        format_optional(m.avg_delivery_mins)
    );
    println!(
        "  % Under {:<4} mins:       {:>11.1}%",
        m.fast_threshold_mins, m.percent_fast
    );
    println!("  Same-day Deliveries:     {:>12}", m.same_day_deliveries);
}

fn run_heatmap(service: &DashboardService, table: &DeliveryTable, selection: &FilterSelection) {
    print_section_header("AVG DELIVERY MINUTES BY AGENT AGE × RATING");
    let grid = service.heatmap(table, selection);

    print!("  {:>10}", "age \\ rtg");
    for label in &grid.col_labels {
        print!(" {:>11}", label);
    }
    println!();
    println!("  {}", "─".repeat(10 + 12 * grid.col_labels.len()));
    for (label, row) in grid.row_labels.iter().zip(&grid.cells) {
        print!("  {:>10}", label);
        for cell in row {
            print!(" {:>11}", format_optional(*cell));
        }
        println!();
    }
}

fn run_box_plot(
    service: &DashboardService,
    table: &DeliveryTable,
    selection: &FilterSelection,
    facet: Facet,
    field: NumericField,
) {
    print_section_header(&format!("{} BY {}", field, facet).to_uppercase());
    let series = service.box_plot(table, selection, facet, field);
    if series.is_empty() {
        println!("  No data for the current selection");
        return;
    }

    println!(
        "  {:20} {:>7} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Category", "Count", "Min", "Q1", "Median", "Q3", "Max"
    );
    println!("  {}", "─".repeat(78));
    for s in &series {
        println!(
            "  {:20} {:>7} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>9.1}",
            s.category, s.count, s.min, s.q1, s.median, s.q3, s.max
        );
    }
}

fn run_route(
    service: &DashboardService,
    table: &DeliveryTable,
    selection: &FilterSelection,
    index: isize,
) -> Result<()> {
    print_section_header("ROUTE MAP");
    let panel = service.route(table, selection, index)?;

    match (panel.route, panel.map) {
        (Some(route), Some(map)) => {
            println!("  Order:        {}  ({} of {})", route.order_id, index + 1, panel.selectable_orders);
            println!("  Store:        {:>10.6}, {:>10.6}", route.origin.lat, route.origin.lon);
            println!("  Drop:         {:>10.6}, {:>10.6}", route.destination.lat, route.destination.lon);
            println!("  Map center:   {:>10.6}, {:>10.6}", map.center.lat, map.center.lon);
        }
        _ => println!("  No orders match the current selection"),
    }
    Ok(())
}

async fn run_facets(service: &DashboardService) {
    print_section_header("FILTER OPTIONS");
    let facets = service.facets().await;
    println!("  Records:     {}", facets.total_records);
    println!("  Areas:       {}", facets.areas.join(", "));
    println!("  Traffic:     {}", facets.traffic.join(", "));
    println!("  Weather:     {}", facets.weather.join(", "));
    println!("  Vehicles:    {}", facets.vehicles.join(", "));
    println!("  Categories:  {}", facets.categories.join(", "));
    println!("  Months:      {}", facets.months.join(", "));
}
