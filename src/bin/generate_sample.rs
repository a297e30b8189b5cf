//! Sample data generator for the delivery dashboard
//!
//! Writes synthetic deliveries in the cleaned dataset's column layout so the
//! dashboard can run without the real file.
//!
//! Usage:
//!   cargo run --release --bin generate_sample -- [OPTIONS]
//!
//! Options:
//!   --rows <N>       Number of deliveries (default: 5000)
//!   --seed <N>       Random seed for reproducibility (optional)
//!   --output <PATH>  Output CSV path (default: data/amazon_delivery_cleaned.csv)

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use last_mile_dashboard::config::DEFAULT_DATA_PATH;

/// Synthetic data generator for the delivery dataset
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Generate synthetic last-mile delivery data")]
struct Args {
    /// Number of deliveries to generate
    #[arg(long, default_value = "5000")]
    rows: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct OutputRecord {
    #[serde(rename = "Order_ID")]
    order_id: String,
    #[serde(rename = "Agent_Age")]
    agent_age: u32,
    #[serde(rename = "Agent_Rating")]
    agent_rating: f64,
    #[serde(rename = "Store_Latitude")]
    store_latitude: f64,
    #[serde(rename = "Store_Longitude")]
    store_longitude: f64,
    #[serde(rename = "Drop_Latitude")]
    drop_latitude: f64,
    #[serde(rename = "Drop_Longitude")]
    drop_longitude: f64,
    #[serde(rename = "Order_Date")]
    order_date: String,
    #[serde(rename = "Order_Time")]
    order_time: String,
    #[serde(rename = "Weather")]
    weather: &'static str,
    #[serde(rename = "Traffic")]
    traffic: &'static str,
    #[serde(rename = "Vehicle")]
    vehicle: &'static str,
    #[serde(rename = "Area")]
    area: &'static str,
    #[serde(rename = "Category")]
    category: &'static str,
    order_to_pickup_mins: f64,
    pickup_to_delivery_mins: f64,
}

const AREAS: &[&str] = &["Metropolitian", "Urban", "Semi-Urban", "Other"];
const WEATHER: &[&str] = &["Sunny", "Cloudy", "Fog", "Windy", "Stormy", "Sandstorms"];
const VEHICLES: &[&str] = &["motorcycle", "scooter", "van", "bicycle"];
const CATEGORIES: &[&str] = &[
    "Electronics", "Clothing", "Sports", "Cosmetics", "Toys", "Snacks", "Shoes",
    "Apparel", "Jewelry", "Outdoors", "Grocery", "Books", "Kitchen", "Home", "Pet Supplies",
    "Skincare",
];

/// (traffic level, base delivery minutes)
const TRAFFIC: &[(&str, f64)] = &[("Low", 95.0), ("Medium", 125.0), ("High", 130.0), ("Jam", 150.0)];

/// City centres stores are scattered around
const CITIES: &[(f64, f64)] = &[
    (12.9716, 77.5946),
    (19.0760, 72.8777),
    (28.7041, 77.1025),
    (13.0827, 80.2707),
    (17.3850, 78.4867),
    (22.5726, 88.3639),
    (18.5204, 73.8567),
    (22.7196, 75.8577),
];

fn generate(rng: &mut StdRng, i: usize, first_day: NaiveDate) -> OutputRecord {
    let (city_lat, city_lon) = CITIES[rng.gen_range(0..CITIES.len())];
    let store_latitude = city_lat + rng.gen_range(-0.08..0.08);
    let store_longitude = city_lon + rng.gen_range(-0.08..0.08);
    let drop_latitude = store_latitude + rng.gen_range(-0.15..0.15);
    let drop_longitude = store_longitude + rng.gen_range(-0.15..0.15);

    let (traffic, base_mins) = TRAFFIC[rng.gen_range(0..TRAFFIC.len())];
    let area = AREAS[rng.gen_range(0..AREAS.len())];
    let area_penalty = match area {
        "Metropolitian" => 10.0,
        "Semi-Urban" => 40.0,
        _ => 0.0,
    };
    let agent_age: u32 = rng.gen_range(15..=39);
    let agent_rating = (rng.gen_range(2.5_f64..=5.0) * 10.0).round() / 10.0;
    let rating_penalty = (5.0 - agent_rating) * 12.0;

    let pickup_to_delivery_mins =
        (base_mins + area_penalty + rating_penalty + rng.gen_range(-40.0..60.0)).max(10.0).round();
    let order_to_pickup_mins = [5.0, 10.0, 15.0][rng.gen_range(0..3)];

    let day = first_day + Duration::days(rng.gen_range(0..55));
    let time = NaiveTime::from_num_seconds_from_midnight_opt(rng.gen_range(8 * 3600..23 * 3600), 0)
        .unwrap_or(NaiveTime::MIN);

    OutputRecord {
        order_id: format!("smpl{:09}", i),
        agent_age,
        agent_rating,
        store_latitude,
        store_longitude,
        drop_latitude,
        drop_longitude,
        order_date: day.format("%Y-%m-%d").to_string(),
        order_time: time.format("%H:%M:%S").to_string(),
        weather: WEATHER[rng.gen_range(0..WEATHER.len())],
        traffic,
        vehicle: VEHICLES[rng.gen_range(0..VEHICLES.len())],
        area,
        category: CATEGORIES[rng.gen_range(0..CATEGORIES.len())],
        order_to_pickup_mins,
        pickup_to_delivery_mins,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&args.output)
        .with_context(|| format!("opening {:?}", args.output))?;

    let first_day = NaiveDate::from_ymd_opt(2022, 2, 11).context("invalid start date")?;
    for i in 0..args.rows {
        writer.serialize(generate(&mut rng, i, first_day))?;
        if (i + 1) % 10_000 == 0 {
            info!("Generated {}/{} rows...", i + 1, args.rows);
        }
    }
    writer.flush()?;

    info!("Wrote {} deliveries to {:?}", args.rows, args.output);
    Ok(())
}
