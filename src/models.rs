use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Order_ID",
    "Order_Date",
    "Area",
    "Traffic",
    "Weather",
    "Vehicle",
    "Category",
    "Agent_Age",
    "Agent_Rating",
    "Store_Latitude",
    "Store_Longitude",
    "Drop_Latitude",
    "Drop_Longitude",
    "order_to_pickup_mins",
    "pickup_to_delivery_mins",
];

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Raw row from the cleaned delivery CSV
#[derive(Debug, Deserialize)]
pub struct CsvRecord {
    #[serde(rename = "Order_ID")]
    pub order_id: String,
    #[serde(rename = "Order_Date")]
    pub order_date: String,
    #[serde(rename = "Order_Time", default)]
    pub order_time: Option<String>,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Traffic")]
    pub traffic: String,
    #[serde(rename = "Weather")]
    pub weather: String,
    #[serde(rename = "Vehicle")]
    pub vehicle: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Agent_Age", deserialize_with = "csv::invalid_option")]
    pub agent_age: Option<f64>,
    #[serde(rename = "Agent_Rating", deserialize_with = "csv::invalid_option")]
    pub agent_rating: Option<f64>,
    #[serde(rename = "Store_Latitude", deserialize_with = "csv::invalid_option")]
    pub store_latitude: Option<f64>,
    #[serde(rename = "Store_Longitude", deserialize_with = "csv::invalid_option")]
    pub store_longitude: Option<f64>,
    #[serde(rename = "Drop_Latitude", deserialize_with = "csv::invalid_option")]
    pub drop_latitude: Option<f64>,
    #[serde(rename = "Drop_Longitude", deserialize_with = "csv::invalid_option")]
    pub drop_longitude: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub order_to_pickup_mins: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub pickup_to_delivery_mins: Option<f64>,
}

/// A validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Returns `None` unless lat is in [-90, 90] and lon in [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Self::new(lat?, lon?)
    }
}

/// One delivery, normalised at load time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRecord {
    pub order_id: String,
    pub order_time: Option<NaiveDateTime>,
    pub area: String,
    pub traffic: String,
    pub weather: String,
    pub vehicle: String,
    pub category: String,
    pub agent_age: Option<u32>,
    pub agent_rating: Option<f64>,
    pub store: Option<GeoPoint>,
    pub drop: Option<GeoPoint>,
    pub order_to_pickup_mins: Option<f64>,
    pub pickup_to_delivery_mins: Option<f64>,
}

impl DeliveryRecord {
    /// Calendar month of the order as a `YYYY-MM` label
    pub fn order_month(&self) -> Option<String> {
        self.order_time.map(|t| t.format("%Y-%m").to_string())
    }

    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::AgentAge => self.agent_age.map(f64::from),
            NumericField::AgentRating => self.agent_rating,
            NumericField::OrderToPickupMins => self.order_to_pickup_mins,
            NumericField::PickupToDeliveryMins => self.pickup_to_delivery_mins,
        }
    }

    pub fn facet(&self, facet: Facet) -> &str {
        match facet {
            Facet::Area => &self.area,
            Facet::Traffic => &self.traffic,
            Facet::Weather => &self.weather,
            Facet::Vehicle => &self.vehicle,
            Facet::Category => &self.category,
        }
    }
}

impl CsvRecord {
    pub fn to_delivery(&self) -> DeliveryRecord {
        DeliveryRecord {
            order_id: self.order_id.clone(),
            order_time: parse_order_time(&self.order_date, self.order_time.as_deref()),
            area: self.area.clone(),
            traffic: self.traffic.clone(),
            weather: self.weather.clone(),
            vehicle: self.vehicle.clone(),
            category: self.category.clone(),
            agent_age: self
                .agent_age
                .filter(|age| age.is_finite() && *age >= 0.0)
                .map(|age| age.round() as u32),
            agent_rating: self
                .agent_rating
                .filter(|rating| (0.0..=5.0).contains(rating)),
            store: GeoPoint::from_parts(self.store_latitude, self.store_longitude),
            drop: GeoPoint::from_parts(self.drop_latitude, self.drop_longitude),
            order_to_pickup_mins: non_negative(self.order_to_pickup_mins),
            pickup_to_delivery_mins: non_negative(self.pickup_to_delivery_mins),
        }
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse the order date, folding in the separate time column when the date
/// carries no time of its own. Unparsable input yields `None`.
pub fn parse_order_time(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = date.trim();
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
    {
        return Some(dt);
    }

    let day = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())?;
    let clock = time
        .map(str::trim)
        .and_then(|t| {
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())
        })
        .unwrap_or(NaiveTime::MIN);
    Some(day.and_time(clock))
}

/// Continuous columns usable for aggregation and binning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    AgentAge,
    AgentRating,
    OrderToPickupMins,
    PickupToDeliveryMins,
}

impl NumericField {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericField::AgentAge => "agent_age",
            NumericField::AgentRating => "agent_rating",
            NumericField::OrderToPickupMins => "order_to_pickup_mins",
            NumericField::PickupToDeliveryMins => "pickup_to_delivery_mins",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumericField {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent_age" | "age" => Ok(NumericField::AgentAge),
            "agent_rating" | "rating" => Ok(NumericField::AgentRating),
            "order_to_pickup_mins" => Ok(NumericField::OrderToPickupMins),
            "pickup_to_delivery_mins" | "delivery_mins" => Ok(NumericField::PickupToDeliveryMins),
            other => Err(DashboardError::InvalidParameter(format!(
                "unknown numeric field '{}'",
                other
            ))),
        }
    }
}

/// Categorical columns used for filtering and grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Area,
    Traffic,
    Weather,
    Vehicle,
    Category,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Facet::Area,
        Facet::Traffic,
        Facet::Weather,
        Facet::Vehicle,
        Facet::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Area => "area",
            Facet::Traffic => "traffic",
            Facet::Weather => "weather",
            Facet::Vehicle => "vehicle",
            Facet::Category => "category",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facet::ALL
            .into_iter()
            .find(|facet| facet.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::InvalidParameter(format!("unknown facet '{}'", s)))
    }
}

/// Immutable, ordered set of deliveries loaded from one input file
#[derive(Debug, Clone, Default)]
pub struct DeliveryTable {
    records: Vec<DeliveryRecord>,
}

impl DeliveryTable {
    pub fn new(records: Vec<DeliveryRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DeliveryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values of a facet in first-seen order
    pub fn facet_values(&self, facet: Facet) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.facet(facet))
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect()
    }

    /// Distinct order months, oldest first
    pub fn months(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(DeliveryRecord::order_month)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
