//! Per-order route extraction for the map panel.

use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{DeliveryRecord, GeoPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub order_id: String,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

impl Route {
    /// Arithmetic centroid of the endpoints, used only to center the map.
    /// Not a geodesic midpoint; close enough at city scale.
    pub fn midpoint(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.origin.lat + self.destination.lat) / 2.0,
            lon: (self.origin.lon + self.destination.lon) / 2.0,
        }
    }

    pub fn map_view(&self) -> MapView {
        MapView {
            center: self.midpoint(),
            markers: vec![
                MapMarker {
                    point: self.origin,
                    color: "green".to_string(),
                    label: format!("Store ({})", self.order_id),
                },
                MapMarker {
                    point: self.destination,
                    color: "red".to_string(),
                    label: format!("Drop ({})", self.order_id),
                },
            ],
            path: vec![self.origin, self.destination],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub point: GeoPoint,
    pub color: String,
    pub label: String,
}

/// Declarative description handed to the map renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub markers: Vec<MapMarker>,
    pub path: Vec<GeoPoint>,
}

/// Store and drop coordinates of the record at `index`.
pub fn select_route(records: &[&DeliveryRecord], index: isize) -> Result<Route> {
    let record = usize::try_from(index)
        .ok()
        .and_then(|i| records.get(i))
        .ok_or(DashboardError::Index {
            index,
            len: records.len(),
        })?;

    match (record.store, record.drop) {
        (Some(origin), Some(destination)) => Ok(Route {
            order_id: record.order_id.clone(),
            origin,
            destination,
        }),
        _ => Err(DashboardError::MissingCoordinates {
            order_id: record.order_id.clone(),
        }),
    }
}
