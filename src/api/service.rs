//! Shared business logic for the dashboard panels
//!
//! Used by both the REST handlers and the terminal report.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::binning::{grouped_mean, GroupedTable};
use crate::charts::{box_plot, BoxPlotSeries};
use crate::config::Settings;
use crate::error::Result;
use crate::filter::{filter, FilterSelection};
use crate::loader::load_deliveries;
use crate::metrics::{dashboard_metrics, DashboardMetrics};
use crate::models::{DeliveryRecord, DeliveryTable, Facet, NumericField};
use crate::route::{select_route, MapView, Route};

// ============================================================================
// Panel Structures
// ============================================================================

/// Options for the selection widgets
#[derive(Debug, Clone, Serialize)]
pub struct Facets {
    pub total_records: usize,
    pub areas: Vec<String>,
    pub traffic: Vec<String>,
    pub weather: Vec<String>,
    pub vehicles: Vec<String>,
    pub categories: Vec<String>,
    pub months: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub metrics: DashboardMetrics,
    /// Rows available to the route selector; 0 disables it
    pub selectable_orders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutePanel {
    pub enabled: bool,
    pub selectable_orders: usize,
    pub route: Option<Route>,
    pub map: Option<MapView>,
}

// ============================================================================
// Dashboard Service
// ============================================================================

pub struct DashboardService {
    settings: Settings,
    table: RwLock<Arc<DeliveryTable>>,
}

impl DashboardService {
    /// Load the configured data file. Fails if the initial load fails.
    pub fn load(settings: Settings) -> Result<Self> {
        let table = load_deliveries(&settings.data_path)?;
        Ok(Self::with_table(settings, table))
    }

    pub fn with_table(settings: Settings, table: DeliveryTable) -> Self {
        Self {
            settings,
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Snapshot of the current table; the lock is released on return.
    pub async fn table(&self) -> Arc<DeliveryTable> {
        self.table.read().await.clone()
    }

    /// Reload the data file and swap it in. The previous table stays in
    /// place when the reload fails.
    pub async fn refresh(&self) -> Result<usize> {
        let table = match load_deliveries(&self.settings.data_path) {
            Ok(table) => table,
            Err(e) => {
                warn!("Refresh failed, keeping current table: {}", e);
                return Err(e);
            }
        };
        let count = table.len();
        {
            let mut current = self.table.write().await;
            *current = Arc::new(table);
        }
        info!("Refreshed delivery table: {} records", count);
        Ok(count)
    }

    pub async fn facets(&self) -> Facets {
        let table = self.table().await;
        Facets {
            total_records: table.len(),
            areas: table.facet_values(Facet::Area),
            traffic: table.facet_values(Facet::Traffic),
            weather: table.facet_values(Facet::Weather),
            vehicles: table.facet_values(Facet::Vehicle),
            categories: table.facet_values(Facet::Category),
            months: table.months(),
        }
    }

    // Panels below work on a caller-held snapshot from `table()`, so one
    // request sees a single table even if a refresh lands mid-way.

    pub fn overview(&self, table: &DeliveryTable, selection: &FilterSelection) -> Overview {
        let rows = filter(table.records(), selection);
        Overview {
            metrics: dashboard_metrics(&rows, &self.settings.thresholds),
            selectable_orders: rows.len(),
        }
    }

    /// Filtered row count plus the first `limit` matching orders.
    pub fn orders(
        &self,
        table: &DeliveryTable,
        selection: &FilterSelection,
        limit: usize,
    ) -> (usize, Vec<DeliveryRecord>) {
        let rows = filter(table.records(), selection);
        let orders = rows.iter().take(limit).map(|r| (*r).clone()).collect();
        (rows.len(), orders)
    }

    pub fn box_plot(
        &self,
        table: &DeliveryTable,
        selection: &FilterSelection,
        facet: Facet,
        field: NumericField,
    ) -> Vec<BoxPlotSeries> {
        let rows = filter(table.records(), selection);
        box_plot(&rows, facet, field)
    }

    /// Mean delivery minutes by agent age × agent rating
    pub fn heatmap(&self, table: &DeliveryTable, selection: &FilterSelection) -> GroupedTable {
        let rows = filter(table.records(), selection);
        grouped_mean(
            &rows,
            NumericField::AgentAge,
            &self.settings.age_bins,
            NumericField::AgentRating,
            &self.settings.rating_bins,
            NumericField::PickupToDeliveryMins,
        )
    }

    /// Route for the `index`-th filtered order. An empty selection disables
    /// the panel instead of failing.
    pub fn route(
        &self,
        table: &DeliveryTable,
        selection: &FilterSelection,
        index: isize,
    ) -> Result<RoutePanel> {
        let rows = filter(table.records(), selection);
        if rows.is_empty() {
            return Ok(RoutePanel {
                enabled: false,
                selectable_orders: 0,
                route: None,
                map: None,
            });
        }

        let route = select_route(&rows, index)?;
        Ok(RoutePanel {
            enabled: true,
            selectable_orders: rows.len(),
            map: Some(route.map_view()),
            route: Some(route),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::error::DashboardError;
    use crate::models::fixtures::{record, with_duration};

    fn service() -> DashboardService {
        let settings = DashboardConfig::default().validate().unwrap();
        let table = DeliveryTable::new(vec![
            with_duration(record("a", "Urban", "High"), Some(60.0)),
            with_duration(record("b", "Metropolitian", "Jam"), Some(180.0)),
            with_duration(record("c", "Urban", "Low"), Some(95.0)),
        ]);
        DashboardService::with_table(settings, table)
    }

    #[tokio::test]
    async fn test_overview_with_default_selection() {
        let service = service();
        let table = service.table().await;
        let selection = FilterSelection::from_params(&table, None, None, None).unwrap();
        let overview = service.overview(&table, &selection);
        assert_eq!(overview.metrics.total_deliveries, 3);
        assert_eq!(overview.metrics.percent_fast, 33.3);
        assert_eq!(overview.metrics.avg_delivery_mins, Some(111.7));
        assert_eq!(overview.selectable_orders, 3);
    }

    #[tokio::test]
    async fn test_empty_selection_degrades() {
        let service = service();
        let table = service.table().await;
        let selection = FilterSelection::from_params(&table, Some(""), None, None).unwrap();

        let overview = service.overview(&table, &selection);
        assert_eq!(overview.metrics.total_deliveries, 0);
        assert_eq!(overview.metrics.avg_delivery_mins, None);
        assert_eq!(overview.metrics.percent_fast, 0.0);

        let panel = service.route(&table, &selection, 0).unwrap();
        assert!(!panel.enabled);
        assert!(panel.route.is_none());

        assert!(service
            .box_plot(&table, &selection, Facet::Traffic, NumericField::PickupToDeliveryMins)
            .is_empty());
        let heatmap = service.heatmap(&table, &selection);
        assert!(heatmap.cells.iter().flatten().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_route_index_out_of_range() {
        let service = service();
        let table = service.table().await;
        let selection = FilterSelection::from_params(&table, Some("Urban"), None, None).unwrap();
        let err = service.route(&table, &selection, 2).unwrap_err();
        assert!(matches!(err, DashboardError::Index { index: 2, len: 2 }));

        let panel = service.route(&table, &selection, 1).unwrap();
        assert_eq!(panel.route.unwrap().order_id, "c");
    }

    #[tokio::test]
    async fn test_facets_and_orders() {
        let service = service();
        let facets = service.facets().await;
        assert_eq!(facets.total_records, 3);
        assert_eq!(facets.areas, vec!["Urban", "Metropolitian"]);
        assert_eq!(facets.months, vec!["2022-03"]);

        let table = service.table().await;
        let selection = FilterSelection::from_params(&table, None, Some("Jam,Low"), None).unwrap();
        let (total, orders) = service.orders(&table, &selection, 1);
        assert_eq!(total, 2);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "b");
    }

    #[tokio::test]
    async fn test_snapshot_survives_refresh() {
        let mut service = service();
        service.settings.data_path =
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/deliveries.csv").into();

        let before = service.table().await;
        let selection = FilterSelection::from_params(&before, None, None, None).unwrap();
        assert_eq!(service.refresh().await.unwrap(), 14);

        let after = service.table().await;
        assert!(!Arc::ptr_eq(&before, &after));

        // the old snapshot still answers with its own rows
        let overview = service.overview(&before, &selection);
        let (total, orders) = service.orders(&before, &selection, 100);
        assert_eq!(overview.selectable_orders, 3);
        assert_eq!(total, overview.selectable_orders);
        assert_eq!(orders.len(), 3);
        assert_eq!(after.len(), 14);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_table() {
        let mut settings = DashboardConfig::default().validate().unwrap();
        settings.data_path = "does/not/exist.csv".into();
        let service = DashboardService::with_table(
            settings,
            DeliveryTable::new(vec![record("a", "Urban", "Low")]),
        );
        assert!(service.refresh().await.is_err());
        assert_eq!(service.table().await.len(), 1);
    }
}
