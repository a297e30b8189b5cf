//! REST API handlers for the delivery dashboard
//!
//! These handlers use the shared DashboardService.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::service::{DashboardService, Facets, Overview, RoutePanel};
use crate::binning::GroupedTable;
use crate::charts::BoxPlotSeries;
use crate::error::DashboardError;
use crate::filter::FilterSelection;
use crate::models::{DeliveryRecord, DeliveryTable, Facet, NumericField};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct OrdersResponse {
    pub total: usize,
    pub orders: Vec<DeliveryRecord>,
}

#[derive(Serialize)]
pub struct BoxPlotResponse {
    pub facet: Facet,
    pub field: NumericField,
    pub series: Vec<BoxPlotSeries>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub records: usize,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: DashboardError) -> ApiError {
    let status = match &e {
        DashboardError::Index { .. } | DashboardError::MissingCoordinates { .. } => StatusCode::NOT_FOUND,
        DashboardError::InvalidParameter(_) | DashboardError::InvalidBins(_) => StatusCode::BAD_REQUEST,
        DashboardError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

/// Malformed query strings (`?index=abc`) answer in the same JSON shape.
fn query_params(query: Result<Query<PanelQuery>, QueryRejection>) -> Result<PanelQuery, ApiError> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: rejection.body_text(),
            }),
        )),
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Filter widgets plus the per-panel extras. `areas`/`traffic` are
/// comma-separated; leaving one out selects every value.
#[derive(Deserialize, Default)]
pub struct PanelQuery {
    pub areas: Option<String>,
    pub traffic: Option<String>,
    pub month: Option<String>,
    pub limit: Option<usize>,
    pub facet: Option<String>,
    pub field: Option<String>,
    pub index: Option<isize>,
}

impl PanelQuery {
    fn selection(&self, table: &DeliveryTable) -> Result<FilterSelection, ApiError> {
        FilterSelection::from_params(
            table,
            self.areas.as_deref(),
            self.traffic.as_deref(),
            self.month.as_deref(),
        )
        .map_err(error_response)
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<DashboardService>;

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/facets
pub async fn get_facets(State(service): State<AppState>) -> Json<Facets> {
    Json(service.facets().await)
}

/// GET /api/v1/metrics
pub async fn get_metrics(
    State(service): State<AppState>,
    query: Result<Query<PanelQuery>, QueryRejection>,
) -> Result<Json<Overview>, ApiError> {
    let params = query_params(query)?;
    let table = service.table().await;
    let selection = params.selection(&table)?;
    Ok(Json(service.overview(&table, &selection)))
}

/// GET /api/v1/orders
pub async fn get_orders(
    State(service): State<AppState>,
    query: Result<Query<PanelQuery>, QueryRejection>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let params = query_params(query)?;
    let table = service.table().await;
    let selection = params.selection(&table)?;
    let (total, orders) = service.orders(&table, &selection, params.limit.unwrap_or(100));
    Ok(Json(OrdersResponse { total, orders }))
}

/// GET /api/v1/charts/box-plot
pub async fn get_box_plot(
    State(service): State<AppState>,
    query: Result<Query<PanelQuery>, QueryRejection>,
) -> Result<Json<BoxPlotResponse>, ApiError> {
    let params = query_params(query)?;
    let table = service.table().await;
    let selection = params.selection(&table)?;
    let facet: Facet = params
        .facet
        .as_deref()
        .unwrap_or("traffic")
        .parse()
        .map_err(error_response)?;
    let field: NumericField = params
        .field
        .as_deref()
        .unwrap_or("pickup_to_delivery_mins")
        .parse()
        .map_err(error_response)?;

    let series = service.box_plot(&table, &selection, facet, field);
    Ok(Json(BoxPlotResponse { facet, field, series }))
}

/// GET /api/v1/charts/heatmap
pub async fn get_heatmap(
    State(service): State<AppState>,
    query: Result<Query<PanelQuery>, QueryRejection>,
) -> Result<Json<GroupedTable>, ApiError> {
    let params = query_params(query)?;
    let table = service.table().await;
    let selection = params.selection(&table)?;
    Ok(Json(service.heatmap(&table, &selection)))
}

/// GET /api/v1/routes?index=N
pub async fn get_route(
    State(service): State<AppState>,
    query: Result<Query<PanelQuery>, QueryRejection>,
) -> Result<Json<RoutePanel>, ApiError> {
    let params = query_params(query)?;
    let table = service.table().await;
    let selection = params.selection(&table)?;
    service
        .route(&table, &selection, params.index.unwrap_or(0))
        .map(Json)
        .map_err(error_response)
}

/// POST /api/v1/refresh
pub async fn refresh(State(service): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    service
        .refresh()
        .await
        .map(|records| Json(RefreshResponse { records }))
        .map_err(error_response)
}

pub fn router(service: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/facets", get(get_facets))
        .route("/api/v1/metrics", get(get_metrics))
        .route("/api/v1/orders", get(get_orders))
        .route("/api/v1/charts/box-plot", get(get_box_plot))
        .route("/api/v1/charts/heatmap", get(get_heatmap))
        .route("/api/v1/routes", get(get_route))
        .route("/api/v1/refresh", post(refresh))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
