// =============================================================================
// HTTP Endpoints — Axum 0.7
// =============================================================================
//
// HTML:
//   GET  /          symbol picker
//   POST /analyze   dashboard for the submitted symbol
//
// JSON (under /api/v1/):
//   GET  /health              liveness
//   GET  /symbols             ticker directory
//   GET  /analysis/:symbol    full indicator report
//
// Each analysis failure kind maps to its own status code (see `status_for`).
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Form, Json, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{analyze, AnalysisError};
use crate::api::pages;
use crate::app_state::AppState;
use crate::charts::DashboardCharts;
use crate::error::DataSourceError;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Pages ───────────────────────────────────────────────────
        .route("/", get(index))
        .route("/analyze", post(analyze_form))
        // ── JSON API ────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/analysis/:symbol", get(analysis_json))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

/// HTTP status for each analysis failure kind.
fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::DataSource(e) => match e {
            DataSourceError::InvalidSymbol(_) => StatusCode::BAD_REQUEST,
            DataSourceError::SymbolNotFound(_) | DataSourceError::NoData(_) => StatusCode::NOT_FOUND,
            DataSourceError::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DataSourceError::InvalidSeries(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DataSourceError::Http { .. } | DataSourceError::Request(_) | DataSourceError::Malformed(_) => {
                StatusCode::BAD_GATEWAY
            }
        },
        AnalysisError::Engine(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Symbols
// =============================================================================

async fn symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.symbols.symbols().await)
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let symbols = state.symbols.symbols().await;
    Html(pages::index_page(&symbols))
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Deserialize)]
struct AnalyzeForm {
    symbol: String,
}

async fn analyze_form(State(state): State<Arc<AppState>>, Form(form): Form<AnalyzeForm>) -> Response {
    info!(symbol = %form.symbol, "analysis requested via form");

    match analyze(state.bar_source.as_ref(), &form.symbol, state.request_range()).await {
        Ok(report) => {
            let charts = DashboardCharts::from_report(&report);
            Html(pages::analysis_page(&report, &charts)).into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            warn!(symbol = %form.symbol, status = status.as_u16(), error = %e, "analysis failed");
            (status, Html(pages::error_page(&form.symbol, &e.to_string()))).into_response()
        }
    }
}

async fn analysis_json(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let report = analyze(state.bar_source.as_ref(), &symbol, state.request_range())
        .await
        .map_err(|e| {
            let status = status_for(&e);
            warn!(symbol = %symbol, status = status.as_u16(), error = %e, "analysis failed");
            (
                status,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "kind": e.kind(),
                })),
            )
        })?;

    Ok(Json(report))
}
