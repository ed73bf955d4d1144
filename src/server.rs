use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http::{header, HeaderValue, StatusCode};
use serde_json::json;
use thiserror::Error;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::address::{Address, AddressError};
use crate::chain::ActivitySource;
use crate::error::FetchError;
use crate::output::{build_response, CheckWalletResponse, Labels};
use crate::scoring::{calculate_score, ScoringConfig};

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ActivitySource>,
    pub scoring: Arc<ScoringConfig>,
    pub labels: Arc<Labels>,
}

impl AppState {
    pub fn new(source: Arc<dyn ActivitySource>, scoring: ScoringConfig, labels: Labels) -> Self {
        Self {
            source,
            scoring: Arc::new(scoring),
            labels: Arc::new(labels),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    BadAddress(#[from] AddressError),
    #[error(transparent)]
    Upstream(#[from] FetchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadAddress(e) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
            }
            ApiError::Upstream(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Unable to fetch blockchain data",
                    "details": e.to_string(),
                })),
            )
                .into_response(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/check-wallet", get(check_wallet).options(preflight))
        .route("/health", get(|| async { Json(json!({ "ok": true })) }))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn check_wallet(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<CheckWalletResponse>, ApiError> {
    // Raw pairs rather than a struct so repeated or unexpected keys never turn
    // into a non-JSON rejection. The first `address` wins.
    let raw = params
        .into_iter()
        .find(|(key, _)| key == "address")
        .map(|(_, value)| value)
        .unwrap_or_default();
    let address = Address::parse(&raw)?;

    let snapshot = state.source.snapshot(&address).await.map_err(|e| {
        error!(
            address = %address,
            operation = e.operation(),
            error = %e,
            "upstream data unavailable"
        );
        e
    })?;

    let result = calculate_score(&address, &snapshot, &state.scoring);
    info!(
        address = %address,
        points = result.points,
        tokens = result.tokens,
        weights = %state.scoring.version,
        "wallet scored"
    );

    Ok(Json(build_response(&address, &result, &state.labels)))
}
