use crate::error::InsightError;
use crate::models::GeneratedResponse;
use crate::services::metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::time::Instant;

/// `POST /generate-data`: have the model invent a sample JSON dataset.
/// Any request body is ignored.
#[tracing::instrument(skip(state))]
pub async fn generate_data(
    State(state): State<AppState>,
) -> Result<Json<GeneratedResponse>, InsightError> {
    let start = Instant::now();
    let result = state.analysis.generate_sample().await;

    let status = match &result {
        Ok(response) => {
            tracing::info!(kind = response.json_para_envio.kind(), "Sample generated");
            StatusCode::OK
        }
        Err(e) => {
            tracing::warn!(error = %e, "Generate request failed");
            e.status()
        }
    };
    metrics::record_request("generate_data", status.as_u16(), start.elapsed().as_secs_f64());

    result.map(Json)
}
