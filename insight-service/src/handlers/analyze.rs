use crate::error::InsightError;
use crate::models::SummaryResponse;
use crate::services::metrics;
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::time::Instant;

/// `POST /analyze-data`: summarize an arbitrary JSON object for a manager.
///
/// The raw body is read as bytes so that every rejection (wrong content type,
/// empty body, malformed JSON, non-object value) produces the same 400 shape.
#[tracing::instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn analyze_data(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SummaryResponse>, InsightError> {
    let start = Instant::now();
    let result = state.analysis.summarize(&body).await;

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Analyze request failed");
            e.status()
        }
    };
    metrics::record_request("analyze_data", status.as_u16(), start.elapsed().as_secs_f64());

    result.map(Json)
}
