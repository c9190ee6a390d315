//! Audio transcription endpoint

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use cactus_gateway_core::{TranscribeRequest, TranscribeResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn transcribe(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<TranscribeRequest>, ApiError>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let response = state.transcription.transcribe(req).await?;
    Ok(Json(response))
}
