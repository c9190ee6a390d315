//! Tool-calling inference endpoint

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use cactus_gateway_core::{InferRequest, InferResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn infer(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<InferRequest>, ApiError>,
) -> Result<Json<InferResponse>, ApiError> {
    let response = state.inference.infer(req).await?;
    Ok(Json(response))
}
