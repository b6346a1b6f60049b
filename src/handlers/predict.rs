//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::model::Prediction;
use crate::{AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

/// Classify one text. Empty strings are valid input.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<Prediction>> {
    let Json(req) = payload?;
    let prediction = state.predictor.predict(&req.text)?;
    Ok(Json(prediction))
}
