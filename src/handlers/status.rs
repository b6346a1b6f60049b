//! Status handlers: root banner, ping, health

use axum::{extract::State, Json};
use serde::Serialize;

use crate::model::ModelInfo;
use crate::{AppError, AppState};

#[derive(Serialize)]
pub struct RootResponse {
    msg: &'static str,
}

#[derive(Serialize)]
pub struct PingResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelInfo,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        msg: "Hate classification ready!",
    })
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "ok" })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model: state.predictor.info().clone(),
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
