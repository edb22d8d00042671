use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{instrument, warn};

use crate::state::AppState;

pub const SERVICE_NAME: &str = "MealMind Nutrition API";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
    pub database: &'static str,
    pub nutrition_service: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: &'static str,
    pub health: &'static str,
    pub meals_endpoint: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Always 200; a failed store probe reports "degraded" instead of erroring.
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.meals.ping_store().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!(error = %e, "store ping failed");
            "disconnected"
        }
    };
    let nutrition_service = if state.meals.is_estimation_available() {
        "available"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: if database == "connected" { "healthy" } else { "degraded" },
        message: format!("{SERVICE_NAME} is running"),
        database,
        nutrition_service,
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: format!("Welcome to {SERVICE_NAME}"),
        version: env!("CARGO_PKG_VERSION"),
        health: "/api/v1/health",
        meals_endpoint: "/api/v1/meals",
    })
}
