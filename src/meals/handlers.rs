use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateMealRequest, DeleteMealResponse, MealResponse, MealsListResponse};
use super::error::MealError;
use super::repo_types::{MealPatch, MealRecord, NewMeal};
use super::stats::StatsReport;
use crate::state::AppState;

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/stats", get(meal_stats))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .route("/meals/manual", post(create_meal_manual))
        .route("/meals/:id", axum::routing::put(update_meal).delete(delete_meal))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
) -> Result<Json<MealsListResponse>, MealError> {
    let meals = state.meals.list_all().await?;
    Ok(Json(MealsListResponse {
        total_count: meals.len(),
        meals,
    }))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealRecord>, MealError> {
    state
        .meals
        .get(id)
        .await?
        .map(Json)
        .ok_or(MealError::NotFound(id))
}

/// POST /meals { "name": "2 Chapati" } -> estimated nutrition, 201
#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<CreateMealRequest>,
) -> Result<(StatusCode, HeaderMap, Json<MealResponse>), MealError> {
    let meal = state.meals.create_with_estimation(&body.name).await?;
    Ok(created(meal, "Meal analyzed and saved successfully"))
}

/// POST /meals/manual { "name": ..., "calories": ..., ... }, 201
#[instrument(skip(state, body))]
pub async fn create_meal_manual(
    State(state): State<AppState>,
    Json(body): Json<NewMeal>,
) -> Result<(StatusCode, HeaderMap, Json<MealResponse>), MealError> {
    let meal = state.meals.create_manual(body).await?;
    Ok(created(meal, "Meal saved successfully"))
}

#[instrument(skip(state, patch))]
pub async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MealPatch>,
) -> Result<Json<MealResponse>, MealError> {
    let meal = state
        .meals
        .update(id, patch)
        .await?
        .ok_or(MealError::NotFound(id))?;
    Ok(Json(MealResponse {
        meal,
        message: "Meal updated successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteMealResponse>, MealError> {
    if !state.meals.delete(id).await? {
        return Err(MealError::NotFound(id));
    }
    Ok(Json(DeleteMealResponse {
        message: "Meal deleted successfully".into(),
        meal_id: id,
    }))
}

#[instrument(skip(state))]
pub async fn meal_stats(State(state): State<AppState>) -> Result<Json<StatsReport>, MealError> {
    Ok(Json(state.meals.statistics().await?))
}

fn created(meal: MealRecord, message: &str) -> (StatusCode, HeaderMap, Json<MealResponse>) {
    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/meals/{}", meal.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    (
        StatusCode::CREATED,
        headers,
        Json(MealResponse {
            meal,
            message: message.into(),
        }),
    )
}
