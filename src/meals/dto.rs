use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::MealRecord;

/// Body of `POST /meals`: the description to estimate.
#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub meal: MealRecord,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MealsListResponse {
    pub meals: Vec<MealRecord>,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteMealResponse {
    pub message: String,
    pub meal_id: Uuid,
}
