use tracing::{info, instrument, warn};

use super::error::MealError;
use super::repo_types::NewMeal;
use super::services::MealManager;
use crate::nutrition::Nutrients;

#[allow(clippy::too_many_arguments)]
fn sample(
    name: &str,
    calories: f64,
    protein: f64,
    fats: f64,
    carbohydrates: f64,
    fiber: f64,
    sugar: f64,
    sodium: f64,
) -> NewMeal {
    NewMeal::new(
        name,
        Nutrients {
            calories: Some(calories),
            protein: Some(protein),
            fats: Some(fats),
            carbohydrates: Some(carbohydrates),
            fiber: Some(fiber),
            sugar: Some(sugar),
            sodium: Some(sodium),
        },
    )
}

pub fn sample_meals() -> Vec<NewMeal> {
    vec![
        sample("2 Chapati", 240.0, 8.0, 4.0, 48.0, 4.0, 2.0, 320.0),
        sample("1 Bowl Dal", 180.0, 12.0, 2.0, 28.0, 6.0, 3.0, 450.0),
        sample("1 Plate Upma", 220.0, 6.0, 8.0, 35.0, 3.0, 4.0, 380.0),
        sample("Oatmeal Bowl", 150.0, 5.0, 3.0, 27.0, 4.0, 8.0, 200.0),
    ]
}

/// Insert the sample meals when the store is empty. Returns how many were added.
#[instrument(skip(manager))]
pub async fn seed_if_empty(manager: &MealManager) -> Result<usize, MealError> {
    let existing = manager.list_all().await?;
    if !existing.is_empty() {
        info!(count = existing.len(), "store already contains meals; skipping seed");
        return Ok(0);
    }

    let mut added = 0;
    for meal in sample_meals() {
        let name = meal.name.clone();
        match manager.create_manual(meal).await {
            Ok(_) => added += 1,
            Err(e) => warn!(error = %e, %name, "failed to seed sample meal"),
        }
    }
    info!(added, "sample meals added");
    Ok(added)
}
