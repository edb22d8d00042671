use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::error::MealError;
use super::repo::MealStore;
use super::repo_types::{validate_name, MealPatch, MealRecord, NewMeal};
use super::stats::{self, StatsReport};
use crate::nutrition::{EstimationError, NutritionEstimator};

/// Business rules for meals: composes the store and the nutrition estimator.
///
/// Holds no mutable state of its own; share it behind an `Arc`.
pub struct MealManager {
    store: Arc<dyn MealStore>,
    estimator: NutritionEstimator,
}

impl MealManager {
    pub fn new(store: Arc<dyn MealStore>, estimator: NutritionEstimator) -> Self {
        Self { store, estimator }
    }

    pub fn is_estimation_available(&self) -> bool {
        self.estimator.is_available()
    }

    pub async fn ping_store(&self) -> anyhow::Result<()> {
        self.store.ping().await
    }

    #[instrument(skip(self))]
    pub async fn create_with_estimation(&self, name: &str) -> Result<MealRecord, MealError> {
        let name = validate_name(name).map_err(MealError::Validation)?;

        if !self.estimator.is_available() {
            warn!("estimation requested but service is unavailable");
            return Err(MealError::EstimationUnavailable);
        }

        let estimate = self.estimator.estimate(&name).await.map_err(|e| {
            error!(error = %e, meal = %name, "nutrition analysis failed");
            MealError::Upstream(e)
        })?;

        // estimates outside the accepted ranges are rejected, never clamped
        if let Some((field, value)) = estimate.first_out_of_range() {
            warn!(%field, value, meal = %name, "estimate out of range");
            return Err(EstimationError::OutOfRange { field, value }.into());
        }

        let meal = self.store.create(NewMeal::new(name, estimate)).await?;
        info!(meal_id = %meal.id, name = %meal.name, "meal created with estimated nutrition");
        Ok(meal)
    }

    #[instrument(skip(self, meal), fields(name = %meal.name))]
    pub async fn create_manual(&self, meal: NewMeal) -> Result<MealRecord, MealError> {
        let meal = meal.validated().map_err(MealError::Validation)?;
        let meal = self.store.create(meal).await?;
        info!(meal_id = %meal.id, name = %meal.name, "meal created from supplied nutrition");
        Ok(meal)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<MealRecord>, MealError> {
        let meals = self.store.list_all().await?;
        info!(count = meals.len(), "retrieved meals");
        Ok(meals)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<MealRecord>, MealError> {
        let meal = self.store.get(id).await?;
        if meal.is_none() {
            warn!(meal_id = %id, "meal not found");
        }
        Ok(meal)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: Uuid,
        patch: MealPatch,
    ) -> Result<Option<MealRecord>, MealError> {
        let patch = patch.validated().map_err(MealError::Validation)?;
        if patch.is_empty() {
            debug!(meal_id = %id, "empty patch; only updated_at changes");
        }
        let meal = self.store.update(id, patch).await?;
        match &meal {
            Some(m) => info!(meal_id = %m.id, "meal updated"),
            None => warn!(meal_id = %id, "meal not found for update"),
        }
        Ok(meal)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, MealError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            info!(meal_id = %id, "meal deleted");
        } else {
            warn!(meal_id = %id, "meal not found for deletion");
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<StatsReport, MealError> {
        let meals = self.store.list_all().await?;
        let report = stats::compute(&meals);
        info!(total_meals = report.total_meals(), "calculated meal statistics");
        Ok(report)
    }
}
