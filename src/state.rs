use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::meals::{MealManager, MealStore, MemoryMealStore, PgMealStore};
use crate::nutrition::NutritionEstimator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub meals: Arc<MealManager>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn MealStore> = match config.database_url.as_deref() {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                tracing::info!("using postgres meal store");
                Arc::new(PgMealStore::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; meals are kept in memory only");
                Arc::new(MemoryMealStore::new())
            }
        };

        let estimator = NutritionEstimator::from_settings(&config.estimator);
        let meals = Arc::new(MealManager::new(store, estimator));
        Ok(Self { config, meals })
    }

    #[cfg(test)]
    pub fn from_parts(config: Arc<AppConfig>, meals: Arc<MealManager>) -> Self {
        Self { config, meals }
    }
}
