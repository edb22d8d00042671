use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{MealPatch, MealRecord, NewMeal};
use crate::nutrition::Nutrient;

const MEAL_COLUMNS: &str = "id, name, calories, protein, fats, carbohydrates, fiber, sugar, sodium, created_at, updated_at";

/// Persistence contract for meal records.
///
/// The manager only sees this trait; `PgMealStore` and `MemoryMealStore`
/// are interchangeable, and a document-store backing would slot in the same
/// way.
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn create(&self, meal: NewMeal) -> anyhow::Result<MealRecord>;
    /// Newest first.
    async fn list_all(&self) -> anyhow::Result<Vec<MealRecord>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MealRecord>>;
    async fn update(&self, id: Uuid, patch: MealPatch) -> anyhow::Result<Option<MealRecord>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgMealStore {
    db: PgPool,
}

impl PgMealStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn create(&self, meal: NewMeal) -> anyhow::Result<MealRecord> {
        let now = OffsetDateTime::now_utc();
        let n = meal.nutrients;
        let row = sqlx::query_as::<_, MealRecord>(&format!(
            r#"
            INSERT INTO meals (id, name, calories, protein, fats, carbohydrates,
                               fiber, sugar, sodium, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal.id.unwrap_or_else(Uuid::new_v4))
        .bind(&meal.name)
        .bind(n.calories)
        .bind(n.protein)
        .bind(n.fats)
        .bind(n.carbohydrates)
        .bind(n.fiber)
        .bind(n.sugar)
        .bind(n.sodium)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .context("insert meal")?;
        Ok(row)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRecord>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list meals")?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MealRecord>> {
        let row = sqlx::query_as::<_, MealRecord>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get meal")?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: MealPatch) -> anyhow::Result<Option<MealRecord>> {
        let mut qb = update_query(id, &patch, OffsetDateTime::now_utc());
        let row = qb
            .build_query_as::<MealRecord>()
            .fetch_optional(&self.db)
            .await
            .context("update meal")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM meals WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete meal")?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .context("ping database")?;
        Ok(())
    }
}

/// Single statement, so the patch lands whole or not at all.
fn update_query<'a>(id: Uuid, patch: &MealPatch, now: OffsetDateTime) -> QueryBuilder<'a, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE meals SET ");
    if let Some(name) = &patch.name {
        qb.push("name = ").push_bind(name.clone()).push(", ");
    }
    for nutrient in Nutrient::ALL {
        if let Some(value) = patch.nutrient(nutrient) {
            qb.push(nutrient.key()).push(" = ").push_bind(value).push(", ");
        }
    }
    qb.push("updated_at = GREATEST(created_at, ")
        .push_bind(now)
        .push(") WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(MEAL_COLUMNS);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(patch: &MealPatch) -> String {
        update_query(Uuid::new_v4(), patch, OffsetDateTime::now_utc())
            .sql()
            .to_string()
    }

    #[test]
    fn empty_patch_only_touches_updated_at() {
        let sql = sql_for(&MealPatch::default());
        assert_eq!(
            sql,
            format!(
                "UPDATE meals SET updated_at = GREATEST(created_at, $1) WHERE id = $2 RETURNING {MEAL_COLUMNS}"
            )
        );
    }

    #[test]
    fn name_only_patch_sets_name_once() {
        let patch = MealPatch {
            name: Some("Dal".into()),
            ..Default::default()
        };
        let sql = sql_for(&patch);
        assert!(sql.starts_with("UPDATE meals SET name = $1, updated_at = GREATEST(created_at, $2)"));
        assert!(sql.contains("WHERE id = $3 RETURNING"));
        assert!(!sql.contains("calories ="));
    }

    #[test]
    fn cleared_and_set_nutrients_share_one_statement() {
        let patch = MealPatch {
            calories: Some(None),
            fiber: Some(Some(5.0)),
            ..Default::default()
        };
        let sql = sql_for(&patch);
        assert!(sql.starts_with("UPDATE meals SET calories = $1, fiber = $2, updated_at"));
        assert!(sql.contains("WHERE id = $4 RETURNING"));
        assert!(!sql.contains("protein ="));
        assert_eq!(sql.matches("UPDATE").count(), 1);
    }
}
