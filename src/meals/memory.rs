use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::MealStore;
use super::repo_types::{MealPatch, MealRecord, NewMeal};

/// Process-local store, used when no database is configured.
/// Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryMealStore {
    meals: RwLock<Vec<MealRecord>>,
}

impl MemoryMealStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MealStore for MemoryMealStore {
    async fn create(&self, meal: NewMeal) -> anyhow::Result<MealRecord> {
        let mut meals = self.meals.write().await;
        let id = meal.id.unwrap_or_else(Uuid::new_v4);
        anyhow::ensure!(
            meals.iter().all(|m| m.id != id),
            "meal {id} already exists"
        );
        let now = OffsetDateTime::now_utc();
        let record = MealRecord {
            id,
            name: meal.name,
            nutrients: meal.nutrients,
            created_at: now,
            updated_at: now,
        };
        meals.push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<MealRecord>> {
        let mut out: Vec<MealRecord> = self.meals.read().await.iter().rev().cloned().collect();
        // stable: equal timestamps keep newest-inserted first
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MealRecord>> {
        Ok(self.meals.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: MealPatch) -> anyhow::Result<Option<MealRecord>> {
        let mut meals = self.meals.write().await;
        let Some(record) = meals.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        patch.apply_to(record);
        record.updated_at = OffsetDateTime::now_utc().max(record.created_at);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut meals = self.meals.write().await;
        let before = meals.len();
        meals.retain(|m| m.id != id);
        Ok(meals.len() < before)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::Nutrients;

    fn meal(name: &str, calories: Option<f64>) -> NewMeal {
        NewMeal::new(
            name,
            Nutrients {
                calories,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn create_assigns_id_and_equal_timestamps() {
        let store = MemoryMealStore::new();
        let rec = store.create(meal("Toast", Some(90.0))).await.unwrap();
        assert_eq!(rec.created_at, rec.updated_at);
        assert_eq!(store.get(rec.id).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn list_all_is_newest_first() {
        let store = MemoryMealStore::new();
        for name in ["a", "b", "c"] {
            store.create(meal(name, None)).await.unwrap();
        }
        let names: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn update_overwrites_only_supplied_fields() {
        let store = MemoryMealStore::new();
        let rec = store
            .create(NewMeal::new(
                "Dal",
                Nutrients {
                    calories: Some(180.0),
                    protein: Some(12.0),
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        let patch = MealPatch {
            calories: Some(None),
            fiber: Some(Some(6.0)),
            ..Default::default()
        };
        let updated = store.update(rec.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "Dal");
        assert_eq!(updated.nutrients.calories, None);
        assert_eq!(updated.nutrients.protein, Some(12.0));
        assert_eq!(updated.nutrients.fiber, Some(6.0));
        assert_eq!(updated.created_at, rec.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn missing_ids_are_absent_not_errors() {
        let store = MemoryMealStore::new();
        let id = Uuid::new_v4();
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.update(id, MealPatch::default()).await.unwrap().is_none());
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryMealStore::new();
        let rec = store.create(meal("Upma", None)).await.unwrap();
        assert!(store.delete(rec.id).await.unwrap());
        assert!(store.get(rec.id).await.unwrap().is_none());
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
