use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::{Nutrient, Nutrients};

pub const NAME_MAX_CHARS: usize = 200;

/// Meal row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub nutrients: Nutrients,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields for a new meal. The store assigns `id` when it is `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMeal {
    #[serde(skip)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

impl NewMeal {
    pub fn new(name: impl Into<String>, nutrients: Nutrients) -> Self {
        Self {
            id: None,
            name: name.into(),
            nutrients,
        }
    }

    /// Trimmed copy if the name and every present nutrient are acceptable.
    pub fn validated(mut self) -> Result<Self, String> {
        self.name = validate_name(&self.name)?;
        check_nutrients(&self.nutrients)?;
        Ok(self)
    }
}

/// Partial update. Outer `None` leaves a field alone; for nutrients
/// `Some(None)` clears the value back to unknown.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MealPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub calories: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub protein: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fats: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub carbohydrates: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fiber: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sugar: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sodium: Option<Option<f64>>,
}

// Present-but-null must stay distinguishable from absent.
fn double_option<'de, D>(de: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(de).map(Some)
}

impl MealPatch {
    pub fn nutrient(&self, nutrient: Nutrient) -> Option<Option<f64>> {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fats => self.fats,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Sodium => self.sodium,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && Nutrient::ALL.iter().all(|n| self.nutrient(*n).is_none())
    }

    /// Whole patch is checked up front so it applies entirely or not at all.
    pub fn validated(mut self) -> Result<Self, String> {
        if let Some(name) = self.name.take() {
            self.name = Some(validate_name(&name)?);
        }
        for nutrient in Nutrient::ALL {
            if let Some(Some(value)) = self.nutrient(nutrient) {
                check_value(nutrient, value)?;
            }
        }
        Ok(self)
    }

    /// Overwrite only the supplied fields of `record`.
    pub fn apply_to(&self, record: &mut MealRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        for nutrient in Nutrient::ALL {
            if let Some(value) = self.nutrient(nutrient) {
                record.nutrients.set(nutrient, value);
            }
        }
    }
}

pub fn validate_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(format!("name must be at most {NAME_MAX_CHARS} characters"));
    }
    Ok(name.to_string())
}

fn check_value(nutrient: Nutrient, value: f64) -> Result<(), String> {
    if nutrient.in_range(value) {
        Ok(())
    } else {
        Err(format!(
            "{nutrient} must be between 0 and {}, got {value}",
            nutrient.max()
        ))
    }
}

pub fn check_nutrients(nutrients: &Nutrients) -> Result<(), String> {
    match nutrients.first_out_of_range() {
        Some((nutrient, value)) => check_value(nutrient, value),
        None => Ok(()),
    }
}
