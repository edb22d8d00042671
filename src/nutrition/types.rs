use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One of the seven tracked nutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Fats,
    Carbohydrates,
    Fiber,
    Sugar,
    Sodium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 7] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Fats,
        Nutrient::Carbohydrates,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Sodium,
    ];

    /// JSON key / column name.
    pub const fn key(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Fats => "fats",
            Nutrient::Carbohydrates => "carbohydrates",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Sodium => "sodium",
        }
    }

    /// Inclusive upper bound; the lower bound is always 0.
    pub const fn max(self) -> f64 {
        match self {
            Nutrient::Calories => 5000.0,
            Nutrient::Protein => 200.0,
            Nutrient::Fats => 200.0,
            Nutrient::Carbohydrates => 500.0,
            Nutrient::Fiber => 100.0,
            Nutrient::Sugar => 200.0,
            Nutrient::Sodium => 5000.0,
        }
    }

    pub fn in_range(self, value: f64) -> bool {
        value.is_finite() && (0.0..=self.max()).contains(&value)
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Nutrient profile of a meal. `None` means unknown, never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Nutrients {
    pub calories: Option<f64>,      // kcal
    pub protein: Option<f64>,       // g
    pub fats: Option<f64>,          // g
    pub carbohydrates: Option<f64>, // g
    pub fiber: Option<f64>,         // g
    pub sugar: Option<f64>,         // g
    pub sodium: Option<f64>,        // mg
}

/// Transient result of an estimation; merged into a new meal before storing.
pub type NutritionEstimate = Nutrients;

impl Nutrients {
    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
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

    pub fn set(&mut self, nutrient: Nutrient, value: Option<f64>) {
        let slot = match nutrient {
            Nutrient::Calories => &mut self.calories,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Fats => &mut self.fats,
            Nutrient::Carbohydrates => &mut self.carbohydrates,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Sugar => &mut self.sugar,
            Nutrient::Sodium => &mut self.sodium,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n).is_none())
    }

    /// First present value outside its bounds, if any.
    pub fn first_out_of_range(&self) -> Option<(Nutrient, f64)> {
        Nutrient::ALL
            .iter()
            .filter_map(|n| self.get(*n).map(|v| (*n, v)))
            .find(|(n, v)| !n.in_range(*v))
    }
}
