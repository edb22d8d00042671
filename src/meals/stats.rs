use serde::Serialize;

use super::repo_types::MealRecord;
use crate::nutrition::Nutrient;

/// One value per nutrient, serialized as an object keyed by nutrient name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerNutrient<T> {
    pub calories: T,
    pub protein: T,
    pub fats: T,
    pub carbohydrates: T,
    pub fiber: T,
    pub sugar: T,
    pub sodium: T,
}

impl<T> PerNutrient<T> {
    fn from_fn(mut f: impl FnMut(Nutrient) -> T) -> Self {
        Self {
            calories: f(Nutrient::Calories),
            protein: f(Nutrient::Protein),
            fats: f(Nutrient::Fats),
            carbohydrates: f(Nutrient::Carbohydrates),
            fiber: f(Nutrient::Fiber),
            sugar: f(Nutrient::Sugar),
            sodium: f(Nutrient::Sodium),
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> &T {
        match nutrient {
            Nutrient::Calories => &self.calories,
            Nutrient::Protein => &self.protein,
            Nutrient::Fats => &self.fats,
            Nutrient::Carbohydrates => &self.carbohydrates,
            Nutrient::Fiber => &self.fiber,
            Nutrient::Sugar => &self.sugar,
            Nutrient::Sodium => &self.sodium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataCompleteness {
    pub meals_with: PerNutrient<usize>,
    pub completion_percentage: PerNutrient<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionInsights {
    pub high_protein_meals: usize,
    pub low_calorie_meals: usize,
    pub high_fiber_meals: usize,
    pub high_sodium_meals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealStatistics {
    pub total_meals: usize,
    pub data_completeness: DataCompleteness,
    pub totals: PerNutrient<f64>,
    pub averages_per_meal: PerNutrient<f64>,
    pub nutrition_insights: NutritionInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsReport {
    Empty { total_meals: usize, message: String },
    Computed(MealStatistics),
}

impl StatsReport {
    pub fn total_meals(&self) -> usize {
        match self {
            StatsReport::Empty { total_meals, .. } => *total_meals,
            StatsReport::Computed(s) => s.total_meals,
        }
    }
}

pub fn compute(meals: &[MealRecord]) -> StatsReport {
    let total = meals.len();
    if total == 0 {
        return StatsReport::Empty {
            total_meals: 0,
            message: "No meals in database".into(),
        };
    }

    let value = |m: &MealRecord, n: Nutrient| m.nutrients.get(n).unwrap_or(0.0);
    let count_where = |n: Nutrient, pred: fn(f64) -> bool| {
        meals.iter().filter(|m| pred(value(*m, n))).count()
    };

    let meals_with =
        PerNutrient::from_fn(|n| meals.iter().filter(|m| m.nutrients.get(n).is_some()).count());
    let completion_percentage =
        PerNutrient::from_fn(|n| round_to(*meals_with.get(n) as f64 / total as f64 * 100.0, 1));
    let raw_totals = PerNutrient::from_fn(|n| meals.iter().map(|m| value(m, n)).sum::<f64>());

    StatsReport::Computed(MealStatistics {
        total_meals: total,
        totals: PerNutrient::from_fn(|n| round_to(*raw_totals.get(n), 2)),
        averages_per_meal: PerNutrient::from_fn(|n| round_to(*raw_totals.get(n) / total as f64, 2)),
        data_completeness: DataCompleteness {
            meals_with,
            completion_percentage,
        },
        nutrition_insights: NutritionInsights {
            high_protein_meals: count_where(Nutrient::Protein, |v| v > 15.0),
            low_calorie_meals: count_where(Nutrient::Calories, |v| v < 200.0),
            high_fiber_meals: count_where(Nutrient::Fiber, |v| v > 5.0),
            high_sodium_meals: count_where(Nutrient::Sodium, |v| v > 400.0),
        },
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::Nutrients;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn record(nutrients: Nutrients) -> MealRecord {
        let now = OffsetDateTime::now_utc();
        MealRecord {
            id: Uuid::new_v4(),
            name: "meal".into(),
            nutrients,
            created_at: now,
            updated_at: now,
        }
    }

    fn calories(c: Option<f64>) -> MealRecord {
        record(Nutrients {
            calories: c,
            ..Default::default()
        })
    }

    #[test]
    fn empty_store_reports_empty_state() {
        let report = compute(&[]);
        assert_eq!(
            report,
            StatsReport::Empty {
                total_meals: 0,
                message: "No meals in database".into()
            }
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_meals"], 0);
        assert!(json.get("totals").is_none());
    }

    #[test]
    fn absent_values_count_as_zero_in_sums_only() {
        let meals = [
            calories(Some(240.0)),
            calories(Some(180.0)),
            calories(None),
            calories(Some(150.0)),
        ];
        let StatsReport::Computed(stats) = compute(&meals) else {
            panic!("expected computed stats");
        };
        assert_eq!(stats.total_meals, 4);
        assert_eq!(stats.totals.calories, 570.0);
        assert_eq!(stats.averages_per_meal.calories, 142.5);
        assert_eq!(stats.data_completeness.meals_with.calories, 3);
        assert_eq!(stats.data_completeness.completion_percentage.calories, 75.0);
        assert_eq!(stats.data_completeness.completion_percentage.protein, 0.0);
        // 180, None (as 0) and 150 are all below 200
        assert_eq!(stats.nutrition_insights.low_calorie_meals, 3);
    }

    #[test]
    fn rounding_and_insights() {
        let meals = [
            record(Nutrients {
                protein: Some(16.0),
                fiber: Some(5.5),
                sodium: Some(401.0),
                ..Default::default()
            }),
            record(Nutrients {
                protein: Some(15.0),
                fiber: Some(5.0),
                sodium: Some(400.0),
                ..Default::default()
            }),
            record(Nutrients {
                protein: Some(1.0),
                ..Default::default()
            }),
        ];
        let StatsReport::Computed(stats) = compute(&meals) else {
            panic!("expected computed stats");
        };
        assert_eq!(stats.averages_per_meal.protein, 10.67);
        assert_eq!(stats.data_completeness.completion_percentage.fiber, 66.7);
        assert_eq!(stats.nutrition_insights.high_protein_meals, 1);
        assert_eq!(stats.nutrition_insights.high_fiber_meals, 1);
        assert_eq!(stats.nutrition_insights.high_sodium_meals, 1);
        assert_eq!(stats.nutrition_insights.low_calorie_meals, 3);
    }
}
