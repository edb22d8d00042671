//! Nutrition estimation: free-text meal description in, nutrient profile out.

mod client;
mod error;
mod estimator;
mod parser;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::EstimationError;
pub use estimator::{EstimatorSettings, NutritionEstimator};
pub use types::{Nutrient, Nutrients};

#[cfg(test)]
pub(crate) use estimator::fakes;
