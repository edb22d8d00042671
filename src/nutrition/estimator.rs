use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::client::{GeminiClient, TextGenerator};
use super::error::EstimationError;
use super::parser::parse_estimate;
use super::types::NutritionEstimate;

const INSTRUCTIONS: &str = r#"You are a nutrition analysis expert. Given a meal description, provide accurate nutritional information.

Instructions:
1. Analyze the meal and estimate nutritional values per serving.
2. Return ONLY a valid JSON object with exactly this structure:
{
    "calories": <number or null>,
    "protein": <number or null>,
    "fats": <number or null>,
    "carbohydrates": <number or null>,
    "fiber": <number or null>,
    "sugar": <number or null>,
    "sodium": <number or null>
}
3. Units: calories in kcal; protein, fats, carbohydrates, fiber and sugar in grams; sodium in milligrams.
4. If you cannot determine a nutrient, use null.
5. Do not include explanations or any text outside the JSON object."#;

/// Gemini settings the estimator is built from.
#[derive(Debug, Clone)]
pub struct EstimatorSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Nutrition estimation adapter.
///
/// Availability is fixed at construction: without a usable credential the
/// estimator stays unavailable for the lifetime of the process.
#[derive(Clone)]
pub struct NutritionEstimator {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl NutritionEstimator {
    pub fn from_settings(settings: &EstimatorSettings) -> Self {
        let Some(key) = settings.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
        else {
            warn!("GEMINI_API_KEY not set; nutrition estimation unavailable");
            return Self::unavailable();
        };

        match GeminiClient::new(
            key,
            settings.model.clone(),
            settings.base_url.clone(),
            settings.timeout,
        ) {
            Ok(client) => {
                info!(model = %settings.model, "nutrition estimation enabled");
                Self::with_generator(Arc::new(client))
            }
            Err(e) => {
                warn!(error = %e, "failed to build gemini client; nutrition estimation unavailable");
                Self::unavailable()
            }
        }
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn unavailable() -> Self {
        Self { generator: None }
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_some()
    }

    /// One external call, no retries. Values are returned unchecked.
    #[instrument(skip(self))]
    pub async fn estimate(&self, description: &str) -> Result<NutritionEstimate, EstimationError> {
        let generator = self.generator.as_ref().ok_or(EstimationError::Unavailable)?;
        let raw = generator.generate(&build_prompt(description)).await?;
        tracing::debug!(raw = %raw, "raw estimation response");
        parse_estimate(&raw)
    }
}

fn build_prompt(description: &str) -> String {
    format!("{INSTRUCTIONS}\n\nMeal: {}", description.trim())
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Replays canned replies and counts calls.
    pub struct ScriptedGenerator {
        reply: Box<dyn Fn(&str) -> Result<String, EstimationError> + Send + Sync>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        pub fn text(body: &str) -> Self {
            let body = body.to_string();
            Self::with(move |_| Ok(body.clone()))
        }

        pub fn with(
            f: impl Fn(&str) -> Result<String, EstimationError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                reply: Box::new(f),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, EstimationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)(prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::ScriptedGenerator;
    use super::*;

    fn settings(key: Option<&str>) -> EstimatorSettings {
        EstimatorSettings {
            api_key: key.map(str::to_string),
            model: "gemini-1.5-flash".into(),
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn missing_or_blank_key_is_unavailable() {
        assert!(!NutritionEstimator::from_settings(&settings(None)).is_available());
        assert!(!NutritionEstimator::from_settings(&settings(Some("  "))).is_available());
        assert!(NutritionEstimator::from_settings(&settings(Some("abc"))).is_available());
    }

    #[tokio::test]
    async fn unavailable_estimator_never_calls_out() {
        let err = NutritionEstimator::unavailable()
            .estimate("toast")
            .await
            .unwrap_err();
        assert!(matches!(err, EstimationError::Unavailable));
    }

    #[tokio::test]
    async fn prompt_carries_instructions_and_meal() {
        let gen = Arc::new(ScriptedGenerator::with(|prompt| {
            assert!(prompt.starts_with("You are a nutrition analysis expert"));
            assert!(prompt.ends_with("Meal: 1 Bowl Dal"));
            Ok(r#"{"calories": 180, "protein": 12}"#.into())
        }));
        let est = NutritionEstimator::with_generator(gen.clone())
            .estimate("  1 Bowl Dal ")
            .await
            .unwrap();
        assert_eq!(est.calories, Some(180.0));
        assert_eq!(gen.calls(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let gen = Arc::new(ScriptedGenerator::with(|_| {
            Err(EstimationError::Transport("connection reset".into()))
        }));
        let err = NutritionEstimator::with_generator(gen.clone())
            .estimate("toast")
            .await
            .unwrap_err();
        assert!(matches!(err, EstimationError::Transport(_)));
        assert_eq!(gen.calls(), 1);
    }

    #[tokio::test]
    async fn unparseable_reply_is_parse_error() {
        let gen = Arc::new(ScriptedGenerator::text("no idea, sorry"));
        let err = NutritionEstimator::with_generator(gen)
            .estimate("toast")
            .await
            .unwrap_err();
        assert!(matches!(err, EstimationError::Parse { .. }));
    }
}
