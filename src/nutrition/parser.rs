use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::EstimationError;
use super::types::{Nutrient, NutritionEstimate, Nutrients};

lazy_static! {
    // "calories": 250 | calories: "250" | 'calories' : 250.5
    static ref KEY_PATTERNS: Vec<(Nutrient, Regex)> = Nutrient::ALL
        .iter()
        .map(|n| {
            let pattern = format!(
                r#"(?i)["']?\b{}\b["']?\s*:\s*["']?\s*(-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)"#,
                n.key()
            );
            (*n, Regex::new(&pattern).unwrap())
        })
        .collect();
    // "12", "12.5 g", "480mg"
    static ref NUMBER_WITH_UNIT: Regex =
        Regex::new(r"^\s*(-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\s*[a-zA-Z%]*\s*$").unwrap();
}

/// Exact shape the model is asked to produce.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictEstimate {
    calories: Option<f64>,
    protein: Option<f64>,
    fats: Option<f64>,
    carbohydrates: Option<f64>,
    fiber: Option<f64>,
    sugar: Option<f64>,
    sodium: Option<f64>,
}

impl From<StrictEstimate> for Nutrients {
    fn from(s: StrictEstimate) -> Self {
        Self {
            calories: s.calories,
            protein: s.protein,
            fats: s.fats,
            carbohydrates: s.carbohydrates,
            fiber: s.fiber,
            sugar: s.sugar,
            sodium: s.sodium,
        }
    }
}

/// Turn raw model output into an estimate.
///
/// Strict decoding is tried first. When it fails the parser falls back to
/// key-by-key extraction and only reports `Parse` when nothing at all can be
/// recovered. Values are not range-checked here.
pub fn parse_estimate(raw: &str) -> Result<NutritionEstimate, EstimationError> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(EstimationError::EmptyResponse);
    }

    let strict_err = match serde_json::from_str::<StrictEstimate>(text) {
        Ok(strict) => return Ok(strict.into()),
        Err(e) => e,
    };
    debug!(error = %strict_err, "strict decode failed; trying lenient extraction");

    match parse_lenient(text) {
        Some(estimate) => {
            warn!(error = %strict_err, "estimate recovered by lenient extraction");
            Ok(estimate)
        }
        None => Err(EstimationError::Parse {
            message: strict_err.to_string(),
            raw: raw.to_string(),
        }),
    }
}

/// Drop a surrounding ```json ... ``` (or bare ```) fence.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_lenient(text: &str) -> Option<Nutrients> {
    if let Some(map) = as_object(text).or_else(|| embedded_object(text)) {
        // an object naming no nutrient at all is a refusal, not an estimate
        let names_a_nutrient = Nutrient::ALL.iter().any(|n| map.contains_key(n.key()));
        return names_a_nutrient.then(|| extract_from_object(&map));
    }
    scan_keys(text)
}

fn as_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// JSON object surrounded by prose.
fn embedded_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&text[start..=end])
}

fn extract_from_object(map: &Map<String, Value>) -> Nutrients {
    let mut out = Nutrients::default();
    for nutrient in Nutrient::ALL {
        let value = map.get(nutrient.key()).and_then(number_from);
        out.set(nutrient, value);
    }
    out
}

fn number_from(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_WITH_UNIT
            .captures(s)
            .and_then(|c| c[1].parse::<f64>().ok()),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Last resort for text that is not JSON at all (trailing commas, comments,
/// truncated output). Succeeds if at least one key yields a number.
fn scan_keys(text: &str) -> Option<Nutrients> {
    let mut out = Nutrients::default();
    for (nutrient, re) in KEY_PATTERNS.iter() {
        let value = re
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|v| v.is_finite());
        out.set(*nutrient, value);
    }
    (!out.is_empty()).then_some(out)
}
