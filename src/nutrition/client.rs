use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::error::EstimationError;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Single-shot text completion: prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, EstimationError>;
}

// --- Gemini wire types ---

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Google Generative Language API client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EstimationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn extract_text(body: GenerateResponse) -> Result<String, EstimationError> {
        if let Some(err) = body.error {
            return Err(EstimationError::Transport(err.message));
        }
        let text: String = body
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(EstimationError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, EstimationError> {
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map_or(body, |e| e.message);
            error!(%status, %message, "gemini api error");
            return Err(EstimationError::Transport(format!(
                "gemini api error ({status}): {message}"
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "undecodable gemini response");
            EstimationError::Transport(format!("undecodable gemini response: {e}"))
        })?;
        debug!("gemini response received");
        Self::extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let body = response(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"calories\":"},{"text":" 120}"}]}},
                              {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        );
        assert_eq!(GeminiClient::extract_text(body).unwrap(), "{\"calories\": 120}");
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        let body = response(r#"{"candidates":[]}"#);
        assert!(matches!(
            GeminiClient::extract_text(body),
            Err(EstimationError::EmptyResponse)
        ));
        let body = response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert!(matches!(
            GeminiClient::extract_text(body),
            Err(EstimationError::EmptyResponse)
        ));
    }

    #[test]
    fn embedded_error_is_transport() {
        let body = response(r#"{"error":{"message":"quota exceeded","code":429}}"#);
        match GeminiClient::extract_text(body) {
            Err(EstimationError::Transport(msg)) => assert_eq!(msg, "quota exceeded"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn url_has_no_double_slash() {
        let client = GeminiClient::new(
            "k",
            DEFAULT_MODEL,
            "http://localhost:9/v1beta/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.url(),
            "http://localhost:9/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let client = GeminiClient::new(
            "k",
            DEFAULT_MODEL,
            "http://127.0.0.1:9",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.generate("Meal: toast").await.unwrap_err();
        assert!(matches!(err, EstimationError::Transport(_)));
    }
}
