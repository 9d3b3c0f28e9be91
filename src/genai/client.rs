//! Gemini `generateContent` client
//!
//! Sends one fixed prompt per place and parses the structured answer.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value, json};

use super::models::{AnalysisResult, GenerateContentResponse, Source};
use crate::config::GenAiConfig;
use crate::error::AppError;
use crate::metrics::{GENAI_REQUEST_DURATION_SECONDS, GENAI_REQUESTS_TOTAL};

/// Client for the place-narrative analysis
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Arc<reqwest::Client>,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create new client from configuration
    pub fn new(http_client: Arc<reqwest::Client>, config: &GenAiConfig) -> Self {
        Self {
            http_client,
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Analyze how `place_name` is narrated across platforms
    ///
    /// # Errors
    /// - `AppError::Misconfigured` if no API key is configured
    /// - `AppError::HttpClient` if the provider is unreachable
    /// - `AppError::Upstream` if the provider answers with an error or
    ///   with text that is not a valid report
    pub async fn analyze_place(&self, place_name: &str) -> Result<AnalysisResult, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("genai.api_key is not configured");
            AppError::Misconfigured
        })?;

        let started = Instant::now();
        let result = self.generate(api_key, place_name).await;
        GENAI_REQUEST_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        let status = if result.is_ok() { "success" } else { "failure" };
        GENAI_REQUESTS_TOTAL.with_label_values(&[status]).inc();

        match &result {
            Ok(report) => tracing::info!(
                place = %place_name,
                platforms = report.platforms.len(),
                sources = report.sources.len(),
                "Analysis completed"
            ),
            Err(error) => tracing::warn!(place = %place_name, %error, "Analysis failed"),
        }

        result
    }

    async fn generate(&self, api_key: &str, place_name: &str) -> Result<AnalysisResult, AppError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&build_request_body(place_name))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Gemini API returned {}: {}",
                status,
                upstream_error_message(&body)
            )));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Gemini response: {e}")))?;

        parse_analysis(&response)
    }
}

/// Prompt asking for the four-platform comparison
pub(crate) fn build_prompt(place_name: &str) -> String {
    format!(
        r#"Analyze how the place "{place_name}" is represented across four digital platforms:
1. Google Maps reviews (utility, friction, complaints, accessibility).
2. Airbnb neighborhood descriptions (curated lifestyle, safety, "local" charm).
3. Event listings (e.g., Eventbrite, RA - temporal community, niche interests).
4. Social media captions (Instagram/TikTok - aestheticized, performative).

Identify:
- Overlaps in narratives.
- Contradictions or tensions.
- Which publics are foregrounded or marginalized.
- Whether the place appears more open, controlled, or contested on each platform.

Conclude with an assessment of its publicness:
- "Hybrid": Seamless blend of digital and physical norms.
- "Agonistic": A site of productive conflict and visible diversity.
- "Homogenized": Uniformly commercialized or flattened narrative.

Ensure you use Google Search grounding to find real, specific details about current reviews, listings, and descriptions for {place_name}."#
    )
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// Structured-output schema for `AnalysisResult` (without `sources`)
pub(crate) fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "placeName": { "type": "STRING" },
            "platforms": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "platform": { "type": "STRING" },
                        "narrativeSummary": { "type": "STRING" },
                        "tone": { "type": "STRING" },
                        "keyKeywords": string_array(),
                        "publicNature": {
                            "type": "STRING",
                            "enum": ["Open", "Controlled", "Contested"]
                        }
                    },
                    "required": ["platform", "narrativeSummary", "tone", "keyKeywords", "publicNature"]
                }
            },
            "overlaps": string_array(),
            "tensions": string_array(),
            "publics": {
                "type": "OBJECT",
                "properties": {
                    "foregrounded": string_array(),
                    "marginalized": string_array()
                },
                "required": ["foregrounded", "marginalized"]
            },
            "conclusion": {
                "type": "OBJECT",
                "properties": {
                    "type": { "type": "STRING" },
                    "assessment": { "type": "STRING" }
                },
                "required": ["type", "assessment"]
            }
        },
        "required": ["placeName", "platforms", "overlaps", "tensions", "publics", "conclusion"]
    })
}

pub(crate) fn build_request_body(place_name: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": build_prompt(place_name) }]
        }],
        "tools": [{ "googleSearch": {} }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

/// Turn the first candidate into a report with grounding sources
pub(crate) fn parse_analysis(response: &GenerateContentResponse) -> Result<AnalysisResult, AppError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| AppError::Upstream("Gemini returned no candidates".to_string()))?;

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(AppError::Upstream("Gemini returned an empty answer".to_string()));
    }

    let mut report: AnalysisResult = serde_json::from_str(&text)
        .map_err(|e| AppError::Upstream(format!("Gemini answer is not a valid report: {e}")))?;

    report.sources = candidate
        .grounding_metadata
        .iter()
        .flat_map(|metadata| metadata.grounding_chunks.iter())
        .map(Source::from)
        .collect();

    Ok(report)
}

/// Best-effort `error.message` from a provider error body
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| "no error message".to_string())
}
