use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, EndpointCandidate, GenerationParams};
use crate::error::ForwardError;
use crate::providers::http_errors::classify_request_error;

const LIST_MODELS_VERSION: &str = "v1beta";
const UNREADABLE_BODY: &str = "<failed to read response body>";

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

impl Content {
    fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

impl GenerateContentRequest {
    /// The query is the only content turn; no history is sent.
    pub fn new(system_instruction: &str, query: &str, params: GenerationParams) -> Self {
        Self {
            system_instruction: Content::text(system_instruction),
            contents: vec![Content::text(query)],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

fn base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Endpoint URL without the `key` query parameter; safe to log.
pub fn generate_content_url(base_url: &str, candidate: &EndpointCandidate) -> String {
    format!(
        "{}/{}/models/{}:generateContent",
        base(base_url),
        candidate.api_version,
        candidate.model
    )
}

fn list_models_url(base_url: &str) -> String {
    format!("{}/{}/models", base(base_url), LIST_MODELS_VERSION)
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| body.to_string())
}

/// `Ok(None)` means the model answered with zero candidates.
fn first_candidate_text(body: &str) -> Result<Option<String>, ForwardError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| ForwardError::MalformedResponse(err.to_string()))?;

    let Some(first) = parsed.candidates.into_iter().next() else {
        return Ok(None);
    };

    first
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(Some)
        .ok_or_else(|| {
            ForwardError::MalformedResponse("first candidate has no text part".to_string())
        })
}

async fn read_body(
    response: reqwest::Response,
    api_url: &str,
    timeout_secs: u64,
) -> Result<String, ForwardError> {
    response
        .text()
        .await
        .map_err(|err| classify_request_error(err, api_url, timeout_secs))
}

async fn status_error(
    response: reqwest::Response,
    api_url: &str,
    timeout_secs: u64,
) -> ForwardError {
    let status = response.status().as_u16();
    let raw_body = match read_body(response, api_url, timeout_secs).await {
        Ok(body) => body,
        Err(err) => {
            warn!(
                api_url = %api_url,
                status,
                error = %err,
                "failed to read error response body"
            );
            return ForwardError::Status {
                status,
                message: UNREADABLE_BODY.to_string(),
                raw_body: String::new(),
            };
        }
    };
    warn!(
        api_url = %api_url,
        status,
        response_body_len = raw_body.len(),
        "model API returned non-success status"
    );
    ForwardError::Status {
        status,
        message: error_message(&raw_body),
        raw_body,
    }
}

/// Sends one `generateContent` call to `candidate`.
pub async fn generate_content(
    client: &Client,
    cfg: &Config,
    candidate: &EndpointCandidate,
    api_key: &str,
    request: &GenerateContentRequest,
) -> Result<Option<String>, ForwardError> {
    let api_url = generate_content_url(&cfg.base_url, candidate);
    debug!(
        api_url = %api_url,
        model = %candidate.model,
        timeout_secs = cfg.model_timeout_secs,
        "sending generateContent request"
    );

    let response = client
        .post(&api_url)
        .query(&[("key", api_key)])
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .json(request)
        .send()
        .await
        .map_err(|err| {
            let err = classify_request_error(err, &api_url, cfg.model_timeout_secs);
            warn!(api_url = %api_url, error = %err, "generateContent request failed");
            err
        })?;

    if !response.status().is_success() {
        return Err(status_error(response, &api_url, cfg.model_timeout_secs).await);
    }

    let body = read_body(response, &api_url, cfg.model_timeout_secs).await?;
    let text = first_candidate_text(&body)?;
    debug!(
        model = %candidate.model,
        response_len = text.as_ref().map_or(0, String::len),
        "received generateContent response"
    );
    Ok(text)
}

/// Lists every model visible to `api_key`, following page tokens. Stops
/// early if the API hands back a token it already returned.
pub async fn list_models(
    client: &Client,
    cfg: &Config,
    api_key: &str,
) -> Result<Vec<ModelInfo>, ForwardError> {
    let api_url = list_models_url(&cfg.base_url);
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    loop {
        let mut builder = client
            .get(&api_url)
            .query(&[("key", api_key)])
            .timeout(Duration::from_secs(cfg.model_timeout_secs));
        if let Some(token) = &page_token {
            builder = builder.query(&[("pageToken", token.as_str())]);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| classify_request_error(err, &api_url, cfg.model_timeout_secs))?;
        if !response.status().is_success() {
            return Err(status_error(response, &api_url, cfg.model_timeout_secs).await);
        }

        let body = read_body(response, &api_url, cfg.model_timeout_secs).await?;
        let page: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|err| ForwardError::MalformedResponse(err.to_string()))?;
        models.extend(page.models);

        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) if !seen_tokens.insert(token.clone()) => {
                warn!(
                    api_url = %api_url,
                    model_count = models.len(),
                    "model listing repeated a page token; stopping"
                );
                break;
            }
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    debug!(model_count = models.len(), "listed models");
    Ok(models)
}
