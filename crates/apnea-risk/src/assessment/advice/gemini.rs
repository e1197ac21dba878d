use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AdviceError, TextGenerator};
use crate::config::AdviceConfig;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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

/// Client for the Gemini `generateContent` endpoint.
///
/// The API key is always supplied by configuration and sent as a header.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: &str,
        request_timeout: Duration,
    ) -> Result<Self, AdviceError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| AdviceError::Transport(err.to_string()))?;

        let model = model.trim_start_matches('/');
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
            api_key: api_key.into(),
        })
    }

    /// Build a client when an API key is configured; `Ok(None)` disables advice.
    pub fn from_config(config: &AdviceConfig) -> Result<Option<Self>, AdviceError> {
        match &config.api_key {
            Some(key) => Self::new(key.clone(), &config.base_url, &config.model, config.timeout)
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
        let request = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|index| text.is_char_boundary(*index))
                    .unwrap_or(0);
                text.truncate(cut);
            }
            return Err(AdviceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&body)
            .map_err(|err| AdviceError::MalformedResponse(err.to_string()))?;
        extract_text(parsed)
    }
}

fn map_transport_error(err: reqwest::Error) -> AdviceError {
    if err.is_timeout() {
        AdviceError::Timeout
    } else {
        AdviceError::Transport(err.to_string())
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, AdviceError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AdviceError::MalformedResponse("no candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(AdviceError::EmptyResponse);
    }
    Ok(text.to_string())
}
