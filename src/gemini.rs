use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Level, event, instrument};

use crate::config::Config;

pub const LOCAL_MODE_PREFIX: &str = "（ローカルモード）受け取ったプロンプト: ";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.is_empty())
    }
}

/// Client for the `generateContent` call. Without an API key it answers
/// locally instead.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Gemini")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("local", &self.is_local())
            .finish()
    }
}

impl Gemini {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Gemini {
            client,
            api_key: config.gemini_api_key.clone(),
            endpoint: config.gemini_endpoint.clone(),
            model: config.gemini_model.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.api_key.is_none()
    }

    #[instrument(skip(prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate_content(&self, prompt: &str) -> Result<String, handle_errors::Error> {
        let Some(api_key) = &self.api_key else {
            event!(Level::INFO, "no API key configured, echoing prompt");
            return Ok(format!("{}{}", LOCAL_MODE_PREFIX, prompt));
        };

        let res = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.endpoint, self.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .map_err(handle_errors::Error::ReqwestAPIError)?;

        // upstream text is passed on so the caller sees why it failed
        if !res.status().is_success() {
            let err = transform_error(res).await;
            return Err(handle_errors::Error::UpstreamError(err));
        }

        // a 2xx without any candidate text is still a failure
        match res.json::<GenerateContentResponse>().await {
            Ok(body) => body
                .into_text()
                .ok_or(handle_errors::Error::EmptyCompletion),
            Err(e) => Err(handle_errors::Error::ReqwestAPIError(e)),
        }
    }
}

async fn transform_error(res: reqwest::Response) -> handle_errors::UpstreamError {
    let status = res.status().as_u16();
    let message = match res.text().await {
        Ok(text) => text,
        Err(e) => e.to_string(),
    };
    handle_errors::UpstreamError { status, message }
}
