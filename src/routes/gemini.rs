use tracing::{Level, event, instrument};
use warp::hyper::body::Bytes;

use crate::gemini::Gemini;
use crate::types::prompt::{PromptResponse, extract_prompt};

#[instrument(skip(gemini, body))]
pub async fn generate(gemini: Gemini, body: Bytes) -> Result<impl warp::Reply, warp::Rejection> {
    let prompt = match extract_prompt(&body) {
        Some(prompt) => prompt,
        None => return Err(warp::reject::custom(handle_errors::Error::MissingPrompt)),
    };
    event!(Level::INFO, prompt_len = prompt.len(), local = gemini.is_local());

    match gemini.generate_content(&prompt).await {
        Ok(response_text) => Ok(warp::reply::json(&PromptResponse { response_text })),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
