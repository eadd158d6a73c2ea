use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PromptResponse {
    #[serde(rename = "responseText")]
    pub response_text: String,
}

/// Pulls a non-empty `prompt` string out of a request body.
/// Unparseable bodies are treated like an empty object.
pub fn extract_prompt(body: &[u8]) -> Option<String> {
    let value = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
    match value.get("prompt") {
        Some(Value::String(prompt)) if !prompt.is_empty() => Some(prompt.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_must_be_a_non_empty_string() {
        assert_eq!(extract_prompt(br#"{"prompt":"hi"}"#), Some("hi".to_string()));
        assert_eq!(extract_prompt(br#"{"prompt":""}"#), None);
        assert_eq!(extract_prompt(br#"{"prompt":42}"#), None);
        assert_eq!(extract_prompt(br#"{}"#), None);
        assert_eq!(extract_prompt(b"not json"), None);
    }
}
