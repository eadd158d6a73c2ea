use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnswerReceipt {
    pub message: String,
    pub entry: Value,
    pub all: Vec<Value>,
}

/// Stamps a submission with an id and receive time. Submitted fields win
/// over the generated ones.
pub fn new_entry(submission: Map<String, Value>) -> Value {
    let now = Utc::now();
    let mut entry = Map::new();
    entry.insert("id".to_string(), Value::from(now.timestamp_millis()));
    entry.insert(
        "received_at".to_string(),
        Value::from(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    entry.extend(submission);
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_fields_override_generated_ones() {
        let submission = json!({"id": "mine", "answer": "42"});
        let entry = new_entry(submission.as_object().unwrap().clone());
        assert_eq!(entry["id"], "mine");
        assert_eq!(entry["answer"], "42");
        assert!(entry["received_at"].as_str().unwrap().ends_with('Z'));
    }
}
