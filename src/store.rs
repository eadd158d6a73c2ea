use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Level, event, instrument};

use crate::types::{operate::Operate, question::Question};

use handle_errors::{Error, UpstreamError};

pub const OPERATES_PATH: &str = "/data/operate.json";
pub const QUESTIONS_PATH: &str = "/data/operate_questions.json";
pub const ANSWERS_PATH: &str = "/data/answers.json";
pub const TEMPLATE_PATH: &str = "/templates/operate.html";

/// Read-only access to the site's static documents, fetched over HTTP from
/// the request origin (or a configured one).
#[derive(Debug, Clone)]
pub struct Store {
    client: reqwest::Client,
    asset_origin: Option<String>,
}

/// Everything the operate page needs. A field is `None` when its fetch failed.
#[derive(Debug, Default)]
pub struct PageData {
    pub operates: Option<Vec<Operate>>,
    pub questions: Option<Vec<Question>>,
    pub template: Option<String>,
}

impl Store {
    pub fn new(client: reqwest::Client, asset_origin: Option<String>) -> Self {
        Store {
            client,
            asset_origin,
        }
    }

    /// The configured origin wins over the one the request arrived on.
    pub fn origin_for(&self, host: Option<&str>) -> Option<String> {
        match (&self.asset_origin, host) {
            (Some(origin), _) => Some(origin.clone()),
            (None, Some(host)) if !host.is_empty() => Some(format!("http://{}", host)),
            _ => None,
        }
    }

    #[instrument(skip(self))]
    pub async fn load_page_data(&self, origin: Option<&str>) -> PageData {
        let Some(origin) = origin else {
            event!(Level::WARN, "no asset origin known, rendering fallback page");
            return PageData::default();
        };

        // each fetch degrades on its own, one failure never cancels the rest
        let (operates, questions, template) = tokio::join!(
            self.get_operates(origin),
            self.get_questions(origin),
            self.get_template(origin),
        );

        PageData {
            operates,
            questions,
            template,
        }
    }

    pub async fn get_operates(&self, origin: &str) -> Option<Vec<Operate>> {
        let doc = self.fetch_json(origin, OPERATES_PATH).await.ok()?;
        Some(records(doc, "id"))
    }

    pub async fn get_questions(&self, origin: &str) -> Option<Vec<Question>> {
        let doc = self.fetch_json(origin, QUESTIONS_PATH).await.ok()?;
        Some(records(doc, "operate_id"))
    }

    pub async fn get_template(&self, origin: &str) -> Option<String> {
        self.fetch_text(origin, TEMPLATE_PATH).await.ok()
    }

    /// Previously received answers. Anything but a JSON array counts as none.
    pub async fn get_answers(&self, origin: Option<&str>) -> Vec<Value> {
        let Some(origin) = origin else {
            return Vec::new();
        };
        match self.fetch_json(origin, ANSWERS_PATH).await {
            Ok(Value::Array(answers)) => answers,
            _ => Vec::new(),
        }
    }

    async fn fetch_text(&self, origin: &str, path: &str) -> Result<String, Error> {
        let res = self
            .client
            .get(format!("{}{}", origin, path))
            .send()
            .await
            .map_err(|e| degraded(path, Error::ReqwestAPIError(e)))?;

        // any non-2xx counts as a missing document
        if !res.status().is_success() {
            let err = UpstreamError {
                status: res.status().as_u16(),
                message: path.to_string(),
            };
            return Err(degraded(path, Error::AssetError(err)));
        }

        res.text()
            .await
            .map_err(|e| degraded(path, Error::ReqwestAPIError(e)))
    }

    async fn fetch_json(&self, origin: &str, path: &str) -> Result<Value, Error> {
        let text = self.fetch_text(origin, path).await?;
        serde_json::from_str(&text)
            .map_err(|e| degraded(path, Error::InvalidBody(format!("{}: {}", path, e))))
    }
}

fn degraded(path: &str, error: Error) -> Error {
    event!(Level::WARN, path = %path, "cannot load document: {}", error);
    error
}

/// Flattens an array or keyed-map document into a sequence of JSON records.
///
/// Keyed maps keep document order. When a record lacks `key_field` the map
/// key is written into it, so `{"3": {...}}` becomes a record with id `3`.
/// A map value may also be an array of records sharing that key.
pub fn normalize_records(doc: Value, key_field: &str) -> Vec<Value> {
    match doc {
        // arrays are taken as they are, minus anything that is not a record
        Value::Array(items) => items.into_iter().filter(Value::is_object).collect(),
        Value::Object(map) => map
            .into_iter()
            .flat_map(|(key, value)| {
                // `{"1": [q1, q2]}` groups several records under one key
                let items = match value {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                items.into_iter().filter_map(move |item| match item {
                    Value::Object(mut record) => {
                        // an explicit key inside the record beats the map key
                        let missing = record.get(key_field).is_none_or(Value::is_null);
                        if missing {
                            record.insert(key_field.to_string(), Value::String(key.clone()));
                        }
                        Some(Value::Object(record))
                    }
                    _ => None,
                })
            })
            .collect(),
        // scalars and null carry no records
        _ => Vec::new(),
    }
}

fn records<T: DeserializeOwned>(doc: Value, key_field: &str) -> Vec<T> {
    normalize_records(doc, key_field)
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<T>(record) {
            Ok(record) => Some(record),
            Err(e) => {
                event!(Level::WARN, "skipping malformed record: {}", e);
                None
            }
        })
        .collect()
}
