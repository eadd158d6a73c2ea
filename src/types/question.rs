use serde::{Deserialize, Serialize};

use super::{lenient_number, lenient_string};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Question {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub operate_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub operate_external_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub question_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer_template: Option<String>,
}

impl Question {
    pub fn belongs_to(&self, keys: &[&str]) -> bool {
        [&self.operate_id, &self.operate_external_id]
            .into_iter()
            .filter_map(|k| k.as_deref())
            .any(|k| keys.contains(&k))
    }
}
