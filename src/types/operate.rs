use serde::{Deserialize, Serialize};

use super::{lenient_bool, lenient_string};

/// An article record from `/data/operate.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Operate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub external_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_published: bool,
}

impl Operate {
    /// Stand-in article rendered when nothing in the collection fits.
    pub fn placeholder(id: Option<&str>) -> Self {
        let label = id.unwrap_or("sample");
        Operate {
            id: Some(id.unwrap_or("1").to_string()),
            slug: None,
            external_id: None,
            title: Some(format!("Operate {}", label)),
            body: Some(format!(
                "これはサンプル記事です。ID={} の内容がここに表示されます。",
                label
            )),
            author: Some("system".to_string()),
            is_published: true,
        }
    }

    /// Identifiers questions may point at: id, slug and external id.
    pub fn keys(&self) -> Vec<&str> {
        [&self.id, &self.slug, &self.external_id]
            .into_iter()
            .filter_map(|k| k.as_deref())
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn matches(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id) || self.slug.as_deref() == Some(id)
    }
}
