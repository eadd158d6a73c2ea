use percent_encoding::percent_decode_str;
use tracing::{Level, event, instrument};

use crate::render::{build_page_html, render_template};
use crate::store::Store;
use crate::types::{operate::Operate, question::Question};

/// Decodes a percent-encoded path segment. Segments that do not decode to
/// UTF-8 are kept as they arrived.
pub fn decode_id(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(id) => id.into_owned(),
        Err(e) => {
            event!(Level::WARN, raw = %raw, "id is not valid UTF-8 once decoded: {}", e);
            raw.to_string()
        }
    }
}

/// Picks the article for `id`.
///
/// A match on `id` or `slug` wins. Without an id the first record is used.
/// Anything else (unknown id, empty or missing collection) gets a
/// placeholder article so the page always renders.
pub fn resolve_article(records: &[Operate], id: Option<&str>) -> Operate {
    // `/operate/` carries an empty id and counts as no id at all
    let id = id.filter(|id| !id.is_empty());
    let found = match id {
        Some(id) => records.iter().find(|op| op.matches(id)),
        None => records.first(),
    };
    match found {
        Some(op) => op.clone(),
        None => {
            event!(Level::INFO, ?id, "no article found, using placeholder");
            Operate::placeholder(id)
        }
    }
}

/// Questions pointing at the article's id, slug or external id, ordered by
/// question number. Unnumbered questions keep their order at the end.
pub fn filter_questions(questions: &[Question], article: &Operate) -> Vec<Question> {
    let keys = article.keys();
    let mut selected: Vec<Question> = questions
        .iter()
        .filter(|q| q.belongs_to(&keys))
        .cloned()
        .collect();
    // stable sort: `false` orders first, so numbered questions lead
    selected.sort_by_key(|q| (q.question_number.is_none(), q.question_number));
    selected
}

#[instrument(skip(store))]
pub async fn get_operate(
    id: Option<String>,
    host: Option<String>,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = id.as_deref().map(decode_id);
    let origin = store.origin_for(host.as_deref());
    let data = store.load_page_data(origin.as_deref()).await;

    let article = resolve_article(data.operates.as_deref().unwrap_or_default(), id.as_deref());
    let questions = filter_questions(data.questions.as_deref().unwrap_or_default(), &article);
    event!(
        Level::INFO,
        article = ?article.id,
        questions = questions.len(),
        templated = data.template.is_some()
    );

    let html = match data.template {
        Some(template) => render_template(&template, &article, &questions),
        None => build_page_html(&article, &questions),
    };
    Ok(warp::reply::html(html))
}
