use serde_json::Value;
use tracing::{Level, event, instrument};
use warp::http::{Method, StatusCode};
use warp::hyper::body::Bytes;

use crate::store::Store;
use crate::types::answer::{AnswerReceipt, new_entry};

/// Echoes a submitted answer next to the ones already published in
/// `/data/answers.json`. Nothing is written anywhere.
#[instrument(skip(store, body))]
pub async fn add_answer(
    host: Option<String>,
    store: Store,
    body: Bytes,
) -> Result<impl warp::Reply, warp::Rejection> {
    let submission = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            return Err(warp::reject::custom(handle_errors::Error::InvalidBody(
                "answer submission must be a JSON object".to_string(),
            )));
        }
        Err(e) => {
            return Err(warp::reject::custom(handle_errors::Error::InvalidBody(
                e.to_string(),
            )));
        }
    };

    let origin = store.origin_for(host.as_deref());
    let mut all = store.get_answers(origin.as_deref()).await;
    let entry = new_entry(submission);
    all.push(entry.clone());
    event!(Level::INFO, existing = all.len() - 1, "answer received");

    Ok(warp::reply::with_status(
        warp::reply::json(&AnswerReceipt {
            message: "received".to_string(),
            entry,
            all,
        }),
        StatusCode::CREATED,
    ))
}

/// Answers every method but POST on `/api/answers` with 405.
pub async fn reject_method(method: Method) -> Result<StatusCode, warp::Rejection> {
    // a POST that reached here failed earlier in `add_answer`; let that
    // rejection win
    if method == Method::POST {
        Err(warp::reject::not_found())
    } else {
        Err(warp::reject::custom(handle_errors::Error::MethodNotAllowed))
    }
}
