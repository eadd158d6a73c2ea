use handle_errors::return_error;
use std::path::PathBuf;
use warp::{Filter, http::Method};

use crate::gemini::Gemini;
use crate::store::Store;

pub mod answer;
pub mod gemini;
pub mod operate;

/// Every route of the site, with CORS, request tracing and error recovery.
pub fn routes(
    store: Store,
    gemini: Gemini,
    public_dir: impl Into<PathBuf>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let store_filter = warp::any().map(move || store.clone());
    let gemini_filter = warp::any().map(move || gemini.clone());
    let host = warp::header::optional::<String>("host");

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("Content-Type")
        .allow_methods(&[Method::GET, Method::POST, Method::OPTIONS]);

    let operate_id = warp::path("operate")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .map(|id: String| Some(id));
    let operate_index = warp::path("operate")
        .and(warp::path::end())
        .map(|| None::<String>);

    let get_operate = warp::get()
        .and(operate_id.or(operate_index).unify())
        .and(host.clone())
        .and(store_filter.clone())
        .and_then(operate::get_operate)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "get_operate request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }));

    let generate = warp::post()
        .and(warp::path!("api" / "gemini"))
        .and(gemini_filter)
        .and(warp::body::bytes())
        .and_then(gemini::generate);

    let add_answer = warp::post()
        .and(warp::path!("api" / "answers"))
        .and(host)
        .and(store_filter)
        .and(warp::body::bytes())
        .and_then(answer::add_answer);

    let answers_other_methods = warp::path!("api" / "answers")
        .and(warp::method())
        .and_then(answer::reject_method);

    let static_site = warp::get().and(warp::fs::dir(public_dir.into()));

    get_operate
        .or(generate)
        .or(add_answer)
        .or(answers_other_methods)
        .or(static_site)
        .with(cors)
        .with(warp::trace::request())
        .recover(return_error)
}
