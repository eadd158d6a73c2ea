#![warn(clippy::all)]

use tracing::{Level, event};
use tracing_subscriber::fmt::format::FmtSpan;

mod config;
mod gemini;
mod render;
mod routes;
mod store;
mod types;

#[tokio::main]
async fn main() -> Result<(), handle_errors::Error> {
    let config = config::Config::new()?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "handle_errors={},operate_pages={},warp={}",
            config.log_level, config.log_level, config.log_level
        )
    });

    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let addr = config.socket_addr()?;
    let client = reqwest::Client::new();
    let store = store::Store::new(client.clone(), config.asset_origin.clone());
    let gemini = gemini::Gemini::new(client, &config);

    if gemini.is_local() {
        event!(
            Level::WARN,
            "GEMINI_API_KEY is not set, /api/gemini answers in local mode"
        );
    }

    let routes = routes::routes(store, gemini, config.public_dir.clone());

    event!(Level::INFO, %addr, public_dir = %config.public_dir, "operate pages listening");
    warp::serve(routes).run(addr).await;

    Ok(())
}
