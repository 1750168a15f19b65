mod ai;
mod app;
mod auth;
mod categorize;
mod config;
mod db;
mod error;
mod news;
mod posts;
mod state;
#[cfg(test)]
mod testing;
mod timeline;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "wartek=debug,axum=info,tower_http=info";

/// `RUST_LOG` overrides the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.with_target(false).json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = state::AppState::init().await?;
    tracing::info!(
        news = state.config.news.api_key.is_some(),
        ai = state.config.ai.api_key.is_some(),
        "wartek state ready"
    );
    app::serve(app::build_app(state)).await
}
