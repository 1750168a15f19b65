pub mod api_types;
pub mod client;
pub mod dto;
pub mod handlers;

pub use client::NewsService;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().nest("/news", handlers::news_routes())
}
