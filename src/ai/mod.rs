pub mod generator;
pub mod handlers;
pub mod prompts;

pub use generator::{GeminiClient, TextGenerator};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().nest("/ai", handlers::ai_routes())
}
