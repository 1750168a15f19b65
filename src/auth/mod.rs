use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod google;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;

pub use jwt::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new().nest("/users", handlers::auth_routes())
}
