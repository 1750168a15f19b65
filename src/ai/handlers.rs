use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    ai::{prompts, TextGenerator},
    auth::AuthUser,
    error::AppResult,
    posts::{
        handlers::not_found,
        repo_types::{Post, PostChanges},
    },
    state::AppState,
};

pub const UNAVAILABLE: &str = "AI analysis temporarily unavailable.";

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/posts/:id/summary", post(summary))
        .route("/posts/:id/5w1h", post(five_w_one_h))
        .route("/posts/:id/comparison", post(comparison))
        .route("/posts/:id/analyze-all", post(analyze_all))
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub comparison: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AllAnalysesResponse {
    pub summary: String,
    pub analysis: String,
    pub comparison: String,
    pub message: &'static str,
}

/// Runs one prompt; `None` when the generator failed.
async fn generate(gen: &dyn TextGenerator, kind: &str, prompt: String) -> Option<String> {
    match gen.generate(&prompt).await {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            warn!(kind, error = %e, "text generation failed; returning placeholder");
            None
        }
    }
}

fn or_placeholder(text: Option<String>) -> String {
    text.unwrap_or_else(|| UNAVAILABLE.to_string())
}

async fn load_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state.posts.find(id).await?.ok_or_else(|| not_found(id))
}

/// Only real generations are written back, and only when the caller owns the
/// post; a placeholder never replaces a summary.
async fn store_summary(
    state: &AppState,
    post: &Post,
    user_id: Uuid,
    summary: &Option<String>,
) -> AppResult<()> {
    let Some(text) = summary else {
        return Ok(());
    };
    if post.user_id != user_id {
        debug!(post_id = %post.id, %user_id, "summary generated for non-owner; not stored");
        return Ok(());
    }
    let changes = PostChanges {
        summary: Some(text.clone()),
        ..Default::default()
    };
    state.posts.update(post.id, changes).await?;
    info!(post_id = %post.id, "post summary stored");
    Ok(())
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SummaryResponse>> {
    let post = load_post(&state, id).await?;
    let text = generate(
        state.ai.as_ref(),
        "summary",
        prompts::summary(&post.title, &post.description),
    )
    .await;
    store_summary(&state, &post, user_id, &text).await?;

    Ok(Json(SummaryResponse {
        summary: or_placeholder(text),
        message: "AI summary generated successfully",
    }))
}

#[instrument(skip(state))]
pub async fn five_w_one_h(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AnalysisResponse>> {
    let post = load_post(&state, id).await?;
    let text = generate(
        state.ai.as_ref(),
        "5w1h",
        prompts::five_w_one_h(&post.title, &post.description),
    )
    .await;

    Ok(Json(AnalysisResponse {
        analysis: or_placeholder(text),
        kind: "5W1H",
        message: "5W1H analysis generated successfully",
    }))
}

#[instrument(skip(state))]
pub async fn comparison(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ComparisonResponse>> {
    let post = load_post(&state, id).await?;
    let text = generate(
        state.ai.as_ref(),
        "comparison",
        prompts::comparison(&post.title, &post.description),
    )
    .await;

    Ok(Json(ComparisonResponse {
        comparison: or_placeholder(text),
        kind: "market_comparison",
        message: "Market comparison generated successfully",
    }))
}

#[instrument(skip(state))]
pub async fn analyze_all(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AllAnalysesResponse>> {
    let post = load_post(&state, id).await?;
    let gen = state.ai.as_ref();

    // Each call degrades on its own, so the join never fails as a whole.
    let (summary, analysis, comparison) = tokio::join!(
        generate(gen, "summary", prompts::summary(&post.title, &post.description)),
        generate(gen, "5w1h", prompts::five_w_one_h(&post.title, &post.description)),
        generate(gen, "comparison", prompts::comparison(&post.title, &post.description)),
    );
    store_summary(&state, &post, user_id, &summary).await?;

    Ok(Json(AllAnalysesResponse {
        summary: or_placeholder(summary),
        analysis: or_placeholder(analysis),
        comparison: or_placeholder(comparison),
        message: "All AI analyses generated successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[tokio::test]
    async fn generate_trims_successful_output() {
        let gen = ScriptedGenerator::replying("  a summary \n");
        let text = generate(&gen, "summary", "prompt".into()).await;
        assert_eq!(text.as_deref(), Some("a summary"));
    }

    #[tokio::test]
    async fn failed_generation_becomes_placeholder() {
        let gen = ScriptedGenerator::failing();
        let text = generate(&gen, "summary", "prompt".into()).await;
        assert!(text.is_none());
        assert_eq!(or_placeholder(text), UNAVAILABLE);
    }

    #[test]
    fn analysis_response_uses_type_key() {
        let body = serde_json::to_value(AnalysisResponse {
            analysis: "x".into(),
            kind: "5W1H",
            message: "ok",
        })
        .unwrap();
        assert_eq!(body["type"], "5W1H");
        assert!(body.get("kind").is_none());
    }
}
