use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    categorize::CATEGORY_KEYWORDS,
    error::{AppError, AppResult},
    news::dto::{CategoryInfo, HeadlinesResponse, NewsCategoriesResponse, NewsQuery},
    state::AppState,
};

const HEADLINES_COUNT: usize = 20;
const CATEGORY_COUNT: usize = 15;

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/headlines", get(headlines))
        .route("/category/:name", get(by_category))
        .route("/search", get(search))
        .route("/categories", get(categories))
}

/// Comma-separated search terms, trimmed, empty pieces dropped.
pub fn split_keywords(q: &str) -> Vec<String> {
    q.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[instrument(skip(state))]
pub async fn headlines(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Json<HeadlinesResponse> {
    let opts = q.into_options(HEADLINES_COUNT);
    Json(state.news.fetch_headlines(&opts).await)
}

#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<NewsQuery>,
) -> Json<HeadlinesResponse> {
    let opts = q.into_options(CATEGORY_COUNT);
    Json(state.news.articles_by_category(&name, opts).await)
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(mut q): Query<NewsQuery>,
) -> AppResult<Json<HeadlinesResponse>> {
    let keywords = q.q.take().map(|raw| split_keywords(&raw)).unwrap_or_default();
    if keywords.is_empty() {
        return Err(AppError::BadQuery(
            "Search query (q) parameter is required".into(),
        ));
    }

    let opts = q.into_options(HEADLINES_COUNT);
    match state.news.search(&keywords, &opts).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            warn!(error = ?e, "news search failed");
            Err(AppError::Unavailable(e.to_string()))
        }
    }
}

#[instrument]
pub async fn categories() -> Json<NewsCategoriesResponse> {
    Json(NewsCategoriesResponse {
        categories: CATEGORY_KEYWORDS
            .iter()
            .map(|&(name, keywords)| CategoryInfo {
                name,
                keyword_count: keywords.len(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_split_and_trimmed() {
        assert_eq!(split_keywords(" rust , ,wasm,"), vec!["rust", "wasm"]);
        assert!(split_keywords(" , ").is_empty());
    }

    #[tokio::test]
    async fn categories_report_keyword_counts() {
        let Json(resp) = categories().await;
        assert_eq!(resp.categories.len(), 8);
        let mobile = resp
            .categories
            .iter()
            .find(|c| c.name == "Mobile Technology")
            .unwrap();
        assert_eq!(mobile.keyword_count, 12);
    }
}
