//! Unified feed of community posts and news articles, newest first.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::{
    error::AppResult,
    news::dto::{FeedStatus, HeadlineOptions, NewsArticle},
    posts::{dto::Pagination, repo_types::Post},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimelineItem {
    Post(Post),
    News(NewsArticle),
}

impl TimelineItem {
    /// Sort key; undated items sort as the epoch, i.e. last.
    pub fn effective_date(&self) -> OffsetDateTime {
        match self {
            TimelineItem::Post(p) => p.created_at,
            TimelineItem::News(a) => a.published_at.unwrap_or(OffsetDateTime::UNIX_EPOCH),
        }
    }
}

/// Posts then articles, stably sorted by descending effective date.
pub fn merge_timeline(posts: Vec<Post>, articles: Vec<NewsArticle>) -> Vec<TimelineItem> {
    let mut items: Vec<TimelineItem> = posts
        .into_iter()
        .map(TimelineItem::Post)
        .chain(articles.into_iter().map(TimelineItem::News))
        .collect();
    items.sort_by(|a, b| b.effective_date().cmp(&a.effective_date()));
    items
}

pub fn page_of<T>(items: Vec<T>, pagination: &Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub items: Vec<TimelineItem>,
    pub pagination: Pagination,
    pub news_status: FeedStatus,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/timeline", get(timeline))
}

#[instrument(skip(state))]
pub async fn timeline(
    State(state): State<AppState>,
    Query(q): Query<TimelineQuery>,
) -> AppResult<Json<TimelineResponse>> {
    let category = q.category.filter(|c| !c.trim().is_empty());
    let (page, limit) = Pagination::normalize(q.page, q.limit, state.config.timeline_page_size);

    let mut posts = state.posts.list().await?;
    if let Some(name) = &category {
        posts.retain(|p| p.categories.iter().any(|c| &c.name == name));
    }
    let news = state
        .news
        .fetch_headlines(&HeadlineOptions {
            category: category.clone(),
            ..Default::default()
        })
        .await;

    let items = merge_timeline(posts, news.articles);
    let pagination = Pagination::new(page, limit, items.len());
    debug!(total = items.len(), page, limit, "timeline merged");

    Ok(Json(TimelineResponse {
        items: page_of(items, &pagination),
        pagination,
        news_status: news.status,
    }))
}
