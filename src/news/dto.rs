use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::categorize::Category;

/// Canonical news record; every upstream shape is converted into this at the
/// adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub source: NewsSource,
    pub author: Option<String>,
    pub categories: Vec<Category>,
    pub sentiment: Option<f64>,
    pub is_news_api: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsSource {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Ok,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesResponse {
    pub status: FeedStatus,
    pub total_results: u64,
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone)]
pub struct HeadlineOptions {
    pub count: usize,
    pub page: usize,
    pub category: Option<String>,
    pub sort_by: String,
    pub lang: String,
}

impl Default for HeadlineOptions {
    fn default() -> Self {
        Self {
            count: 20,
            page: 1,
            category: None,
            sort_by: "date".into(),
            lang: "eng".into(),
        }
    }
}

/// Query string shared by the news endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub count: Option<usize>,
    pub page: Option<usize>,
    pub sort_by: Option<String>,
    pub lang: Option<String>,
}

impl NewsQuery {
    pub fn into_options(self, default_count: usize) -> HeadlineOptions {
        let defaults = HeadlineOptions::default();
        HeadlineOptions {
            count: self.count.unwrap_or(default_count),
            page: self.page.unwrap_or(defaults.page).max(1),
            category: self.category.filter(|c| !c.trim().is_empty()),
            sort_by: self.sort_by.unwrap_or(defaults.sort_by),
            lang: self.lang.unwrap_or(defaults.lang),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub name: &'static str,
    pub keyword_count: usize,
}

#[derive(Debug, Serialize)]
pub struct NewsCategoriesResponse {
    pub categories: Vec<CategoryInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_fill_options() {
        let opts = NewsQuery::default().into_options(15);
        assert_eq!(opts.count, 15);
        assert_eq!(opts.page, 1);
        assert_eq!(opts.sort_by, "date");
        assert_eq!(opts.lang, "eng");
        assert!(opts.category.is_none());
    }

    #[test]
    fn blank_category_is_ignored() {
        let q = NewsQuery {
            category: Some("  ".into()),
            page: Some(0),
            ..Default::default()
        };
        let opts = q.into_options(20);
        assert!(opts.category.is_none());
        assert_eq!(opts.page, 1);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(FeedStatus::Fallback).unwrap(), "fallback");
    }
}
