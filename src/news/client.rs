use std::{collections::HashSet, time::Duration};

use anyhow::Context;
use serde_json::{json, Value};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{
    categorize::{self, keywords_for, Category, CategorySource},
    config::NewsConfig,
    news::{
        api_types::{ApiArticle, ApiEnvelope},
        dto::{FeedStatus, HeadlineOptions, HeadlinesResponse, NewsArticle, NewsSource},
    },
};

pub const MAX_COUNT: usize = 100;
const DESCRIPTION_CHARS: usize = 200;

pub const HEADLINE_PREFIX: &str = "newsapi-";
pub const SEARCH_PREFIX: &str = "search-";

/// Search terms used when no (known) category is requested.
pub const TECH_KEYWORDS: &[&str] = &[
    "technology",
    "tech",
    "artificial intelligence",
    "AI",
    "machine learning",
    "software",
    "hardware",
    "mobile",
    "smartphone",
    "computer",
    "internet",
    "cybersecurity",
    "blockchain",
    "cloud computing",
    "programming",
    "coding",
    "startup",
    "Silicon Valley",
    "innovation",
    "digital",
    "app",
    "platform",
];

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("Search temporarily unavailable")]
    Upstream(#[from] anyhow::Error),
}

/// Client for the upstream article-search API.
#[derive(Clone)]
pub struct NewsService {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsService {
    pub fn new(cfg: &NewsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build news http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.clone(),
        })
    }

    /// Tech headlines, optionally narrowed to one category. Never fails:
    /// a missing key, an upstream error or an empty page all yield the
    /// fallback set.
    pub async fn fetch_headlines(&self, opts: &HeadlineOptions) -> HeadlinesResponse {
        let Some(key) = self.api_key.as_deref() else {
            info!("no news api key configured; serving fallback news");
            return fallback_news();
        };

        let keywords = opts
            .category
            .as_deref()
            .and_then(keywords_for)
            .unwrap_or(TECH_KEYWORDS);
        let mut body = base_request(key, keywords, opts);
        if let Value::Object(map) = &mut body {
            map.insert(
                "sourceLocationUri".into(),
                json!([
                    "http://en.wikipedia.org/wiki/United_States",
                    "http://en.wikipedia.org/wiki/United_Kingdom",
                    "http://en.wikipedia.org/wiki/Canada",
                ]),
            );
            map.insert("ignoreSourceGroupUri".into(), json!("paywall/paywalled_sources"));
            map.insert("includeArticleSentiment".into(), json!(true));
            map.insert("includeSourceTitle".into(), json!(true));
        }

        match self.request(&body).await {
            Ok(envelope) => {
                let (results, total) = unpack(envelope);
                if results.is_empty() {
                    warn!(category = ?opts.category, "news api returned no articles; serving fallback news");
                    return fallback_news();
                }
                let articles = normalize_articles(results, HEADLINE_PREFIX);
                info!(
                    category = ?opts.category,
                    articles = articles.len(),
                    "news headlines fetched"
                );
                HeadlinesResponse {
                    status: FeedStatus::Ok,
                    total_results: total.unwrap_or(articles.len() as u64),
                    articles,
                }
            }
            Err(e) => {
                warn!(error = %e, category = ?opts.category, "news api request failed; serving fallback news");
                fallback_news()
            }
        }
    }

    pub async fn articles_by_category(&self, category: &str, opts: HeadlineOptions) -> HeadlinesResponse {
        let opts = HeadlineOptions {
            category: Some(category.to_string()),
            ..opts
        };
        self.fetch_headlines(&opts).await
    }

    /// Free keyword search. Unlike headlines, an upstream failure surfaces.
    pub async fn search(
        &self,
        keywords: &[String],
        opts: &HeadlineOptions,
    ) -> Result<HeadlinesResponse, NewsError> {
        let Some(key) = self.api_key.as_deref() else {
            info!("no news api key configured; serving fallback news for search");
            return Ok(fallback_news());
        };

        let terms: Vec<&str> = keywords.iter().map(String::as_str).collect();
        let body = base_request(key, &terms, opts);
        let envelope = self.request(&body).await?;
        let (results, total) = unpack(envelope);
        let articles = normalize_articles(results, SEARCH_PREFIX);
        info!(keywords = keywords.len(), articles = articles.len(), "news search completed");

        Ok(HeadlinesResponse {
            status: FeedStatus::Ok,
            total_results: total.unwrap_or(articles.len() as u64),
            articles,
        })
    }

    async fn request(&self, body: &Value) -> anyhow::Result<ApiEnvelope> {
        let start = std::time::Instant::now();
        let resp = self
            .http
            .post(&self.base_url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request failed for {}", self.base_url))?
            .error_for_status()
            .with_context(|| format!("http error for {}", self.base_url))?;

        let envelope: ApiEnvelope = resp.json().await.context("decode news api response")?;
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "news api request completed"
        );
        Ok(envelope)
    }
}

fn base_request(key: &str, keywords: &[&str], opts: &HeadlineOptions) -> Value {
    json!({
        "action": "getArticles",
        "keyword": keywords,
        "keywordOper": "or",
        "keywordLoc": "body,title",
        "lang": [opts.lang],
        "dataType": ["news"],
        "articlesPage": opts.page.max(1),
        "articlesCount": opts.count.clamp(1, MAX_COUNT),
        "articlesSortBy": opts.sort_by,
        "articlesSortByAsc": false,
        "forceMaxDataTimeWindow": 31,
        "resultType": "articles",
        "apiKey": key,
        "includeArticleTitle": true,
        "includeArticleBasicInfo": true,
        "includeArticleBody": true,
        "includeArticleImage": true,
        "includeArticleCategories": true,
        "includeArticleConcepts": true,
        "articleBodyLen": 500,
    })
}

fn unpack(envelope: ApiEnvelope) -> (Vec<ApiArticle>, Option<u64>) {
    match envelope.articles {
        Some(a) => (a.results, a.total_results),
        None => (Vec::new(), None),
    }
}

fn describe(article: &ApiArticle) -> String {
    if let Some(summary) = article.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        return summary.to_string();
    }
    match article.body.as_deref().filter(|b| !b.trim().is_empty()) {
        Some(body) => {
            let head: String = body.chars().take(DESCRIPTION_CHARS).collect();
            format!("{}...", head)
        }
        None => "No description available".to_string(),
    }
}

/// Converts raw upstream articles to [`NewsArticle`]s, dropping repeated
/// URIs and categorizing each one by keywords.
pub fn normalize_articles(raw: Vec<ApiArticle>, prefix: &str) -> Vec<NewsArticle> {
    let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (index, article) in raw.into_iter().enumerate() {
        let uri = article.uri.clone().filter(|u| !u.is_empty());
        if let Some(uri) = &uri {
            if !seen.insert(uri.clone()) {
                debug!(uri = %uri, "duplicate news article dropped");
                continue;
            }
        }

        let title = article.title.clone().unwrap_or_default();
        let body = article.body.clone().unwrap_or_default();
        let id = match &uri {
            Some(uri) => format!("{}{}", prefix, uri),
            None => format!("{}{}-{}", prefix, stamp, index),
        };
        let published_at = article
            .date_time
            .as_deref()
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok());
        let (source_id, source_name) = match &article.source {
            Some(s) => (s.uri.clone(), s.title.clone()),
            None => (None, None),
        };

        out.push(NewsArticle {
            id,
            description: describe(&article),
            categories: categorize::categorize(&title, &body),
            title,
            content: article.body,
            url: article.url,
            url_to_image: article.image,
            published_at,
            source: NewsSource {
                id: source_id,
                name: source_name.unwrap_or_else(|| "Unknown Source".to_string()),
            },
            author: article.authors.into_iter().find_map(|a| a.name),
            sentiment: article.sentiment,
            is_news_api: true,
        });
    }
    out
}

fn fallback_article(
    id: &str,
    title: &str,
    description: &str,
    category: &str,
    published_at: OffsetDateTime,
) -> NewsArticle {
    NewsArticle {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        content: None,
        url: Some("#".to_string()),
        url_to_image: None,
        published_at: Some(published_at),
        source: NewsSource {
            id: None,
            name: "Tech Fallback".to_string(),
        },
        author: None,
        categories: vec![Category::new(category, 1.0, CategorySource::Fallback)],
        sentiment: None,
        is_news_api: true,
    }
}

/// The fixed three-article set served whenever live news is unavailable.
pub fn fallback_news() -> HeadlinesResponse {
    let now = OffsetDateTime::now_utc();
    let articles = vec![
        fallback_article(
            "fallback-1",
            "AI Technology Advances Continue to Shape Industry",
            "Latest developments in artificial intelligence and machine learning are transforming various sectors with new innovations in neural networks and deep learning algorithms.",
            "AI & Machine Learning",
            now,
        ),
        fallback_article(
            "fallback-2",
            "Mobile Technology Innovations Drive Market Growth",
            "Smartphone manufacturers continue to push boundaries with new features and capabilities, including advanced camera systems and 5G connectivity improvements.",
            "Mobile Technology",
            now - time::Duration::hours(1),
        ),
        fallback_article(
            "fallback-3",
            "Cybersecurity Threats Require Enhanced Protection Measures",
            "Security experts warn of increasing cyber attacks and recommend implementing stronger authentication and encryption protocols to protect sensitive data.",
            "Cybersecurity",
            now - time::Duration::hours(2),
        ),
    ];
    HeadlinesResponse {
        status: FeedStatus::Fallback,
        total_results: articles.len() as u64,
        articles,
    }
}
