//! Raw article-search payloads as the upstream API sends them. Every field is
//! optional upstream, so everything defaults.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub articles: Option<ApiArticles>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArticles {
    #[serde(default)]
    pub results: Vec<ApiArticle>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArticle {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub source: Option<ApiSource>,
    #[serde(default)]
    pub authors: Vec<ApiAuthor>,
    #[serde(default)]
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiAuthor {
    #[serde(default)]
    pub name: Option<String>,
}
