use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Upstream news-search API.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Generative-text service used for summaries and categorization.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub news: NewsConfig,
    pub ai: AiConfig,
    pub google_client_id: Option<String>,
    pub cors_origins: Vec<String>,
    pub timeline_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "wartek".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "wartek-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let news = NewsConfig {
            api_key: non_empty_var("NEWSAPI_AI_KEY"),
            base_url: std::env::var("NEWSAPI_URL")
                .unwrap_or_else(|_| "https://eventregistry.org/api/v1/article/getArticles".into()),
            timeout_secs: std::env::var("NEWSAPI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        let ai = AiConfig {
            api_key: non_empty_var("GEMINI_API_KEY"),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into()),
            base_url: std::env::var("GEMINI_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
        };
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();
        let timeline_page_size = std::env::var("TIMELINE_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);

        Ok(Self {
            database_url,
            jwt,
            news,
            ai,
            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            cors_origins,
            timeline_page_size,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
