//! Topic tagging for posts and news articles.
//!
//! Three stages: substring keyword matching ([`keyword`]), a generative-text
//! classifier ([`ai`]) and a merge that boosts names both stages agree on
//! ([`merge`]). Every stage yields at most [`MAX_CATEGORIES`] entries sorted by
//! descending confidence.

pub mod ai;
pub mod keyword;
pub mod merge;

use serde::{Deserialize, Serialize};

pub use ai::categorize_ai;
pub use keyword::categorize;
pub use merge::merge_categories;

pub const MAX_CATEGORIES: usize = 3;

/// Fixed category table. Keywords are matched case-insensitively as substrings.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "AI & Machine Learning",
        &[
            "artificial intelligence",
            "machine learning",
            "neural network",
            "deep learning",
            "GPT",
            "LLM",
            "ChatGPT",
            "AI model",
            "algorithm",
            "automation",
            "chatbot",
            "generative AI",
            "computer vision",
            "natural language processing",
            "robotics",
        ],
    ),
    (
        "Mobile Technology",
        &[
            "smartphone",
            "iPhone",
            "Android",
            "mobile app",
            "iOS",
            "mobile development",
            "tablet",
            "mobile security",
            "app store",
            "mobile gaming",
            "5G",
            "wireless",
        ],
    ),
    (
        "Web Development",
        &[
            "JavaScript",
            "React",
            "Vue",
            "Angular",
            "Node.js",
            "frontend",
            "backend",
            "web development",
            "HTML",
            "CSS",
            "API",
            "framework",
            "responsive design",
            "TypeScript",
            "Next.js",
            "GraphQL",
            "REST",
        ],
    ),
    (
        "Cybersecurity",
        &[
            "security",
            "cybersecurity",
            "encryption",
            "hacking",
            "malware",
            "firewall",
            "data breach",
            "privacy",
            "authentication",
            "vulnerability",
            "ransomware",
            "phishing",
            "zero-day",
            "penetration testing",
        ],
    ),
    (
        "Cloud Computing",
        &[
            "cloud",
            "AWS",
            "Azure",
            "Google Cloud",
            "serverless",
            "microservices",
            "containerization",
            "Docker",
            "Kubernetes",
            "cloud native",
            "SaaS",
            "PaaS",
            "infrastructure",
            "scalability",
        ],
    ),
    (
        "Blockchain & Crypto",
        &[
            "blockchain",
            "cryptocurrency",
            "Bitcoin",
            "Ethereum",
            "NFT",
            "DeFi",
            "smart contract",
            "crypto",
            "digital currency",
            "mining",
            "Web3",
            "metaverse",
            "decentralized",
            "tokenization",
        ],
    ),
    (
        "Hardware & Gadgets",
        &[
            "processor",
            "GPU",
            "CPU",
            "hardware",
            "gadget",
            "laptop",
            "desktop",
            "chip",
            "semiconductor",
            "electronics",
            "device",
            "Intel",
            "AMD",
            "NVIDIA",
            "motherboard",
            "RAM",
            "storage",
        ],
    ),
    (
        "Software Development",
        &[
            "software",
            "programming",
            "coding",
            "development",
            "open source",
            "GitHub",
            "version control",
            "testing",
            "debugging",
            "deployment",
            "DevOps",
            "CI/CD",
            "agile",
            "scrum",
        ],
    ),
];

/// Where a category assignment came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    Keyword,
    Ai,
    Hybrid,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub confidence: f64,
    pub source: CategorySource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, confidence: f64, source: CategorySource) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            matched_keywords: Vec::new(),
        }
    }
}

/// Names of all known categories, in table order.
pub fn available_categories() -> Vec<&'static str> {
    CATEGORY_KEYWORDS.iter().map(|(name, _)| *name).collect()
}

pub fn keywords_for(name: &str) -> Option<&'static [&'static str]> {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(category, _)| *category == name)
        .map(|(_, keywords)| *keywords)
}

pub fn is_known_category(name: &str) -> bool {
    keywords_for(name).is_some()
}

/// Stable sort by descending confidence, then cut to the top entries.
pub(crate) fn rank(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    categories.truncate(MAX_CATEGORIES);
    categories
}
