use super::{rank, Category, CategorySource, CATEGORY_KEYWORDS};

/// Tags free text by counting which table keywords occur in it.
///
/// `confidence = matched / total keywords of the category`. Deterministic and
/// infallible; empty input yields no categories.
pub fn categorize(title: &str, body: &str) -> Vec<Category> {
    let content = format!("{} {}", title, body).to_lowercase();
    if content.trim().is_empty() {
        return Vec::new();
    }

    let matches = CATEGORY_KEYWORDS
        .iter()
        .filter_map(|(name, keywords)| {
            let matched: Vec<String> = keywords
                .iter()
                .filter(|k| content.contains(&k.to_lowercase()))
                .map(|k| k.to_string())
                .collect();
            if matched.is_empty() {
                return None;
            }
            let confidence = matched.len() as f64 / keywords.len() as f64;
            let mut category = Category::new(*name, confidence, CategorySource::Keyword);
            category.matched_keywords = matched;
            Some(category)
        })
        .collect();

    rank(matches)
}
