use std::collections::HashMap;

use tracing::debug;

use super::{categorize, categorize_ai, rank, Category, CategorySource};
use crate::ai::TextGenerator;

const AGREEMENT_BOOST: f64 = 0.2;

/// Keyword and AI categorization combined. Names found by both are boosted
/// and marked `hybrid`. The AI step falls back to keywords on its own, and its
/// fallback result is folded in like any other.
pub async fn merge_categories(generator: &dyn TextGenerator, title: &str, body: &str) -> Vec<Category> {
    let keyword = categorize(title, body);
    let ai = categorize_ai(generator, title, body).await;
    let merged = combine(keyword, ai);
    debug!(count = merged.len(), "categories merged");
    merged
}

/// Folds AI results into the keyword results keyed by name.
pub fn combine(keyword: Vec<Category>, ai: Vec<Category>) -> Vec<Category> {
    let mut index: HashMap<String, usize> = keyword
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.clone(), i))
        .collect();

    let merged = ai.into_iter().fold(keyword, |mut acc, cat| {
        match index.get(&cat.name) {
            Some(&i) => {
                let existing = &mut acc[i];
                existing.confidence = (existing.confidence + AGREEMENT_BOOST).min(1.0);
                existing.source = CategorySource::Hybrid;
            }
            None => {
                index.insert(cat.name.clone(), acc.len());
                acc.push(cat);
            }
        }
        acc
    });

    rank(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::MAX_CATEGORIES;
    use crate::testing::ScriptedGenerator;

    fn kw(name: &str, confidence: f64) -> Category {
        Category::new(name, confidence, CategorySource::Keyword)
    }

    fn ai(name: &str) -> Category {
        Category::new(name, 0.8, CategorySource::Ai)
    }

    #[test]
    fn agreement_boosts_and_marks_hybrid() {
        let merged = combine(vec![kw("Cybersecurity", 0.3)], vec![ai("Cybersecurity")]);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].confidence - 0.5).abs() < 1e-9);
        assert_eq!(merged[0].source, CategorySource::Hybrid);
    }

    #[test]
    fn boost_is_capped_at_one() {
        let merged = combine(vec![kw("Cybersecurity", 0.95)], vec![ai("Cybersecurity")]);
        assert_eq!(merged[0].confidence, 1.0);
    }

    #[test]
    fn ai_only_entries_are_appended_and_ranked() {
        let merged = combine(
            vec![kw("Web Development", 0.1), kw("Cloud Computing", 0.2)],
            vec![ai("Mobile Technology"), ai("Hardware & Gadgets")],
        );
        assert_eq!(merged.len(), MAX_CATEGORIES);
        let names: Vec<_> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Mobile Technology", "Hardware & Gadgets", "Cloud Computing"]
        );
    }

    #[tokio::test]
    async fn ai_fallback_still_boosts_keyword_matches() {
        let title = "Kubernetes on AWS";
        let body = "";
        let keyword = categorize(title, body);
        assert_eq!(keyword.len(), 1);

        let generator = ScriptedGenerator::failing();
        let merged = merge_categories(&generator, title, body).await;
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Cloud Computing");
        assert_eq!(merged[0].source, CategorySource::Hybrid);
        assert!((merged[0].confidence - (keyword[0].confidence + AGREEMENT_BOOST)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nothing_matched_anywhere_stays_empty() {
        let generator = ScriptedGenerator::failing();
        assert!(merge_categories(&generator, "A quiet day", "nothing to report").await.is_empty());
    }

    #[tokio::test]
    async fn merge_uses_ai_reply() {
        let generator = ScriptedGenerator::replying(r#"["Cloud Computing", "Software Development"]"#);
        let merged = merge_categories(&generator, "Kubernetes on AWS", "cloud deployment").await;
        let cloud = merged.iter().find(|c| c.name == "Cloud Computing").unwrap();
        assert_eq!(cloud.source, CategorySource::Hybrid);
        assert!(merged.iter().any(|c| c.name == "Software Development"));
    }
}
