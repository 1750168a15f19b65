use std::collections::HashSet;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::{categorize, is_known_category, Category, CategorySource, MAX_CATEGORIES};
use crate::ai::{prompts, TextGenerator};

pub const AI_CONFIDENCE: f64 = 0.8;

/// Asks the text generator for categories, falling back to keyword matching
/// on any failure.
pub async fn categorize_ai(generator: &dyn TextGenerator, title: &str, body: &str) -> Vec<Category> {
    match classify(generator, title, body).await {
        Ok(categories) => categories,
        Err(e) => {
            warn!(error = %e, "ai categorization failed; using keyword fallback");
            categorize(title, body)
        }
    }
}

/// Strict variant: errors when the service fails, returns no JSON array, or
/// names no known category.
async fn classify(
    generator: &dyn TextGenerator,
    title: &str,
    body: &str,
) -> anyhow::Result<Vec<Category>> {
    let reply = generator.generate(&prompts::categorize(title, body)).await?;
    let names = parse_category_names(&reply)?;
    anyhow::ensure!(!names.is_empty(), "no known categories in ai reply");
    Ok(names
        .into_iter()
        .map(|name| Category::new(name, AI_CONFIDENCE, CategorySource::Ai))
        .collect())
}

/// Pulls the first `[...]` span that parses as a string array out of free
/// text and keeps the known names, deduplicated, in reply order.
pub fn parse_category_names(reply: &str) -> anyhow::Result<Vec<String>> {
    lazy_static! {
        static ref JSON_ARRAY_RE: Regex = Regex::new(r"\[[^\[\]]*\]").unwrap();
    }
    let raw: Vec<String> = JSON_ARRAY_RE
        .find_iter(reply)
        .find_map(|m| serde_json::from_str(m.as_str()).ok())
        .context("no json string array in ai reply")?;

    let mut seen = HashSet::new();
    let names: Vec<String> = raw
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| is_known_category(n))
        .filter(|n| seen.insert(n.clone()))
        .take(MAX_CATEGORIES)
        .collect();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[test]
    fn parses_array_embedded_in_prose() {
        let names = parse_category_names(
            "Sure! Here you go:\n```json\n[\"Cybersecurity\", \"Cloud Computing\"]\n```",
        )
        .unwrap();
        assert_eq!(names, vec!["Cybersecurity", "Cloud Computing"]);
    }

    #[test]
    fn unknown_and_duplicate_names_are_dropped() {
        let names = parse_category_names(
            r#"["Gardening", "Cybersecurity", "Cybersecurity", "Web Development", "Cloud Computing", "Software Development"]"#,
        )
        .unwrap();
        assert_eq!(
            names,
            vec!["Cybersecurity", "Web Development", "Cloud Computing"]
        );
    }

    #[test]
    fn later_brackets_do_not_hide_the_array() {
        let names = parse_category_names(r#"["Cybersecurity"] as seen in [1]"#).unwrap();
        assert_eq!(names, vec!["Cybersecurity"]);
        let names = parse_category_names(r#"See [1]: ["Hardware & Gadgets"]"#).unwrap();
        assert_eq!(names, vec!["Hardware & Gadgets"]);
    }

    #[test]
    fn reply_without_array_is_an_error() {
        assert!(parse_category_names("I think it's about security").is_err());
        assert!(parse_category_names("[not json]").is_err());
    }

    #[tokio::test]
    async fn ai_categories_carry_fixed_confidence() {
        let generator = ScriptedGenerator::replying(r#"["Mobile Technology"]"#);
        let cats = categorize_ai(&generator, "anything", "at all").await;
        assert_eq!(cats, vec![Category::new("Mobile Technology", 0.8, CategorySource::Ai)]);
    }

    #[tokio::test]
    async fn failures_fall_back_to_keywords() {
        let title = "Ransomware gang hits hospital";
        let body = "Phishing emails delivered the malware";
        let expected = categorize(title, body);

        let failing = ScriptedGenerator::failing();
        assert_eq!(categorize_ai(&failing, title, body).await, expected);

        let garbage = ScriptedGenerator::replying("no idea, sorry");
        assert_eq!(categorize_ai(&garbage, title, body).await, expected);

        let unknown_only = ScriptedGenerator::replying(r#"["Healthcare"]"#);
        assert_eq!(categorize_ai(&unknown_only, title, body).await, expected);
    }
}
