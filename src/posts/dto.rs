use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::posts::repo_types::Post;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: Uuid,
    pub message: &'static str,
    pub votes: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_vote: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    pub const MAX_LIMIT: usize = 100;

    /// Clamps a requested page/limit: page ≥ 1, limit in `1..=MAX_LIMIT`.
    pub fn normalize(page: Option<usize>, limit: Option<usize>, default_limit: usize) -> (usize, usize) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT);
        (page, limit)
    }

    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }

    /// Rows skipped before `page`; saturates instead of overflowing on absurd pages.
    pub fn offset_for(page: usize, limit: usize) -> usize {
        page.saturating_sub(1).saturating_mul(limit)
    }

    pub fn offset(&self) -> usize {
        Self::offset_for(self.page, self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryPostsResponse {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_page_and_limit() {
        assert_eq!(Pagination::normalize(None, None, 10), (1, 10));
        assert_eq!(Pagination::normalize(Some(0), Some(0), 10), (1, 1));
        assert_eq!(Pagination::normalize(Some(3), Some(500), 10), (3, 100));
    }

    #[test]
    fn total_pages_round_up() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(2, 10, 11).total_pages, 2);
        assert_eq!(Pagination::new(3, 10, 25).offset(), 20);
    }

    #[test]
    fn offset_saturates_for_huge_pages() {
        assert_eq!(Pagination::new(usize::MAX, 10, 5).offset(), usize::MAX);
        assert_eq!(Pagination::offset_for(1, 100), 0);
    }

    #[test]
    fn vote_request_reads_camel_case() {
        let req: VoteRequest = serde_json::from_str(r#"{"voteType":"down"}"#).unwrap();
        assert_eq!(req.vote_type.as_deref(), Some("down"));
    }
}
