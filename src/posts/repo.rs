use async_trait::async_trait;
use uuid::Uuid;

use crate::posts::{
    repo_types::{NewPost, Post, PostChanges},
    votes::{VoteDirection, VoteOutcome},
};

/// Post and vote persistence.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest first.
    async fn list(&self) -> anyhow::Result<Vec<Post>>;

    /// One page of posts tagged with `category`, newest first, plus the total
    /// number of matching posts.
    async fn list_by_category(
        &self,
        category: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Post>, i64)>;

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Post>>;

    async fn create(&self, post: NewPost) -> anyhow::Result<Post>;

    async fn update(&self, id: Uuid, changes: PostChanges) -> anyhow::Result<Option<Post>>;

    /// Returns false when the post did not exist.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Applies one vote transition for `(user_id, post_id)` atomically and
    /// returns the recomputed tally, or `None` when the post does not exist.
    async fn vote(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        direction: VoteDirection,
    ) -> anyhow::Result<Option<VoteOutcome>>;
}
