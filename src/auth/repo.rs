use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    /// Matches either the email or the username.
    async fn find_by_login(&self, email_or_username: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_google_id(&self, google_id: &str) -> anyhow::Result<Option<User>>;

    async fn create(&self, user: NewUser) -> anyhow::Result<User>;
}
