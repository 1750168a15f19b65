use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    posts::{
        repo::PostStore,
        repo_types::{NewPost, Post, PostChanges, PostRow},
        votes::{transition, VoteChange, VoteDirection, VoteOutcome, VoteTally},
    },
};

const USER_COLUMNS: &str = "id, username, email, password_hash, google_id, picture, created_at";

// Vote counts are always derived from the votes table.
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.summary, p.description, p.categories, p.user_id,
           p.created_at, p.updated_at,
           u.username AS author_username, u.email AS author_email,
           COALESCE(v.upvotes, 0) AS upvotes, COALESCE(v.downvotes, 0) AS downvotes
    FROM posts p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN (
        SELECT post_id,
               COUNT(*) FILTER (WHERE value = 1) AS upvotes,
               COUNT(*) FILTER (WHERE value = -1) AS downvotes
        FROM votes
        GROUP BY post_id
    ) v ON v.post_id = p.id
"#;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_user(&self, filter: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, filter);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.fetch_user("email = $1", email).await
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.fetch_user("username = $1", username).await
    }

    async fn find_by_login(&self, email_or_username: &str) -> anyhow::Result<Option<User>> {
        self.fetch_user("email = $1 OR username = $1 LIMIT 1", email_or_username)
            .await
    }

    async fn find_by_google_id(&self, google_id: &str) -> anyhow::Result<Option<User>> {
        self.fetch_user("google_id = $1", google_id).await
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, google_id, picture)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(&user.picture)
            .fetch_one(&self.db)
            .await
            .context("insert user")?;
        Ok(user)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn list(&self) -> anyhow::Result<Vec<Post>> {
        let sql = format!("{} ORDER BY p.created_at DESC", POST_SELECT);
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.db)
            .await
            .context("list posts")?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_by_category(
        &self,
        category: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Post>, i64)> {
        let filter = "p.categories @> jsonb_build_array(jsonb_build_object('name', $1::text))";
        let sql = format!(
            "{} WHERE {} ORDER BY p.created_at DESC LIMIT $2 OFFSET $3",
            POST_SELECT, filter
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await
            .context("list posts by category")?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM posts p WHERE {}",
            filter
        ))
        .bind(category)
        .fetch_one(&self.db)
        .await
        .context("count posts by category")?;

        Ok((rows.into_iter().map(Post::from).collect(), total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let sql = format!("{} WHERE p.id = $1", POST_SELECT);
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find post")?;
        Ok(row.map(Post::from))
    }

    async fn create(&self, post: NewPost) -> anyhow::Result<Post> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, description, categories, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&post.title)
        .bind(&post.description)
        .bind(Json(&post.categories))
        .bind(post.user_id)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;

        self.find(id)
            .await?
            .context("post vanished after insert")
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> anyhow::Result<Option<Post>> {
        let updated = sqlx::query(
            r#"
            UPDATE posts
               SET title       = COALESCE($2, title),
                   description = COALESCE($3, description),
                   summary     = COALESCE($4, summary),
                   categories  = COALESCE($5, categories),
                   updated_at  = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.summary)
        .bind(changes.categories.as_ref().map(Json))
        .execute(&self.db)
        .await
        .context("update post")?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }

    async fn vote(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        direction: VoteDirection,
    ) -> anyhow::Result<Option<VoteOutcome>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        // Row lock serializes concurrent votes on the same post.
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock post")?;
        if locked.is_none() {
            return Ok(None);
        }

        let current: Option<i16> =
            sqlx::query_scalar("SELECT value FROM votes WHERE user_id = $1 AND post_id = $2")
                .bind(user_id)
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await
                .context("read vote")?;

        let change = transition(current, direction);
        match change {
            VoteChange::Insert(value) => {
                sqlx::query("INSERT INTO votes (user_id, post_id, value) VALUES ($1, $2, $3)")
                    .bind(user_id)
                    .bind(post_id)
                    .bind(value)
                    .execute(&mut *tx)
                    .await
                    .context("insert vote")?;
            }
            VoteChange::Update(value) => {
                sqlx::query(
                    "UPDATE votes SET value = $3, updated_at = now() WHERE user_id = $1 AND post_id = $2",
                )
                .bind(user_id)
                .bind(post_id)
                .bind(value)
                .execute(&mut *tx)
                .await
                .context("update vote")?;
            }
            VoteChange::Delete => {
                sqlx::query("DELETE FROM votes WHERE user_id = $1 AND post_id = $2")
                    .bind(user_id)
                    .bind(post_id)
                    .execute(&mut *tx)
                    .await
                    .context("delete vote")?;
            }
        }

        let values: Vec<i16> = sqlx::query_scalar("SELECT value FROM votes WHERE post_id = $1")
            .bind(post_id)
            .fetch_all(&mut *tx)
            .await
            .context("tally votes")?;
        let tally = VoteTally::from_values(values);

        sqlx::query("UPDATE posts SET votes = $2 WHERE id = $1")
            .bind(post_id)
            .bind(tally.votes as i32)
            .execute(&mut *tx)
            .await
            .context("store vote snapshot")?;

        tx.commit().await.context("commit tx")?;

        Ok(Some(VoteOutcome {
            tally,
            user_vote: change.resulting_value(),
        }))
    }
}
