use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categorize::Category;
use crate::posts::votes::VoteTally;

/// Post joined with its author and live vote counts.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub description: String,
    pub categories: Json<Vec<Category>>,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_username: String,
    pub author_email: String,
    pub upvotes: i64,
    pub downvotes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub description: String,
    pub categories: Vec<Category>,
    pub votes: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(rename = "User")]
    pub author: Author,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        let tally = VoteTally::new(r.upvotes, r.downvotes);
        Self {
            id: r.id,
            title: r.title,
            summary: r.summary,
            description: r.description,
            categories: r.categories.0,
            votes: tally.votes,
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            user_id: r.user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            author: Author {
                id: r.user_id,
                username: r.author_username,
                email: r.author_email,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub categories: Vec<Category>,
}

/// Owner edits; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub categories: Option<Vec<Category>>,
}
