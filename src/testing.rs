//! In-memory doubles for the store and upstream-service traits.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    ai::TextGenerator,
    auth::{
        google::{GoogleIdentity, GoogleVerifier},
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    categorize::Category,
    posts::{
        repo::PostStore,
        repo_types::{Author, NewPost, Post, PostChanges},
        votes::{transition, VoteChange, VoteDirection, VoteOutcome, VoteTally},
    },
};

#[derive(Debug, Clone)]
struct PostRecord {
    id: Uuid,
    title: String,
    description: String,
    summary: Option<String>,
    categories: Vec<Category>,
    user_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<PostRecord>,
    votes: HashMap<(Uuid, Uuid), i16>,
}

impl Tables {
    fn tally(&self, post_id: Uuid) -> VoteTally {
        VoteTally::from_values(
            self.votes
                .iter()
                .filter(|((_, p), _)| *p == post_id)
                .map(|(_, v)| *v),
        )
    }

    fn view(&self, record: &PostRecord) -> anyhow::Result<Post> {
        let author = self
            .users
            .iter()
            .find(|u| u.id == record.user_id)
            .ok_or_else(|| anyhow!("post author missing"))?;
        let tally = self.tally(record.id);
        Ok(Post {
            id: record.id,
            title: record.title.clone(),
            summary: record.summary.clone(),
            description: record.description.clone(),
            categories: record.categories.clone(),
            votes: tally.votes,
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            user_id: record.user_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            author: Author {
                id: author.id,
                username: author.username.clone(),
                email: author.email.clone(),
            },
        })
    }

    fn newest_first(&self) -> Vec<&PostRecord> {
        let mut records: Vec<&PostRecord> = self.posts.iter().rev().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

/// Mutex-guarded tables implementing both store traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| anyhow!("memory store poisoned"))
    }

    fn find_user(&self, pred: impl Fn(&User) -> bool) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| pred(u)).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.find_user(|u| u.id == id)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_user(|u| u.email == email)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_user(|u| u.username == username)
    }

    async fn find_by_login(&self, email_or_username: &str) -> anyhow::Result<Option<User>> {
        self.find_user(|u| u.email == email_or_username || u.username == email_or_username)
    }

    async fn find_by_google_id(&self, google_id: &str) -> anyhow::Result<Option<User>> {
        self.find_user(|u| u.google_id.as_deref() == Some(google_id))
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut t = self.lock()?;
        if t.users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            bail!("unique violation on users");
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            google_id: user.google_id,
            picture: user.picture,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Post>> {
        let t = self.lock()?;
        let posts = t.newest_first().into_iter().map(|r| t.view(r)).collect();
        posts
    }

    async fn list_by_category(
        &self,
        category: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Post>, i64)> {
        let t = self.lock()?;
        let matching: Vec<&PostRecord> = t
            .newest_first()
            .into_iter()
            .filter(|r| r.categories.iter().any(|c| c.name == category))
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|r| t.view(r))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((page, total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let t = self.lock()?;
        let post = t.posts.iter().find(|r| r.id == id).map(|r| t.view(r)).transpose();
        post
    }

    async fn create(&self, post: NewPost) -> anyhow::Result<Post> {
        let mut t = self.lock()?;
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            title: post.title,
            description: post.description,
            summary: None,
            categories: post.categories,
            user_id: post.user_id,
            created_at: now,
            updated_at: now,
        };
        t.posts.push(record.clone());
        t.view(&record)
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> anyhow::Result<Option<Post>> {
        let mut t = self.lock()?;
        let Some(record) = t.posts.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        if let Some(summary) = changes.summary {
            record.summary = Some(summary);
        }
        if let Some(categories) = changes.categories {
            record.categories = categories;
        }
        record.updated_at = OffsetDateTime::now_utc();
        let record = record.clone();
        t.view(&record).map(Some)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.lock()?;
        let before = t.posts.len();
        t.posts.retain(|r| r.id != id);
        t.votes.retain(|(_, post_id), _| *post_id != id);
        Ok(t.posts.len() < before)
    }

    async fn vote(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        direction: VoteDirection,
    ) -> anyhow::Result<Option<VoteOutcome>> {
        let mut t = self.lock()?;
        if !t.posts.iter().any(|r| r.id == post_id) {
            return Ok(None);
        }
        let key = (user_id, post_id);
        let change = transition(t.votes.get(&key).copied(), direction);
        match change {
            VoteChange::Insert(v) | VoteChange::Update(v) => {
                t.votes.insert(key, v);
            }
            VoteChange::Delete => {
                t.votes.remove(&key);
            }
        }
        Ok(Some(VoteOutcome {
            tally: t.tally(post_id),
            user_vote: change.resulting_value(),
        }))
    }
}

/// Text generator that replays one fixed reply, or always fails.
pub struct ScriptedGenerator {
    reply: Option<String>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        self.reply
            .clone()
            .ok_or_else(|| anyhow!("text generation unavailable"))
    }
}

/// Accepts exactly one credential string.
pub struct FakeGoogle {
    pub credential: String,
    pub identity: GoogleIdentity,
}

impl FakeGoogle {
    pub fn accepting(credential: &str, identity: GoogleIdentity) -> Self {
        Self {
            credential: credential.to_string(),
            identity,
        }
    }
}

#[async_trait]
impl GoogleVerifier for FakeGoogle {
    async fn verify(&self, credential: &str) -> anyhow::Result<GoogleIdentity> {
        if credential != self.credential {
            bail!("credential rejected");
        }
        Ok(self.identity.clone())
    }
}
