use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    categorize::{available_categories, merge_categories},
    error::{required, AppError, AppResult},
    posts::{
        dto::{
            CategoriesResponse, CategoryPostsResponse, CreatePostRequest, MessageResponse,
            PageQuery, Pagination, UpdatePostRequest, VoteRequest, VoteResponse,
        },
        repo_types::{NewPost, Post, PostChanges},
        votes::VoteDirection,
    },
    state::AppState,
};

const DEFAULT_CATEGORY_LIMIT: usize = 10;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/categories", get(list_categories))
        .route("/posts/category/:name", get(posts_by_category))
        .route("/posts/:id", get(get_post))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/:id", axum::routing::put(update_post).delete(delete_post))
        .route("/posts/:id/vote", post(vote_post))
}

pub(crate) fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Post id {} not found", id))
}

/// Loads a post and checks that `user_id` owns it.
async fn owned_post(state: &AppState, id: Uuid, user_id: Uuid) -> AppResult<Post> {
    let post = state.posts.find(id).await?.ok_or_else(|| not_found(id))?;
    if post.user_id != user_id {
        warn!(post_id = %id, user_id = %user_id, "post ownership check failed");
        return Err(AppError::Forbidden("Not your post!".into()));
    }
    Ok(post)
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.list().await?))
}

#[instrument]
pub async fn list_categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: available_categories(),
    })
}

#[instrument(skip(state))]
pub async fn posts_by_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<CategoryPostsResponse>> {
    let (page, limit) = Pagination::normalize(q.page, q.limit, DEFAULT_CATEGORY_LIMIT);
    let offset = i64::try_from(Pagination::offset_for(page, limit)).unwrap_or(i64::MAX);
    let (posts, total) = state
        .posts
        .list_by_category(&name, limit as i64, offset)
        .await?;
    Ok(Json(CategoryPostsResponse {
        posts,
        pagination: Pagination::new(page, limit, total.max(0) as usize),
        category: name,
    }))
}

#[instrument(skip(state))]
pub async fn get_post(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Post>> {
    let post = state.posts.find(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(post))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let title = required(payload.title, "title")?;
    let description = required(payload.description, "description")?;

    let categories = merge_categories(state.ai.as_ref(), &title, &description).await;
    let post = state
        .posts
        .create(NewPost {
            user_id,
            title,
            description,
            categories,
        })
        .await?;

    info!(post_id = %post.id, user_id = %user_id, categories = post.categories.len(), "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<Json<Post>> {
    let current = owned_post(&state, id, user_id).await?;

    let title = payload.title.map(|t| required(Some(t), "title")).transpose()?;
    let description = payload
        .description
        .map(|d| required(Some(d), "description"))
        .transpose()?;

    let content_changed = title.as_ref().is_some_and(|t| *t != current.title)
        || description.as_ref().is_some_and(|d| *d != current.description);
    let categories = if content_changed {
        let t = title.as_deref().unwrap_or(&current.title);
        let d = description.as_deref().unwrap_or(&current.description);
        Some(merge_categories(state.ai.as_ref(), t, d).await)
    } else {
        None
    };

    let post = state
        .posts
        .update(
            id,
            PostChanges {
                title,
                description,
                summary: payload.summary,
                categories,
            },
        )
        .await?
        .ok_or_else(|| not_found(id))?;

    info!(post_id = %id, recategorized = content_changed, "post updated");
    Ok(Json(post))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    owned_post(&state, id, user_id).await?;
    if !state.posts.delete(id).await? {
        return Err(not_found(id));
    }
    info!(post_id = %id, "post deleted");
    Ok(Json(MessageResponse {
        message: "Post deleted successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn vote_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<Json<VoteResponse>> {
    let direction = payload
        .vote_type
        .as_deref()
        .and_then(VoteDirection::parse)
        .ok_or_else(|| AppError::Validation("voteType must be 'up' or 'down'".into()))?;

    let outcome = state
        .posts
        .vote(id, user_id, direction)
        .await?
        .ok_or_else(|| not_found(id))?;

    info!(
        post_id = %id,
        user_id = %user_id,
        direction = ?direction,
        votes = outcome.tally.votes,
        "vote recorded"
    );
    Ok(Json(VoteResponse {
        id,
        message: "Vote recorded",
        votes: outcome.tally.votes,
        upvotes: outcome.tally.upvotes,
        downvotes: outcome.tally.downvotes,
        user_vote: outcome.user_vote,
    }))
}
