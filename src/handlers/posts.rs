use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::models::{Post, PostView, ScreeningRoom, User};
use crate::validate::FieldErrors;
use crate::AppState;

/// GET /posts
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(PostView::list(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    pub author_id: Option<i64>,
    pub screening_room_id: Option<i64>,
}

/// POST /posts
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields = FieldErrors::new();
    let content = fields.require_str("content", payload.content.as_deref(), "Post content is required");
    let author_id = fields.require_id("author_id", payload.author_id, "Author ID is required");
    let room_id = fields.require_id(
        "screening_room_id",
        payload.screening_room_id,
        "Screening room ID is required",
    );

    if let Some(content) = content {
        fields.check_length(
            "content",
            content,
            1,
            200,
            "Post content length must be between 1 and 200 characters",
        );
    }
    if let Some(author_id) = author_id {
        if User::find(&state.pool, author_id).await?.is_none() {
            fields.add("author_id", "Author not found");
        }
    }
    if let Some(room_id) = room_id {
        if ScreeningRoom::find(&state.pool, room_id).await?.is_none() {
            fields.add("screening_room_id", "Screening room not found");
        }
    }
    fields.finish()?;

    let (Some(content), Some(author_id), Some(room_id)) = (content, author_id, room_id) else {
        return Err(ApiError::bad_request("Invalid post payload"));
    };

    let post: Post = sqlx::query_as(
        "INSERT INTO posts (content, author_id, screening_room_id) VALUES ($1, $2, $3) \
         RETURNING id, content, author_id, screening_room_id, created_at",
    )
    .bind(content)
    .bind(author_id)
    .bind(room_id)
    .fetch_one(&state.pool)
    .await?;

    let view = PostView::find(&state.pool, post.id)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to load created post"))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /posts/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = PostView::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
}

/// PATCH /posts/{id} - author or moderator/admin only
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state, id).await?;
    if !current.can_modify_authored(post.author_id) {
        return Err(ApiError::forbidden("Unauthorized access"));
    }

    if let Some(content) = payload.content.as_deref() {
        let mut fields = FieldErrors::new();
        fields.check_length(
            "content",
            content,
            1,
            200,
            "Post content length must be between 1 and 200 characters",
        );
        fields.finish()?;

        sqlx::query("UPDATE posts SET content = $1 WHERE id = $2")
            .bind(content)
            .bind(id)
            .execute(&state.pool)
            .await?;
    }

    let view = PostView::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(view))
}

/// DELETE /posts/{id} - author or moderator/admin only
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state, id).await?;
    if !current.can_modify_authored(post.author_id) {
        return Err(ApiError::forbidden("Unauthorized access"));
    }

    Post::delete(&state.pool, id).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

async fn find_post(state: &AppState, id: i64) -> Result<Post, ApiError> {
    Post::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}
