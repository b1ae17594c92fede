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
use crate::models::{Rating, RatingView, ScreeningRoom, User};
use crate::validate::FieldErrors;
use crate::AppState;

const RATING_RANGE_MESSAGE: &str = "Rating must be between 1 and 5";

/// GET /ratings
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(RatingView::list(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub rating: Option<i32>,
    pub author_id: Option<i64>,
    pub screening_room_id: Option<i64>,
}

/// POST /ratings
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields = FieldErrors::new();
    let author_id = fields.require_id("author_id", payload.author_id, "Author ID is required");
    let room_id = fields.require_id(
        "screening_room_id",
        payload.screening_room_id,
        "Screening room ID is required",
    );

    let rating = match payload.rating {
        Some(value) => {
            fields.check_range("rating", value, 1, 5, RATING_RANGE_MESSAGE);
            Some(value)
        }
        None => {
            fields.add("rating", "Rating is required");
            None
        }
    };

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

    let (Some(rating), Some(author_id), Some(room_id)) = (rating, author_id, room_id) else {
        return Err(ApiError::bad_request("Invalid rating payload"));
    };

    let created: Rating = sqlx::query_as(
        "INSERT INTO ratings (rating, author_id, screening_room_id) VALUES ($1, $2, $3) \
         RETURNING id, rating, author_id, screening_room_id, created_at",
    )
    .bind(rating)
    .bind(author_id)
    .bind(room_id)
    .fetch_one(&state.pool)
    .await?;

    let view = RatingView::find(&state.pool, created.id)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to load created rating"))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /ratings/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = RatingView::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rating not found"))?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub rating: Option<i32>,
}

/// PATCH /ratings/{id} - author or moderator/admin only
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = find_rating(&state, id).await?;
    if !current.can_modify_authored(rating.author_id) {
        return Err(ApiError::forbidden("Unauthorized access"));
    }

    if let Some(value) = payload.rating {
        let mut fields = FieldErrors::new();
        fields.check_range("rating", value, 1, 5, RATING_RANGE_MESSAGE);
        fields.finish()?;

        sqlx::query("UPDATE ratings SET rating = $1 WHERE id = $2")
            .bind(value)
            .bind(id)
            .execute(&state.pool)
            .await?;
    }

    let view = RatingView::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rating not found"))?;
    Ok(Json(view))
}

/// DELETE /ratings/{id} - author or moderator/admin only
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = find_rating(&state, id).await?;
    if !current.can_modify_authored(rating.author_id) {
        return Err(ApiError::forbidden("Unauthorized access"));
    }

    Rating::delete(&state.pool, id).await?;
    Ok(Json(json!({ "message": "Rating deleted successfully" })))
}

async fn find_rating(state: &AppState, id: i64) -> Result<Rating, ApiError> {
    Rating::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rating not found"))
}
