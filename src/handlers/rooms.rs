use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Capability;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::models::{Club, Movie, ScreeningRoom};
use crate::validate::FieldErrors;
use crate::AppState;

/// GET /rooms
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rooms = ScreeningRoom::list(&state.pool).await?;

    let mut views = Vec::with_capacity(rooms.len());
    for room in rooms {
        views.push(room.view(&state.pool).await?);
    }
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: Option<String>,
    pub club_id: Option<i64>,
    pub movie_id: Option<i64>,
}

/// POST /rooms - requires an existing club and movie
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields = FieldErrors::new();
    let club_id = fields.require_id("club_id", payload.club_id, "Club ID is required");
    let movie_id = fields.require_id("movie_id", payload.movie_id, "Movie ID is required");

    if let Some(club_id) = club_id {
        if Club::find(&state.pool, club_id).await?.is_none() {
            fields.add("club_id", "Club not found");
        }
    }
    if let Some(movie_id) = movie_id {
        if Movie::find(&state.pool, movie_id).await?.is_none() {
            fields.add("movie_id", "Movie not found");
        }
    }
    fields.finish()?;

    let (Some(club_id), Some(movie_id)) = (club_id, movie_id) else {
        return Err(ApiError::bad_request("Invalid screening room payload"));
    };

    let room: ScreeningRoom = sqlx::query_as(
        "INSERT INTO screening_rooms (name, club_id, movie_id) VALUES ($1, $2, $3) \
         RETURNING id, name, club_id, movie_id",
    )
    .bind(payload.name.as_deref())
    .bind(club_id)
    .bind(movie_id)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(room.view(&state.pool).await?)))
}

/// GET /rooms/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let room = find_room(&state, id).await?;
    Ok(Json(room.view(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub club_id: Option<i64>,
    pub movie_id: Option<i64>,
}

/// PATCH /rooms/{id} - club members or admins only
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let room = find_room(&state, id).await?;
    ensure_member_or_admin(&state, &current, room.club_id).await?;

    let mut fields = FieldErrors::new();
    if let Some(club_id) = payload.club_id {
        if Club::find(&state.pool, club_id).await?.is_none() {
            fields.add("club_id", "Club not found");
        }
    }
    if let Some(movie_id) = payload.movie_id {
        if Movie::find(&state.pool, movie_id).await?.is_none() {
            fields.add("movie_id", "Movie not found");
        }
    }
    fields.finish()?;

    // Moving a room into another club requires membership of that club too
    if let Some(club_id) = payload.club_id {
        if club_id != room.club_id {
            ensure_member_or_admin(&state, &current, club_id).await?;
        }
    }

    let updated: ScreeningRoom = sqlx::query_as(
        "UPDATE screening_rooms SET name = $1, club_id = $2, movie_id = $3 WHERE id = $4 \
         RETURNING id, name, club_id, movie_id",
    )
    .bind(payload.name.as_deref().or(room.name.as_deref()))
    .bind(payload.club_id.unwrap_or(room.club_id))
    .bind(payload.movie_id.unwrap_or(room.movie_id))
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(updated.view(&state.pool).await?))
}

/// DELETE /rooms/{id} - club members or admins only; cascades to posts/ratings
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let room = find_room(&state, id).await?;
    ensure_member_or_admin(&state, &current, room.club_id).await?;

    ScreeningRoom::delete(&state.pool, id).await?;
    Ok(Json(json!({ "message": "Screening room deleted successfully" })))
}

async fn find_room(state: &AppState, id: i64) -> Result<ScreeningRoom, ApiError> {
    ScreeningRoom::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Screening room not found"))
}

async fn ensure_member_or_admin(
    state: &AppState,
    current: &CurrentUser,
    club_id: i64,
) -> Result<(), ApiError> {
    if current.capability >= Capability::Admin {
        return Ok(());
    }
    if Club::is_member(&state.pool, club_id, current.id).await? {
        return Ok(());
    }
    Err(ApiError::forbidden("Unauthorized access"))
}
