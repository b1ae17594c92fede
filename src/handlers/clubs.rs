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
use crate::models::{Club, User};
use crate::validate::FieldErrors;
use crate::AppState;

const PRIVACY_VALUES: [&str; 2] = ["public", "private"];

/// GET /clubs
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let clubs = Club::list(&state.pool).await?;

    let mut views = Vec::with_capacity(clubs.len());
    for club in clubs {
        views.push(club.view(&state.pool).await?);
    }
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct CreateClubRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy: Option<String>,
}

/// POST /clubs
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateClubRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields = FieldErrors::new();
    let name = fields.require_str("name", payload.name.as_deref(), "Club name is required");
    let description = fields.require_str(
        "description",
        payload.description.as_deref(),
        "Club description is required",
    );
    if let Some(name) = name {
        fields.check_length(
            "name",
            name,
            1,
            50,
            "Club name length must be between 1 and 50 characters",
        );
    }
    if let Some(description) = description {
        fields.check_length(
            "description",
            description,
            1,
            150,
            "Club description length must be between 1 and 150 characters",
        );
    }
    let privacy = payload.privacy.as_deref().unwrap_or("public");
    if !PRIVACY_VALUES.contains(&privacy) {
        fields.add("privacy", "Privacy must be either public or private");
    }
    fields.finish()?;

    let (Some(name), Some(description)) = (name, description) else {
        return Err(ApiError::bad_request("Invalid club payload"));
    };

    if club_name_taken(&state, name, None).await? {
        return Err(ApiError::conflict("Club name already exists"));
    }

    let club: Club = sqlx::query_as(
        "INSERT INTO clubs (name, description, privacy) VALUES ($1, $2, $3) \
         RETURNING id, name, description, privacy",
    )
    .bind(name)
    .bind(description)
    .bind(privacy)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(club.view(&state.pool).await?)))
}

/// GET /clubs/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let club = find_club(&state, id).await?;
    Ok(Json(club.view(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateClubRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy: Option<String>,
}

/// PATCH /clubs/{id} - members or admins only
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateClubRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let club = find_club(&state, id).await?;
    ensure_member_or_admin(&state, &current, club.id).await?;

    let mut fields = FieldErrors::new();
    if let Some(name) = payload.name.as_deref() {
        fields.check_length(
            "name",
            name,
            1,
            50,
            "Club name length must be between 1 and 50 characters",
        );
    }
    if let Some(description) = payload.description.as_deref() {
        fields.check_length(
            "description",
            description,
            1,
            150,
            "Club description length must be between 1 and 150 characters",
        );
    }
    if let Some(privacy) = payload.privacy.as_deref() {
        if !PRIVACY_VALUES.contains(&privacy) {
            fields.add("privacy", "Privacy must be either public or private");
        }
    }
    fields.finish()?;

    if let Some(name) = payload.name.as_deref() {
        if club_name_taken(&state, name, Some(club.id)).await? {
            return Err(ApiError::conflict("Club name already exists"));
        }
    }

    let updated: Club = sqlx::query_as(
        "UPDATE clubs SET name = $1, description = $2, privacy = $3 WHERE id = $4 \
         RETURNING id, name, description, privacy",
    )
    .bind(payload.name.as_deref().unwrap_or(club.name.as_str()))
    .bind(payload.description.as_deref().or(club.description.as_deref()))
    .bind(payload.privacy.as_deref().unwrap_or(club.privacy.as_str()))
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(updated.view(&state.pool).await?))
}

/// DELETE /clubs/{id} - members or admins only; cascades to rooms
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let club = find_club(&state, id).await?;
    ensure_member_or_admin(&state, &current, club.id).await?;

    Club::delete(&state.pool, id).await?;
    Ok(Json(json!({ "message": "Club deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub user_id: Option<i64>,
}

/// POST /clubs/{id}/add_user - idempotent membership add
pub async fn add_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<MembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::bad_request("User ID is required"))?;

    let club = find_club(&state, id).await?;
    let user = User::find(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Club::add_member(&state.pool, club.id, user.id).await?;

    Ok(Json(json!({
        "message": format!("User {} added to club {}", user.username, club.name)
    })))
}

/// POST /clubs/{id}/remove_user
pub async fn remove_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<MembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::bad_request("User ID is required"))?;

    let club = find_club(&state, id).await?;
    let user = User::find(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !Club::remove_member(&state.pool, club.id, user.id).await? {
        return Err(ApiError::bad_request("User is not a member of this club"));
    }

    Ok(Json(json!({
        "message": format!("User {} removed from club {}", user.username, club.name)
    })))
}

async fn find_club(state: &AppState, id: i64) -> Result<Club, ApiError> {
    Club::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Club not found"))
}

/// Mutating a club requires membership or admin capability.
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

async fn club_name_taken(
    state: &AppState,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, ApiError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM clubs WHERE name = $1 AND ($2::bigint IS NULL OR id <> $2)",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_optional(&state.pool)
    .await?;
    Ok(row.is_some())
}
