use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::ApiError;
use crate::models::User;
use crate::AppState;

/// GET /users - admin only
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = User::list(&state.pool).await?;

    let mut profiles = Vec::with_capacity(users.len());
    for user in users {
        profiles.push(user.profile(&state.pool).await?);
    }
    Ok(Json(profiles))
}

/// GET /users/{id} - admin only
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = User::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.profile(&state.pool).await?))
}

/// DELETE /users/{id} - admin only; cascades to posts, ratings, memberships
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !User::delete(&state.pool, id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
