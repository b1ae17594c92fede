use axum::{extract::State, response::IntoResponse, Json};

use crate::error::ApiError;
use crate::models::Role;
use crate::AppState;

/// GET /roles - admin only
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(Role::list(&state.pool).await?))
}
