use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, CredentialError};
use crate::error::ApiError;
use crate::middleware::auth::{bearer_token, CurrentUser};
use crate::models::{Role, User};
use crate::validate::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /signup - create an account and open a session
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields = FieldErrors::new();
    let username = fields.require_str("username", payload.username.as_deref(), "Username is required");
    let email = fields.require_str("email", payload.email.as_deref(), "Email is required");
    let password = fields.require_str("password", payload.password.as_deref(), "Password is required");
    fields.finish()?;

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(ApiError::bad_request("Invalid signup payload"));
    };

    if User::find_by_username(&state.pool, username).await?.is_some() {
        return Err(ApiError::conflict("Username already exists"));
    }
    if User::find_by_email(&state.pool, email).await?.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password_hash = auth::hash_password(password).map_err(internal_credential_error)?;

    let default_role = Role::find_by_name(&state.pool, "user").await?;

    // The account and its first session commit together or not at all
    let mut tx = state.pool.begin().await?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, role_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, username, email, password_hash, bio, location, role_id",
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(default_role.map(|r| r.id))
    .fetch_one(&mut *tx)
    .await?;

    let session = auth::create_session(&mut *tx, user.id).await?;
    tx.commit().await?;

    let profile = user.profile(&state.pool).await?;

    tracing::info!(user_id = user.id, "new user signed up");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": profile, "token": session.token })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /login - authenticate and open a session
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(password)) = (payload.username.as_deref(), payload.password.as_deref())
    else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    let user = User::find_by_username(&state.pool, username)
        .await?
        .ok_or_else(bad_credentials)?;

    match auth::verify_password(password, &user.password_hash) {
        Ok(()) => {}
        Err(CredentialError::InvalidCredentials) => return Err(bad_credentials()),
        Err(err) => return Err(internal_credential_error(err)),
    }

    auth::purge_expired_sessions(&state.pool).await?;

    let session = auth::create_session(&state.pool, user.id).await?;
    let profile = user.profile(&state.pool).await?;

    Ok(Json(json!({ "user": profile, "token": session.token })))
}

/// GET /check_session - profile of the caller's session user
pub async fn check_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = User::find(&state.pool, current.id)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;
    Ok(Json(user.profile(&state.pool).await?))
}

/// DELETE /logout - drop the session if the token maps to one; always 204
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        auth::delete_session(&state.pool, token).await?;
    }
    auth::purge_expired_sessions(&state.pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: Option<i64>,
    pub role_id: Option<i64>,
}

/// POST /assign_role - admin-only role assignment
pub async fn assign_role(
    State(state): State<AppState>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(user_id), Some(role_id)) = (payload.user_id, payload.role_id) else {
        return Err(ApiError::bad_request("User ID and Role ID are required"));
    };

    let user = User::find(&state.pool, user_id).await?;
    let role = Role::find(&state.pool, role_id).await?;

    let (Some(user), Some(role)) = (user, role) else {
        return Err(ApiError::not_found("User or Role not found"));
    };

    sqlx::query("UPDATE users SET role_id = $1 WHERE id = $2")
        .bind(role.id)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(user_id = user.id, role = %role.name, "role assigned");

    Ok(Json(json!({
        "message": format!("Role {} assigned to user {}", role.name, user.username)
    })))
}

fn bad_credentials() -> ApiError {
    ApiError::Unauthenticated("Bad username or password".to_string())
}

fn internal_credential_error(err: CredentialError) -> ApiError {
    tracing::error!("credential processing failed: {}", err);
    ApiError::internal("An error occurred while processing your request")
}
