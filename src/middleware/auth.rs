use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Capability;
use crate::error::ApiError;
use crate::AppState;

/// Caller identity resolved once at the request boundary and injected as a
/// request extension. Handlers never touch session state directly.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub capability: Capability,
}

impl CurrentUser {
    /// Author-or-moderator rule for mutating posts and ratings.
    pub fn can_modify_authored(&self, author_id: i64) -> bool {
        self.id == author_id || self.capability >= Capability::Mod
    }
}

/// Gate requiring any authenticated caller.
pub async fn require_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(state, request, next, Capability::User).await
}

/// Gate requiring moderator capability or above.
pub async fn require_mod(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(state, request, next, Capability::Mod).await
}

/// Gate requiring admin capability.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(state, request, next, Capability::Admin).await
}

async fn gate(
    state: AppState,
    mut request: Request,
    next: Next,
    level: Capability,
) -> Result<Response, ApiError> {
    let current = resolve_identity(&state.pool, request.headers()).await?;

    if current.capability < level {
        tracing::warn!(
            user_id = current.id,
            capability = current.capability.as_str(),
            required = level.as_str(),
            "capability check failed"
        );
        return Err(ApiError::forbidden("Unauthorized access"));
    }

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

/// Resolves the bearer token to a user in a single joined lookup. Missing or
/// expired sessions are indistinguishable to the caller.
async fn resolve_identity(pool: &PgPool, headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let token = bearer_token(headers).ok_or_else(ApiError::unauthenticated)?;

    let row: Option<(i64, String, Option<String>)> = sqlx::query_as(
        "SELECT u.id, u.username, r.name \
         FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         LEFT JOIN roles r ON r.id = u.role_id \
         WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let (id, username, role) = row.ok_or_else(ApiError::unauthenticated)?;

    Ok(CurrentUser {
        id,
        username,
        capability: Capability::from_role(role.as_deref()),
    })
}

/// Extracts the session token from an `Authorization: Bearer <uuid>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|t| Uuid::parse_str(t.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_parses_uuid() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));
    }

    #[test]
    fn bearer_token_rejects_malformed_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-uuid"),
        );
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn author_or_moderator_can_modify() {
        let author = CurrentUser { id: 1, username: "a".into(), capability: Capability::User };
        let other = CurrentUser { id: 2, username: "b".into(), capability: Capability::User };
        let moderator = CurrentUser { id: 3, username: "m".into(), capability: Capability::Mod };

        assert!(author.can_modify_authored(1));
        assert!(!other.can_modify_authored(1));
        assert!(moderator.can_modify_authored(1));
    }
}
