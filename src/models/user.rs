use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::club::ClubSummary;
use super::role::Role;

/// Database row. The credential hash stays inside the crate; serialization
/// always goes through [`UserProfile`] or [`UserSummary`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub role_id: Option<i64>,
}

/// Minimal projection used when nesting users inside other views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub role: Option<Role>,
    pub clubs: Vec<ClubSummary>,
}

const COLUMNS: &str = "id, username, email, password_hash, bio, location, role_id";

impl User {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM users WHERE username = $1", COLUMNS))
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", COLUMNS))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM users ORDER BY id", COLUMNS))
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full profile view with role and club memberships resolved.
    pub async fn profile(&self, pool: &PgPool) -> Result<UserProfile, sqlx::Error> {
        let role = match self.role_id {
            Some(role_id) => Role::find(pool, role_id).await?,
            None => None,
        };

        let clubs: Vec<ClubSummary> = sqlx::query_as(
            "SELECT c.id, c.name FROM clubs c \
             JOIN club_members cm ON cm.club_id = c.id \
             WHERE cm.user_id = $1 ORDER BY c.id",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;

        Ok(UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            role,
            clubs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serialization_never_exposes_credentials() {
        let profile = UserProfile {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            bio: None,
            location: None,
            role: Some(Role { id: 1, name: "user".into() }),
            clubs: vec![],
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
