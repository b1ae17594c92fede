use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config;

/// Ordered capability tiers. A gate requiring a level passes any caller at or
/// above it: `user < mod < admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    User,
    Mod,
    Admin,
}

impl Capability {
    /// Maps a role name onto a capability. Unknown or missing roles fall back
    /// to the base `user` tier.
    pub fn from_role(role: Option<&str>) -> Self {
        match role {
            Some("admin") => Capability::Admin,
            Some("mod") => Capability::Mod,
            _ => Capability::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::User => "user",
            Capability::Mod => "mod",
            Capability::Admin => "admin",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Derives a salted argon2 hash from a plaintext password. Only the hash is
/// ever persisted.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Verifies a plaintext password against a stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), CredentialError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| CredentialError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| CredentialError::InvalidCredentials)
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Opens a session for a user and returns the opaque bearer token. Takes any
/// executor so callers that create the user and the session together can run
/// both inside one transaction.
pub async fn create_session<'e, E>(executor: E, user_id: i64) -> Result<Session, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let token = Uuid::new_v4();
    let ttl = config::config().auth.session_ttl_hours;
    let expires_at = Utc::now() + Duration::hours(ttl);

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(executor)
        .await?;

    Ok(Session { token, user_id, expires_at })
}

/// Deletes a session if present. Deleting a token that no longer maps to a
/// session is not an error, which makes logout idempotent.
pub async fn delete_session(pool: &PgPool, token: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drops sessions past their expiry. Expired rows are already invisible to
/// lookups; the login and logout paths call this so the table does not grow
/// without bound.
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_tiers_are_strictly_ordered() {
        assert!(Capability::User < Capability::Mod);
        assert!(Capability::Mod < Capability::Admin);
        assert!(Capability::Admin >= Capability::Mod);
        assert!(Capability::Admin >= Capability::User);
    }

    #[test]
    fn capability_names_round_trip_through_from_role() {
        for cap in [Capability::User, Capability::Mod, Capability::Admin] {
            assert_eq!(Capability::from_role(Some(cap.as_str())), cap);
        }
    }

    #[test]
    fn unknown_roles_fall_back_to_user() {
        assert_eq!(Capability::from_role(None), Capability::User);
        assert_eq!(Capability::from_role(Some("janitor")), Capability::User);
        assert_eq!(Capability::from_role(Some("admin")), Capability::Admin);
        assert_eq!(Capability::from_role(Some("mod")), Capability::Mod);
    }

    #[test]
    fn password_roundtrip_verifies_only_the_original() {
        let hash = hash_password("pw1").unwrap();
        assert_ne!(hash, "pw1");
        assert!(verify_password("pw1", &hash).is_ok());
        assert!(verify_password("pw2", &hash).is_err());
    }

    #[test]
    fn hashing_the_same_password_twice_salts_differently() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }
}
