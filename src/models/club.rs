use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::movie::MovieSummary;
use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub privacy: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClubSummary {
    pub id: i64,
    pub name: String,
}

/// Screening room nested inside a club view: the room id and its movie.
#[derive(Debug, Serialize)]
pub struct ClubRoom {
    pub id: i64,
    pub movie: MovieSummary,
}

#[derive(Debug, Serialize)]
pub struct ClubView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub privacy: String,
    pub members: Vec<UserSummary>,
    pub screening_rooms: Vec<ClubRoom>,
}

const COLUMNS: &str = "id, name, description, privacy";

impl Club {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Club>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM clubs WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Club>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM clubs ORDER BY id", COLUMNS))
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clubs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_member(pool: &PgPool, club_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1::bigint FROM club_members WHERE club_id = $1 AND user_id = $2",
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.is_some())
    }

    /// Adds a membership. The insert is a no-op when the pair already exists,
    /// so repeating an add never changes cardinality.
    pub async fn add_member(pool: &PgPool, club_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO club_members (user_id, club_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(club_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Removes a membership; returns false when no row existed.
    pub async fn remove_member(pool: &PgPool, club_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM club_members WHERE user_id = $1 AND club_id = $2")
            .bind(user_id)
            .bind(club_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full view with members and screening rooms resolved.
    pub async fn view(&self, pool: &PgPool) -> Result<ClubView, sqlx::Error> {
        let members: Vec<UserSummary> = sqlx::query_as(
            "SELECT u.id, u.username FROM users u \
             JOIN club_members cm ON cm.user_id = u.id \
             WHERE cm.club_id = $1 ORDER BY u.id",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;

        let rooms: Vec<(i64, i64, String, Option<String>)> = sqlx::query_as(
            "SELECT sr.id, m.id, m.title, m.poster_image FROM screening_rooms sr \
             JOIN movies m ON m.id = sr.movie_id \
             WHERE sr.club_id = $1 ORDER BY sr.id",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;

        Ok(ClubView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            privacy: self.privacy.clone(),
            members,
            screening_rooms: rooms
                .into_iter()
                .map(|(id, movie_id, title, poster_image)| ClubRoom {
                    id,
                    movie: MovieSummary { id: movie_id, title, poster_image },
                })
                .collect(),
        })
    }
}
