use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::movie::MovieSummary;
use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Rating {
    pub id: i64,
    pub rating: i32,
    pub author_id: i64,
    pub screening_room_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RatingView {
    pub id: i64,
    pub rating: i32,
    pub author_id: i64,
    pub author: UserSummary,
    pub screening_room_id: i64,
    pub created_at: DateTime<Utc>,
    pub movie: MovieSummary,
}

#[derive(Debug, FromRow)]
struct RatingViewRow {
    id: i64,
    rating: i32,
    author_id: i64,
    screening_room_id: i64,
    created_at: DateTime<Utc>,
    author_username: String,
    movie_id: i64,
    movie_title: String,
    movie_poster: Option<String>,
}

impl From<RatingViewRow> for RatingView {
    fn from(row: RatingViewRow) -> Self {
        RatingView {
            id: row.id,
            rating: row.rating,
            author_id: row.author_id,
            author: UserSummary { id: row.author_id, username: row.author_username },
            screening_room_id: row.screening_room_id,
            created_at: row.created_at,
            movie: MovieSummary {
                id: row.movie_id,
                title: row.movie_title,
                poster_image: row.movie_poster,
            },
        }
    }
}

const VIEW_QUERY: &str = "SELECT r.id, r.rating, r.author_id, r.screening_room_id, r.created_at, \
     u.username AS author_username, \
     m.id AS movie_id, m.title AS movie_title, m.poster_image AS movie_poster \
     FROM ratings r \
     JOIN users u ON u.id = r.author_id \
     JOIN screening_rooms sr ON sr.id = r.screening_room_id \
     JOIN movies m ON m.id = sr.movie_id";

impl RatingView {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<RatingView>, sqlx::Error> {
        let row: Option<RatingViewRow> =
            sqlx::query_as(&format!("{} WHERE r.id = $1", VIEW_QUERY))
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(RatingView::from))
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<RatingView>, sqlx::Error> {
        let rows: Vec<RatingViewRow> =
            sqlx::query_as(&format!("{} ORDER BY r.id", VIEW_QUERY))
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(RatingView::from).collect())
    }

    pub async fn for_room(pool: &PgPool, room_id: i64) -> Result<Vec<RatingView>, sqlx::Error> {
        let rows: Vec<RatingViewRow> =
            sqlx::query_as(&format!("{} WHERE r.screening_room_id = $1 ORDER BY r.id", VIEW_QUERY))
                .bind(room_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(RatingView::from).collect())
    }
}

impl Rating {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Rating>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, rating, author_id, screening_room_id, created_at FROM ratings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
