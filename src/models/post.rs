use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::movie::MovieSummary;
use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub screening_room_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author: UserSummary,
    pub screening_room_id: i64,
    pub created_at: DateTime<Utc>,
    pub movie: MovieSummary,
}

/// Flat join row; reshaped into the nested view.
#[derive(Debug, FromRow)]
struct PostViewRow {
    id: i64,
    content: String,
    author_id: i64,
    screening_room_id: i64,
    created_at: DateTime<Utc>,
    author_username: String,
    movie_id: i64,
    movie_title: String,
    movie_poster: Option<String>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        PostView {
            id: row.id,
            content: row.content,
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

const VIEW_QUERY: &str = "SELECT p.id, p.content, p.author_id, p.screening_room_id, p.created_at, \
     u.username AS author_username, \
     m.id AS movie_id, m.title AS movie_title, m.poster_image AS movie_poster \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     JOIN screening_rooms sr ON sr.id = p.screening_room_id \
     JOIN movies m ON m.id = sr.movie_id";

impl PostView {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<PostView>, sqlx::Error> {
        let row: Option<PostViewRow> =
            sqlx::query_as(&format!("{} WHERE p.id = $1", VIEW_QUERY))
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(PostView::from))
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<PostView>, sqlx::Error> {
        let rows: Vec<PostViewRow> =
            sqlx::query_as(&format!("{} ORDER BY p.id", VIEW_QUERY))
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }

    pub async fn for_room(pool: &PgPool, room_id: i64) -> Result<Vec<PostView>, sqlx::Error> {
        let rows: Vec<PostViewRow> =
            sqlx::query_as(&format!("{} WHERE p.screening_room_id = $1 ORDER BY p.id", VIEW_QUERY))
                .bind(room_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }

    /// Posts across every screening room showing the given movie.
    pub async fn for_movie(pool: &PgPool, movie_id: i64) -> Result<Vec<PostView>, sqlx::Error> {
        let rows: Vec<PostViewRow> =
            sqlx::query_as(&format!("{} WHERE sr.movie_id = $1 ORDER BY p.id", VIEW_QUERY))
                .bind(movie_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }
}

impl Post {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, content, author_id, screening_room_id, created_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
