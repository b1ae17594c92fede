use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

impl Genre {
    /// Genres attached to a movie, in insertion order (genre id).
    pub async fn for_movie(pool: &PgPool, movie_id: i64) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as(
            "SELECT g.id, g.name FROM genres g \
             JOIN movie_genres mg ON mg.genre_id = g.id \
             WHERE mg.movie_id = $1 ORDER BY g.id",
        )
        .bind(movie_id)
        .fetch_all(pool)
        .await
    }

    /// Finds the genre by name, creating it if absent. The upsert returns the
    /// row in both cases so callers always get an id.
    pub async fn get_or_create(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<Genre, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO genres (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await
    }
}
