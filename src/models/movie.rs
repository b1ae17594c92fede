use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::club::ClubSummary;
use super::genre::Genre;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_image: Option<String>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_image: Option<String>,
}

/// Screening room nested inside a movie view: just the room id and its club.
#[derive(Debug, Serialize)]
pub struct MovieRoom {
    pub id: i64,
    pub club: ClubSummary,
}

#[derive(Debug, Serialize)]
pub struct MovieView {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_image: Option<String>,
    pub popularity: Option<f64>,
    pub genres: Vec<Genre>,
    pub screening_rooms: Vec<MovieRoom>,
}

/// How many rows the similar-movies endpoint returns at most.
const SIMILAR_LIMIT: i64 = 5;

const COLUMNS: &str = "id, title, release_date, poster_image, popularity";

impl Movie {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM movies WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists movies, optionally narrowed by a case-insensitive substring match
    /// on the title.
    pub async fn list(pool: &PgPool, title_filter: Option<&str>) -> Result<Vec<Movie>, sqlx::Error> {
        match title_filter {
            Some(fragment) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM movies WHERE title ILIKE $1 ORDER BY id",
                    COLUMNS
                ))
                .bind(format!("%{}%", fragment))
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as(&format!("SELECT {} FROM movies ORDER BY id", COLUMNS))
                    .fetch_all(pool)
                    .await
            }
        }
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replaces the movie's genre set with the given names, creating genres as
    /// needed. Duplicate names collapse to one link.
    pub async fn set_genres(
        tx: &mut Transaction<'_, Postgres>,
        movie_id: i64,
        genre_names: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut **tx)
            .await?;

        for name in genre_names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let genre = Genre::get_or_create(tx, name).await?;
            sqlx::query(
                "INSERT INTO movie_genres (movie_id, genre_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(movie_id)
            .bind(genre.id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Other movies sharing at least one of this movie's first two genres,
    /// ordered by popularity then id so results are reproducible.
    pub async fn similar(pool: &PgPool, movie_id: i64) -> Result<Vec<Movie>, sqlx::Error> {
        let genre_ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT genre_id FROM movie_genres WHERE movie_id = $1 ORDER BY genre_id LIMIT 2",
        )
        .bind(movie_id)
        .fetch_all(pool)
        .await?;

        if genre_ids.is_empty() {
            return Ok(vec![]);
        }
        let genre_ids: Vec<i64> = genre_ids.into_iter().map(|(id,)| id).collect();

        sqlx::query_as(&format!(
            "SELECT DISTINCT {cols} FROM movies m \
             JOIN movie_genres mg ON mg.movie_id = m.id \
             WHERE mg.genre_id = ANY($1) AND m.id <> $2 \
             ORDER BY m.popularity DESC NULLS LAST, m.id ASC \
             LIMIT $3",
            cols = "m.id, m.title, m.release_date, m.poster_image, m.popularity"
        ))
        .bind(&genre_ids)
        .bind(movie_id)
        .bind(SIMILAR_LIMIT)
        .fetch_all(pool)
        .await
    }

    /// Mean rating across all the movie's screening rooms. `None` means no
    /// ratings exist, which is distinct from an average of zero.
    pub async fn average_rating(
        pool: &PgPool,
        movie_id: i64,
    ) -> Result<(Option<f64>, i64), sqlx::Error> {
        let (average, count): (Option<f64>, i64) = sqlx::query_as(
            "SELECT AVG(r.rating)::float8, COUNT(r.id) FROM ratings r \
             JOIN screening_rooms sr ON sr.id = r.screening_room_id \
             WHERE sr.movie_id = $1",
        )
        .bind(movie_id)
        .fetch_one(pool)
        .await?;
        Ok((average, count))
    }

    /// Full view with genres and screening rooms resolved.
    pub async fn view(&self, pool: &PgPool) -> Result<MovieView, sqlx::Error> {
        let genres = Genre::for_movie(pool, self.id).await?;

        let rooms: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT sr.id, c.id, c.name FROM screening_rooms sr \
             JOIN clubs c ON c.id = sr.club_id \
             WHERE sr.movie_id = $1 ORDER BY sr.id",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;

        Ok(MovieView {
            id: self.id,
            title: self.title.clone(),
            release_date: self.release_date.clone(),
            poster_image: self.poster_image.clone(),
            popularity: self.popularity,
            genres,
            screening_rooms: rooms
                .into_iter()
                .map(|(id, club_id, club_name)| MovieRoom {
                    id,
                    club: ClubSummary { id: club_id, name: club_name },
                })
                .collect(),
        })
    }
}
