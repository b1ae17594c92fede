use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::club::ClubSummary;
use super::movie::MovieSummary;
use super::post::PostView;
use super::rating::RatingView;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ScreeningRoom {
    pub id: i64,
    pub name: Option<String>,
    pub club_id: i64,
    pub movie_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ScreeningRoomView {
    pub id: i64,
    pub name: Option<String>,
    pub club_id: i64,
    pub movie_id: i64,
    pub club: ClubSummary,
    pub movie: MovieSummary,
    pub posts: Vec<PostView>,
    pub ratings: Vec<RatingView>,
}

const COLUMNS: &str = "id, name, club_id, movie_id";

impl ScreeningRoom {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<ScreeningRoom>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM screening_rooms WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<ScreeningRoom>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM screening_rooms ORDER BY id", COLUMNS))
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM screening_rooms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full view with the owning club, the movie, and the room's posts and
    /// ratings resolved.
    pub async fn view(&self, pool: &PgPool) -> Result<ScreeningRoomView, sqlx::Error> {
        let club: ClubSummary = sqlx::query_as("SELECT id, name FROM clubs WHERE id = $1")
            .bind(self.club_id)
            .fetch_one(pool)
            .await?;

        let movie: MovieSummary =
            sqlx::query_as("SELECT id, title, poster_image FROM movies WHERE id = $1")
                .bind(self.movie_id)
                .fetch_one(pool)
                .await?;

        let posts = PostView::for_room(pool, self.id).await?;
        let ratings = RatingView::for_room(pool, self.id).await?;

        Ok(ScreeningRoomView {
            id: self.id,
            name: self.name.clone(),
            club_id: self.club_id,
            movie_id: self.movie_id,
            club,
            movie,
            posts,
            ratings,
        })
    }
}
