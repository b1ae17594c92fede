use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::models::{Movie, PostView};
use crate::validate::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovieListQuery {
    pub title: Option<String>,
}

/// GET /movies - list, optionally filtered by title substring
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movies = Movie::list(&state.pool, query.title.as_deref()).await?;

    let mut views = Vec::with_capacity(movies.len());
    for movie in movies {
        views.push(movie.view(&state.pool).await?);
    }
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub poster_image: Option<String>,
    pub popularity: Option<f64>,
    pub genres: Option<Vec<String>>,
}

/// POST /movies
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields = FieldErrors::new();
    let title = fields.require_str("title", payload.title.as_deref(), "Title is required");
    fields.finish()?;
    let Some(title) = title else {
        return Err(ApiError::bad_request("Invalid movie payload"));
    };

    let mut tx = state.pool.begin().await?;

    let movie: Movie = sqlx::query_as(
        "INSERT INTO movies (title, release_date, poster_image, popularity) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, title, release_date, poster_image, popularity",
    )
    .bind(title)
    .bind(payload.release_date.as_deref())
    .bind(payload.poster_image.as_deref())
    .bind(payload.popularity)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(genres) = &payload.genres {
        Movie::set_genres(&mut tx, movie.id, genres).await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(movie.view(&state.pool).await?)))
}

/// GET /movies/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = find_movie(&state, id).await?;
    Ok(Json(movie.view(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub poster_image: Option<String>,
    pub popularity: Option<f64>,
    pub genres: Option<Vec<String>>,
}

/// PATCH /movies/{id} - partial update; only supplied fields change
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = find_movie(&state, id).await?;

    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            let mut fields = FieldErrors::new();
            fields.add("title", "Title is required");
            fields.finish()?;
        }
    }

    let mut tx = state.pool.begin().await?;

    let updated: Movie = sqlx::query_as(
        "UPDATE movies SET title = $1, release_date = $2, poster_image = $3, popularity = $4 \
         WHERE id = $5 \
         RETURNING id, title, release_date, poster_image, popularity",
    )
    .bind(payload.title.as_deref().unwrap_or(movie.title.as_str()))
    .bind(payload.release_date.as_deref().or(movie.release_date.as_deref()))
    .bind(payload.poster_image.as_deref().or(movie.poster_image.as_deref()))
    .bind(payload.popularity.or(movie.popularity))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(genres) = &payload.genres {
        Movie::set_genres(&mut tx, id, genres).await?;
    }

    tx.commit().await?;

    Ok(Json(updated.view(&state.pool).await?))
}

/// DELETE /movies/{id} - cascades to screening rooms, posts and ratings
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !Movie::delete(&state.pool, id).await? {
        return Err(ApiError::not_found("Movie not found"));
    }
    Ok(Json(json!({ "message": "Movie deleted successfully" })))
}

/// GET /movies/{id}/similar - movies sharing the first two genres
pub async fn similar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    find_movie(&state, id).await?;
    let similar = Movie::similar(&state.pool, id).await?;
    Ok(Json(similar))
}

/// GET /movies/{id}/average-rating
///
/// `average` is null when the movie has no ratings at all; `count` lets
/// clients tell "no data" apart from a real average.
pub async fn average_rating(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    find_movie(&state, id).await?;
    let (average, count) = Movie::average_rating(&state.pool, id).await?;
    Ok(Json(json!({
        "movie_id": id,
        "average": average,
        "count": count,
    })))
}

/// GET /movies/{id}/posts - posts across all the movie's screening rooms
pub async fn posts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    find_movie(&state, id).await?;
    Ok(Json(PostView::for_movie(&state.pool, id).await?))
}

async fn find_movie(state: &AppState, id: i64) -> Result<Movie, ApiError> {
    Movie::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie not found"))
}
