use sqlx::PgPool;
use tracing::info;

use crate::auth;
use crate::models::{Club, Movie, Role};

/// Loads a small demo dataset, replacing whatever is in the content tables.
/// Roles are left alone since the migration owns them.
pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    info!("clearing existing data");
    sqlx::query(
        "TRUNCATE ratings, posts, screening_rooms, club_members, sessions, \
         movie_genres, genres, clubs, movies, users RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;

    info!("seeding users");
    let admin_role = Role::find_by_name(pool, "admin").await?;
    let user_role = Role::find_by_name(pool, "user").await?;

    let admin_id = insert_user(pool, "burdaq", "eileenburdekin@proton.me", "reelydeep", admin_role.map(|r| r.id)).await?;
    let member_id = insert_user(pool, "marlow", "marlow@example.com", "matinee", user_role.map(|r| r.id)).await?;

    info!("seeding movies");
    let movies: [(&str, &str, f64, &[&str]); 4] = [
        ("The Long Reel", "2019-03-14", 42.5, &["Drama", "Mystery"]),
        ("Static Light", "2021-07-02", 61.0, &["Drama", "Romance"]),
        ("Night Projection", "2020-10-30", 38.2, &["Horror", "Mystery"]),
        ("Paper Circles", "2018-05-21", 12.9, &["Documentary"]),
    ];

    let mut movie_ids = Vec::new();
    for (title, release_date, popularity, genres) in movies {
        let mut tx = pool.begin().await?;
        let movie: Movie = sqlx::query_as(
            "INSERT INTO movies (title, release_date, popularity) VALUES ($1, $2, $3) \
             RETURNING id, title, release_date, poster_image, popularity",
        )
        .bind(title)
        .bind(release_date)
        .bind(popularity)
        .fetch_one(&mut *tx)
        .await?;

        let genre_names: Vec<String> = genres.iter().map(|g| g.to_string()).collect();
        Movie::set_genres(&mut tx, movie.id, &genre_names).await?;
        tx.commit().await?;
        movie_ids.push(movie.id);
    }

    info!("seeding clubs and screening rooms");
    let club_id: i64 = sqlx::query_scalar(
        "INSERT INTO clubs (name, description) VALUES ($1, $2) RETURNING id",
    )
    .bind("Sunday Matinee")
    .bind("Weekly screenings and slow arguments about them")
    .fetch_one(pool)
    .await?;

    let room_id: i64 = sqlx::query_scalar(
        "INSERT INTO screening_rooms (name, club_id, movie_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("Opening Night")
    .bind(club_id)
    .bind(movie_ids[0])
    .fetch_one(pool)
    .await?;

    sqlx::query("INSERT INTO screening_rooms (name, club_id, movie_id) VALUES ($1, $2, $3)")
        .bind("Second Feature")
        .bind(club_id)
        .bind(movie_ids[1])
        .execute(pool)
        .await?;

    Club::add_member(pool, club_id, admin_id).await?;
    Club::add_member(pool, club_id, member_id).await?;

    info!("seeding posts and ratings");
    sqlx::query("INSERT INTO posts (content, author_id, screening_room_id) VALUES ($1, $2, $3)")
        .bind("That final shot stayed with me all week.")
        .bind(member_id)
        .bind(room_id)
        .execute(pool)
        .await?;

    sqlx::query("INSERT INTO ratings (rating, author_id, screening_room_id) VALUES ($1, $2, $3)")
        .bind(4)
        .bind(member_id)
        .bind(room_id)
        .execute(pool)
        .await?;

    Ok(())
}

async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
    role_id: Option<i64>,
) -> anyhow::Result<i64> {
    let password_hash = auth::hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, role_id) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(role_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
