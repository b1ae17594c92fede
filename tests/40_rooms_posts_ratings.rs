mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct Fixture {
    club_id: i64,
    movie_id: i64,
    room_id: i64,
    author_id: i64,
    author_token: String,
}

async fn build_fixture(base_url: &str) -> Result<Fixture> {
    let client = reqwest::Client::new();

    let username = common::unique("author");
    let res = client
        .post(format!("{}/signup", base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "pw"
        }))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let author_id = body["user"]["id"].as_i64().unwrap();
    let author_token = body["token"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/clubs", base_url))
        .json(&json!({ "name": common::unique("fixture_club"), "description": "fixtures" }))
        .send()
        .await?;
    let club_id = res.json::<Value>().await?["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/movies", base_url))
        .json(&json!({ "title": common::unique("Fixture Film") }))
        .send()
        .await?;
    let movie_id = res.json::<Value>().await?["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/rooms", base_url))
        .json(&json!({ "club_id": club_id, "movie_id": movie_id, "name": "fixture room" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let room_id = res.json::<Value>().await?["id"].as_i64().unwrap();

    Ok(Fixture { club_id, movie_id, room_id, author_id, author_token })
}

#[tokio::test]
async fn room_creation_validates_targets() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/rooms", server.base_url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["club_id"], "Club ID is required");
    assert_eq!(body["error"]["movie_id"], "Movie ID is required");

    let res = client
        .post(format!("{}/rooms", server.base_url))
        .json(&json!({ "club_id": 999999, "movie_id": 999999 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["club_id"], "Club not found");
    assert_eq!(body["error"]["movie_id"], "Movie not found");
    Ok(())
}

#[tokio::test]
async fn post_roundtrip_and_ownership() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let fx = build_fixture(&server.base_url).await?;

    // Content bounds
    let res = client
        .post(format!("{}/posts", server.base_url))
        .json(&json!({
            "content": "x".repeat(201),
            "author_id": fx.author_id,
            "screening_room_id": fx.room_id
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/posts", server.base_url))
        .json(&json!({
            "content": "great pick",
            "author_id": fx.author_id,
            "screening_room_id": fx.room_id
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let post = res.json::<Value>().await?;
    let post_id = post["id"].as_i64().unwrap();
    assert_eq!(post["content"], "great pick");
    assert_eq!(post["author"]["id"], fx.author_id);

    // The post is visible through the movie's post feed
    let res = client
        .get(format!("{}/movies/{}/posts", server.base_url, fx.movie_id))
        .send()
        .await?;
    let feed = res.json::<Value>().await?;
    assert!(feed.as_array().unwrap().iter().any(|p| p["id"].as_i64() == Some(post_id)));

    // A different authenticated user cannot edit it
    let intruder = common::unique("intruder");
    let res = client
        .post(format!("{}/signup", server.base_url))
        .json(&json!({
            "username": intruder,
            "email": format!("{}@example.com", intruder),
            "password": "pw"
        }))
        .send()
        .await?;
    let intruder_token = res.json::<Value>().await?["token"].as_str().unwrap().to_string();

    let res = client
        .patch(format!("{}/posts/{}", server.base_url, post_id))
        .bearer_auth(&intruder_token)
        .json(&json!({ "content": "vandalized" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The author can
    let res = client
        .patch(format!("{}/posts/{}", server.base_url, post_id))
        .bearer_auth(&fx.author_token)
        .json(&json!({ "content": "great pick, on reflection" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["content"], "great pick, on reflection");

    let res = client
        .delete(format!("{}/posts/{}", server.base_url, post_id))
        .bearer_auth(&fx.author_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn rating_bounds_and_average() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let fx = build_fixture(&server.base_url).await?;

    // Out of range
    let res = client
        .post(format!("{}/ratings", server.base_url))
        .json(&json!({
            "rating": 6,
            "author_id": fx.author_id,
            "screening_room_id": fx.room_id
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?["error"]["rating"],
        "Rating must be between 1 and 5"
    );

    for value in [3, 5] {
        let res = client
            .post(format!("{}/ratings", server.base_url))
            .json(&json!({
                "rating": value,
                "author_id": fx.author_id,
                "screening_room_id": fx.room_id
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/movies/{}/average-rating", server.base_url, fx.movie_id))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["count"], 2);
    assert_eq!(body["average"], 4.0);
    Ok(())
}

#[tokio::test]
async fn moving_a_room_requires_target_club_membership() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let fx = build_fixture(&server.base_url).await?;

    // Member of the room's current club only
    client
        .post(format!("{}/clubs/{}/add_user", server.base_url, fx.club_id))
        .json(&json!({ "user_id": fx.author_id }))
        .send()
        .await?;

    let res = client
        .post(format!("{}/clubs", server.base_url))
        .json(&json!({ "name": common::unique("target_club"), "description": "elsewhere" }))
        .send()
        .await?;
    let target_club_id = res.json::<Value>().await?["id"].as_i64().unwrap();

    // Re-pointing the room at a club the caller does not belong to is refused
    let res = client
        .patch(format!("{}/rooms/{}", server.base_url, fx.room_id))
        .bearer_auth(&fx.author_token)
        .json(&json!({ "club_id": target_club_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // After joining the target club the same move succeeds
    client
        .post(format!("{}/clubs/{}/add_user", server.base_url, target_club_id))
        .json(&json!({ "user_id": fx.author_id }))
        .send()
        .await?;

    let res = client
        .patch(format!("{}/rooms/{}", server.base_url, fx.room_id))
        .bearer_auth(&fx.author_token)
        .json(&json!({ "club_id": target_club_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["club"]["id"], target_club_id);
    Ok(())
}

#[tokio::test]
async fn room_deletion_cascades_to_posts() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let fx = build_fixture(&server.base_url).await?;

    let res = client
        .post(format!("{}/posts", server.base_url))
        .json(&json!({
            "content": "soon to be orphaned",
            "author_id": fx.author_id,
            "screening_room_id": fx.room_id
        }))
        .send()
        .await?;
    let post_id = res.json::<Value>().await?["id"].as_i64().unwrap();

    // Deleting the room needs club membership
    client
        .post(format!("{}/clubs/{}/add_user", server.base_url, fx.club_id))
        .json(&json!({ "user_id": fx.author_id }))
        .send()
        .await?;

    let res = client
        .delete(format!("{}/rooms/{}", server.base_url, fx.room_id))
        .bearer_auth(&fx.author_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{}/posts/{}", server.base_url, post_id)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
