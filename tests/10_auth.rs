mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn signup_then_login_roundtrip() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("alice");
    let email = format!("{}@example.com", username);

    let res = client
        .post(format!("{}/signup", server.base_url))
        .json(&json!({ "username": username, "email": email, "password": "pw1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["username"], username.as_str());
    assert!(body["token"].is_string());
    // The credential hash must never appear in any serialized response
    let raw = body.to_string();
    assert!(!raw.contains("password"));
    assert!(!raw.contains("hash"));

    // Wrong password is rejected
    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({ "username": username, "password": "wrong" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Correct password authenticates
    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({ "username": username, "password": "pw1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["username"], username.as_str());
    assert_eq!(body["user"]["role"]["name"], "user");
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_conflicts() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("dupe");
    let email = format!("{}@example.com", username);
    let payload = json!({ "username": username, "email": email, "password": "pw" });

    let res = client.post(format!("{}/signup", server.base_url)).json(&payload).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.post(format!("{}/signup", server.base_url)).json(&payload).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Username already exists");
    Ok(())
}

#[tokio::test]
async fn session_lifecycle() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("sess");
    let res = client
        .post(format!("{}/signup", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "pw"
        }))
        .send()
        .await?;
    let token = res.json::<Value>().await?["token"].as_str().unwrap().to_string();

    // Session resolves to the user
    let res = client
        .get(format!("{}/check_session", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["username"], username.as_str());

    // No session at all
    let res = client.get(format!("{}/check_session", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?["error"], "User not logged in");

    // Logout is idempotent
    let res = client
        .delete(format!("{}/logout", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .delete(format!("{}/logout", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The invalidated token no longer resolves
    let res = client
        .get(format!("{}/check_session", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn assign_role_requires_admin() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Unauthenticated: 401
    let res = client
        .post(format!("{}/assign_role", server.base_url))
        .json(&json!({ "user_id": 1, "role_id": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Plain user: 403
    let username = common::unique("plain");
    let res = client
        .post(format!("{}/signup", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "pw"
        }))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/assign_role", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "role_id": 2 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Admin: 200, and the target's profile reflects the new role
    let admin_name = common::unique("root");
    let res = client
        .post(format!("{}/signup", server.base_url))
        .json(&json!({
            "username": admin_name,
            "email": format!("{}@example.com", admin_name),
            "password": "pw"
        }))
        .send()
        .await?;
    let admin_token = res.json::<Value>().await?["token"].as_str().unwrap().to_string();
    common::set_role(&admin_name, "admin").await?;

    let res = client
        .post(format!("{}/assign_role", server.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "user_id": user_id, "role_id": 2 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/users/{}", server.base_url, user_id))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["role"]["name"], "mod");
    Ok(())
}

#[tokio::test]
async fn account_and_first_session_roll_back_together() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    // The server run applies migrations before we touch the schema directly
    common::ensure_server().await?;
    let pool = common::test_pool().await?;

    let username = common::unique("ghost");
    let mut tx = pool.begin().await?;

    let (user_id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, 'x') RETURNING id",
    )
    .bind(&username)
    .bind(format!("{}@example.com", username))
    .fetch_one(&mut *tx)
    .await?;
    let session = film_club_api::auth::create_session(&mut *tx, user_id).await?;

    // A failure after the user insert must leave no trace of either row
    tx.rollback().await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&username)
        .fetch_one(&pool)
        .await?;
    assert_eq!(users, 0);

    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token = $1")
        .bind(session.token)
        .fetch_one(&pool)
        .await?;
    assert_eq!(sessions, 0);
    Ok(())
}

#[tokio::test]
async fn expired_sessions_are_purged_on_logout() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("stale");
    let res = client
        .post(format!("{}/signup", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "pw"
        }))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_i64().unwrap();

    // Plant a session that expired an hour ago
    let pool = common::test_pool().await?;
    let stale_token = uuid::Uuid::new_v4();
    sqlx::query(
        "INSERT INTO sessions (token, user_id, expires_at) \
         VALUES ($1, $2, now() - interval '1 hour')",
    )
    .bind(stale_token)
    .bind(user_id)
    .execute(&pool)
    .await?;

    let res = client
        .delete(format!("{}/logout", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token = $1")
        .bind(stale_token)
        .fetch_one(&pool)
        .await?;
    assert_eq!(remaining, 0);
    Ok(())
}
