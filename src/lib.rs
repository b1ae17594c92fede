use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod seed;
pub mod validate;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes(state.clone()))
        .merge(movie_routes())
        .merge(user_routes(state.clone()))
        .merge(club_routes(state.clone()))
        .merge(room_routes(state.clone()))
        .merge(post_routes(state.clone()))
        .merge(rating_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use axum::handler::Handler;
    use axum::routing::{delete, post};
    use handlers::auth;
    use middleware::auth::{require_admin, require_user};

    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route(
            "/check_session",
            get(auth::check_session.layer(from_fn_with_state(state.clone(), require_user))),
        )
        .route("/logout", delete(auth::logout))
        .route(
            "/assign_role",
            post(auth::assign_role.layer(from_fn_with_state(state, require_admin))),
        )
}

fn movie_routes() -> Router<AppState> {
    use handlers::movies;

    Router::new()
        .route("/movies", get(movies::list).post(movies::create))
        .route(
            "/movies/:id",
            get(movies::get).patch(movies::update).delete(movies::delete),
        )
        .route("/movies/:id/similar", get(movies::similar))
        .route("/movies/:id/average-rating", get(movies::average_rating))
        .route("/movies/:id/posts", get(movies::posts))
}

fn user_routes(state: AppState) -> Router<AppState> {
    use handlers::{roles, users};
    use middleware::auth::require_admin;

    Router::new()
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get).delete(users::delete))
        .route("/roles", get(roles::list))
        .route_layer(from_fn_with_state(state, require_admin))
}

fn club_routes(state: AppState) -> Router<AppState> {
    use axum::handler::Handler;
    use axum::routing::post;
    use handlers::clubs;
    use middleware::auth::require_user;

    Router::new()
        .route("/clubs", get(clubs::list).post(clubs::create))
        .route(
            "/clubs/:id",
            get(clubs::get)
                .patch(clubs::update.layer(from_fn_with_state(state.clone(), require_user)))
                .delete(clubs::delete.layer(from_fn_with_state(state, require_user))),
        )
        .route("/clubs/:id/add_user", post(clubs::add_user))
        .route("/clubs/:id/remove_user", post(clubs::remove_user))
}

fn room_routes(state: AppState) -> Router<AppState> {
    use axum::handler::Handler;
    use handlers::rooms;
    use middleware::auth::require_user;

    Router::new()
        .route("/rooms", get(rooms::list).post(rooms::create))
        .route(
            "/rooms/:id",
            get(rooms::get)
                .patch(rooms::update.layer(from_fn_with_state(state.clone(), require_user)))
                .delete(rooms::delete.layer(from_fn_with_state(state, require_user))),
        )
}

fn post_routes(state: AppState) -> Router<AppState> {
    use axum::handler::Handler;
    use handlers::posts;
    use middleware::auth::require_user;

    Router::new()
        .route("/posts", get(posts::list).post(posts::create))
        .route(
            "/posts/:id",
            get(posts::get)
                .patch(posts::update.layer(from_fn_with_state(state.clone(), require_user)))
                .delete(posts::delete.layer(from_fn_with_state(state, require_user))),
        )
}

fn rating_routes(state: AppState) -> Router<AppState> {
    use axum::handler::Handler;
    use handlers::ratings;
    use middleware::auth::require_user;

    Router::new()
        .route("/ratings", get(ratings::list).post(ratings::create))
        .route(
            "/ratings/:id",
            get(ratings::get)
                .patch(ratings::update.layer(from_fn_with_state(state.clone(), require_user)))
                .delete(ratings::delete.layer(from_fn_with_state(state, require_user))),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Film Club API",
        "version": version,
        "endpoints": {
            "auth": "/signup, /login, /check_session, /logout, /assign_role (admin)",
            "movies": "/movies[/:id], /movies/:id/similar, /movies/:id/average-rating, /movies/:id/posts",
            "users": "/users[/:id] (admin), /roles (admin)",
            "clubs": "/clubs[/:id], /clubs/:id/add_user, /clubs/:id/remove_user",
            "rooms": "/rooms[/:id]",
            "posts": "/posts[/:id]",
            "ratings": "/ratings[/:id]",
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match db::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}
