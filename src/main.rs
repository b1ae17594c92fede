use clap::{Parser, Subcommand};
use film_club_api::{app, config, db, seed, AppState};

#[derive(Parser)]
#[command(name = "film-club-api", about = "Film club backend API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Load demo data into the database
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let cfg = config::config();
    tracing::info!("starting film-club-api in {:?} mode", cfg.environment);

    let pool = db::connect().await?;
    let state = AppState { pool };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let port = config::server_port();
            let bind_addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

            tracing::info!("film-club-api listening on http://{}", bind_addr);
            axum::serve(listener, app(state)).await?;
        }
        Command::Seed => {
            seed::run(&state.pool).await?;
            tracing::info!("seed data loaded");
        }
    }

    Ok(())
}
