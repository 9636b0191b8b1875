// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testsystem::config::Config;
use testsystem::reviewer::{HttpReviewer, PgReviewer, QueryReviewer, Reviewers, Unconfigured};
use testsystem::routes;
use testsystem::state::AppState;
use testsystem::utils::jwt::ADMIN_ROLE;
use testsystem::utils::password::hash_password;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Postgres may still be starting when the container comes up
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected, running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let state = AppState {
        pool,
        reviewers: build_reviewers(&config),
        config,
    };

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    axum::serve(listener, app).await.expect("Server error");
}

/// Wires the SQL and NoSQL reviewers; a missing or broken setting leaves that
/// side unconfigured, so its questions grade as wrong with a visible error.
fn build_reviewers(config: &Config) -> Reviewers {
    let sql: Arc<dyn QueryReviewer> = match &config.reviewer_database_url {
        Some(url) => match PgReviewer::connect_lazy(url, config.reviewer_timeout) {
            Ok(reviewer) => Arc::new(reviewer),
            Err(e) => {
                tracing::error!("Invalid REVIEWER_DATABASE_URL: {}", e);
                Arc::new(Unconfigured::new("SQL"))
            }
        },
        None => {
            tracing::warn!("REVIEWER_DATABASE_URL not set, SQL questions cannot be graded");
            Arc::new(Unconfigured::new("SQL"))
        }
    };

    let nosql: Arc<dyn QueryReviewer> = match &config.nosql_reviewer_url {
        Some(url) => match HttpReviewer::new(url, config.reviewer_timeout) {
            Ok(reviewer) => Arc::new(reviewer),
            Err(e) => {
                tracing::error!("Invalid NOSQL_REVIEWER_URL: {}", e);
                Arc::new(Unconfigured::new("NoSQL"))
            }
        },
        None => {
            tracing::warn!("NOSQL_REVIEWER_URL not set, NoSQL questions cannot be graded");
            Arc::new(Unconfigured::new("NoSQL"))
        }
    };

    Reviewers::new(sql, nosql)
}

async fn seed_admin_user(
    pool: &PgPool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let user_exists = sqlx::query!("SELECT id FROM users WHERE username = $1", username)
        .fetch_optional(pool)
        .await?;

    if user_exists.is_none() {
        tracing::info!("Seeding admin user: {}", username);
        let hashed_password = hash_password(password)?;

        sqlx::query!(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3)",
            username,
            hashed_password,
            ADMIN_ROLE
        )
        .execute(pool)
        .await?;
    }

    Ok(())
}
