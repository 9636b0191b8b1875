// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

/// Minutes a student has to finish one attempt.
pub const DEFAULT_TIME_FOR_ATTEMPT: i64 = 90;

/// Attempts granted per user and test.
pub const DEFAULT_ATTEMPTS_MAX: i16 = 3;

pub const DEFAULT_JWT_EXPIRATION: u64 = 24 * 60 * 60;

pub const DEFAULT_REVIEWER_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub time_for_attempt: i64,
    pub attempts_max: i16,
    /// Sandbox database student SQL runs against.
    pub reviewer_database_url: Option<String>,
    /// Base URL of the remote NoSQL reviewer.
    pub nosql_reviewer_url: Option<String>,
    pub reviewer_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION").unwrap_or(DEFAULT_JWT_EXPIRATION),
            rust_log,
            admin_username: optional_var("ADMIN_USERNAME"),
            admin_password: optional_var("ADMIN_PASSWORD"),
            time_for_attempt: parse_var("TIME_FOR_ATTEMPT").unwrap_or(DEFAULT_TIME_FOR_ATTEMPT),
            attempts_max: parse_var("ATTEMPTS_MAX").unwrap_or(DEFAULT_ATTEMPTS_MAX),
            reviewer_database_url: optional_var("REVIEWER_DATABASE_URL"),
            nosql_reviewer_url: optional_var("NOSQL_REVIEWER_URL"),
            reviewer_timeout: Duration::from_millis(
                parse_var("REVIEWER_TIMEOUT_MS").unwrap_or(DEFAULT_REVIEWER_TIMEOUT_MS),
            ),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Unset means default; a value that does not parse stops startup.
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    parse_value(name, optional_var(name))
}

fn parse_value<T: FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    raw.map(|raw| {
        raw.trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a number, got {:?}", name, raw))
    })
}
