// src/state.rs

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{config::Config, reviewer::Reviewers};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub reviewers: Reviewers,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Reviewers {
    fn from_ref(state: &AppState) -> Self {
        state.reviewers.clone()
    }
}
