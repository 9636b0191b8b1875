// src/models/attempt.rs

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'attempts' table: attempts used and left per (user, test).
///
/// `have` starts at the configured maximum; it is decremented on every start
/// and is not clamped by the schema.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub rk_id: i64,
    pub used: i16,
    pub have: i16,
}

impl Attempt {
    pub fn can_start(&self) -> bool {
        self.have > 0
    }
}
