// src/models/rk.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::html::text_to_html;

/// Represents the 'rks' table: a named test made of questions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rk {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Only active tests can be started by students.
    pub is_active: bool,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// An active test as listed to a student, with the caller's attempt counters.
#[derive(Debug, Serialize, FromRow)]
pub struct RkListItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub used: i16,
    pub have: i16,
}

impl RkListItem {
    pub fn with_html(self) -> RkView {
        RkView {
            description_html: text_to_html(&self.description),
            item: self,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RkView {
    #[serde(flatten)]
    pub item: RkListItem,
    pub description_html: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRkRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
}

/// DTO for updating a test. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRkRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
