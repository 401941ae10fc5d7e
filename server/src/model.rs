//! Wire and storage types for the todo service.
//!
//! # Design
//! `Todo` is both the stored document (`_source`) and the JSON returned to
//! clients, so field names follow the REST contract (`createdAt`). Request
//! payloads reject unknown shapes at the extractor level; range checks that
//! serde cannot express live in `ListQuery::validate`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Planned,
    Completed,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Planned => "planned",
            TodoStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TodoStatus,
    pub created_at: String,
}

impl Todo {
    /// A fresh `planned` todo with a random id, stamped with the current time.
    pub fn new(input: CreateTodo) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            status: TodoStatus::Planned,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatus {
    pub status: TodoStatus,
}

/// Query string accepted by `GET /todos`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TodoStatus>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page == Some(0) {
            return Err(ApiError::BadRequest("page must be at least 1".to_string()));
        }
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIMIT).contains(&limit) {
                return Err(ApiError::BadRequest(format!(
                    "limit must be between 1 and {MAX_LIMIT}"
                )));
            }
        }
        if matches!(self.search.as_deref(), Some("")) {
            return Err(ApiError::BadRequest("search must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Offset of the first hit on the requested page.
    pub fn from(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchInfo {
    pub query: String,
    pub results: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub planned: u64,
    pub completed_percentage: f64,
    pub planned_percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<Todo>,
    pub pagination: Pagination,
    pub search: Option<SearchInfo>,
    pub stats: TodoStats,
}

/// Envelope for create and status-update responses.
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub success: bool,
    pub data: Todo,
    pub stats: TodoStats,
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub success: bool,
    pub body: Todo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_id: String,
    pub stats: TodoStats,
}
