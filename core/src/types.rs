//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the server's JSON contract but are defined
//! independently of the server crate; the integration test catches schema
//! drift between the two. Response envelopes default their `stats` so a
//! server that omits them still parses.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single todo item returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TodoStatus,
    pub created_at: String,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request payload for `PATCH /todos/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub status: TodoStatus,
}

/// Query parameters for listing; unset fields are left out of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TodoStatus>,
    pub search: Option<String>,
}

impl Default for TodoFilters {
    fn default() -> Self {
        Self {
            page: Some(DEFAULT_PAGE),
            limit: Some(DEFAULT_LIMIT),
            status: None,
            search: None,
        }
    }
}

/// A partial change to `TodoFilters`. `status` and `search` are two-level
/// options: `Some(None)` clears the filter, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltersUpdate {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<Option<TodoStatus>>,
    pub search: Option<Option<String>>,
}

impl FiltersUpdate {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn status(status: Option<TodoStatus>) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Set the free-text search; empty input clears it.
    pub fn search(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            search: Some((!text.is_empty()).then_some(text)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Default for PaginationInfo {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            total: 0,
            total_pages: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub planned: u64,
    pub completed_percentage: f64,
    pub planned_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub query: String,
    pub results: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListTodosResponse {
    pub success: bool,
    pub data: Vec<Todo>,
    pub pagination: PaginationInfo,
    #[serde(default)]
    pub search: Option<SearchInfo>,
    #[serde(default)]
    pub stats: TodoStats,
}

/// Envelope returned by create and status update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TodoResponse {
    pub success: bool,
    pub data: Todo,
    #[serde(default)]
    pub stats: TodoStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetTodoResponse {
    pub success: bool,
    pub body: Todo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTodoResponse {
    pub success: bool,
    pub message: String,
    pub deleted_id: String,
    #[serde(default)]
    pub stats: TodoStats,
}
