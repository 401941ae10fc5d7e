//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateTodo, DeleteTodoResponse, GetTodoResponse, ListTodosResponse, Todo, TodoFilters,
    TodoResponse, TodoStatus, UpdateStatus,
};

/// Route prefix of the todo endpoints on the server.
pub const TODOS_PATH: &str = "/api/custom_plugin/todos";

/// Characters escaped in an id path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn todos_url(&self) -> String {
        format!("{}{TODOS_PATH}", self.base_url)
    }

    fn todo_url(&self, id: &str, action: &str) -> String {
        let id = utf8_percent_encode(id, SEGMENT);
        format!("{}/{id}/{action}", self.todos_url())
    }

    /// `GET /todos` with only the filters that are set.
    pub fn build_list_todos(&self, filters: &TodoFilters) -> HttpRequest {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = filters.page {
            query.append_pair("page", &page.to_string());
        }
        if let Some(limit) = filters.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(status) = filters.status {
            query.append_pair("status", status.as_str());
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("search", search);
        }
        let query = query.finish();

        let path = if query.is_empty() {
            self.todos_url()
        } else {
            format!("{}?{query}", self.todos_url())
        };
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_todo(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.todo_url(id, "todo"),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.todos_url(),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update_status(
        &self,
        id: &str,
        status: TodoStatus,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Patch,
            path: self.todo_url(id, "status"),
            headers: json_headers(),
            body: Some(to_json(&UpdateStatus { status })?),
        })
    }

    pub fn build_delete_todo(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.todo_url(id, "delete"),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<ListTodosResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json::<GetTodoResponse>(response).map(|r| r.body)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<TodoResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_status(&self, response: HttpResponse) -> Result<TodoResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<DeleteTodoResponse, ApiError> {
        parse_json(response)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        404 => Err(ApiError::NotFound {
            message: error_message(&response.body),
        }),
        status => Err(ApiError::Http {
            status,
            message: error_message(&response.body),
        }),
    }
}

/// The `message` field of a JSON error body, else the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
