//! Route handlers for the todo endpoints.
//!
//! Each handler maps backend outcomes onto a fixed, per-endpoint message.
//! On the single-todo endpoints not-found becomes 404; anything else, and
//! every failure on create and list, is logged and becomes 500.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::backend::{todo_index_mappings, SearchBackend};
use crate::error::{ApiError, BackendError};
use crate::model::{
    CreateTodo, DeleteResponse, GetResponse, ListQuery, ListResponse, Pagination, SearchInfo,
    Todo, TodoResponse, TodoStats, UpdateStatus,
};
use crate::query::build_search_request;
use crate::state::AppState;
use crate::stats::{calculate_stats, STATUS_AGGREGATION};

const TODO_NOT_FOUND: &str = "TO-DO not found";

/// Build a mapper from `BackendError` to `ApiError`: `NotFound` becomes a
/// 404 with `not_found`, everything else is logged and becomes a 500 with
/// `failed`.
fn backend_failure(
    failed: &'static str,
    not_found: &'static str,
) -> impl Fn(BackendError) -> ApiError {
    move |e| match e {
        BackendError::NotFound => {
            debug!("{not_found}");
            ApiError::NotFound(not_found)
        }
        e => internal(failed)(e),
    }
}

/// Like `backend_failure` for endpoints that never answer 404: every
/// backend error is logged and becomes a 500 with `failed`.
fn internal(failed: &'static str) -> impl Fn(BackendError) -> ApiError {
    move |e| {
        error!(error = %e, "{failed}");
        ApiError::Internal(failed)
    }
}

fn parse_todo(document: Value) -> Result<Todo, BackendError> {
    Ok(serde_json::from_value(document)?)
}

pub async fn create_todo<B: SearchBackend>(
    State(state): State<AppState<B>>,
    Json(input): Json<CreateTodo>,
) -> Result<Json<TodoResponse>, ApiError> {
    let fail = internal("Failed to create todo");
    let AppState { backend, index } = &state;

    let todo = Todo::new(input);
    if !backend.index_exists(index).await.map_err(&fail)? {
        backend
            .create_index(index, &todo_index_mappings())
            .await
            .map_err(&fail)?;
    }
    let document = serde_json::to_value(&todo)
        .map_err(BackendError::from)
        .map_err(&fail)?;
    backend
        .create_document(index, &todo.id, &document)
        .await
        .map_err(&fail)?;
    debug!(id = %todo.id, "created todo");

    let stats = calculate_stats(backend, index).await;
    Ok(Json(TodoResponse {
        success: true,
        data: todo,
        stats,
    }))
}

pub async fn list_todos<B: SearchBackend>(
    State(state): State<AppState<B>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    params.validate()?;
    let fail = internal("Failed to get todos");
    let AppState { backend, index } = &state;
    let (page, limit) = (params.page(), params.limit());

    if !backend.index_exists(index).await.map_err(&fail)? {
        return Ok(Json(ListResponse {
            success: true,
            data: Vec::new(),
            pagination: Pagination::new(page, limit, 0),
            search: None,
            stats: TodoStats::default(),
        }));
    }

    let request = build_search_request(&params);
    let response = backend.search(index, &request).await.map_err(&fail)?;
    let data = response
        .hits
        .into_iter()
        .map(parse_todo)
        .collect::<Result<Vec<_>, _>>()
        .map_err(&fail)?;
    let stats = response
        .aggregations
        .get(STATUS_AGGREGATION)
        .map(|buckets| TodoStats::from_buckets(buckets))
        .unwrap_or_default();

    Ok(Json(ListResponse {
        success: true,
        data,
        pagination: Pagination::new(page, limit, response.total),
        search: params.search.map(|query| SearchInfo {
            query,
            results: response.total,
        }),
        stats,
    }))
}

pub async fn get_todo<B: SearchBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    let fail = backend_failure("Failed to get TO-DO", "TO-DO not found.");
    let AppState { backend, index } = &state;

    if !backend.index_exists(index).await.map_err(&fail)? {
        return Err(ApiError::NotFound(TODO_NOT_FOUND));
    }
    let document = backend
        .get_document(index, &id)
        .await
        .map_err(&fail)?
        .ok_or(ApiError::NotFound(TODO_NOT_FOUND))?;

    Ok(Json(GetResponse {
        success: true,
        body: parse_todo(document).map_err(&fail)?,
    }))
}

pub async fn update_status<B: SearchBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatus>,
) -> Result<Json<TodoResponse>, ApiError> {
    let fail = backend_failure("Failed to update todo status", TODO_NOT_FOUND);
    let AppState { backend, index } = &state;

    if !backend.index_exists(index).await.map_err(&fail)? {
        return Err(ApiError::NotFound(TODO_NOT_FOUND));
    }
    // A missing document surfaces as NotFound from the update itself.
    backend
        .update_document(index, &id, &json!({ "status": input.status }))
        .await
        .map_err(&fail)?;
    let document = backend
        .get_document(index, &id)
        .await
        .map_err(&fail)?
        .ok_or(ApiError::NotFound(TODO_NOT_FOUND))?;
    let todo = parse_todo(document).map_err(&fail)?;
    debug!(id = %todo.id, status = todo.status.as_str(), "updated todo status");

    let stats = calculate_stats(backend, index).await;
    Ok(Json(TodoResponse {
        success: true,
        data: todo,
        stats,
    }))
}

pub async fn delete_todo<B: SearchBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let fail = backend_failure("Failed to delete todo", TODO_NOT_FOUND);
    let AppState { backend, index } = &state;

    if !backend.index_exists(index).await.map_err(&fail)? {
        return Err(ApiError::NotFound(TODO_NOT_FOUND));
    }
    backend.delete_document(index, &id).await.map_err(&fail)?;
    debug!(%id, "deleted todo");

    let stats = calculate_stats(backend, index).await;
    Ok(Json(DeleteResponse {
        success: true,
        message: "TO-DO deleted successfully".to_string(),
        deleted_id: id,
        stats,
    }))
}
