//! REST service for the todo board.
//!
//! # Overview
//! Five JSON endpoints under a configurable base path (default
//! `/api/custom_plugin`) create, list/search, fetch, re-status and delete
//! todos stored in a search-engine index, returning completed/planned
//! statistics alongside every mutation.
//!
//! # Design
//! - Handlers are generic over `SearchBackend`; the binary picks
//!   `OpenSearchBackend` when a URL is configured and `MemoryBackend`
//!   otherwise. Tests drive the router with either or with a double.
//! - Listing delegates filtering, fuzzy text matching, paging and the
//!   status aggregation to the backend through one `SearchRequest`.
//! - Failures never leak backend detail: they are logged and answered with
//!   a fixed message per endpoint.

use std::future::Future;

use axum::{
    routing::{delete, get, patch},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod query;
pub mod state;
pub mod stats;

pub use backend::{MemoryBackend, OpenSearchBackend, SearchBackend};
pub use config::ServerConfig;
pub use error::{ApiError, BackendError};
pub use model::{Todo, TodoStats, TodoStatus};
pub use state::AppState;

pub const DEFAULT_BASE_PATH: &str = "/api/custom_plugin";
pub const DEFAULT_INDEX: &str = "todos";

/// Router with the todo routes mounted under `base_path`.
pub fn app<B: SearchBackend>(state: AppState<B>, base_path: &str) -> Router {
    let todos = Router::new()
        .route(
            "/todos",
            get(handlers::list_todos::<B>).post(handlers::create_todo::<B>),
        )
        .route("/todos/{id}/todo", get(handlers::get_todo::<B>))
        .route("/todos/{id}/status", patch(handlers::update_status::<B>))
        .route("/todos/{id}/delete", delete(handlers::delete_todo::<B>))
        .with_state(state);

    let base_path = base_path.trim_matches('/');
    let router = if base_path.is_empty() {
        Router::new().merge(todos)
    } else {
        Router::new().nest(&format!("/{base_path}"), todos)
    };
    router.layer(TraceLayer::new_for_http())
}

/// Default routes over a fresh in-memory index.
pub fn memory_app() -> Router {
    app(
        AppState::new(MemoryBackend::new(), DEFAULT_INDEX),
        DEFAULT_BASE_PATH,
    )
}

pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
