//! Synchronous client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that request layer
//! sits `TodoStore`, the client-side list state a UI renders from, plus the
//! small helpers a todo view needs: a search debouncer and relative
//! timestamps.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `TodoStore` reaches the network only through a `Transport` and reports
//!   outcomes only through a `Notifier`, so it runs unchanged under tests.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod debounce;
pub mod error;
pub mod http;
pub mod store;
pub mod time;
pub mod types;

pub use client::{TodoClient, TODOS_PATH};
pub use debounce::{SearchDebouncer, SEARCH_DEBOUNCE};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{LoadState, Notifier, Toast, ToastKind, TodoStore, Transport};
pub use time::{relative_time, relative_time_now};
pub use types::{
    CreateTodo, DeleteTodoResponse, FiltersUpdate, ListTodosResponse, PaginationInfo, SearchInfo,
    Todo, TodoFilters, TodoResponse, TodoStats, TodoStatus,
};
