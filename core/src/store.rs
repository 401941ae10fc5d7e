//! Client-side todo state driven by a filter set.
//!
//! # Design
//! `TodoStore` is the explicit form of a UI data-fetch hook: one struct owns
//! the visible items, pagination, stats, filters and load state, and every
//! operation mutates it through `&mut self`. The store never performs I/O
//! itself; it builds requests with `TodoClient`, hands them to a host
//! `Transport`, and reports outcomes to a `Notifier` as toasts.
//!
//! Mutations update local state optimistically where the result is known
//! up front (status change, delete) and reconcile with the server response.
//! Any failed mutation reloads the authoritative list from the server.

use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{
    CreateTodo, FiltersUpdate, PaginationInfo, Todo, TodoFilters, TodoStats, TodoStatus,
};

/// Executes a plain-data request on behalf of the store.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub text: String,
}

impl Toast {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: "Success".to_string(),
            text: text.into(),
        }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Danger,
            title: "Error".to_string(),
            text: text.into(),
        }
    }
}

/// Receives user-facing notifications.
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, toast: Toast) {
        (**self).notify(toast)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

pub struct TodoStore<T, N> {
    client: TodoClient,
    transport: T,
    notifier: N,
    todos: Vec<Todo>,
    state: LoadState,
    pagination: PaginationInfo,
    filters: TodoFilters,
    stats: TodoStats,
}

impl<T: Transport, N: Notifier> TodoStore<T, N> {
    /// An idle store with default filters; call `load_todos` to fetch.
    pub fn new(client: TodoClient, transport: T, notifier: N) -> Self {
        Self {
            client,
            transport,
            notifier,
            todos: Vec::new(),
            state: LoadState::Idle,
            pagination: PaginationInfo::default(),
            filters: TodoFilters::default(),
            stats: TodoStats::default(),
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn pagination(&self) -> &PaginationInfo {
        &self.pagination
    }

    pub fn filters(&self) -> &TodoFilters {
        &self.filters
    }

    pub fn stats(&self) -> &TodoStats {
        &self.stats
    }

    /// Fetch the current page for the active filters. Returns whether the
    /// fetch succeeded.
    pub fn load_todos(&mut self) -> bool {
        self.state = LoadState::Loading;

        let request = self.client.build_list_todos(&self.filters);
        let result = self
            .transport
            .execute(request)
            .and_then(|response| self.client.parse_list_todos(response));

        match result {
            Ok(response) => {
                debug!(count = response.data.len(), total = response.pagination.total, "loaded todos");
                self.todos = response.data;
                self.pagination = response.pagination;
                self.stats = response.stats;
                self.state = LoadState::Loaded;
                true
            }
            Err(e) => {
                warn!(error = %e, "loading todos failed");
                let message = message_or(&e, "Failed to load TO-DOs");
                self.notifier.notify(Toast::danger(message.clone()));
                self.state = LoadState::Error(message);
                false
            }
        }
    }

    pub fn create_todo(&mut self, input: CreateTodo) -> bool {
        let result = self
            .client
            .build_create_todo(&input)
            .and_then(|request| self.transport.execute(request))
            .and_then(|response| self.client.parse_create_todo(response));

        match result {
            Ok(response) if response.success => {
                self.notifier
                    .notify(Toast::success("TO-DO created successfully"));
                self.todos.insert(0, response.data);
                self.pagination.total += 1;
                self.stats = response.stats;
                true
            }
            Ok(_) => {
                self.load_todos();
                false
            }
            Err(e) => self.recover(e, "Failed to create TO-DO"),
        }
    }

    pub fn update_status(&mut self, id: &str, status: TodoStatus) -> bool {
        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.status = status;
        }

        let result = self
            .client
            .build_update_status(id, status)
            .and_then(|request| self.transport.execute(request))
            .and_then(|response| self.client.parse_update_status(response));

        match result {
            Ok(response) if response.success => {
                self.notifier
                    .notify(Toast::success(format!("TO-DO marked as {status}")));
                if let Some(todo) = self.todos.iter_mut().find(|t| t.id == response.data.id) {
                    *todo = response.data;
                }
                self.stats = response.stats;
                true
            }
            Ok(_) => {
                self.load_todos();
                false
            }
            Err(e) => self.recover(e, "Failed to update TO-DO"),
        }
    }

    pub fn delete_todo(&mut self, id: &str) -> bool {
        self.todos.retain(|t| t.id != id);
        self.pagination.total = self.pagination.total.saturating_sub(1);

        let request = self.client.build_delete_todo(id);
        let result = self
            .transport
            .execute(request)
            .and_then(|response| self.client.parse_delete_todo(response));

        match result {
            Ok(response) if response.success => {
                self.notifier
                    .notify(Toast::success("TO-DO deleted successfully"));
                self.stats = response.stats;
                true
            }
            Ok(_) => {
                self.load_todos();
                false
            }
            Err(e) => self.recover(e, "Failed to delete TO-DO"),
        }
    }

    /// Merge `update` into the filters and re-fetch. The page resets to 1
    /// unless the update names one.
    pub fn update_filters(&mut self, update: FiltersUpdate) -> bool {
        if let Some(limit) = update.limit {
            self.filters.limit = Some(limit);
        }
        if let Some(status) = update.status {
            self.filters.status = status;
        }
        if let Some(search) = update.search {
            self.filters.search = search;
        }
        self.filters.page = Some(update.page.unwrap_or(1));
        self.load_todos()
    }

    /// Reload authoritative state after a failed mutation and report it.
    fn recover(&mut self, error: ApiError, fallback: &str) -> bool {
        warn!(error = %error, "{fallback}");
        self.load_todos();
        self.notifier.notify(Toast::danger(message_or(&error, fallback)));
        false
    }
}

fn message_or(error: &ApiError, fallback: &str) -> String {
    error
        .server_message()
        .unwrap_or(fallback)
        .to_string()
}
