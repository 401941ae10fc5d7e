use std::sync::Arc;

use crate::backend::SearchBackend;

/// Shared handler state: the backend handle and the name of the todo index.
#[derive(Clone, Debug)]
pub struct AppState<B> {
    pub backend: B,
    pub index: Arc<str>,
}

impl<B: SearchBackend> AppState<B> {
    pub fn new(backend: B, index: &str) -> Self {
        Self {
            backend,
            index: Arc::from(index),
        }
    }
}
