//! Search-engine seam for the todo store.
//!
//! # Design
//! Handlers talk to a `SearchBackend`, never to a concrete engine. The
//! request side is a small typed subset of the OpenSearch query DSL
//! (`match_all`, `term`, `bool`, `multi_match`, a sort, paging and terms
//! aggregations) that serializes to the engine's JSON verbatim, so the same
//! `SearchRequest` drives both `OpenSearchBackend` over HTTP and the
//! in-process `MemoryBackend`.
//!
//! Documents cross the seam as `serde_json::Value`; callers own the typed
//! view.

use std::collections::BTreeMap;
use std::future::Future;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::BackendError;

pub mod memory;
pub mod opensearch;

pub use memory::MemoryBackend;
pub use opensearch::OpenSearchBackend;

/// Persistence and full-text search primitives used by the route handlers.
///
/// `get_document` reports a missing document as `Ok(None)`; every other
/// operation on a missing index or document fails with
/// `BackendError::NotFound`.
pub trait SearchBackend: Clone + Send + Sync + 'static {
    fn index_exists(&self, index: &str) -> impl Future<Output = Result<bool, BackendError>> + Send;

    /// Create `index` with `mappings`. An index that already exists counts
    /// as created, so concurrent first writers all succeed.
    fn create_index(
        &self,
        index: &str,
        mappings: &Value,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Write a new document; fails with `Conflict` if the id is taken.
    fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Value>, BackendError>> + Send;

    /// Merge the top-level fields of `partial` into an existing document.
    fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete_document(
        &self,
        index: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, BackendError>> + Send;
}

/// Mapping for a freshly created todo index. `status` mirrors what dynamic
/// mapping would produce (text plus a `keyword` sub-field) so aggregations
/// on `status.keyword` behave the same on pre-existing indices.
pub fn todo_index_mappings() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "title": { "type": "text" },
                "description": { "type": "text" },
                "status": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
                },
                "createdAt": { "type": "date" }
            }
        }
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MatchAll {},
    Term(Term),
    Bool(BoolQuery),
    MultiMatch(MultiMatch),
}

/// Exact-value match on a single field.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub field: String,
    pub value: String,
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
}

/// Free-text match over several fields. Field names may carry a boost
/// suffix (`title^2`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MultiMatch {
    pub query: String,
    pub fields: Vec<String>,
    #[serde(rename = "type")]
    pub match_type: String,
    pub fuzziness: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl Serialize for SortField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &json!({ "order": self.order }))?;
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Terms { field: String, size: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: Query,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortField>,
    pub from: u64,
    pub size: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aggs: BTreeMap<String, Aggregation>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub doc_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResponse {
    /// Total number of matching documents, independent of paging.
    pub total: u64,
    /// `_source` of each hit on the requested page, in sort order.
    pub hits: Vec<Value>,
    /// Buckets per named terms aggregation.
    pub aggregations: BTreeMap<String, Vec<Bucket>>,
}
