//! OpenSearch REST backend.
//!
//! Speaks the plain document and search APIs over `reqwest`. Writes pass
//! `refresh=true` so a subsequent search (the stats aggregation in
//! particular) observes them.

use std::collections::BTreeMap;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Bucket, SearchBackend, SearchRequest, SearchResponse};
use crate::error::BackendError;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct OpenSearchBackend {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl OpenSearchBackend {
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            credentials,
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        }
    }
}

impl SearchBackend for OpenSearchBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        let response = self.request(Method::HEAD, self.url(&[index])).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(engine_error(response).await),
        }
    }

    async fn create_index(&self, index: &str, mappings: &Value) -> Result<(), BackendError> {
        debug!(index, "creating index");
        let response = self
            .request(Method::PUT, self.url(&[index]))
            .json(mappings)
            .send()
            .await?;
        match expect_success(response).await {
            Err(BackendError::Engine { body, .. }) if is_already_exists(&body) => {
                debug!(index, "index already exists");
                Ok(())
            }
            result => result.map(|_| ()),
        }
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), BackendError> {
        let mut url = self.url(&[index, "_create", id]);
        url.set_query(Some("refresh=true"));
        let response = self.request(Method::PUT, url).json(document).send().await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(BackendError::Conflict(id.to_string()));
        }
        expect_success(response).await.map(|_| ())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, BackendError> {
        let response = self
            .request(Method::GET, self.url(&[index, "_doc", id]))
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // A missing document answers `{"found": false}`; a missing index
            // answers with an error object instead.
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return match body.get("found") {
                Some(Value::Bool(false)) => Ok(None),
                _ => Err(BackendError::NotFound),
            };
        }
        let body = expect_success(response).await?;
        parse_get_response(body)
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), BackendError> {
        let mut url = self.url(&[index, "_update", id]);
        url.set_query(Some("refresh=true"));
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "doc": partial }))
            .send()
            .await?;
        expect_success(response).await.map(|_| ())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), BackendError> {
        let mut url = self.url(&[index, "_doc", id]);
        url.set_query(Some("refresh=true"));
        let response = self.request(Method::DELETE, url).send().await?;
        expect_success(response).await.map(|_| ())
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, BackendError> {
        debug!(index, from = request.from, size = request.size, "searching");
        let response = self
            .request(Method::POST, self.url(&[index, "_search"]))
            .json(request)
            .send()
            .await?;
        let body = expect_success(response).await?;
        parse_search_response(body)
    }
}

/// Body of a 2xx response as JSON (`Null` when empty); 404 becomes
/// `NotFound`, any other status an `Engine` error.
async fn expect_success(response: Response) -> Result<Value, BackendError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound);
    }
    if !status.is_success() {
        return Err(engine_error(response).await);
    }
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn engine_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Engine { status, body }
}

/// Whether an error body is the engine's `resource_already_exists_exception`.
fn is_already_exists(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/type")?.as_str().map(str::to_string))
        .is_some_and(|kind| kind == "resource_already_exists_exception")
}

#[derive(Deserialize)]
struct RawGet {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

fn parse_get_response(body: Value) -> Result<Option<Value>, BackendError> {
    let raw: RawGet = serde_json::from_value(body)?;
    Ok(if raw.found { raw.source } else { None })
}

#[derive(Deserialize)]
struct RawSearch {
    hits: RawHits,
    #[serde(default)]
    aggregations: BTreeMap<String, RawAggregation>,
}

#[derive(Deserialize)]
struct RawHits {
    total: RawTotal,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// `hits.total` is an object since Elasticsearch 7 and a bare count before.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Object { value: u64 },
    Count(u64),
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_source")]
    source: Value,
}

#[derive(Deserialize)]
struct RawAggregation {
    #[serde(default)]
    buckets: Vec<RawBucket>,
}

#[derive(Deserialize)]
struct RawBucket {
    key: Value,
    doc_count: u64,
}

fn parse_search_response(body: Value) -> Result<SearchResponse, BackendError> {
    let raw: RawSearch = serde_json::from_value(body)?;
    let total = match raw.hits.total {
        RawTotal::Object { value } | RawTotal::Count(value) => value,
    };
    let aggregations = raw
        .aggregations
        .into_iter()
        .map(|(name, agg)| {
            let buckets = agg
                .buckets
                .into_iter()
                .map(|b| Bucket {
                    key: match b.key {
                        Value::String(s) => s,
                        other => other.to_string(),
                    },
                    doc_count: b.doc_count,
                })
                .collect();
            (name, buckets)
        })
        .collect();
    Ok(SearchResponse {
        total,
        hits: raw.hits.hits.into_iter().map(|h| h.source).collect(),
        aggregations,
    })
}
