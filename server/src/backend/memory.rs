//! In-process search backend.
//!
//! # Design
//! Indices live in one `Arc<RwLock<HashMap>>`, so every write is a single
//! critical section: an update or delete checks for the document and acts on
//! it under the same lock. Queries are evaluated against `_source` values
//! with a deliberately small analyzer (lowercase alphanumeric tokens) and
//! AUTO fuzziness, which is enough to stand in for the engine in development
//! and tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    Aggregation, Bucket, MultiMatch, Query, SearchBackend, SearchRequest, SearchResponse,
    SortField, SortOrder,
};
use crate::error::BackendError;

#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    indices: Arc<RwLock<HashMap<String, MemoryIndex>>>,
}

#[derive(Debug, Default)]
struct MemoryIndex {
    documents: HashMap<String, StoredDocument>,
    next_seq: u64,
}

#[derive(Debug)]
struct StoredDocument {
    seq: u64,
    source: Value,
}

impl MemoryIndex {
    fn insert(&mut self, id: &str, source: Value) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.documents
            .insert(id.to_string(), StoredDocument { seq, source });
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchBackend for MemoryBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        Ok(self.indices.read().await.contains_key(index))
    }

    async fn create_index(&self, index: &str, _mappings: &Value) -> Result<(), BackendError> {
        self.indices
            .write()
            .await
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), BackendError> {
        let mut indices = self.indices.write().await;
        let index = indices.entry(index.to_string()).or_default();
        if index.documents.contains_key(id) {
            return Err(BackendError::Conflict(format!("document [{id}] already exists")));
        }
        index.insert(id, document.clone());
        Ok(())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, BackendError> {
        let indices = self.indices.read().await;
        let index = indices.get(index).ok_or(BackendError::NotFound)?;
        Ok(index.documents.get(id).map(|doc| doc.source.clone()))
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), BackendError> {
        let mut indices = self.indices.write().await;
        let document = indices
            .get_mut(index)
            .and_then(|index| index.documents.get_mut(id))
            .ok_or(BackendError::NotFound)?;
        if let (Value::Object(target), Value::Object(fields)) = (&mut document.source, partial) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), BackendError> {
        let mut indices = self.indices.write().await;
        indices
            .get_mut(index)
            .and_then(|index| index.documents.remove(id))
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, BackendError> {
        let indices = self.indices.read().await;
        let index = indices.get(index).ok_or(BackendError::NotFound)?;

        let mut matched: Vec<(f64, &StoredDocument)> = index
            .documents
            .values()
            .filter_map(|doc| score(&request.query, &doc.source).map(|s| (s, doc)))
            .collect();
        matched.sort_by(|a, b| compare_hits(&request.sort, a, b));

        let mut aggregations = BTreeMap::new();
        for (name, aggregation) in &request.aggs {
            let Aggregation::Terms { field, size } = aggregation;
            let buckets = terms_buckets(matched.iter().map(|(_, doc)| &doc.source), field, *size);
            aggregations.insert(name.clone(), buckets);
        }

        let hits = matched
            .iter()
            .skip(usize::try_from(request.from).unwrap_or(usize::MAX))
            .take(usize::try_from(request.size).unwrap_or(usize::MAX))
            .map(|(_, doc)| doc.source.clone())
            .collect();

        Ok(SearchResponse {
            total: matched.len() as u64,
            hits,
            aggregations,
        })
    }
}

/// Relevance of `doc` for `query`, or `None` when it does not match.
fn score(query: &Query, doc: &Value) -> Option<f64> {
    match query {
        Query::MatchAll {} => Some(1.0),
        Query::Term(term) => field_text(doc, &term.field)
            .filter(|value| value.eq_ignore_ascii_case(&term.value))
            .map(|_| 0.0),
        Query::Bool(query) => {
            if !query.filter.iter().all(|q| score(q, doc).is_some()) {
                return None;
            }
            if query.must.is_empty() {
                return Some(0.0);
            }
            query
                .must
                .iter()
                .map(|q| score(q, doc))
                .sum::<Option<f64>>()
        }
        Query::MultiMatch(query) => multi_match_score(query, doc),
    }
}

/// `best_fields`: the highest boosted per-field score wins.
fn multi_match_score(query: &MultiMatch, doc: &Value) -> Option<f64> {
    let terms = tokenize(&query.query);
    if terms.is_empty() {
        return None;
    }
    let fuzzy = query.fuzziness.eq_ignore_ascii_case("auto");

    let best = query
        .fields
        .iter()
        .filter_map(|spec| {
            let (field, boost) = parse_boost(spec);
            let tokens = tokenize(&field_text(doc, field)?);
            let hits = terms
                .iter()
                .filter(|term| {
                    tokens
                        .iter()
                        .any(|token| token_matches(term, token, fuzzy))
                })
                .count();
            Some(hits as f64 * boost)
        })
        .fold(0.0_f64, f64::max);

    (best > 0.0).then_some(best)
}

fn parse_boost(spec: &str) -> (&str, f64) {
    match spec.split_once('^') {
        Some((field, boost)) => (field, boost.parse().unwrap_or(1.0)),
        None => (spec, 1.0),
    }
}

fn token_matches(term: &str, token: &str, fuzzy: bool) -> bool {
    if !fuzzy {
        return term == token;
    }
    levenshtein(term, token) <= auto_fuzziness(term.chars().count())
}

/// Edit distance tolerated by `fuzziness: AUTO` for a term of `len` chars.
fn auto_fuzziness(len: usize) -> usize {
    match len {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Text of a top-level field; a `.keyword` sub-field resolves to its parent.
fn field_text(doc: &Value, field: &str) -> Option<String> {
    let field = field.strip_suffix(".keyword").unwrap_or(field);
    match doc.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn compare_hits(
    sort: &[SortField],
    (score_a, a): &(f64, &StoredDocument),
    (score_b, b): &(f64, &StoredDocument),
) -> Ordering {
    let by_fields = sort.iter().fold(Ordering::Equal, |acc, key| {
        acc.then_with(|| {
            let ordering = field_text(&a.source, &key.field).cmp(&field_text(&b.source, &key.field));
            match key.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        })
    });
    let by_score = if sort.is_empty() {
        score_b.total_cmp(score_a)
    } else {
        Ordering::Equal
    };
    by_fields.then(by_score).then_with(|| b.seq.cmp(&a.seq))
}

fn terms_buckets<'a>(docs: impl Iterator<Item = &'a Value>, field: &str, size: u32) -> Vec<Bucket> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for value in docs.filter_map(|doc| field_text(doc, field)) {
        *counts.entry(value).or_default() += 1;
    }
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(key, doc_count)| Bucket { key, doc_count })
        .collect();
    buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count).then_with(|| a.key.cmp(&b.key)));
    buckets.truncate(size as usize);
    buckets
}
