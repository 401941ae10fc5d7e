//! Translate a validated `ListQuery` into a backend `SearchRequest`.

use crate::backend::{BoolQuery, MultiMatch, Query, SearchRequest, SortField, SortOrder, Term};
use crate::model::ListQuery;
use crate::stats::status_aggregation;

const TEXT_FIELDS: [&str; 2] = ["title^2", "description"];

/// Newest first, one page of hits, plus the status aggregation.
///
/// Free text and status combine as `bool { must: [text], filter: [term] }`;
/// with neither, everything matches.
pub fn build_search_request(params: &ListQuery) -> SearchRequest {
    let text = params.search.as_ref().map(|search| {
        Query::MultiMatch(MultiMatch {
            query: search.clone(),
            fields: TEXT_FIELDS.iter().map(|f| f.to_string()).collect(),
            match_type: "best_fields".to_string(),
            fuzziness: "AUTO".to_string(),
        })
    });
    let main = text.unwrap_or(Query::MatchAll {});

    let query = match params.status {
        Some(status) => Query::Bool(BoolQuery {
            must: vec![main],
            filter: vec![Query::Term(Term {
                field: "status".to_string(),
                value: status.as_str().to_string(),
            })],
        }),
        None => main,
    };

    SearchRequest {
        query,
        sort: vec![SortField {
            field: "createdAt".to_string(),
            order: SortOrder::Desc,
        }],
        from: params.from(),
        size: u64::from(params.limit()),
        aggs: status_aggregation(),
    }
}
