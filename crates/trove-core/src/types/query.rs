//! The canonical API query consumed by repositories.
//!
//! Controllers deserialize request parameters into [`QueryParams`] and
//! normalize them with [`ApiQuery::from_params`]; in-process callers use
//! [`ApiQuery::builder`]. Either way the repository only ever sees the
//! canonical [`ApiQuery`].

use std::collections::BTreeMap;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;
use crate::types::access::AccessLevel;
use crate::types::cursor::CursorToken;

/// Where a paged scan starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageCursor {
    /// The first page in canonical order.
    #[default]
    First,
    /// The page following the position held by the token.
    After(CursorToken),
    /// The page preceding the position held by the token.
    Before(CursorToken),
}

impl PageCursor {
    /// Build a cursor from the optional `next`/`previous` tokens of a
    /// request. At most one of them may be set.
    pub fn from_tokens(
        next: Option<CursorToken>,
        previous: Option<CursorToken>,
    ) -> AppResult<Self> {
        match (next, previous) {
            (Some(_), Some(_)) => Err(AppError::repository(
                "A query may carry a next or a previous cursor, not both",
            )),
            (Some(next), None) => Ok(Self::After(next)),
            (None, Some(previous)) => Ok(Self::Before(previous)),
            (None, None) => Ok(Self::First),
        }
    }
}

/// Raw list parameters as a controller receives them.
///
/// Every key that is not a reserved pagination key is treated as an
/// equality filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
    /// Requested page size.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Cursor of the page to continue after.
    #[serde(default)]
    pub next: Option<String>,
    /// Cursor of the page to continue before.
    #[serde(default)]
    pub previous: Option<String>,
    /// Full-text search term.
    #[serde(default)]
    pub search: Option<String>,
    /// Comma separated projection; `-name` excludes a field.
    #[serde(default)]
    pub fields: Option<String>,
    /// Remaining keys, used as filters.
    #[serde(flatten)]
    pub filters: BTreeMap<String, serde_json::Value>,
}

/// Normalized query handed to repository operations.
#[derive(Debug, Clone)]
pub struct ApiQuery {
    /// Structured filter: field name to matcher.
    pub query: Document,
    /// Projection specification.
    pub fields: Document,
    /// Optional full-text search term.
    pub search: Option<String>,
    /// Page size bound, always at least 1.
    pub limit: u32,
    /// Aggregation stages for `aggregate` and `aggregate_paging`.
    pub aggregation: Vec<Document>,
    /// Access level of the caller.
    pub access_level: AccessLevel,
    cursor: PageCursor,
}

impl Default for ApiQuery {
    fn default() -> Self {
        Self {
            query: Document::new(),
            fields: Document::new(),
            search: None,
            limit: QueryConfig::default().default_limit,
            aggregation: Vec::new(),
            access_level: AccessLevel::default(),
            cursor: PageCursor::First,
        }
    }
}

impl ApiQuery {
    /// Create a first-page query over the given filter.
    pub fn new(query: Document) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Start building a query.
    pub fn builder() -> ApiQueryBuilder {
        ApiQueryBuilder::default()
    }

    /// Normalize raw request parameters into a canonical query.
    pub fn from_params(
        params: QueryParams,
        config: &QueryConfig,
        access_level: AccessLevel,
    ) -> AppResult<Self> {
        let mut query = Document::new();
        for (key, value) in params.filters {
            if key.starts_with('$') || contains_operator(&value) {
                return Err(AppError::repository(format!(
                    "Filter '{key}' may not contain query operators"
                )));
            }
            if matches!(&value, serde_json::Value::String(s) if s.trim().is_empty()) {
                continue;
            }
            let value = bson::to_bson(&value).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Repository,
                    format!("Invalid value for filter '{key}'"),
                    e,
                )
            })?;
            query.insert(key, value);
        }

        let fields = match params.fields.as_deref() {
            Some(spec) => parse_fields(spec)?,
            None => Document::new(),
        };

        let cursor = PageCursor::from_tokens(
            non_empty(params.next).map(CursorToken::from),
            non_empty(params.previous).map(CursorToken::from),
        )?;

        Ok(Self {
            query,
            fields,
            search: non_empty(params.search),
            limit: config.clamp_limit(params.limit),
            aggregation: Vec::new(),
            access_level,
            cursor,
        })
    }

    /// Where the scan starts.
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// The `next` cursor, if this query continues forward.
    pub fn next(&self) -> Option<&CursorToken> {
        match &self.cursor {
            PageCursor::After(token) => Some(token),
            _ => None,
        }
    }

    /// The `previous` cursor, if this query continues backward.
    pub fn previous(&self) -> Option<&CursorToken> {
        match &self.cursor {
            PageCursor::Before(token) => Some(token),
            _ => None,
        }
    }

    /// Return a copy of this query positioned at `cursor`.
    pub fn with_cursor(&self, cursor: PageCursor) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }

    /// Projection actually sent to the store.
    ///
    /// `hidden` fields are removed from what the caller may see and
    /// `required` fields (pagination keys) are always returned. `None`
    /// means "return whole documents".
    pub fn effective_projection(&self, required: &[&str], hidden: &[&str]) -> Option<Document> {
        let mut projection = self.fields.clone();
        let inclusive = has_inclusion(&projection);

        if inclusive {
            for field in hidden {
                projection.remove(*field);
            }
            let requires_more = required.iter().any(|field| *field != "_id");
            if !has_inclusion(&projection) && !requires_more {
                // every requested field was hidden; return identities only
                projection.insert("_id", 1);
            }
            for field in required {
                if *field == "_id" {
                    projection.remove("_id");
                } else {
                    projection.insert(*field, 1);
                }
            }
        } else {
            for field in hidden {
                projection.insert(*field, 0);
            }
            for field in required {
                projection.remove(*field);
            }
        }

        (!projection.is_empty()).then_some(projection)
    }
}

/// Builder producing a canonical [`ApiQuery`].
#[derive(Debug, Clone, Default)]
pub struct ApiQueryBuilder {
    query: Document,
    fields: Document,
    search: Option<String>,
    limit: Option<u32>,
    next: Option<CursorToken>,
    previous: Option<CursorToken>,
    aggregation: Vec<Document>,
    access_level: AccessLevel,
    config: QueryConfig,
}

impl ApiQueryBuilder {
    /// Add an equality (or operator document) matcher for `field`.
    pub fn filter(mut self, field: impl Into<String>, matcher: impl Into<Bson>) -> Self {
        self.query.insert(field.into(), matcher.into());
        self
    }

    /// Merge a whole filter document.
    pub fn query(mut self, query: Document) -> Self {
        self.query.extend(query);
        self
    }

    /// Include `field` in the projection.
    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), 1);
        self
    }

    /// Exclude `field` from the projection.
    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), 0);
        self
    }

    /// Set the full-text search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Set the requested page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continue after the page that produced `token`.
    pub fn next(mut self, token: impl Into<CursorToken>) -> Self {
        self.next = Some(token.into());
        self
    }

    /// Continue before the page that produced `token`.
    pub fn previous(mut self, token: impl Into<CursorToken>) -> Self {
        self.previous = Some(token.into());
        self
    }

    /// Append an aggregation stage.
    pub fn stage(mut self, stage: Document) -> Self {
        self.aggregation.push(stage);
        self
    }

    /// Set the caller's access level.
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    /// Use non-default page size bounds.
    pub fn config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and produce the query.
    pub fn build(self) -> AppResult<ApiQuery> {
        let cursor = PageCursor::from_tokens(self.next, self.previous)?;
        Ok(ApiQuery {
            query: self.query,
            fields: self.fields,
            search: non_empty(self.search),
            limit: self.config.clamp_limit(self.limit),
            aggregation: self.aggregation,
            access_level: self.access_level,
            cursor,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn contains_operator(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .any(|(key, inner)| key.starts_with('$') || contains_operator(inner)),
        serde_json::Value::Array(items) => items.iter().any(contains_operator),
        _ => false,
    }
}

fn parse_fields(spec: &str) -> AppResult<Document> {
    let mut projection = Document::new();
    let mut including: Option<bool> = None;

    for raw in spec.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let (name, include) = match raw.strip_prefix('-') {
            Some(name) => (name.trim(), false),
            None => (raw, true),
        };
        if name.is_empty() || name.starts_with('$') {
            return Err(AppError::repository(format!(
                "Invalid projection field '{raw}'"
            )));
        }
        if name != "_id" {
            match including {
                Some(mode) if mode != include => {
                    return Err(AppError::repository(
                        "A projection cannot both include and exclude fields",
                    ));
                }
                _ => including = Some(include),
            }
        }
        projection.insert(name, if include { 1 } else { 0 });
    }

    Ok(projection)
}

fn has_inclusion(projection: &Document) -> bool {
    projection
        .iter()
        .any(|(key, value)| key != "_id" && is_inclusion(value))
}

fn is_inclusion(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn params(json: serde_json::Value) -> QueryParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_from_params_normalizes_filters_and_limits() {
        let config = QueryConfig {
            default_limit: 10,
            max_limit: 100,
        };
        let query = ApiQuery::from_params(
            params(serde_json::json!({
                "limit": 500,
                "search": "  ",
                "next": "",
                "fields": "title, -_id, address",
                "asset": "0xabc",
                "owner": "",
                "block": 12,
            })),
            &config,
            AccessLevel::MEMBER,
        )
        .unwrap();

        assert_eq!(query.limit, 100);
        assert_eq!(query.search, None);
        assert_eq!(query.cursor(), &PageCursor::First);
        assert_eq!(query.query.get_str("asset").unwrap(), "0xabc");
        assert!(!query.query.contains_key("owner"));
        assert!(!query.query.contains_key("limit"));
        assert_eq!(query.fields, doc! { "title": 1, "_id": 0, "address": 1 });
        assert_eq!(query.access_level, AccessLevel::MEMBER);
    }

    #[test]
    fn test_operator_filters_are_rejected() {
        let config = QueryConfig::default();
        let err = ApiQuery::from_params(
            params(serde_json::json!({ "$where": "sleep(100)" })),
            &config,
            AccessLevel::ANONYMOUS,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Repository);

        let err = ApiQuery::from_params(
            params(serde_json::json!({ "title": { "$ne": null } })),
            &config,
            AccessLevel::ANONYMOUS,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Repository);
    }

    #[test]
    fn test_next_and_previous_are_mutually_exclusive() {
        let err = ApiQuery::builder()
            .next("a")
            .previous("b")
            .build()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Repository);

        let query = ApiQuery::builder().previous("b").build().unwrap();
        assert_eq!(query.previous().map(CursorToken::as_str), Some("b"));
        assert!(query.next().is_none());
    }

    #[test]
    fn test_mixed_projection_is_rejected() {
        assert!(parse_fields("title,-description").is_err());
        assert!(parse_fields("-$text").is_err());
    }

    #[test]
    fn test_effective_projection_exclusive() {
        let query = ApiQuery::builder().exclude("timestamp").build().unwrap();
        assert_eq!(
            query.effective_projection(&["timestamp", "_id"], &["email"]),
            Some(doc! { "email": 0 })
        );

        let query = ApiQuery::default();
        assert_eq!(query.effective_projection(&["timestamp", "_id"], &[]), None);
    }

    #[test]
    fn test_effective_projection_inclusive() {
        let query = ApiQuery::builder()
            .include("title")
            .include("email")
            .exclude("_id")
            .build()
            .unwrap();
        assert_eq!(
            query.effective_projection(&["createdOn", "_id"], &["email"]),
            Some(doc! { "title": 1, "createdOn": 1 })
        );

        let query = ApiQuery::builder().include("email").build().unwrap();
        assert_eq!(
            query.effective_projection(&[], &["email"]),
            Some(doc! { "_id": 1 })
        );
    }
}
