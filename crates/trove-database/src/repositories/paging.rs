//! Cursor pagination planning.
//!
//! Turns a [`PaginationPolicy`] plus an [`ApiQuery`] into the filter, sort
//! and fetch size of one page, and turns the fetched documents back into a
//! [`PagedResult`]. Nothing here touches the store.
//!
//! Documents whose sort key is missing or null sort before every value in
//! ascending scans and after every value in descending scans, so the
//! cursor clauses treat null explicitly.

use mongodb::bson::{Bson, Document, doc};

use trove_core::error::AppError;
use trove_core::result::AppResult;
use trove_core::types::{ApiQuery, CursorToken, PageCursor, PagedResult, SortDirection};
use trove_entity::fields::ID;

/// Sort key and direction of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPolicy {
    field: String,
    direction: SortDirection,
}

impl PaginationPolicy {
    /// Declare the pagination field and direction.
    ///
    /// Fails with a developer error when `field` cannot be used as a sort
    /// key.
    pub fn new(field: impl Into<String>, ascending: bool) -> AppResult<Self> {
        let field = field.into();
        if field.trim().is_empty() || field.starts_with('$') || field.split('.').any(str::is_empty)
        {
            return Err(AppError::developer(format!(
                "'{field}' is not a usable pagination field"
            )));
        }
        Ok(Self {
            field,
            direction: SortDirection::from_ascending(ascending),
        })
    }

    /// The pagination field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Canonical sort direction of pages.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Fields every paged projection must keep to build cursors.
    pub fn required_fields(&self) -> [&str; 2] {
        [self.field.as_str(), ID]
    }

    fn sort(&self, direction: SortDirection) -> Document {
        let mut sort = Document::new();
        sort.insert(self.field.as_str(), direction.as_order());
        if self.field != ID {
            sort.insert(ID, direction.as_order());
        }
        sort
    }
}

/// Store-facing shape of one page request.
#[derive(Debug, Clone)]
pub(crate) struct PagePlan {
    /// Caller filter combined with the cursor clause.
    pub filter: Document,
    /// Sort of the scan as executed (reversed for backward pages).
    pub sort: Document,
    /// Documents to fetch: one more than the page holds.
    pub fetch: i64,
    limit: usize,
    backward: bool,
    resumed: bool,
}

/// Plan the page of `query` over documents matching `base_filter`.
pub(crate) fn plan(
    policy: &PaginationPolicy,
    query: &ApiQuery,
    base_filter: Document,
) -> AppResult<PagePlan> {
    let (token, backward) = match query.cursor() {
        PageCursor::First => (None, false),
        PageCursor::After(token) => (Some(token), false),
        PageCursor::Before(token) => (Some(token), true),
    };
    let scan = if backward {
        policy.direction().reversed()
    } else {
        policy.direction()
    };

    let filter = match token {
        Some(token) => {
            let position = token.decode()?;
            let clause = after_clause(policy.field(), scan, position.value, position.id);
            and(base_filter, clause)
        }
        None => base_filter,
    };

    let limit = query.limit.max(1) as usize;
    Ok(PagePlan {
        filter,
        sort: policy.sort(scan),
        fetch: limit as i64 + 1,
        limit,
        backward,
        resumed: token.is_some(),
    })
}

/// Turn the documents fetched for `plan` into a page in canonical order.
pub(crate) fn assemble(
    policy: &PaginationPolicy,
    plan: &PagePlan,
    mut documents: Vec<Document>,
) -> AppResult<PagedResult<Document>> {
    let overflow = documents.len() > plan.limit;
    documents.truncate(plan.limit);
    if plan.backward {
        documents.reverse();
    }

    let (more_before, more_after) = if plan.backward {
        (overflow, true)
    } else {
        (plan.resumed, overflow)
    };

    // An empty page has no boundary to resume from, so neither flag may be
    // set without the token that follows it.
    let previous = match documents.first() {
        Some(first) if more_before => Some(token_for(policy, first)?),
        _ => None,
    };
    let next = match documents.last() {
        Some(last) if more_after => Some(token_for(policy, last)?),
        _ => None,
    };

    Ok(PagedResult {
        has_previous: previous.is_some(),
        has_next: next.is_some(),
        results: documents,
        previous,
        next,
    })
}

/// Resolve a dotted path inside a document.
pub(crate) fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// AND two filters, skipping empty ones.
pub(crate) fn and(left: Document, right: Document) -> Document {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right,
        (_, true) => left,
        _ => doc! { "$and": [left, right] },
    }
}

fn token_for(policy: &PaginationPolicy, document: &Document) -> AppResult<CursorToken> {
    let id = document
        .get(ID)
        .ok_or_else(|| AppError::repository("Paged documents must carry an _id"))?;
    let value = lookup_path(document, policy.field())
        .cloned()
        .unwrap_or(Bson::Null);
    CursorToken::encode(&value, id)
}

/// Documents strictly after `(value, id)` when scanning in `scan` order.
fn after_clause(field: &str, scan: SortDirection, value: Bson, id: Bson) -> Document {
    let op = scan.after_operator();
    if field == ID {
        return doc! { ID: { op: id } };
    }

    let mut same_value_later_id = Document::new();
    same_value_later_id.insert(field, value.clone());
    same_value_later_id.insert(ID, doc! { op: id });

    let mut branches = vec![Bson::Document(same_value_later_id)];
    match (value, scan) {
        (Bson::Null, SortDirection::Asc) => {
            let mut any_value = Document::new();
            any_value.insert(field, doc! { "$ne": Bson::Null });
            branches.push(Bson::Document(any_value));
        }
        (Bson::Null, SortDirection::Desc) => {}
        (value, scan) => {
            let mut later_value = Document::new();
            later_value.insert(field, doc! { op: value });
            branches.push(Bson::Document(later_value));
            if scan == SortDirection::Desc {
                let mut null_value = Document::new();
                null_value.insert(field, Bson::Null);
                branches.push(Bson::Document(null_value));
            }
        }
    }

    doc! { "$or": branches }
}
