//! Generic repository shared by every entity.
//!
//! [`BaseRepository`] implements CRUD, cursor-paged find/search,
//! aggregation and existence checks once, parameterized over the entity
//! type. Every store failure is logged with its operation context and
//! returned as a repository error; nothing from the driver leaks out raw.

use std::fmt;

use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::results::InsertOneResult;
use mongodb::{Collection, IndexModel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use trove_core::error::{AppError, ErrorKind};
use trove_core::result::AppResult;
use trove_core::types::{ApiQuery, PagedResult};
use trove_entity::fields::{CREATED_BY, CREATED_ON, ID};
use trove_entity::{Entity, PaginatedEntity};

use crate::connection::DatabaseClient;
use crate::repositories::paging::{self, PagePlan, PaginationPolicy};

/// Repository over the collection of `T`.
///
/// The collection handle is bound on first use and cached for the
/// lifetime of the repository.
#[derive(Debug, Clone)]
pub struct BaseRepository<T: Entity> {
    db: DatabaseClient,
    pagination: Option<PaginationPolicy>,
    collection: OnceCell<Collection<T>>,
}

impl<T: Entity> BaseRepository<T> {
    /// Create a repository without pagination support.
    pub fn new(db: DatabaseClient) -> Self {
        Self {
            db,
            pagination: None,
            collection: OnceCell::new(),
        }
    }

    /// Create a repository paginating by `policy`.
    pub fn with_pagination(db: DatabaseClient, policy: PaginationPolicy) -> Self {
        Self {
            pagination: Some(policy),
            ..Self::new(db)
        }
    }

    /// Name of the bound collection.
    pub fn collection_name(&self) -> &'static str {
        T::COLLECTION
    }

    /// The pagination policy, if one was declared.
    pub fn pagination_policy(&self) -> Option<&PaginationPolicy> {
        self.pagination.as_ref()
    }

    /// Return the typed collection handle, binding it on first use.
    pub async fn collection(&self) -> AppResult<&Collection<T>> {
        self.collection
            .get_or_try_init(|| async {
                let connection = self.db.connection().await?;
                debug!(collection = T::COLLECTION, "Binding collection handle");
                Ok::<_, AppError>(connection.collection::<T>(T::COLLECTION))
            })
            .await
    }

    async fn bound(&self, operation: &'static str) -> AppResult<&Collection<T>> {
        match self.collection().await {
            Ok(collection) => Ok(collection),
            Err(e) => Err(self.fail(operation, "connection", e)),
        }
    }

    async fn documents(&self, operation: &'static str) -> AppResult<Collection<Document>> {
        Ok(self.bound(operation).await?.clone_with_type::<Document>())
    }

    fn pagination(&self, operation: &'static str) -> AppResult<&PaginationPolicy> {
        self.pagination.as_ref().ok_or_else(|| {
            error!(
                collection = T::COLLECTION,
                operation, "Paginated operation on a repository without a pagination policy"
            );
            AppError::developer(format!(
                "Repository for '{}' must declare a pagination field and direction to support '{operation}'",
                T::COLLECTION
            ))
        })
    }

    /// Insert one document.
    pub async fn create(&self, item: &T) -> AppResult<InsertOneResult> {
        let collection = self.bound("create").await?;
        collection
            .insert_one(item)
            .await
            .map_err(|e| self.fail("create", Serialized(item), e))
    }

    /// Insert many documents and return how many the store acknowledged.
    pub async fn create_bulk(&self, items: &[T]) -> AppResult<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        let collection = self.bound("create_bulk").await?;
        let result = collection
            .insert_many(items)
            .await
            .map_err(|e| self.fail("create_bulk", Serialized(items), e))?;
        Ok(result.inserted_ids.len() as u64)
    }

    /// Set the fields of `item` on the document matching `filter` and
    /// return the updated document. With `create`, a missing document is
    /// inserted.
    pub async fn update(
        &self,
        filter: Document,
        item: impl Serialize,
        create: bool,
    ) -> AppResult<Option<T>> {
        let mut fields = bson::to_document(&item)
            .map_err(|e| self.fail("update", Serialized(&item), e))?;
        fields.remove(ID);
        if fields.is_empty() {
            return Err(AppError::repository(format!(
                "Update on '{}' has no fields to set",
                T::COLLECTION
            )));
        }

        let collection = self.bound("update").await?;
        collection
            .find_one_and_update(filter.clone(), doc! { "$set": fields })
            .upsert(create)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| self.fail("update", &filter, e))
    }

    /// Atomically add `step` to `field` on the document matching `filter`,
    /// inserting it when missing, and return the updated document.
    pub async fn increment(&self, filter: Document, field: &str, step: i64) -> AppResult<T> {
        let mut inc = Document::new();
        inc.insert(field, step);

        let collection = self.bound("increment").await?;
        collection
            .find_one_and_update(filter.clone(), doc! { "$inc": inc })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| self.fail("increment", &filter, e))?
            .ok_or_else(|| {
                AppError::repository(format!(
                    "Increment on '{}' returned no document",
                    T::COLLECTION
                ))
            })
    }

    /// Remove at most one document matching `filter`.
    pub async fn delete_one(&self, filter: Document) -> AppResult<u64> {
        let collection = self.bound("delete_one").await?;
        collection
            .delete_one(filter.clone())
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| self.fail("delete_one", &filter, e))
    }

    /// Count documents matching `filter`.
    pub async fn count(&self, filter: Document) -> AppResult<u64> {
        let collection = self.bound("count").await?;
        collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| self.fail("count", &filter, e))
    }

    /// Run the query's aggregation pipeline with cursor pagination
    /// appended.
    ///
    /// The cursor `$match`, `$sort` and `$limit` stages run after the
    /// caller's stages, so a pipeline carrying its own `$limit` truncates
    /// the data before pagination sees it and pages come out incomplete.
    pub async fn aggregate_paging<R: DeserializeOwned>(
        &self,
        query: &ApiQuery,
    ) -> AppResult<PagedResult<R>> {
        let policy = self.pagination("aggregate_paging")?;
        if query
            .aggregation
            .iter()
            .any(|stage| stage.contains_key("$limit"))
        {
            warn!(
                collection = T::COLLECTION,
                "Aggregation pipeline contains $limit; paged results may be incomplete"
            );
        }

        let plan = paging::plan(policy, query, Document::new())?;
        let mut pipeline = self.pipeline(query);
        if !plan.filter.is_empty() {
            pipeline.push(doc! { "$match": plan.filter.clone() });
        }
        pipeline.push(doc! { "$sort": plan.sort.clone() });
        pipeline.push(doc! { "$limit": plan.fetch });
        let hidden = T::hidden_fields(query.access_level);
        if let Some(projection) = query.effective_projection(&policy.required_fields(), hidden) {
            pipeline.push(doc! { "$project": projection });
        }

        debug!(
            collection = T::COLLECTION,
            stages = pipeline.len(),
            limit = query.limit,
            "Running paged aggregation"
        );
        let documents = self.run_pipeline("aggregate_paging", pipeline).await?;
        self.decode_page("aggregate_paging", paging::assemble(policy, &plan, documents)?)
    }

    /// Run the query's aggregation pipeline and materialize every result.
    pub async fn aggregate<R: DeserializeOwned>(&self, query: &ApiQuery) -> AppResult<Vec<R>> {
        let documents = self.run_pipeline("aggregate", self.pipeline(query)).await?;
        documents
            .into_iter()
            .map(|document| self.decode("aggregate", document))
            .collect()
    }

    /// Whether at least one document matches the query's filter.
    ///
    /// An empty filter is rejected rather than matching the whole
    /// collection.
    pub async fn exists(&self, query: &ApiQuery) -> AppResult<bool> {
        if query.query.is_empty() {
            warn!(collection = T::COLLECTION, "Existence check with an empty query");
            return Err(AppError::repository(format!(
                "Refusing to check existence in '{}' with an empty query",
                T::COLLECTION
            )));
        }
        self.any_match("exists", query.query.clone()).await
    }

    /// Whether any document shares one of `fields` with `item`.
    ///
    /// Only fields set on `item` take part: null values and empty strings
    /// count as unset. When none are set, the check is rejected.
    pub async fn exists_or(&self, item: &T, fields: &[&str]) -> AppResult<bool> {
        let document =
            bson::to_document(item).map_err(|e| self.fail("exists_or", Serialized(item), e))?;

        let clauses: Vec<Document> = fields
            .iter()
            .filter_map(|field| {
                paging::lookup_path(&document, field)
                    .filter(|value| !matches!(value, Bson::Null) && value.as_str() != Some(""))
                    .map(|value| {
                        let mut clause = Document::new();
                        clause.insert(*field, value.clone());
                        clause
                    })
            })
            .collect();

        if clauses.is_empty() {
            warn!(collection = T::COLLECTION, ?fields, "Existence check matched no fields");
            return Err(AppError::repository(format!(
                "None of {fields:?} are set on the item checked against '{}'",
                T::COLLECTION
            )));
        }
        self.any_match("exists_or", doc! { "$or": clauses }).await
    }

    /// Distinct values of `field` across the collection.
    pub async fn distinct(&self, field: &str) -> AppResult<Vec<Bson>> {
        let collection = self.bound("distinct").await?;
        collection
            .distinct(field, Document::new())
            .await
            .map_err(|e| self.fail("distinct", field, e))
    }

    /// Full-text search combined with the structured filter, paged on the
    /// pagination field. Without a search term this is [`Self::find`].
    pub async fn search(&self, query: &ApiQuery) -> AppResult<PagedResult<T>> {
        let policy = self.pagination("search")?;
        let Some(term) = query.search.as_deref() else {
            debug!(collection = T::COLLECTION, "Search without a term, running find");
            return self.find(query).await;
        };

        let text = doc! { "$text": { "$search": term } };
        let plan = paging::plan(policy, query, paging::and(query.query.clone(), text))?;
        self.run_paged("search", policy, query, plan).await
    }

    /// Structured filter with projection and cursor pagination.
    pub async fn find(&self, query: &ApiQuery) -> AppResult<PagedResult<T>> {
        let policy = self.pagination("find")?;
        let plan = paging::plan(policy, query, query.query.clone())?;
        self.run_paged("find", policy, query, plan).await
    }

    /// First document matching the query, without pagination.
    pub async fn find_one(&self, query: &ApiQuery) -> AppResult<Option<T>> {
        let collection = self.bound("find_one").await?;
        let mut action = collection.find_one(query.query.clone());
        if let Some(projection) = self.projection(query, &[]) {
            action = action.projection(projection);
        }
        action
            .await
            .map_err(|e| self.fail("find_one", &query.query, e))
    }

    /// Return the document matching the query, inserting it when missing.
    ///
    /// Creation metadata is only written on insert; an existing match is
    /// returned untouched.
    pub async fn find_one_or_create(&self, query: &ApiQuery, created_by: &str) -> AppResult<T> {
        if query.query.is_empty() {
            return Err(AppError::repository(format!(
                "Refusing to upsert into '{}' with an empty query",
                T::COLLECTION
            )));
        }

        let mut on_insert = Document::new();
        on_insert.insert(CREATED_ON, bson::DateTime::now());
        on_insert.insert(CREATED_BY, created_by);

        let collection = self.bound("find_one_or_create").await?;
        let mut action = collection
            .find_one_and_update(query.query.clone(), doc! { "$setOnInsert": on_insert })
            .upsert(true)
            .return_document(ReturnDocument::After);
        if let Some(projection) = self.projection(query, &[]) {
            action = action.projection(projection);
        }
        action
            .await
            .map_err(|e| self.fail("find_one_or_create", &query.query, e))?
            .ok_or_else(|| {
                AppError::repository(format!(
                    "Upsert into '{}' returned no document",
                    T::COLLECTION
                ))
            })
    }

    /// Create `indexes` on the collection. Existing identical indexes are
    /// left alone by the store.
    pub async fn ensure_indexes(&self, indexes: Vec<IndexModel>) -> AppResult<()> {
        if indexes.is_empty() {
            return Ok(());
        }
        let count = indexes.len();
        let collection = self.bound("ensure_indexes").await?;
        collection
            .create_indexes(indexes)
            .await
            .map_err(|e| self.fail("ensure_indexes", count, e))?;
        info!(collection = T::COLLECTION, count, "Indexes provisioned");
        Ok(())
    }

    async fn any_match(&self, operation: &'static str, filter: Document) -> AppResult<bool> {
        let collection = self.documents(operation).await?;
        collection
            .find_one(filter.clone())
            .projection(doc! { ID: 1 })
            .await
            .map(|found| found.is_some())
            .map_err(|e| self.fail(operation, &filter, e))
    }

    async fn run_paged(
        &self,
        operation: &'static str,
        policy: &PaginationPolicy,
        query: &ApiQuery,
        plan: PagePlan,
    ) -> AppResult<PagedResult<T>> {
        let collection = self.documents(operation).await?;
        debug!(
            collection = T::COLLECTION,
            operation,
            filter = %plan.filter,
            sort = %plan.sort,
            limit = query.limit,
            "Running paged query"
        );

        let mut action = collection
            .find(plan.filter.clone())
            .sort(plan.sort.clone())
            .limit(plan.fetch);
        if let Some(projection) = self.projection(query, &policy.required_fields()) {
            action = action.projection(projection);
        }

        let cursor = action
            .await
            .map_err(|e| self.fail(operation, &plan.filter, e))?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| self.fail(operation, &plan.filter, e))?;

        self.decode_page(operation, paging::assemble(policy, &plan, documents)?)
    }

    async fn run_pipeline(
        &self,
        operation: &'static str,
        pipeline: Vec<Document>,
    ) -> AppResult<Vec<Document>> {
        let collection = self.documents(operation).await?;
        let context = Bson::from(pipeline.clone());
        let cursor = collection
            .aggregate(pipeline)
            .await
            .map_err(|e| self.fail(operation, &context, e))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| self.fail(operation, &context, e))
    }

    /// Leading stages of every aggregation: the query filter, then the
    /// caller's hidden fields dropped before any caller stage can read them.
    fn pipeline(&self, query: &ApiQuery) -> Vec<Document> {
        let mut pipeline = Vec::with_capacity(query.aggregation.len() + 2);
        if !query.query.is_empty() {
            pipeline.push(doc! { "$match": query.query.clone() });
        }
        let hidden = T::hidden_fields(query.access_level);
        if !hidden.is_empty() {
            let mut excluded = Document::new();
            for field in hidden {
                excluded.insert(*field, 0);
            }
            pipeline.push(doc! { "$project": excluded });
        }
        pipeline.extend(query.aggregation.iter().cloned());
        pipeline
    }

    fn projection(&self, query: &ApiQuery, required: &[&str]) -> Option<Document> {
        query.effective_projection(required, T::hidden_fields(query.access_level))
    }

    fn decode<R: DeserializeOwned>(
        &self,
        operation: &'static str,
        document: Document,
    ) -> AppResult<R> {
        let id = document.get(ID).cloned().unwrap_or(Bson::Null);
        bson::from_document(document).map_err(|e| self.fail(operation, id, e))
    }

    fn decode_page<R: DeserializeOwned>(
        &self,
        operation: &'static str,
        page: PagedResult<Document>,
    ) -> AppResult<PagedResult<R>> {
        let results = page
            .results
            .into_iter()
            .map(|document| self.decode(operation, document))
            .collect::<AppResult<Vec<R>>>()?;
        Ok(PagedResult {
            results,
            previous: page.previous,
            next: page.next,
            has_previous: page.has_previous,
            has_next: page.has_next,
        })
    }

    fn fail(
        &self,
        operation: &'static str,
        context: impl fmt::Display,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> AppError {
        error!(
            collection = T::COLLECTION,
            operation,
            context = %context,
            error = %err,
            "Repository operation failed"
        );
        AppError::with_source(
            ErrorKind::Repository,
            format!("Failed to {operation} on '{}'", T::COLLECTION),
            err,
        )
    }
}

impl<T: PaginatedEntity> BaseRepository<T> {
    /// Create a repository paginating by the entity's declared policy.
    pub fn paginated(db: DatabaseClient) -> AppResult<Self> {
        let policy = PaginationPolicy::new(T::PAGINATED_FIELD, T::PAGINATED_ASCENDING)?;
        Ok(Self::with_pagination(db, policy))
    }
}

/// Renders a serializable value as JSON for error logs.
struct Serialized<'a, S: Serialize + ?Sized>(&'a S);

impl<S: Serialize + ?Sized> fmt::Display for Serialized<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("<unserializable>"),
        }
    }
}
