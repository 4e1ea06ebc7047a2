//! Assembling filters, projection, soft-delete, ordering and pagination into
//! one listing query.
//!
//! Non-join filters build the base query and the base count query; join
//! filters are layered on top of both afterwards, so a caller-supplied base
//! query still gets every join filter.

use axum::http::HeaderMap;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, Order, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Select,
    sea_query::{Expr, SimpleExpr},
};
use serde_json::Value as JsonValue;

use crate::{
    errors::QueryError,
    filtering::{
        Dialect, Filter, FilterSet, Operator,
        key::{resolve_column, table_name},
    },
    models::{Payload, QueryOptions, Records},
    pagination::calculate_content_range,
    resource::{Resource, column_name},
};

pub const DEFAULT_ORDER_BY: &str = "id";
pub const DEFAULT_LIMIT: u64 = 30;

/// Largest `offset` or `limit` the SQL drivers can bind.
pub const MAX_ROWS: u64 = i64::MAX.unsigned_abs();

/// Builds and runs the count and page queries for one listing request.
///
/// ```rust,ignore
/// let payload = QueryHandler::<post::Entity>::new()
///     .set_fields("title,status")
///     .set_order_by("views")
///     .set_order_dir("desc")
///     .add_filter(Box::new(DefaultFilter::new("status", "published")))
///     .payload(&db)
///     .await?;
/// ```
pub struct QueryHandler<E: Resource> {
    filters: Vec<Box<dyn Filter<E>>>,
    base_query: Option<Select<E>>,
    base_count_query: Option<Select<E>>,
    fields: Vec<String>,
    hydrates: Vec<String>,
    response_key: Option<String>,
    order_by: String,
    order_dir: Order,
    offset: u64,
    limit: u64,
    hydration: bool,
    soft_delete: bool,
    dialect: Dialect,
}

impl<E: Resource> Default for QueryHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl<E: Resource> QueryHandler<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            base_query: None,
            base_count_query: None,
            fields: Vec::new(),
            hydrates: Vec::new(),
            response_key: None,
            order_by: DEFAULT_ORDER_BY.to_owned(),
            order_dir: Order::Asc,
            offset: 0,
            limit: DEFAULT_LIMIT,
            hydration: false,
            soft_delete: true,
            dialect: Dialect::Relational,
        }
    }

    /// Apply listing options, then one filter per remaining pair.
    #[must_use]
    pub fn from_options(
        options: &QueryOptions,
        filter_set: &FilterSet<E>,
        filters: &[(String, String)],
    ) -> Self {
        let mut handler = Self::new();
        if let Some(fields) = &options.fields {
            handler = handler.set_fields(fields);
        }
        if let Some(hydrates) = &options.hydrates {
            handler = handler.set_hydrates(hydrates).use_hydration();
        }
        if let Some(order_by) = &options.order_by {
            handler = handler.set_order_by(order_by);
        }
        if let Some(order_dir) = &options.order_dir {
            handler = handler.set_order_dir(order_dir);
        }
        if let Some(offset) = options.offset {
            handler = handler.set_offset(offset);
        }
        if let Some(limit) = options.limit {
            handler = handler.set_limit(limit);
        }
        if let Some(key) = &options.response_key {
            handler = handler.set_response_key(key);
        }
        let pairs = filters.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        for filter in filter_set.from_pairs(pairs) {
            handler = handler.add_filter(filter);
        }
        handler
    }

    /// Comma separated projection; an empty string keeps every field.
    #[must_use]
    pub fn set_fields(mut self, fields: &str) -> Self {
        let fields = split_csv(fields);
        if !fields.is_empty() {
            self.fields = fields;
        }
        self
    }

    #[must_use]
    pub fn set_hydrates(mut self, hydrates: &str) -> Self {
        let hydrates = split_csv(hydrates);
        if !hydrates.is_empty() {
            self.hydrates = hydrates;
        }
        self
    }

    #[must_use]
    pub fn set_response_key(mut self, key: impl Into<String>) -> Self {
        self.response_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn set_order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = column.into();
        self
    }

    /// `desc` (any case) sorts descending, anything else ascending.
    #[must_use]
    pub fn set_order_dir(mut self, dir: &str) -> Self {
        self.order_dir = if dir.eq_ignore_ascii_case("desc") {
            Order::Desc
        } else {
            Order::Asc
        };
        self
    }

    /// Clamped to [`MAX_ROWS`].
    #[must_use]
    pub fn set_offset(mut self, offset: u64) -> Self {
        self.offset = offset.min(MAX_ROWS);
        self
    }

    /// Clamped to [`MAX_ROWS`].
    #[must_use]
    pub fn set_limit(mut self, limit: u64) -> Self {
        self.limit = limit.min(MAX_ROWS);
        self
    }

    /// Stop excluding soft-deleted rows.
    #[must_use]
    pub fn include_deleted(mut self) -> Self {
        self.soft_delete = false;
        self
    }

    /// Run [`Resource::hydrate`] on every page of results.
    #[must_use]
    pub fn use_hydration(mut self) -> Self {
        self.hydration = true;
        self
    }

    /// Replace the generated base query. Join filters still apply on top.
    #[must_use]
    pub fn set_base_query(mut self, query: Select<E>) -> Self {
        self.base_query = Some(query);
        self
    }

    /// Replace the generated base count query; it must select one integer.
    #[must_use]
    pub fn set_base_count_query(mut self, query: Select<E>) -> Self {
        self.base_count_query = Some(query);
        self
    }

    /// Join filters repeating the key of an earlier join filter get their
    /// own numbered join aliases.
    #[must_use]
    pub fn add_filter(mut self, mut filter: Box<dyn Filter<E>>) -> Self {
        if filter.is_join_filter() {
            let occurrence = self
                .filters
                .iter()
                .filter(|f| f.is_join_filter() && f.key() == filter.key())
                .count();
            filter.set_join_occurrence(occurrence);
        }
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn set_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub fn filters(&self) -> &[Box<dyn Filter<E>>] {
        &self.filters
    }

    fn primary_key_name() -> Result<String, QueryError> {
        E::primary_key_column().map(column_name).ok_or_else(|| {
            QueryError::internal(
                "Query could not be built",
                Some(format!("{} has no primary key", table_name::<E>())),
            )
        })
    }

    /// The filter looking a single record up by primary key, if any.
    fn id_filter(&self) -> Option<&dyn Filter<E>> {
        let pk = Self::primary_key_name().ok()?;
        self.filters
            .iter()
            .map(Box::as_ref)
            .find(|f| {
                !f.is_join_filter()
                    && f.operator() == Some(Operator::Eq)
                    && f.column() == Some(pk.as_str())
            })
    }

    /// Whether a plain filter asks for one record by primary key.
    #[must_use]
    pub fn has_id(&self) -> bool {
        self.id_filter().is_some()
    }

    fn soft_delete_condition(&self) -> Result<Option<SimpleExpr>, QueryError> {
        let Some(name) = E::SOFT_DELETE_COLUMN.filter(|_| self.soft_delete) else {
            return Ok(None);
        };
        let column = resolve_column::<E>(name).map_err(|err| {
            QueryError::internal("Query could not be built", Some(err.to_string()))
        })?;
        Ok(Some(
            Expr::col(column.as_column_ref()).eq(E::SOFT_DELETE_ACTIVE),
        ))
    }

    fn apply(&self, query: Select<E>, filter: &dyn Filter<E>) -> Select<E> {
        match filter.add_to_query(query.clone(), self.dialect) {
            Ok(query) => query,
            Err(err) => {
                tracing::debug!(key = filter.key(), error = %err, "skipping filter");
                query
            }
        }
    }

    fn apply_filters(&self, mut query: Select<E>, joins: bool) -> Select<E> {
        for filter in self.filters.iter().filter(|f| f.is_join_filter() == joins) {
            query = self.apply(query, filter.as_ref());
        }
        query
    }

    fn with_soft_delete(&self, query: Select<E>) -> Result<Select<E>, QueryError> {
        Ok(match self.soft_delete_condition()? {
            Some(condition) => query.filter(condition),
            None => query,
        })
    }

    /// Columns to select when a projection is requested: requested fields and
    /// default fields minus foreign keys, then the primary key and whatever
    /// grouping or ordering needs. Unknown fields are rejected.
    fn projection(&self) -> Result<Vec<E::Column>, QueryError> {
        let excluded = E::foreign_key_fields();
        let mut names: Vec<String> = self
            .fields
            .iter()
            .cloned()
            .chain(E::default_fields().into_iter().map(str::to_owned))
            .filter(|name| !excluded.contains(&name.as_str()))
            .collect();
        // DISTINCT needs the ordering column in the select list
        names.push(Self::primary_key_name()?);
        names.extend(self.response_key.iter().cloned());
        names.push(self.order_by.clone());

        let mut seen: Vec<String> = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            if seen.contains(&name) {
                continue;
            }
            let column = resolve_column::<E>(&name).map_err(|_| {
                QueryError::bad_request(format!(
                    "unknown field '{name}' on {}",
                    E::RESOURCE_NAME_PLURAL
                ))
            })?;
            seen.push(name);
            columns.push(column);
        }
        Ok(columns)
    }

    /// `COUNT(DISTINCT pk)` with soft-delete and every non-join filter, unless
    /// replaced with [`Self::set_base_count_query`].
    ///
    /// # Errors
    ///
    /// Fails when the entity has no primary key or its soft-delete column is
    /// missing.
    pub fn base_count_query(&self) -> Result<Select<E>, QueryError> {
        if let Some(query) = &self.base_count_query {
            return Ok(query.clone());
        }
        let pk = E::primary_key_column().ok_or_else(|| {
            QueryError::internal(
                "Query could not be built",
                Some(format!("{} has no primary key", table_name::<E>())),
            )
        })?;
        let query = E::find()
            .select_only()
            .column_as(Expr::col(pk.as_column_ref()).count_distinct(), "count");
        let query = self.with_soft_delete(query)?;
        Ok(self.apply_filters(query, false))
    }

    /// Projected entity select with soft-delete and every non-join filter,
    /// unless replaced with [`Self::set_base_query`].
    ///
    /// # Errors
    ///
    /// Returns a bad request for unknown projection fields.
    pub fn base_query(&self) -> Result<Select<E>, QueryError> {
        if let Some(query) = &self.base_query {
            return Ok(query.clone());
        }
        let mut query = E::find();
        if !self.fields.is_empty() {
            query = self
                .projection()?
                .into_iter()
                .fold(query.select_only(), |query, column| query.column(column));
        }
        let query = self.with_soft_delete(query)?;
        Ok(self.apply_filters(query, false))
    }

    /// Base count query plus every join filter.
    ///
    /// # Errors
    ///
    /// See [`Self::base_count_query`].
    pub fn count_query(&self) -> Result<Select<E>, QueryError> {
        Ok(self.apply_filters(self.base_count_query()?, true))
    }

    /// Base query plus every join filter, ordered and paginated.
    ///
    /// # Errors
    ///
    /// Returns a bad request for an unknown `order_by` or projection field.
    pub fn query(&self) -> Result<Select<E>, QueryError> {
        let order_column = resolve_column::<E>(&self.order_by).map_err(|_| {
            QueryError::bad_request(format!(
                "cannot order {} by '{}'",
                E::RESOURCE_NAME_PLURAL,
                self.order_by
            ))
        })?;
        Ok(self
            .apply_filters(self.base_query()?, true)
            .order_by(order_column, self.order_dir.clone())
            .offset(self.offset)
            .limit(self.limit))
    }

    /// Number of matching records, ignoring pagination.
    ///
    /// # Errors
    ///
    /// Propagates query building and database errors.
    pub async fn count(&self, db: &DatabaseConnection) -> Result<u64, QueryError> {
        let query = self.count_query()?;
        tracing::debug!(sql = %query.build(db.get_database_backend()), "count query");
        let count: Option<i64> = query.into_tuple().one(db).await?;
        Ok(count.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }

    /// One page of distinct records as JSON, hydrated and grouped as set up.
    ///
    /// # Errors
    ///
    /// Propagates query building, database and hydration errors.
    pub async fn results(&self, db: &DatabaseConnection) -> Result<Records, QueryError> {
        let query = self.query()?.distinct();
        tracing::debug!(sql = %query.build(db.get_database_backend()), "page query");
        let mut records = query.into_json().all(db).await?;
        if self.hydration {
            E::hydrate(db, &mut records, &self.hydrates).await?;
        }
        Ok(self.arrange(records))
    }

    /// Count and page together: the record itself for an id lookup, a page
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns not found for an id lookup that matches nothing.
    pub async fn payload(&self, db: &DatabaseConnection) -> Result<Payload, QueryError> {
        let total = self.count(db).await?;
        let records = self.results(db).await?;
        self.assemble(total, records)
    }

    /// `Content-Range` header for this page out of `total_count` records.
    #[must_use]
    pub fn content_range(&self, total_count: u64) -> HeaderMap {
        calculate_content_range(self.offset, self.limit, total_count, E::RESOURCE_NAME_PLURAL)
    }

    /// Group by the response key, except for id lookups.
    pub(crate) fn arrange(&self, records: Vec<JsonValue>) -> Records {
        match &self.response_key {
            Some(key) if !self.has_id() => Records::group_by(records, key),
            _ => Records::List(records),
        }
    }

    pub(crate) fn assemble(&self, total: u64, records: Records) -> Result<Payload, QueryError> {
        let Some(id_filter) = self.id_filter() else {
            return Ok(Payload::Page {
                total_count: total,
                records,
            });
        };
        let not_found = || {
            QueryError::not_found(
                E::RESOURCE_NAME_SINGULAR,
                Some(id_filter.value().to_owned()),
            )
        };
        if total == 0 {
            return Err(not_found());
        }
        records.into_first().map(Payload::Single).ok_or_else(not_found)
    }

    /// Hydration settings, for handlers that run the query elsewhere.
    pub(crate) fn hydration(&self) -> Option<&[String]> {
        self.hydration.then_some(self.hydrates.as_slice())
    }
}
