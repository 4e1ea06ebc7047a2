use sea_orm::{DatabaseConnection, QuerySelect, QueryTrait, sea_query::MysqlQueryBuilder};

use super::{client::SearchClient, response::count_from};
use crate::{
    errors::QueryError,
    filtering::Dialect,
    handler::QueryHandler,
    models::{Payload, Records},
    resource::Resource,
};

/// Runs a [`QueryHandler`]'s queries against the search backend instead of the
/// relational store.
///
/// Queries are rendered to MySQL-flavoured SQL text with values inlined, and
/// `contains` filters on base-table columns become `MATCH()` keyword queries.
///
/// ```rust,ignore
/// let handler = QueryHandler::<post::Entity>::new()
///     .add_filter(Box::new(DefaultFilter::new("title__contains", "rust")));
/// let payload = SearchQueryHandler::new(client, handler).payload().await?;
/// ```
pub struct SearchQueryHandler<E: Resource> {
    client: SearchClient,
    handler: QueryHandler<E>,
    hydration_db: Option<DatabaseConnection>,
}

impl<E: Resource> SearchQueryHandler<E> {
    #[must_use]
    pub fn new(client: SearchClient, handler: QueryHandler<E>) -> Self {
        Self {
            client,
            handler: handler.set_dialect(Dialect::KeywordSearch),
            hydration_db: None,
        }
    }

    /// Store [`Resource::hydrate`] reads related objects from when the
    /// wrapped handler uses hydration.
    #[must_use]
    pub fn hydrate_from(mut self, db: DatabaseConnection) -> Self {
        self.hydration_db = Some(db);
        self
    }

    #[must_use]
    pub fn handler(&self) -> &QueryHandler<E> {
        &self.handler
    }

    /// # Errors
    ///
    /// See [`QueryHandler::count_query`].
    pub fn count_sql(&self) -> Result<String, QueryError> {
        Ok(self
            .handler
            .count_query()?
            .as_query()
            .to_string(MysqlQueryBuilder))
    }

    /// # Errors
    ///
    /// See [`QueryHandler::query`].
    pub fn query_sql(&self) -> Result<String, QueryError> {
        Ok(self
            .handler
            .query()?
            .distinct()
            .as_query()
            .to_string(MysqlQueryBuilder))
    }

    /// # Errors
    ///
    /// Query building and search backend errors.
    pub async fn count(&self) -> Result<u64, QueryError> {
        let records = self.client.execute(&self.count_sql()?).await?;
        Ok(count_from(&records)?)
    }

    /// # Errors
    ///
    /// Query building, search backend and hydration errors.
    pub async fn results(&self) -> Result<Records, QueryError> {
        let mut records = self.client.execute(&self.query_sql()?).await?;
        if let (Some(hydrates), Some(db)) = (self.handler.hydration(), &self.hydration_db) {
            E::hydrate(db, &mut records, hydrates).await?;
        }
        Ok(self.handler.arrange(records))
    }

    /// # Errors
    ///
    /// As [`QueryHandler::payload`], with search backend errors in place of
    /// database errors.
    pub async fn payload(&self) -> Result<Payload, QueryError> {
        let total = self.count().await?;
        let records = self.results().await?;
        self.handler.assemble(total, records)
    }
}
