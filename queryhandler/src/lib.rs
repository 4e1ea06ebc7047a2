//! Query-string filters, pagination and search-backend rendering on top of
//! Sea-ORM.
//!
//! ```rust,ignore
//! async fn list_posts(
//!     State(db): State<DatabaseConnection>,
//!     Query(pairs): Query<Vec<(String, String)>>,
//! ) -> Result<(HeaderMap, Payload), QueryError> {
//!     let (options, filters) = QueryOptions::from_pairs(pairs)?;
//!     let handler = QueryHandler::from_options(&options, &post_filters(), &filters);
//!     let payload = handler.payload(&db).await?;
//!     let headers = match &payload {
//!         Payload::Page { total_count, .. } => handler.content_range(*total_count),
//!         Payload::Single(_) => HeaderMap::new(),
//!     };
//!     Ok((headers, payload))
//! }
//! ```

pub mod errors;
pub mod filtering;
pub mod handler;
pub mod models;
pub mod pagination;
pub mod resource;
pub mod search;

pub use errors::{FilterError, QueryError};
pub use filtering::{
    DefaultFilter, Dialect, Filter, FilterSet, KeyValueJoinFactory, KeywordFilter,
    ManyToManyJoinFilter, ManyToManyKeyValueJoinFilter, MultiOrFilter, OneToManyJoinFilter,
    OneToManyKeyValueJoinFilter, OneToOneJoinFilter, Operator, OrFilter,
};
pub use handler::QueryHandler;
pub use models::{Payload, QueryOptions, Records};
pub use pagination::calculate_content_range;
pub use resource::Resource;
pub use search::{SearchClient, SearchConfig, SearchError, SearchQueryHandler};
