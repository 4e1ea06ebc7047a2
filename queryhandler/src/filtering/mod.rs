//! # Filters
//!
//! Every filter turns one flat key/value pair (usually a query-string
//! parameter) into predicates, and joins where needed, on a Sea-ORM
//! [`Select`]. The shape of the key decides what is built:
//!
//! ```rust,ignore
//! // Column on the base table
//! GET /posts?status=published
//! GET /posts?status__in=published,archived
//! GET /posts?views__gte=100
//!
//! // The same value against several columns, OR-ed
//! GET /posts?title_or_status__contains=draft
//!
//! // Column on a related table (joined under its own alias)
//! GET /posts?owner__email__endswith=example.com
//! GET /posts?comments__rating__gte=4
//! GET /posts?tags__name=rust
//!
//! // Key/value side tables
//! GET /posts?attrs__color=red
//! GET /posts?people__editor__email__contains=example
//! ```
//!
//! Non-join filters are applied first, join filters afterwards, by the
//! [`QueryHandler`](crate::QueryHandler).

pub mod column;
pub mod dialect;
pub mod factory;
pub mod join;
pub mod key;
pub mod key_value;
pub mod keyword;
pub mod operator;
mod value;

use sea_orm::Select;

use crate::errors::FilterError;

pub use column::{DefaultFilter, MultiOrFilter, OrFilter};
pub use dialect::Dialect;
pub use factory::{FilterSet, KeyValueJoinFactory};
pub use join::{ManyToManyJoinFilter, OneToManyJoinFilter, OneToOneJoinFilter};
pub use key::{KEY_SEPARATOR, OR_SEPARATOR, join_alias};
pub use key_value::{ManyToManyKeyValueJoinFilter, OneToManyKeyValueJoinFilter};
pub use keyword::KeywordFilter;
pub use operator::{Operator, split_list};

/// A strategy that adds one filter expression to a query over `E`.
pub trait Filter<E: sea_orm::EntityTrait>: Send + Sync {
    /// The key this filter was built from.
    fn key(&self) -> &str;

    /// The raw, undecoded value. Filters combining several pairs join their
    /// values with `|`, the way they join their keys.
    fn value(&self) -> &str;

    /// Column the key targets, when the key is well formed.
    fn column(&self) -> Option<&str>;

    /// Operator the key asks for, when the key is well formed.
    fn operator(&self) -> Option<Operator>;

    /// Join filters are layered on after every plain filter.
    fn is_join_filter(&self) -> bool {
        false
    }

    /// How many earlier join filters of the same query share this key. Join
    /// filters fold it into their table aliases; other filters ignore it.
    fn set_join_occurrence(&mut self, _occurrence: usize) {}

    /// Add the predicate (and any joins) to `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] when the key does not fit the entity; callers
    /// keep the query they passed in.
    fn add_to_query(&self, query: Select<E>, dialect: Dialect) -> Result<Select<E>, FilterError>;
}
