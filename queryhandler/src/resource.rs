use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Iterable, PrimaryKeyToColumn};
use serde_json::Value as JsonValue;

/// What the [`QueryHandler`](crate::QueryHandler) needs to know about an entity
/// beyond its Sea-ORM definition.
///
/// ```rust,ignore
/// impl Resource for post::Entity {
///     const RESOURCE_NAME_SINGULAR: &'static str = "post";
///     const RESOURCE_NAME_PLURAL: &'static str = "posts";
///     const SOFT_DELETE_COLUMN: Option<&'static str> = Some("is_deleted");
///
///     fn default_fields() -> Vec<&'static str> {
///         vec!["id", "title"]
///     }
/// }
/// ```
#[async_trait]
pub trait Resource: EntityTrait {
    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;

    /// Column flagging soft-deleted rows. `None` disables soft-delete filtering.
    const SOFT_DELETE_COLUMN: Option<&'static str> = None;

    /// Value of [`Self::SOFT_DELETE_COLUMN`] on rows that are not deleted.
    const SOFT_DELETE_ACTIVE: &'static str = "N";

    /// Fields always selected when a projection is requested.
    #[must_use]
    fn default_fields() -> Vec<&'static str> {
        Vec::new()
    }

    /// Fields never selected by a projection.
    #[must_use]
    fn foreign_key_fields() -> Vec<&'static str> {
        Vec::new()
    }

    /// Columns searched by free-text `q` filters against the relational store.
    #[must_use]
    fn keyword_columns() -> Vec<Self::Column> {
        Vec::new()
    }

    /// Attach nested related objects to `records`, named by `hydrates`.
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` if loading the related rows fails.
    async fn hydrate(
        _db: &DatabaseConnection,
        _records: &mut [JsonValue],
        _hydrates: &[String],
    ) -> Result<(), DbErr> {
        Ok(())
    }

    /// First primary key column.
    #[must_use]
    fn primary_key_column() -> Option<Self::Column> {
        Self::PrimaryKey::iter().next().map(|key| key.into_column())
    }
}

/// Name of a column as it appears in queries and JSON records.
pub(crate) fn column_name<C: ColumnTrait>(column: C) -> String {
    column.as_str().to_owned()
}
