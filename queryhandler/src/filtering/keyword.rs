use std::marker::PhantomData;

use sea_orm::{ColumnTrait, Condition, QueryFilter, Select, sea_query::Expr};

use super::{Dialect, Filter, Operator, dialect::keyword_match, operator::like_pattern};
use crate::{errors::FilterError, resource::Resource};

/// Free-text search over a resource.
///
/// Against the search backend this is a whole-document `MATCH('text')`.
/// Against the relational store it falls back to `LIKE '%text%'` on every
/// column in [`Resource::keyword_columns`], OR-ed.
pub struct KeywordFilter<E> {
    key: String,
    value: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Resource> KeywordFilter<E> {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            _entity: PhantomData,
        }
    }
}

impl<E: Resource> Filter<E> for KeywordFilter<E> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        None
    }

    fn operator(&self) -> Option<Operator> {
        Some(Operator::Contains)
    }

    fn add_to_query(&self, query: Select<E>, dialect: Dialect) -> Result<Select<E>, FilterError> {
        let text = self.value.trim();
        if text.is_empty() {
            return Ok(query);
        }
        if dialect.is_keyword_search() {
            return Ok(query.filter(keyword_match(&[], text)));
        }

        let columns = E::keyword_columns();
        if columns.is_empty() {
            return Err(FilterError::Incomplete {
                key: self.key.clone(),
                missing: "keyword columns",
            });
        }
        let any = columns.into_iter().fold(Condition::any(), |cond, column| {
            cond.add(Expr::col(column.as_column_ref()).like(like_pattern("%", text, "%")))
        });
        Ok(query.filter(any))
    }
}
