//! Filters on columns of the base table.

use std::marker::PhantomData;

use sea_orm::{Condition, EntityTrait, QueryFilter, Select, sea_query::SimpleExpr};

use super::{
    Dialect, Filter, Operator,
    dialect::keyword_match,
    key::{OR_SEPARATOR, base_column, parse_column_key, segments},
};
use crate::errors::FilterError;

/// `column` or `column__operator` on the base table.
pub struct DefaultFilter<E> {
    key: String,
    value: String,
    parsed: Result<(String, Operator), FilterError>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> DefaultFilter<E> {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let parsed = parse_column_key(&key);
        Self {
            key,
            value: value.into(),
            parsed,
            _entity: PhantomData,
        }
    }

    pub(crate) fn condition(&self, dialect: Dialect) -> Result<SimpleExpr, FilterError> {
        let (column, operator) = self.parsed.clone()?;
        let (expr, column_type) = base_column::<E>(&column)?;
        if dialect.is_keyword_search() && operator == Operator::Contains {
            return Ok(keyword_match(&[column.as_str()], &self.value));
        }
        Ok(operator.predicate(expr, &column_type, &self.value))
    }
}

impl<E: EntityTrait> Filter<E> for DefaultFilter<E> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        self.parsed.as_ref().ok().map(|(column, _)| column.as_str())
    }

    fn operator(&self) -> Option<Operator> {
        self.parsed.as_ref().ok().map(|(_, op)| *op)
    }

    fn add_to_query(&self, query: Select<E>, dialect: Dialect) -> Result<Select<E>, FilterError> {
        Ok(query.filter(self.condition(dialect)?))
    }
}

/// `a_or_b[__operator]`: the same comparison against several columns, OR-ed.
pub struct OrFilter<E> {
    key: String,
    value: String,
    parsed: Result<(Vec<String>, Operator), FilterError>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> OrFilter<E> {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let parsed = parse_column_key(&key).map(|(columns, op)| {
            let columns = columns.split(OR_SEPARATOR).map(str::to_owned).collect();
            (columns, op)
        });
        Self {
            key,
            value: value.into(),
            parsed,
            _entity: PhantomData,
        }
    }

    /// Columns named in the key, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.parsed.as_ref().map_or(&[], |(columns, _)| columns.as_slice())
    }
}

impl<E: EntityTrait> Filter<E> for OrFilter<E> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        self.parsed.as_ref().ok()?;
        segments(&self.key).first().copied()
    }

    fn operator(&self) -> Option<Operator> {
        self.parsed.as_ref().ok().map(|(_, op)| *op)
    }

    fn add_to_query(&self, query: Select<E>, dialect: Dialect) -> Result<Select<E>, FilterError> {
        let (columns, operator) = self.parsed.clone()?;
        let mut resolved = Vec::with_capacity(columns.len());
        for column in &columns {
            resolved.push(base_column::<E>(column)?);
        }

        if dialect.is_keyword_search() && operator == Operator::Contains {
            let fields: Vec<&str> = columns.iter().map(String::as_str).collect();
            return Ok(query.filter(keyword_match(&fields, &self.value)));
        }

        let any = resolved
            .into_iter()
            .fold(Condition::any(), |cond, (expr, column_type)| {
                cond.add(operator.predicate(expr, &column_type, &self.value))
            });
        Ok(query.filter(any))
    }
}

/// Several independent `column[__operator]` conditions, OR-ed together.
///
/// One bad member fails the whole filter, so a typo never widens the result.
pub struct MultiOrFilter<E> {
    key: String,
    value: String,
    members: Vec<DefaultFilter<E>>,
}

impl<E: EntityTrait> MultiOrFilter<E> {
    pub fn new<K, V, I>(conditions: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let members: Vec<DefaultFilter<E>> = conditions
            .into_iter()
            .map(|(key, value)| DefaultFilter::new(key, value))
            .collect();
        let key = members
            .iter()
            .map(|m| m.key.as_str())
            .collect::<Vec<_>>()
            .join("|");
        let value = members
            .iter()
            .map(|m| m.value.as_str())
            .collect::<Vec<_>>()
            .join("|");
        Self {
            key,
            value,
            members,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<E: EntityTrait> Filter<E> for MultiOrFilter<E> {
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
        None
    }

    fn add_to_query(&self, query: Select<E>, dialect: Dialect) -> Result<Select<E>, FilterError> {
        if self.members.is_empty() {
            return Err(FilterError::MalformedKey {
                key: self.key.clone(),
            });
        }
        let mut any = Condition::any();
        for member in &self.members {
            any = any.add(member.condition(dialect)?);
        }
        Ok(query.filter(any))
    }
}
