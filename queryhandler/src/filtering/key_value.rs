//! Filters on key/value side tables, where the second key segment names a row
//! of the side table rather than a column.
//!
//! ```rust,ignore
//! // post_attribute(post_id, name, value)
//! GET /posts?attrs__color=red          // name = 'color' AND value = 'red'
//! GET /posts?attrs__color__in=red,blue
//!
//! // post_role(post_id, role, author_id) -> author
//! GET /posts?people__editor__email__endswith=example.com
//! ```

use std::marker::PhantomData;

use sea_orm::{Condition, EntityTrait, QueryFilter, RelationDef, Select};

use super::{
    Dialect, Filter, Operator,
    join::{join_hop, join_through},
    key::{aliased_column, join_alias, lenient_operator, segments, table_name},
};
use crate::errors::FilterError;

/// `relation__name[__operator]` against a side table holding one row per
/// name/value pair.
pub struct OneToManyKeyValueJoinFilter<E, S> {
    key: String,
    value: String,
    relation: RelationDef,
    key_field: String,
    value_field: String,
    occurrence: usize,
    _entities: PhantomData<fn() -> (E, S)>,
}

impl<E: EntityTrait, S: EntityTrait> OneToManyKeyValueJoinFilter<E, S> {
    /// `key_field` holds the name matched against the second key segment;
    /// `value_field` is compared with the filter value.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        relation: RelationDef,
        key_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            relation,
            key_field: key_field.into(),
            value_field: value_field.into(),
            occurrence: 0,
            _entities: PhantomData,
        }
    }

    fn entry_name(&self) -> Result<String, FilterError> {
        segments(&self.key)
            .get(1)
            .map(|name| (*name).to_owned())
            .ok_or_else(|| FilterError::MalformedKey {
                key: self.key.clone(),
            })
    }
}

impl<E: EntityTrait, S: EntityTrait> Filter<E> for OneToManyKeyValueJoinFilter<E, S> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        Some(&self.value_field)
    }

    fn operator(&self) -> Option<Operator> {
        Some(lenient_operator(&segments(&self.key), 2, 3))
    }

    fn is_join_filter(&self) -> bool {
        true
    }

    fn set_join_occurrence(&mut self, occurrence: usize) {
        self.occurrence = occurrence;
    }

    fn add_to_query(&self, query: Select<E>, _dialect: Dialect) -> Result<Select<E>, FilterError> {
        let name = self.entry_name()?;
        let operator = lenient_operator(&segments(&self.key), 2, 3);

        let side_table = table_name::<S>();
        let alias = join_alias(&side_table, &self.key, self.occurrence);
        let (key_expr, _) = aliased_column::<S>(&alias, &self.key_field)?;
        let (value_expr, value_type) = aliased_column::<S>(&alias, &self.value_field)?;

        let query = join_hop(query, &self.relation, &table_name::<E>(), &side_table, &alias);
        Ok(query.filter(
            Condition::all()
                .add(key_expr.eq(name))
                .add(operator.predicate(value_expr, &value_type, &self.value)),
        ))
    }
}

/// `relation__name__column[__operator]` where an intermediate table tags each
/// link to the secondary table with a name (a role, a kind) and the column is
/// on the secondary table.
pub struct ManyToManyKeyValueJoinFilter<E, I, S> {
    key: String,
    value: String,
    to_intermediate: RelationDef,
    to_secondary: RelationDef,
    key_field: String,
    occurrence: usize,
    _entities: PhantomData<fn() -> (E, I, S)>,
}

impl<E: EntityTrait, I: EntityTrait, S: EntityTrait> ManyToManyKeyValueJoinFilter<E, I, S> {
    /// `key_field` is the intermediate column holding the name.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        to_intermediate: RelationDef,
        to_secondary: RelationDef,
        key_field: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            to_intermediate,
            to_secondary,
            key_field: key_field.into(),
            occurrence: 0,
            _entities: PhantomData,
        }
    }

    fn target(&self) -> Result<(String, String, Operator), FilterError> {
        let segs = segments(&self.key);
        match segs.as_slice() {
            [_, name, column, ..] => Ok((
                (*name).to_owned(),
                (*column).to_owned(),
                lenient_operator(&segs, 3, 4),
            )),
            _ => Err(FilterError::MalformedKey {
                key: self.key.clone(),
            }),
        }
    }
}

impl<E: EntityTrait, I: EntityTrait, S: EntityTrait> Filter<E>
    for ManyToManyKeyValueJoinFilter<E, I, S>
{
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        segments(&self.key).get(2).copied()
    }

    fn operator(&self) -> Option<Operator> {
        self.target().ok().map(|(_, _, op)| op)
    }

    fn is_join_filter(&self) -> bool {
        true
    }

    fn set_join_occurrence(&mut self, occurrence: usize) {
        self.occurrence = occurrence;
    }

    fn add_to_query(&self, query: Select<E>, _dialect: Dialect) -> Result<Select<E>, FilterError> {
        let (name, column, operator) = self.target()?;

        let intermediate_alias = join_alias(&table_name::<I>(), &self.key, self.occurrence);
        let secondary_alias = join_alias(&table_name::<S>(), &self.key, self.occurrence);
        let (key_expr, _) = aliased_column::<I>(&intermediate_alias, &self.key_field)?;
        let (value_expr, value_type) = aliased_column::<S>(&secondary_alias, &column)?;

        let (query, _, _) = join_through::<E, I, S>(
            query,
            &self.to_intermediate,
            &self.to_secondary,
            &self.key,
            self.occurrence,
        );
        Ok(query.filter(
            Condition::all()
                .add(key_expr.eq(name))
                .add(operator.predicate(value_expr, &value_type, &self.value)),
        ))
    }
}
