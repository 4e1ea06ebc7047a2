//! Filters on columns of related tables.
//!
//! Every joined table gets its own alias, `{table}_{filter_key}`, so two
//! filters over the same relation are independent joins: a post tagged both
//! `rust` and `topic` matches `tags__name=rust&tags__category=topic` even
//! though no single tag has both. A repeated key gets a numbered alias,
//! `tag_tags__name_1`, so `tags__name=rust&tags__name=async` asks for both.

use std::marker::PhantomData;

use sea_orm::{
    Condition, EntityTrait, Identity, QueryFilter, QueryTrait, RelationDef, Select,
    sea_query::{Alias, DynIden, Expr, JoinType},
};

use super::{
    Dialect, Filter, Operator,
    key::{aliased_column, join_alias, lenient_operator, segments, table_name},
};
use crate::errors::FilterError;

fn identity_columns(identity: &Identity) -> Vec<DynIden> {
    match identity {
        Identity::Unary(a) => vec![a.clone()],
        Identity::Binary(a, b) => vec![a.clone(), b.clone()],
        Identity::Ternary(a, b, c) => vec![a.clone(), b.clone(), c.clone()],
        Identity::Many(columns) => columns.clone(),
    }
}

/// `INNER JOIN {to_table} AS {to_alias} ON from.col = to_alias.col [AND ...]`
pub(crate) fn join_hop<E: EntityTrait>(
    mut query: Select<E>,
    relation: &RelationDef,
    from: &str,
    to_table: &str,
    to_alias: &str,
) -> Select<E> {
    let on = identity_columns(&relation.from_col)
        .into_iter()
        .zip(identity_columns(&relation.to_col))
        .fold(Condition::all(), |cond, (from_col, to_col)| {
            cond.add(
                Expr::col((Alias::new(from), from_col)).equals((Alias::new(to_alias), to_col)),
            )
        });
    QueryTrait::query(&mut query).join_as(
        JoinType::InnerJoin,
        Alias::new(to_table),
        Alias::new(to_alias),
        on,
    );
    query
}

/// Column and operator of a `relation__column[__operator]` key.
fn related_column(key: &str) -> Result<(String, Operator), FilterError> {
    let segs = segments(key);
    let column = segs.get(1).ok_or_else(|| FilterError::MalformedKey {
        key: key.to_owned(),
    })?;
    Ok(((*column).to_owned(), lenient_operator(&segs, 2, 3)))
}

/// Joins the secondary table of a single-hop relation and returns its alias.
fn join_secondary<E: EntityTrait, S: EntityTrait>(
    query: Select<E>,
    relation: &RelationDef,
    key: &str,
    occurrence: usize,
) -> (Select<E>, String) {
    let secondary = table_name::<S>();
    let alias = join_alias(&secondary, key, occurrence);
    let query = join_hop(query, relation, &table_name::<E>(), &secondary, &alias);
    (query, alias)
}

/// Joins intermediate then secondary table of a two-hop relation and returns
/// both aliases.
pub(crate) fn join_through<E: EntityTrait, I: EntityTrait, S: EntityTrait>(
    query: Select<E>,
    to_intermediate: &RelationDef,
    to_secondary: &RelationDef,
    key: &str,
    occurrence: usize,
) -> (Select<E>, String, String) {
    let intermediate = table_name::<I>();
    let secondary = table_name::<S>();
    let intermediate_alias = join_alias(&intermediate, key, occurrence);
    let secondary_alias = join_alias(&secondary, key, occurrence);
    let query = join_hop(
        query,
        to_intermediate,
        &table_name::<E>(),
        &intermediate,
        &intermediate_alias,
    );
    let query = join_hop(
        query,
        to_secondary,
        &intermediate_alias,
        &secondary,
        &secondary_alias,
    );
    (query, intermediate_alias, secondary_alias)
}

/// `relation__column[__operator]` across a one-to-one (or many-to-one) relation.
///
/// ```rust,ignore
/// let filter = OneToOneJoinFilter::<post::Entity, author::Entity>::new(
///     "owner__email__endswith",
///     "example.com",
///     post::Relation::Owner.def(),
/// );
/// ```
pub struct OneToOneJoinFilter<E, S> {
    key: String,
    value: String,
    relation: RelationDef,
    occurrence: usize,
    _entities: PhantomData<fn() -> (E, S)>,
}

impl<E: EntityTrait, S: EntityTrait> OneToOneJoinFilter<E, S> {
    pub fn new(key: impl Into<String>, value: impl Into<String>, relation: RelationDef) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            relation,
            occurrence: 0,
            _entities: PhantomData,
        }
    }
}

impl<E: EntityTrait, S: EntityTrait> Filter<E> for OneToOneJoinFilter<E, S> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        segments(&self.key).get(1).copied()
    }

    fn operator(&self) -> Option<Operator> {
        related_column(&self.key).ok().map(|(_, op)| op)
    }

    fn is_join_filter(&self) -> bool {
        true
    }

    fn set_join_occurrence(&mut self, occurrence: usize) {
        self.occurrence = occurrence;
    }

    fn add_to_query(&self, query: Select<E>, _dialect: Dialect) -> Result<Select<E>, FilterError> {
        let (column, operator) = related_column(&self.key)?;
        let alias = join_alias(&table_name::<S>(), &self.key, self.occurrence);
        let (expr, column_type) = aliased_column::<S>(&alias, &column)?;
        let (query, _) =
            join_secondary::<E, S>(query, &self.relation, &self.key, self.occurrence);
        Ok(query.filter(operator.predicate(expr, &column_type, &self.value)))
    }
}

/// `relation__column[__operator]` across a one-to-many relation.
///
/// A bare `relation` key means `default_column IN (value list)`, e.g.
/// `comments=great,useful` with `body` as the default column.
pub struct OneToManyJoinFilter<E, S> {
    key: String,
    value: String,
    relation: RelationDef,
    default_column: Option<String>,
    occurrence: usize,
    _entities: PhantomData<fn() -> (E, S)>,
}

impl<E: EntityTrait, S: EntityTrait> OneToManyJoinFilter<E, S> {
    pub fn new(key: impl Into<String>, value: impl Into<String>, relation: RelationDef) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            relation,
            default_column: None,
            occurrence: 0,
            _entities: PhantomData,
        }
    }

    /// Column of the related table matched by a bare `relation=a,b` key.
    #[must_use]
    pub fn with_default_column(mut self, column: impl Into<String>) -> Self {
        self.default_column = Some(column.into());
        self
    }

    fn target(&self) -> Result<(String, Operator), FilterError> {
        if self.key.contains(super::KEY_SEPARATOR) {
            return related_column(&self.key);
        }
        let column = self
            .default_column
            .clone()
            .ok_or_else(|| FilterError::Incomplete {
                key: self.key.clone(),
                missing: "default column",
            })?;
        Ok((column, Operator::In))
    }
}

impl<E: EntityTrait, S: EntityTrait> Filter<E> for OneToManyJoinFilter<E, S> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        if self.key.contains(super::KEY_SEPARATOR) {
            segments(&self.key).get(1).copied()
        } else {
            self.default_column.as_deref()
        }
    }

    fn operator(&self) -> Option<Operator> {
        self.target().ok().map(|(_, op)| op)
    }

    fn is_join_filter(&self) -> bool {
        true
    }

    fn set_join_occurrence(&mut self, occurrence: usize) {
        self.occurrence = occurrence;
    }

    fn add_to_query(&self, query: Select<E>, _dialect: Dialect) -> Result<Select<E>, FilterError> {
        let (column, operator) = self.target()?;
        let alias = join_alias(&table_name::<S>(), &self.key, self.occurrence);
        let (expr, column_type) = aliased_column::<S>(&alias, &column)?;
        let (query, _) =
            join_secondary::<E, S>(query, &self.relation, &self.key, self.occurrence);
        Ok(query.filter(operator.predicate(expr, &column_type, &self.value)))
    }
}

/// `relation__column[__operator]` across a many-to-many relation: base table
/// to intermediate (`I`) to secondary (`S`), filtering the secondary.
pub struct ManyToManyJoinFilter<E, I, S> {
    key: String,
    value: String,
    to_intermediate: RelationDef,
    to_secondary: RelationDef,
    occurrence: usize,
    _entities: PhantomData<fn() -> (E, I, S)>,
}

impl<E: EntityTrait, I: EntityTrait, S: EntityTrait> ManyToManyJoinFilter<E, I, S> {
    /// `to_intermediate` is a relation of `E`, `to_secondary` a relation of `I`.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        to_intermediate: RelationDef,
        to_secondary: RelationDef,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            to_intermediate,
            to_secondary,
            occurrence: 0,
            _entities: PhantomData,
        }
    }
}

impl<E: EntityTrait, I: EntityTrait, S: EntityTrait> Filter<E> for ManyToManyJoinFilter<E, I, S> {
    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn column(&self) -> Option<&str> {
        segments(&self.key).get(1).copied()
    }

    fn operator(&self) -> Option<Operator> {
        related_column(&self.key).ok().map(|(_, op)| op)
    }

    fn is_join_filter(&self) -> bool {
        true
    }

    fn set_join_occurrence(&mut self, occurrence: usize) {
        self.occurrence = occurrence;
    }

    fn add_to_query(&self, query: Select<E>, _dialect: Dialect) -> Result<Select<E>, FilterError> {
        let (column, operator) = related_column(&self.key)?;
        let alias = join_alias(&table_name::<S>(), &self.key, self.occurrence);
        let (expr, column_type) = aliased_column::<S>(&alias, &column)?;
        let (query, _, _) = join_through::<E, I, S>(
            query,
            &self.to_intermediate,
            &self.to_secondary,
            &self.key,
            self.occurrence,
        );
        Ok(query.filter(operator.predicate(expr, &column_type, &self.value)))
    }
}
